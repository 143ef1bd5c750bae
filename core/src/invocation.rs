//! Raw occurrences collected by the parser.
//!
//! Invocations carry strings only. They are produced by the command parser
//! (and synthesized from envvars or value sources by the finalizer) and are
//! never modified once recorded.

use serde::Serialize;

use crate::context::Context;
use crate::error::UsageError;
use crate::types::CommandDecl;

/// One occurrence of an option: the name it was given under and its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub name: String,
    pub values: Vec<String>,
}

impl Invocation {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// An occurrence without values.
    pub fn bare(name: &str) -> Self {
        Self::new(name, Vec::new())
    }
}

/// An [`Invocation`] bound to the key of the option it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInvocation {
    pub option: String,
    pub invocation: Invocation,
}

/// Values assigned to one positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentInvocation {
    pub argument: String,
    pub values: Vec<String>,
}

/// Everything the parser recorded for one invoked command.
///
/// A command with recorded errors never has children: descent into
/// subcommands stops at the first command that failed to parse.
#[derive(Debug, Clone)]
pub struct CommandInvocation<'a> {
    pub command: &'a CommandDecl,
    pub context: Context,
    /// Option occurrences in command-line order.
    pub option_invocations: Vec<OptionInvocation>,
    /// One entry per declared argument, in declaration order.
    pub argument_invocations: Vec<ArgumentInvocation>,
    /// Invoked subcommands, in command-line order.
    pub children: Vec<CommandInvocation<'a>>,
    pub errors: Vec<UsageError>,
}

impl<'a> CommandInvocation<'a> {
    pub fn new(command: &'a CommandDecl, context: Context) -> Self {
        Self {
            command,
            context,
            option_invocations: Vec::new(),
            argument_invocations: Vec::new(),
            children: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Occurrences of the option with `key`, in order.
    pub fn invocations_of(&self, key: &str) -> Vec<Invocation> {
        self.option_invocations
            .iter()
            .filter(|oi| oi.option == key)
            .map(|oi| oi.invocation.clone())
            .collect()
    }

    /// Values assigned to the argument called `name`.
    pub fn argument_values(&self, name: &str) -> Option<&[String]> {
        self.argument_invocations
            .iter()
            .find(|ai| ai.argument == name)
            .map(|ai| ai.values.as_slice())
    }

    pub fn command_path(&self) -> &[String] {
        self.context.command_path()
    }

    /// Returns `true` if this command or any descendant recorded errors.
    pub fn has_errors(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.errors.is_empty() {
                return true;
            }
            stack.extend(node.children.iter());
        }
        false
    }
}
