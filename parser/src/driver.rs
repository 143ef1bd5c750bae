//! Argv driver: parses a command and the chain of subcommands it invokes.
//!
//! The driver keeps an explicit stack of frames, one per command on the
//! current path from the root. When the command parser reports a subcommand,
//! frames deeper than the subcommand's owner are closed (attached to their
//! parents) and a new frame is opened for the subcommand. This is how
//! chained invocations such as `tool build --release test --all` attach both
//! `build` and `test` to `tool`.

use argtree_core::{CommandDecl, CommandInvocation, Context, ContextSettings};
use tracing::debug;

use crate::command::{CommandParser, SubcommandEntry, TokenBuffer};

/// Outcome of parsing a full argv.
#[derive(Debug)]
pub struct CommandLineParseResult<'a> {
    /// Invocation tree rooted at the root command.
    pub invocation: CommandInvocation<'a>,
    /// The tokens after alias and `@file` expansion.
    pub argv: Vec<String>,
}

struct Frame<'a> {
    invocation: CommandInvocation<'a>,
    depth: usize,
    /// Subcommands of ancestors that allow chaining, nearest ancestor first.
    inherited: Vec<SubcommandEntry<'a>>,
}

impl<'a> Frame<'a> {
    /// Subcommands visible while parsing this frame: own ones first.
    fn visible_subcommands(&self) -> Vec<SubcommandEntry<'a>> {
        own_entries(self.invocation.command, self.depth)
            .chain(self.inherited.iter().cloned())
            .collect()
    }

    /// Subcommands a child of this frame inherits.
    fn inheritable_subcommands(&self) -> Vec<SubcommandEntry<'a>> {
        let own: Vec<SubcommandEntry<'a>> = if self.invocation.command.allow_multiple_subcommands {
            own_entries(self.invocation.command, self.depth).collect()
        } else {
            Vec::new()
        };
        own.into_iter().chain(self.inherited.iter().cloned()).collect()
    }
}

fn own_entries(command: &CommandDecl, depth: usize) -> impl Iterator<Item = SubcommandEntry<'_>> {
    command.subcommands.iter().map(move |sub| SubcommandEntry {
        name: sub.name.clone(),
        command: sub,
        owner_depth: depth,
    })
}

/// Closes the top frame, attaching its invocation to the frame below.
fn close_frame<'a>(stack: &mut Vec<Frame<'a>>) -> Option<CommandInvocation<'a>> {
    let frame = stack.pop()?;
    match stack.last_mut() {
        Some(parent) => {
            parent.invocation.children.push(frame.invocation);
            None
        }
        None => Some(frame.invocation),
    }
}

/// Parses `argv` against `root` and returns the invocation tree.
///
/// Declarations are not validated here; see
/// [`CommandLineParser::parse`](crate::CommandLineParser::parse).
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, ContextSettings, OptionDecl};
/// use argtree_parser::parse_argv;
///
/// let root = CommandDecl::new("tool")
///     .with_option(OptionDecl::flag(&["-v"]))
///     .with_subcommand(CommandDecl::new("run"));
/// let result = parse_argv(&root, &["-v", "run"], &ContextSettings::default());
///
/// assert_eq!(result.invocation.option_invocations.len(), 1);
/// assert_eq!(result.invocation.children[0].command.name, "run");
/// ```
pub fn parse_argv<'a, S: AsRef<str>>(
    root: &'a CommandDecl,
    argv: &[S],
    settings: &ContextSettings,
) -> CommandLineParseResult<'a> {
    let mut buffer = TokenBuffer::new(argv.iter().map(|s| s.as_ref().to_string()).collect());
    let mut stack = vec![Frame {
        invocation: CommandInvocation::new(root, Context::root(root, settings)),
        depth: 0,
        inherited: Vec::new(),
    }];
    let mut index = 0;

    while let Some(frame) = stack.last_mut() {
        let subcommands = frame.visible_subcommands();
        let parser = CommandParser::new(
            frame.invocation.command,
            &frame.invocation.context,
            &subcommands,
        );
        let outcome = parser.parse(&mut buffer, index);

        frame.invocation.option_invocations = outcome.option_invocations;
        frame.invocation.argument_invocations = outcome.argument_invocations;
        frame.invocation.errors = outcome.errors;
        index = outcome.index;

        let Some(entry) = outcome.next else {
            break;
        };

        while stack.last().is_some_and(|f| f.depth > entry.owner_depth) {
            close_frame(&mut stack);
        }
        let Some(parent) = stack.last() else {
            break;
        };
        debug!(
            parent = parent.invocation.context.command_name(),
            subcommand = entry.command.name.as_str(),
            index,
            "entering subcommand"
        );
        let context = parent.invocation.context.child(entry.command);
        let child = Frame {
            invocation: CommandInvocation::new(entry.command, context),
            depth: parent.depth + 1,
            inherited: parent.inheritable_subcommands(),
        };
        stack.push(child);
    }

    let mut root_invocation = None;
    while !stack.is_empty() {
        if let Some(invocation) = close_frame(&mut stack) {
            root_invocation = Some(invocation);
        }
    }

    CommandLineParseResult {
        invocation: root_invocation
            .unwrap_or_else(|| CommandInvocation::new(root, Context::root(root, settings))),
        argv: buffer.into_tokens(),
    }
}
