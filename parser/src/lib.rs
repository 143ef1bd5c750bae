//! Argv parsing, finalization and execution for argtree command trees.
//!
//! The pipeline has two phases:
//!
//! 1. **Parse** ([`parse_argv`]): the argv driver walks the command tree with
//!    an explicit frame stack. For each invoked command the command parser
//!    expands aliases and `@file` arguments, records option invocations,
//!    assigns positional arguments and hands over to the next subcommand.
//!    Errors are collected, not raised.
//! 2. **Finalize** ([`finalize`], [`finalize_and_run`]): each command's
//!    invocations are resolved against environment variables, the value
//!    source and defaults, groups and validators are checked, and the run
//!    callback is invoked.
//!
//! [`CommandLineParser`] bundles declaration validation with both phases.
//!
//! # Example
//!
//! ```
//! use argtree_core::*;
//! use argtree_parser::CommandLineParser;
//!
//! let git = CommandDecl::new("git")
//!     .with_option(OptionDecl::flag(&["-v", "--verbose"]))
//!     .with_subcommand(
//!         CommandDecl::new("commit")
//!             .with_option(OptionDecl::single(&["-m", "--message"]).required()),
//!     );
//!
//! let finished =
//!     CommandLineParser::run(&git, &["-v", "commit", "-m", "fix"], &ContextSettings::default())
//!         .unwrap();
//! assert!(finished[0].values.flag("verbose"));
//! assert_eq!(finished[1].values.value("message"), Some("fix"));
//!
//! let err = CommandLineParser::run(&git, &["commit"], &ContextSettings::default()).unwrap_err();
//! assert_eq!(err.to_string(), "missing option --message");
//! ```

mod command;
mod driver;
mod execute;
mod finalize;
mod lexer;

pub use driver::{CommandLineParseResult, parse_argv};
pub use execute::{FinalizedCommand, finalize_and_run};
pub use finalize::finalize;
pub use lexer::lex_argument_file;

use argtree_core::{
    CliError, CommandDecl, CommandInvocation, ContextSettings, Halt, HaltReason, ParsedValues,
    validate_command,
};
use tracing::debug;

/// Entry points combining declaration validation, parsing and finalization.
pub struct CommandLineParser;

impl CommandLineParser {
    /// Validates `root` and parses `argv` against it.
    ///
    /// Fails with [`CliError::Declaration`] for an invalid tree, and with a
    /// help halt flagged as an error when `argv` is empty and the root asks
    /// for help on empty arguments.
    pub fn parse<'a, S: AsRef<str>>(
        root: &'a CommandDecl,
        argv: &[S],
        settings: &ContextSettings,
    ) -> Result<CommandLineParseResult<'a>, CliError> {
        let problems = validate_command(root);
        if !problems.is_empty() {
            return Err(CliError::Declaration(problems));
        }
        if argv.is_empty() && root.print_help_on_empty_args {
            debug!(command = root.name.as_str(), "empty argv, printing help");
            return Err(CliError::Halt(Halt {
                reason: HaltReason::Help,
                command_path: vec![root.name.clone()],
                error: true,
            }));
        }
        Ok(parse_argv(root, argv, settings))
    }

    /// Finalizes a single command invocation.
    pub fn finalize(invocation: &CommandInvocation<'_>) -> Result<ParsedValues, CliError> {
        finalize(invocation)
    }

    /// Parses `argv`, then finalizes and runs every invoked command.
    pub fn run<S: AsRef<str>>(
        root: &CommandDecl,
        argv: &[S],
        settings: &ContextSettings,
    ) -> Result<Vec<FinalizedCommand>, CliError> {
        let parsed = Self::parse(root, argv, settings)?;
        finalize_and_run(&parsed.invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::{DeclarationError, OptionDecl};

    #[test]
    fn test_invalid_declaration_is_rejected() {
        let root = CommandDecl::new("tool").with_option(OptionDecl::flag(&["bad"]));
        let err = CommandLineParser::run(&root, &["x"], &ContextSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Declaration(ref errors)
                if matches!(errors[0], DeclarationError::MissingOptionPrefix { .. })
        ));
    }

    #[test]
    fn test_help_on_empty_args() {
        let root = CommandDecl::new("tool").print_help_on_empty_args();
        let empty: [&str; 0] = [];
        let err = CommandLineParser::run(&root, &empty, &ContextSettings::default()).unwrap_err();
        assert!(!err.is_success());
        assert!(matches!(
            err,
            CliError::Halt(Halt { reason: HaltReason::Help, error: true, .. })
        ));
    }
}
