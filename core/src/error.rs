//! Usage errors, eager halts and the top-level error type.
//!
//! Parse and finalize errors are collected rather than raised one at a time:
//! each one is recorded as a [`CommandError`] (the [`UsageError`] plus the
//! path of the command where it occurred) and all of them are surfaced
//! together as a [`MultiUsageError`].

use std::fmt;

use thiserror::Error;

use crate::types::Arity;
use crate::validate::DeclarationError;

fn did_you_mean(noun: &str, possibilities: &[String]) -> String {
    match possibilities {
        [] => String::new(),
        [one] => format!(" (did you mean {one}?)"),
        many => format!(" (possible {noun}: {})", many.join(", ")),
    }
}

fn arity_requirement(expected: &Arity) -> String {
    let plural = |n: usize| if n == 1 { "value" } else { "values" };
    if !expected.takes_value() {
        "does not take a value".to_string()
    } else if expected.min == expected.max {
        format!("requires {} {}", expected.min, plural(expected.min))
    } else if expected.is_unbounded() {
        format!("requires at least {} {}", expected.min, plural(expected.min))
    } else {
        format!("requires {} to {} values", expected.min, expected.max)
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn exclusive_names(names: &[String]) -> String {
    match names {
        [] => "mutually exclusive options used together".to_string(),
        [first, rest @ ..] => format!("option {first} cannot be used with {}", rest.join(" or ")),
    }
}

fn extra_arguments(tokens: &[String]) -> String {
    let shown = tokens.iter().take(3).cloned().collect::<Vec<_>>().join(" ");
    let more = if tokens.len() > 3 { " ..." } else { "" };
    let noun = if tokens.len() == 1 {
        "argument"
    } else {
        "arguments"
    };
    format!("got unexpected extra {noun} ({shown}{more})")
}

/// A single problem with the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("no such option {name}{}", did_you_mean("options", .possibilities))]
    NoSuchOption {
        name: String,
        possibilities: Vec<String>,
    },
    #[error("no such subcommand {name}{}", did_you_mean("subcommands", .possibilities))]
    NoSuchSubcommand {
        name: String,
        possibilities: Vec<String>,
    },
    #[error("option {name} {}", arity_requirement(.expected))]
    IncorrectOptionValueCount {
        name: String,
        expected: Arity,
        received: usize,
    },
    #[error("argument {name} takes {expected} values but got {received}")]
    IncorrectArgumentValueCount {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("missing option {name}")]
    MissingOption { name: String },
    #[error("missing argument {name}")]
    MissingArgument { name: String },
    #[error("must provide one of {}", join_names(.names))]
    MissingGroup { names: Vec<String> },
    #[error("missing subcommand")]
    MissingSubcommand,
    #[error("{}", extra_arguments(.tokens))]
    UnexpectedArguments { tokens: Vec<String> },
    #[error("incorrect format in file {filename} line {line}: {message}")]
    InvalidFileFormat {
        filename: String,
        line: usize,
        message: String,
    },
    #[error("file {filename} not found")]
    FileNotFound { filename: String },
    #[error("could not read file {filename}: {message}")]
    UnreadableFile { filename: String, message: String },
    #[error("argument file {filename} includes itself")]
    RecursiveArgumentFile { filename: String },
    #[error("{}", exclusive_names(.names))]
    MutuallyExclusive { names: Vec<String> },
    #[error("invalid value for {name}: {message}")]
    BadParameterValue { name: String, message: String },
}

/// A [`UsageError`] located at a command in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct CommandError {
    /// Names from the root command down to the failing command.
    pub command_path: Vec<String>,
    pub error: UsageError,
}

/// Every usage error collected for one invocation, in order.
///
/// A single error displays exactly like that error; several errors display
/// one per line.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandError, MultiUsageError, UsageError};
///
/// assert!(MultiUsageError::build(Vec::new()).is_none());
///
/// let single = MultiUsageError::build(vec![CommandError {
///     command_path: vec!["tool".into()],
///     error: UsageError::MissingOption { name: "--x".into() },
/// }])
/// .unwrap();
/// assert_eq!(single.to_string(), "missing option --x");
/// assert!(single.single().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiUsageError {
    errors: Vec<CommandError>,
}

impl MultiUsageError {
    /// Wraps `errors`, or returns `None` when there are none.
    pub fn build(errors: Vec<CommandError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self { errors })
    }

    pub fn errors(&self) -> &[CommandError] {
        &self.errors
    }

    /// The only error, when there is exactly one.
    pub fn single(&self) -> Option<&CommandError> {
        match self.errors.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<CommandError> {
        self.errors
    }
}

impl fmt::Display for MultiUsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiUsageError {}

/// Why parsing stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Help was requested for the halting command.
    Help,
    /// A message (e.g. a version banner) should be printed.
    Message(String),
}

/// A controlled early exit raised by an eager option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub reason: HaltReason,
    pub command_path: Vec<String>,
    /// Whether the exit should count as a failure.
    pub error: bool,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            HaltReason::Help => write!(f, "help requested for {}", self.command_path.join(" ")),
            HaltReason::Message(text) => f.write_str(text),
        }
    }
}

/// Top-level failure of a parse/finalize/run pass.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] MultiUsageError),
    #[error("{0}")]
    Halt(Halt),
    #[error("invalid command declaration: {}", join_declaration_errors(.0))]
    Declaration(Vec<DeclarationError>),
    #[error("{message}")]
    Run {
        command_path: Vec<String>,
        message: String,
    },
}

fn join_declaration_errors(errors: &[DeclarationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CliError {
    /// Returns `true` for halts that do not count as failures.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Halt(halt) if !halt.error)
    }
}
