//! Core declaration and value types for argtree command trees.
//!
//! This crate defines everything the parser and finalizer share:
//!
//! - [`CommandDecl`], [`OptionDecl`], [`ArgumentDecl`], [`GroupDecl`]:
//!   immutable declarations of a command tree.
//! - [`split_option_prefix`]: the prefix classifier behind every option-like
//!   token decision.
//! - [`Registry`]: per-command name index (including the synthesized help
//!   option).
//! - [`Context`] / [`ContextSettings`]: inherited configuration and the
//!   injected collaborators (envvar reader, file reader, token transform,
//!   suggestor, value source).
//! - [`Invocation`] / [`CommandInvocation`]: raw occurrences recorded by the
//!   parser.
//! - [`ParsedValues`]: finalized values of one command.
//! - [`UsageError`], [`MultiUsageError`], [`Halt`], [`CliError`]: error
//!   aggregation.
//!
//! Validation ([`validate_command`]) catches structural declaration errors
//! such as duplicate names and conflicting number options before parsing.
//!
//! # Example
//!
//! ```
//! use argtree_core::*;
//!
//! let cli = CommandDecl::new("tool")
//!     .with_option(OptionDecl::flag(&["-v", "--verbose"]).with_help("Enable verbose output"))
//!     .with_subcommand(
//!         CommandDecl::new("run")
//!             .with_option(OptionDecl::single(&["--port"]))
//!             .with_argument(ArgumentDecl::required("script")),
//!     );
//!
//! assert_eq!(cli.find_subcommand("run").unwrap().name, "run");
//! assert!(cli.find_option("verbose").is_some());
//! assert!(validate_command(&cli).is_empty());
//! ```

mod context;
mod error;
mod invocation;
mod prefix;
mod registry;
mod source;
mod suggest;
mod types;
mod validate;
mod values;

pub use context::{
    Context, ContextSettings, EnvReader, FileReadError, FileReader, Suggestor, TokenTransform,
};
pub use error::{CliError, CommandError, Halt, HaltReason, MultiUsageError, UsageError};
pub use invocation::{ArgumentInvocation, CommandInvocation, Invocation, OptionInvocation};
pub use prefix::{option_prefix, split_option_prefix};
pub use registry::{HELP_OPTION_KEY, Registry};
pub use source::{ValueSource, source_key};
pub use suggest::{SUGGESTION_THRESHOLD, typo_suggestions};
pub use types::{
    ArgumentArity, ArgumentDecl, Arity, CommandDecl, ContextOverrides, EagerAction, GroupDecl,
    GroupKind, OptionDecl, OptionKind, RunCallback, Validator,
};
pub use validate::{DeclarationError, validate_command};
pub use values::{ParsedValues, ResolvedOption, ResolvedValue, ValueOrigin};
