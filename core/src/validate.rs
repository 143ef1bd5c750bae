//! Declaration validation.
//!
//! Checks structural invariants of a command tree before anything is parsed:
//! duplicate names, unprefixed option names, conflicting number options or
//! variadic arguments, malformed arities, broken groups and nested chained
//! subcommands.
//!
//! # Examples
//!
//! ```
//! use argtree_core::*;
//!
//! let good = CommandDecl::new("tool").with_option(OptionDecl::flag(&["-v", "--verbose"]));
//! assert!(validate_command(&good).is_empty());
//!
//! // Invalid: option name without a prefix
//! let bad = CommandDecl::new("tool").with_option(OptionDecl::flag(&["verbose"]));
//! assert!(!validate_command(&bad).is_empty());
//! ```

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

use crate::prefix::option_prefix;
use crate::types::{ArgumentArity, CommandDecl, OptionDecl, OptionKind};

/// Declaration validation errors.
///
/// Each variant names the command (its path joined with spaces) where the
/// problem was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty (under {0})")]
    EmptyCommandName(String),
    /// An option has no primary names.
    #[error("option without names in {command}")]
    MissingOptionName { command: String },
    /// An option name does not start with a prefix such as `-` or `/`.
    #[error("option name must start with a prefix in {command}: {name}")]
    MissingOptionPrefix { command: String, name: String },
    #[error("duplicate option name in {command}: {name}")]
    DuplicateOptionName { command: String, name: String },
    #[error("duplicate option key in {command}: {key}")]
    DuplicateOptionKey { command: String, key: String },
    #[error("duplicate argument in {command}: {name}")]
    DuplicateArgument { command: String, name: String },
    #[error("duplicate subcommand in {command}: {name}")]
    DuplicateSubcommand { command: String, name: String },
    #[error("more than one number option in {command}")]
    MultipleNumberOptions { command: String },
    #[error("more than one variadic argument in {command}")]
    MultipleVariadicArguments { command: String },
    /// A fixed-width argument that consumes nothing.
    #[error("argument {name} in {command} must take at least one value")]
    EmptyArgumentArity { command: String, name: String },
    #[error("invalid arity for option {option} in {command}: {reason}")]
    InvalidArity {
        command: String,
        option: String,
        reason: String,
    },
    #[error("eager option {option} in {command} must be a flag")]
    EagerOptionNotFlag { command: String, option: String },
    #[error("invalid envvar split pattern for option {option} in {command}: {message}")]
    InvalidEnvvarSplit {
        command: String,
        option: String,
        message: String,
    },
    #[error("group {group} in {command} names unknown option {option}")]
    UnknownGroupMember {
        command: String,
        group: String,
        option: String,
    },
    #[error("option {option} in {command} belongs to more than one group")]
    OptionInMultipleGroups { command: String, option: String },
    /// A command allowing chained subcommands below another one that does.
    #[error("nested command chains are not supported: {0}")]
    NestedMultipleSubcommands(String),
}

/// Validates a command tree.
///
/// Returns every problem found, in tree order; an empty list means the
/// declaration can be parsed.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
///
/// let tool = CommandDecl::new("tool")
///     .with_option(OptionDecl::flag(&["-v"]))
///     .with_subcommand(
///         CommandDecl::new("run").with_option(OptionDecl::flag(&["-v"])),
///     );
/// // Names only need to be unique within one command.
/// assert!(validate_command(&tool).is_empty());
///
/// let dup = CommandDecl::new("tool")
///     .with_option(OptionDecl::flag(&["-v"]))
///     .with_option(OptionDecl::counted(&["-v", "--verbose"]));
/// let errors = validate_command(&dup);
/// assert!(errors.iter().any(|e| matches!(e, DeclarationError::DuplicateOptionName { .. })));
/// ```
pub fn validate_command(command: &CommandDecl) -> Vec<DeclarationError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    validate_tree(command, &mut path, false, &mut errors);
    errors
}

fn validate_tree(
    command: &CommandDecl,
    path: &mut Vec<String>,
    inside_chain: bool,
    errors: &mut Vec<DeclarationError>,
) {
    if command.name.trim().is_empty() {
        errors.push(DeclarationError::EmptyCommandName(display_path(path)));
    }
    path.push(command.name.clone());
    let here = display_path(path);

    if command.allow_multiple_subcommands && inside_chain {
        errors.push(DeclarationError::NestedMultipleSubcommands(here.clone()));
    }

    validate_options(&here, &command.options, errors);
    validate_arguments(&here, command, errors);
    validate_groups(&here, command, errors);

    let mut seen = HashSet::new();
    for sub in &command.subcommands {
        if !seen.insert(sub.name.as_str()) {
            errors.push(DeclarationError::DuplicateSubcommand {
                command: here.clone(),
                name: sub.name.clone(),
            });
        }
        validate_tree(
            sub,
            path,
            inside_chain || command.allow_multiple_subcommands,
            errors,
        );
    }

    path.pop();
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" ")
    }
}

fn validate_options(command: &str, options: &[OptionDecl], errors: &mut Vec<DeclarationError>) {
    let mut names = HashSet::new();
    let mut keys = HashSet::new();
    let mut number_options = 0;

    for option in options {
        if option.names.is_empty() {
            errors.push(DeclarationError::MissingOptionName {
                command: command.to_string(),
            });
            continue;
        }

        for name in option.all_names() {
            if option_prefix(name).is_empty() {
                errors.push(DeclarationError::MissingOptionPrefix {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            }
            if !names.insert(name) {
                errors.push(DeclarationError::DuplicateOptionName {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let key = option.key();
        if !keys.insert(key.clone()) {
            errors.push(DeclarationError::DuplicateOptionKey {
                command: command.to_string(),
                key: key.clone(),
            });
        }

        if option.accepts_number_value_without_name {
            number_options += 1;
        }

        if let Some(reason) = arity_problem(option) {
            errors.push(DeclarationError::InvalidArity {
                command: command.to_string(),
                option: key.clone(),
                reason,
            });
        }

        if option.eager.is_some() && option.kind != OptionKind::Flag {
            errors.push(DeclarationError::EagerOptionNotFlag {
                command: command.to_string(),
                option: key.clone(),
            });
        }

        if let Some(pattern) = &option.envvar_split
            && let Err(err) = Regex::new(pattern)
        {
            errors.push(DeclarationError::InvalidEnvvarSplit {
                command: command.to_string(),
                option: key.clone(),
                message: err.to_string(),
            });
        }
    }

    if number_options > 1 {
        errors.push(DeclarationError::MultipleNumberOptions {
            command: command.to_string(),
        });
    }
}

fn arity_problem(option: &OptionDecl) -> Option<String> {
    let nvalues = option.nvalues;
    if nvalues.min > nvalues.max {
        return Some(format!("minimum {} exceeds maximum {}", nvalues.min, nvalues.max));
    }
    match option.kind {
        OptionKind::Flag | OptionKind::Counted if nvalues.takes_value() => {
            Some("flags cannot take values".to_string())
        }
        OptionKind::Single | OptionKind::Multiple if !nvalues.takes_value() => {
            Some("options must take at least one value".to_string())
        }
        _ => None,
    }
}

fn validate_arguments(command: &str, decl: &CommandDecl, errors: &mut Vec<DeclarationError>) {
    let mut names = HashSet::new();
    let mut variadic = 0;

    for argument in &decl.arguments {
        if !names.insert(argument.name.as_str()) {
            errors.push(DeclarationError::DuplicateArgument {
                command: command.to_string(),
                name: argument.name.clone(),
            });
        }
        match argument.nvalues {
            ArgumentArity::Variadic => variadic += 1,
            ArgumentArity::Exactly(0) => errors.push(DeclarationError::EmptyArgumentArity {
                command: command.to_string(),
                name: argument.name.clone(),
            }),
            ArgumentArity::Exactly(_) => {}
        }
    }

    if variadic > 1 {
        errors.push(DeclarationError::MultipleVariadicArguments {
            command: command.to_string(),
        });
    }
}

fn validate_groups(command: &str, decl: &CommandDecl, errors: &mut Vec<DeclarationError>) {
    let keys: HashSet<String> = decl.options.iter().map(OptionDecl::key).collect();
    let mut grouped = HashSet::new();

    for group in &decl.groups {
        for member in &group.options {
            if !keys.contains(member) {
                errors.push(DeclarationError::UnknownGroupMember {
                    command: command.to_string(),
                    group: group.name.clone(),
                    option: member.clone(),
                });
            } else if !grouped.insert(member.as_str()) {
                errors.push(DeclarationError::OptionInMultipleGroups {
                    command: command.to_string(),
                    option: member.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arity, ArgumentDecl, EagerAction, GroupDecl};

    #[test]
    fn test_valid_tree_has_no_errors() {
        let tool = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["-v", "--verbose"]).with_secondary(&["--quiet"]))
            .with_option(OptionDecl::single(&["+x", "-x"]).with_id("x"))
            .with_argument(ArgumentDecl::required("files").variadic())
            .with_group(GroupDecl::mutually_exclusive("mode", &["verbose", "x"]))
            .with_subcommand(CommandDecl::new("run"));
        assert!(validate_command(&tool).is_empty());
    }

    #[test]
    fn test_rejects_unprefixed_and_duplicate_names() {
        let tool = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["verbose"]))
            .with_option(OptionDecl::flag(&["-q"]).with_id("a"))
            .with_option(OptionDecl::flag(&["-q"]).with_id("b"));
        let errors = validate_command(&tool);
        assert_eq!(
            errors,
            vec![
                DeclarationError::MissingOptionPrefix {
                    command: "tool".into(),
                    name: "verbose".into()
                },
                DeclarationError::DuplicateOptionName {
                    command: "tool".into(),
                    name: "-q".into()
                },
            ]
        );
    }

    #[test]
    fn test_rejects_second_number_option_and_variadic() {
        let tool = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["-a"]).number_option())
            .with_option(OptionDecl::single(&["-b"]).number_option())
            .with_argument(ArgumentDecl::required("x").variadic())
            .with_argument(ArgumentDecl::required("y").variadic());
        let errors = validate_command(&tool);
        assert!(errors.contains(&DeclarationError::MultipleNumberOptions {
            command: "tool".into()
        }));
        assert!(errors.contains(&DeclarationError::MultipleVariadicArguments {
            command: "tool".into()
        }));
    }

    #[test]
    fn test_rejects_nested_chains() {
        let inner = CommandDecl::new("inner").allow_multiple_subcommands();
        let tool = CommandDecl::new("tool")
            .allow_multiple_subcommands()
            .with_subcommand(CommandDecl::new("mid").with_subcommand(inner));
        assert_eq!(
            validate_command(&tool),
            vec![DeclarationError::NestedMultipleSubcommands(
                "tool mid inner".into()
            )]
        );
    }

    #[test]
    fn test_rejects_bad_arity_eager_and_split() {
        let tool = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--f"]).with_nvalues(Arity::SINGLE))
            .with_option(OptionDecl::single(&["--r"]).with_nvalues(Arity::range(3, 1)))
            .with_option(
                OptionDecl::single(&["--version"]).eager(EagerAction::Message {
                    text: "1.0".into(),
                    error: false,
                }),
            )
            .with_option(OptionDecl::multiple(&["--path"]).with_envvar_split("("));
        let errors = validate_command(&tool);
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], DeclarationError::InvalidArity { .. }));
        assert!(matches!(errors[1], DeclarationError::InvalidArity { .. }));
        assert!(matches!(errors[2], DeclarationError::EagerOptionNotFlag { .. }));
        assert!(matches!(errors[3], DeclarationError::InvalidEnvvarSplit { .. }));
    }

    #[test]
    fn test_rejects_broken_groups() {
        let tool = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--a"]))
            .with_group(GroupDecl::plain("one", &["a", "missing"]))
            .with_group(GroupDecl::plain("two", &["a"]));
        let errors = validate_command(&tool);
        assert_eq!(
            errors,
            vec![
                DeclarationError::UnknownGroupMember {
                    command: "tool".into(),
                    group: "one".into(),
                    option: "missing".into()
                },
                DeclarationError::OptionInMultipleGroups {
                    command: "tool".into(),
                    option: "a".into()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_subcommands_and_empty_names() {
        let tool = CommandDecl::new("tool")
            .with_subcommand(CommandDecl::new("run"))
            .with_subcommand(CommandDecl::new("run"))
            .with_subcommand(CommandDecl::new(" "));
        let errors = validate_command(&tool);
        assert_eq!(
            errors,
            vec![
                DeclarationError::DuplicateSubcommand {
                    command: "tool".into(),
                    name: "run".into()
                },
                DeclarationError::EmptyCommandName("tool".into()),
            ]
        );
    }
}
