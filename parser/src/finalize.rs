//! Finalizer: turns one command's invocations into [`ParsedValues`].
//!
//! Values are resolved in a fixed order: eager options, parse errors,
//! ungrouped options that occurred (first occurrence order), ungrouped
//! options that did not occur, groups, arguments, the subcommand presence
//! check and finally the validators. Every usage error found along the way
//! is collected; an eager option that was invoked halts immediately.
//!
//! For an option without a command-line invocation the environment variable
//! and the value source are consulted (in the order the context selects),
//! then the declared default.

use std::collections::HashSet;

use argtree_core::{
    ArgumentDecl, ArgumentArity, CliError, CommandError, CommandInvocation, Context, EagerAction,
    GroupDecl, GroupKind, Halt, HaltReason, Invocation, MultiUsageError, OptionDecl, OptionKind,
    ParsedValues, Registry, ResolvedValue, UsageError, ValueOrigin,
};
use regex::Regex;
use tracing::debug;

/// An option value before required-ness is checked.
struct Resolution {
    value: ResolvedValue,
    origin: Option<ValueOrigin>,
    /// Name of the first command-line occurrence, if any.
    used_name: Option<String>,
}

impl Resolution {
    /// Returns `true` if a value came from the command line, an envvar or
    /// the value source (defaults do not count).
    fn is_supplied(&self) -> bool {
        matches!(
            self.origin,
            Some(ValueOrigin::CommandLine | ValueOrigin::Envvar | ValueOrigin::ValueSource)
        )
    }
}

/// Finalizes one command invocation.
///
/// Returns the resolved values, a [`CliError::Halt`] when an eager option was
/// invoked, or a [`CliError::Usage`] with every error of this command.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, ContextSettings, OptionDecl};
/// use argtree_parser::{finalize, parse_argv};
///
/// let root = CommandDecl::new("tool")
///     .with_option(OptionDecl::counted(&["-v"]))
///     .with_option(OptionDecl::single(&["--name"]).with_default(&["anon"]));
/// let parsed = parse_argv(&root, &["-vvv"], &ContextSettings::default());
/// let values = finalize(&parsed.invocation).unwrap();
///
/// assert_eq!(values.count("v"), 3);
/// assert_eq!(values.value("name"), Some("anon"));
/// ```
pub fn finalize(invocation: &CommandInvocation<'_>) -> Result<ParsedValues, CliError> {
    let context = &invocation.context;
    let registry = Registry::new(invocation.command, context);
    let mut values = ParsedValues::default();
    let mut errors: Vec<UsageError> = Vec::new();
    let mut done: HashSet<String> = HashSet::new();

    finalize_eager(invocation, &registry, &mut values, &mut done)?;

    errors.extend(invocation.errors.iter().cloned());
    let parse_failed = !invocation.errors.is_empty();

    let mut invoked_order: Vec<String> = Vec::new();
    for oi in &invocation.option_invocations {
        if !invoked_order.contains(&oi.option) {
            invoked_order.push(oi.option.clone());
        }
    }
    let ungrouped_invoked = invoked_order
        .iter()
        .filter_map(|key| registry.find_key(key));
    let ungrouped_rest = registry
        .options()
        .filter(|o| !invoked_order.contains(&o.key()));

    for option in ungrouped_invoked.chain(ungrouped_rest) {
        let key = option.key();
        if done.contains(&key) || registry.group_of(&key).is_some() {
            continue;
        }
        match resolve_option(context, option, invocation.invocations_of(&key)) {
            Ok(resolution) => {
                if option.required && resolution.origin.is_none() {
                    errors.push(missing_option(option));
                }
                values.insert_option(&key, resolution.value, resolution.origin);
            }
            Err(err) => errors.push(err),
        }
        done.insert(key);
    }

    for group in registry.groups() {
        finalize_group(invocation, &registry, group, &mut values, &mut errors);
    }

    if !parse_failed {
        for argument in registry.arguments() {
            match resolve_argument(invocation, argument) {
                Ok(value) => values.insert_argument(&argument.name, value),
                Err(err) => errors.push(err),
            }
        }

        let command = invocation.command;
        if !command.subcommands.is_empty()
            && invocation.children.is_empty()
            && !command.invoke_without_subcommand
        {
            errors.push(UsageError::MissingSubcommand);
        }
    }

    if errors.is_empty() {
        errors.extend(run_validators(&registry, &values));
    }

    if !context.collect_all_errors() {
        errors.truncate(1);
    }
    let located = errors
        .into_iter()
        .map(|error| CommandError {
            command_path: context.command_path().to_vec(),
            error,
        })
        .collect();
    match MultiUsageError::build(located) {
        Some(errors) => Err(CliError::Usage(errors)),
        None => Ok(values),
    }
}

fn missing_option(option: &OptionDecl) -> UsageError {
    UsageError::MissingOption {
        name: option.longest_name().to_string(),
    }
}

/// Finalizes every eager option; an invoked one halts.
fn finalize_eager(
    invocation: &CommandInvocation<'_>,
    registry: &Registry<'_>,
    values: &mut ParsedValues,
    done: &mut HashSet<String>,
) -> Result<(), CliError> {
    for option in registry.options() {
        let Some(action) = &option.eager else {
            continue;
        };
        let key = option.key();
        let occurrences = invocation.invocations_of(&key);
        let on = occurrences
            .last()
            .is_some_and(|last| !option.is_secondary(&last.name));
        if on {
            debug!(
                command = invocation.context.command_name(),
                option = option.longest_name(),
                "eager option halts"
            );
            let (reason, error) = match action {
                EagerAction::Help => (HaltReason::Help, false),
                EagerAction::Message { text, error } => (HaltReason::Message(text.clone()), *error),
            };
            return Err(CliError::Halt(Halt {
                reason,
                command_path: invocation.context.command_path().to_vec(),
                error,
            }));
        }
        let origin = (!occurrences.is_empty()).then_some(ValueOrigin::CommandLine);
        values.insert_option(&key, ResolvedValue::Flag(false), origin);
        done.insert(key);
    }
    Ok(())
}

fn finalize_group(
    invocation: &CommandInvocation<'_>,
    registry: &Registry<'_>,
    group: &GroupDecl,
    values: &mut ParsedValues,
    errors: &mut Vec<UsageError>,
) {
    let context = &invocation.context;
    let mut members: Vec<(&OptionDecl, Resolution)> = Vec::new();
    for key in &group.options {
        let Some(option) = registry.find_key(key) else {
            continue;
        };
        if option.eager.is_some() {
            continue;
        }
        match resolve_option(context, option, invocation.invocations_of(key)) {
            Ok(resolution) => members.push((option, resolution)),
            Err(err) => errors.push(err),
        }
    }

    let supplied: Vec<&(&OptionDecl, Resolution)> =
        members.iter().filter(|(_, r)| r.is_supplied()).collect();
    let enforce_required = match group.kind {
        GroupKind::CoOccurring => !supplied.is_empty(),
        GroupKind::Plain | GroupKind::MutuallyExclusive => true,
    };
    if enforce_required {
        for (option, resolution) in &members {
            if option.required && resolution.origin.is_none() {
                errors.push(missing_option(option));
            }
        }
    }

    if group.kind == GroupKind::MutuallyExclusive && supplied.len() > 1 {
        let names = supplied
            .iter()
            .map(|(option, r)| {
                r.used_name
                    .clone()
                    .unwrap_or_else(|| option.longest_name().to_string())
            })
            .collect();
        errors.push(UsageError::MutuallyExclusive { names });
    }
    if group.required && supplied.is_empty() {
        let names = members
            .iter()
            .map(|(option, _)| option.longest_name().to_string())
            .collect();
        errors.push(UsageError::MissingGroup { names });
    }

    for (option, resolution) in members {
        values.insert_option(&option.key(), resolution.value, resolution.origin);
    }
}

/// Resolves an option from its command-line invocations, falling back to
/// envvars, the value source and the default.
fn resolve_option(
    context: &Context,
    option: &OptionDecl,
    command_line: Vec<Invocation>,
) -> Result<Resolution, UsageError> {
    if !command_line.is_empty() {
        let used_name = command_line.first().map(|i| i.name.clone());
        let value = value_from_invocations(option, &command_line, true)?;
        return Ok(Resolution {
            value,
            origin: Some(ValueOrigin::CommandLine),
            used_name,
        });
    }

    for origin in external_order(context) {
        let invocations = match origin {
            ValueOrigin::Envvar => envvar_invocations(context, option)?,
            _ => context
                .value_source()
                .map(|source| source.values(context, option))
                .unwrap_or_default(),
        };
        if invocations.is_empty() {
            continue;
        }
        check_external_arity(option, &invocations)?;
        let value = value_from_invocations(option, &invocations, false)?;
        return Ok(Resolution {
            value,
            origin: Some(origin),
            used_name: None,
        });
    }

    default_resolution(option)
}

fn external_order(context: &Context) -> [ValueOrigin; 2] {
    if context.read_envvar_before_value_source() {
        [ValueOrigin::Envvar, ValueOrigin::ValueSource]
    } else {
        [ValueOrigin::ValueSource, ValueOrigin::Envvar]
    }
}

/// Synthesizes invocations from the option's environment variable.
fn envvar_invocations(context: &Context, option: &OptionDecl) -> Result<Vec<Invocation>, UsageError> {
    let Some(name) = context.envvar_name(option) else {
        return Ok(Vec::new());
    };
    let Some(raw) = context.read_env(&name) else {
        return Ok(Vec::new());
    };
    debug!(envvar = name.as_str(), option = option.longest_name(), "reading envvar");

    let split_values = |part: &str| -> Vec<String> {
        if option.nvalues.max > 1 {
            part.split_whitespace().map(str::to_string).collect()
        } else {
            vec![part.to_string()]
        }
    };

    match &option.envvar_split {
        Some(pattern) => {
            let regex = Regex::new(pattern).map_err(|err| UsageError::BadParameterValue {
                name: option.longest_name().to_string(),
                message: err.to_string(),
            })?;
            Ok(regex
                .split(&raw)
                .filter(|part| !part.is_empty())
                .map(|part| Invocation::new(&name, split_values(part)))
                .collect())
        }
        None => Ok(vec![Invocation::new(&name, split_values(&raw))]),
    }
}

/// Value-taking options must receive an accepted number of values from
/// envvars and value sources, like on the command line.
fn check_external_arity(option: &OptionDecl, invocations: &[Invocation]) -> Result<(), UsageError> {
    if matches!(option.kind, OptionKind::Flag | OptionKind::Counted) {
        return Ok(());
    }
    match invocations.iter().find(|i| !option.nvalues.accepts(i.values.len())) {
        Some(bad) => Err(UsageError::IncorrectOptionValueCount {
            name: option.longest_name().to_string(),
            expected: option.nvalues,
            received: bad.values.len(),
        }),
        None => Ok(()),
    }
}

fn parse_bool(option: &OptionDecl, raw: &str) -> Result<bool, UsageError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" => Ok(false),
        _ => Err(UsageError::BadParameterValue {
            name: option.longest_name().to_string(),
            message: format!("{raw} is not a valid boolean"),
        }),
    }
}

fn parse_count(option: &OptionDecl, raw: &str) -> Result<u64, UsageError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| UsageError::BadParameterValue {
            name: option.longest_name().to_string(),
            message: format!("{raw} is not a valid count"),
        })
}

/// Values of one occurrence, with the implicit value filling an empty one.
fn occurrence_values(option: &OptionDecl, invocation: &Invocation) -> Vec<String> {
    match (&option.implicit_value, invocation.values.is_empty()) {
        (Some(implicit), true) => vec![implicit.clone()],
        _ => invocation.values.clone(),
    }
}

/// Applies the option kind to non-empty invocations.
fn value_from_invocations(
    option: &OptionDecl,
    invocations: &[Invocation],
    from_command_line: bool,
) -> Result<ResolvedValue, UsageError> {
    let Some(last) = invocations.last() else {
        return Ok(ResolvedValue::Absent);
    };
    match option.kind {
        OptionKind::Flag if from_command_line => {
            Ok(ResolvedValue::Flag(!option.is_secondary(&last.name)))
        }
        OptionKind::Flag => {
            let raw = last.values.first().map(String::as_str).unwrap_or_default();
            parse_bool(option, raw).map(ResolvedValue::Flag)
        }
        OptionKind::Counted if from_command_line => {
            Ok(ResolvedValue::Count(invocations.len() as u64))
        }
        OptionKind::Counted => {
            let raw = last.values.first().map(String::as_str).unwrap_or_default();
            parse_count(option, raw).map(ResolvedValue::Count)
        }
        OptionKind::Single => Ok(ResolvedValue::Values(occurrence_values(option, last))),
        OptionKind::Multiple => Ok(ResolvedValue::Occurrences(
            invocations
                .iter()
                .map(|invocation| occurrence_values(option, invocation))
                .collect(),
        )),
    }
}

/// Value used when no source supplied anything.
fn default_resolution(option: &OptionDecl) -> Result<Resolution, UsageError> {
    let resolution = |value, origin| Resolution {
        value,
        origin,
        used_name: None,
    };
    let Some(default) = &option.default else {
        let value = match option.kind {
            OptionKind::Flag => ResolvedValue::Flag(false),
            OptionKind::Counted => ResolvedValue::Count(0),
            OptionKind::Single => ResolvedValue::Absent,
            OptionKind::Multiple => ResolvedValue::Occurrences(Vec::new()),
        };
        return Ok(resolution(value, None));
    };

    let first = default.first().map(String::as_str).unwrap_or_default();
    let value = match option.kind {
        OptionKind::Flag => ResolvedValue::Flag(parse_bool(option, first)?),
        OptionKind::Counted => ResolvedValue::Count(parse_count(option, first)?),
        OptionKind::Single => ResolvedValue::Values(default.clone()),
        OptionKind::Multiple => {
            ResolvedValue::Occurrences(default.iter().map(|v| vec![v.clone()]).collect())
        }
    };
    Ok(resolution(value, Some(ValueOrigin::Default)))
}

fn resolve_argument(
    invocation: &CommandInvocation<'_>,
    argument: &ArgumentDecl,
) -> Result<ResolvedValue, UsageError> {
    let tokens = invocation.argument_values(&argument.name).unwrap_or_default();
    if !tokens.is_empty() {
        return Ok(ResolvedValue::Values(tokens.to_vec()));
    }
    if let Some(default) = &argument.default {
        return Ok(ResolvedValue::Values(default.clone()));
    }
    match argument.nvalues {
        ArgumentArity::Variadic if argument.required => Err(UsageError::MissingArgument {
            name: argument.name.clone(),
        }),
        ArgumentArity::Variadic => Ok(ResolvedValue::Values(Vec::new())),
        ArgumentArity::Exactly(_) if argument.required => Err(UsageError::MissingArgument {
            name: argument.name.clone(),
        }),
        ArgumentArity::Exactly(_) => Ok(ResolvedValue::Absent),
    }
}

/// Runs option validators (ungrouped first, then group members) and then
/// argument validators. Absent values are not validated.
fn run_validators(registry: &Registry<'_>, values: &ParsedValues) -> Vec<UsageError> {
    let mut errors = Vec::new();
    let ungrouped = registry
        .options()
        .filter(|o| registry.group_of(&o.key()).is_none());
    let grouped = registry
        .groups()
        .iter()
        .flat_map(|g| g.options.iter())
        .filter_map(|key| registry.find_key(key));

    for option in ungrouped.chain(grouped) {
        let Some(value) = values.option(&option.key()) else {
            continue;
        };
        if value.is_absent() {
            continue;
        }
        for validator in &option.validators {
            if let Err(message) = validator.check(value, values) {
                errors.push(UsageError::BadParameterValue {
                    name: option.longest_name().to_string(),
                    message,
                });
            }
        }
    }

    for argument in registry.arguments() {
        let Some(value) = values.argument(&argument.name) else {
            continue;
        };
        if value.is_absent() {
            continue;
        }
        for validator in &argument.validators {
            if let Err(message) = validator.check(value, values) {
                errors.push(UsageError::BadParameterValue {
                    name: argument.name.clone(),
                    message,
                });
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::parse_argv;
    use argtree_core::{ArgumentDecl, CommandDecl, ContextSettings};

    fn run(
        command: &CommandDecl,
        argv: &[&str],
        settings: &ContextSettings,
    ) -> Result<ParsedValues, CliError> {
        let parsed = parse_argv(command, argv, settings);
        finalize(&parsed.invocation)
    }

    fn usage_errors(result: Result<ParsedValues, CliError>) -> Vec<UsageError> {
        match result {
            Err(CliError::Usage(errors)) => {
                errors.into_errors().into_iter().map(|e| e.error).collect()
            }
            other => panic!("expected usage errors, got {other:?}"),
        }
    }

    fn env(vars: &[(&str, &str)]) -> ContextSettings {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ContextSettings::default().with_env_map(map)
    }

    #[test]
    fn test_flag_with_secondary_name() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--color"]).with_secondary(&["--no-color"]));
        let settings = ContextSettings::default();
        let values = run(&command, &["--color", "--no-color"], &settings).unwrap();
        assert!(!values.flag("color"));
        assert_eq!(values.origin("color"), Some(ValueOrigin::CommandLine));

        let values = run(&command, &[], &settings).unwrap();
        assert_eq!(values.option("color"), Some(&ResolvedValue::Flag(false)));
        assert_eq!(values.origin("color"), None);
    }

    #[test]
    fn test_required_option_missing() {
        let command = CommandDecl::new("tool").with_option(OptionDecl::single(&["--x"]).required());
        let errors = usage_errors(run(&command, &[], &ContextSettings::default()));
        assert_eq!(errors, vec![UsageError::MissingOption { name: "--x".into() }]);
    }

    #[test]
    fn test_command_line_beats_envvar() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--name"]).with_envvar("NAME"));
        let settings = env(&[("NAME", "from-env")]);

        let values = run(&command, &["--name", "cli"], &settings).unwrap();
        assert_eq!(values.value("name"), Some("cli"));
        assert_eq!(values.origin("name"), Some(ValueOrigin::CommandLine));

        let values = run(&command, &[], &settings).unwrap();
        assert_eq!(values.value("name"), Some("from-env"));
        assert_eq!(values.origin("name"), Some(ValueOrigin::Envvar));

        let values = run(&command, &["--name", "cli"], &settings.with_value_source_first()).unwrap();
        assert_eq!(values.value("name"), Some("cli"));
    }

    #[test]
    fn test_inferred_envvar_and_split() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::multiple(&["--include-dir"]).with_envvar_split(":"))
            .with_option(OptionDecl::single(&["--point"]).with_nvalues(argtree_core::Arity::exactly(2)))
            .with_option(OptionDecl::flag(&["--debug"]))
            .with_option(OptionDecl::counted(&["-v", "--verbose"]));
        let settings = env(&[
            ("TOOL_INCLUDE_DIR", "a:b::c"),
            ("TOOL_POINT", "1 2"),
            ("TOOL_DEBUG", "Yes"),
            ("TOOL_VERBOSE", "3"),
        ])
        .with_auto_envvar_prefix("TOOL");

        let values = run(&command, &[], &settings).unwrap();
        assert_eq!(
            values.occurrences("include-dir"),
            [vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
        assert_eq!(values.values("point"), ["1", "2"]);
        assert!(values.flag("debug"));
        assert_eq!(values.count("verbose"), 3);
    }

    #[test]
    fn test_bad_envvar_boolean() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--debug"]).with_envvar("DEBUG"));
        let errors = usage_errors(run(&command, &[], &env(&[("DEBUG", "maybe")])));
        assert!(matches!(
            errors.as_slice(),
            [UsageError::BadParameterValue { name, .. }] if name == "--debug"
        ));
    }

    #[test]
    fn test_defaults_and_implicit_value() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::multiple(&["--tag"]).with_default(&["a", "b"]))
            .with_option(
                OptionDecl::single(&["--color"])
                    .with_nvalues(argtree_core::Arity::OPTIONAL)
                    .with_implicit_value("auto"),
            );
        let settings = ContextSettings::default();

        let values = run(&command, &[], &settings).unwrap();
        assert_eq!(values.occurrences("tag").len(), 2);
        assert_eq!(values.origin("tag"), Some(ValueOrigin::Default));
        assert!(values.option("color").is_some_and(ResolvedValue::is_absent));

        let values = run(&command, &["--color"], &settings).unwrap();
        assert_eq!(values.value("color"), Some("auto"));
    }

    #[test]
    fn test_eager_halt_beats_parse_errors() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--version"]).eager(EagerAction::Message {
                text: "tool 1.0".into(),
                error: false,
            }))
            .with_argument(ArgumentDecl::required("file"));
        let result = run(&command, &["--bogus", "--version"], &ContextSettings::default());
        match result {
            Err(CliError::Halt(halt)) => {
                assert_eq!(halt.reason, HaltReason::Message("tool 1.0".into()));
                assert!(!halt.error);
            }
            other => panic!("expected halt, got {other:?}"),
        }

        let help = run(&command, &["-h"], &ContextSettings::default());
        assert!(matches!(
            help,
            Err(CliError::Halt(Halt { reason: HaltReason::Help, .. }))
        ));
    }

    #[test]
    fn test_errors_are_collected() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--a"]).required())
            .with_option(OptionDecl::single(&["--b"]).required())
            .with_argument(ArgumentDecl::required("file"));
        let errors = usage_errors(run(&command, &[], &ContextSettings::default()));
        assert_eq!(
            errors,
            vec![
                UsageError::MissingArgument { name: "file".into() },
                UsageError::MissingOption { name: "--a".into() },
                UsageError::MissingOption { name: "--b".into() },
            ]
        );

        let first_only = ContextSettings::default().with_first_error_only();
        assert_eq!(usage_errors(run(&command, &[], &first_only)).len(), 1);
    }

    #[test]
    fn test_mutually_exclusive_group() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--json"]))
            .with_option(OptionDecl::flag(&["--yaml"]).with_envvar("YAML"))
            .with_group(GroupDecl::mutually_exclusive("format", &["json", "yaml"]).required());

        let errors = usage_errors(run(&command, &["--json"], &env(&[("YAML", "1")])));
        assert_eq!(
            errors,
            vec![UsageError::MutuallyExclusive {
                names: vec!["--json".into(), "--yaml".into()]
            }]
        );

        let errors = usage_errors(run(&command, &[], &env(&[])));
        assert_eq!(
            errors,
            vec![UsageError::MissingGroup {
                names: vec!["--json".into(), "--yaml".into()]
            }]
        );

        let values = run(&command, &["--yaml"], &env(&[])).unwrap();
        assert!(values.flag("yaml"));
    }

    #[test]
    fn test_co_occurring_group() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--user"]).required())
            .with_option(OptionDecl::single(&["--password"]).required())
            .with_group(GroupDecl::co_occurring("login", &["user", "password"]));
        let settings = ContextSettings::default();

        assert!(run(&command, &[], &settings).is_ok());
        let errors = usage_errors(run(&command, &["--user", "me"], &settings));
        assert_eq!(
            errors,
            vec![UsageError::MissingOption {
                name: "--password".into()
            }]
        );
    }

    #[test]
    fn test_missing_subcommand() {
        let command = CommandDecl::new("tool").with_subcommand(CommandDecl::new("run"));
        let errors = usage_errors(run(&command, &[], &ContextSettings::default()));
        assert_eq!(errors, vec![UsageError::MissingSubcommand]);

        let optional = command.clone().invoke_without_subcommand();
        assert!(run(&optional, &[], &ContextSettings::default()).is_ok());
    }

    #[test]
    fn test_validators_see_all_values() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--min"]))
            .with_option(OptionDecl::single(&["--max"]).with_validator(|value, all| {
                let max: i64 = value.first().and_then(|v| v.parse().ok()).unwrap_or(0);
                let min: i64 = all.value("min").and_then(|v| v.parse().ok()).unwrap_or(0);
                if max >= min {
                    Ok(())
                } else {
                    Err("must not be below --min".into())
                }
            }))
            .with_argument(ArgumentDecl::optional("file").with_validator(|value, _| {
                match value.first() {
                    Some(v) if v.ends_with(".txt") => Ok(()),
                    _ => Err("must be a .txt file".into()),
                }
            }));
        let settings = ContextSettings::default();

        assert!(run(&command, &["--min", "1", "--max", "5", "a.txt"], &settings).is_ok());
        assert!(run(&command, &[], &settings).is_ok());
        let errors = usage_errors(run(&command, &["--min", "9", "--max", "5", "a.md"], &settings));
        assert_eq!(
            errors,
            vec![
                UsageError::BadParameterValue {
                    name: "--max".into(),
                    message: "must not be below --min".into()
                },
                UsageError::BadParameterValue {
                    name: "file".into(),
                    message: "must be a .txt file".into()
                },
            ]
        );
    }

    #[test]
    fn test_argument_defaults() {
        let command = CommandDecl::new("tool")
            .with_argument(ArgumentDecl::optional("dest").with_default(&["."]))
            .with_argument(ArgumentDecl::optional("extra").variadic());
        let values = run(&command, &[], &ContextSettings::default()).unwrap();
        assert_eq!(values.argument_value("dest"), Some("."));
        assert_eq!(values.argument("extra"), Some(&ResolvedValue::Values(Vec::new())));
    }
}
