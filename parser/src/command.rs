//! Single-command parser.
//!
//! [`CommandParser`] scans the token window of one command, starting at a
//! given index of the shared [`TokenBuffer`]. It records option invocations,
//! assigns positional tokens to arguments and stops at the first token that
//! names a subcommand. Problems are recorded as [`UsageError`]s and scanning
//! continues; a command with errors never hands over to a subcommand.

use argtree_core::{
    ArgumentInvocation, CommandDecl, Context, FileReadError, Invocation, OptionDecl,
    OptionInvocation, Registry, UsageError, split_option_prefix,
};
use tracing::{debug, trace};

use crate::lexer::lex_argument_file;

/// A subcommand reachable from the command being parsed.
#[derive(Debug, Clone)]
pub(crate) struct SubcommandEntry<'a> {
    pub name: String,
    pub command: &'a CommandDecl,
    /// Depth of the command that declares this subcommand.
    pub owner_depth: usize,
}

/// Tokens produced by one alias or `@file` expansion that are still ahead
/// of the scan.
#[derive(Debug, Clone)]
struct SplicedRegion {
    source: SpliceSource,
    /// Path of the command whose scan spliced the tokens.
    owner: Vec<String>,
    start: usize,
    end: usize,
}

impl SplicedRegion {
    fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// The token list shared by every command of one parse.
///
/// Alias and `@file` expansion splice tokens into the buffer in place. A
/// command never expands an alias inside a region it spliced itself, so
/// self-referencing aliases terminate. Regions spliced by other commands do
/// not block expansion: a parent alias that names a subcommand behaves like
/// typing its expansion directly.
#[derive(Debug, Clone)]
pub(crate) struct TokenBuffer {
    tokens: Vec<String>,
    regions: Vec<SplicedRegion>,
}

/// Where spliced tokens came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SpliceSource {
    Alias,
    File(String),
}

impl TokenBuffer {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            tokens: argv,
            regions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    fn is_file_open(&self, name: &str, index: usize) -> bool {
        self.regions.iter().any(|region| {
            region.contains(index)
                && matches!(&region.source, SpliceSource::File(open) if open == name)
        })
    }

    /// Returns `true` if the command at `owner` may expand an alias at `index`.
    fn may_expand_alias(&self, owner: &[String], index: usize) -> bool {
        !self
            .regions
            .iter()
            .any(|region| region.owner == owner && region.contains(index))
    }

    /// Replaces the token at `index` with `replacement`.
    fn splice(
        &mut self,
        index: usize,
        replacement: Vec<String>,
        source: SpliceSource,
        owner: &[String],
    ) {
        let inserted = replacement.len();
        self.tokens.splice(index..=index, replacement);

        let shift = |position: usize| {
            if position > index {
                (position + inserted).saturating_sub(1)
            } else {
                position
            }
        };
        for region in &mut self.regions {
            region.start = shift(region.start);
            region.end = shift(region.end);
        }
        self.regions.retain(|region| region.end > index);
        self.regions.push(SplicedRegion {
            source,
            owner: owner.to_vec(),
            start: index,
            end: index + inserted,
        });
    }
}

/// What the parser does with the token at the current index.
enum Step<'a> {
    /// Move past `n` tokens.
    Advance(usize),
    /// Replace the current token and rescan from the same index.
    Splice {
        tokens: Vec<String>,
        source: SpliceSource,
    },
    /// Stop: the current token names a subcommand.
    Subcommand(SubcommandEntry<'a>),
}

/// Result of parsing one command's window.
#[derive(Debug)]
pub(crate) struct CommandParseOutcome<'a> {
    /// Index of the first token not consumed by this command.
    pub index: usize,
    pub option_invocations: Vec<OptionInvocation>,
    pub argument_invocations: Vec<ArgumentInvocation>,
    pub errors: Vec<UsageError>,
    pub next: Option<SubcommandEntry<'a>>,
}

/// Values collected for one option occurrence.
struct Consumed {
    values: Result<Vec<String>, UsageError>,
    next: usize,
}

pub(crate) struct CommandParser<'a, 'c> {
    command: &'a CommandDecl,
    context: &'c Context,
    registry: Registry<'a>,
    subcommands: &'c [SubcommandEntry<'a>],
    can_parse_options: bool,
    can_expand_files: bool,
    positional: Vec<String>,
    option_invocations: Vec<OptionInvocation>,
    errors: Vec<UsageError>,
}

impl<'a, 'c> CommandParser<'a, 'c> {
    pub fn new(
        command: &'a CommandDecl,
        context: &'c Context,
        subcommands: &'c [SubcommandEntry<'a>],
    ) -> Self {
        Self {
            command,
            context,
            registry: Registry::new(command, context),
            subcommands,
            can_parse_options: true,
            can_expand_files: context.expand_argument_files(),
            positional: Vec::new(),
            option_invocations: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scans tokens from `start` until the window ends or a subcommand is
    /// found, then assigns positional tokens to arguments.
    pub fn parse(mut self, buffer: &mut TokenBuffer, start: usize) -> CommandParseOutcome<'a> {
        let mut index = start;
        let mut next = None;

        while index < buffer.len() {
            match self.step(buffer, index) {
                Step::Advance(n) => index += n,
                Step::Splice { tokens, source } => {
                    debug!(
                        command = self.context.command_name(),
                        index,
                        count = tokens.len(),
                        ?source,
                        "splicing tokens"
                    );
                    buffer.splice(index, tokens, source, self.context.command_path());
                }
                Step::Subcommand(entry) => {
                    index += 1;
                    next = Some(entry);
                    break;
                }
            }
        }

        let positional = std::mem::take(&mut self.positional);
        let argument_invocations = self.assign_arguments(positional);
        if !self.errors.is_empty() {
            next = None;
        }

        CommandParseOutcome {
            index,
            option_invocations: self.option_invocations,
            argument_invocations,
            errors: self.errors,
            next,
        }
    }

    fn step(&mut self, buffer: &TokenBuffer, index: usize) -> Step<'a> {
        let Some(token) = buffer.get(index) else {
            return Step::Advance(1);
        };
        let transformed = self.context.transform_token(token);

        if self.can_expand_files
            && token.len() > 1
            && token.starts_with('@')
            && self.registry.find(&transformed).is_none()
        {
            trace!(token, "argument file");
            return self.expand_file(buffer, index, token);
        }

        if token == "--" && self.can_parse_options {
            trace!("option terminator");
            self.can_parse_options = false;
            self.can_expand_files = false;
            return Step::Advance(1);
        }

        if self.can_parse_options {
            let (prefix, _) = split_option_prefix(token);
            let prefix_len = prefix.chars().count();
            if self.is_long_option(token, &transformed, prefix_len, prefix) {
                trace!(token, "long option");
                return Step::Advance(self.parse_long_option(buffer, index, token));
            }
            if token.chars().count() >= 2
                && prefix_len == 1
                && self.registry.is_known_prefix(prefix)
            {
                trace!(token, "short options");
                let consumed = if self.context.allow_grouped_short_options() {
                    self.parse_short_options(buffer, index, token)
                } else {
                    self.parse_long_option(buffer, index, token)
                };
                return Step::Advance(consumed);
            }
        }

        if buffer.may_expand_alias(self.context.command_path(), index)
            && let Some(expansion) = self.context.aliases().get(&transformed)
        {
            trace!(token, "alias");
            return Step::Splice {
                tokens: expansion.clone(),
                source: SpliceSource::Alias,
            };
        }

        if self.positional.len() >= self.registry.required_fixed_width()
            && let Some(entry) = self.find_subcommand(&transformed)
        {
            debug!(
                command = self.context.command_name(),
                subcommand = %entry.name,
                "subcommand"
            );
            return Step::Subcommand(entry.clone());
        }

        trace!(token, "positional");
        self.push_positional(token.to_string());
        Step::Advance(1)
    }

    fn is_long_option(
        &self,
        token: &str,
        transformed: &str,
        prefix_len: usize,
        prefix: &str,
    ) -> bool {
        (prefix_len > 1 && self.registry.is_known_prefix(prefix))
            || self.registry.is_long_name(transformed)
            || self.is_long_option_with_equals(token)
    }

    fn is_long_option_with_equals(&self, token: &str) -> bool {
        token.split_once('=').is_some_and(|(name, _)| {
            self.registry
                .is_long_name(&self.context.transform_token(name))
        })
    }

    fn find_subcommand(&self, transformed: &str) -> Option<&SubcommandEntry<'a>> {
        self.subcommands.iter().find(|entry| entry.name == transformed)
    }

    fn push_positional(&mut self, token: String) {
        self.positional.push(token);
        if !self.context.allow_interspersed_args() {
            self.can_parse_options = false;
        }
    }

    fn expand_file(&mut self, buffer: &TokenBuffer, index: usize, token: &str) -> Step<'a> {
        let name = &token[1..];
        if name.starts_with('@') {
            self.push_positional(name.to_string());
            return Step::Advance(1);
        }
        if buffer.is_file_open(name, index) {
            self.errors.push(UsageError::RecursiveArgumentFile {
                filename: name.to_string(),
            });
            return Step::Advance(1);
        }

        let text = match self.context.read_file(name) {
            Ok(text) => text,
            Err(FileReadError::NotFound) => {
                self.errors.push(UsageError::FileNotFound {
                    filename: name.to_string(),
                });
                return Step::Advance(1);
            }
            Err(FileReadError::Other(message)) => {
                self.errors.push(UsageError::UnreadableFile {
                    filename: name.to_string(),
                    message,
                });
                return Step::Advance(1);
            }
        };

        match lex_argument_file(name, &text) {
            Ok(tokens) => Step::Splice {
                tokens,
                source: SpliceSource::File(name.to_string()),
            },
            Err(err) => {
                self.errors.push(err);
                Step::Advance(1)
            }
        }
    }

    /// Returns `true` if `token` ends a greedy value run: anything the scan
    /// would read as an option, `--`, or a subcommand name.
    fn stops_value_run(&self, token: &str) -> bool {
        if token == "--" {
            return true;
        }
        let transformed = self.context.transform_token(token);
        self.registry.find(&transformed).is_some()
            || self.is_option_like(token, &transformed)
            || self.find_subcommand(&transformed).is_some()
    }

    fn is_option_like(&self, token: &str, transformed: &str) -> bool {
        let (prefix, body) = split_option_prefix(token);
        let prefix_len = prefix.chars().count();
        if self.is_long_option(token, transformed, prefix_len, prefix) {
            return true;
        }
        if prefix_len != 1 || !self.registry.is_known_prefix(prefix) {
            return false;
        }
        if self.registry.number_option().is_some()
            && !body.is_empty()
            && body.chars().all(|c| c.is_ascii_digit())
        {
            return true;
        }
        body.chars().next().is_some_and(|first| {
            let name = format!("{prefix}{first}");
            self.registry
                .find(&self.context.transform_token(&name))
                .is_some()
        })
    }

    fn consume_values(
        &self,
        buffer: &TokenBuffer,
        option: &OptionDecl,
        name: &str,
        attached: Option<String>,
        start: usize,
    ) -> Consumed {
        let arity = option.nvalues;
        let mut values = Vec::new();
        if let Some(value) = attached {
            if !arity.takes_value() {
                return Consumed {
                    values: Err(UsageError::IncorrectOptionValueCount {
                        name: name.to_string(),
                        expected: arity,
                        received: 1,
                    }),
                    next: start,
                };
            }
            values.push(value);
        }

        let mut next = start;
        if option.accepts_unattached_value {
            while values.len() < arity.max {
                let Some(token) = buffer.get(next) else {
                    break;
                };
                if values.len() >= arity.min && self.stops_value_run(token) {
                    break;
                }
                values.push(token.to_string());
                next += 1;
            }
        }

        if values.len() < arity.min {
            return Consumed {
                values: Err(UsageError::IncorrectOptionValueCount {
                    name: name.to_string(),
                    expected: arity,
                    received: values.len(),
                }),
                next,
            };
        }
        Consumed {
            values: Ok(values),
            next,
        }
    }

    fn record(&mut self, option: &OptionDecl, name: &str, values: Vec<String>) {
        self.option_invocations.push(OptionInvocation {
            option: option.key(),
            invocation: Invocation::new(name, values),
        });
    }

    fn unknown_option(&mut self, name: &str, transformed: &str) {
        let possibilities = self
            .context
            .suggest(transformed, &self.registry.visible_names());
        self.errors.push(UsageError::NoSuchOption {
            name: name.to_string(),
            possibilities,
        });
    }

    /// Parses `--name`, `--name=value` or `--name value...`; returns the
    /// number of tokens consumed.
    fn parse_long_option(&mut self, buffer: &TokenBuffer, index: usize, token: &str) -> usize {
        let (name, attached) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (token, None),
        };
        let transformed = self.context.transform_token(name);

        let Some(option) = self.registry.find(&transformed).cloned() else {
            if self.command.treat_unknown_options_as_args {
                self.push_positional(token.to_string());
            } else {
                self.unknown_option(name, &transformed);
            }
            return 1;
        };

        let consumed = self.consume_values(buffer, &option, name, attached, index + 1);
        match consumed.values {
            Ok(values) => self.record(&option, name, values),
            Err(err) => self.errors.push(err),
        }
        consumed.next - index
    }

    /// Parses a run of one-character options such as `-xvf file`; returns
    /// the number of tokens consumed.
    fn parse_short_options(&mut self, buffer: &TokenBuffer, index: usize, token: &str) -> usize {
        let (prefix, body) = split_option_prefix(token);

        if let Some(number) = self.registry.number_option().cloned()
            && body.chars().all(|c| c.is_ascii_digit())
        {
            self.record(&number, number.longest_name(), vec![body.to_string()]);
            return 1;
        }

        let mut flags = Vec::new();
        for (offset, ch) in body.char_indices() {
            let name = format!("{prefix}{ch}");
            let transformed = self.context.transform_token(&name);
            let Some(option) = self.registry.find(&transformed).cloned() else {
                if self.command.treat_unknown_options_as_args {
                    self.push_positional(token.to_string());
                    return 1;
                }
                self.commit(flags);
                self.unknown_option(&name, &transformed);
                return 1;
            };

            if option.nvalues.takes_value() {
                self.commit(flags);
                let rest = &body[offset + ch.len_utf8()..];
                let attached = (!rest.is_empty()).then(|| rest.to_string());
                let consumed = self.consume_values(buffer, &option, &name, attached, index + 1);
                match consumed.values {
                    Ok(values) => self.record(&option, &name, values),
                    Err(err) => self.errors.push(err),
                }
                return consumed.next - index;
            }
            flags.push((option, name));
        }

        self.commit(flags);
        1
    }

    fn commit(&mut self, flags: Vec<(OptionDecl, String)>) {
        for (option, name) in flags {
            self.option_invocations.push(OptionInvocation {
                option: option.key(),
                invocation: Invocation::bare(&name),
            });
        }
    }

    /// Distributes positional tokens over the declared arguments.
    ///
    /// Fixed-width arguments after a variadic one reserve their tokens
    /// first. Leftover tokens are reported as unexpected arguments (or as an
    /// unknown subcommand when a single token is left on a command that has
    /// subcommands).
    fn assign_arguments(&mut self, positional: Vec<String>) -> Vec<ArgumentInvocation> {
        let arguments = self.registry.arguments();
        let end_size: usize = arguments
            .iter()
            .rev()
            .map_while(|a| a.nvalues.fixed())
            .sum();

        let mut invocations = Vec::with_capacity(arguments.len());
        let mut taken = 0;
        let mut failed = false;

        for argument in arguments {
            let remaining = positional.len() - taken;
            let wanted = match argument.nvalues.fixed() {
                _ if failed => 0,
                Some(_) if !argument.required && remaining == 0 => 0,
                Some(n) => n,
                None => {
                    let minimum = usize::from(argument.required);
                    minimum.max(remaining.saturating_sub(end_size))
                }
            };

            if wanted > remaining {
                self.errors.push(if remaining == 0 {
                    UsageError::MissingArgument {
                        name: argument.name.clone(),
                    }
                } else {
                    UsageError::IncorrectArgumentValueCount {
                        name: argument.name.clone(),
                        expected: wanted,
                        received: remaining,
                    }
                });
                failed = true;
                invocations.push(ArgumentInvocation {
                    argument: argument.name.clone(),
                    values: Vec::new(),
                });
                continue;
            }

            invocations.push(ArgumentInvocation {
                argument: argument.name.clone(),
                values: positional[taken..taken + wanted].to_vec(),
            });
            taken += wanted;
        }

        if !failed && taken < positional.len() {
            let excess = positional[taken..].to_vec();
            if let [single] = excess.as_slice()
                && !self.subcommands.is_empty()
            {
                let names: Vec<String> = self.subcommands.iter().map(|e| e.name.clone()).collect();
                let possibilities = self.context.suggest(single, &names);
                self.errors.push(UsageError::NoSuchSubcommand {
                    name: single.clone(),
                    possibilities,
                });
            } else {
                self.errors.push(UsageError::UnexpectedArguments { tokens: excess });
            }
        }

        invocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::{ArgumentDecl, Arity, ContextSettings};

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse_one<'a>(
        command: &'a CommandDecl,
        settings: &ContextSettings,
        argv: &[&str],
    ) -> (CommandParseOutcome<'a>, Vec<String>) {
        let context = Context::root(command, settings);
        let entries: Vec<SubcommandEntry<'a>> = command
            .subcommands
            .iter()
            .map(|sub| SubcommandEntry {
                name: sub.name.clone(),
                command: sub,
                owner_depth: 0,
            })
            .collect();
        let mut buffer = TokenBuffer::new(tokens(argv));
        let outcome = CommandParser::new(command, &context, &entries).parse(&mut buffer, 0);
        (outcome, buffer.into_tokens())
    }

    fn values_of(outcome: &CommandParseOutcome<'_>, key: &str) -> Vec<Vec<String>> {
        outcome
            .option_invocations
            .iter()
            .filter(|oi| oi.option == key)
            .map(|oi| oi.invocation.values.clone())
            .collect()
    }

    #[test]
    fn test_attached_and_separate_values_match() {
        let command = CommandDecl::new("tool").with_option(OptionDecl::single(&["--name"]));
        let settings = ContextSettings::default();
        let (attached, _) = parse_one(&command, &settings, &["--name=x"]);
        let (separate, _) = parse_one(&command, &settings, &["--name", "x"]);
        assert_eq!(attached.option_invocations, separate.option_invocations);
        assert_eq!(values_of(&attached, "name"), vec![vec!["x".to_string()]]);
    }

    #[test]
    fn test_greedy_values_stop_at_options_once_minimum_met() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--xx"]).with_nvalues(Arity::range(1, 3)))
            .with_option(OptionDecl::flag(&["-f"]));
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["--xx", "1", "-f"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(values_of(&outcome, "xx"), vec![tokens(&["1"])]);
        assert_eq!(values_of(&outcome, "f").len(), 1);
    }

    #[test]
    fn test_optional_value_leaves_flag_groups_alone() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--color"]).with_nvalues(Arity::OPTIONAL))
            .with_option(OptionDecl::flag(&["-x"]))
            .with_option(OptionDecl::flag(&["-y"]))
            .with_option(OptionDecl::single(&["-z"]));
        let settings = ContextSettings::default();

        let (grouped, _) = parse_one(&command, &settings, &["--color", "-xy"]);
        assert!(grouped.errors.is_empty());
        assert_eq!(values_of(&grouped, "color"), vec![Vec::<String>::new()]);
        assert_eq!(values_of(&grouped, "x").len(), 1);
        assert_eq!(values_of(&grouped, "y").len(), 1);

        let (attached, _) = parse_one(&command, &settings, &["--color", "-z3"]);
        assert!(attached.errors.is_empty());
        assert_eq!(values_of(&attached, "color"), vec![Vec::<String>::new()]);
        assert_eq!(values_of(&attached, "z"), vec![tokens(&["3"])]);

        let (value, _) = parse_one(&command, &settings, &["--color", "red", "-x"]);
        assert_eq!(values_of(&value, "color"), vec![tokens(&["red"])]);
        assert_eq!(values_of(&value, "x").len(), 1);
    }

    #[test]
    fn test_windows_and_plus_prefixes_in_one_command() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["/out"]))
            .with_option(OptionDecl::flag(&["+x"]).with_secondary(&["-x"]));
        let (outcome, _) = parse_one(
            &command,
            &ContextSettings::default(),
            &["/out", "f", "+x", "-x"],
        );
        assert!(outcome.errors.is_empty());
        assert_eq!(values_of(&outcome, "out"), vec![tokens(&["f"])]);
        let names: Vec<&str> = outcome
            .option_invocations
            .iter()
            .filter(|oi| oi.option == "x")
            .map(|oi| oi.invocation.name.as_str())
            .collect();
        assert_eq!(names, ["+x", "-x"]);
    }

    #[test]
    fn test_token_transform_matches_options_and_subcommands() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["--verbose"]))
            .with_subcommand(CommandDecl::new("run"));
        let settings =
            ContextSettings::default().with_token_transform(|_, token| token.to_lowercase());
        let (outcome, argv) = parse_one(&command, &settings, &["--VERBOSE", "RUN"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(values_of(&outcome, "verbose").len(), 1);
        assert_eq!(outcome.next.map(|e| e.name), Some("run".to_string()));
        assert_eq!(argv, tokens(&["--VERBOSE", "RUN"]));
    }

    #[test]
    fn test_too_few_values() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--xx"]).with_nvalues(Arity::exactly(2)));
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["--xx", "1"]);
        assert_eq!(
            outcome.errors,
            vec![UsageError::IncorrectOptionValueCount {
                name: "--xx".into(),
                expected: Arity::exactly(2),
                received: 1,
            }]
        );
    }

    #[test]
    fn test_attached_value_on_flag() {
        let command = CommandDecl::new("tool").with_option(OptionDecl::flag(&["--flag"]));
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["--flag=yes"]);
        assert!(matches!(
            outcome.errors.as_slice(),
            [UsageError::IncorrectOptionValueCount { received: 1, .. }]
        ));
    }

    #[test]
    fn test_grouped_short_options() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["-x"]))
            .with_option(OptionDecl::flag(&["-y"]))
            .with_option(OptionDecl::single(&["-z"]));
        let settings = ContextSettings::default();
        let (grouped, _) = parse_one(&command, &settings, &["-xyz3"]);
        let (split, _) = parse_one(&command, &settings, &["-x", "-y", "-z", "3"]);
        assert!(grouped.errors.is_empty());
        assert_eq!(grouped.option_invocations.len(), 3);
        assert_eq!(values_of(&grouped, "z"), values_of(&split, "z"));
        assert_eq!(values_of(&grouped, "z"), vec![tokens(&["3"])]);
    }

    #[test]
    fn test_unknown_short_character_ends_run() {
        let command = CommandDecl::new("tool").with_option(OptionDecl::flag(&["-x"]));
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["-xq"]);
        assert_eq!(values_of(&outcome, "x").len(), 1);
        assert!(matches!(
            outcome.errors.as_slice(),
            [UsageError::NoSuchOption { name, .. }] if name == "-q"
        ));
    }

    #[test]
    fn test_number_option() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["-n", "--lines"]).number_option());
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["-15"]);
        assert_eq!(values_of(&outcome, "lines"), vec![tokens(&["15"])]);
    }

    #[test]
    fn test_unknown_options_as_arguments() {
        let command = CommandDecl::new("tool")
            .treat_unknown_options_as_args()
            .with_option(OptionDecl::flag(&["-x"]))
            .with_argument(ArgumentDecl::optional("rest").variadic());
        let (outcome, _) = parse_one(
            &command,
            &ContextSettings::default(),
            &["--other=1", "-xq", "-x"],
        );
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["--other=1", "-xq"]));
        assert_eq!(values_of(&outcome, "x").len(), 1);
    }

    #[test]
    fn test_terminator_disables_options() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["-x"]))
            .with_argument(ArgumentDecl::optional("rest").variadic());
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["--", "-x", "--"]);
        assert!(outcome.option_invocations.is_empty());
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["-x", "--"]));
    }

    #[test]
    fn test_non_interspersed_arguments() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["-x"]))
            .with_argument(ArgumentDecl::optional("rest").variadic());
        let settings = ContextSettings::default().with_interspersed_args(false);
        let (outcome, _) = parse_one(&command, &settings, &["-x", "a", "-x"]);
        assert_eq!(values_of(&outcome, "x").len(), 1);
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["a", "-x"]));
    }

    #[test]
    fn test_variadic_reserves_trailing_fixed_arguments() {
        let command = CommandDecl::new("cp")
            .with_argument(ArgumentDecl::optional("sources").variadic())
            .with_argument(ArgumentDecl::required("dest").with_nvalues(2));
        let settings = ContextSettings::default();

        let (exact, _) = parse_one(&command, &settings, &["a", "b"]);
        assert!(exact.errors.is_empty());
        assert!(exact.argument_invocations[0].values.is_empty());
        assert_eq!(exact.argument_invocations[1].values, tokens(&["a", "b"]));

        let (more, _) = parse_one(&command, &settings, &["1", "2", "a", "b"]);
        assert_eq!(more.argument_invocations[0].values, tokens(&["1", "2"]));
        assert_eq!(more.argument_invocations[1].values, tokens(&["a", "b"]));
    }

    #[test]
    fn test_missing_and_partial_arguments() {
        let command = CommandDecl::new("tool")
            .with_argument(ArgumentDecl::required("pair").with_nvalues(2))
            .with_argument(ArgumentDecl::required("last"));
        let settings = ContextSettings::default();

        let (partial, _) = parse_one(&command, &settings, &["a"]);
        assert_eq!(
            partial.errors,
            vec![UsageError::IncorrectArgumentValueCount {
                name: "pair".into(),
                expected: 2,
                received: 1,
            }]
        );
        assert_eq!(partial.argument_invocations.len(), 2);

        let (missing, _) = parse_one(&command, &settings, &["a", "b"]);
        assert_eq!(
            missing.errors,
            vec![UsageError::MissingArgument {
                name: "last".into()
            }]
        );
    }

    #[test]
    fn test_excess_tokens() {
        let plain = CommandDecl::new("tool");
        let (outcome, _) = parse_one(&plain, &ContextSettings::default(), &["a", "b"]);
        assert_eq!(
            outcome.errors,
            vec![UsageError::UnexpectedArguments {
                tokens: tokens(&["a", "b"])
            }]
        );

        let with_subs = CommandDecl::new("tool").with_subcommand(CommandDecl::new("commit"));
        let (outcome, _) = parse_one(&with_subs, &ContextSettings::default(), &["comit"]);
        assert_eq!(
            outcome.errors,
            vec![UsageError::NoSuchSubcommand {
                name: "comit".into(),
                possibilities: vec!["commit".into()],
            }]
        );
        assert!(outcome.next.is_none());
    }

    #[test]
    fn test_subcommand_waits_for_required_arguments() {
        let command = CommandDecl::new("tool")
            .with_argument(ArgumentDecl::required("target"))
            .with_subcommand(CommandDecl::new("run"));
        let (outcome, _) = parse_one(&command, &ContextSettings::default(), &["run", "run"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["run"]));
        assert_eq!(outcome.next.map(|e| e.name), Some("run".to_string()));
        assert_eq!(outcome.index, 2);
    }

    #[test]
    fn test_alias_expansion_is_bounded() {
        let command = CommandDecl::new("tool")
            .with_alias("a", &["b", "x"])
            .with_alias("b", &["a", "y"])
            .with_argument(ArgumentDecl::optional("rest").variadic());
        let (outcome, argv) = parse_one(&command, &ContextSettings::default(), &["a"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(argv, tokens(&["b", "x"]));
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["b", "x"]));
    }

    #[test]
    fn test_argument_files() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::single(&["--name"]))
            .with_argument(ArgumentDecl::optional("rest").variadic());
        let files = std::collections::BTreeMap::from([
            ("args".to_string(), "--name 'a b' @more".to_string()),
            ("more".to_string(), "tail".to_string()),
            ("loop".to_string(), "x @loop".to_string()),
        ]);
        let settings = ContextSettings::default().with_file_map(files);

        let (outcome, argv) = parse_one(&command, &settings, &["@args", "@@lit"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(values_of(&outcome, "name"), vec![tokens(&["a b"])]);
        assert_eq!(outcome.argument_invocations[0].values, tokens(&["tail", "@lit"]));
        assert_eq!(argv, tokens(&["--name", "a b", "tail", "@@lit"]));

        let (looped, _) = parse_one(&command, &settings, &["@loop"]);
        assert_eq!(
            looped.errors,
            vec![UsageError::RecursiveArgumentFile {
                filename: "loop".into()
            }]
        );

        let (missing, _) = parse_one(&command, &settings, &["@nope"]);
        assert_eq!(
            missing.errors,
            vec![UsageError::FileNotFound {
                filename: "nope".into()
            }]
        );
    }

    #[test]
    fn test_grouped_shorts_disabled_reads_whole_name() {
        let command = CommandDecl::new("tool")
            .with_option(OptionDecl::flag(&["-x"]))
            .with_option(OptionDecl::flag(&["-long"]));
        let settings = ContextSettings::default().with_grouped_short_options(false);
        let (outcome, _) = parse_one(&command, &settings, &["-long", "-x"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(values_of(&outcome, "long").len(), 1);
        assert_eq!(values_of(&outcome, "x").len(), 1);
    }
}
