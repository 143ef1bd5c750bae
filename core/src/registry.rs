//! Per-command option and argument index.
//!
//! The registry is built from a [`CommandDecl`] and its [`Context`] whenever a
//! command is parsed or finalized. It indexes every option name (after the
//! token transform), remembers which prefixes are in use, locates the number
//! option and synthesizes the eager help option from the context's help
//! names.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::context::Context;
use crate::prefix::split_option_prefix;
use crate::types::{ArgumentArity, ArgumentDecl, CommandDecl, EagerAction, GroupDecl, OptionDecl};

/// Key of the synthesized help option.
pub const HELP_OPTION_KEY: &str = "help";

/// Lookup tables for one command.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, Context, ContextSettings, OptionDecl, Registry};
///
/// let command = CommandDecl::new("tool")
///     .with_option(OptionDecl::flag(&["-v", "--verbose"]))
///     .with_option(OptionDecl::single(&["/out"]));
/// let ctx = Context::root(&command, &ContextSettings::default());
/// let registry = Registry::new(&command, &ctx);
///
/// assert_eq!(registry.find("-v").map(|o| o.key()), Some("verbose".to_string()));
/// assert!(registry.is_known_prefix("/"));
/// assert!(registry.is_long_name("/out"));
/// assert!(!registry.is_long_name("-v"));
/// // The help option is synthesized from the context's help names.
/// assert!(registry.find("--help").is_some());
/// ```
#[derive(Debug)]
pub struct Registry<'a> {
    command: &'a CommandDecl,
    options: Vec<Cow<'a, OptionDecl>>,
    by_name: HashMap<String, usize>,
    long_names: HashSet<String>,
    prefixes: HashSet<String>,
    number_option: Option<usize>,
}

fn help_option(command: &CommandDecl, context: &Context) -> Option<OptionDecl> {
    if command.options.iter().any(|o| o.key() == HELP_OPTION_KEY) {
        return None;
    }
    let used: HashSet<&str> = command.options.iter().flat_map(|o| o.all_names()).collect();
    let names: Vec<&str> = context
        .help_option_names()
        .iter()
        .map(String::as_str)
        .filter(|name| !used.contains(name))
        .collect();
    if names.is_empty() {
        return None;
    }
    Some(
        OptionDecl::flag(&names)
            .with_id(HELP_OPTION_KEY)
            .eager(EagerAction::Help)
            .with_help("Show this message and exit"),
    )
}

impl<'a> Registry<'a> {
    pub fn new(command: &'a CommandDecl, context: &Context) -> Self {
        let mut options: Vec<Cow<'a, OptionDecl>> =
            command.options.iter().map(Cow::Borrowed).collect();
        if let Some(help) = help_option(command, context) {
            options.push(Cow::Owned(help));
        }

        let mut by_name = HashMap::new();
        let mut long_names = HashSet::new();
        let mut prefixes = HashSet::new();
        let mut number_option = None;

        for (index, option) in options.iter().enumerate() {
            for name in option.all_names() {
                let (prefix, bare) = split_option_prefix(name);
                let transformed = context.transform_token(name);
                if bare.chars().count() > 1 {
                    long_names.insert(transformed.clone());
                }
                if !prefix.is_empty() {
                    prefixes.insert(prefix.to_string());
                }
                by_name.entry(transformed).or_insert(index);
            }
            if option.accepts_number_value_without_name && number_option.is_none() {
                number_option = Some(index);
            }
        }

        Self {
            command,
            options,
            by_name,
            long_names,
            prefixes,
            number_option,
        }
    }

    /// Every option, declared ones first, then the synthesized help option.
    pub fn options(&self) -> impl Iterator<Item = &OptionDecl> {
        self.options.iter().map(|o| o.as_ref())
    }

    /// Finds an option by an already-transformed name.
    pub fn find(&self, name: &str) -> Option<&OptionDecl> {
        self.by_name.get(name).map(|&i| self.options[i].as_ref())
    }

    /// Finds an option by key.
    pub fn find_key(&self, key: &str) -> Option<&OptionDecl> {
        self.options().find(|o| o.key() == key)
    }

    /// Returns `true` if some declared name uses `prefix`.
    pub fn is_known_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Returns `true` if `name` (transformed) has a bare part longer than one
    /// character.
    pub fn is_long_name(&self, name: &str) -> bool {
        self.long_names.contains(name)
    }

    pub fn number_option(&self) -> Option<&OptionDecl> {
        self.number_option.map(|i| self.options[i].as_ref())
    }

    /// Names offered as typo suggestions: every name of every visible option.
    pub fn visible_names(&self) -> Vec<String> {
        self.options()
            .filter(|o| !o.hidden)
            .flat_map(|o| o.all_names())
            .map(str::to_string)
            .collect()
    }

    pub fn arguments(&self) -> &'a [ArgumentDecl] {
        &self.command.arguments
    }

    pub fn groups(&self) -> &'a [GroupDecl] {
        &self.command.groups
    }

    /// The group that `key` belongs to, if any.
    pub fn group_of(&self, key: &str) -> Option<&'a GroupDecl> {
        self.command.groups.iter().find(|g| g.contains(key))
    }

    /// Tokens needed by the required fixed-width arguments before a
    /// subcommand name may be recognized. Optional arguments never count, so
    /// a subcommand name always wins over an optional positional.
    pub fn required_fixed_width(&self) -> usize {
        self.command
            .arguments
            .iter()
            .filter(|a| a.required)
            .filter_map(|a| match a.nvalues {
                ArgumentArity::Exactly(n) => Some(n),
                ArgumentArity::Variadic => None,
            })
            .sum()
    }
}
