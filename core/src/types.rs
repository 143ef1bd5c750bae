//! Declaration types for command trees.
//!
//! A command tree is described by immutable declarations: a [`CommandDecl`]
//! owns its [`OptionDecl`]s, positional [`ArgumentDecl`]s, [`GroupDecl`]s and
//! nested subcommands. Declarations never carry parsed values; the finalizer
//! produces [`ParsedValues`](crate::ParsedValues) alongside them.
//!
//! All declaration types are serializable with [`serde`] so trees can be
//! loaded from JSON or YAML. Callbacks (validators and run callbacks) are
//! skipped by serde and can only be attached from code.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::prefix::split_option_prefix;
use crate::values::{ParsedValues, ResolvedValue};

/// Inclusive range of values consumed by one occurrence of an option.
///
/// # Examples
///
/// ```
/// use argtree_core::Arity;
///
/// assert!(!Arity::FLAG.takes_value());
/// assert_eq!(Arity::exactly(2), Arity { min: 2, max: 2 });
/// assert!(Arity::at_least(1).is_unbounded());
/// assert_eq!(Arity::range(1, 3).to_string(), "1..3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    /// Minimum number of values.
    pub min: usize,
    /// Maximum number of values (`usize::MAX` for unbounded).
    pub max: usize,
}

impl Arity {
    /// Flags take no values.
    pub const FLAG: Arity = Arity { min: 0, max: 0 };
    /// Normal options take exactly one value.
    pub const SINGLE: Arity = Arity { min: 1, max: 1 };
    /// Options that may be given with or without one value.
    pub const OPTIONAL: Arity = Arity { min: 0, max: 1 };

    /// Exactly `n` values.
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    /// Between `min` and `max` values, inclusive.
    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// At least `min` values, with no upper bound.
    pub const fn at_least(min: usize) -> Self {
        Self {
            min,
            max: usize::MAX,
        }
    }

    /// Returns `true` if an occurrence can consume at least one value.
    pub fn takes_value(&self) -> bool {
        self.max > 0
    }

    /// Returns `true` if there is no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max == usize::MAX
    }

    /// Returns `true` if `count` values satisfy this arity.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl Default for Arity {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else if self.is_unbounded() {
            write!(f, "{}..", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

/// How the invocations of an option turn into its final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Boolean switch; secondary names switch it off.
    Flag,
    /// Counts its occurrences (`-vvv`).
    Counted,
    /// Keeps the values of the last occurrence (the default).
    #[default]
    Single,
    /// Keeps the values of every occurrence.
    Multiple,
}

/// What an eager option does when it is present on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EagerAction {
    /// Stop and let the caller print help for the current command.
    Help,
    /// Stop and print `text` (e.g. a version banner).
    Message {
        text: String,
        #[serde(default)]
        error: bool,
    },
}

type ValidateFn = dyn Fn(&ResolvedValue, &ParsedValues) -> Result<(), String> + Send + Sync;
type RunFn = dyn Fn(&ParsedValues) -> Result<(), String> + Send + Sync;

/// A post-finalization check attached to an option or argument.
///
/// Receives the parameter's own resolved value and every finalized value of
/// the command, so checks may relate parameters to each other. An `Err`
/// message becomes a bad-parameter-value usage error.
///
/// # Examples
///
/// ```
/// use argtree_core::{ParsedValues, ResolvedValue, Validator};
///
/// let positive = Validator::new(|value, _| match value.first() {
///     Some(v) if v.parse::<u32>().is_ok() => Ok(()),
///     _ => Err("must be a positive number".into()),
/// });
/// let all = ParsedValues::default();
/// assert!(positive.check(&ResolvedValue::Values(vec!["3".into()]), &all).is_ok());
/// assert!(positive.check(&ResolvedValue::Values(vec!["x".into()]), &all).is_err());
/// ```
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    /// Wraps a validation closure.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&ResolvedValue, &ParsedValues) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Runs the check.
    pub fn check(&self, value: &ResolvedValue, all: &ParsedValues) -> Result<(), String> {
        (self.0)(value, all)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Callback invoked once a command is fully finalized.
#[derive(Clone)]
pub struct RunCallback(Arc<RunFn>);

impl RunCallback {
    /// Wraps a run closure.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&ParsedValues) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(run))
    }

    /// Invokes the callback.
    pub fn call(&self, values: &ParsedValues) -> Result<(), String> {
        (self.0)(values)
    }
}

impl fmt::Debug for RunCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunCallback(..)")
    }
}

/// Declaration of a named option.
///
/// Use the constructors [`flag`](OptionDecl::flag),
/// [`single`](OptionDecl::single), [`counted`](OptionDecl::counted) and
/// [`multiple`](OptionDecl::multiple), then chain builder methods.
///
/// # Examples
///
/// ```
/// use argtree_core::{Arity, OptionDecl, OptionKind};
///
/// let verbose = OptionDecl::flag(&["-v", "--verbose"]).with_secondary(&["--quiet"]);
/// assert_eq!(verbose.kind, OptionKind::Flag);
/// assert_eq!(verbose.key(), "verbose");
/// assert!(verbose.is_secondary("--quiet"));
///
/// let point = OptionDecl::single(&["-p", "--point"]).with_nvalues(Arity::exactly(2));
/// assert_eq!(point.longest_name(), "--point");
/// assert_eq!(point.nvalues, Arity::exactly(2));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDecl {
    /// Explicit key for the parsed value; defaults to the bare longest name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Primary names, including their prefixes (e.g. `-v`, `--verbose`).
    pub names: Vec<String>,
    /// Secondary names; for flags these switch the flag off.
    pub secondary_names: Vec<String>,
    /// How invocations become a value.
    pub kind: OptionKind,
    /// Values consumed per occurrence.
    pub nvalues: Arity,
    /// Whether `--opt value` is accepted in addition to `--opt=value`.
    pub accepts_unattached_value: bool,
    /// Whether `-3` binds `3` to this option (at most one per command).
    pub accepts_number_value_without_name: bool,
    /// Eager options finalize before everything else and may halt parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager: Option<EagerAction>,
    /// Hidden options are left out of suggestions and help.
    pub hidden: bool,
    /// Whether a value must be supplied from some source.
    pub required: bool,
    /// Values used when no source supplies any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<String>>,
    /// Value used when an optional-value option is given without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_value: Option<String>,
    /// Explicit environment variable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envvar: Option<String>,
    /// Regex splitting an envvar value into separate occurrences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envvar_split: Option<String>,
    /// Help text for renderers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip)]
    pub validators: Vec<Validator>,
}

impl Default for OptionDecl {
    fn default() -> Self {
        Self {
            id: None,
            names: Vec::new(),
            secondary_names: Vec::new(),
            kind: OptionKind::Single,
            nvalues: Arity::SINGLE,
            accepts_unattached_value: true,
            accepts_number_value_without_name: false,
            eager: None,
            hidden: false,
            required: false,
            default: None,
            implicit_value: None,
            envvar: None,
            envvar_split: None,
            help: None,
            validators: Vec::new(),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

impl OptionDecl {
    fn with_kind(names: &[&str], kind: OptionKind, nvalues: Arity) -> Self {
        Self {
            names: owned(names),
            kind,
            nvalues,
            ..Default::default()
        }
    }

    /// Creates a boolean flag.
    pub fn flag(names: &[&str]) -> Self {
        Self::with_kind(names, OptionKind::Flag, Arity::FLAG)
    }

    /// Creates a counted flag.
    pub fn counted(names: &[&str]) -> Self {
        Self::with_kind(names, OptionKind::Counted, Arity::FLAG)
    }

    /// Creates an option taking one value; the last occurrence wins.
    pub fn single(names: &[&str]) -> Self {
        Self::with_kind(names, OptionKind::Single, Arity::SINGLE)
    }

    /// Creates an option taking one value per occurrence, keeping them all.
    pub fn multiple(names: &[&str]) -> Self {
        Self::with_kind(names, OptionKind::Multiple, Arity::SINGLE)
    }

    /// Sets an explicit result key.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Adds secondary names.
    pub fn with_secondary(mut self, names: &[&str]) -> Self {
        self.secondary_names.extend(owned(names));
        self
    }

    /// Sets the per-occurrence value count.
    pub fn with_nvalues(mut self, nvalues: Arity) -> Self {
        self.nvalues = nvalues;
        self
    }

    /// Only accept attached values (`--opt=value`).
    pub fn attached_only(mut self) -> Self {
        self.accepts_unattached_value = false;
        self
    }

    /// Binds `-<digits>` tokens to this option.
    pub fn number_option(mut self) -> Self {
        self.accepts_number_value_without_name = true;
        self
    }

    /// Makes this option eager.
    pub fn eager(mut self, action: EagerAction) -> Self {
        self.eager = Some(action);
        self
    }

    /// Hides this option from suggestions and help.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks this option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets default values.
    pub fn with_default(mut self, values: &[&str]) -> Self {
        self.default = Some(owned(values));
        self
    }

    /// Sets the value used when the option is given without one.
    pub fn with_implicit_value(mut self, value: &str) -> Self {
        self.implicit_value = Some(value.to_string());
        self
    }

    /// Sets an explicit envvar name.
    pub fn with_envvar(mut self, name: &str) -> Self {
        self.envvar = Some(name.to_string());
        self
    }

    /// Splits envvar values on `pattern`.
    pub fn with_envvar_split(mut self, pattern: &str) -> Self {
        self.envvar_split = Some(pattern.to_string());
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Attaches a validator.
    pub fn with_validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&ResolvedValue, &ParsedValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Validator::new(check));
        self
    }

    /// Iterates primary names, then secondary names.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .chain(self.secondary_names.iter())
            .map(String::as_str)
    }

    /// The longest primary name (first wins on ties).
    pub fn longest_name(&self) -> &str {
        self.names
            .iter()
            .fold(None::<&String>, |best, name| match best {
                Some(b) if b.chars().count() >= name.chars().count() => Some(b),
                _ => Some(name),
            })
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Key under which the parsed value is stored.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => split_option_prefix(self.longest_name()).1.to_string(),
        }
    }

    /// Returns `true` if `name` is one of the secondary names.
    pub fn is_secondary(&self, name: &str) -> bool {
        self.secondary_names.iter().any(|n| n == name)
    }
}

/// Number of values a positional argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentArity {
    /// A fixed number of values.
    Exactly(usize),
    /// Whatever is left after reserving room for later fixed arguments.
    Variadic,
}

impl ArgumentArity {
    /// The fixed width, if any.
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Self::Exactly(n) => Some(*n),
            Self::Variadic => None,
        }
    }
}

impl Default for ArgumentArity {
    fn default() -> Self {
        Self::Exactly(1)
    }
}

/// Declaration of a positional argument.
///
/// # Examples
///
/// ```
/// use argtree_core::{ArgumentArity, ArgumentDecl};
///
/// let src = ArgumentDecl::required("source").variadic();
/// assert!(src.required);
/// assert_eq!(src.nvalues, ArgumentArity::Variadic);
///
/// let dest = ArgumentDecl::optional("dest");
/// assert!(!dest.required);
/// assert_eq!(dest.nvalues.fixed(), Some(1));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentDecl {
    pub name: String,
    pub nvalues: ArgumentArity,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip)]
    pub validators: Vec<Validator>,
}

impl Default for ArgumentDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            nvalues: ArgumentArity::Exactly(1),
            required: true,
            default: None,
            help: None,
            validators: Vec::new(),
        }
    }
}

impl ArgumentDecl {
    /// Creates a required single-value argument.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates an optional single-value argument.
    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            ..Default::default()
        }
    }

    /// Consumes a fixed number of values.
    pub fn with_nvalues(mut self, n: usize) -> Self {
        self.nvalues = ArgumentArity::Exactly(n);
        self
    }

    /// Consumes a variable number of values.
    pub fn variadic(mut self) -> Self {
        self.nvalues = ArgumentArity::Variadic;
        self
    }

    /// Sets default values.
    pub fn with_default(mut self, values: &[&str]) -> Self {
        self.default = Some(owned(values));
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Attaches a validator.
    pub fn with_validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&ResolvedValue, &ParsedValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Validator::new(check));
        self
    }
}

/// Cross-option constraint applied by a [`GroupDecl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Members finalize together without extra constraints.
    #[default]
    Plain,
    /// At most one member may be supplied.
    MutuallyExclusive,
    /// Required members are only enforced when any member is supplied.
    CoOccurring,
}

/// A set of options that finalize and validate together.
///
/// # Examples
///
/// ```
/// use argtree_core::{GroupDecl, GroupKind};
///
/// let output = GroupDecl::mutually_exclusive("output", &["json", "yaml"]).required();
/// assert_eq!(output.kind, GroupKind::MutuallyExclusive);
/// assert!(output.required);
/// assert!(output.contains("yaml"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDecl {
    pub name: String,
    pub kind: GroupKind,
    /// Whether at least one member must be supplied.
    pub required: bool,
    /// Keys of the member options.
    pub options: Vec<String>,
}

impl GroupDecl {
    fn with_kind(name: &str, kind: GroupKind, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            options: owned(options),
        }
    }

    /// Creates a plain group.
    pub fn plain(name: &str, options: &[&str]) -> Self {
        Self::with_kind(name, GroupKind::Plain, options)
    }

    /// Creates a group whose members exclude each other.
    pub fn mutually_exclusive(name: &str, options: &[&str]) -> Self {
        Self::with_kind(name, GroupKind::MutuallyExclusive, options)
    }

    /// Creates an all-or-nothing group.
    pub fn co_occurring(name: &str, options: &[&str]) -> Self {
        Self::with_kind(name, GroupKind::CoOccurring, options)
    }

    /// Requires at least one member to be supplied.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns `true` if the option with `key` is a member.
    pub fn contains(&self, key: &str) -> bool {
        self.options.iter().any(|k| k == key)
    }
}

/// Per-command overrides of inherited context settings.
///
/// Every `None` field keeps the value inherited from the parent command (or
/// the root [`ContextSettings`](crate::ContextSettings)).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_interspersed_args: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_grouped_short_options: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_envvar_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_option_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand_argument_files: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_envvar_before_value_source: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_all_errors: Option<bool>,
}

/// Declaration of a command and its subtree.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
///
/// let cli = CommandDecl::new("git")
///     .with_option(OptionDecl::flag(&["-v", "--verbose"]))
///     .with_subcommand(
///         CommandDecl::new("commit")
///             .with_option(OptionDecl::single(&["-m", "--message"]))
///             .with_argument(ArgumentDecl::optional("pathspec").variadic()),
///     )
///     .with_alias("ci", &["commit"]);
///
/// assert_eq!(cli.subcommand_names(), vec!["commit"]);
/// assert!(cli.find_subcommand("commit").is_some());
/// assert!(cli.find_option("verbose").is_some());
/// assert_eq!(cli.aliases["ci"], vec!["commit".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDecl {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub options: Vec<OptionDecl>,
    pub arguments: Vec<ArgumentDecl>,
    pub groups: Vec<GroupDecl>,
    pub subcommands: Vec<CommandDecl>,
    /// Token aliases expanded while parsing this command.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Allows `cmd sub1 ... sub2 ...` chains of this command's subcommands.
    pub allow_multiple_subcommands: bool,
    /// Allows running this command without any of its subcommands.
    pub invoke_without_subcommand: bool,
    /// Treats unknown option-like tokens as positional arguments.
    pub treat_unknown_options_as_args: bool,
    /// Halts with help when the root command receives no tokens at all.
    pub print_help_on_empty_args: bool,
    pub context: ContextOverrides,
    #[serde(skip)]
    pub run: Option<RunCallback>,
}

impl CommandDecl {
    /// Creates an empty command.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionDecl) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional argument.
    pub fn with_argument(mut self, argument: ArgumentDecl) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Adds an option group.
    pub fn with_group(mut self, group: GroupDecl) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a subcommand.
    pub fn with_subcommand(mut self, subcommand: CommandDecl) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Registers a token alias.
    pub fn with_alias(mut self, token: &str, expansion: &[&str]) -> Self {
        self.aliases.insert(token.to_string(), owned(expansion));
        self
    }

    /// Allows chained subcommands.
    pub fn allow_multiple_subcommands(mut self) -> Self {
        self.allow_multiple_subcommands = true;
        self
    }

    /// Allows running without a subcommand.
    pub fn invoke_without_subcommand(mut self) -> Self {
        self.invoke_without_subcommand = true;
        self
    }

    /// Treats unknown options as positional arguments.
    pub fn treat_unknown_options_as_args(mut self) -> Self {
        self.treat_unknown_options_as_args = true;
        self
    }

    /// Halts with help on an empty argv.
    pub fn print_help_on_empty_args(mut self) -> Self {
        self.print_help_on_empty_args = true;
        self
    }

    /// Sets context overrides.
    pub fn with_context(mut self, overrides: ContextOverrides) -> Self {
        self.context = overrides;
        self
    }

    /// Sets the run callback.
    pub fn on_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&ParsedValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.run = Some(RunCallback::new(run));
        self
    }

    /// Finds a direct subcommand by name.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandDecl> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Finds an option by key.
    pub fn find_option(&self, key: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.key() == key)
    }

    /// Finds an argument by name.
    pub fn find_argument(&self, name: &str) -> Option<&ArgumentDecl> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Names of the direct subcommands, in declaration order.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }
}
