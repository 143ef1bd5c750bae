//! Per-command configuration and runtime collaborators.
//!
//! [`ContextSettings`] configures a whole parse attempt. A [`Context`] is
//! derived from it for the root command and then from the parent context for
//! every subcommand entered, applying the command's [`ContextOverrides`]. The
//! context is the only channel through which ancestor configuration reaches
//! descendant parsing.
//!
//! [`ContextOverrides`]: crate::ContextOverrides

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::prefix::split_option_prefix;
use crate::source::ValueSource;
use crate::suggest::typo_suggestions;
use crate::types::{CommandDecl, ContextOverrides, OptionDecl};

/// Reads one environment variable.
pub type EnvReader = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
/// Reads the full text of an argument file.
pub type FileReader = Arc<dyn Fn(&str) -> Result<String, FileReadError> + Send + Sync>;
/// Normalizes a token before it is compared against declared names.
pub type TokenTransform = Arc<dyn Fn(&Context, &str) -> String + Send + Sync>;
/// Picks likely corrections for a mistyped name.
pub type Suggestor = Arc<dyn Fn(&str, &[String]) -> Vec<String> + Send + Sync>;

/// Failure reported by a [`FileReader`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileReadError {
    #[error("file not found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

fn read_file_system(path: &str) -> Result<String, FileReadError> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => FileReadError::NotFound,
        _ => FileReadError::Other(err.to_string()),
    })
}

/// Settings for one parse attempt.
///
/// # Examples
///
/// ```
/// use argtree_core::ContextSettings;
///
/// let settings = ContextSettings::default()
///     .with_auto_envvar_prefix("TOOL")
///     .with_env(|name| (name == "TOOL_NAME").then(|| "x".to_string()));
/// assert_eq!(settings.auto_envvar_prefix.as_deref(), Some("TOOL"));
/// assert!(settings.allow_interspersed_args);
/// ```
#[derive(Clone)]
pub struct ContextSettings {
    pub allow_interspersed_args: bool,
    pub allow_grouped_short_options: bool,
    pub auto_envvar_prefix: Option<String>,
    pub help_option_names: Vec<String>,
    pub expand_argument_files: bool,
    pub read_envvar_before_value_source: bool,
    pub collect_all_errors: bool,
    pub token_transform: Option<TokenTransform>,
    pub suggestor: Suggestor,
    pub env_reader: EnvReader,
    pub file_reader: FileReader,
    pub value_source: Option<Arc<dyn ValueSource>>,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            allow_interspersed_args: true,
            allow_grouped_short_options: true,
            auto_envvar_prefix: None,
            help_option_names: vec!["-h".to_string(), "--help".to_string()],
            expand_argument_files: true,
            read_envvar_before_value_source: true,
            collect_all_errors: true,
            token_transform: None,
            suggestor: Arc::new(typo_suggestions),
            env_reader: Arc::new(|name: &str| std::env::var(name).ok()),
            file_reader: Arc::new(read_file_system),
            value_source: None,
        }
    }
}

impl ContextSettings {
    pub fn with_auto_envvar_prefix(mut self, prefix: &str) -> Self {
        self.auto_envvar_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_help_option_names(mut self, names: &[&str]) -> Self {
        self.help_option_names = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    pub fn with_interspersed_args(mut self, allow: bool) -> Self {
        self.allow_interspersed_args = allow;
        self
    }

    pub fn with_grouped_short_options(mut self, allow: bool) -> Self {
        self.allow_grouped_short_options = allow;
        self
    }

    pub fn with_argument_files(mut self, expand: bool) -> Self {
        self.expand_argument_files = expand;
        self
    }

    /// Consult the value source before environment variables.
    pub fn with_value_source_first(mut self) -> Self {
        self.read_envvar_before_value_source = false;
        self
    }

    /// Stop at the first usage error instead of collecting all of them.
    pub fn with_first_error_only(mut self) -> Self {
        self.collect_all_errors = false;
        self
    }

    pub fn with_token_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Context, &str) -> String + Send + Sync + 'static,
    {
        self.token_transform = Some(Arc::new(transform));
        self
    }

    pub fn with_suggestor<F>(mut self, suggestor: F) -> Self
    where
        F: Fn(&str, &[String]) -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestor = Arc::new(suggestor);
        self
    }

    pub fn with_env<F>(mut self, reader: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_reader = Arc::new(reader);
        self
    }

    /// Reads environment variables from a fixed map instead of the process.
    pub fn with_env_map(self, vars: BTreeMap<String, String>) -> Self {
        self.with_env(move |name| vars.get(name).cloned())
    }

    pub fn with_file_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&str) -> Result<String, FileReadError> + Send + Sync + 'static,
    {
        self.file_reader = Arc::new(reader);
        self
    }

    /// Reads argument files from a fixed map instead of the file system.
    pub fn with_file_map(self, files: BTreeMap<String, String>) -> Self {
        self.with_file_reader(move |name| files.get(name).cloned().ok_or(FileReadError::NotFound))
    }

    pub fn with_value_source(mut self, source: Arc<dyn ValueSource>) -> Self {
        self.value_source = Some(source);
        self
    }

    fn apply(&mut self, overrides: &ContextOverrides) {
        if let Some(allow) = overrides.allow_interspersed_args {
            self.allow_interspersed_args = allow;
        }
        if let Some(allow) = overrides.allow_grouped_short_options {
            self.allow_grouped_short_options = allow;
        }
        if let Some(prefix) = &overrides.auto_envvar_prefix {
            self.auto_envvar_prefix = Some(prefix.clone());
        }
        if let Some(names) = &overrides.help_option_names {
            self.help_option_names = names.clone();
        }
        if let Some(expand) = overrides.expand_argument_files {
            self.expand_argument_files = expand;
        }
        if let Some(first) = overrides.read_envvar_before_value_source {
            self.read_envvar_before_value_source = first;
        }
        if let Some(all) = overrides.collect_all_errors {
            self.collect_all_errors = all;
        }
    }
}

impl fmt::Debug for ContextSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSettings")
            .field("allow_interspersed_args", &self.allow_interspersed_args)
            .field("allow_grouped_short_options", &self.allow_grouped_short_options)
            .field("auto_envvar_prefix", &self.auto_envvar_prefix)
            .field("help_option_names", &self.help_option_names)
            .field("expand_argument_files", &self.expand_argument_files)
            .field(
                "read_envvar_before_value_source",
                &self.read_envvar_before_value_source,
            )
            .field("collect_all_errors", &self.collect_all_errors)
            .field("value_source", &self.value_source.is_some())
            .finish_non_exhaustive()
    }
}

/// Upper-cases `name` and replaces every non-word character with `_`.
fn envvar_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Effective configuration of one command in the invoked chain.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, Context, ContextSettings, OptionDecl};
///
/// let root = CommandDecl::new("tool");
/// let sub = CommandDecl::new("run-all");
/// let settings = ContextSettings::default().with_auto_envvar_prefix("TOOL");
///
/// let ctx = Context::root(&root, &settings);
/// let child = ctx.child(&sub);
/// assert_eq!(child.command_path(), ["tool", "run-all"]);
/// assert_eq!(child.auto_envvar_prefix(), Some("TOOL_RUN_ALL"));
///
/// let option = OptionDecl::single(&["-n", "--dry-run"]);
/// assert_eq!(child.envvar_name(&option).as_deref(), Some("TOOL_RUN_ALL_DRY_RUN"));
/// ```
#[derive(Clone)]
pub struct Context {
    settings: ContextSettings,
    command_path: Vec<String>,
    aliases: BTreeMap<String, Vec<String>>,
}

impl Context {
    /// Builds the context of the root command.
    pub fn root(command: &CommandDecl, settings: &ContextSettings) -> Self {
        let mut settings = settings.clone();
        settings.apply(&command.context);
        Self {
            settings,
            command_path: vec![command.name.clone()],
            aliases: command.aliases.clone(),
        }
    }

    /// Builds the context of `command`, entered from this context.
    pub fn child(&self, command: &CommandDecl) -> Self {
        let mut settings = self.settings.clone();
        settings.auto_envvar_prefix = self
            .settings
            .auto_envvar_prefix
            .as_ref()
            .map(|prefix| format!("{prefix}_{}", envvar_segment(&command.name)));
        settings.apply(&command.context);

        let mut command_path = self.command_path.clone();
        command_path.push(command.name.clone());
        Self {
            settings,
            command_path,
            aliases: command.aliases.clone(),
        }
    }

    /// Names from the root command down to this one.
    pub fn command_path(&self) -> &[String] {
        &self.command_path
    }

    pub fn command_name(&self) -> &str {
        self.command_path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn aliases(&self) -> &BTreeMap<String, Vec<String>> {
        &self.aliases
    }

    pub fn allow_interspersed_args(&self) -> bool {
        self.settings.allow_interspersed_args
    }

    pub fn allow_grouped_short_options(&self) -> bool {
        self.settings.allow_grouped_short_options
    }

    pub fn auto_envvar_prefix(&self) -> Option<&str> {
        self.settings.auto_envvar_prefix.as_deref()
    }

    pub fn help_option_names(&self) -> &[String] {
        &self.settings.help_option_names
    }

    pub fn expand_argument_files(&self) -> bool {
        self.settings.expand_argument_files
    }

    pub fn read_envvar_before_value_source(&self) -> bool {
        self.settings.read_envvar_before_value_source
    }

    pub fn collect_all_errors(&self) -> bool {
        self.settings.collect_all_errors
    }

    /// Applies the token transform (identity when none is configured).
    pub fn transform_token(&self, token: &str) -> String {
        match &self.settings.token_transform {
            Some(transform) => transform(self, token),
            None => token.to_string(),
        }
    }

    pub fn suggest(&self, entered: &str, candidates: &[String]) -> Vec<String> {
        (self.settings.suggestor)(entered, candidates)
    }

    pub fn read_env(&self, name: &str) -> Option<String> {
        (self.settings.env_reader)(name)
    }

    pub fn read_file(&self, name: &str) -> Result<String, FileReadError> {
        (self.settings.file_reader)(name)
    }

    pub fn value_source(&self) -> Option<&dyn ValueSource> {
        self.settings.value_source.as_deref()
    }

    /// Environment variable consulted for `option`: its explicit name, or
    /// one inferred from the auto-envvar prefix and the longest name.
    pub fn envvar_name(&self, option: &OptionDecl) -> Option<String> {
        if let Some(name) = &option.envvar {
            return Some(name.clone());
        }
        let prefix = self.auto_envvar_prefix()?;
        let bare = split_option_prefix(option.longest_name()).1;
        if bare.is_empty() {
            return None;
        }
        Some(format!("{prefix}_{}", envvar_segment(bare)))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command_path", &self.command_path)
            .field("settings", &self.settings)
            .field("aliases", &self.aliases)
            .finish()
    }
}
