//! Config-file value source backed by a JSON or YAML document.
//!
//! Option values are looked up by the command path below the root followed
//! by the option key. Both nested objects and flattened dotted keys work:
//!
//! ```yaml
//! jobs: 4
//! build:
//!   release: true
//! test.filter: [unit, doc]
//! ```
//!
//! Here `jobs` belongs to the root command, `release` and `filter` to the
//! `build` and `test` subcommands.

use std::path::{Path, PathBuf};

use argtree_core::{Context, Invocation, OptionDecl, ValueSource, source_key};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, SourceError};

/// Document formats understood by [`ConfigFileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from a file extension (`json`, `yaml` or `yml`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "" => Err(SourceError::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
            other => Err(SourceError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Value source reading option values from a parsed config document.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, Context, ContextSettings, OptionDecl, ValueSource};
/// use argtree_sources::ConfigFileSource;
///
/// let source = ConfigFileSource::from_json_str(r#"{"name": "ada", "tags": ["a", "b"]}"#).unwrap();
/// let root = CommandDecl::new("tool");
/// let ctx = Context::root(&root, &ContextSettings::default());
///
/// let name = source.values(&ctx, &OptionDecl::single(&["--name"]));
/// assert_eq!(name[0].values, vec!["ada"]);
///
/// let tags = source.values(&ctx, &OptionDecl::multiple(&["--tags"]));
/// assert_eq!(tags.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFileSource {
    document: Value,
    path: Option<PathBuf>,
}

impl ConfigFileSource {
    /// Loads a document from `path`, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnsupportedFormat`] for unknown extensions,
    /// [`SourceError::Io`] if the file cannot be read, a parse error, or
    /// [`SourceError::InvalidDocument`] if the top level is not a mapping.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), ?format, "loading config file");

        let mut source = match format {
            ConfigFormat::Json => Self::from_json_str(&text)?,
            ConfigFormat::Yaml => Self::from_yaml_str(&text)?,
        };
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(text)?)
    }

    /// Parses a YAML document. An empty document is an empty mapping.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(text)?;
        if document.is_null() {
            return Self::from_document(Value::Object(Default::default()));
        }
        Self::from_document(document)
    }

    /// Wraps an already parsed document; the top level must be an object.
    pub fn from_document(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(SourceError::InvalidDocument(
                "top level must be a mapping".to_string(),
            ));
        }
        Ok(Self {
            document,
            path: None,
        })
    }

    /// File the document was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Finds the value at `path`, trying nested objects first and then the
    /// flattened `a.b.key` form at every level.
    pub fn lookup(&self, path: &[String]) -> Option<&Value> {
        lookup_in(&self.document, path)
    }
}

fn lookup_in<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    let [first, rest @ ..] = path else {
        return Some(value);
    };
    let object = value.as_object()?;
    if let Some(child) = object.get(first)
        && let Some(found) = lookup_in(child, rest)
    {
        return Some(found);
    }
    object.get(&path.join("."))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalars(values: &[Value]) -> Vec<String> {
    values.iter().filter_map(scalar).collect()
}

/// Converts a document value into invocations of `option`.
fn invocations_for(option: &OptionDecl, value: &Value) -> Vec<Invocation> {
    let name = option.longest_name();
    match value {
        Value::Array(items) if items.iter().all(Value::is_array) => items
            .iter()
            .filter_map(Value::as_array)
            .map(|inner| Invocation::new(name, scalars(inner)))
            .collect(),
        Value::Array(items) if option.nvalues.max > 1 => {
            vec![Invocation::new(name, scalars(items))]
        }
        Value::Array(items) => items
            .iter()
            .filter_map(scalar)
            .map(|v| Invocation::new(name, vec![v]))
            .collect(),
        Value::Object(_) => {
            debug!(option = name, "ignoring mapping value in config");
            Vec::new()
        }
        other => scalar(other)
            .map(|v| vec![Invocation::new(name, vec![v])])
            .unwrap_or_default(),
    }
}

impl ValueSource for ConfigFileSource {
    fn values(&self, context: &Context, option: &OptionDecl) -> Vec<Invocation> {
        let key = source_key(context, option);
        let Some(value) = self.lookup(&key) else {
            return Vec::new();
        };
        trace!(key = %key.join("."), "config value found");
        invocations_for(option, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::{Arity, CommandDecl, ContextSettings};

    fn values_for(source: &ConfigFileSource, path: &[&str], option: &OptionDecl) -> Vec<Invocation> {
        let root = CommandDecl::new("tool");
        let mut ctx = Context::root(&root, &ContextSettings::default());
        for name in path {
            ctx = ctx.child(&CommandDecl::new(name));
        }
        source.values(&ctx, option)
    }

    #[test]
    fn test_scalars_become_single_values() {
        let source =
            ConfigFileSource::from_json_str(r#"{"name": "ada", "jobs": 4, "fast": true}"#).unwrap();
        let single = |key: &str| values_for(&source, &[], &OptionDecl::single(&[key]));

        assert_eq!(single("--name")[0].values, vec!["ada"]);
        assert_eq!(single("--jobs")[0].values, vec!["4"]);
        assert_eq!(single("--fast")[0].values, vec!["true"]);
        assert_eq!(single("--name")[0].name, "--name");
        assert!(single("--missing").is_empty());
    }

    #[test]
    fn test_nested_and_dotted_keys() {
        let source = ConfigFileSource::from_yaml_str(
            "build:\n  release: true\ntest.filter: unit\nrun:\n  sub.level: 3\n",
        )
        .unwrap();
        let release = values_for(&source, &["build"], &OptionDecl::flag(&["--release"]));
        let filter = values_for(&source, &["test"], &OptionDecl::single(&["--filter"]));
        let level = values_for(&source, &["run", "sub"], &OptionDecl::single(&["--level"]));

        assert_eq!(release[0].values, vec!["true"]);
        assert_eq!(filter[0].values, vec!["unit"]);
        assert_eq!(level[0].values, vec!["3"]);
        // Root options do not see subcommand keys.
        assert!(values_for(&source, &[], &OptionDecl::flag(&["--release"])).is_empty());
    }

    #[test]
    fn test_arrays_follow_arity() {
        let source = ConfigFileSource::from_json_str(
            r#"{"tag": ["a", "b"], "point": [1, 2], "pairs": [["x", "1"], ["y", "2"]]}"#,
        )
        .unwrap();

        let tags = values_for(&source, &[], &OptionDecl::multiple(&["--tag"]));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].values, vec!["b"]);

        let point = values_for(
            &source,
            &[],
            &OptionDecl::single(&["--point"]).with_nvalues(Arity::exactly(2)),
        );
        assert_eq!(point.len(), 1);
        assert_eq!(point[0].values, vec!["1", "2"]);

        let pairs = values_for(
            &source,
            &[],
            &OptionDecl::multiple(&["--pairs"]).with_nvalues(Arity::exactly(2)),
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].values, vec!["x", "1"]);
    }

    #[test]
    fn test_null_and_mappings_yield_nothing() {
        let source = ConfigFileSource::from_json_str(r#"{"a": null, "b": {"c": 1}}"#).unwrap();
        assert!(values_for(&source, &[], &OptionDecl::single(&["--a"])).is_empty());
        assert!(values_for(&source, &[], &OptionDecl::single(&["--b"])).is_empty());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            ConfigFileSource::from_json_str("[1, 2]"),
            Err(SourceError::InvalidDocument(_))
        ));
        assert!(matches!(
            ConfigFileSource::from_json_str("{"),
            Err(SourceError::Json(_))
        ));
        assert!(ConfigFileSource::from_yaml_str("").is_ok());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.JSON")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("conf.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("conf.toml")),
            Err(SourceError::UnsupportedFormat(ext)) if ext == "toml"
        ));
        assert!(ConfigFormat::from_path(Path::new("conf")).is_err());
    }
}
