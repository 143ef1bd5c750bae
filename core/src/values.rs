//! Finalized values of one command.
//!
//! [`ParsedValues`] is produced by the finalizer after every source (command
//! line, environment, value source, defaults) has been consulted. It is the
//! only place values live; declarations stay immutable.

use std::collections::BTreeMap;

use serde::Serialize;

/// Final value of an option or argument.
///
/// Serializes untagged: `null`, a boolean, a number, a list of strings or a
/// list of lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(untagged)]
pub enum ResolvedValue {
    /// Nothing was supplied and there is no default.
    #[default]
    Absent,
    Flag(bool),
    Count(u64),
    /// Values of one occurrence (or of a positional argument).
    Values(Vec<String>),
    /// Values of every occurrence, in order.
    Occurrences(Vec<Vec<String>>),
}

impl ResolvedValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// First value of a single occurrence, or of the last occurrence.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Values(values) => values.first().map(String::as_str),
            Self::Occurrences(all) => all.last().and_then(|v| v.first()).map(String::as_str),
            _ => None,
        }
    }

    /// Values of a single occurrence; empty for every other shape.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Values(values) => values,
            _ => &[],
        }
    }

    /// Every occurrence; empty for every other shape.
    pub fn occurrences(&self) -> &[Vec<String>] {
        match self {
            Self::Occurrences(all) => all,
            _ => &[],
        }
    }
}

/// Where a resolved option value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    CommandLine,
    Envvar,
    ValueSource,
    Default,
}

/// An option value together with its origin (`None` when nothing applied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOption {
    pub value: ResolvedValue,
    pub origin: Option<ValueOrigin>,
}

/// All finalized values of one command invocation.
///
/// # Examples
///
/// ```
/// use argtree_core::{ParsedValues, ResolvedValue, ValueOrigin};
///
/// let mut values = ParsedValues::default();
/// values.insert_option("verbose", ResolvedValue::Flag(true), Some(ValueOrigin::CommandLine));
/// values.insert_argument("file", ResolvedValue::Values(vec!["a.txt".into()]));
///
/// assert!(values.flag("verbose"));
/// assert_eq!(values.argument_value("file"), Some("a.txt"));
/// assert_eq!(values.origin("verbose"), Some(ValueOrigin::CommandLine));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedValues {
    options: BTreeMap<String, ResolvedOption>,
    arguments: BTreeMap<String, ResolvedValue>,
}

impl ParsedValues {
    pub fn insert_option(&mut self, key: &str, value: ResolvedValue, origin: Option<ValueOrigin>) {
        self.options
            .insert(key.to_string(), ResolvedOption { value, origin });
    }

    pub fn insert_argument(&mut self, name: &str, value: ResolvedValue) {
        self.arguments.insert(name.to_string(), value);
    }

    pub fn option(&self, key: &str) -> Option<&ResolvedValue> {
        self.options.get(key).map(|o| &o.value)
    }

    pub fn origin(&self, key: &str) -> Option<ValueOrigin> {
        self.options.get(key).and_then(|o| o.origin)
    }

    /// Flag value; `false` when missing or not a flag.
    pub fn flag(&self, key: &str) -> bool {
        self.option(key).and_then(ResolvedValue::as_flag).unwrap_or(false)
    }

    /// Counted value; `0` when missing or not counted.
    pub fn count(&self, key: &str) -> u64 {
        self.option(key).and_then(ResolvedValue::as_count).unwrap_or(0)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(ResolvedValue::first)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.option(key).map(ResolvedValue::values).unwrap_or(&[])
    }

    pub fn occurrences(&self, key: &str) -> &[Vec<String>] {
        self.option(key).map(ResolvedValue::occurrences).unwrap_or(&[])
    }

    pub fn argument(&self, name: &str) -> Option<&ResolvedValue> {
        self.arguments.get(name)
    }

    pub fn argument_value(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(ResolvedValue::first)
    }

    pub fn argument_values(&self, name: &str) -> &[String] {
        self.argument(name).map(ResolvedValue::values).unwrap_or(&[])
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &ResolvedOption)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn arguments(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.arguments.iter().map(|(k, v)| (k.as_str(), v))
    }
}
