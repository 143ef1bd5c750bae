//! In-memory value source.

use std::collections::BTreeMap;

use argtree_core::{Context, Invocation, OptionDecl, ValueSource, source_key};

/// Value source over a map of dotted keys (`run.jobs`) to occurrences.
///
/// Each call to [`insert`](MapValueSource::insert) for the same key adds one
/// more occurrence, so multi-occurrence options can be fed as well.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, Context, ContextSettings, OptionDecl, ValueSource};
/// use argtree_sources::MapValueSource;
///
/// let source = MapValueSource::new().with_value("run.jobs", &["4"]);
/// let root = CommandDecl::new("tool");
/// let ctx = Context::root(&root, &ContextSettings::default()).child(&CommandDecl::new("run"));
///
/// let found = source.values(&ctx, &OptionDecl::single(&["--jobs"]));
/// assert_eq!(found[0].values, vec!["4"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapValueSource {
    entries: BTreeMap<String, Vec<Vec<String>>>,
}

impl MapValueSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `values` under `key`.
    pub fn insert(&mut self, key: &str, values: &[&str]) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(values.iter().map(|v| (*v).to_string()).collect());
    }

    /// Builder form of [`insert`](MapValueSource::insert).
    pub fn with_value(mut self, key: &str, values: &[&str]) -> Self {
        self.insert(key, values);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ValueSource for MapValueSource {
    fn values(&self, context: &Context, option: &OptionDecl) -> Vec<Invocation> {
        let key = source_key(context, option).join(".");
        self.entries
            .get(&key)
            .map(|occurrences| {
                occurrences
                    .iter()
                    .map(|values| Invocation::new(option.longest_name(), values.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::{CommandDecl, ContextSettings};

    #[test]
    fn test_occurrences_accumulate_per_key() {
        let mut source = MapValueSource::new();
        source.insert("tag", &["a"]);
        source.insert("tag", &["b"]);
        assert_eq!(source.len(), 1);

        let root = CommandDecl::new("tool");
        let ctx = Context::root(&root, &ContextSettings::default());
        let found = source.values(&ctx, &OptionDecl::multiple(&["-t", "--tag"]));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "--tag");
        assert_eq!(found[1].values, vec!["b"]);
    }

    #[test]
    fn test_explicit_id_is_the_key() {
        let source = MapValueSource::new().with_value("level", &["3"]);
        let root = CommandDecl::new("tool");
        let ctx = Context::root(&root, &ContextSettings::default());

        let option = OptionDecl::single(&["--verbosity"]).with_id("level");
        assert_eq!(source.values(&ctx, &option)[0].values, vec!["3"]);
        assert!(source.values(&ctx, &OptionDecl::single(&["--level2"])).is_empty());
    }
}
