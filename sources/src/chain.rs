//! Fallback chain of value sources.

use std::fmt;
use std::sync::Arc;

use argtree_core::{Context, Invocation, OptionDecl, ValueSource};
use tracing::trace;

/// Queries several sources in order; the first one that yields invocations
/// for an option wins.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandDecl, Context, ContextSettings, OptionDecl, ValueSource};
/// use argtree_sources::{ChainedSource, MapValueSource};
///
/// let chain = ChainedSource::new()
///     .with_source(MapValueSource::new().with_value("name", &["local"]))
///     .with_source(MapValueSource::new().with_value("name", &["global"]).with_value("jobs", &["2"]));
///
/// let root = CommandDecl::new("tool");
/// let ctx = Context::root(&root, &ContextSettings::default());
/// assert_eq!(chain.values(&ctx, &OptionDecl::single(&["--name"]))[0].values, vec!["local"]);
/// assert_eq!(chain.values(&ctx, &OptionDecl::single(&["--jobs"]))[0].values, vec!["2"]);
/// ```
#[derive(Clone, Default)]
pub struct ChainedSource {
    sources: Vec<Arc<dyn ValueSource>>,
}

impl ChainedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source with lower priority than the ones already added.
    pub fn with_source(mut self, source: impl ValueSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Appends an already shared source.
    pub fn with_shared(mut self, source: Arc<dyn ValueSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for ChainedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedSource")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl ValueSource for ChainedSource {
    fn values(&self, context: &Context, option: &OptionDecl) -> Vec<Invocation> {
        for (index, source) in self.sources.iter().enumerate() {
            let found = source.values(context, option);
            if !found.is_empty() {
                trace!(option = option.longest_name(), index, "value source matched");
                return found;
            }
        }
        Vec::new()
    }
}
