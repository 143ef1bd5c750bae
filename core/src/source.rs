//! Pluggable value sources.

use crate::context::Context;
use crate::invocation::Invocation;
use crate::types::OptionDecl;

/// Supplies option values from outside the command line (config files,
/// in-memory maps, ...).
///
/// Sources are only consulted for options that have no command-line
/// invocation. Returning an empty list means "nothing here".
pub trait ValueSource: Send + Sync {
    fn values(&self, context: &Context, option: &OptionDecl) -> Vec<Invocation>;
}

/// Lookup path of `option` in a value source: the command path below the
/// root followed by the option key.
///
/// # Examples
///
/// ```
/// use argtree_core::{source_key, CommandDecl, Context, ContextSettings, OptionDecl};
///
/// let root = CommandDecl::new("tool");
/// let ctx = Context::root(&root, &ContextSettings::default()).child(&CommandDecl::new("run"));
/// let option = OptionDecl::single(&["--jobs"]);
/// assert_eq!(source_key(&ctx, &option), vec!["run", "jobs"]);
/// ```
pub fn source_key(context: &Context, option: &OptionDecl) -> Vec<String> {
    context
        .command_path()
        .iter()
        .skip(1)
        .cloned()
        .chain(std::iter::once(option.key()))
        .collect()
}
