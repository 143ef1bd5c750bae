//! Option prefix classification.
//!
//! Splits an option name (or a raw token) into its prefix and bare name. The
//! prefix rules let one parser accept Unix (`-x`, `--xx`), Windows (`/x`) and
//! chmod-style (`+x`) conventions at the same time.

/// Splits `name` into `(prefix, bare_name)`.
///
/// - A name starting with an alphanumeric character (or an empty name) has
///   no prefix.
/// - A name of at least three characters whose first two characters are the
///   same punctuation character has a two-character prefix (`--`, `//`, `++`).
/// - Otherwise the prefix is the first character.
///
/// # Examples
///
/// ```
/// use argtree_core::split_option_prefix;
///
/// assert_eq!(split_option_prefix("--verbose"), ("--", "verbose"));
/// assert_eq!(split_option_prefix("-v"), ("-", "v"));
/// assert_eq!(split_option_prefix("/out"), ("/", "out"));
/// assert_eq!(split_option_prefix("file.txt"), ("", "file.txt"));
/// assert_eq!(split_option_prefix("--"), ("-", "-"));
/// ```
pub fn split_option_prefix(name: &str) -> (&str, &str) {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return ("", name);
    };
    if first.is_alphanumeric() {
        return ("", name);
    }

    let width = first.len_utf8();
    let doubled = chars.next() == Some(first) && chars.next().is_some();
    if doubled {
        name.split_at(width * 2)
    } else {
        name.split_at(width)
    }
}

/// Returns only the prefix part of [`split_option_prefix`].
pub fn option_prefix(name: &str) -> &str {
    split_option_prefix(name).0
}
