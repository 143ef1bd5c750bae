//! Tokenizer for `@file` argument files.
//!
//! The format is a small subset of POSIX shell quoting: whitespace separates
//! tokens, `"` and `'` quote runs that may contain whitespace, a backslash
//! escapes the next character (or continues the line when followed by a line
//! break) and `#` starts a comment that runs to the end of the line.

use argtree_core::UsageError;

/// Splits the contents of an argument file into tokens.
///
/// `filename` is only used in error messages.
///
/// # Examples
///
/// ```
/// use argtree_parser::lex_argument_file;
///
/// let tokens = lex_argument_file("args", "--name 'two words' # comment\n-x\"\"y ''").unwrap();
/// assert_eq!(tokens, vec!["--name", "two words", "-xy", ""]);
///
/// let err = lex_argument_file("args", "one\n'unterminated").unwrap_err();
/// assert_eq!(err.to_string(), "incorrect format in file args line 2: unclosed quote");
/// ```
pub fn lex_argument_file(filename: &str, text: &str) -> Result<Vec<String>, UsageError> {
    let chars: Vec<char> = text.chars().collect();
    let line_at = |index: usize| chars[..index].iter().filter(|&&c| c == '\n').count() + 1;
    let invalid = |index: usize, message: &str| UsageError::InvalidFileFormat {
        filename: filename.to_string(),
        line: line_at(index),
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut current = String::new();
    // Set once a quote has been opened, so `""` still produces a token.
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let Some(&next) = chars.get(i + 1) else {
                return Err(invalid(i, "file ends with \\"));
            };
            if next == '\r' || next == '\n' {
                i += 1;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
            } else {
                current.push(next);
                in_token = true;
                i += 2;
            }
        } else if Some(c) == quote {
            quote = None;
            i += 1;
        } else if quote.is_some() {
            current.push(c);
            i += 1;
        } else if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '"' || c == '\'' {
            quote = Some(c);
            in_token = true;
            i += 1;
        } else if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            i += 1;
        } else {
            current.push(c);
            in_token = true;
            i += 1;
        }
    }

    if quote.is_some() {
        return Err(invalid(chars.len(), "unclosed quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
