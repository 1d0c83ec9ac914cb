use thiserror::Error;

use crate::env::EnvMap;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("unterminated placeholder starting with `{{{0}`")]
    Unterminated(String),
    #[error("invalid placeholder name: {0}")]
    InvalidName(String),
    #[error("missing value for placeholder {0}")]
    Missing(String),
}

/// Replaces `{NAME}` with the value from `vars`, falling back to the process
/// environment. `\{` and `\}` produce literal braces, and a `{` that is not
/// followed by a name character is kept as-is.
pub fn expand_placeholders(input: &str, vars: &EnvMap) -> Result<String, PlaceholderError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(['\\', '{']) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(escaped) = tail.strip_prefix('\\') {
            match escaped.chars().next() {
                Some(ch @ ('{' | '}')) => {
                    output.push(ch);
                    rest = &escaped[1..];
                }
                _ => {
                    output.push('\\');
                    rest = escaped;
                }
            }
            continue;
        }

        let body = &tail[1..];
        if !body.starts_with(is_name_start) {
            output.push('{');
            rest = body;
            continue;
        }

        let Some(end) = body.find('}') else {
            return Err(PlaceholderError::Unterminated(body.to_string()));
        };
        let name = &body[..end];
        if !name.chars().all(is_name_char) {
            return Err(PlaceholderError::InvalidName(name.to_string()));
        }

        let value = vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
            .ok_or_else(|| PlaceholderError::Missing(name.to_string()))?;
        output.push_str(&value);
        rest = &body[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}
