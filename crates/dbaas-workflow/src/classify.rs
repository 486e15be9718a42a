//! Classification of collaborator output into error codes.
//!
//! Driver scripts report every failure with the same exit status, so the
//! only reliable signal is what they print. Patterns are tried in order and
//! the first match wins.

use dbaas_saga::ErrorCode;
use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<(Regex, ErrorCode)>> = Lazy::new(|| {
    [
        (
            r"(?i)couldn't connect to server|connection refused|could not connect",
            ErrorCode::Connection,
        ),
        (
            r#"(?i)auth(entication)? fail|code:\s*18\b|"code"\s*:\s*18\b"#,
            ErrorCode::Authentication,
        ),
        (r"(?i)already exists", ErrorCode::AlreadyExists),
        (
            r"(?i)\b(database|user|credential|export|access|rule|host|trigger|monitor)s?\b.*\b(not found|does not exist|doesn't exist)",
            ErrorCode::NotFound,
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, code)| Regex::new(pattern).ok().map(|regex| (regex, code)))
    .collect()
});

/// Classify collaborator output, returning `None` when no pattern matches.
#[must_use]
pub fn classify(output: &str) -> Option<ErrorCode> {
    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(output))
        .map(|(_, code)| code.clone())
}
