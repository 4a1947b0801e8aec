//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod sanitize;
pub mod url;

/// Uppercase the first character and lowercase the rest.
///
/// Directory components and embed keys are rendered this way
/// (`"patreon"` becomes `"Patreon"`, `"JOHN doe"` becomes `"John doe"`).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
