//! Pluralization helper for log lines.

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "client")` -> `"0 clients"`
/// - `plural_count(1, "client")` -> `"1 client"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
