//! Child naming: display labels for map entries and index parsing.

use crate::inspect::TargetValue;

/// Label for a paired entry, derived from its key alone
///
/// Uses the key's summary, then its textual value, then the entry's position,
/// and wraps the result in brackets so the entry renders as `[key] = value`.
pub fn display_label<V: TargetValue>(key: Option<&V>, index: u64) -> String
{
    let text = key.and_then(|key| {
        key.summary()
            .filter(|s| !s.is_empty())
            .or_else(|| key.value_text().filter(|s| !s.is_empty()))
    });
    match text {
        Some(text) => format!("[{text}]"),
        None => format!("[{index}]"),
    }
}

/// Parse a synthesized child name back into its index
///
/// Accepts `[3]` as well as a bare `3`; anything else is `None`.
///
/// ```rust
/// use vmview_core::label::parse_child_index;
///
/// assert_eq!(parse_child_index("[12]"), Some(12));
/// assert_eq!(parse_child_index("size_"), None);
/// ```
pub fn parse_child_index(name: &str) -> Option<usize>
{
    name.trim_start_matches('[').trim_end_matches(']').trim().parse().ok()
}
