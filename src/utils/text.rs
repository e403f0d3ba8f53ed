//! Text tokenization shared by the indexes and analytics.

/// Split text into lowercase alphanumeric terms.
///
/// Every non-alphanumeric character is a separator, never an operator.
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}
