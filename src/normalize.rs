use std::sync::OnceLock;

use regex::Regex;

/// Canonicalize a product-name string for lookup-key comparison.
///
/// Full-width spaces become regular spaces, runs of whitespace (including
/// newlines and tabs) collapse to a single space, and leading/trailing
/// whitespace is trimmed. Normalizing an already-normalized string returns
/// it unchanged, so superficial formatting differences between the ledger
/// and the tag reference never cause lookup misses.
pub fn normalize_name(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let half_width = raw.replace('\u{3000}', " ");
    whitespace.replace_all(&half_width, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_full_width_spaces() {
        assert_eq!(normalize_name("鶏もも肉\u{3000}正肉"), "鶏もも肉 正肉");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(normalize_name("a  b\t\nc"), "a b c");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(normalize_name("\u{3000}鶏もも肉（正式）\u{3000}"), "鶏もも肉（正式）");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_name("  鶏\u{3000}もも  肉 ");
        assert_eq!(normalize_name(&once), once);
    }
}
