//! Text normalization shared by adapters and the consolidator.

/// Fallback length when no sentence terminator is found.
const MAX_SENTENCE_CHARS: usize = 240;

/// Sentence terminators, tried in order; `true` keeps the terminator.
const SENTENCE_BREAKS: [(&str, bool); 6] = [
    ("。", true),
    (". ", false),
    ("！", true),
    ("!", true),
    ("？", true),
    ("?", true),
];

/// Collapse whitespace and cut `text` down to its first sentence.
///
/// Terminators are checked in a fixed order and the first one present
/// (past position 0) decides the cut, so `". "` is preferred over `"!"`
/// even when the latter appears earlier. Without any terminator the text
/// is truncated to 240 characters.
pub fn extract_sentence(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return String::new();
    }

    for (sep, keep) in SENTENCE_BREAKS {
        if let Some(idx) = normalized.find(sep) {
            if idx > 0 {
                let end = if keep { idx + sep.len() } else { idx };
                return normalized[..end].trim().to_string();
            }
        }
    }

    normalized.chars().take(MAX_SENTENCE_CHARS).collect()
}

/// Lookup key for a label: lower-cased, every non-alphanumeric run
/// collapsed to a single space, trimmed.
pub fn normalize_label(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_cut_before_period() {
        assert_eq!(
            extract_sentence("A stack is a  data structure.   It is LIFO."),
            "A stack is a data structure"
        );
    }

    #[test]
    fn sentence_keeps_cjk_terminator() {
        assert_eq!(extract_sentence("一种数据结构。后进先出。"), "一种数据结构。");
    }

    #[test]
    fn sentence_without_terminator_is_truncated() {
        let long = "word ".repeat(100);
        assert_eq!(extract_sentence(&long).chars().count(), 240);
        assert_eq!(extract_sentence("single clause"), "single clause");
    }

    #[test]
    fn sentence_of_blank_is_empty() {
        assert_eq!(extract_sentence("  \n\t "), "");
    }

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize_label("  Credit-Default  Swap (CDS) "), "credit default swap cds");
        assert_eq!(normalize_label("---"), "");
    }
}
