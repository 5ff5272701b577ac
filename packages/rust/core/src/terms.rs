//! Term-level heuristics: script detection, label quality and plural aliases.

/// Whether `text` contains a CJK unified ideograph (U+4E00..=U+9FFF).
pub fn has_cjk(text: &str) -> bool {
    text.chars().any(|ch| ('\u{4e00}'..='\u{9fff}').contains(&ch))
}

/// Accept a source-language term only when it has no CJK characters, at
/// least two letters, and a letter-to-alphanumeric ratio of `min_ratio` or
/// more. Rejects near-numeric and symbol-heavy labels.
pub fn is_term_clean(text: &str, min_ratio: f64) -> bool {
    if text.is_empty() || has_cjk(text) {
        return false;
    }
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
    if letters < 2 || alnum == 0 {
        return false;
    }
    letters as f64 / alnum as f64 >= min_ratio
}

/// English plural of a single word.
pub fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
        return format!("{word}es");
    }
    let mut tail = lower.chars().rev();
    if tail.next() == Some('y') {
        if let Some(before) = tail.next() {
            if !"aeiou".contains(before) {
                return format!("{}ies", &word[..word.len() - 1]);
            }
        }
    }
    format!("{word}s")
}

/// Pluralize the last token of `term`.
///
/// Returns `None` when the last token is not purely alphabetic, is all
/// upper-case, is shorter than three characters, or already ends in `s`.
pub fn plural_variant(term: &str) -> Option<String> {
    let tokens: Vec<&str> = term.split_whitespace().collect();
    let (last, head) = tokens.split_last()?;

    if !last.chars().all(char::is_alphabetic) || is_all_upper(last) {
        return None;
    }
    if last.chars().count() < 3 || last.to_lowercase().ends_with('s') {
        return None;
    }

    let plural = pluralize_word(last);
    if plural == *last {
        return None;
    }
    let mut words: Vec<&str> = head.to_vec();
    words.push(&plural);
    Some(words.join(" "))
}

fn is_all_upper(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cjk() {
        assert!(has_cjk("算法"));
        assert!(has_cjk("API 接口"));
        assert!(!has_cjk("algorithm"));
        assert!(!has_cjk("アルゴリズム"));
    }

    #[test]
    fn term_quality() {
        assert!(is_term_clean("API", 0.4));
        assert!(is_term_clean("HTTP/2", 0.4));
        assert!(!is_term_clean("42", 0.4));
        assert!(!is_term_clean("X-1", 0.4));
        assert!(!is_term_clean("--", 0.4));
        assert!(!is_term_clean("", 0.4));
        assert!(!is_term_clean("stack 堆栈", 0.4));
        assert!(!is_term_clean("ab1234", 0.4));
    }

    #[test]
    fn pluralizes_words() {
        assert_eq!(pluralize_word("process"), "processes");
        assert_eq!(pluralize_word("dependency"), "dependencies");
        assert_eq!(pluralize_word("branch"), "branches");
        assert_eq!(pluralize_word("key"), "keys");
        assert_eq!(pluralize_word("queue"), "queues");
    }

    #[test]
    fn plural_variant_rules() {
        assert_eq!(plural_variant("stack frame").as_deref(), Some("stack frames"));
        assert_eq!(plural_variant("hash  policy").as_deref(), Some("hash policies"));
        assert_eq!(plural_variant("API"), None);
        assert_eq!(plural_variant("Class"), None);
        assert_eq!(plural_variant("process"), None);
        assert_eq!(plural_variant("IP"), None);
        assert_eq!(plural_variant("ox"), None);
        assert_eq!(plural_variant("IPv4"), None);
        assert_eq!(plural_variant(""), None);
    }
}
