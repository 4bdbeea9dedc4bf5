//! Path-component tokenizer
//!
//! A token is a contiguous run of letters/digits, lowercased, with a flag for
//! whether it originated inside brackets or parentheses. All separators are
//! discarded and token order is never changed.

/// One alphanumeric run from a path component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub in_braces: bool,
}

impl Token {
    pub fn is_digits(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|ch| ch.is_ascii_digit())
    }
}

/// Splits a single path component into tokens.
pub fn tokenize(name: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = Token::default();
    let mut depth = 0u32;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            current.text.extend(ch.to_lowercase());
            continue;
        }
        if !current.text.is_empty() {
            tokens.push(current.clone());
            current.text.clear();
        }
        if ch == '(' || ch == '[' {
            depth += 1;
            current.in_braces = true;
        } else if (ch == ')' || ch == ']') && depth > 0 {
            depth -= 1;
            if depth == 0 {
                current.in_braces = false;
            }
        }
    }
    if !current.text.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Renders tokens as a human-readable title: space-joined, with the first
/// letter uppercased for every token of three or more characters.
pub fn title_string(tokens: &[Token]) -> String {
    let words: Vec<String> = tokens
        .iter()
        .map(|t| {
            if t.text.chars().count() >= 3 {
                let mut chars = t.text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            } else {
                t.text.clone()
            }
        })
        .collect();
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_discards_separators_and_lowercases() {
        let tokens = tokenize("Stranger.Things_S04-WEBDL");
        assert_eq!(texts(&tokens), vec!["stranger", "things", "s04", "webdl"]);
        assert!(tokens.iter().all(|t| !t.in_braces));
    }

    #[test]
    fn test_tokenize_marks_bracketed_tokens() {
        let tokens = tokenize("Lexx.dvdrip_[full.collection]_ok");
        assert_eq!(texts(&tokens), vec!["lexx", "dvdrip", "full", "collection", "ok"]);
        let braces: Vec<bool> = tokens.iter().map(|t| t.in_braces).collect();
        assert_eq!(braces, vec![false, false, true, true, false]);
    }

    #[test]
    fn test_tokenize_nested_braces_close_at_depth_zero() {
        let tokens = tokenize("a ([b] c) d");
        let braces: Vec<(&str, bool)> = tokens.iter().map(|t| (t.text.as_str(), t.in_braces)).collect();
        assert_eq!(braces, vec![("a", false), ("b", true), ("c", true), ("d", false)]);
    }

    #[test]
    fn test_tokenize_keeps_cyrillic() {
        let tokens = tokenize("Гильдия 6-й сезон");
        assert_eq!(texts(&tokens), vec!["гильдия", "6", "й", "сезон"]);
    }

    #[test]
    fn test_title_string_capitalizes_long_words_only() {
        let tokens = tokenize("the ring of powers");
        assert_eq!(title_string(&tokens), "The Ring of Powers");

        let tokens = tokenize("sg 1 morpheus");
        assert_eq!(title_string(&tokens), "sg 1 Morpheus");
    }

    #[test]
    fn test_is_digits() {
        assert!(Token { text: "04".into(), in_braces: false }.is_digits());
        assert!(!Token { text: "s04".into(), in_braces: false }.is_digits());
        assert!(!Token::default().is_digits());
    }
}
