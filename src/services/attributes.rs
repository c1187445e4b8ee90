//! EXTINF attribute tokenizer
//!
//! Splits the metadata line of a playlist entry into `key=value` attributes
//! and the trailing display name. Quoted values may contain whitespace and
//! commas; unquoted values end at whitespace or a comma.
//!
//! ```text
//! #EXTINF:-1 tvg-id="bbc1" tvg-logo='http://x/y.png' group-title=News,BBC One
//! ```

use std::collections::HashMap;

/// Metadata line marker
pub const EXTINF_MARKER: &str = "#EXTINF:";

/// Parsed EXTINF line data
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtinfLine {
    /// Lower-cased attribute keys
    pub attributes: HashMap<String, String>,
    /// Text after the last comma, trimmed. Empty when missing.
    pub name: String,
    /// Fragments that looked like attributes but could not be read
    pub skipped: usize,
}

impl ExtinfLine {
    /// First non-empty value among `keys`
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.attributes.get(*k))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

/// Tokenize a metadata line. The marker is optional so the tokenizer can be
/// fed bare attribute text as well.
pub fn parse_extinf(line: &str) -> ExtinfLine {
    let body = line.strip_prefix(EXTINF_MARKER).unwrap_or(line);

    let name = body
        .rfind(',')
        .map(|idx| body[idx + 1..].trim().to_string())
        .unwrap_or_default();

    let mut tokenizer = Tokenizer::new(body);
    let mut attributes = HashMap::new();
    let mut skipped = 0;

    while let Some(token) = tokenizer.next_token() {
        match token {
            Token::Attribute(key, value) => {
                attributes.insert(key.to_lowercase(), value);
            }
            Token::Malformed => skipped += 1,
            Token::Bare => {}
        }
    }

    ExtinfLine {
        attributes,
        name,
        skipped,
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Attribute(String, String),
    /// A word that is not an attribute (duration, name words)
    Bare,
    /// `key=` with an unterminated quote or an empty key
    Malformed,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn is_key_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    /// Consume the rest of a non-attribute word
    fn skip_word(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                break;
            }
            self.chars.next();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_separators();
        let &(start, _) = self.chars.peek()?;

        let mut end = start;
        while let Some(&(idx, c)) = self.chars.peek() {
            if !Self::is_key_char(c) {
                break;
            }
            end = idx + c.len_utf8();
            self.chars.next();
        }
        let key = &self.src[start..end];

        match self.chars.peek() {
            Some(&(_, '=')) => {
                self.chars.next();
            }
            _ => {
                self.skip_word();
                return Some(Token::Bare);
            }
        }

        let value = match self.chars.peek() {
            Some(&(_, quote @ ('"' | '\''))) => {
                self.chars.next();
                match self.read_quoted(quote) {
                    Some(value) => value,
                    None => return Some(Token::Malformed),
                }
            }
            _ => self.read_unquoted(),
        };

        if key.is_empty() {
            return Some(Token::Malformed);
        }

        Some(Token::Attribute(key.to_string(), value))
    }

    /// Read up to the closing quote. An unterminated quote swallows the
    /// rest of the line and yields `None`.
    fn read_quoted(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == quote {
                return Some(value);
            }
            value.push(c);
        }
        None
    }

    fn read_unquoted(&mut self) -> String {
        let mut value = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                break;
            }
            value.push(c);
            self.chars.next();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = parse_extinf(line);

        assert_eq!(extinf.name, "Globo HD");
        assert_eq!(extinf.attributes.get("tvg-id"), Some(&"globo".to_string()));
        assert_eq!(extinf.attributes.get("tvg-name"), Some(&"Globo HD".to_string()));
        assert_eq!(extinf.attributes.get("group-title"), Some(&"TV".to_string()));
        assert_eq!(extinf.skipped, 0);
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let extinf = parse_extinf("#EXTINF:-1,Canal Teste");

        assert_eq!(extinf.name, "Canal Teste");
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_single_quotes_and_unquoted_values() {
        let extinf = parse_extinf("#EXTINF:-1 tvg-logo='http://x/a b.png' group-title=Sports tvg-id=s1,ESPN");

        assert_eq!(extinf.attributes["tvg-logo"], "http://x/a b.png");
        assert_eq!(extinf.attributes["group-title"], "Sports");
        assert_eq!(extinf.attributes["tvg-id"], "s1");
        assert_eq!(extinf.name, "ESPN");
    }

    #[test]
    fn test_keys_are_lowercased_and_order_free() {
        let extinf = parse_extinf(r#"#EXTINF:-1   GROUP-TITLE="Kids"    TVG-ID="k1" ,Cartoons"#);

        assert_eq!(extinf.attributes["group-title"], "Kids");
        assert_eq!(extinf.attributes["tvg-id"], "k1");
        assert_eq!(extinf.name, "Cartoons");
    }

    #[test]
    fn test_name_is_after_last_comma() {
        let extinf = parse_extinf(r#"#EXTINF:-1 group-title="News, Weather",CNN"#);

        assert_eq!(extinf.attributes["group-title"], "News, Weather");
        assert_eq!(extinf.name, "CNN");
    }

    #[test]
    fn test_missing_name() {
        assert_eq!(parse_extinf(r#"#EXTINF:-1 tvg-id="x""#).name, "");
        assert_eq!(parse_extinf("#EXTINF:-1 tvg-id=x,   ").name, "");
    }

    #[test]
    fn test_unterminated_quote_is_skipped() {
        let extinf = parse_extinf(r#"#EXTINF:-1 tvg-id="ok" tvg-logo="http://broken,Name"#);

        assert_eq!(extinf.attributes["tvg-id"], "ok");
        assert!(!extinf.attributes.contains_key("tvg-logo"));
        assert_eq!(extinf.skipped, 1);
        assert_eq!(extinf.name, "Name");
    }

    #[test]
    fn test_empty_key_is_malformed() {
        let extinf = parse_extinf(r#"#EXTINF:-1 ="orphan" tvg-id="a",X"#);

        assert_eq!(extinf.skipped, 1);
        assert_eq!(extinf.attributes.len(), 1);
        assert_eq!(extinf.attributes["tvg-id"], "a");
    }

    #[test]
    fn test_first_of_skips_empty_values() {
        let extinf = parse_extinf(r#"#EXTINF:-1 tvg-logo="" logo="http://l.png",X"#);
        assert_eq!(extinf.first_of(&["tvg-logo", "logo"]), Some("http://l.png"));
        assert_eq!(extinf.first_of(&["group-title", "group"]), None);
    }

    #[test]
    fn test_unknown_keys_retained() {
        let extinf = parse_extinf(r#"#EXTINF:-1 catchup-days="7" tvg-shift=2,X"#);
        assert_eq!(extinf.attributes["catchup-days"], "7");
        assert_eq!(extinf.attributes["tvg-shift"], "2");
    }
}
