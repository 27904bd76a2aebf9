//! Minimal markup tokenizer used by [`MemoryDocument`](crate::MemoryDocument).
//!
//! Covers start/end tags with quoted or unquoted attributes, self-closing
//! tags, text with the common character references, and comments. Doctype,
//! CDATA and script data are out of reach; a `<!` that is not a comment is
//! skipped up to the next `>`.

/// Elements that never have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// True for tags in [`VOID_ELEMENTS`].
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// One markup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<tag attr="value">`, names lowercased.
    StartTag {
        /// Tag name.
        name: String,
        /// Attributes in source order.
        attributes: Vec<(String, String)>,
        /// Written as `<tag/>`.
        self_closing: bool,
    },
    /// `</tag>`.
    EndTag {
        /// Tag name.
        name: String,
    },
    /// Run of text with references decoded.
    Text(String),
    /// `<!-- ... -->` body.
    Comment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueQuoted(char),
    AttributeValueUnquoted,
    SelfClosingStartTag,
    BogusComment,
}

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut state = State::Data;
    let mut text = String::new();
    let mut name = String::new();
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut attr_name = String::new();
    let mut attr_value = String::new();
    let mut is_end = false;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        pos += 1;
        match state {
            State::Data => {
                if c == '<' {
                    state = State::TagOpen;
                } else {
                    text.push(c);
                }
            }
            State::TagOpen => {
                if c == '!' {
                    if chars[pos..].starts_with(&['-', '-']) {
                        let rest: String = chars[pos + 2..].iter().collect();
                        let end = rest.find("-->");
                        let body = end.map_or(rest.as_str(), |e| &rest[..e]).to_string();
                        let consumed = end.map_or(rest.chars().count(), |e| {
                            rest[..e].chars().count() + 3
                        });
                        flush_text(&mut tokens, &mut text);
                        tokens.push(Token::Comment(body));
                        pos += 2 + consumed;
                        state = State::Data;
                    } else {
                        state = State::BogusComment;
                    }
                } else if c == '/' {
                    state = State::EndTagOpen;
                } else if c.is_ascii_alphabetic() {
                    flush_text(&mut tokens, &mut text);
                    is_end = false;
                    name.clear();
                    attributes.clear();
                    name.push(c.to_ascii_lowercase());
                    state = State::TagName;
                } else {
                    text.push('<');
                    pos -= 1;
                    state = State::Data;
                }
            }
            State::EndTagOpen => {
                if c.is_ascii_alphabetic() {
                    flush_text(&mut tokens, &mut text);
                    is_end = true;
                    name.clear();
                    attributes.clear();
                    name.push(c.to_ascii_lowercase());
                    state = State::TagName;
                } else {
                    state = State::BogusComment;
                }
            }
            State::TagName => match c {
                c if c.is_whitespace() => state = State::BeforeAttributeName,
                '/' => state = State::SelfClosingStartTag,
                '>' => {
                    emit_tag(&mut tokens, is_end, &mut name, &mut attributes, false);
                    state = State::Data;
                }
                c => name.push(c.to_ascii_lowercase()),
            },
            State::BeforeAttributeName => match c {
                c if c.is_whitespace() => {}
                '/' => state = State::SelfClosingStartTag,
                '>' => {
                    emit_tag(&mut tokens, is_end, &mut name, &mut attributes, false);
                    state = State::Data;
                }
                c => {
                    attr_name.clear();
                    attr_value.clear();
                    attr_name.push(c.to_ascii_lowercase());
                    state = State::AttributeName;
                }
            },
            State::AttributeName => match c {
                c if c.is_whitespace() => state = State::AfterAttributeName,
                '=' => state = State::BeforeAttributeValue,
                '/' | '>' => {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    pos -= 1;
                    state = State::BeforeAttributeName;
                }
                c => attr_name.push(c.to_ascii_lowercase()),
            },
            State::AfterAttributeName => match c {
                c if c.is_whitespace() => {}
                '=' => state = State::BeforeAttributeValue,
                _ => {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    pos -= 1;
                    state = State::BeforeAttributeName;
                }
            },
            State::BeforeAttributeValue => match c {
                c if c.is_whitespace() => {}
                '"' | '\'' => state = State::AttributeValueQuoted(c),
                '>' => {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    emit_tag(&mut tokens, is_end, &mut name, &mut attributes, false);
                    state = State::Data;
                }
                c => {
                    attr_value.push(c);
                    state = State::AttributeValueUnquoted;
                }
            },
            State::AttributeValueQuoted(quote) => {
                if c == quote {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    state = State::BeforeAttributeName;
                } else {
                    attr_value.push(c);
                }
            }
            State::AttributeValueUnquoted => match c {
                c if c.is_whitespace() => {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    state = State::BeforeAttributeName;
                }
                '>' => {
                    push_attribute(&mut attributes, &mut attr_name, &mut attr_value);
                    emit_tag(&mut tokens, is_end, &mut name, &mut attributes, false);
                    state = State::Data;
                }
                c => attr_value.push(c),
            },
            State::SelfClosingStartTag => {
                if c == '>' {
                    emit_tag(&mut tokens, is_end, &mut name, &mut attributes, true);
                    state = State::Data;
                } else {
                    pos -= 1;
                    state = State::BeforeAttributeName;
                }
            }
            State::BogusComment => {
                if c == '>' {
                    state = State::Data;
                }
            }
        }
    }

    if state == State::TagOpen {
        text.push('<');
    }
    flush_text(&mut tokens, &mut text);
    tokens
}

fn flush_text(tokens: &mut Vec<Token>, text: &mut String) {
    if !text.is_empty() {
        tokens.push(Token::Text(decode_references(text)));
        text.clear();
    }
}

fn push_attribute(
    attributes: &mut Vec<(String, String)>,
    name: &mut String,
    value: &mut String,
) {
    if name.is_empty() {
        return;
    }
    // First occurrence wins, as in the HTML tokenizer.
    if !attributes.iter().any(|(existing, _)| existing == name) {
        attributes.push((std::mem::take(name), decode_references(value)));
    }
    name.clear();
    value.clear();
}

fn emit_tag(
    tokens: &mut Vec<Token>,
    is_end: bool,
    name: &mut String,
    attributes: &mut Vec<(String, String)>,
    self_closing: bool,
) {
    let name = std::mem::take(name);
    if is_end {
        attributes.clear();
        tokens.push(Token::EndTag { name });
    } else {
        tokens.push(Token::StartTag {
            name,
            attributes: std::mem::take(attributes),
            self_closing,
        });
    }
}

/// Decode the handful of named and numeric references markup authors use.
pub fn decode_references(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix('#')
                    .and_then(|num| match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    })
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attributes: &[(&str, &str)], self_closing: bool) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn button_with_method_attribute() {
        let tokens = tokenize(r#"<button method="save">Save</button>"#);
        assert_eq!(
            tokens,
            vec![
                start("button", &[("method", "save")], false),
                Token::Text("Save".to_string()),
                Token::EndTag {
                    name: "button".to_string()
                },
            ]
        );
    }

    #[test]
    fn attribute_forms() {
        let tokens = tokenize(r#"<IMG SRC=a.png alt='x y' hidden width="10"/>"#);
        assert_eq!(
            tokens,
            vec![start(
                "img",
                &[("src", "a.png"), ("alt", "x y"), ("hidden", ""), ("width", "10")],
                true
            )]
        );
    }

    #[test]
    fn comments_and_stray_brackets() {
        let tokens = tokenize("a < b<!-- note -->c<!DOCTYPE html>d");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a < b".to_string()),
                Token::Comment(" note ".to_string()),
                Token::Text("cd".to_string()),
            ]
        );
    }

    #[test]
    fn references_decode() {
        assert_eq!(decode_references("a &amp; b &lt;&#65;&#x42;&bogus;"), "a & b <AB&bogus;");
    }

    #[test]
    fn void_elements() {
        assert!(is_void("img"));
        assert!(!is_void("div"));
    }
}
