//! A minimal GraphQL token scanner.
//!
//! It knows just enough of the lexical grammar to step over ignored tokens, comments and
//! string literals, which is what the syntactic passes of this crate need. It never fails:
//! anything it does not recognize comes out as [`TokenKind::Other`].

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Punctuator(u8),
    Name,
    String,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: &'a str,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Token<'_> {
    pub(crate) fn is_punctuator(&self, punctuator: u8) -> bool {
        self.kind == TokenKind::Punctuator(punctuator)
    }
}

pub(crate) struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Lexer { source, position: 0 }
    }

    fn skip_ignored(&mut self) {
        let bytes = self.source.as_bytes();

        while let Some(&byte) = bytes.get(self.position) {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => self.position += 1,
                b'#' => {
                    self.position = bytes[self.position..]
                        .iter()
                        .position(|byte| *byte == b'\n')
                        .map_or(bytes.len(), |newline| self.position + newline + 1);
                }
                0xEF if bytes[self.position..].starts_with("\u{feff}".as_bytes()) => self.position += 3,
                _ => break,
            }
        }
    }

    fn skip_string(&mut self) {
        let bytes = self.source.as_bytes();
        let mut position = self.position;

        if bytes[position..].starts_with(b"\"\"\"") {
            position += 3;

            while position < bytes.len() {
                if bytes[position..].starts_with(b"\\\"\"\"") {
                    position += 4;
                } else if bytes[position..].starts_with(b"\"\"\"") {
                    position += 3;
                    break;
                } else {
                    position += 1;
                }
            }
        } else {
            position += 1;

            while let Some(&byte) = bytes.get(position) {
                match byte {
                    b'\\' => position += 2,
                    b'"' => {
                        position += 1;
                        break;
                    }
                    // unterminated, the string ends with the line
                    b'\n' => break,
                    _ => position += 1,
                }
            }
        }

        self.position = position.min(bytes.len());
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_ignored();

        let bytes = self.source.as_bytes();
        let start = self.position;
        let first = *bytes.get(start)?;

        let kind = match first {
            b'"' => {
                self.skip_string();
                TokenKind::String
            }
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                self.position += bytes[start..]
                    .iter()
                    .position(|byte| !(byte.is_ascii_alphanumeric() || *byte == b'_'))
                    .unwrap_or(bytes.len() - start);

                TokenKind::Name
            }
            b'!' | b'$' | b'&' | b'(' | b')' | b'.' | b':' | b'=' | b'@' | b'[' | b']' | b'{' | b'|' | b'}' => {
                self.position += 1;
                TokenKind::Punctuator(first)
            }
            _ => {
                self.position += self.source[start..].chars().next().map_or(1, char::len_utf8);
                TokenKind::Other
            }
        };

        Some(Token {
            kind,
            text: &self.source[start..self.position],
            start,
            end: self.position,
        })
    }
}

/// Removes empty argument lists such as the one in `listCharacters()`.
///
/// Captured traffic and schemas regularly contain them even though the GraphQL grammar
/// does not allow an empty list. Strings and comments are left untouched.
pub(crate) fn strip_empty_arguments(source: &str) -> Cow<'_, str> {
    let mut removed = Vec::new();
    let mut previous: Option<Token<'_>> = None;

    for token in Lexer::new(source) {
        if let Some(open) = previous.filter(|previous| previous.is_punctuator(b'(')) {
            if token.is_punctuator(b')') {
                removed.push(open.start..token.end);
            }
        }

        previous = Some(token);
    }

    if removed.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for span in removed {
        output.push_str(&source[last..span.start]);
        last = span.end;
    }

    output.push_str(&source[last..]);

    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(source).map(|token| (token.kind, token.text)).collect()
    }

    #[test]
    fn skips_ignored_tokens() {
        let tokens = kinds("\u{feff}query , # a comment { not a brace\n { hero }");

        assert_eq!(
            tokens,
            [
                (TokenKind::Name, "query"),
                (TokenKind::Punctuator(b'{'), "{"),
                (TokenKind::Name, "hero"),
                (TokenKind::Punctuator(b'}'), "}"),
            ]
        );
    }

    #[test]
    fn strings_are_opaque() {
        let tokens = kinds(r#"a(s: "}\"{", b: """ { "" } """)"#);

        assert_eq!(
            tokens,
            [
                (TokenKind::Name, "a"),
                (TokenKind::Punctuator(b'('), "("),
                (TokenKind::Name, "s"),
                (TokenKind::Punctuator(b':'), ":"),
                (TokenKind::String, r#""}\"{""#),
                (TokenKind::Name, "b"),
                (TokenKind::Punctuator(b':'), ":"),
                (TokenKind::String, r#"""" { "" } """"#),
                (TokenKind::Punctuator(b')'), ")"),
            ]
        );
    }

    #[test]
    fn non_ascii_input() {
        let tokens = kinds("é 12");

        assert_eq!(
            tokens,
            [
                (TokenKind::Other, "é"),
                (TokenKind::Other, "1"),
                (TokenKind::Other, "2"),
            ]
        );
    }

    #[test]
    fn strips_empty_argument_lists() {
        let query = "query{\n  listCharacters(){\n    info{ count }\n  }\n}";

        assert_eq!(
            strip_empty_arguments(query),
            "query{\n  listCharacters{\n    info{ count }\n  }\n}"
        );

        let schema = "type Query { listCharacters( # nothing\n ): [Characters]! }";

        assert_eq!(strip_empty_arguments(schema), "type Query { listCharacters: [Characters]! }");
    }

    #[test]
    fn keeps_non_empty_argument_lists_and_strings() {
        let query = r#"{ characters(filter: {}) { info(note: "()") { count } } }"#;

        assert!(matches!(strip_empty_arguments(query), Cow::Borrowed(_)));
    }
}
