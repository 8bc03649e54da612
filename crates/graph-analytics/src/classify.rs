use std::{fmt, iter::Peekable};

use crate::lexer::{Lexer, Token, TokenKind};

/// The kind of a GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "query" => Some(OperationType::Query),
            "mutation" => Some(OperationType::Mutation),
            "subscription" => Some(OperationType::Subscription),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determines the operation kind from the keyword in front of the operation's selection set.
///
/// This is purely syntactic: the document is not validated, and the arguments or return
/// types of the selected fields play no part. The anonymous shorthand `{ ... }` is a query.
/// Fragment definitions are stepped over. With an operation name, the definition carrying
/// that name decides, and `None` is returned when there is no such definition.
pub fn classify(query: &str, operation_name: Option<&str>) -> Option<OperationType> {
    let mut tokens = Lexer::new(query).peekable();

    while let Some(token) = tokens.next() {
        let (operation_type, name) = match token.kind {
            TokenKind::Punctuator(b'{') => {
                skip_selection_set(&mut tokens);
                (OperationType::Query, None)
            }
            TokenKind::Name if token.text == "fragment" => {
                skip_definition(&mut tokens)?;
                continue;
            }
            TokenKind::Name => {
                let operation_type = OperationType::from_keyword(token.text)?;
                let name = tokens
                    .next_if(|token| token.kind == TokenKind::Name)
                    .map(|token| token.text);

                skip_definition(&mut tokens)?;
                (operation_type, name)
            }
            _ => return None,
        };

        match operation_name {
            None => return Some(operation_type),
            Some(operation_name) if name == Some(operation_name) => return Some(operation_type),
            Some(_) => continue,
        }
    }

    None
}

/// Skips the header of a definition up to and including its selection set. Braces inside
/// the variable definitions (object default values) are not mistaken for the body.
fn skip_definition<'a>(tokens: &mut Peekable<impl Iterator<Item = Token<'a>>>) -> Option<()> {
    let mut parentheses = 0usize;

    loop {
        let token = tokens.next()?;

        match token.kind {
            TokenKind::Punctuator(b'(') => parentheses += 1,
            TokenKind::Punctuator(b')') => parentheses = parentheses.saturating_sub(1),
            TokenKind::Punctuator(b'{') if parentheses == 0 => break,
            _ => (),
        }
    }

    skip_selection_set(tokens);

    Some(())
}

/// Skips to the brace closing an already opened selection set.
fn skip_selection_set<'a>(tokens: &mut Peekable<impl Iterator<Item = Token<'a>>>) {
    let mut depth = 1usize;

    for token in tokens {
        match token.kind {
            TokenKind::Punctuator(b'{') => depth += 1,
            TokenKind::Punctuator(b'}') => {
                depth -= 1;

                if depth == 0 {
                    return;
                }
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_is_a_query() {
        assert_eq!(classify("{ hero { name } }", None), Some(OperationType::Query));
        assert_eq!(
            classify("query{\n  characters(filter: {\n    \n  }){\n    info{\n      count\n    }\n  }\n}", None),
            Some(OperationType::Query)
        );
    }

    #[test]
    fn list_fields_do_not_change_the_kind() {
        let list = "query{\n  listCharacters(){\n    info{\n      count\n    }\n  }\n}";
        let filtered = "query{ characters(filter: { name: \"Rick\" }) { info { count } } }";

        assert_eq!(classify(list, None), classify(filtered, None));
    }

    #[test]
    fn keywords() {
        assert_eq!(
            classify("mutation CreateTodo { createTodo { id } }", None),
            Some(OperationType::Mutation)
        );
        assert_eq!(
            classify("# leading comment\nsubscription { onTodo { id } }", None),
            Some(OperationType::Subscription)
        );
        assert_eq!(
            classify("query Named($filter: Filter = { name: \"x\" }) @cached { a }", None),
            Some(OperationType::Query)
        );
    }

    #[test]
    fn fragments_come_first() {
        let query = r#"
            fragment TodoFields on Todo {
                id
                author { name }
            }

            mutation {
                createTodo { ...TodoFields }
            }
        "#;

        assert_eq!(classify(query, None), Some(OperationType::Mutation));
    }

    #[test]
    fn operation_name_selects_the_definition() {
        let document = "query Read { todos { id } } mutation Write { createTodo { id } }";

        assert_eq!(classify(document, None), Some(OperationType::Query));
        assert_eq!(classify(document, Some("Write")), Some(OperationType::Mutation));
        assert_eq!(classify(document, Some("Read")), Some(OperationType::Query));
        assert_eq!(classify(document, Some("Delete")), None);
    }

    #[test]
    fn braces_in_strings_are_ignored() {
        let document = r#"query A { a(s: "}") } mutation B { b }"#;

        assert_eq!(classify(document, Some("B")), Some(OperationType::Mutation));
    }

    #[test]
    fn unrecognized_documents() {
        assert_eq!(classify("", None), None);
        assert_eq!(classify("   \n# only a comment", None), None);
        assert_eq!(classify("type Query { hello: String }", None), None);
        assert_eq!(classify("query", None), None);
        assert_eq!(classify("fragment F on Todo { id }", None), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OperationType::Subscription).unwrap(),
            r#""subscription""#
        );
    }
}
