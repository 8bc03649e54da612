use std::collections::HashMap;

use async_graphql_parser::{
    types::{self as ast, ExecutableDocument},
    Positioned,
};

use crate::{classify::OperationType, lexer::strip_empty_arguments};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionId(usize);

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Syntax(#[from] async_graphql_parser::Error),
    #[error("the document has no operation named `{0}`")]
    UnknownOperationName(String),
    #[error("the document has no operation")]
    NoOperation,
}

/// A single operation of an executable document, with the fragments it can spread.
///
/// Selection sets are flattened into one vector sorted by parent selection, so walking a
/// set is a binary search followed by a linear scan.
#[derive(Debug)]
pub struct Operation {
    /// fragment name -> fragment
    pub(crate) fragments: HashMap<String, Fragment>,
    pub(crate) operation_type: OperationType,
    pub(crate) root_selection: SelectionId,
    /// (parent selection, selection)
    pub(crate) selections: Vec<(SelectionId, Selection)>,
}

#[derive(Debug)]
pub(crate) struct Fragment {
    pub(crate) type_condition: String,
    pub(crate) selection: SelectionId,
}

#[derive(Debug)]
pub(crate) enum Selection {
    Field {
        field_name: String,
        subselection: Option<SelectionId>,
    },
    FragmentSpread {
        fragment_name: String,
    },
    InlineFragment {
        on: Option<String>,
        selection: SelectionId,
    },
}

impl Operation {
    /// Parses `query` and keeps the operation named `operation_name`, or the first one in the text.
    pub fn parse(query: &str, operation_name: Option<&str>) -> Result<Self, OperationError> {
        let query = strip_empty_arguments(query);
        let document = async_graphql_parser::parse_query(query)?;

        Operation::from_document(&document, operation_name)
    }

    pub fn from_document(document: &ExecutableDocument, operation_name: Option<&str>) -> Result<Self, OperationError> {
        let operation = match operation_name {
            Some(operation_name) => document
                .operations
                .iter()
                .find(|(name, _)| name.is_some_and(|name| name.as_str() == operation_name))
                .ok_or_else(|| OperationError::UnknownOperationName(operation_name.to_owned()))?,
            // named operations are kept in a hash map, the position gives the document order
            None => document
                .operations
                .iter()
                .min_by_key(|(_, operation)| (operation.pos.line, operation.pos.column))
                .ok_or(OperationError::NoOperation)?,
        }
        .1;

        let mut arena = SelectionArena::default();

        let fragments = document
            .fragments
            .iter()
            .map(|(name, fragment)| {
                let fragment = Fragment {
                    type_condition: fragment.node.type_condition.node.on.node.to_string(),
                    selection: arena.push_set(&fragment.node.selection_set.node.items),
                };

                (name.to_string(), fragment)
            })
            .collect();

        let operation_type = match operation.node.ty {
            ast::OperationType::Query => OperationType::Query,
            ast::OperationType::Mutation => OperationType::Mutation,
            ast::OperationType::Subscription => OperationType::Subscription,
        };

        let root_selection = arena.push_set(&operation.node.selection_set.node.items);

        Ok(Operation {
            fragments,
            operation_type,
            root_selection,
            selections: arena.into_sorted(),
        })
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub(crate) fn selection_set(&self, selection_id: SelectionId) -> impl Iterator<Item = &Selection> + '_ {
        let start = self.selections.partition_point(|(id, _)| *id < selection_id);

        self.selections[start..]
            .iter()
            .take_while(move |(id, _)| *id == selection_id)
            .map(|(_, selection)| selection)
    }
}

/// Flattens nested selection sets, handing out one id per set.
#[derive(Default)]
struct SelectionArena {
    next_id: usize,
    selections: Vec<(SelectionId, Selection)>,
}

impl SelectionArena {
    fn push_set(&mut self, items: &[Positioned<ast::Selection>]) -> SelectionId {
        let set_id = SelectionId(self.next_id);
        self.next_id += 1;

        for item in items {
            let selection = match &item.node {
                ast::Selection::Field(field) => {
                    let items = &field.node.selection_set.node.items;

                    Selection::Field {
                        field_name: field.node.name.node.to_string(),
                        // leaf fields have no set of their own
                        subselection: (!items.is_empty()).then(|| self.push_set(items)),
                    }
                }
                ast::Selection::FragmentSpread(spread) => Selection::FragmentSpread {
                    fragment_name: spread.node.fragment_name.node.to_string(),
                },
                ast::Selection::InlineFragment(fragment) => Selection::InlineFragment {
                    on: fragment.node.type_condition.as_ref().map(|on| on.node.on.node.to_string()),
                    selection: self.push_set(&fragment.node.selection_set.node.items),
                },
            };

            self.selections.push((set_id, selection));
        }

        set_id
    }

    /// Sorting is stable, so every set keeps its document order.
    fn into_sorted(mut self) -> Vec<(SelectionId, Selection)> {
        self.selections.sort_by_key(|(set_id, _)| *set_id);
        self.selections
    }
}
