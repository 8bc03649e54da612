use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;

use crate::{
    error::ResolutionGap,
    operation::{Operation, Selection, SelectionId},
    schema::Schema,
    Error, ResolutionPolicy,
};

const TYPENAME: &str = "__typename";

/// The fields an operation selects, grouped by the type they are selected on.
///
/// Fields selected directly on the root operation type are kept apart in `root_fields`.
/// Within a type, fields are deduplicated and keep the order they were first seen in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldUsage {
    types: BTreeMap<String, IndexSet<String>>,
    root_fields: IndexSet<String>,
}

impl FieldUsage {
    /// Walks the operation from the root type matching its kind, expanding fragments.
    pub fn collect(operation: &Operation, schema: &Schema, policy: ResolutionPolicy) -> Result<Self, Error> {
        let root_type_name = schema.root_type_name(operation.operation_type());

        let mut walker = Walker {
            operation,
            schema,
            policy,
            root_type_name,
            expanded_fragments: HashSet::new(),
            usage: FieldUsage::default(),
        };

        walker.walk(operation.root_selection, Some(root_type_name), true)?;

        Ok(walker.usage)
    }

    pub fn types(&self) -> &BTreeMap<String, IndexSet<String>> {
        &self.types
    }

    pub fn root_fields(&self) -> &IndexSet<String> {
        &self.root_fields
    }

    /// (type name -> fields, root fields)
    pub fn into_parts(self) -> (BTreeMap<String, Vec<String>>, Vec<String>) {
        let types = self
            .types
            .into_iter()
            .map(|(type_name, fields)| (type_name, fields.into_iter().collect()))
            .collect();

        (types, self.root_fields.into_iter().collect())
    }
}

struct Walker<'a> {
    operation: &'a Operation,
    schema: &'a Schema,
    policy: ResolutionPolicy,
    root_type_name: &'a str,
    /// (fragment name, spread on the root type)
    expanded_fragments: HashSet<(&'a str, bool)>,
    usage: FieldUsage,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, selection_id: SelectionId, parent: Option<&'a str>, at_root: bool) -> Result<(), Error> {
        let operation = self.operation;

        for selection in operation.selection_set(selection_id) {
            match selection {
                Selection::Field {
                    field_name,
                    subselection,
                } => self.field(field_name, *subselection, parent, at_root)?,
                Selection::FragmentSpread { fragment_name } => {
                    let Some(fragment) = operation.fragments.get(fragment_name) else {
                        self.policy
                            .on_gap(ResolutionGap::UnknownFragment(fragment_name.clone()))?;
                        continue;
                    };

                    let parent = Some(fragment.type_condition.as_str());
                    let at_root = at_root && parent == Some(self.root_type_name);

                    // spreads of a fragment already being expanded (cycles included) add nothing
                    if self.expanded_fragments.insert((fragment_name.as_str(), at_root)) {
                        self.walk(fragment.selection, parent, at_root)?;
                    }
                }
                Selection::InlineFragment { on, selection } => {
                    let parent = on.as_deref().or(parent);
                    let at_root = at_root && parent == Some(self.root_type_name);

                    self.walk(*selection, parent, at_root)?;
                }
            }
        }

        Ok(())
    }

    fn field(
        &mut self,
        field_name: &'a str,
        subselection: Option<SelectionId>,
        parent: Option<&'a str>,
        at_root: bool,
    ) -> Result<(), Error> {
        let Some(parent) = parent else {
            self.policy.on_gap(ResolutionGap::UnknownParent {
                field_name: field_name.to_owned(),
            })?;

            // a type condition further down can still anchor the selections
            if let Some(subselection) = subselection {
                self.walk(subselection, None, false)?;
            }

            return Ok(());
        };

        if at_root {
            self.usage.root_fields.insert(field_name.to_owned());
        } else {
            self.usage
                .types
                .entry(parent.to_owned())
                .or_default()
                .insert(field_name.to_owned());
        }

        let field_type = self.field_type(parent, field_name);

        if field_type.is_none() {
            self.policy.on_gap(ResolutionGap::UnknownField {
                type_name: parent.to_owned(),
                field_name: field_name.to_owned(),
            })?;
        }

        if let Some(subselection) = subselection {
            self.walk(subselection, field_type, false)?;
        }

        Ok(())
    }

    fn field_type(&self, type_name: &str, field_name: &str) -> Option<&'a str> {
        if field_name == TYPENAME {
            return Some("String");
        }

        self.schema.field_type(type_name, field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        type Query {
          characters(filter: FilterCharacter, page: Int): Characters
          listCharacters(): [Characters]!
          hero: Character
          node(id: ID!): Node
        }
        type Mutation { rename(name: String!): Human }
        input FilterCharacter { name: String }
        type Characters { info: Info results: [Character] }
        type Info { count: Int next: Int pages: Int prev: Int }
        interface Node { id: ID! }
        interface Character { id: ID name: String friends: [Character] }
        type Human implements Character & Node { id: ID! name: String friends: [Character] homePlanet: String }
        type Droid implements Character & Node { id: ID! name: String friends: [Character] primaryFunction: String }
    "#;

    fn collect(query: &str, policy: ResolutionPolicy) -> Result<FieldUsage, Error> {
        let schema = Schema::parse(SCHEMA).unwrap();
        let operation = Operation::parse(query, None).unwrap();

        FieldUsage::collect(&operation, &schema, policy)
    }

    fn lenient(query: &str) -> (BTreeMap<String, Vec<String>>, Vec<String>) {
        collect(query, ResolutionPolicy::Lenient).unwrap().into_parts()
    }

    #[test]
    fn nested_fields() {
        let (types, root_fields) = lenient("query{\n  characters(filter: {\n    \n  }){\n    info{\n      count\n    }\n  }\n}");

        insta::assert_debug_snapshot!(types, @r###"
        {
            "Characters": [
                "info",
            ],
            "Info": [
                "count",
            ],
        }
        "###);
        assert_eq!(root_fields, ["characters"]);
    }

    #[test]
    fn list_fields_resolve_to_their_item_type() {
        let (types, root_fields) = lenient("{ listCharacters() { results { name id } info { pages } } }");

        insta::assert_debug_snapshot!(types, @r###"
        {
            "Character": [
                "name",
                "id",
            ],
            "Characters": [
                "results",
                "info",
            ],
            "Info": [
                "pages",
            ],
        }
        "###);
        assert_eq!(root_fields, ["listCharacters"]);
    }

    #[test]
    fn duplicates_keep_the_first_position() {
        let (types, _) = lenient("{ hero { name id name friends { name } id } }");

        assert_eq!(types["Character"], ["name", "id", "friends"]);
    }

    #[test]
    fn fragments_and_type_conditions() {
        let (types, root_fields) = lenient(
            r#"
            query {
              hero {
                ...CharacterFields
                ... on Droid { primaryFunction }
                ... { id }
              }
              ...RootFields
            }

            fragment CharacterFields on Character {
              name
              ... on Human { homePlanet }
            }

            fragment RootFields on Query {
              node(id: "1") { id __typename }
            }
            "#,
        );

        insta::assert_debug_snapshot!(types, @r###"
        {
            "Character": [
                "name",
                "id",
            ],
            "Droid": [
                "primaryFunction",
            ],
            "Human": [
                "homePlanet",
            ],
            "Node": [
                "id",
                "__typename",
            ],
        }
        "###);
        assert_eq!(root_fields, ["hero", "node"]);
    }

    #[test]
    fn recursive_fragments_terminate() {
        let (types, _) = lenient(
            r#"
            { hero { ...Friends } }
            fragment Friends on Character { name friends { ...Friends } }
            "#,
        );

        assert_eq!(types["Character"], ["name", "friends"]);
    }

    #[test]
    fn mutation_root() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let operation = Operation::parse(r#"mutation { rename(name: "Luke") { name } }"#, None).unwrap();

        let (types, root_fields) = FieldUsage::collect(&operation, &schema, ResolutionPolicy::Lenient)
            .unwrap()
            .into_parts();

        assert_eq!(root_fields, ["rename"]);
        assert_eq!(types["Human"], ["name"]);
    }

    #[test]
    fn lenient_unknown_fields() {
        let (types, root_fields) = lenient("{ hero { name starships { length } } ghost { boo } }");

        assert_eq!(types.keys().collect::<Vec<_>>(), ["Character"]);
        assert_eq!(types["Character"], ["name", "starships"]);
        assert_eq!(root_fields, ["hero", "ghost"]);
    }

    #[test]
    fn type_conditions_anchor_unknown_parents() {
        let (types, _) = lenient("{ mystery { ... on Droid { primaryFunction } } }");

        assert_eq!(types["Droid"], ["primaryFunction"]);
    }

    #[test]
    fn lenient_unknown_fragment() {
        let (types, root_fields) = lenient("{ hero { ...Missing name } }");

        assert_eq!(types["Character"], ["name"]);
        assert_eq!(root_fields, ["hero"]);
    }

    #[test]
    fn strict_unknown_field() {
        let error = collect("{ hero { name starships { length } } }", ResolutionPolicy::Strict).unwrap_err();

        insta::assert_debug_snapshot!(error, @r###"
        SchemaResolution(
            UnknownField {
                type_name: "Character",
                field_name: "starships",
            },
        )
        "###);
    }

    #[test]
    fn strict_resolved_operation() {
        let usage = collect("{ hero { __typename name } }", ResolutionPolicy::Strict).unwrap();

        assert_eq!(usage.root_fields().len(), 1);
        assert_eq!(usage.types()["Character"].len(), 2);
    }

    #[test]
    fn empty_schema_keeps_root_fields() {
        let operation = Operation::parse("{ hero { name } }", None).unwrap();

        let (types, root_fields) = FieldUsage::collect(&operation, &Schema::default(), ResolutionPolicy::Lenient)
            .unwrap()
            .into_parts();

        assert!(types.is_empty());
        assert_eq!(root_fields, ["hero"]);
    }
}
