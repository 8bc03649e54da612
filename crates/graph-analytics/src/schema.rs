use std::{collections::BTreeMap, ops::Range};

use async_graphql_parser::types::{BaseType, ServiceDocument, Type, TypeKind, TypeSystemDefinition};

use crate::{classify::OperationType, lexer::strip_empty_arguments};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(usize);

/// The type table of a GraphQL schema, built once and looked up by name.
///
/// Types are sorted by name, fields by (type name, field name), and every type owns the
/// contiguous range of its fields.
#[derive(Debug)]
pub struct Schema {
    types: Vec<SchemaType>,
    fields: Vec<SchemaField>,
    query_type_name: String,
    mutation_type_name: String,
    subscription_type_name: String,
}

#[derive(Debug)]
pub struct SchemaType {
    name: String,
    fields: Range<usize>,
}

impl SchemaType {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaField {
    type_name: String,
    field_name: String,
    /// The type of the field without any wrapping type (! and []).
    base_type: String,
}

impl SchemaField {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn base_type(&self) -> &str {
        &self.base_type
    }
}

impl Default for Schema {
    /// A schema without any type, with the default root type names.
    fn default() -> Self {
        Schema {
            types: Vec::new(),
            fields: Vec::new(),
            query_type_name: "Query".to_owned(),
            mutation_type_name: "Mutation".to_owned(),
            subscription_type_name: "Subscription".to_owned(),
        }
    }
}

impl Schema {
    /// Parses SDL. Empty argument lists are tolerated.
    pub fn parse(sdl: &str) -> Result<Self, async_graphql_parser::Error> {
        let sdl = strip_empty_arguments(sdl);

        Ok(async_graphql_parser::parse_schema(sdl)?.into())
    }

    pub fn root_type_name(&self, operation_type: OperationType) -> &str {
        match operation_type {
            OperationType::Query => &self.query_type_name,
            OperationType::Mutation => &self.mutation_type_name,
            OperationType::Subscription => &self.subscription_type_name,
        }
    }

    pub fn find_type(&self, type_name: &str) -> Option<TypeId> {
        self.types
            .binary_search_by(|ty| ty.name.as_str().cmp(type_name))
            .map(TypeId)
            .ok()
    }

    pub fn find_field(&self, type_id: TypeId, field_name: &str) -> Option<FieldId> {
        let range = self[type_id].fields.clone();

        self.fields[range.clone()]
            .binary_search_by(|field| field.field_name.as_str().cmp(field_name))
            .map(|index| FieldId(range.start + index))
            .ok()
    }

    /// The named type of `type_name.field_name`, if both exist.
    pub fn field_type(&self, type_name: &str, field_name: &str) -> Option<&str> {
        let type_id = self.find_type(type_name)?;
        let field_id = self.find_field(type_id, field_name)?;

        Some(self[field_id].base_type())
    }
}

impl std::ops::Index<TypeId> for Schema {
    type Output = SchemaType;

    fn index(&self, index: TypeId) -> &Self::Output {
        &self.types[index.0]
    }
}

impl std::ops::Index<FieldId> for Schema {
    type Output = SchemaField;

    fn index(&self, index: FieldId) -> &Self::Output {
        &self.fields[index.0]
    }
}

impl From<ServiceDocument> for Schema {
    fn from(document: ServiceDocument) -> Self {
        let mut schema = Schema::default();
        // type name -> field name -> base type, extensions merged into their type
        let mut definitions: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema_definition) => {
                    let schema_definition = schema_definition.node;

                    if let Some(name) = schema_definition.query {
                        schema.query_type_name = name.node.to_string();
                    }

                    if let Some(name) = schema_definition.mutation {
                        schema.mutation_type_name = name.node.to_string();
                    }

                    if let Some(name) = schema_definition.subscription {
                        schema.subscription_type_name = name.node.to_string();
                    }
                }
                TypeSystemDefinition::Type(type_definition) => {
                    let type_definition = type_definition.node;

                    // scalars, enums and unions are known types without fields
                    let fields: Vec<(String, String)> = match &type_definition.kind {
                        TypeKind::Object(object) => object
                            .fields
                            .iter()
                            .map(|field| (field.node.name.node.to_string(), base_type(&field.node.ty.node)))
                            .collect(),
                        TypeKind::Interface(interface) => interface
                            .fields
                            .iter()
                            .map(|field| (field.node.name.node.to_string(), base_type(&field.node.ty.node)))
                            .collect(),
                        TypeKind::InputObject(input) => input
                            .fields
                            .iter()
                            .map(|field| (field.node.name.node.to_string(), base_type(&field.node.ty.node)))
                            .collect(),
                        TypeKind::Scalar | TypeKind::Enum(_) | TypeKind::Union(_) => Vec::new(),
                    };

                    definitions
                        .entry(type_definition.name.node.to_string())
                        .or_default()
                        .extend(fields);
                }
                TypeSystemDefinition::Directive(_) => (),
            }
        }

        for (type_name, fields) in definitions {
            let start = schema.fields.len();

            schema.fields.extend(fields.into_iter().map(|(field_name, base_type)| SchemaField {
                type_name: type_name.clone(),
                field_name,
                base_type,
            }));

            schema.types.push(SchemaType {
                name: type_name,
                fields: start..schema.fields.len(),
            });
        }

        schema
    }
}

fn base_type(ty: &Type) -> String {
    match &ty.base {
        BaseType::Named(name) => name.to_string(),
        BaseType::List(inner) => base_type(inner),
    }
}
