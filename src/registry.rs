//! Accumulates entries during a walk and finalizes them into a [`Schema`].
use indexmap::IndexMap;
use tracing::trace;

use crate::schema::{EnumSchema, GenericSchema, ObjectSchema, Schema, SchemaEntry, UnionSchema};
use crate::type_ref::TypeRef;

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    objects: Vec<ObjectSchema>,
    enums: Vec<EnumSchema>,
    generics: IndexMap<TypeRef, GenericSchema>, // first registration wins
    unions: Vec<UnionSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: SchemaEntry) {
        trace!(name = entry.full_name(), "recorded");
        match entry {
            SchemaEntry::Object(x) => self.objects.push(x),
            SchemaEntry::Enum(x) => self.enums.push(x),
            SchemaEntry::Generic(x) => {
                self.generics.entry(x.ty.clone()).or_insert(x);
            }
            SchemaEntry::Union(x) => self.unions.push(x),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.enums.len() + self.generics.len() + self.unions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts every collection by canonical full name.
    pub fn finish(self) -> Schema {
        let mut schema = Schema {
            objects: self.objects,
            enums: self.enums,
            generics: self.generics.into_values().collect(),
            unions: self.unions,
        };
        schema.objects.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        schema.enums.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        schema.generics.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        schema.unions.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        schema
    }
}
