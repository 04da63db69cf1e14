//! Type-graph closure walk.
//!
//! Starting from a root set, every reachable type is classified exactly once
//! into a schema entry or a terminal skip. Classification order:
//!
//! 1. embedded types
//! 2. the ignore list (exact canonical full name)
//! 3. unbound generic parameters
//! 4. arrays (ranks 1 to 4)
//! 5. built-in generic shapes (byte segments, nullable, known containers)
//! 6. undescribable named types are an error
//! 7. inaccessible types
//! 8. types carrying their own formatter
//! 9. enums
//! 10. user generics, definition or instantiation
//! 11. interfaces and abstract classes as unions
//! 12. everything else as a keyed object
//!
//! A type is marked visited before anything it references is walked, so
//! cycles terminate.
pub mod constructor;
pub mod generic;
pub mod members;
pub mod union;

use indexmap::IndexSet;
use tracing::{debug, info, trace};

use crate::descriptor::{Descriptors, TypeDef, TypeKind, TypeUniverse};
use crate::error::ResolutionError;
use crate::naming;
use crate::options::CollectOptions;
use crate::registry::SchemaRegistry;
use crate::schema::{EnumSchema, ObjectSchema, Schema, SchemaEntry};
use crate::type_ref::TypeRef;
use crate::wellknown;

pub type Result<T> = std::result::Result<T, ResolutionError>;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Resolves schemas out of one type universe under fixed options.
pub struct Collector<'u> {
    types: Descriptors<'u>,
    options: CollectOptions,
}

/// State of a single run. Nothing outlives [`Collector::collect`].
struct Walk<'c, 'u> {
    collector: &'c Collector<'u>,
    visited: IndexSet<TypeRef>,
    registry: SchemaRegistry,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'u> Collector<'u> {
    pub fn new(universe: &'u dyn TypeUniverse, options: CollectOptions) -> Self {
        Self { types: Descriptors::new(universe), options }
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    pub fn root_types(&self) -> Vec<TypeRef> {
        self.types.root_types()
    }

    pub fn collect<I>(&self, roots: I) -> Result<Schema>
    where
        I: IntoIterator<Item = TypeRef>,
    {
        let mut walk = Walk { collector: self, visited: IndexSet::new(), registry: SchemaRegistry::new() };
        for root in roots {
            walk.visit(&root)?;
        }
        let visited = walk.visited.len();
        let schema = walk.registry.finish();
        info!(
            visited,
            objects = schema.objects.len(),
            enums = schema.enums.len(),
            generics = schema.generics.len(),
            unions = schema.unions.len(),
            "schema resolved"
        );
        Ok(schema)
    }

    /// [`Self::collect`] over the universe's own root types.
    pub fn collect_all(&self) -> Result<Schema> {
        self.collect(self.root_types())
    }
}

impl<'c, 'u> Walk<'c, 'u> {
    fn types(&self) -> Descriptors<'u> {
        self.collector.types
    }

    fn options(&self) -> &'c CollectOptions {
        &self.collector.options
    }

    fn record(&mut self, entry: SchemaEntry) {
        self.registry.record(entry);
    }

    fn visit(&mut self, ty: &TypeRef) -> Result<()> {
        if !self.visited.insert(ty.clone()) {
            return Ok(());
        }
        if wellknown::is_embedded(ty) {
            trace!(%ty, "embedded");
            return Ok(());
        }
        if self.options().is_ignored(&ty.to_string()) {
            trace!(%ty, "ignored");
            return Ok(());
        }
        match ty {
            TypeRef::Param(_) => {
                trace!(%ty, "generic parameter");
                Ok(())
            }
            TypeRef::Array { element, rank } => self.visit_array(ty, element, *rank),
            TypeRef::Named { .. } => {
                if ty.is_generic() && self.visit_builtin_generic(ty)? {
                    return Ok(());
                }
                let def = self
                    .types()
                    .describe(ty)
                    .ok_or_else(|| ResolutionError::UnknownType { ty: ty.clone() })?;
                self.classify(ty, def)
            }
        }
    }

    fn classify(&mut self, ty: &TypeRef, def: TypeDef) -> Result<()> {
        if !self.types().is_accessible(&def) {
            trace!(%ty, "not publicly visible");
            return Ok(());
        }
        if def.formatter.is_some() {
            trace!(%ty, "custom formatter");
            return Ok(());
        }
        if def.kind == TypeKind::Enum {
            debug!(%ty, "enum");
            self.record(SchemaEntry::Enum(EnumSchema {
                ty: ty.clone(),
                full_name: ty.to_string(),
                namespace: def.namespace.clone(),
                name: def.name.clone(),
                formatter_name: naming::enum_formatter_name(&def),
                underlying: def.underlying,
            }));
            return Ok(());
        }
        if ty.is_generic() {
            return self.visit_user_generic(ty, def);
        }
        if def.is_union_root() {
            return self.visit_union(ty, &def, false);
        }
        debug!(%ty, "object");
        let object = self.resolve_object(ty, &def)?;
        self.record(SchemaEntry::Object(object));
        Ok(())
    }

    /// Members, constructor binding and callback flags for one composite type.
    fn resolve_object(&mut self, ty: &TypeRef, def: &TypeDef) -> Result<ObjectSchema> {
        let resolved = self.resolve_members(ty, def)?;
        let constructor = constructor::resolve(self.types(), ty, def, &resolved)?;
        let open = ty.is_generic();
        let generic_parameters = if open {
            def.generic_params.iter().map(naming::generic_parameter).collect()
        } else {
            Vec::new()
        };
        Ok(ObjectSchema {
            ty: ty.clone(),
            full_name: ty.to_string(),
            namespace: def.namespace.clone(),
            name: def.name.clone(),
            formatter_name: naming::object_formatter_name(def, open),
            is_class: !def.is_value_type(),
            is_open_generic: open,
            generic_parameters,
            key_kind: resolved.key_kind,
            members: resolved.members,
            constructor,
            has_serialization_callbacks: def.callbacks.is_some(),
            needs_cast_on_before: def.callbacks.is_none_or(|hooks| !hooks.public_before),
            needs_cast_on_after: def.callbacks.is_none_or(|hooks| !hooks.public_after),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
