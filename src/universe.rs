//! A [`TypeUniverse`] backed by JSON type-description documents.
//!
//! Document shape: `{ "types": [TypeDef, ...] }`. Several documents may be
//! merged into one universe; a definition path may only appear once.
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::descriptor::{TypeDef, TypeUniverse};
use crate::path_de;
use crate::type_ref::TypeRef;

#[derive(Debug, Clone, Deserialize)]
pub struct UniverseDocument {
    pub types: Vec<TypeDef>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("at JSON path {path}: {message}")]
    Json { path: String, message: String },
    #[error("type `{0}` is defined more than once")]
    DuplicateDefinition(String),
}

#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    types: IndexMap<String, TypeDef>,
}

impl StaticUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(src: &str) -> Result<Self, LoadError> {
        let mut universe = Self::new();
        universe.merge(path_de::from_str_with_path(src)?)?;
        Ok(universe)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, LoadError> {
        let mut universe = Self::new();
        universe.merge_value(value)?;
        Ok(universe)
    }

    pub fn merge_value(&mut self, value: serde_json::Value) -> Result<(), LoadError> {
        self.merge(path_de::from_value_with_path(value)?)
    }

    pub fn merge(&mut self, document: UniverseDocument) -> Result<(), LoadError> {
        for def in document.types {
            self.insert(def)?;
        }
        Ok(())
    }

    pub fn insert(&mut self, def: TypeDef) -> Result<(), LoadError> {
        let path = def.full_path();
        if self.types.contains_key(&path) {
            return Err(LoadError::DuplicateDefinition(path));
        }
        self.types.insert(path, def.bind_generic_params());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeUniverse for StaticUniverse {
    fn definitions(&self) -> Vec<TypeRef> {
        self.types.values().map(TypeDef::self_ref).collect()
    }

    fn describe(&self, ty: &TypeRef) -> Option<TypeDef> {
        let TypeRef::Named { path, args } = ty else { return None };
        let def = self.types.get(path)?;
        if args.is_empty() && def.generic_params.is_empty() {
            return Some(def.clone());
        }
        def.instantiate(args)
    }
}
