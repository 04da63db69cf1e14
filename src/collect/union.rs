//! Closed unions over interfaces and abstract classes.
use tracing::debug;

use super::{Result, Walk};
use crate::descriptor::TypeDef;
use crate::error::ResolutionError;
use crate::naming;
use crate::schema::{SchemaEntry, UnionSchema, UnionSubtype};
use crate::type_ref::TypeRef;

impl<'c, 'u> Walk<'c, 'u> {
    /// Records `def` as a closed union. Subtypes are only walked for generic
    /// definitions; otherwise they are expected to be reachable on their own.
    pub(super) fn visit_union(&mut self, ty: &TypeRef, def: &TypeDef, walk_subtypes: bool) -> Result<()> {
        if def.unions.is_empty() {
            return Err(ResolutionError::MissingUnionDeclaration { ty: ty.clone() });
        }
        let mut decls = def.unions.clone();
        decls.sort_by_key(|decl| decl.key);
        if let Some(pair) = decls.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(ResolutionError::DuplicateDiscriminant {
                ty: ty.clone(),
                key: pair[0].key,
                first: pair[0].subtype.clone(),
                second: pair[1].subtype.clone(),
            });
        }
        if walk_subtypes {
            for decl in &decls {
                self.visit(&decl.subtype)?;
            }
        }
        debug!(%ty, subtypes = decls.len(), "union");
        let subtypes = decls
            .into_iter()
            .map(|decl| UnionSubtype { key: decl.key, type_name: decl.subtype.qualified_name(), ty: decl.subtype })
            .collect();
        self.record(SchemaEntry::Union(UnionSchema {
            ty: ty.clone(),
            full_name: ty.to_string(),
            namespace: def.namespace.clone(),
            name: def.name.clone(),
            formatter_name: naming::union_formatter_name(def),
            subtypes,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::collect::Collector;
    use crate::error::ResolutionError;
    use crate::options::CollectOptions;
    use crate::testing::universe;

    #[test]
    fn subtypes_sorted_by_discriminant() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "Shape", "is_abstract": true,
              "unions": [{ "key": 7, "subtype": "Demo.Square" }, { "key": 3, "subtype": "Demo.Circle" }] }
        ]}));
        let schema = Collector::new(&u, CollectOptions::default()).collect_all().unwrap();
        let shape = schema.union("Demo.Shape").unwrap();
        let keys: Vec<_> = shape.subtypes.iter().map(|s| (s.key, s.ty.to_string())).collect();
        assert_eq!(keys, [(3, "Demo.Circle".to_string()), (7, "Demo.Square".to_string())]);
        assert_eq!(shape.subtypes[0].type_name, "global::Demo.Circle");
        assert_eq!(shape.formatter_name, "Demo.ShapeFormatter");
        assert!(schema.objects.is_empty(), "non-generic unions do not walk their subtypes");
    }

    #[test]
    fn duplicate_discriminant_names_both_subtypes() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "IShape", "kind": "interface",
              "unions": [{ "key": 1, "subtype": "Demo.A" }, { "key": 0, "subtype": "Demo.C" }, { "key": 1, "subtype": "Demo.B" }] }
        ]}));
        let err = Collector::new(&u, CollectOptions::default()).collect_all().unwrap_err();
        let ResolutionError::DuplicateDiscriminant { key, first, second, .. } = err else {
            panic!("expected duplicate discriminant, got {err:?}");
        };
        assert_eq!(key, 1);
        assert_eq!((first.to_string(), second.to_string()), ("Demo.A".to_string(), "Demo.B".to_string()));
    }
}
