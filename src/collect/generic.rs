//! Arrays, built-in generic shapes and user generics.
use tracing::{debug, trace};

use super::{Result, Walk};
use crate::descriptor::TypeDef;
use crate::error::ResolutionError;
use crate::naming;
use crate::schema::{GenericSchema, SchemaEntry};
use crate::type_ref::TypeRef;
use crate::wellknown::{self, ENUMERABLE_PATH, GROUPING_PATH, LOOKUP_PATH, NULLABLE_FORMATTER};

impl<'c, 'u> Walk<'c, 'u> {
    fn record_generic(&mut self, ty: TypeRef, formatter_name: String) {
        let entry = GenericSchema { full_name: ty.to_string(), is_open: ty.is_open(), formatter_name, ty };
        self.record(SchemaEntry::Generic(entry));
    }

    pub(super) fn visit_array(&mut self, ty: &TypeRef, element: &TypeRef, rank: u8) -> Result<()> {
        let Some(stem) = wellknown::array_formatter(rank) else {
            return Err(ResolutionError::UnsupportedArrayRank { ty: ty.clone(), rank });
        };
        self.visit(element)?;
        debug!(%ty, rank, "array");
        let formatter = naming::builtin_formatter(&self.options().formatter_namespace, stem, std::slice::from_ref(element));
        self.record_generic(ty.clone(), formatter);
        Ok(())
    }

    /// Handles the shapes served by built-in formatters. `false` when `ty` is
    /// not one of them and must be described by the universe.
    pub(super) fn visit_builtin_generic(&mut self, ty: &TypeRef) -> Result<bool> {
        if wellknown::is_byte_segment(ty) {
            trace!(%ty, "byte segment");
            return Ok(true);
        }
        let namespace = &self.options().formatter_namespace;
        if let Some(inner) = ty.nullable_inner() {
            self.visit(inner)?;
            if wellknown::is_embedded(inner) {
                trace!(%ty, "nullable of embedded");
                return Ok(true);
            }
            debug!(%ty, "nullable");
            let formatter = naming::builtin_formatter(namespace, NULLABLE_FORMATTER, std::slice::from_ref(inner));
            self.record_generic(ty.clone(), formatter);
            return Ok(true);
        }
        let Some(stem) = wellknown::known_formatter(ty) else {
            return Ok(false);
        };
        let args = ty.args();
        for arg in args {
            self.visit(arg)?;
        }
        debug!(%ty, formatter = stem, "known generic");
        self.record_generic(ty.clone(), naming::builtin_formatter(namespace, stem, args));

        if ty.path() == Some(LOOKUP_PATH) {
            // the lookup decoder reads groupings, each a sequence of values
            let grouping = TypeRef::generic(GROUPING_PATH, args.to_vec());
            if let Some(stem) = wellknown::known_formatter(&grouping) {
                let formatter = naming::builtin_formatter(namespace, stem, args);
                self.record_generic(grouping, formatter);
            }
            let values = TypeRef::generic(ENUMERABLE_PATH, args[1..].to_vec());
            if let Some(stem) = wellknown::known_formatter(&values) {
                let formatter = naming::builtin_formatter(namespace, stem, values.args());
                self.record_generic(values, formatter);
            }
        }
        Ok(true)
    }

    /// A generic type outside the built-in table.
    ///
    /// The definition form gets an object (or union) entry of its own. Any
    /// other instantiation only records the formatter name containers refer
    /// to, after walking everything it substitutes into.
    pub(super) fn visit_user_generic(&mut self, ty: &TypeRef, def: TypeDef) -> Result<()> {
        if *ty == def.self_ref() {
            if def.is_union_root() {
                return self.visit_union(ty, &def, true);
            }
            for decl in &def.unions {
                self.visit(&decl.subtype)?;
            }
            debug!(%ty, "generic definition");
            let object = self.resolve_object(ty, &def)?;
            self.record(SchemaEntry::Object(object));
            return Ok(());
        }
        if !def.is_union_root() {
            // walks the substituted member types; the object itself is not emitted
            self.resolve_object(ty, &def)?;
        }
        for arg in ty.args() {
            self.visit(arg)?;
        }
        debug!(%ty, "generic instantiation");
        self.record_generic(ty.clone(), naming::instantiated_formatter(&def, ty.args()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::collect::Collector;
    use crate::options::CollectOptions;
    use crate::testing::universe;
    use crate::type_ref::TypeRef;

    fn holder(member_type: &str) -> serde_json::Value {
        json!({ "namespace": "Demo", "name": "Holder", "object": {}, "members": [
            { "name": "Value", "kind": "field", "type": member_type, "is_public": true, "key": 0 }
        ]})
    }

    fn leaf() -> serde_json::Value {
        json!({ "namespace": "Demo", "name": "Leaf", "object": {} })
    }

    #[test]
    fn lookup_adds_grouping_and_value_sequence() {
        let u = universe(json!({ "types": [holder("System.Linq.ILookup<System.String, Demo.Leaf>"), leaf()] }));
        let schema = Collector::new(&u, CollectOptions::default()).collect_all().unwrap();
        assert_eq!(
            schema.names()[2],
            [
                "System.Collections.Generic.IEnumerable<Demo.Leaf>",
                "System.Linq.IGrouping<System.String, Demo.Leaf>",
                "System.Linq.ILookup<System.String, Demo.Leaf>",
            ]
        );
        let grouping = schema.generic("System.Linq.IGrouping<System.String, Demo.Leaf>").unwrap();
        assert_eq!(
            grouping.formatter_name,
            "global::MessagePack.Formatters.InterfaceGroupingFormatter<global::System.String,global::Demo.Leaf>"
        );
    }

    #[test]
    fn nullable_of_embedded_is_skipped() {
        let u = universe(json!({ "types": [holder("System.Int32?")] }));
        let schema = Collector::new(&u, CollectOptions::default()).collect_all().unwrap();
        assert!(schema.generics.is_empty());

        let u = universe(json!({ "types": [holder("System.ArraySegment<System.Byte>")] }));
        let schema = Collector::new(&u, CollectOptions::default()).collect_all().unwrap();
        assert!(schema.generics.is_empty());
    }

    #[test]
    fn arrays_use_rank_specific_formatters() {
        let u = universe(json!({ "types": [holder("Demo.Leaf[,,]"), leaf()] }));
        let options = CollectOptions { formatter_namespace: "Custom.Formatters".into(), ..CollectOptions::default() };
        let schema = Collector::new(&u, options).collect_all().unwrap();
        let array = schema.generic("Demo.Leaf[,,]").unwrap();
        assert_eq!(array.formatter_name, "global::Custom.Formatters.ThreeDimensionalArrayFormatter<global::Demo.Leaf>");
        assert!(schema.object("Demo.Leaf").is_some());
    }

    #[test]
    fn closed_user_generic_records_name_only() {
        let u = universe(json!({ "types": [
            holder("Demo.Box<Demo.Leaf>"),
            leaf(),
            { "namespace": "Demo", "name": "Payload", "object": {} },
            { "namespace": "Demo", "name": "Box", "object": {},
              "generic_params": [{ "name": "T", "constraints": { "reference_type": true, "default_constructor": true } }],
              "members": [
                  { "name": "Item", "kind": "field", "type": "T", "is_public": true, "key": 0 },
                  { "name": "Extra", "kind": "field", "type": "Demo.Payload[]", "is_public": true, "key": 1 }
              ] }
        ]}));
        let collector = Collector::new(&u, CollectOptions::default());
        let schema = collector.collect(["Demo.Holder".parse().unwrap()]).unwrap();

        let boxed = schema.generic("Demo.Box<Demo.Leaf>").unwrap();
        assert_eq!(boxed.formatter_name, "global::Demo.BoxFormatter<Demo.Leaf>");
        assert!(!boxed.is_open);
        assert!(schema.object("Demo.Box<Demo.Leaf>").is_none());
        assert!(schema.object("Demo.Leaf").is_some(), "type arguments are walked");
        assert!(schema.generic("Demo.Payload[]").is_some(), "substituted members are walked");

        let schema = collector.collect_all().unwrap();
        let open = schema.object("Demo.Box<T>").unwrap();
        assert!(open.is_open_generic);
        assert_eq!(open.formatter_name, "Demo.BoxFormatter<T>");
        assert_eq!(open.generic_parameters[0].constraints, "class, new()");
    }

    #[test]
    fn generic_union_definition_walks_subtypes() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "IMessage", "kind": "interface",
              "generic_params": [{ "name": "T" }],
              "unions": [{ "key": 0, "subtype": "Demo.Ping" }] },
            { "namespace": "Demo", "name": "Ping", "object": {}, "interfaces": ["Demo.IMessage<System.Int32>"] }
        ]}));
        let collector = Collector::new(&u, CollectOptions::default());
        let root = TypeRef::generic("Demo.IMessage", vec![TypeRef::param("T")]);
        let schema = collector.collect([root]).unwrap();
        assert_eq!(schema.names()[3], ["Demo.IMessage<T>"]);
        assert_eq!(schema.names()[0], ["Demo.Ping"]);
    }
}
