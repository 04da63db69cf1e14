//! Member selection and key assignment for one composite type.
//!
//! Two modes. Name-keyed (forced, or the contract asks for property-name
//! keys): every usable public member of the hierarchy, keyed by its own name.
//! Explicit (the default): only members carrying a key annotation or, failing
//! that, a data-member annotation.
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use super::{Result, Walk};
use crate::descriptor::{DataMember, MemberDef, MemberKey, MemberKind, TypeDef};
use crate::error::ResolutionError;
use crate::schema::{KeyKind, MemberSchema};
use crate::type_ref::TypeRef;
use crate::wellknown;

#[derive(Debug, Clone)]
pub struct ResolvedMembers {
    pub key_kind: KeyKind,
    pub members: Vec<MemberSchema>, // ascending int_key
}

impl<'c, 'u> Walk<'c, 'u> {
    pub(super) fn resolve_members(&mut self, ty: &TypeRef, def: &TypeDef) -> Result<ResolvedMembers> {
        let force = self.options().force_name_keyed;
        if !force && !def.has_contract() {
            return Err(ResolutionError::MissingObjectContract { ty: ty.clone() });
        }
        let by_name = force || def.object.is_some_and(|contract| contract.key_as_property_name);
        let mut resolved = if by_name { self.name_keyed(ty, def)? } else { self.explicitly_keyed(ty, def)? };
        resolved.members.sort_by_key(|m| m.int_key);
        Ok(resolved)
    }

    fn name_keyed(&mut self, ty: &TypeRef, def: &TypeDef) -> Result<ResolvedMembers> {
        // a derived member hides the base member of the same name in place
        let mut by_name: IndexMap<String, MemberDef> = IndexMap::new();
        for level in self.types().hierarchy(def) {
            for member in level.properties().chain(level.fields()) {
                by_name.insert(member.name.clone(), member.clone());
            }
        }
        let mut members = Vec::new();
        for member in by_name.into_values() {
            if !is_candidate(ty, &member)? {
                continue;
            }
            let int_key = members.len() as i32;
            let name = member.name.clone();
            self.visit(&member.ty)?;
            members.push(member_schema(member, int_key, Some(name)));
        }
        Ok(ResolvedMembers { key_kind: KeyKind::NameKeyed, members })
    }

    fn explicitly_keyed(&mut self, ty: &TypeRef, def: &TypeDef) -> Result<ResolvedMembers> {
        let hierarchy = self.types().hierarchy(def);
        let candidates = hierarchy
            .iter()
            .flat_map(TypeDef::properties)
            .chain(hierarchy.iter().flat_map(TypeDef::fields));

        let mut key_kind: Option<KeyKind> = None;
        let mut int_keys: HashMap<i32, String> = HashMap::new();
        let mut str_keys: HashMap<String, String> = HashMap::new();
        let mut members = Vec::new();
        let mut hidden_key = 0;

        for member in candidates {
            if !is_candidate(ty, member)? {
                continue;
            }
            let Some(key) = self.declared_key(ty, member)? else {
                trace!(%ty, member = %member.name, "no key, skipped");
                continue;
            };
            let kind = match key {
                MemberKey::Int(_) => KeyKind::IntegerKeyed,
                MemberKey::Str(_) => KeyKind::NameKeyed,
            };
            if *key_kind.get_or_insert(kind) != kind {
                return Err(ResolutionError::MixedKeyKinds { ty: ty.clone(), member: member.name.clone() });
            }
            let (int_key, string_key) = match key {
                MemberKey::Int(key) => {
                    if let Some(first) = int_keys.insert(key, member.name.clone()) {
                        return Err(duplicate(ty, key.to_string(), first, member));
                    }
                    (key, None)
                }
                MemberKey::Str(key) => {
                    if let Some(first) = str_keys.insert(key.clone(), member.name.clone()) {
                        return Err(duplicate(ty, key, first, member));
                    }
                    hidden_key += 1;
                    (hidden_key - 1, Some(key))
                }
            };
            self.visit(&member.ty)?;
            members.push(member_schema(member.clone(), int_key, string_key));
        }
        let key_kind = key_kind.unwrap_or(KeyKind::IntegerKeyed);
        Ok(ResolvedMembers { key_kind, members })
    }

    /// The key a member is serialized under, `None` when it is left out. An
    /// explicit key wins over a data-member annotation.
    fn declared_key(&self, ty: &TypeRef, member: &MemberDef) -> Result<Option<MemberKey>> {
        let key = member.key.clone().or_else(|| member.data_member.as_ref().map(|dm| data_member_key(member, dm)));
        match key {
            None if self.options().require_explicit_keys => {
                Err(ResolutionError::MissingKeyDeclaration { ty: ty.clone(), member: member.name.clone() })
            }
            key => Ok(key),
        }
    }
}

/// Ordinal when `order` is set, else the annotated or declared name.
fn data_member_key(member: &MemberDef, data_member: &DataMember) -> MemberKey {
    match (data_member.order, &data_member.name) {
        (Some(order), _) => MemberKey::Int(order),
        (None, Some(name)) => MemberKey::Str(name.clone()),
        (None, None) => MemberKey::Str(member.name.clone()),
    }
}

/// Shared filter of both modes: ignored, indexers, synthesized, static and
/// inaccessible members are left out.
fn is_candidate(ty: &TypeRef, member: &MemberDef) -> Result<bool> {
    if member.is_ignored() {
        return Ok(false);
    }
    if member.is_indexer {
        return match member.kind {
            MemberKind::Property => Ok(false),
            MemberKind::Field => Err(ResolutionError::UnexpectedMemberShape {
                ty: ty.clone(),
                member: member.name.clone(),
            }),
        };
    }
    if member.kind == MemberKind::Field && member.compiler_generated {
        return Ok(false);
    }
    if member.is_static {
        return Ok(false);
    }
    Ok(member.is_readable() || member.is_writable())
}

fn duplicate(ty: &TypeRef, key: String, first: String, member: &MemberDef) -> ResolutionError {
    ResolutionError::DuplicateMemberKey { ty: ty.clone(), key, first, second: member.name.clone() }
}

fn member_schema(member: MemberDef, int_key: i32, string_key: Option<String>) -> MemberSchema {
    MemberSchema {
        is_readable: member.is_readable(),
        is_writable: member.is_writable(),
        type_name: member.ty.qualified_name(),
        is_primitive: wellknown::is_primitive(&member.ty),
        name: member.name,
        kind: member.kind,
        ty: member.ty,
        int_key,
        string_key,
        custom_formatter: member.formatter,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::collect::Collector;
    use crate::error::ResolutionError;
    use crate::options::CollectOptions;
    use crate::schema::{KeyKind, Schema};
    use crate::testing::universe;

    fn run(types: Value, options: CollectOptions) -> Result<Schema, ResolutionError> {
        let u = universe(json!({ "types": types }));
        Collector::new(&u, options).collect_all()
    }

    #[test]
    fn explicit_keys_walk_properties_then_fields() {
        let schema = run(
            json!([
                { "namespace": "Demo", "name": "Base", "members": [
                    { "name": "base_field", "kind": "field", "type": "System.Int32", "is_public": true, "key": "bf" },
                    { "name": "BaseProp", "kind": "property", "type": "System.Int32", "getter": {}, "key": "bp" }
                ]},
                { "namespace": "Demo", "name": "Item", "base": "Demo.Base", "object": {}, "members": [
                    { "name": "own_field", "kind": "field", "type": "System.Int32", "is_public": true, "key": "of" },
                    { "name": "OwnProp", "kind": "property", "type": "System.Int32", "getter": {}, "key": "op" },
                    { "name": "Unkeyed", "kind": "property", "type": "Demo.Nowhere", "getter": {} }
                ]}
            ]),
            CollectOptions::default(),
        )
        .unwrap();
        let item = schema.object("Demo.Item").unwrap();
        assert_eq!(item.key_kind, KeyKind::NameKeyed);
        let keys: Vec<_> = item.members.iter().map(|m| m.string_key.as_deref().unwrap_or_default()).collect();
        assert_eq!(keys, ["bp", "op", "bf", "of"]);
        assert_eq!(item.write_count(), 4);
    }

    #[test]
    fn mixed_key_kinds_fail() {
        let err = run(
            json!([{ "namespace": "Demo", "name": "Mixed", "object": {}, "members": [
                { "name": "A", "kind": "property", "type": "System.Int32", "getter": {}, "key": 0 },
                { "name": "B", "kind": "property", "type": "System.Int32", "getter": {}, "key": "b" }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::MixedKeyKinds { ref member, .. } if member == "B"));
    }

    #[test]
    fn duplicate_integer_key_fails() {
        let err = run(
            json!([{ "namespace": "Demo", "name": "Twice", "object": {}, "members": [
                { "name": "a", "kind": "field", "type": "System.Int32", "is_public": true, "key": 3 },
                { "name": "b", "kind": "field", "type": "System.Int32", "is_public": true, "key": 3 }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::DuplicateMemberKey { ref key, .. } if key == "3"));
    }

    #[test]
    fn require_explicit_keys_turns_skip_into_error() {
        let types = json!([{ "namespace": "Demo", "name": "Loose", "object": {}, "members": [
            { "name": "A", "kind": "property", "type": "System.Int32", "getter": {}, "key": 0 },
            { "name": "B", "kind": "property", "type": "System.Int32", "getter": {} },
            { "name": "C", "kind": "property", "type": "System.Int32", "getter": {}, "ignore": true },
            { "name": "D", "kind": "property", "type": "System.Int32", "getter": { "is_public": false } }
        ]}]);
        let schema = run(types.clone(), CollectOptions::default()).unwrap();
        assert_eq!(schema.objects[0].members.len(), 1);

        let options = CollectOptions { require_explicit_keys: true, ..CollectOptions::default() };
        let err = run(types, options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "member `B` of `Demo.Loose` has no key declaration"
        );
    }

    #[test]
    fn data_contract_keys_from_data_members() {
        let schema = run(
            json!([{ "namespace": "Demo", "name": "Dto", "data_contract": true, "members": [
                { "name": "First", "kind": "property", "type": "System.Int32", "getter": {}, "setter": {},
                  "data_member": { "name": "first" } },
                { "name": "Second", "kind": "property", "type": "System.String", "getter": {}, "setter": {},
                  "data_member": {} },
                { "name": "Skipped", "kind": "property", "type": "System.String", "getter": {}, "setter": {} }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap();
        let dto = &schema.objects[0];
        let keys: Vec<_> = dto.members.iter().map(|m| (m.int_key, m.string_key.clone().unwrap_or_default())).collect();
        assert_eq!(keys, [(0, "first".to_string()), (1, "Second".to_string())]);

        let schema = run(
            json!([{ "namespace": "Demo", "name": "Ordered", "data_contract": true, "members": [
                { "name": "B", "kind": "field", "type": "System.Int32", "is_public": true, "data_member": { "order": 1 } },
                { "name": "A", "kind": "field", "type": "System.Int32", "is_public": true, "data_member": { "order": 0 } }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap();
        let names: Vec<_> = schema.objects[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(schema.objects[0].key_kind, KeyKind::IntegerKeyed);
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn property_name_contract_hides_base_members() {
        let schema = run(
            json!([
                { "namespace": "Demo", "name": "Base", "members": [
                    { "name": "Value", "kind": "property", "type": "System.Int32", "getter": {}, "setter": {} },
                    { "name": "Stamp", "kind": "property", "type": "System.Int64", "getter": {}, "setter": {} }
                ]},
                { "namespace": "Demo", "name": "Derived", "base": "Demo.Base", "object": { "key_as_property_name": true },
                  "members": [
                    { "name": "Value", "kind": "property", "type": "System.String", "getter": {}, "setter": {} },
                    { "name": "Item", "kind": "property", "type": "System.Int32", "getter": {}, "is_indexer": true },
                    { "name": "<Value>k__BackingField", "kind": "field", "type": "System.String", "compiler_generated": true }
                ]}
            ]),
            CollectOptions::default(),
        )
        .unwrap();
        let derived = schema.object("Demo.Derived").unwrap();
        let members: Vec<_> = derived.members.iter().map(|m| (m.name.as_str(), m.ty.to_string())).collect();
        assert_eq!(members, [("Value", "System.String".to_string()), ("Stamp", "System.Int64".to_string())]);
    }

    #[test]
    fn indexer_field_is_an_invariant_violation() {
        let err = run(
            json!([{ "namespace": "Demo", "name": "Odd", "object": {}, "members": [
                { "name": "x", "kind": "field", "type": "System.Int32", "is_public": true, "is_indexer": true, "key": 0 }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "UnexpectedMemberShape");
    }

    #[test]
    fn object_contract_reads_data_member_annotations() {
        let types = json!([{ "namespace": "Demo", "name": "Hybrid", "object": {}, "members": [
            { "name": "A", "kind": "field", "type": "System.Int32", "is_public": true, "data_member": { "order": 0 } },
            { "name": "B", "kind": "field", "type": "System.Int32", "is_public": true, "key": 1 }
        ]}]);
        let options = CollectOptions { require_explicit_keys: true, ..CollectOptions::default() };
        let schema = run(types, options).unwrap();
        let keys: Vec<_> = schema.objects[0].members.iter().map(|m| (m.name.as_str(), m.int_key)).collect();
        assert_eq!(keys, [("A", 0), ("B", 1)]);
    }

    #[test]
    fn data_contract_honours_explicit_keys_first() {
        let schema = run(
            json!([{ "namespace": "Demo", "name": "Dto", "data_contract": true, "members": [
                { "name": "A", "kind": "field", "type": "System.Int32", "is_public": true, "key": 0 },
                { "name": "B", "kind": "field", "type": "System.Int32", "is_public": true,
                  "key": 1, "data_member": { "order": 7 } }
            ]}]),
            CollectOptions::default(),
        )
        .unwrap();
        let keys: Vec<_> = schema.objects[0].members.iter().map(|m| (m.name.as_str(), m.int_key)).collect();
        assert_eq!(keys, [("A", 0), ("B", 1)]);

        let err = run(
            json!([{ "namespace": "Demo", "name": "Dto", "data_contract": true, "members": [
                { "name": "A", "kind": "field", "type": "System.Int32", "is_public": true, "key": 0 },
                { "name": "Bare", "kind": "field", "type": "System.Int32", "is_public": true }
            ]}]),
            CollectOptions { require_explicit_keys: true, ..CollectOptions::default() },
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::MissingKeyDeclaration { ref member, .. } if member == "Bare"));
    }
}
