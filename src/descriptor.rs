//! Read-only type descriptions and the adapter the resolver consults.
//!
//! [`TypeUniverse`] is the capability a host type system implements. The
//! resolver never talks to it directly: [`Descriptors`] wraps it and answers
//! the handful of questions classification needs (accessibility, member walks,
//! assignability, root discovery).
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::type_ref::TypeRef;
use crate::wellknown;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
}

/// Integer representation behind an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumUnderlying {
    Byte,
    Sbyte,
    Short,
    Ushort,
    #[default]
    Int,
    Uint,
    Long,
    Ulong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamConstraints {
    pub not_null: bool,
    pub reference_type: bool,
    pub value_type: bool,
    pub default_constructor: bool,
    pub types: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenericParamDef {
    pub name: String,
    #[serde(default)]
    pub constraints: ParamConstraints,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectContract {
    /// Every public member is keyed by its own name.
    pub key_as_property_name: bool,
}

/// One `(discriminant, subtype)` declaration on a union root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnionDecl {
    pub key: i32,
    pub subtype: TypeRef,
}

/// Present when the type implements the serialization-callback contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallbackHooks {
    pub public_before: bool,
    pub public_after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Accessor {
    #[serde(default = "yes")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberKey {
    Int(i32),
    Str(String),
}

/// Contract-style annotation: ordinal when `order` is set, else by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataMember {
    pub order: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    // fields
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_init_only: bool,
    #[serde(default)]
    pub compiler_generated: bool,
    // properties
    #[serde(default)]
    pub getter: Option<Accessor>,
    #[serde(default)]
    pub setter: Option<Accessor>,
    #[serde(default)]
    pub is_indexer: bool,
    // annotations
    #[serde(default)]
    pub key: Option<MemberKey>,
    #[serde(default)]
    pub data_member: Option<DataMember>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub ignore_data_member: bool,
    #[serde(default)]
    pub formatter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructorDef {
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default = "yes")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Explicitly marked as the deserialization constructor.
    #[serde(default)]
    pub serialization_constructor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub declaring_type: Option<TypeRef>,
    #[serde(default = "yes")]
    pub is_public: bool,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub underlying: EnumUnderlying,
    #[serde(default)]
    pub generic_params: Vec<GenericParamDef>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDef>,
    // annotations
    #[serde(default)]
    pub object: Option<ObjectContract>,
    #[serde(default)]
    pub data_contract: bool,
    #[serde(default)]
    pub formatter: Option<String>,
    #[serde(default)]
    pub unions: Vec<UnionDecl>,
    #[serde(default)]
    pub callbacks: Option<CallbackHooks>,
}

/// The host type system, seen read-only.
pub trait TypeUniverse {
    /// Every type definition known to the universe, generic ones in definition form.
    fn definitions(&self) -> Vec<TypeRef>;

    /// Describes a named type. Closed instantiations come back with their type
    /// arguments substituted everywhere. `None` for arrays, parameters and
    /// unknown names.
    fn describe(&self, ty: &TypeRef) -> Option<TypeDef>;
}

fn yes() -> bool {
    true
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl MemberDef {
    pub fn is_readable(&self) -> bool {
        match self.kind {
            MemberKind::Field => self.is_public,
            MemberKind::Property => self.getter.is_some_and(|g| g.is_public && !g.is_static),
        }
    }

    pub fn is_writable(&self) -> bool {
        match self.kind {
            MemberKind::Field => self.is_public && !self.is_init_only,
            MemberKind::Property => self.setter.is_some_and(|s| s.is_public && !s.is_static),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore || self.ignore_data_member
    }

    fn substitute(&mut self, params: &[String], args: &[TypeRef]) {
        self.ty = self.ty.substitute(params, args);
    }
}

impl TypeDef {
    /// Path under which the definition is registered: nested types hang off
    /// their declaring type, others off their namespace.
    pub fn full_path(&self) -> String {
        match (&self.declaring_type, self.namespace.is_empty()) {
            (Some(outer), _) => format!("{}.{}", outer.path().unwrap_or_default(), self.name),
            (None, true) => self.name.clone(),
            (None, false) => format!("{}.{}", self.namespace, self.name),
        }
    }

    pub fn generic_param_names(&self) -> Vec<String> {
        self.generic_params.iter().map(|p| p.name.clone()).collect()
    }

    /// The definition's own identity: generic parameters as arguments.
    pub fn self_ref(&self) -> TypeRef {
        let args = self.generic_params.iter().map(|p| TypeRef::param(&p.name)).collect();
        TypeRef::generic(self.full_path(), args)
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum)
    }

    /// Interfaces and abstract classes are resolved as closed unions.
    pub fn is_union_root(&self) -> bool {
        self.kind == TypeKind::Interface || (self.kind == TypeKind::Class && self.is_abstract)
    }

    pub fn has_contract(&self) -> bool {
        self.object.is_some() || self.data_contract
    }

    pub fn properties(&self) -> impl Iterator<Item = &MemberDef> {
        self.members.iter().filter(|m| m.kind == MemberKind::Property)
    }

    pub fn fields(&self) -> impl Iterator<Item = &MemberDef> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    /// Rebinds bare parameter names in every type position. Applied once when a
    /// definition enters a universe.
    pub fn bind_generic_params(mut self) -> Self {
        let names = self.generic_param_names();
        if names.is_empty() {
            return self;
        }
        let bind = |ty: TypeRef| ty.bind_params(&names);
        self.base = self.base.take().map(bind);
        self.interfaces = std::mem::take(&mut self.interfaces).into_iter().map(bind).collect();
        for member in &mut self.members {
            member.ty = bind(member.ty.clone());
        }
        for ctor in &mut self.constructors {
            for param in &mut ctor.params {
                param.ty = bind(param.ty.clone());
            }
        }
        for decl in &mut self.unions {
            decl.subtype = bind(decl.subtype.clone());
        }
        for param in &mut self.generic_params {
            let types = std::mem::take(&mut param.constraints.types);
            param.constraints.types = types.into_iter().map(bind).collect();
        }
        self
    }

    /// Substitutes `args` for the generic parameters. `None` on arity mismatch.
    pub fn instantiate(&self, args: &[TypeRef]) -> Option<TypeDef> {
        if args.len() != self.generic_params.len() {
            return None;
        }
        let names = self.generic_param_names();
        let mut def = self.clone();
        def.base = def.base.map(|b| b.substitute(&names, args));
        def.interfaces = def.interfaces.iter().map(|i| i.substitute(&names, args)).collect();
        for member in &mut def.members {
            member.substitute(&names, args);
        }
        for ctor in &mut def.constructors {
            for param in &mut ctor.params {
                param.ty = param.ty.substitute(&names, args);
            }
        }
        for decl in &mut def.unions {
            decl.subtype = decl.subtype.substitute(&names, args);
        }
        Some(def)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ADAPTER
// ————————————————————————————————————————————————————————————————————————————

/// Resolver-facing view over a [`TypeUniverse`].
#[derive(Clone, Copy)]
pub struct Descriptors<'u> {
    universe: &'u dyn TypeUniverse,
}

impl<'u> Descriptors<'u> {
    pub fn new(universe: &'u dyn TypeUniverse) -> Self {
        Self { universe }
    }

    pub fn describe(&self, ty: &TypeRef) -> Option<TypeDef> {
        self.universe.describe(ty)
    }

    /// The type and every declaring type around it must be public.
    pub fn is_accessible(&self, def: &TypeDef) -> bool {
        let mut seen = HashSet::new();
        let mut current = def.clone();
        loop {
            if !current.is_public {
                return false;
            }
            let Some(outer) = current.declaring_type.clone() else {
                return true;
            };
            if !seen.insert(outer.clone()) {
                return true;
            }
            match self.describe(&outer) {
                Some(next) => current = next,
                None => return true,
            }
        }
    }

    /// `def` and its describable base types, base first.
    pub fn hierarchy(&self, def: &TypeDef) -> Vec<TypeDef> {
        let mut chain = vec![def.clone()];
        let mut seen = HashSet::from([def.full_path()]);
        let mut base = def.base.clone();
        while let Some(next) = base.as_ref().and_then(|b| self.describe(b)) {
            if !seen.insert(next.full_path()) {
                break;
            }
            base = next.base.clone();
            chain.push(next);
        }
        chain.reverse();
        chain
    }

    /// Whether a value of `source` can be stored in a slot of type `target`.
    /// Built-in containers and arrays, which the universe does not describe,
    /// go through the known interface table.
    pub fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        if target == source || target.is_object() {
            return true;
        }
        let mut seen = HashSet::new();
        let mut pending = vec![source.clone()];
        while let Some(ty) = pending.pop() {
            if !seen.insert(ty.clone()) {
                continue;
            }
            let parents: Vec<TypeRef> = match self.describe(&ty) {
                Some(def) => def.base.into_iter().chain(def.interfaces).collect(),
                None => wellknown::known_interfaces(&ty),
            };
            for parent in parents {
                if parent == *target {
                    return true;
                }
                pending.push(parent);
            }
        }
        false
    }

    /// Publicly visible union roots and contract-annotated types, sorted by name.
    pub fn root_types(&self) -> Vec<TypeRef> {
        let mut roots: Vec<TypeRef> = self
            .universe
            .definitions()
            .into_iter()
            .filter(|ty| {
                self.describe(ty).is_some_and(|def| {
                    self.is_accessible(&def)
                        && ((def.is_union_root() && !def.unions.is_empty()) || def.has_contract())
                })
            })
            .collect();
        roots.sort_by_cached_key(TypeRef::to_string);
        roots
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::universe;

    fn ty(src: &str) -> TypeRef {
        src.parse().unwrap()
    }

    #[test]
    fn readability_follows_accessors() {
        let u = universe(json!({ "types": [{
            "namespace": "Demo", "name": "Bag", "object": {},
            "members": [
                { "name": "a", "kind": "field", "type": "System.Int32", "is_public": true, "is_init_only": true },
                { "name": "B", "kind": "property", "type": "System.Int32", "getter": {}, "setter": { "is_public": false } },
                { "name": "C", "kind": "property", "type": "System.Int32", "getter": { "is_static": true } }
            ]
        }]}));
        let def = Descriptors::new(&u).describe(&ty("Demo.Bag")).unwrap();
        let m = &def.members;
        assert!(m[0].is_readable() && !m[0].is_writable());
        assert!(m[1].is_readable() && !m[1].is_writable());
        assert!(!m[2].is_readable() && !m[2].is_writable());
    }

    #[test]
    fn nested_type_inherits_outer_visibility() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "Outer", "is_public": false },
            { "namespace": "Demo", "name": "Inner", "declaring_type": "Demo.Outer", "object": {} }
        ]}));
        let types = Descriptors::new(&u);
        let inner = types.describe(&ty("Demo.Outer.Inner")).unwrap();
        assert!(!types.is_accessible(&inner));
        assert!(types.root_types().is_empty());
    }

    #[test]
    fn hierarchy_is_base_first() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "C", "base": "Demo.B" },
            { "namespace": "Demo", "name": "B", "base": "Demo.A" },
            { "namespace": "Demo", "name": "A" }
        ]}));
        let types = Descriptors::new(&u);
        let c = types.describe(&ty("Demo.C")).unwrap();
        let names: Vec<_> = types.hierarchy(&c).into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn assignability_walks_bases_and_interfaces() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "IShape", "kind": "interface" },
            { "namespace": "Demo", "name": "Base", "interfaces": ["Demo.IShape"] },
            { "namespace": "Demo", "name": "Circle", "base": "Demo.Base" }
        ]}));
        let types = Descriptors::new(&u);
        assert!(types.is_assignable(&ty("Demo.IShape"), &ty("Demo.Circle")));
        assert!(types.is_assignable(&ty("Demo.Base"), &ty("Demo.Circle")));
        assert!(types.is_assignable(&ty("System.Object"), &ty("System.Int32")));
        assert!(!types.is_assignable(&ty("Demo.Circle"), &ty("Demo.Base")));
        assert!(!types.is_assignable(&ty("System.Int64"), &ty("System.Int32")));
        assert!(types.is_assignable(
            &ty("System.Collections.Generic.IEnumerable<Demo.IShape>"),
            &ty("System.Collections.Generic.List<Demo.IShape>")
        ));
        assert!(!types.is_assignable(
            &ty("System.Collections.Generic.IEnumerable<Demo.Circle>"),
            &ty("System.Collections.Generic.List<Demo.IShape>")
        ));
    }

    #[test]
    fn roots_are_contracts_and_declared_unions() {
        let u = universe(json!({ "types": [
            { "namespace": "Demo", "name": "Plain" },
            { "namespace": "Demo", "name": "Msg", "object": {} },
            { "namespace": "Demo", "name": "Dc", "data_contract": true },
            { "namespace": "Demo", "name": "IEmpty", "kind": "interface" },
            { "namespace": "Demo", "name": "IShape", "kind": "interface",
              "unions": [{ "key": 0, "subtype": "Demo.Msg" }] }
        ]}));
        let roots: Vec<_> = Descriptors::new(&u).root_types().iter().map(ToString::to_string).collect();
        assert_eq!(roots, ["Demo.Dc", "Demo.IShape", "Demo.Msg"]);
    }
}
