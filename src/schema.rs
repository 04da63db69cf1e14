//! Resolved serialization plan handed to the emitter. No type-universe data here.
use serde::Serialize;

use crate::descriptor::{EnumUnderlying, MemberKind};
use crate::type_ref::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    IntegerKeyed,
    NameKeyed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSchema {
    pub name: String,
    pub kind: MemberKind,
    pub is_readable: bool,
    pub is_writable: bool,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub type_name: String,   // emitter spelling of `ty`
    pub int_key: i32,        // wire position, also under name keys
    pub string_key: Option<String>,
    pub custom_formatter: Option<String>,
    pub is_primitive: bool,
}

/// Binds one constructor parameter to the member supplying its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorParameter {
    pub parameter: String,
    pub parameter_type: TypeRef,
    pub member: String,
    pub member_key: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericParameterSchema {
    pub name: String,
    pub constraints: String, // rendered clause, empty when unconstrained
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSchema {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    pub formatter_name: String,
    pub is_class: bool,
    pub is_open_generic: bool,
    pub generic_parameters: Vec<GenericParameterSchema>,
    pub key_kind: KeyKind,
    pub members: Vec<MemberSchema>,          // ascending int_key
    pub constructor: Vec<ConstructorParameter>,
    pub has_serialization_callbacks: bool,
    pub needs_cast_on_before: bool,
    pub needs_cast_on_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSchema {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    pub formatter_name: String,
    pub underlying: EnumUnderlying,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericSchema {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub full_name: String,
    pub formatter_name: String,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionSubtype {
    pub key: i32,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionSchema {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    pub formatter_name: String,
    pub subtypes: Vec<UnionSubtype>, // strictly ascending key
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEntry {
    Object(ObjectSchema),
    Enum(EnumSchema),
    Generic(GenericSchema),
    Union(UnionSchema),
}

/// The finished artifact. Every collection is sorted by `full_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub objects: Vec<ObjectSchema>,
    pub enums: Vec<EnumSchema>,
    pub generics: Vec<GenericSchema>,
    pub unions: Vec<UnionSchema>,
}

impl ObjectSchema {
    /// Largest readable integer key, `-1` when nothing is readable.
    pub fn max_key(&self) -> i32 {
        self.members
            .iter()
            .filter(|m| m.is_readable)
            .map(|m| m.int_key)
            .max()
            .unwrap_or(-1)
    }

    /// How many slots the writer emits.
    pub fn write_count(&self) -> i32 {
        match self.key_kind {
            KeyKind::NameKeyed => self.members.iter().filter(|m| m.is_readable).count() as i32,
            KeyKind::IntegerKeyed => self.max_key(),
        }
    }

    pub fn member_at(&self, int_key: i32) -> Option<&MemberSchema> {
        self.members.iter().find(|m| m.int_key == int_key)
    }

    /// Some member needs a formatter looked up at runtime.
    pub fn needs_formatter_resolver(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.custom_formatter.is_none() && !m.is_primitive)
    }
}

impl SchemaEntry {
    pub fn full_name(&self) -> &str {
        match self {
            Self::Object(x) => &x.full_name,
            Self::Enum(x) => &x.full_name,
            Self::Generic(x) => &x.full_name,
            Self::Union(x) => &x.full_name,
        }
    }
}

impl Schema {
    pub fn len(&self) -> usize {
        self.objects.len() + self.enums.len() + self.generics.len() + self.unions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn object(&self, full_name: &str) -> Option<&ObjectSchema> {
        self.objects.iter().find(|x| x.full_name == full_name)
    }

    pub fn enumeration(&self, full_name: &str) -> Option<&EnumSchema> {
        self.enums.iter().find(|x| x.full_name == full_name)
    }

    pub fn generic(&self, full_name: &str) -> Option<&GenericSchema> {
        self.generics.iter().find(|x| x.full_name == full_name)
    }

    pub fn union(&self, full_name: &str) -> Option<&UnionSchema> {
        self.unions.iter().find(|x| x.full_name == full_name)
    }

    /// Sorted full names per collection: objects, enums, generics, unions.
    pub fn names(&self) -> [Vec<&str>; 4] {
        [
            self.objects.iter().map(|x| x.full_name.as_str()).collect(),
            self.enums.iter().map(|x| x.full_name.as_str()).collect(),
            self.generics.iter().map(|x| x.full_name.as_str()).collect(),
            self.unions.iter().map(|x| x.full_name.as_str()).collect(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, int_key: i32, is_readable: bool, ty: &str) -> MemberSchema {
        let ty: TypeRef = ty.parse().unwrap();
        MemberSchema {
            name: name.into(),
            kind: MemberKind::Field,
            is_readable,
            is_writable: true,
            type_name: ty.qualified_name(),
            is_primitive: crate::wellknown::is_primitive(&ty),
            ty,
            int_key,
            string_key: None,
            custom_formatter: None,
        }
    }

    fn object(key_kind: KeyKind, members: Vec<MemberSchema>) -> ObjectSchema {
        ObjectSchema {
            ty: TypeRef::named("Demo.Sample"),
            full_name: "Demo.Sample".into(),
            namespace: "Demo".into(),
            name: "Sample".into(),
            formatter_name: "Demo.SampleFormatter".into(),
            is_class: true,
            is_open_generic: false,
            generic_parameters: Vec::new(),
            key_kind,
            members,
            constructor: Vec::new(),
            has_serialization_callbacks: false,
            needs_cast_on_before: true,
            needs_cast_on_after: true,
        }
    }

    #[test]
    fn write_count_depends_on_key_kind() {
        let members = vec![
            member("a", 0, true, "System.Int32"),
            member("b", 3, true, "System.Int32"),
            member("c", 5, false, "System.Int32"),
        ];
        let int_keyed = object(KeyKind::IntegerKeyed, members.clone());
        assert_eq!(int_keyed.max_key(), 3);
        assert_eq!(int_keyed.write_count(), 3);
        let name_keyed = object(KeyKind::NameKeyed, members);
        assert_eq!(name_keyed.write_count(), 2);
        assert_eq!(object(KeyKind::IntegerKeyed, Vec::new()).max_key(), -1);
    }

    #[test]
    fn formatter_resolver_needed_only_for_non_primitive_members() {
        let mut schema = object(KeyKind::IntegerKeyed, vec![member("a", 0, true, "System.Int32")]);
        assert!(!schema.needs_formatter_resolver());
        schema.members.push(member("b", 1, true, "System.String"));
        assert!(schema.needs_formatter_resolver());
        schema.members[1].custom_formatter = Some("Demo.StringFormatter".into());
        assert!(!schema.needs_formatter_resolver());
        assert_eq!(schema.member_at(1).map(|m| m.name.as_str()), Some("b"));
    }
}
