//! Chooses the constructor an object is rebuilt through.
//!
//! A marked serialization constructor must bind. Otherwise public instance
//! constructors are tried from the most parameters down and the first one
//! whose every parameter binds wins. Value types may end up with none.
use std::cmp::Reverse;

use thiserror::Error;
use tracing::{debug, warn};

use super::Result;
use super::members::ResolvedMembers;
use crate::descriptor::{ConstructorDef, Descriptors, ParamDef, TypeDef};
use crate::error::ResolutionError;
use crate::schema::{ConstructorParameter, KeyKind, MemberSchema};
use crate::type_ref::TypeRef;

/// Why one candidate constructor was rejected.
#[derive(Debug, Error)]
enum Mismatch {
    #[error("parameter {index} (`{parameter}`) has no member with key {index}")]
    NoMemberAtIndex { index: usize, parameter: String },
    #[error("parameter `{parameter}` matches no member name or key")]
    NoMemberNamed { parameter: String },
    #[error("parameter `{parameter}` matches more than one member")]
    Ambiguous { parameter: String },
    #[error("member `{member}` cannot supply parameter `{parameter}` of type `{ty}`")]
    Incompatible { parameter: String, member: String, ty: TypeRef },
}

pub fn resolve(
    types: Descriptors<'_>,
    ty: &TypeRef,
    def: &TypeDef,
    resolved: &ResolvedMembers,
) -> Result<Vec<ConstructorParameter>> {
    let implicit = [ConstructorDef { params: Vec::new(), is_public: true, is_static: false, serialization_constructor: false }];
    // a type that lists no constructors has the implicit parameterless one
    let declared: &[ConstructorDef] = if def.constructors.is_empty() { &implicit } else { &def.constructors };

    let marked: Vec<&ConstructorDef> = declared.iter().filter(|c| c.serialization_constructor).collect();
    match marked.as_slice() {
        [] => {}
        [ctor] => return bind(types, resolved, ctor).map_err(|m| rejection(ty, m)),
        _ => return Err(ResolutionError::MultipleSerializationConstructors { ty: ty.clone() }),
    }

    let mut candidates: Vec<&ConstructorDef> = declared.iter().filter(|c| c.is_public && !c.is_static).collect();
    candidates.sort_by_key(|c| Reverse(c.params.len()));

    let mut last = None;
    for ctor in candidates {
        match bind(types, resolved, ctor) {
            Ok(params) => {
                debug!(%ty, arity = params.len(), "constructor bound");
                return Ok(params);
            }
            Err(mismatch) => last = Some(mismatch),
        }
    }
    if def.is_value_type() {
        warn!(%ty, "no constructor binds; falling back to default construction");
        return Ok(Vec::new());
    }
    Err(match last {
        Some(mismatch) => rejection(ty, mismatch),
        None => ResolutionError::NoMatchingConstructor { ty: ty.clone(), reason: "no public constructor".into() },
    })
}

fn rejection(ty: &TypeRef, mismatch: Mismatch) -> ResolutionError {
    match mismatch {
        Mismatch::Ambiguous { parameter } => ResolutionError::AmbiguousConstructorParameter { ty: ty.clone(), parameter },
        other => ResolutionError::NoMatchingConstructor { ty: ty.clone(), reason: other.to_string() },
    }
}

fn bind(
    types: Descriptors<'_>,
    resolved: &ResolvedMembers,
    ctor: &ConstructorDef,
) -> std::result::Result<Vec<ConstructorParameter>, Mismatch> {
    ctor.params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let member = match resolved.key_kind {
                KeyKind::IntegerKeyed => by_index(resolved, index, param)?,
                KeyKind::NameKeyed => by_name(resolved, param)?,
            };
            if !(member.is_readable && types.is_assignable(&param.ty, &member.ty)) {
                return Err(Mismatch::Incompatible {
                    parameter: param.name.clone(),
                    member: member.name.clone(),
                    ty: param.ty.clone(),
                });
            }
            Ok(ConstructorParameter {
                parameter: param.name.clone(),
                parameter_type: param.ty.clone(),
                member: member.name.clone(),
                member_key: member.int_key,
            })
        })
        .collect()
}

fn by_index<'m>(resolved: &'m ResolvedMembers, index: usize, param: &ParamDef) -> std::result::Result<&'m MemberSchema, Mismatch> {
    let key = i32::try_from(index).ok();
    resolved
        .members
        .iter()
        .find(|m| Some(m.int_key) == key)
        .ok_or_else(|| Mismatch::NoMemberAtIndex { index, parameter: param.name.clone() })
}

/// Case-insensitive; member names are only consulted when no string key matches.
fn by_name<'m>(resolved: &'m ResolvedMembers, param: &ParamDef) -> std::result::Result<&'m MemberSchema, Mismatch> {
    let wanted = param.name.to_lowercase();
    let by_key: Vec<&MemberSchema> = resolved
        .members
        .iter()
        .filter(|m| m.string_key.as_ref().is_some_and(|k| k.to_lowercase() == wanted))
        .collect();
    let matches: Vec<&MemberSchema> = if by_key.is_empty() {
        resolved.members.iter().filter(|m| m.name.to_lowercase() == wanted).collect()
    } else {
        by_key
    };
    match matches.as_slice() {
        [member] => Ok(*member),
        [] => Err(Mismatch::NoMemberNamed { parameter: param.name.clone() }),
        _ => Err(Mismatch::Ambiguous { parameter: param.name.clone() }),
    }
}
