//! Type identities and their textual syntax.
//!
//! A [`TypeRef`] names one type instantiation of the source type system:
//! `Ns.Name`, `Ns.Name<A, B>`, `Elem[]`, `Elem[,]` or an unbound generic
//! parameter. `T?` is accepted as shorthand for `System.Nullable<T>`.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const NULLABLE_PATH: &str = "System.Nullable";
pub const OBJECT_PATH: &str = "System.Object";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// A (possibly generic) named type. `args` is empty for non-generic types.
    Named { path: String, args: Vec<TypeRef> },
    /// `rank` is 1 for `T[]`, 2 for `T[,]`, and so on.
    Array { element: Box<TypeRef>, rank: u8 },
    /// Unbound generic parameter of the enclosing definition.
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type reference `{input}` at offset {offset}: {reason}")]
pub struct TypeRefParseError {
    pub input: String,
    pub offset: usize,
    pub reason: &'static str,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeRef {
    pub fn named(path: impl Into<String>) -> Self {
        Self::Named { path: path.into(), args: Vec::new() }
    }
    pub fn generic(path: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named { path: path.into(), args }
    }
    pub fn array(element: TypeRef, rank: u8) -> Self {
        Self::Array { element: Box::new(element), rank }
    }
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }
    pub fn nullable(inner: TypeRef) -> Self {
        Self::generic(NULLABLE_PATH, vec![inner])
    }

    /// Definition path of a named type.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Named { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.args().is_empty()
    }

    /// Mentions an unbound parameter anywhere inside.
    pub fn is_open(&self) -> bool {
        match self {
            Self::Param(_) => true,
            Self::Array { element, .. } => element.is_open(),
            Self::Named { args, .. } => args.iter().any(TypeRef::is_open),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Named { path, args } if path == OBJECT_PATH && args.is_empty())
    }

    pub fn nullable_inner(&self) -> Option<&TypeRef> {
        match self {
            Self::Named { path, args } if path == NULLABLE_PATH && args.len() == 1 => args.first(),
            _ => None,
        }
    }

    /// `(path, arity)`: how generic type constructors are looked up.
    pub fn definition_key(&self) -> Option<(&str, usize)> {
        match self {
            Self::Named { path, args } => Some((path.as_str(), args.len())),
            _ => None,
        }
    }

    /// Emitter-facing spelling: `global::Ns.Box<global::System.Int32>`.
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        self.write_qualified(&mut out);
        out
    }

    fn write_qualified(&self, out: &mut String) {
        match self {
            Self::Named { path, args } => {
                out.push_str("global::");
                out.push_str(path);
                if !args.is_empty() {
                    out.push('<');
                    for (ix, arg) in args.iter().enumerate() {
                        if ix > 0 {
                            out.push(',');
                        }
                        arg.write_qualified(out);
                    }
                    out.push('>');
                }
            }
            Self::Array { element, rank } => {
                element.write_qualified(out);
                push_rank(out, *rank);
            }
            Self::Param(name) => out.push_str(name),
        }
    }

    /// Replaces each parameter named in `params` by the matching entry of `args`.
    pub fn substitute(&self, params: &[String], args: &[TypeRef]) -> TypeRef {
        match self {
            Self::Param(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|ix| args.get(ix).cloned())
                .unwrap_or_else(|| self.clone()),
            Self::Array { element, rank } => {
                Self::array(element.substitute(params, args), *rank)
            }
            Self::Named { path, args: inner } => Self::Named {
                path: path.clone(),
                args: inner.iter().map(|a| a.substitute(params, args)).collect(),
            },
        }
    }

    /// Rebinds bare names that match an in-scope generic parameter to [`TypeRef::Param`].
    pub fn bind_params(self, params: &[String]) -> TypeRef {
        match self {
            Self::Named { path, args } if args.is_empty() && params.contains(&path) => {
                Self::Param(path)
            }
            Self::Named { path, args } => Self::Named {
                path,
                args: args.into_iter().map(|a| a.bind_params(params)).collect(),
            },
            Self::Array { element, rank } => Self::array(element.bind_params(params), rank),
            param @ Self::Param(_) => param,
        }
    }
}

fn push_rank(out: &mut String, rank: u8) {
    out.push('[');
    for _ in 1..rank {
        out.push(',');
    }
    out.push(']');
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { path, args } => {
                f.write_str(path)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (ix, arg) in args.iter().enumerate() {
                        if ix > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array { element, rank } => {
                let mut suffix = String::new();
                push_rank(&mut suffix, *rank);
                write!(f, "{element}{suffix}")
            }
            Self::Param(name) => f.write_str(name),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn fail(&self, reason: &'static str) -> TypeRefParseError {
        TypeRefParseError { input: self.src.to_string(), offset: self.pos, reason }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char, reason: &'static str) -> Result<(), TypeRefParseError> {
        if self.eat(c) { Ok(()) } else { Err(self.fail(reason)) }
    }

    fn ident(&mut self) -> Result<&'a str, TypeRefParseError> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(ix, _)| ix);
        let ident = &rest[..len];
        match ident.chars().next() {
            Some(c) if !c.is_ascii_digit() => {
                self.pos += len;
                Ok(ident)
            }
            _ => Err(self.fail("expected identifier")),
        }
    }

    fn path(&mut self) -> Result<String, TypeRefParseError> {
        let mut path = self.ident()?.to_string();
        while self.eat('.') {
            path.push('.');
            path.push_str(self.ident()?);
        }
        Ok(path)
    }

    fn type_ref(&mut self) -> Result<TypeRef, TypeRefParseError> {
        let path = self.path()?;
        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.type_ref()?);
                if !self.eat(',') {
                    break;
                }
            }
            self.expect('>', "expected `>` or `,`")?;
        }
        let mut ty = TypeRef::Named { path, args };
        loop {
            if self.eat('?') {
                ty = TypeRef::nullable(ty);
            } else if self.eat('[') {
                let mut rank: u8 = 1;
                while self.eat(',') {
                    rank = rank.saturating_add(1);
                }
                self.expect(']', "expected `]`")?;
                ty = TypeRef::array(ty, rank);
            } else {
                break;
            }
        }
        Ok(ty)
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { src, pos: 0 };
        let ty = parser.type_ref()?;
        parser.skip_ws();
        if parser.pos != src.len() {
            return Err(parser.fail("trailing input"));
        }
        Ok(ty)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = String::deserialize(deserializer)?;
        src.parse().map_err(serde::de::Error::custom)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> TypeRef {
        src.parse().unwrap()
    }

    #[test]
    fn parses_nested_generics_and_arrays() {
        let ty = parse("System.Collections.Generic.Dictionary<System.String, Demo.Item[]>[,]");
        let TypeRef::Array { element, rank } = &ty else { panic!("expected array, got {ty:?}") };
        assert_eq!(*rank, 2);
        assert_eq!(element.path(), Some("System.Collections.Generic.Dictionary"));
        assert_eq!(element.args()[1], TypeRef::array(TypeRef::named("Demo.Item"), 1));
        assert_eq!(
            ty.to_string(),
            "System.Collections.Generic.Dictionary<System.String, Demo.Item[]>[,]"
        );
    }

    #[test]
    fn question_mark_is_nullable_shorthand() {
        let ty = parse("Demo.Point?");
        assert_eq!(ty, TypeRef::nullable(TypeRef::named("Demo.Point")));
        assert_eq!(ty.nullable_inner(), Some(&TypeRef::named("Demo.Point")));
    }

    #[test]
    fn qualified_name_prefixes_every_named_part() {
        let ty = parse("Demo.Box<System.Int32, Demo.Leaf[]>");
        assert_eq!(ty.qualified_name(), "global::Demo.Box<global::System.Int32,global::Demo.Leaf[]>");
    }

    #[test]
    fn rejects_malformed_input() {
        let err = "Demo.Box<System.Int32".parse::<TypeRef>().unwrap_err();
        assert_eq!(err.reason, "expected `>` or `,`");
        assert!("Demo..Box".parse::<TypeRef>().is_err());
        assert!("Demo.Box extra".parse::<TypeRef>().is_err());
        assert!("9Lives".parse::<TypeRef>().is_err());
    }

    #[test]
    fn binds_and_substitutes_parameters() {
        let params = vec!["T".to_string()];
        let ty = parse("System.Collections.Generic.List<T>[]").bind_params(&params);
        assert!(ty.is_open());
        let closed = ty.substitute(&params, &[TypeRef::named("System.Int32")]);
        assert_eq!(closed.to_string(), "System.Collections.Generic.List<System.Int32>[]");
        assert!(!closed.is_open());
    }
}
