use thiserror::Error;

use crate::type_ref::TypeRef;

/// A type graph that cannot be turned into a schema. Every variant is fatal to
/// the run and names the offending type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("`{ty}` is an interface or abstract class without union declarations")]
    MissingUnionDeclaration { ty: TypeRef },

    #[error("`{ty}` declares discriminant {key} for both `{first}` and `{second}`")]
    DuplicateDiscriminant { ty: TypeRef, key: i32, first: TypeRef, second: TypeRef },

    #[error("member `{member}` of `{ty}` has no key declaration")]
    MissingKeyDeclaration { ty: TypeRef, member: String },

    #[error("member `{member}` of `{ty}` mixes integer and string keys")]
    MixedKeyKinds { ty: TypeRef, member: String },

    #[error("`{ty}` uses key {key} more than once (`{first}` and `{second}`)")]
    DuplicateMemberKey { ty: TypeRef, key: String, first: String, second: String },

    #[error("no constructor of `{ty}` matches its members: {reason}")]
    NoMatchingConstructor { ty: TypeRef, reason: String },

    #[error("constructor parameter `{parameter}` of `{ty}` matches more than one member")]
    AmbiguousConstructorParameter { ty: TypeRef, parameter: String },

    #[error("`{ty}` is an array of rank {rank}; ranks 1 to 4 are supported")]
    UnsupportedArrayRank { ty: TypeRef, rank: u8 },

    #[error("member `{member}` of `{ty}` has an unexpected shape")]
    UnexpectedMemberShape { ty: TypeRef, member: String },

    #[error("`{ty}` is reachable but carries neither an object nor a data contract")]
    MissingObjectContract { ty: TypeRef },

    #[error("`{ty}` marks more than one serialization constructor")]
    MultipleSerializationConstructors { ty: TypeRef },

    #[error("`{ty}` is not described by the type universe")]
    UnknownType { ty: TypeRef },
}

impl ResolutionError {
    /// Stable taxonomy name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingUnionDeclaration { .. } => "MissingUnionDeclaration",
            Self::DuplicateDiscriminant { .. } => "DuplicateDiscriminant",
            Self::MissingKeyDeclaration { .. } => "MissingKeyDeclaration",
            Self::MixedKeyKinds { .. } => "MixedKeyKinds",
            Self::DuplicateMemberKey { .. } => "DuplicateMemberKey",
            Self::NoMatchingConstructor { .. } => "NoMatchingConstructor",
            Self::AmbiguousConstructorParameter { .. } => "AmbiguousConstructorParameter",
            Self::UnsupportedArrayRank { .. } => "UnsupportedArrayRank",
            Self::UnexpectedMemberShape { .. } => "UnexpectedMemberShape",
            Self::MissingObjectContract { .. } => "MissingObjectContract",
            Self::MultipleSerializationConstructors { .. } => "MultipleSerializationConstructors",
            Self::UnknownType { .. } => "UnknownType",
        }
    }

    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Self::MissingUnionDeclaration { ty }
            | Self::DuplicateDiscriminant { ty, .. }
            | Self::MissingKeyDeclaration { ty, .. }
            | Self::MixedKeyKinds { ty, .. }
            | Self::DuplicateMemberKey { ty, .. }
            | Self::NoMatchingConstructor { ty, .. }
            | Self::AmbiguousConstructorParameter { ty, .. }
            | Self::UnsupportedArrayRank { ty, .. }
            | Self::UnexpectedMemberShape { ty, .. }
            | Self::MissingObjectContract { ty }
            | Self::MultipleSerializationConstructors { ty }
            | Self::UnknownType { ty } => ty,
        }
    }
}
