//! Emitter-facing names for types and formatters.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::descriptor::{GenericParamDef, ParamConstraints, TypeDef};
use crate::schema::GenericParameterSchema;
use crate::type_ref::TypeRef;

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static pattern"));

/// `global::<ns>.<stem><args>` for a built-in formatter.
pub fn builtin_formatter(namespace: &str, stem: &str, args: &[TypeRef]) -> String {
    let args = args.iter().map(TypeRef::qualified_name).collect::<Vec<_>>().join(",");
    format!("global::{namespace}.{stem}<{args}>")
}

/// Formatter a closed instantiation of a user generic would be served by.
pub fn instantiated_formatter(def: &TypeDef, args: &[TypeRef]) -> String {
    let args = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    format!("global::{}Formatter<{args}>", dotted(&def.namespace, &def.name))
}

/// Declaring types joined by `_`, anything that is not an identifier
/// character replaced by `_`.
pub fn minimal_name(def: &TypeDef) -> String {
    let raw = match def.declaring_type.as_ref().and_then(TypeRef::path) {
        Some(outer) => {
            let outer = outer
                .strip_prefix(def.namespace.as_str())
                .map_or(outer, |rest| rest.trim_start_matches('.'));
            format!("{outer}_{}", def.name)
        }
        None => def.name.clone(),
    };
    NON_IDENT.replace_all(&raw, "_").into_owned()
}

pub fn object_formatter_name(def: &TypeDef, open_generic: bool) -> String {
    let mut name = format!("{}Formatter", dotted(&def.namespace, &minimal_name(def)));
    if open_generic {
        let params = def.generic_params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        name.push('<');
        name.push_str(&params.join(","));
        name.push('>');
    }
    name
}

pub fn enum_formatter_name(def: &TypeDef) -> String {
    format!("{}Formatter", dotted(&def.namespace, &def.name.replace('.', "_")))
}

pub fn union_formatter_name(def: &TypeDef) -> String {
    format!("{}Formatter", dotted(&def.namespace, &def.name))
}

/// `where` clause body: special constraints first, `new()` last.
pub fn constraint_clause(constraints: &ParamConstraints) -> String {
    let mut parts = Vec::new();
    if constraints.not_null {
        parts.push("notnull".to_string());
    }
    if constraints.reference_type {
        parts.push("class".to_string());
    }
    if constraints.value_type {
        parts.push("struct".to_string());
    }
    parts.extend(constraints.types.iter().map(ToString::to_string));
    if constraints.default_constructor {
        parts.push("new()".to_string());
    }
    parts.join(", ")
}

pub fn generic_parameter(param: &GenericParamDef) -> GenericParameterSchema {
    GenericParameterSchema { name: param.name.clone(), constraints: constraint_clause(&param.constraints) }
}

fn dotted(namespace: &str, name: &str) -> String {
    if namespace.is_empty() { name.to_string() } else { format!("{namespace}.{name}") }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn def(value: serde_json::Value) -> TypeDef {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn nested_names_are_flattened() {
        let inner = def(json!({ "namespace": "Demo", "name": "Inner", "declaring_type": "Demo.Outer.Middle" }));
        assert_eq!(minimal_name(&inner), "Outer_Middle_Inner");
        assert_eq!(object_formatter_name(&inner, false), "Demo.Outer_Middle_InnerFormatter");
    }

    #[test]
    fn open_generic_formatter_lists_parameters() {
        let boxed = def(json!({ "namespace": "Demo", "name": "Pair",
            "generic_params": [{ "name": "TKey" }, { "name": "TValue" }] }));
        assert_eq!(object_formatter_name(&boxed, true), "Demo.PairFormatter<TKey,TValue>");
        let closed = instantiated_formatter(&boxed, &["System.Int32".parse().unwrap(), "Demo.Leaf".parse().unwrap()]);
        assert_eq!(closed, "global::Demo.PairFormatter<System.Int32, Demo.Leaf>");
    }

    #[test]
    fn builtin_formatters_use_qualified_arguments() {
        let name = builtin_formatter("MessagePack.Formatters", "ListFormatter", &["Demo.Leaf".parse().unwrap()]);
        assert_eq!(name, "global::MessagePack.Formatters.ListFormatter<global::Demo.Leaf>");
    }

    #[test]
    fn constraint_clause_orders_new_last() {
        let constraints = ParamConstraints {
            reference_type: true,
            default_constructor: true,
            types: vec!["System.IDisposable".parse().unwrap()],
            ..ParamConstraints::default()
        };
        assert_eq!(constraint_clause(&constraints), "class, System.IDisposable, new()");
        assert_eq!(constraint_clause(&ParamConstraints::default()), "");
    }
}
