use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::wellknown::DEFAULT_FORMATTER_NAMESPACE;

/// Knobs for one resolver run. Loadable from a JSON options file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectOptions {
    /// Key every object by member name, ignoring key annotations.
    pub force_name_keyed: bool,
    /// Canonical full names excluded from the graph.
    pub ignored_type_names: BTreeSet<String>,
    /// An eligible member without a key is an error instead of a skip.
    pub require_explicit_keys: bool,
    pub formatter_namespace: String,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            force_name_keyed: false,
            ignored_type_names: BTreeSet::new(),
            require_explicit_keys: false,
            formatter_namespace: DEFAULT_FORMATTER_NAMESPACE.to_string(),
        }
    }
}

impl CollectOptions {
    pub fn ignore(mut self, full_name: impl Into<String>) -> Self {
        self.ignored_type_names.insert(full_name.into());
        self
    }

    pub fn is_ignored(&self, full_name: &str) -> bool {
        self.ignored_type_names.contains(full_name)
    }
}
