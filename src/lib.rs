//! Serialization schema resolution over a described type universe.
//!
//! A [`TypeUniverse`](descriptor::TypeUniverse) describes user types; the
//! [`Collector`](collect::Collector) walks everything reachable from a root
//! set and produces a [`Schema`](schema::Schema): keyed objects, enums,
//! generic containers and closed unions, each with the formatter an emitter
//! should generate or reference.
pub mod collect;
pub mod descriptor;
pub mod error;
pub mod naming;
pub mod options;
pub mod path_de;
pub mod registry;
pub mod schema;
pub mod type_ref;
pub mod universe;
pub mod wellknown;

pub use collect::Collector;
pub use descriptor::{Descriptors, TypeDef, TypeUniverse};
pub use error::ResolutionError;
pub use options::CollectOptions;
pub use schema::{Schema, SchemaEntry};
pub use type_ref::TypeRef;
pub use universe::{LoadError, StaticUniverse};

/// Resolves the schema of every root type the universe exposes.
pub fn collect(universe: &dyn TypeUniverse, options: CollectOptions) -> Result<Schema, ResolutionError> {
    Collector::new(universe, options).collect_all()
}
