//! Query catalog
//!
//! The catalog is the fixed set of parameterized queries a plan may use.
//! Parameter declarations are normalized on load, so downstream code only
//! ever sees canonical `ParameterSpec`s.

mod loader;
pub mod normalizer;
mod store;
mod types;

pub use loader::{fingerprint, parse_catalog, CatalogSource, StaticSource, YamlFileSource};
pub use normalizer::normalize;
pub use store::{Catalog, CatalogStore};
pub use types::{ParamType, ParameterSpec, QueryDefinition};
