// Part records and overhang validation
pub mod part;

// Ordered, duplicate-free part collections
pub mod catalog;

// Data IO
pub mod loader;

// Overhang-tag multigraph
pub mod graph;

// The hard bit: enumerate assemblies between two overhangs
pub mod enumerate;

// Assemblies and their invariants
pub mod assembly;

// SVG part diagrams
pub mod render;

// MoClo syntax and kit model
pub mod kit;

pub use assembly::{sort_by_length, validate_all, Assembly, AssemblyError};
pub use catalog::{Catalog, CatalogError, PartIndex};
pub use enumerate::{
    enumerate, enumerate_batch, enumerate_with, EndPolicy, Limit, Query, SearchConfig,
    SearchError, SearchMode,
};
pub use part::{Color, FeatureType, Overhang, Part, PartError};
