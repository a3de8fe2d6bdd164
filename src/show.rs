//! Show data: identifiers, track kinds, timing metadata and the
//! collaborators that provide them.
//!
//! `model` holds the plain data types deserialized from the timing report;
//! `store` defines the retrieval traits and a directory-backed store.

mod model;
mod store;

pub use model::*;
pub use store::*;
