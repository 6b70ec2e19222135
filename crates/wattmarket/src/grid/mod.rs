//! Grid catalog, device authorization, and membership.
//!
//! A grid is a named regional energy market. Grid ids are
//! content-addressed digests of `(name, country_code)`, so creation is
//! collision-checked by construction. A user belongs to at most one grid
//! for the registry's lifetime.

pub mod registry;
pub mod types;

pub use registry::GridRegistry;
pub use types::{Grid, GridId};
