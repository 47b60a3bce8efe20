//! Shared types and stock logic for the pharmacy stock dashboard
//!
//! This crate contains the pure domain shared between the backend, the
//! dashboard (via WASM), and tests: row models and their boundary parsing,
//! the stock classifier, and the filter/sort/paginate pipeline.

pub mod debounce;
pub mod models;
pub mod pipeline;
pub mod types;
pub mod validation;

pub use debounce::*;
pub use models::*;
pub use pipeline::*;
pub use types::*;
pub use validation::*;
