//! Domain models for the pharmacy stock dashboard

mod lot;
mod movement;
mod product;
mod stock;
mod summary;
mod threshold;

pub use lot::*;
pub use movement::*;
pub use product::*;
pub use stock::*;
pub use summary::*;
pub use threshold::*;
