//! Core data models.

mod build;
mod confidence;
mod ids;
mod osrs;
mod realm;
mod riot;
mod stats;

pub use build::*;
pub use confidence::*;
pub use ids::*;
pub use osrs::*;
pub use realm::*;
pub use riot::*;
pub use stats::*;
