//! Core types and traits for the graphmap entity-edge mapper.
//!
//! Storage backends implement [`VertexStore`] and [`EdgeStore`]; the mapping
//! layer in `graphmap-template` only ever talks to these traits.

mod id;
mod record;
mod traits;

pub use id::*;
pub use record::*;
pub use traits::*;
