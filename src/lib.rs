//! Library crate for cinfo exposing the enrichment pipeline and its parts.
pub mod error;
pub mod logging;
pub mod lookup;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod targets;
pub mod types;
