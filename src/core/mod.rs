//! Domain logic that is independent of the HTTP layer.

pub mod plan;
pub mod runs;
pub mod tool_config;
pub mod vector_store;
