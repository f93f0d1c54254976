//! CLI command implementations.

pub mod common;
pub mod filters;
pub mod layouts;
pub mod negotiate;
pub mod preset;
pub mod select;
