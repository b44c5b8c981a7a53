// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod registry;
pub mod schema;
