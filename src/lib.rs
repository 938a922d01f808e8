// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod analyzer;
pub mod config;
pub mod generate;
pub mod graph;
pub mod naming;
pub mod progress;
pub mod render;
pub mod schema;
