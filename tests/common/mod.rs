//! Common test utilities for conceptgraph integration tests
//!
//! Shared helpers for opening every backend and building the graphs the
//! scenario tests run against.

#![allow(dead_code)]

pub mod graph_builder;

pub use graph_builder::{
    backends, cpp_curriculum, learning_scenario, normalized, normalized_relationship, Backend,
    GraphBuilder,
};
