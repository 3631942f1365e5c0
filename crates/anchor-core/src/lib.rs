//! Core types for anchored bipartite graphs.
//!
//! Converts grouped, semi-structured records into a graph whose root nodes
//! ([`node::Level::Root`]) are connected to branch nodes that appeared in the
//! same source record. Provides the node model ([`node::Node`]), the
//! deduplicating node store, the construction pipeline
//! ([`graph::AnchoredGraph`]), JSON input loading, and configuration.

pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod node;
pub mod node_set;
pub mod record;
pub mod value;
