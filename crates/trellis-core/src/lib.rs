//! Core types for Trellis graphs.
//!
//! This crate holds the in-memory graph model shared by the codec and the
//! layout engine:
//!
//! - [`identifier`] - Interned node and edge identifiers
//! - [`geometry`] - Positions and centroids
//! - [`node`] / [`edge`] - Graph elements
//! - [`hierarchy`] - The containment forest
//! - [`graph`] - The graph aggregate and its invariant-preserving operations
//! - [`command`] - Invertible edits for host-side undo/redo

pub mod command;
pub mod edge;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hierarchy;
pub mod identifier;
pub mod node;
