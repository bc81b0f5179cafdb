//! Core types for the QRL network simulation.
//!
//! This crate provides the foundational types shared by the parameter-space
//! engine and the discrete-event scheduler:
//!
//! - **Identifiers**: NodeId, NodeIndex, ParameterId
//! - **Geometry**: Position in 3-D space
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend on
//! any other workspace crates, making it the foundation layer.

mod identifiers;
mod position;

pub use identifiers::{NodeId, NodeIndex, ParameterId};
pub use position::Position;
