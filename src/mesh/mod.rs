//! Core element storage.
//!
//! This module holds the data structures a subdivision context is built
//! from: handle registries, element arenas, the vertex/edge/face records and
//! the layout that addresses per-level samples inside element buffers.
//!
//! # Identifiers
//!
//! Callers name elements with their own [`Handle`] values. The context maps
//! them to type-safe arena indices:
//! - [`VertIndex`] - Identifies a vertex
//! - [`EdgeIndex`] - Identifies an edge
//! - [`FaceIndex`] - Identifies a face
//!
//! Indices stay valid until the element is deleted by a sync pass.
//!
//! # Storage
//!
//! Each element owns a flat sample buffer whose shape is described by
//! [`Layout`]. Buffers are obtained from a [`BufferAllocator`] and never
//! resized while the level count stays the same.

mod alloc;
mod arena;
mod element;
mod handle_map;
mod index;
mod layout;
mod topology;

pub use alloc::{BufferAllocator, HeapAllocator, PoolAllocator};
pub use arena::Arena;
pub use element::{Edge, EdgeFaces, Face, Vert, VertEdges, VertFaces};
pub use handle_map::{Entry, HandleMap};
pub use index::{ArenaIndex, EdgeIndex, EdgeKey, FaceIndex, Handle, VertIndex};
pub use layout::{edge_size, grid_size, Layout, MeshInterface, MAX_LEVELS};
pub use topology::Topology;
