//! # Subsurf
//!
//! Incremental multiresolution Catmull-Clark subdivision.
//!
//! A [`Subsurf`](subsurf::Subsurf) context mirrors a caller's polygon mesh,
//! refines it to a fixed number of levels and keeps every level of every
//! element in memory. When the caller re-describes the mesh, only the
//! elements whose result can change are recomputed.
//!
//! ## Features
//!
//! - **Caller handles**: vertices, edges and faces are named by any
//!   [`Handle`](mesh::Handle) type, resolved to type-safe arena indices
//! - **Full and partial sync**: re-describe the whole mesh, or edit and
//!   delete individual elements in place
//! - **Per-level storage**: vertex samples, edge rows and per-corner face
//!   grids for every level, addressed through a [`Layout`](mesh::Layout)
//! - **Creases and seams**: fractional edge sharpness and seam vertices
//! - **Normals**: optional finest-level normals stored inside each sample
//! - **Grid editing**: push edited face grids back to vertices and edges,
//!   stitch neighbours and rebuild finer levels
//!
//! ## Quick Start
//!
//! ```
//! use subsurf::prelude::*;
//!
//! let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 3).unwrap();
//! ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
//!
//! // Describe the mesh: a single quad, edges created on the fly
//! ss.init_full_sync().unwrap();
//! ss.sync_vert(10, &[0.0, 0.0, 0.0], false).unwrap();
//! ss.sync_vert(11, &[1.0, 0.0, 0.0], false).unwrap();
//! ss.sync_vert(12, &[1.0, 1.0, 0.0], false).unwrap();
//! ss.sync_vert(13, &[0.0, 1.0, 0.0], false).unwrap();
//! ss.sync_face(1, &[10, 11, 12, 13]).unwrap();
//! ss.process_sync().unwrap();
//!
//! assert_eq!(ss.num_edges(), 4);
//! assert_eq!(ss.num_final_faces(), 4 * 4 * 4);
//!
//! // Move one corner; only what it influences is recomputed
//! ss.init_partial_sync().unwrap();
//! ss.sync_vert(12, &[1.0, 1.0, 0.5], false).unwrap();
//! ss.process_sync().unwrap();
//!
//! let f = ss.face(1).unwrap();
//! let g = ss.grid_size();
//! let corner = ss.face_grid_data(f, 2, g - 1, g - 1);
//! assert!(corner[2] > 0.0);
//! ```
//!
//! ## Reading Results
//!
//! ```
//! use subsurf::prelude::*;
//!
//! # let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 2).unwrap();
//! # ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
//! # ss.init_full_sync().unwrap();
//! # for (i, p) in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]].iter().enumerate() {
//! #     ss.sync_vert(i as u32, p, false).unwrap();
//! # }
//! # ss.sync_face(0, &[0, 1, 2]).unwrap();
//! # ss.process_sync().unwrap();
//! // Every face is split into one grid per corner
//! for f in ss.faces() {
//!     for corner in 0..ss.face_num_verts(f) {
//!         let g = ss.grid_size();
//!         for y in 0..g {
//!             for x in 0..g {
//!                 let _xyz = ss.face_grid_data(f, corner, x, y);
//!             }
//!         }
//!     }
//! }
//!
//! // Coarser levels live in the same buffers
//! let v = ss.vert(0).unwrap();
//! let base = ss.vert_level_data(v, 0).unwrap();
//! assert_eq!(base, &[0.0, 0.0, 0.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub(crate) mod algo;
pub mod error;
pub mod mesh;
pub mod subsurf;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types:
///
/// ```
/// use subsurf::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorKind, Result, SubsurfError};
    pub use crate::mesh::{
        BufferAllocator, EdgeIndex, EdgeKey, FaceIndex, Handle, HeapAllocator, MeshInterface,
        PoolAllocator, VertIndex,
    };
    pub use crate::subsurf::{AgeOffsets, EdgeCreation, Subsurf, SyncState};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
