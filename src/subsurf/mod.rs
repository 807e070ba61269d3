//! The subdivision context.
//!
//! [`Subsurf`] owns the element registries and arenas, the configuration and
//! the sync state. Callers describe their mesh through the sync protocol
//! (see [`sync`](Subsurf::init_full_sync)), the context refines whatever the
//! pass touched, and results are read back through the accessors.
//!
//! # Example
//!
//! ```
//! use subsurf::prelude::*;
//!
//! let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 2).unwrap();
//!
//! ss.init_full_sync().unwrap();
//! ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
//! ss.sync_vert(1, &[1.0, 0.0, 0.0], false).unwrap();
//! ss.sync_vert(2, &[1.0, 1.0, 0.0], false).unwrap();
//! ss.sync_vert(3, &[0.0, 1.0, 0.0], false).unwrap();
//! for i in 0..4 {
//!     ss.sync_edge(i, i, (i + 1) % 4, 0.0).unwrap();
//! }
//! ss.sync_face(0, &[0, 1, 2, 3]).unwrap();
//! ss.process_sync().unwrap();
//!
//! // 4 corners, each a 2x2 grid of quads at level 2
//! assert_eq!(ss.num_final_faces(), 16);
//! ```

mod access;
mod state;
mod sync;

pub use state::SyncState;

use crate::error::{Result, SubsurfError};
use crate::mesh::{
    BufferAllocator, EdgeIndex, EdgeKey, FaceIndex, Handle, HandleMap, HeapAllocator, Layout,
    MeshInterface, Topology, VertIndex, MAX_LEVELS,
};

/// Policy for edges created while syncing faces.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCreation {
    /// Crease given to created edges.
    pub default_crease: f32,
    /// Payload copied into the user data of created edges.
    pub default_user: Vec<u8>,
}

/// Byte offsets of the i32 age stamp inside each element's user payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeOffsets {
    /// Offset in vertex payloads.
    pub vert: usize,
    /// Offset in edge payloads.
    pub edge: usize,
    /// Offset in face payloads.
    pub face: usize,
}

/// Handle → index registries for one generation.
#[derive(Debug, Clone)]
pub(crate) struct Registries<H: Handle> {
    pub(crate) verts: HandleMap<H, VertIndex>,
    pub(crate) edges: HandleMap<EdgeKey<H>, EdgeIndex>,
    pub(crate) faces: HandleMap<H, FaceIndex>,
}

impl<H: Handle> Default for Registries<H> {
    fn default() -> Self {
        Self {
            verts: HandleMap::new(),
            edges: HandleMap::new(),
            faces: HandleMap::new(),
        }
    }
}

impl<H: Handle> Registries<H> {
    fn clear(&mut self) {
        self.verts.clear();
        self.edges.clear();
        self.faces.clear();
    }
}

/// Sample-sized work buffers reused by every refinement pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scratch {
    pub(crate) q: Vec<f32>,
    pub(crate) r: Vec<f32>,
    pub(crate) out: Vec<f32>,
}

impl Scratch {
    fn resize(&mut self, width: usize) {
        self.q.resize(width, 0.0);
        self.r.resize(width, 0.0);
        self.out.resize(width, 0.0);
    }
}

/// An incremental Catmull-Clark subdivision context.
///
/// `H` is the caller's handle type; `A` supplies element buffers.
#[derive(Debug)]
pub struct Subsurf<H: Handle, A: BufferAllocator = HeapAllocator> {
    pub(crate) ifc: MeshInterface,
    pub(crate) layout: Layout,
    pub(crate) alloc: A,
    pub(crate) topo: Topology<H>,
    pub(crate) live: Registries<H>,
    pub(crate) old: Option<Registries<H>>,
    pub(crate) state: SyncState,
    pub(crate) generation: u32,
    pub(crate) num_grids: usize,
    pub(crate) next_auto_edge: u32,
    pub(crate) edge_creation: Option<EdgeCreation>,
    pub(crate) age: Option<AgeOffsets>,
    pub(crate) scratch: Scratch,
}

fn check_levels(levels: usize) -> Result<()> {
    if levels == 0 || levels > MAX_LEVELS {
        return Err(SubsurfError::invalid_param(
            "levels",
            levels,
            "must be between 1 and 11",
        ));
    }
    Ok(())
}

impl<H: Handle> Subsurf<H, HeapAllocator> {
    /// Create a context refining to `levels` levels, using the heap for buffers.
    pub fn new(ifc: MeshInterface, levels: usize) -> Result<Self> {
        Self::with_allocator(ifc, levels, HeapAllocator)
    }
}

impl<H: Handle, A: BufferAllocator> Subsurf<H, A> {
    /// Create a context whose element buffers come from `alloc`.
    pub fn with_allocator(ifc: MeshInterface, levels: usize, alloc: A) -> Result<Self> {
        ifc.validate()?;
        check_levels(levels)?;

        let mut scratch = Scratch::default();
        scratch.resize(ifc.width());
        log::debug!(
            "creating subsurf context: {} levels, {} layers, width {}",
            levels,
            ifc.layers(),
            ifc.width()
        );

        Ok(Self {
            ifc,
            layout: Layout::new(&ifc, levels),
            alloc,
            topo: Topology::default(),
            live: Registries::default(),
            old: None,
            state: SyncState::None,
            generation: 0,
            num_grids: 0,
            next_auto_edge: 0,
            edge_creation: None,
            age: None,
            scratch,
        })
    }

    /// Tear the context down: every element buffer goes back to the
    /// allocator, which is then released and returned.
    pub fn free(mut self) -> A {
        if self.state.is_open() {
            log::warn!("freeing context with an open {:?} sync", self.state);
        }
        self.topo.free_all(&mut self.alloc);
        if let Some(old) = self.old.as_mut() {
            old.clear();
        }
        self.alloc.release();
        self.alloc
    }

    pub(crate) fn require_idle(&self, operation: &'static str) -> Result<()> {
        if self.state.is_open() {
            return Err(SubsurfError::InvalidSyncState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    // ==== Configuration ====

    /// Change the number of refinement levels.
    ///
    /// Element buffers are sized by the level count, so a different value
    /// frees every element; the caller must run a full resync afterwards.
    pub fn set_level_count(&mut self, levels: usize) -> Result<()> {
        check_levels(levels)?;
        self.require_idle("set_level_count")?;

        if levels != self.layout.levels() {
            log::debug!(
                "level count {} -> {}, dropping {} faces",
                self.layout.levels(),
                levels,
                self.topo.faces.len()
            );
            self.topo.free_all(&mut self.alloc);
            self.live.clear();
            self.num_grids = 0;
            self.layout =
                Layout::new(&self.ifc, levels).with_normal_offset(self.layout.normal_offset());
        }
        Ok(())
    }

    /// Enable or disable creation of missing edges while syncing faces.
    ///
    /// Created edges get `default_crease` and a copy of `default_user` as the
    /// start of their payload.
    pub fn set_edge_auto_creation(
        &mut self,
        enabled: bool,
        default_crease: f32,
        default_user: &[u8],
    ) -> Result<()> {
        if enabled {
            if !default_crease.is_finite() || default_crease < 0.0 {
                return Err(SubsurfError::invalid_param(
                    "default_crease",
                    default_crease,
                    "must be finite and non-negative",
                ));
            }
            if default_user.len() > self.ifc.edge_user_size() {
                return Err(SubsurfError::invalid_param(
                    "default_user",
                    default_user.len(),
                    "longer than the edge user payload",
                ));
            }
        }
        self.require_idle("set_edge_auto_creation")?;

        self.edge_creation = enabled.then(|| EdgeCreation {
            default_crease,
            default_user: default_user.to_vec(),
        });
        Ok(())
    }

    /// Enable or disable age stamps in element payloads.
    ///
    /// When enabled, every element touched by a pass gets the current
    /// generation written as an `i32` at the given byte offset of its
    /// payload.
    pub fn set_age_tracking(
        &mut self,
        enabled: bool,
        vert_offset: usize,
        edge_offset: usize,
        face_offset: usize,
    ) -> Result<()> {
        if enabled {
            let size = std::mem::size_of::<i32>();
            for (name, offset, user_size) in [
                ("vert_offset", vert_offset, self.ifc.vert_user_size()),
                ("edge_offset", edge_offset, self.ifc.edge_user_size()),
                ("face_offset", face_offset, self.ifc.face_user_size()),
            ] {
                if offset.checked_add(size).map_or(true, |end| end > user_size) {
                    return Err(SubsurfError::invalid_param(
                        name,
                        offset,
                        "age stamp does not fit in the user payload",
                    ));
                }
            }
        }
        self.require_idle("set_age_tracking")?;

        self.age = enabled.then_some(AgeOffsets {
            vert: vert_offset,
            edge: edge_offset,
            face: face_offset,
        });
        Ok(())
    }

    /// Enable or disable the normal pass.
    ///
    /// Normals occupy three floats at `normal_offset` of every sample, which
    /// must lie past the interpolated layers and inside the sample width.
    pub fn set_normal_calculation(&mut self, enabled: bool, normal_offset: usize) -> Result<()> {
        if enabled {
            if self.ifc.layers() < 3 {
                return Err(SubsurfError::invalid_param(
                    "layers",
                    self.ifc.layers(),
                    "normals need at least 3 interpolated layers",
                ));
            }
            let past_end = normal_offset
                .checked_add(3)
                .map_or(true, |end| end > self.ifc.width());
            if normal_offset < self.ifc.layers() || past_end {
                return Err(SubsurfError::invalid_param(
                    "normal_offset",
                    normal_offset,
                    "normal must lie between the layers and the sample end",
                ));
            }
        }
        self.require_idle("set_normal_calculation")?;

        self.layout = self
            .layout
            .with_normal_offset(enabled.then_some(normal_offset));
        Ok(())
    }

    // ==== Configuration accessors ====

    /// The mesh interface this context was created with.
    pub fn mesh_interface(&self) -> &MeshInterface {
        &self.ifc
    }

    /// The current buffer layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Current sync state.
    pub fn sync_state(&self) -> SyncState {
        self.state
    }

    /// The generation counter, bumped by every sync pass.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The edge auto-creation policy, if enabled.
    pub fn edge_auto_creation(&self) -> Option<&EdgeCreation> {
        self.edge_creation.as_ref()
    }

    /// Age stamp offsets, if age tracking is enabled.
    pub fn age_tracking(&self) -> Option<AgeOffsets> {
        self.age
    }

    /// Whether the normal pass is enabled.
    pub fn calculates_normals(&self) -> bool {
        self.layout.normal_offset().is_some()
    }
}

#[cfg(test)]
mod tests;
