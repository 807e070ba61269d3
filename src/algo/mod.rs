//! Subdivision passes over element buffers.
//!
//! - [`refine`] runs the Catmull-Clark stencils level by level
//! - [`normals`] derives finest-level normals from the refined positions
//! - [`grids`] moves data between face grids and the vertices/edges they
//!   border, for callers that edit grids directly
//!
//! Every pass works on an [`EffectedSet`]: the elements whose data must be
//! recomputed. Everything outside the set keeps its buffers untouched.

pub(crate) mod grids;
pub(crate) mod normals;
pub(crate) mod refine;
mod sample;

use crate::mesh::{Edge, EdgeIndex, Face, FaceIndex, Handle, Layout, Topology, VertIndex};
use crate::subsurf::Scratch;

/// The elements a pass recomputes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EffectedSet {
    pub(crate) verts: Vec<VertIndex>,
    pub(crate) edges: Vec<EdgeIndex>,
    pub(crate) faces: Vec<FaceIndex>,
}

impl EffectedSet {
    /// Gather flagged elements plus every edge and face around a flagged vertex.
    ///
    /// Collected edges and faces get their flag set, so the flags afterwards
    /// describe exactly this set.
    pub(crate) fn collect<H: Handle>(topo: &mut Topology<H>) -> Self {
        let verts: Vec<VertIndex> = topo
            .verts
            .iter()
            .filter(|(_, v)| v.effected)
            .map(|(i, _)| i)
            .collect();
        let mut edges: Vec<EdgeIndex> = topo
            .edges
            .iter()
            .filter(|(_, e)| e.effected)
            .map(|(i, _)| i)
            .collect();
        let mut faces: Vec<FaceIndex> = topo
            .faces
            .iter()
            .filter(|(_, f)| f.effected)
            .map(|(i, _)| i)
            .collect();

        for &v in &verts {
            let vert = &topo.verts[v];
            for &e in &vert.edges {
                let edge = &mut topo.edges[e];
                if !edge.effected {
                    edge.effected = true;
                    edges.push(e);
                }
            }
            for &f in &vert.faces {
                let face = &mut topo.faces[f];
                if !face.effected {
                    face.effected = true;
                    faces.push(f);
                }
            }
        }

        Self {
            verts,
            edges,
            faces,
        }
    }

    /// The neighbourhood of an explicit face selection: the faces themselves
    /// plus every vertex and edge whose faces all lie in the selection.
    pub(crate) fn around_faces<H: Handle>(topo: &mut Topology<H>, selection: &[FaceIndex]) -> Self {
        let mut faces = Vec::with_capacity(selection.len());
        for &f in selection {
            let face = &mut topo.faces[f];
            if !face.effected {
                face.effected = true;
                faces.push(f);
            }
        }

        let Topology {
            verts: vert_arena,
            edges: edge_arena,
            faces: face_arena,
        } = topo;

        let mut verts = Vec::new();
        for (v, vert) in vert_arena.iter_mut() {
            if vert.faces.iter().all(|&f| face_arena[f].effected) {
                vert.effected = true;
                verts.push(v);
            }
        }

        let mut edges = Vec::new();
        for (e, edge) in edge_arena.iter_mut() {
            if edge.faces.iter().all(|&f| face_arena[f].effected) {
                edge.effected = true;
                edges.push(e);
            }
        }

        Self {
            verts,
            edges,
            faces,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.verts.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }
}

/// Corner slot of `v` in `face`.
#[inline]
pub(crate) fn corner_index<H: Handle>(face: &Face<H>, v: VertIndex) -> usize {
    let corner = face.corner_of(v);
    debug_assert!(corner.is_some(), "{v:?} is not a corner of its adjacent face");
    corner.unwrap_or(0)
}

/// Offset in `face` of the sample `ey` steps inside from sample `ex` of `edge`.
#[inline]
pub(crate) fn face_if_edge<H: Handle>(
    l: &Layout,
    face: &Face<H>,
    e: EdgeIndex,
    edge: &Edge<H>,
    level: usize,
    ex: usize,
    ey: usize,
) -> usize {
    let slot = face.edge_slot(e);
    debug_assert!(slot.is_some(), "{e:?} is not an edge of its adjacent face");
    let slot = slot.unwrap_or(0);
    let flipped = edge.v0 != face.verts[slot];
    l.face_if_edge(face.num_corners(), slot, flipped, level, ex, ey)
}

/// Borrowed view of everything a pass reads and writes.
pub(crate) struct GridPass<'a, H> {
    pub(crate) topo: &'a mut Topology<H>,
    pub(crate) layout: &'a Layout,
    pub(crate) scratch: &'a mut Scratch,
    pub(crate) simple: bool,
}

impl<'a, H: Handle> GridPass<'a, H> {
    pub(crate) fn new(
        topo: &'a mut Topology<H>,
        layout: &'a Layout,
        scratch: &'a mut Scratch,
        simple: bool,
    ) -> Self {
        Self {
            topo,
            layout,
            scratch,
            simple,
        }
    }
}
