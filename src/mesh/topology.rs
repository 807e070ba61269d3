//! Element arenas and symmetric adjacency maintenance.

use super::alloc::BufferAllocator;
use super::arena::Arena;
use super::element::{Edge, Face, Vert};
use super::index::{EdgeIndex, FaceIndex, Handle, VertIndex};

/// The three element arenas of a context.
///
/// Adjacency is only ever changed through the `link_*` / `unlink_*` helpers
/// here, which keep every back-reference symmetric.
#[derive(Debug, Clone)]
pub struct Topology<H> {
    pub(crate) verts: Arena<VertIndex, Vert<H>>,
    pub(crate) edges: Arena<EdgeIndex, Edge<H>>,
    pub(crate) faces: Arena<FaceIndex, Face<H>>,
}

impl<H: Handle> Default for Topology<H> {
    fn default() -> Self {
        Self {
            verts: Arena::new(),
            edges: Arena::new(),
            faces: Arena::new(),
        }
    }
}

impl<H: Handle> Topology<H> {
    // ==== Linking ====

    /// Register `e` with both of its endpoints.
    pub(crate) fn link_edge(&mut self, e: EdgeIndex) {
        let [v0, v1] = self.edges[e].verts();
        self.verts[v0].add_edge(e);
        self.verts[v1].add_edge(e);
    }

    /// Remove `e` from both endpoints and mark them effected.
    pub(crate) fn unlink_edge(&mut self, e: EdgeIndex) {
        let [v0, v1] = self.edges[e].verts();
        for v in [v0, v1] {
            let vert = &mut self.verts[v];
            vert.remove_edge(e);
            vert.effected = true;
        }
    }

    /// Register `f` with all of its vertices and edges.
    pub(crate) fn link_face(&mut self, f: FaceIndex) {
        let face = &self.faces[f];
        for &v in &face.verts {
            self.verts[v].add_face(f);
        }
        for &e in &face.edges {
            self.edges[e].add_face(f);
        }
    }

    /// Remove `f` from all of its vertices and edges and mark them effected.
    pub(crate) fn unlink_face(&mut self, f: FaceIndex) {
        let face = &self.faces[f];
        for &v in &face.verts {
            let vert = &mut self.verts[v];
            vert.remove_face(f);
            vert.effected = true;
        }
        for &e in &face.edges {
            let edge = &mut self.edges[e];
            edge.remove_face(f);
            edge.effected = true;
        }
    }

    // ==== Effected propagation ====

    /// Mark both endpoints of `e` effected.
    pub(crate) fn mark_edge_verts(&mut self, e: EdgeIndex) {
        let edge = &mut self.edges[e];
        edge.effected = true;
        let [v0, v1] = edge.verts();
        self.verts[v0].effected = true;
        self.verts[v1].effected = true;
    }

    /// Mark every vertex of `f` effected.
    pub(crate) fn mark_face_verts(&mut self, f: FaceIndex) {
        let face = &mut self.faces[f];
        face.effected = true;
        for &v in &face.verts {
            self.verts[v].effected = true;
        }
    }

    /// Mark the endpoints of every edge and the vertices of every face around `v`.
    pub(crate) fn mark_vert_neighbours(&mut self, v: VertIndex) {
        let vert = &self.verts[v];
        let edges = vert.edges.clone();
        let faces = vert.faces.clone();
        for e in edges {
            self.mark_edge_verts(e);
        }
        for f in faces {
            self.mark_face_verts(f);
        }
    }

    // ==== Queries ====

    /// Edges joining `a` and `b`, in the adjacency order of `a`.
    pub(crate) fn edges_between(
        &self,
        a: VertIndex,
        b: VertIndex,
    ) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.verts[a]
            .edges
            .iter()
            .copied()
            .filter(move |&e| self.edges[e].joins(a, b))
    }

    // ==== Freeing ====

    /// Remove `v` from its arena and return its buffers to `alloc`.
    pub(crate) fn free_vert<A: BufferAllocator>(&mut self, v: VertIndex, alloc: &mut A) {
        if let Some(vert) = self.verts.remove(v) {
            debug_assert!(
                vert.edges.is_empty() && vert.faces.is_empty(),
                "freeing vertex {v:?} with live adjacency"
            );
            alloc.free(vert.data);
            alloc.free_bytes(vert.user);
        }
    }

    /// Unlink `e`, then free it.
    pub(crate) fn unlink_and_free_edge<A: BufferAllocator>(&mut self, e: EdgeIndex, alloc: &mut A) {
        self.unlink_edge(e);
        if let Some(edge) = self.edges.remove(e) {
            debug_assert!(edge.faces.is_empty(), "freeing edge {e:?} with live faces");
            alloc.free(edge.data);
            alloc.free_bytes(edge.user);
        }
    }

    /// Unlink `f`, then free it.
    pub(crate) fn unlink_and_free_face<A: BufferAllocator>(&mut self, f: FaceIndex, alloc: &mut A) {
        self.unlink_face(f);
        if let Some(face) = self.faces.remove(f) {
            alloc.free(face.data);
            alloc.free_bytes(face.user);
        }
    }

    /// Free every element without touching adjacency.
    pub(crate) fn free_all<A: BufferAllocator>(&mut self, alloc: &mut A) {
        for face in self.faces.drain() {
            alloc.free(face.data);
            alloc.free_bytes(face.user);
        }
        for edge in self.edges.drain() {
            alloc.free(edge.data);
            alloc.free_bytes(edge.user);
        }
        for vert in self.verts.drain() {
            alloc.free(vert.data);
            alloc.free_bytes(vert.user);
        }
    }

    /// Clear the effected flag on every element.
    pub(crate) fn clear_effected(&mut self) {
        for (_, v) in self.verts.iter_mut() {
            v.effected = false;
        }
        for (_, e) in self.edges.iter_mut() {
            e.effected = false;
        }
        for (_, f) in self.faces.iter_mut() {
            f.effected = false;
        }
    }
}
