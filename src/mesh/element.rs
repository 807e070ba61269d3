//! Vertex, edge and face records.
//!
//! Records hold adjacency as small vectors of arena indices plus the sample
//! and payload buffers handed out by the allocator. Adjacency removal swaps
//! the last entry into the hole, so list order is not stable across removals.

use smallvec::SmallVec;

use super::index::{EdgeIndex, EdgeKey, FaceIndex, Handle, VertIndex};

/// Adjacent edges of a vertex.
pub type VertEdges = SmallVec<[EdgeIndex; 8]>;
/// Adjacent faces of a vertex.
pub type VertFaces = SmallVec<[FaceIndex; 8]>;
/// Adjacent faces of an edge.
pub type EdgeFaces = SmallVec<[FaceIndex; 2]>;

/// Remove the first occurrence of `item`, moving the last element into its place.
#[inline]
fn swap_remove_item<A: smallvec::Array>(list: &mut SmallVec<A>, item: A::Item) -> bool
where
    A::Item: PartialEq,
{
    match list.iter().position(|x| *x == item) {
        Some(i) => {
            list.swap_remove(i);
            true
        }
        None => false,
    }
}

/// A base mesh vertex.
#[derive(Debug, Clone)]
pub struct Vert<H> {
    pub(crate) handle: H,
    pub(crate) edges: VertEdges,
    pub(crate) faces: VertFaces,
    pub(crate) data: Vec<f32>,
    pub(crate) user: Vec<u8>,
    pub(crate) seam: bool,
    pub(crate) effected: bool,
    pub(crate) changed: bool,
    pub(crate) stamp: u32,
}

impl<H: Handle> Vert<H> {
    pub(crate) fn new(handle: H, data: Vec<f32>, user: Vec<u8>, stamp: u32) -> Self {
        Self {
            handle,
            edges: VertEdges::new(),
            faces: VertFaces::new(),
            data,
            user,
            seam: false,
            effected: true,
            changed: false,
            stamp,
        }
    }

    // ==== Accessors ====

    /// The caller handle of this vertex.
    #[inline]
    pub fn handle(&self) -> H {
        self.handle
    }

    /// Adjacent edges.
    #[inline]
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// Adjacent faces.
    #[inline]
    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    /// Whether the vertex lies on a UV seam.
    #[inline]
    pub fn is_seam(&self) -> bool {
        self.seam
    }

    /// Whether the last sync changed this vertex's data or seam flag.
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// The whole sample buffer, all levels back to back.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The user payload.
    #[inline]
    pub fn user_data(&self) -> &[u8] {
        &self.user
    }

    // ==== Adjacency ====

    pub(crate) fn add_edge(&mut self, e: EdgeIndex) {
        self.edges.push(e);
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeIndex) -> bool {
        swap_remove_item(&mut self.edges, e)
    }

    pub(crate) fn add_face(&mut self, f: FaceIndex) {
        self.faces.push(f);
    }

    pub(crate) fn remove_face(&mut self, f: FaceIndex) -> bool {
        swap_remove_item(&mut self.faces, f)
    }
}

/// A base mesh edge.
#[derive(Debug, Clone)]
pub struct Edge<H> {
    pub(crate) key: EdgeKey<H>,
    pub(crate) v0: VertIndex,
    pub(crate) v1: VertIndex,
    pub(crate) crease: f32,
    pub(crate) faces: EdgeFaces,
    pub(crate) data: Vec<f32>,
    pub(crate) user: Vec<u8>,
    pub(crate) effected: bool,
    pub(crate) stamp: u32,
}

impl<H: Handle> Edge<H> {
    pub(crate) fn new(
        key: EdgeKey<H>,
        v0: VertIndex,
        v1: VertIndex,
        crease: f32,
        data: Vec<f32>,
        user: Vec<u8>,
        stamp: u32,
    ) -> Self {
        Self {
            key,
            v0,
            v1,
            crease,
            faces: EdgeFaces::new(),
            data,
            user,
            effected: true,
            stamp,
        }
    }

    // ==== Accessors ====

    /// Registry key of this edge.
    #[inline]
    pub fn key(&self) -> EdgeKey<H> {
        self.key
    }

    /// The caller handle, `None` for auto-created edges.
    #[inline]
    pub fn handle(&self) -> Option<H> {
        self.key.handle()
    }

    /// The two endpoints.
    #[inline]
    pub fn verts(&self) -> [VertIndex; 2] {
        [self.v0, self.v1]
    }

    /// Crease value.
    #[inline]
    pub fn crease(&self) -> f32 {
        self.crease
    }

    /// Adjacent faces.
    #[inline]
    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    /// Whether the edge has fewer than two adjacent faces.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.faces.len() < 2
    }

    /// The whole sample buffer, all level rows back to back.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The user payload.
    #[inline]
    pub fn user_data(&self) -> &[u8] {
        &self.user
    }

    /// Sharpness at `level`: the crease at level 0, then one less per level.
    #[inline]
    pub fn sharpness(&self, level: usize) -> f32 {
        if level == 0 || self.crease <= 0.0 {
            self.crease
        } else {
            (self.crease - level as f32).max(0.0)
        }
    }

    /// The endpoint opposite `v`.
    #[inline]
    pub fn other_vert(&self, v: VertIndex) -> VertIndex {
        if self.v0 == v {
            self.v1
        } else {
            self.v0
        }
    }

    /// Whether this edge joins `a` and `b` in either direction.
    #[inline]
    pub fn joins(&self, a: VertIndex, b: VertIndex) -> bool {
        (self.v0 == a && self.v1 == b) || (self.v0 == b && self.v1 == a)
    }

    // ==== Adjacency ====

    pub(crate) fn add_face(&mut self, f: FaceIndex) {
        self.faces.push(f);
    }

    pub(crate) fn remove_face(&mut self, f: FaceIndex) -> bool {
        swap_remove_item(&mut self.faces, f)
    }
}

/// A base mesh face.
#[derive(Debug, Clone)]
pub struct Face<H> {
    pub(crate) handle: H,
    pub(crate) verts: SmallVec<[VertIndex; 4]>,
    pub(crate) edges: SmallVec<[EdgeIndex; 4]>,
    pub(crate) data: Vec<f32>,
    pub(crate) user: Vec<u8>,
    pub(crate) effected: bool,
    pub(crate) stamp: u32,
}

impl<H: Handle> Face<H> {
    pub(crate) fn new(
        handle: H,
        verts: &[VertIndex],
        edges: &[EdgeIndex],
        data: Vec<f32>,
        user: Vec<u8>,
        stamp: u32,
    ) -> Self {
        debug_assert_eq!(verts.len(), edges.len());
        Self {
            handle,
            verts: SmallVec::from_slice(verts),
            edges: SmallVec::from_slice(edges),
            data,
            user,
            effected: true,
            stamp,
        }
    }

    // ==== Accessors ====

    /// The caller handle of this face.
    #[inline]
    pub fn handle(&self) -> H {
        self.handle
    }

    /// Number of corners.
    #[inline]
    pub fn num_corners(&self) -> usize {
        self.verts.len()
    }

    /// Corner vertices in order.
    #[inline]
    pub fn verts(&self) -> &[VertIndex] {
        &self.verts
    }

    /// Edges in order; edge `i` joins vertex `i` and vertex `i + 1`.
    #[inline]
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// The whole sample buffer.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The user payload.
    #[inline]
    pub fn user_data(&self) -> &[u8] {
        &self.user
    }

    /// Corner slot of vertex `v`.
    #[inline]
    pub fn corner_of(&self, v: VertIndex) -> Option<usize> {
        self.verts.iter().position(|&x| x == v)
    }

    /// Slot of edge `e`.
    #[inline]
    pub fn edge_slot(&self, e: EdgeIndex) -> Option<usize> {
        self.edges.iter().position(|&x| x == e)
    }

    /// Whether the face has exactly these vertices and edges in this order.
    pub(crate) fn same_topology(&self, verts: &[VertIndex], edges: &[EdgeIndex]) -> bool {
        self.verts.as_slice() == verts && self.edges.as_slice() == edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vert_adjacency_swap_remove() {
        let mut v: Vert<u32> = Vert::new(1, vec![0.0; 3], Vec::new(), 0);
        for i in 0..4 {
            v.add_edge(EdgeIndex::new(i));
        }
        assert!(v.remove_edge(EdgeIndex::new(1)));
        assert!(!v.remove_edge(EdgeIndex::new(1)));
        assert_eq!(
            v.edges(),
            &[EdgeIndex::new(0), EdgeIndex::new(3), EdgeIndex::new(2)]
        );

        v.add_face(FaceIndex::new(9));
        assert!(v.remove_face(FaceIndex::new(9)));
        assert!(v.faces().is_empty());
    }

    #[test]
    fn test_edge_sharpness() {
        let v0 = VertIndex::new(0);
        let v1 = VertIndex::new(1);
        let mut e: Edge<u32> = Edge::new(EdgeKey::Handle(0), v0, v1, 2.5, Vec::new(), Vec::new(), 0);

        assert_eq!(e.sharpness(0), 2.5);
        assert_eq!(e.sharpness(1), 1.5);
        assert_eq!(e.sharpness(3), 0.0);

        e.crease = 0.0;
        assert_eq!(e.sharpness(2), 0.0);

        assert_eq!(e.other_vert(v0), v1);
        assert!(e.joins(v1, v0));
        assert!(e.is_boundary());
    }

    #[test]
    fn test_face_slots() {
        let verts = [VertIndex::new(4), VertIndex::new(5), VertIndex::new(6)];
        let edges = [EdgeIndex::new(1), EdgeIndex::new(2), EdgeIndex::new(3)];
        let f: Face<u32> = Face::new(0, &verts, &edges, Vec::new(), Vec::new(), 0);

        assert_eq!(f.num_corners(), 3);
        assert_eq!(f.corner_of(VertIndex::new(6)), Some(2));
        assert_eq!(f.edge_slot(EdgeIndex::new(1)), Some(0));
        assert_eq!(f.edge_slot(EdgeIndex::new(7)), None);
        assert!(f.same_topology(&verts, &edges));
    }
}
