//! Read access to the refined mesh.
//!
//! Index-taking accessors panic on indices of deleted elements, the same way
//! slice indexing does. Indices handed out by the sync calls and by the
//! iterators here stay valid until the element is deleted.

use nalgebra::Vector3;

use super::Subsurf;
use crate::mesh::{
    edge_size, grid_size, BufferAllocator, Edge, EdgeIndex, EdgeKey, Face, FaceIndex, Handle, Vert,
    VertIndex,
};

const AGE_LEN: usize = std::mem::size_of::<i32>();

fn read_normal(data: &[f32], off: usize) -> Vector3<f32> {
    Vector3::new(data[off], data[off + 1], data[off + 2])
}

fn read_age(user: &[u8], off: usize) -> i32 {
    bytemuck::pod_read_unaligned(&user[off..off + AGE_LEN])
}

impl<H: Handle, A: BufferAllocator> Subsurf<H, A> {
    // ==== Counts ====

    /// Number of base vertices.
    pub fn num_verts(&self) -> usize {
        self.topo.verts.len()
    }

    /// Number of base edges, auto-created ones included.
    pub fn num_edges(&self) -> usize {
        self.topo.edges.len()
    }

    /// Number of base faces.
    pub fn num_faces(&self) -> usize {
        self.topo.faces.len()
    }

    /// Number of corner grids: the sum of corner counts over all faces.
    pub fn num_grids(&self) -> usize {
        self.num_grids
    }

    /// Vertices of the finest tessellation.
    pub fn num_final_verts(&self) -> usize {
        let es = self.edge_size();
        let gs = self.grid_size();
        self.num_verts()
            + self.num_edges() * (es - 2)
            + self.num_faces()
            + self.num_grids * ((gs - 2) + (gs - 2) * (gs - 2))
    }

    /// Edges of the finest tessellation.
    pub fn num_final_edges(&self) -> usize {
        let es = self.edge_size();
        let gs = self.grid_size();
        self.num_edges() * (es - 1) + self.num_grids * ((gs - 1) + 2 * (gs - 2) * (gs - 1))
    }

    /// Quads of the finest tessellation.
    pub fn num_final_faces(&self) -> usize {
        let gs = self.grid_size();
        self.num_grids * (gs - 1) * (gs - 1)
    }

    // ==== Sizes ====

    /// Number of refinement levels.
    pub fn level_count(&self) -> usize {
        self.layout.levels()
    }

    /// Samples per edge row at the finest level.
    pub fn edge_size(&self) -> usize {
        self.layout.max_edge_size()
    }

    /// Samples per corner-grid side at the finest level.
    pub fn grid_size(&self) -> usize {
        self.layout.max_grid_size()
    }

    /// Samples per edge row at `level`, if the level exists.
    pub fn edge_level_size(&self, level: usize) -> Option<usize> {
        (level <= self.level_count()).then(|| edge_size(level))
    }

    /// Samples per corner-grid side at `level`, if the level has grids.
    pub fn grid_level_size(&self, level: usize) -> Option<usize> {
        (1..=self.level_count())
            .contains(&level)
            .then(|| grid_size(level))
    }

    // ==== Lookup ====

    /// The vertex synced under `handle`.
    pub fn vert(&self, handle: H) -> Option<VertIndex> {
        self.live.verts.get(&handle)
    }

    /// The edge synced under `handle`.
    pub fn edge(&self, handle: H) -> Option<EdgeIndex> {
        self.live.edges.get(&EdgeKey::Handle(handle))
    }

    /// The face synced under `handle`.
    pub fn face(&self, handle: H) -> Option<FaceIndex> {
        self.live.faces.get(&handle)
    }

    /// The vertex record.
    pub fn get_vert(&self, v: VertIndex) -> &Vert<H> {
        &self.topo.verts[v]
    }

    /// The edge record.
    pub fn get_edge(&self, e: EdgeIndex) -> &Edge<H> {
        &self.topo.edges[e]
    }

    /// The face record.
    pub fn get_face(&self, f: FaceIndex) -> &Face<H> {
        &self.topo.faces[f]
    }

    // ==== Vertex queries ====

    /// Edges around `v`.
    pub fn vert_edges(&self, v: VertIndex) -> &[EdgeIndex] {
        &self.topo.verts[v].edges
    }

    /// Faces around `v`.
    pub fn vert_faces(&self, v: VertIndex) -> &[FaceIndex] {
        &self.topo.verts[v].faces
    }

    /// The sample of `v` at `level` (0 is the synced data).
    pub fn vert_level_data(&self, v: VertIndex, level: usize) -> Option<&[f32]> {
        if level > self.level_count() {
            return None;
        }
        let off = self.layout.vert_co(level);
        Some(&self.topo.verts[v].data[off..off + self.layout.width()])
    }

    /// The sample of `v` at the finest level.
    pub fn vert_data(&self, v: VertIndex) -> &[f32] {
        let off = self.layout.vert_co(self.level_count());
        &self.topo.verts[v].data[off..off + self.layout.width()]
    }

    /// The finest-level normal of `v`, when normals are enabled.
    pub fn vert_normal(&self, v: VertIndex) -> Option<Vector3<f32>> {
        let no = self.layout.normal_offset()?;
        let off = self.layout.vert_co(self.level_count()) + no;
        Some(read_normal(&self.topo.verts[v].data, off))
    }

    /// User payload of `v`.
    pub fn vert_user_data(&self, v: VertIndex) -> &[u8] {
        &self.topo.verts[v].user
    }

    /// Mutable user payload of `v`.
    pub fn vert_user_data_mut(&mut self, v: VertIndex) -> &mut [u8] {
        &mut self.topo.verts[v].user
    }

    /// Generations since `v` was last recomputed, when age tracking is on.
    pub fn vert_age(&self, v: VertIndex) -> Option<i32> {
        let age = self.age?;
        let stamp = read_age(&self.topo.verts[v].user, age.vert);
        Some((self.generation as i32).wrapping_sub(stamp))
    }

    // ==== Edge queries ====

    /// Endpoints of `e`.
    pub fn edge_verts(&self, e: EdgeIndex) -> [VertIndex; 2] {
        self.topo.edges[e].verts()
    }

    /// Faces around `e`.
    pub fn edge_faces(&self, e: EdgeIndex) -> &[FaceIndex] {
        &self.topo.edges[e].faces
    }

    /// Sample `x` of the edge row at `level`, counted from the first endpoint.
    pub fn edge_level_data(&self, e: EdgeIndex, x: usize, level: usize) -> Option<&[f32]> {
        if level > self.level_count() || x >= edge_size(level) {
            return None;
        }
        let off = self.layout.edge_co(level, x);
        Some(&self.topo.edges[e].data[off..off + self.layout.width()])
    }

    /// Sample `x` of the finest edge row.
    ///
    /// # Panics
    ///
    /// Panics if `x` is not below [`edge_size`](Self::edge_size).
    pub fn edge_data(&self, e: EdgeIndex, x: usize) -> &[f32] {
        assert!(x < self.edge_size(), "edge sample {x} out of range");
        let off = self.layout.edge_co(self.level_count(), x);
        &self.topo.edges[e].data[off..off + self.layout.width()]
    }

    /// Finest-level normal at sample `x` of `e`, when normals are enabled.
    ///
    /// # Panics
    ///
    /// Panics if `x` is not below [`edge_size`](Self::edge_size).
    pub fn edge_normal(&self, e: EdgeIndex, x: usize) -> Option<Vector3<f32>> {
        assert!(x < self.edge_size(), "edge sample {x} out of range");
        let no = self.layout.normal_offset()?;
        let off = self.layout.edge_co(self.level_count(), x) + no;
        Some(read_normal(&self.topo.edges[e].data, off))
    }

    /// User payload of `e`.
    pub fn edge_user_data(&self, e: EdgeIndex) -> &[u8] {
        &self.topo.edges[e].user
    }

    /// Mutable user payload of `e`.
    pub fn edge_user_data_mut(&mut self, e: EdgeIndex) -> &mut [u8] {
        &mut self.topo.edges[e].user
    }

    /// Generations since `e` was last recomputed, when age tracking is on.
    pub fn edge_age(&self, e: EdgeIndex) -> Option<i32> {
        let age = self.age?;
        let stamp = read_age(&self.topo.edges[e].user, age.edge);
        Some((self.generation as i32).wrapping_sub(stamp))
    }

    // ==== Face queries ====

    /// Number of corners of `f`.
    pub fn face_num_verts(&self, f: FaceIndex) -> usize {
        self.topo.faces[f].num_corners()
    }

    /// Corner vertices of `f`.
    pub fn face_verts(&self, f: FaceIndex) -> &[VertIndex] {
        &self.topo.faces[f].verts
    }

    /// Edges of `f`; edge `i` joins corner `i` and corner `i + 1`.
    pub fn face_edges(&self, f: FaceIndex) -> &[EdgeIndex] {
        &self.topo.faces[f].edges
    }

    /// The face center sample.
    pub fn face_center_data(&self, f: FaceIndex) -> &[f32] {
        let off = self.layout.face_center();
        &self.topo.faces[f].data[off..off + self.layout.width()]
    }

    /// Grid sample `(x, y)` of `corner` at the finest level.
    ///
    /// `(0, 0)` is the face center and `(G-1, G-1)` the corner vertex.
    pub fn face_grid_data(&self, f: FaceIndex, corner: usize, x: usize, y: usize) -> &[f32] {
        self.face_grid_sample(f, self.level_count(), corner, x, y)
    }

    /// Mutable grid sample `(x, y)` of `corner` at the finest level.
    pub fn face_grid_data_mut(&mut self, f: FaceIndex, corner: usize, x: usize, y: usize) -> &mut [f32] {
        self.face_grid_sample_mut(f, self.level_count(), corner, x, y)
    }

    /// Grid sample `(x, y)` of `corner` at `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is outside `1..=levels`, or if `corner`, `x` or `y`
    /// are out of range for the face at that level.
    pub fn face_grid_sample(&self, f: FaceIndex, level: usize, corner: usize, x: usize, y: usize) -> &[f32] {
        let off = self.grid_offset(f, level, corner, x, y);
        &self.topo.faces[f].data[off..off + self.layout.width()]
    }

    /// Mutable grid sample `(x, y)` of `corner` at `level`.
    ///
    /// Edits become visible to vertices and edges through
    /// [`update_from_faces`](Self::update_from_faces).
    pub fn face_grid_sample_mut(
        &mut self,
        f: FaceIndex,
        level: usize,
        corner: usize,
        x: usize,
        y: usize,
    ) -> &mut [f32] {
        let off = self.grid_offset(f, level, corner, x, y);
        let width = self.layout.width();
        &mut self.topo.faces[f].data[off..off + width]
    }

    fn grid_offset(&self, f: FaceIndex, level: usize, corner: usize, x: usize, y: usize) -> usize {
        let gs = self
            .grid_level_size(level)
            .unwrap_or_else(|| panic!("level {level} has no face grids"));
        assert!(
            corner < self.topo.faces[f].num_corners() && x < gs && y < gs,
            "grid sample ({corner}, {x}, {y}) out of range at level {level}"
        );
        self.layout.face_if(level, corner, x, y)
    }

    /// Sample `x` of the interior-edge row of `corner` at the finest level,
    /// running from the face center to the midpoint of edge `corner`.
    pub fn face_grid_edge_data(&self, f: FaceIndex, corner: usize, x: usize) -> &[f32] {
        assert!(
            corner < self.topo.faces[f].num_corners() && x < self.grid_size(),
            "interior edge sample ({corner}, {x}) out of range"
        );
        let off = self.layout.face_ie(self.level_count(), corner, x);
        &self.topo.faces[f].data[off..off + self.layout.width()]
    }

    /// Finest-level normal of grid sample `(x, y)`, when normals are enabled.
    pub fn face_grid_normal(&self, f: FaceIndex, corner: usize, x: usize, y: usize) -> Option<Vector3<f32>> {
        let no = self.layout.normal_offset()?;
        let off = self.grid_offset(f, self.level_count(), corner, x, y) + no;
        Some(read_normal(&self.topo.faces[f].data, off))
    }

    /// User payload of `f`.
    pub fn face_user_data(&self, f: FaceIndex) -> &[u8] {
        &self.topo.faces[f].user
    }

    /// Mutable user payload of `f`.
    pub fn face_user_data_mut(&mut self, f: FaceIndex) -> &mut [u8] {
        &mut self.topo.faces[f].user
    }

    /// Generations since `f` was last recomputed, when age tracking is on.
    pub fn face_age(&self, f: FaceIndex) -> Option<i32> {
        let age = self.age?;
        let stamp = read_age(&self.topo.faces[f].user, age.face);
        Some((self.generation as i32).wrapping_sub(stamp))
    }

    // ==== Iteration ====

    /// All vertices.
    pub fn verts(&self) -> impl Iterator<Item = VertIndex> + '_ {
        self.topo.verts.ids()
    }

    /// All edges.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.topo.edges.ids()
    }

    /// All faces.
    pub fn faces(&self) -> impl Iterator<Item = FaceIndex> + '_ {
        self.topo.faces.ids()
    }

    /// `(handle, vertex)` pairs of the vertex registry.
    pub fn vert_handles(&self) -> impl Iterator<Item = (H, VertIndex)> + '_ {
        self.live.verts.iter()
    }

    /// `(key, edge)` pairs of the edge registry, auto-created edges included.
    pub fn edge_keys(&self) -> impl Iterator<Item = (EdgeKey<H>, EdgeIndex)> + '_ {
        self.live.edges.iter()
    }

    /// `(handle, face)` pairs of the face registry.
    pub fn face_handles(&self) -> impl Iterator<Item = (H, FaceIndex)> + '_ {
        self.live.faces.iter()
    }
}
