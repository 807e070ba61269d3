//! The sync protocol.
//!
//! A full resync re-describes the whole mesh. Every element the caller syncs
//! is matched against the previous generation by handle and reused when
//! unchanged; anything not synced again is deleted by
//! [`process_sync`](Subsurf::process_sync). A partial sync edits the live
//! mesh in place and deletes elements explicitly.
//!
//! Every call validates its arguments before touching any state, so an
//! error leaves the context exactly as it was.

use std::mem;

use smallvec::SmallVec;

use super::state::SyncOp;
use super::Subsurf;
use crate::algo::{EffectedSet, GridPass};
use crate::error::{ElementKind, Result, SubsurfError};
use crate::mesh::{
    BufferAllocator, Edge, EdgeIndex, EdgeKey, Face, FaceIndex, Handle, Vert, VertIndex,
};

/// Outcome of looking up the edge between two face corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoundEdge {
    /// An edge already synced in this pass.
    Live(EdgeIndex),
    /// An auto-created edge of the previous generation.
    Revivable(EdgeIndex),
    Missing,
}

impl<H: Handle, A: BufferAllocator> Subsurf<H, A> {
    // ==== Opening a pass ====

    /// Start a full resync. The current mesh becomes the previous generation.
    pub fn init_full_sync(&mut self) -> Result<()> {
        let next = self.state.transition(SyncOp::InitFull, "init_full_sync")?;

        self.generation = self.generation.wrapping_add(1);
        self.old = Some(mem::take(&mut self.live));
        self.num_grids = 0;
        self.state = next;

        log::debug!(
            "full resync {} over {} verts, {} edges, {} faces",
            self.generation,
            self.topo.verts.len(),
            self.topo.edges.len(),
            self.topo.faces.len()
        );
        Ok(())
    }

    /// Start a partial sync that edits the live mesh.
    pub fn init_partial_sync(&mut self) -> Result<()> {
        let next = self.state.transition(SyncOp::InitPartial, "init_partial_sync")?;

        self.generation = self.generation.wrapping_add(1);
        self.state = next;

        log::debug!("partial sync {}", self.generation);
        Ok(())
    }

    // ==== Vertices ====

    /// Sync a vertex. `data` holds the interpolated layers of its sample.
    pub fn sync_vert(&mut self, handle: H, data: &[f32], seam: bool) -> Result<VertIndex> {
        let next = self.state.transition(SyncOp::Vert, "sync_vert")?;
        let layers = self.ifc.layers();
        if data.len() != layers {
            return Err(SubsurfError::InvalidSample {
                expected: layers,
                actual: data.len(),
            });
        }

        let v = if next.is_full() {
            if self.live.verts.contains_key(&handle) {
                return Err(SubsurfError::duplicate(ElementKind::Vert, &handle));
            }
            let reused = self.old.as_mut().and_then(|old| old.verts.remove(&handle));
            let v = match reused {
                Some(v) => {
                    self.update_vert(v, data, seam);
                    self.topo.verts[v].stamp = self.generation;
                    v
                }
                None => self.create_vert(handle, data, seam),
            };
            self.live.verts.insert(handle, v);
            v
        } else {
            match self.live.verts.get(&handle) {
                Some(v) => {
                    self.update_vert(v, data, seam);
                    v
                }
                None => {
                    let v = self.create_vert(handle, data, seam);
                    self.live.verts.insert(handle, v);
                    v
                }
            }
        };

        self.state = next;
        Ok(v)
    }

    fn create_vert(&mut self, handle: H, data: &[f32], seam: bool) -> VertIndex {
        let mut buf = self.alloc.alloc(self.layout.vert_len());
        buf[..data.len()].copy_from_slice(data);
        let user = self.alloc.alloc_bytes(self.ifc.vert_user_size());

        let mut vert = Vert::new(handle, buf, user, self.generation);
        vert.seam = seam;
        let v = self.topo.verts.insert(vert);
        log::trace!("created vertex {handle:?} as {v:?}");
        v
    }

    fn update_vert(&mut self, v: VertIndex, data: &[f32], seam: bool) {
        let vert = &mut self.topo.verts[v];
        let changed = vert.data[..data.len()] != *data || vert.seam != seam;
        vert.changed = changed;
        if changed {
            vert.data[..data.len()].copy_from_slice(data);
            vert.seam = seam;
            vert.effected = true;
            self.topo.mark_vert_neighbours(v);
        }
    }

    // ==== Edges ====

    /// Sync an edge between two synced vertices.
    pub fn sync_edge(&mut self, handle: H, v0: H, v1: H, crease: f32) -> Result<EdgeIndex> {
        let next = self.state.transition(SyncOp::Edge, "sync_edge")?;
        if !crease.is_finite() || crease < 0.0 {
            return Err(SubsurfError::invalid_param(
                "crease",
                crease,
                "must be finite and non-negative",
            ));
        }
        let a = self
            .live
            .verts
            .get(&v0)
            .ok_or_else(|| SubsurfError::missing(ElementKind::Vert, &v0))?;
        let b = self
            .live
            .verts
            .get(&v1)
            .ok_or_else(|| SubsurfError::missing(ElementKind::Vert, &v1))?;
        if a == b {
            return Err(SubsurfError::invalid_param(
                "v1",
                format!("{v1:?}"),
                "edge endpoints must differ",
            ));
        }
        let key = EdgeKey::Handle(handle);

        let e = if next.is_full() {
            if self.live.edges.contains_key(&key) {
                return Err(SubsurfError::duplicate(ElementKind::Edge, &handle));
            }
            let reusable = self
                .old
                .as_ref()
                .and_then(|old| old.edges.get(&key))
                .filter(|&e| {
                    let edge = &self.topo.edges[e];
                    edge.joins(a, b) && edge.crease == crease
                });
            let e = match reusable {
                Some(e) => {
                    if let Some(old) = self.old.as_mut() {
                        old.edges.remove(&key);
                    }
                    self.topo.edges[e].stamp = self.generation;
                    if self.topo.verts[a].changed || self.topo.verts[b].changed {
                        self.topo.mark_edge_verts(e);
                    }
                    e
                }
                None => self.create_edge(key, a, b, crease),
            };
            self.live.edges.insert(key, e);
            e
        } else {
            match self.live.edges.get(&key) {
                None => {
                    let e = self.create_edge(key, a, b, crease);
                    self.live.edges.insert(key, e);
                    e
                }
                Some(e) => {
                    let edge = &self.topo.edges[e];
                    if edge.joins(a, b) {
                        if edge.crease != crease {
                            self.topo.edges[e].crease = crease;
                            self.topo.mark_edge_verts(e);
                        }
                    } else {
                        if !edge.faces.is_empty() {
                            return Err(SubsurfError::EdgeEndpointsInUse {
                                handle: format!("{handle:?}"),
                                faces: edge.faces.len(),
                            });
                        }
                        self.topo.unlink_edge(e);
                        let edge = &mut self.topo.edges[e];
                        edge.v0 = a;
                        edge.v1 = b;
                        edge.crease = crease;
                        self.topo.link_edge(e);
                        self.topo.mark_edge_verts(e);
                        log::trace!("edge {handle:?} moved to new endpoints");
                    }
                    e
                }
            }
        };

        self.state = next;
        Ok(e)
    }

    fn create_edge(&mut self, key: EdgeKey<H>, a: VertIndex, b: VertIndex, crease: f32) -> EdgeIndex {
        let data = self.alloc.alloc(self.layout.edge_len());
        let user = self.alloc.alloc_bytes(self.ifc.edge_user_size());

        let e = self
            .topo
            .edges
            .insert(Edge::new(key, a, b, crease, data, user, self.generation));
        self.topo.link_edge(e);
        self.topo.mark_edge_verts(e);
        log::trace!("created edge {key:?} as {e:?}");
        e
    }

    fn create_auto_edge(&mut self, a: VertIndex, b: VertIndex) -> EdgeIndex {
        let key = EdgeKey::Auto(self.next_auto_edge);
        self.next_auto_edge = self.next_auto_edge.wrapping_add(1);

        let crease = self
            .edge_creation
            .as_ref()
            .map_or(0.0, |policy| policy.default_crease);
        let e = self.create_edge(key, a, b, crease);
        if let Some(policy) = &self.edge_creation {
            let n = policy.default_user.len();
            self.topo.edges[e].user[..n].copy_from_slice(&policy.default_user);
        }
        self.live.edges.insert(key, e);
        e
    }

    /// Move an auto-created edge of the previous generation into this one.
    fn revive_auto_edge(&mut self, e: EdgeIndex) -> EdgeIndex {
        let key = self.topo.edges[e].key;
        if let Some(old) = self.old.as_mut() {
            old.edges.remove(&key);
        }
        self.live.edges.insert(key, e);

        let crease = self
            .edge_creation
            .as_ref()
            .map_or(0.0, |policy| policy.default_crease);
        let edge = &mut self.topo.edges[e];
        edge.stamp = self.generation;
        let [v0, v1] = edge.verts();
        if edge.crease != crease {
            edge.crease = crease;
            self.topo.mark_edge_verts(e);
        } else if self.topo.verts[v0].changed || self.topo.verts[v1].changed {
            self.topo.mark_edge_verts(e);
        }
        e
    }

    fn find_edge(&self, a: VertIndex, b: VertIndex, full: bool) -> FoundEdge {
        let mut revivable = None;
        for e in self.topo.edges_between(a, b) {
            let edge = &self.topo.edges[e];
            if !full || edge.stamp == self.generation {
                return FoundEdge::Live(e);
            }
            let reusable = self.edge_creation.is_some()
                && edge.key.is_auto()
                && self
                    .old
                    .as_ref()
                    .is_some_and(|old| old.edges.contains_key(&edge.key));
            if reusable && revivable.is_none() {
                revivable = Some(e);
            }
        }
        revivable.map_or(FoundEdge::Missing, FoundEdge::Revivable)
    }

    // ==== Faces ====

    /// Sync a face given its corner vertices in order.
    ///
    /// Consecutive corners must be joined by a synced edge, or edge
    /// auto-creation must be enabled.
    pub fn sync_face(&mut self, handle: H, vert_handles: &[H]) -> Result<FaceIndex> {
        let next = self.state.transition(SyncOp::Face, "sync_face")?;
        let full = next.is_full();
        if full && self.live.faces.contains_key(&handle) {
            return Err(SubsurfError::duplicate(ElementKind::Face, &handle));
        }
        let n = vert_handles.len();
        if n < 3 {
            return Err(SubsurfError::malformed_face(&handle, "fewer than 3 corners"));
        }

        let mut verts: SmallVec<[VertIndex; 4]> = SmallVec::with_capacity(n);
        for h in vert_handles {
            let v = self
                .live
                .verts
                .get(h)
                .ok_or_else(|| SubsurfError::missing(ElementKind::Vert, h))?;
            if verts.contains(&v) {
                return Err(SubsurfError::malformed_face(&handle, "repeats a vertex"));
            }
            verts.push(v);
        }
        if self.edge_creation.is_none() {
            for i in 0..n {
                if self.find_edge(verts[i], verts[(i + 1) % n], full) == FoundEdge::Missing {
                    return Err(SubsurfError::malformed_face(
                        &handle,
                        "corners not joined by an edge",
                    ));
                }
            }
        }

        let mut edges: SmallVec<[EdgeIndex; 4]> = SmallVec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (verts[i], verts[(i + 1) % n]);
            let e = match self.find_edge(a, b, full) {
                FoundEdge::Live(e) => e,
                FoundEdge::Revivable(e) => self.revive_auto_edge(e),
                FoundEdge::Missing => self.create_auto_edge(a, b),
            };
            edges.push(e);
        }

        let f = if full {
            let reusable = self
                .old
                .as_ref()
                .and_then(|old| old.faces.get(&handle))
                .filter(|&f| self.topo.faces[f].same_topology(&verts, &edges));
            let f = match reusable {
                Some(f) => {
                    if let Some(old) = self.old.as_mut() {
                        old.faces.remove(&handle);
                    }
                    self.topo.faces[f].stamp = self.generation;
                    if verts.iter().any(|&v| self.topo.verts[v].changed) {
                        self.topo.mark_face_verts(f);
                    }
                    f
                }
                None => self.create_face(handle, &verts, &edges),
            };
            self.live.faces.insert(handle, f);
            self.num_grids += n;
            f
        } else {
            match self.live.faces.get(&handle) {
                Some(f) if self.topo.faces[f].same_topology(&verts, &edges) => f,
                Some(stale) => {
                    self.num_grids -= self.topo.faces[stale].num_corners();
                    self.topo.unlink_and_free_face(stale, &mut self.alloc);
                    let f = self.create_face(handle, &verts, &edges);
                    self.live.faces.insert(handle, f);
                    self.num_grids += n;
                    log::trace!("face {handle:?} replaced");
                    f
                }
                None => {
                    let f = self.create_face(handle, &verts, &edges);
                    self.live.faces.insert(handle, f);
                    self.num_grids += n;
                    f
                }
            }
        };

        self.state = next;
        Ok(f)
    }

    fn create_face(&mut self, handle: H, verts: &[VertIndex], edges: &[EdgeIndex]) -> FaceIndex {
        let data = self.alloc.alloc(self.layout.face_len(verts.len()));
        let user = self.alloc.alloc_bytes(self.ifc.face_user_size());

        let f = self
            .topo
            .faces
            .insert(Face::new(handle, verts, edges, data, user, self.generation));
        self.topo.link_face(f);
        self.topo.mark_face_verts(f);
        log::trace!("created face {handle:?} as {f:?}");
        f
    }

    // ==== Deletion (partial sync) ====

    /// Delete a vertex. Fails while edges or faces still use it.
    pub fn sync_vert_del(&mut self, handle: H) -> Result<()> {
        let next = self.state.transition(SyncOp::Delete, "sync_vert_del")?;
        let entry = self
            .live
            .verts
            .entry(&handle)
            .ok_or_else(|| SubsurfError::missing(ElementKind::Vert, &handle))?;
        let v = entry.get();
        let vert = &self.topo.verts[v];
        if !vert.edges.is_empty() || !vert.faces.is_empty() {
            return Err(SubsurfError::DanglingAdjacency {
                kind: ElementKind::Vert,
                handle: format!("{handle:?}"),
                edges: vert.edges.len(),
                faces: vert.faces.len(),
            });
        }

        entry.remove();
        self.topo.free_vert(v, &mut self.alloc);
        self.state = next;
        Ok(())
    }

    /// Delete an edge. Fails while faces still use it.
    pub fn sync_edge_del(&mut self, handle: H) -> Result<()> {
        let next = self.state.transition(SyncOp::Delete, "sync_edge_del")?;
        let entry = self
            .live
            .edges
            .entry(&EdgeKey::Handle(handle))
            .ok_or_else(|| SubsurfError::missing(ElementKind::Edge, &handle))?;
        let e = entry.get();
        let faces = self.topo.edges[e].faces.len();
        if faces > 0 {
            return Err(SubsurfError::DanglingAdjacency {
                kind: ElementKind::Edge,
                handle: format!("{handle:?}"),
                edges: 0,
                faces,
            });
        }

        entry.remove();
        self.topo.unlink_and_free_edge(e, &mut self.alloc);
        self.state = next;
        Ok(())
    }

    /// Delete a face. Its vertices and edges are marked for recomputation.
    pub fn sync_face_del(&mut self, handle: H) -> Result<()> {
        let next = self.state.transition(SyncOp::Delete, "sync_face_del")?;
        let entry = self
            .live
            .faces
            .entry(&handle)
            .ok_or_else(|| SubsurfError::missing(ElementKind::Face, &handle))?;

        let f = entry.remove();
        self.num_grids -= self.topo.faces[f].num_corners();
        self.topo.unlink_and_free_face(f, &mut self.alloc);
        self.state = next;
        Ok(())
    }

    // ==== Processing ====

    /// Close the open pass: drop elements that were not synced again,
    /// refine everything the pass touched and update normals.
    pub fn process_sync(&mut self) -> Result<()> {
        let next = self.state.transition(SyncOp::Process, "process_sync")?;

        let mut removed = [0usize; 3];
        if let Some(mut old) = self.old.take() {
            for (_, f) in old.faces.take_all() {
                self.topo.unlink_and_free_face(f, &mut self.alloc);
                removed[2] += 1;
            }
            for (_, e) in old.edges.take_all() {
                self.topo.unlink_and_free_edge(e, &mut self.alloc);
                removed[1] += 1;
            }
            for (_, v) in old.verts.take_all() {
                self.topo.free_vert(v, &mut self.alloc);
                removed[0] += 1;
            }
        }

        let eff = EffectedSet::collect(&mut self.topo);
        if !eff.is_empty() {
            let simple = self.ifc.simple_subdiv();
            let mut pass = GridPass::new(&mut self.topo, &self.layout, &mut self.scratch, simple);
            pass.refine(&eff);
            pass.normals(&eff);
        }
        self.stamp_ages(&eff);
        self.topo.clear_effected();
        self.state = next;

        log::debug!(
            "processed sync {}: {} verts, {} edges, {} faces recomputed; removed {} verts, {} edges, {} faces",
            self.generation,
            eff.verts.len(),
            eff.edges.len(),
            eff.faces.len(),
            removed[0],
            removed[1],
            removed[2]
        );
        Ok(())
    }

    fn stamp_ages(&mut self, eff: &EffectedSet) {
        let Some(age) = self.age else {
            return;
        };
        let stamp = self.generation as i32;
        let bytes = bytemuck::bytes_of(&stamp);
        let len = bytes.len();

        for &v in &eff.verts {
            self.topo.verts[v].user[age.vert..age.vert + len].copy_from_slice(bytes);
        }
        for &e in &eff.edges {
            self.topo.edges[e].user[age.edge..age.edge + len].copy_from_slice(bytes);
        }
        for &f in &eff.faces {
            self.topo.faces[f].user[age.face..age.face + len].copy_from_slice(bytes);
        }
    }
}
