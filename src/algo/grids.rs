//! Moving data between face grids and the samples they share.
//!
//! These operations serve callers that edit corner grids directly, such as
//! sculpting on the finest level. Each takes an optional face selection;
//! `None` means every face. Vertices and edges take part only when all of
//! their faces are in the selection.

use super::sample::{add, add_within, copy_sample, copy_within, scale};
use super::{EffectedSet, GridPass};
use crate::error::{Result, SubsurfError};
use crate::mesh::{edge_size, grid_size, BufferAllocator, FaceIndex, Handle, Topology};
use crate::subsurf::Subsurf;

impl<H: Handle, A: BufferAllocator> Subsurf<H, A> {
    fn select_faces(
        &mut self,
        operation: &'static str,
        level: Option<usize>,
        selection: Option<&[FaceIndex]>,
    ) -> Result<EffectedSet> {
        self.require_idle(operation)?;
        if let Some(level) = level {
            if level == 0 || level > self.layout.levels() {
                return Err(SubsurfError::invalid_param(
                    "level",
                    level,
                    "must be between 1 and the level count",
                ));
            }
        }

        let faces: Vec<FaceIndex> = match selection {
            Some(faces) => {
                if let Some(f) = faces.iter().find(|&&f| !self.topo.faces.contains(f)) {
                    return Err(SubsurfError::UnknownFace { index: f.index() });
                }
                faces.to_vec()
            }
            None => self.topo.faces.ids().collect(),
        };
        Ok(EffectedSet::around_faces(&mut self.topo, &faces))
    }

    /// Copy corner-grid borders at `level` out to face centers, interior
    /// edge rows, vertices and edges.
    pub fn update_from_faces(&mut self, level: usize, selection: Option<&[FaceIndex]>) -> Result<()> {
        let eff = self.select_faces("update_from_faces", Some(level), selection)?;
        let l = &self.layout;
        let w = l.width();
        let gs = grid_size(level);
        let corner = gs - 1;
        let Topology {
            verts,
            edges,
            faces,
        } = &mut self.topo;

        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();

            for s in 0..nc {
                let data = &mut face.data;
                copy_within(data, l.face_center(), l.face_if(level, s, 0, 0), w);
                for x in 0..gs {
                    copy_within(data, l.face_ie(level, s, x), l.face_if(level, s, x, 0), w);
                }

                let vs = face.verts[s];
                copy_sample(
                    &mut verts[vs].data,
                    l.vert_co(level),
                    &face.data,
                    l.face_if(level, s, corner, corner),
                    w,
                );

                for x in 0..gs {
                    let ei = gs - 1 - x;

                    let edge = &mut edges[face.edges[s]];
                    let dst = l.edge_co_from(level, ei, edge.v0 == vs);
                    copy_sample(&mut edge.data, dst, &face.data, l.face_if(level, s, corner, x), w);

                    let prev = &mut edges[face.edges[(s + nc - 1) % nc]];
                    let dst = l.edge_co_from(level, ei, prev.v0 == vs);
                    copy_sample(&mut prev.data, dst, &face.data, l.face_if(level, s, x, corner), w);
                }
            }
        }

        self.topo.clear_effected();
        Ok(())
    }

    /// Copy face centers, interior edge rows, vertices and edges at `level`
    /// into the corner-grid borders.
    pub fn update_to_faces(&mut self, level: usize, selection: Option<&[FaceIndex]>) -> Result<()> {
        let eff = self.select_faces("update_to_faces", Some(level), selection)?;
        let l = &self.layout;
        let w = l.width();
        let gs = grid_size(level);
        let corner = gs - 1;
        let Topology {
            verts,
            edges,
            faces,
        } = &mut self.topo;

        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();

            for s in 0..nc {
                let prev_s = (s + nc - 1) % nc;
                let vs = face.verts[s];
                let edge = &edges[face.edges[s]];
                let prev = &edges[face.edges[prev_s]];
                let data = &mut face.data;

                for x in 0..gs {
                    let ei = gs - 1 - x;
                    let src = l.edge_co_from(level, ei, edge.v0 == vs);
                    copy_sample(data, l.face_if(level, s, corner, x), &edge.data, src, w);
                    let src = l.edge_co_from(level, ei, prev.v0 == vs);
                    copy_sample(data, l.face_if(level, s, x, corner), &prev.data, src, w);
                }

                for x in 1..gs - 1 {
                    copy_within(data, l.face_if(level, s, 0, x), l.face_ie(level, prev_s, x), w);
                    copy_within(data, l.face_if(level, s, x, 0), l.face_ie(level, s, x), w);
                }

                copy_within(data, l.face_if(level, s, 0, 0), l.face_center(), w);
                copy_sample(
                    data,
                    l.face_if(level, s, corner, corner),
                    &verts[vs].data,
                    l.vert_co(level),
                    w,
                );
            }
        }

        self.topo.clear_effected();
        Ok(())
    }

    /// Make samples shared between corner grids agree by averaging every
    /// copy at `level`, then writing the average back to all of them.
    pub fn stitch_faces(&mut self, level: usize, selection: Option<&[FaceIndex]>) -> Result<()> {
        let eff = self.select_faces("stitch_faces", Some(level), selection)?;
        let l = &self.layout;
        let (n, w) = (l.layers(), l.width());
        let gs = grid_size(level);
        let es = edge_size(level);
        let corner = gs - 1;
        let Topology {
            verts,
            edges,
            faces,
        } = &mut self.topo;

        for &v in &eff.verts {
            let vert = &mut verts[v];
            if !vert.faces.is_empty() {
                let off = l.vert_co(level);
                vert.data[off..off + n].fill(0.0);
            }
        }
        for &e in &eff.edges {
            let edge = &mut edges[e];
            if !edge.faces.is_empty() {
                for x in 0..es {
                    let off = l.edge_co(level, x);
                    edge.data[off..off + n].fill(0.0);
                }
            }
        }

        // sum
        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();
            let data = &mut face.data;

            data[l.face_center()..l.face_center() + n].fill(0.0);
            for s in 0..nc {
                for x in 0..gs {
                    let off = l.face_ie(level, s, x);
                    data[off..off + n].fill(0.0);
                }
            }

            for s in 0..nc {
                let prev_s = (s + nc - 1) % nc;
                let vs = face.verts[s];
                let (e, prev_e) = (face.edges[s], face.edges[prev_s]);

                add_within(data, l.face_center(), l.face_if(level, s, 0, 0), n);
                let vert = &mut verts[vs];
                if vert.effected {
                    let src = l.face_if(level, s, corner, corner);
                    add(&mut vert.data[l.vert_co(level)..][..n], &data[src..src + n]);
                }
                for x in 1..gs - 1 {
                    add_within(data, l.face_ie(level, s, x), l.face_if(level, s, x, 0), n);
                    add_within(data, l.face_ie(level, prev_s, x), l.face_if(level, s, 0, x), n);
                }
                for x in 0..gs - 1 {
                    let ei = gs - 1 - x;
                    let edge = &mut edges[e];
                    if edge.effected {
                        let dst = l.edge_co_from(level, ei, edge.v0 == vs);
                        let src = l.face_if(level, s, corner, x);
                        add(&mut edge.data[dst..dst + n], &data[src..src + n]);
                    }
                    let prev = &mut edges[prev_e];
                    // x == 0 is the previous edge's midpoint, summed by the previous corner
                    if prev.effected && x != 0 {
                        let dst = l.edge_co_from(level, ei, prev.v0 == vs);
                        let src = l.face_if(level, s, x, corner);
                        add(&mut prev.data[dst..dst + n], &data[src..src + n]);
                    }
                }
            }
        }

        // average
        for &v in &eff.verts {
            let vert = &mut verts[v];
            if !vert.faces.is_empty() {
                let k = 1.0 / vert.faces.len() as f32;
                scale(&mut vert.data[l.vert_co(level)..][..n], k);
            }
        }
        for &e in &eff.edges {
            let edge = &mut edges[e];
            copy_sample(&mut edge.data, l.edge_co(level, 0), &verts[edge.v0].data, l.vert_co(level), w);
            copy_sample(
                &mut edge.data,
                l.edge_co(level, es - 1),
                &verts[edge.v1].data,
                l.vert_co(level),
                w,
            );
            if !edge.faces.is_empty() {
                let k = 1.0 / edge.faces.len() as f32;
                for x in 1..es - 1 {
                    scale(&mut edge.data[l.edge_co(level, x)..][..n], k);
                }
            }
        }

        // write back
        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();
            let data = &mut face.data;

            scale(&mut data[l.face_center()..][..n], 1.0 / nc as f32);
            for s in 0..nc {
                for x in 1..gs - 1 {
                    scale(&mut data[l.face_ie(level, s, x)..][..n], 0.5);
                }
            }

            for s in 0..nc {
                let prev_s = (s + nc - 1) % nc;
                let vs = face.verts[s];
                let edge = &edges[face.edges[s]];
                let prev = &edges[face.edges[prev_s]];

                copy_within(data, l.face_if(level, s, 0, 0), l.face_center(), w);
                copy_sample(
                    data,
                    l.face_if(level, s, corner, corner),
                    &verts[vs].data,
                    l.vert_co(level),
                    w,
                );
                for x in 1..gs - 1 {
                    copy_within(data, l.face_if(level, s, x, 0), l.face_ie(level, s, x), w);
                    copy_within(data, l.face_if(level, s, 0, x), l.face_ie(level, prev_s, x), w);
                }
                for x in 0..gs - 1 {
                    let ei = gs - 1 - x;
                    let src = l.edge_co_from(level, ei, edge.v0 == vs);
                    copy_sample(data, l.face_if(level, s, corner, x), &edge.data, src, w);
                    let src = l.edge_co_from(level, ei, prev.v0 == vs);
                    copy_sample(data, l.face_if(level, s, x, corner), &prev.data, src, w);
                }
                copy_within(data, l.face_ie(level, s, 0), l.face_center(), w);
                copy_within(
                    data,
                    l.face_ie(level, s, corner),
                    l.face_if(level, s, corner, 0),
                    w,
                );
            }
        }

        self.topo.clear_effected();
        Ok(())
    }

    /// Recompute every level above `level` from the data at `level`.
    pub fn update_levels(&mut self, level: usize, selection: Option<&[FaceIndex]>) -> Result<()> {
        let eff = self.select_faces("update_levels", Some(level), selection)?;
        let simple = self.ifc.simple_subdiv();
        GridPass::new(&mut self.topo, &self.layout, &mut self.scratch, simple).refine_from(&eff, level);
        self.topo.clear_effected();
        Ok(())
    }

    /// Recompute finest-level normals. No-op when normals are disabled.
    pub fn update_normals(&mut self, selection: Option<&[FaceIndex]>) -> Result<()> {
        let eff = self.select_faces("update_normals", None, selection)?;
        let simple = self.ifc.simple_subdiv();
        GridPass::new(&mut self.topo, &self.layout, &mut self.scratch, simple).normals(&eff);
        self.topo.clear_effected();
        Ok(())
    }
}
