//! Catmull-Clark refinement of the effected set.
//!
//! Level 1 is seeded from the base mesh (face points, edge points, vertex
//! points), every further level is derived from the one before inside each
//! face's corner grids. After each level the corner-grid borders are copied
//! down from the vertex, edge and center samples so neighbouring corners and
//! faces share identical border values.
//!
//! Stencils follow the usual rules: boundary edges and vertices use the
//! cubic B-spline curve masks, creased edges blend toward those masks by
//! their sharpness, and a vertex with two or more sharp edges (or a seam
//! vertex) is pulled toward its sharp neighbours.

use super::sample::{add, avg4_from, avg4_within, copy, copy_within, lerp_to, midpoint, scale, sub};
use super::{corner_index, face_if_edge, EffectedSet, GridPass};
use crate::mesh::{
    edge_size, grid_size, Arena, Edge, EdgeIndex, Face, FaceIndex, Handle, Layout, Topology, Vert,
    VertIndex,
};

/// Sample of `edge` one step away from `v` at `level`.
#[inline]
fn edge_neighbour<'e, H: Handle>(l: &Layout, edge: &'e Edge<H>, v: VertIndex, level: usize) -> &'e [f32] {
    let off = l.edge_co_from(level, 1, edge.v0 == v);
    &edge.data[off..off + l.layers()]
}

/// Face sample diagonally next to `v`: the face point on the first level,
/// the new grid midpoint nearest the corner afterwards.
#[inline]
fn face_neighbour<'f, H: Handle>(l: &Layout, face: &'f Face<H>, v: VertIndex, level: usize) -> &'f [f32] {
    let off = if level == 0 {
        l.face_center()
    } else {
        let c = (1 << level) - 1;
        l.face_if(level + 1, corner_index(face, v), c, c)
    };
    &face.data[off..off + l.layers()]
}

/// Compute the next-level position of vertex `v` into `out`.
#[allow(clippy::too_many_arguments)]
fn vert_point<H: Handle>(
    l: &Layout,
    verts: &Arena<VertIndex, Vert<H>>,
    edges: &Arena<EdgeIndex, Edge<H>>,
    faces: &Arena<FaceIndex, Face<H>>,
    simple: bool,
    v: VertIndex,
    level: usize,
    q: &mut [f32],
    r: &mut [f32],
    out: &mut [f32],
) {
    let n = l.layers();
    let vert = &verts[v];
    let co = &vert.data[l.vert_co(level)..][..n];

    let mut sharp_count = 0usize;
    let mut all_sharp = true;
    let mut avg_sharpness = 0.0f32;
    let mut seam_edges = 0usize;
    let mut boundary = false;
    for &e in &vert.edges {
        let edge = &edges[e];
        let sharpness = edge.sharpness(level);
        if edge.is_boundary() {
            boundary = true;
            if vert.seam {
                seam_edges += 1;
            }
        }
        if sharpness != 0.0 {
            sharp_count += 1;
            avg_sharpness += sharpness;
        } else {
            all_sharp = false;
        }
    }
    if sharp_count > 0 {
        avg_sharpness = (avg_sharpness / sharp_count as f32).min(1.0);
    }
    let seam = vert.seam && seam_edges >= 2 && seam_edges == vert.edges.len();

    if vert.edges.is_empty() || simple {
        copy(out, co);
    } else if boundary {
        r.fill(0.0);
        let mut num_boundary = 0usize;
        for &e in &vert.edges {
            let edge = &edges[e];
            if edge.is_boundary() {
                add(r, edge_neighbour(l, edge, v, level));
                num_boundary += 1;
            }
        }
        copy(out, co);
        scale(out, 0.75);
        scale(r, 0.25 / num_boundary as f32);
        add(out, r);
    } else {
        q.fill(0.0);
        for &f in &vert.faces {
            add(q, face_neighbour(l, &faces[f], v, level));
        }
        scale(q, 1.0 / vert.faces.len() as f32);

        r.fill(0.0);
        for &e in &vert.edges {
            add(r, edge_neighbour(l, &edges[e], v, level));
        }
        let num_edges = vert.edges.len() as f32;
        scale(r, 1.0 / num_edges);

        copy(out, co);
        scale(out, num_edges - 2.0);
        add(out, q);
        add(out, r);
        scale(out, 1.0 / num_edges);
    }

    // Deeper levels only pull creases for vertices that still have faces.
    let creased = sharp_count > 1 && (level == 0 || !vert.faces.is_empty());
    if creased || seam {
        if seam {
            avg_sharpness = 1.0;
            sharp_count = seam_edges;
            all_sharp = true;
        }

        q.fill(0.0);
        for &e in &vert.edges {
            let edge = &edges[e];
            let counts = if seam {
                edge.is_boundary()
            } else {
                edge.sharpness(level) != 0.0
            };
            if counts {
                add(q, edge_neighbour(l, edge, v, level));
            }
        }
        scale(q, 1.0 / sharp_count as f32);

        if sharp_count != 2 || all_sharp {
            lerp_to(q, co, avg_sharpness);
        }

        // r = 0.75 co + 0.25 q
        copy(r, co);
        scale(r, 0.75);
        scale(q, 0.25);
        add(r, q);

        lerp_to(out, r, avg_sharpness);
    }
}

impl<H: Handle> GridPass<'_, H> {
    /// Refine the effected set from the base mesh up to the finest level.
    pub(crate) fn refine(&mut self, eff: &EffectedSet) {
        self.first_level(eff);
        self.refine_from(eff, 1);
    }

    /// Recompute levels above `level` (`level >= 1`) from the data at `level`.
    pub(crate) fn refine_from(&mut self, eff: &EffectedSet, level: usize) {
        for cur in level..self.layout.levels() {
            self.subdiv_level(eff, cur);
        }
    }

    fn first_level(&mut self, eff: &EffectedSet) {
        let l = self.layout;
        let n = l.layers();
        let simple = self.simple;
        let Topology {
            verts,
            edges,
            faces,
        } = &mut *self.topo;
        let scratch = &mut *self.scratch;
        let (q, r, out) = (
            &mut scratch.q[..n],
            &mut scratch.r[..n],
            &mut scratch.out[..n],
        );

        // face points
        for &f in &eff.faces {
            let face = &mut faces[f];
            let c = l.face_center();
            let center = &mut face.data[c..c + n];
            center.fill(0.0);
            for &v in &face.verts {
                add(center, &verts[v].data[l.vert_co(0)..][..n]);
            }
            scale(center, 1.0 / face.verts.len() as f32);
        }

        // edge points, and the level 0 rows the vertex rule reads
        for &e in &eff.edges {
            let edge = &mut edges[e];
            let v0 = &verts[edge.v0].data[l.vert_co(0)..][..n];
            let v1 = &verts[edge.v1].data[l.vert_co(0)..][..n];
            let sharpness = edge.sharpness(0);

            if edge.is_boundary() || sharpness >= 1.0 {
                midpoint(out, v0, v1);
            } else {
                copy(q, v0);
                add(q, v1);
                for &f in &edge.faces {
                    let c = l.face_center();
                    add(q, &faces[f].data[c..c + n]);
                }
                scale(q, 1.0 / (2.0 + edge.faces.len() as f32));

                midpoint(r, v0, v1);
                copy(out, q);
                lerp_to(out, r, sharpness);
            }

            let w = l.width();
            let (row0, row1) = (l.edge_co(0, 0), l.edge_co(0, 1));
            edge.data[row0..row0 + w].copy_from_slice(&verts[edge.v0].data[l.vert_co(0)..][..w]);
            edge.data[row1..row1 + w].copy_from_slice(&verts[edge.v1].data[l.vert_co(0)..][..w]);

            let dst = l.edge_co(1, 1);
            edge.data[dst..dst + n].copy_from_slice(out);
        }

        // vertex points
        for &v in &eff.verts {
            vert_point(l, verts, edges, faces, simple, v, 0, q, r, out);
            let dst = l.vert_co(1);
            verts[v].data[dst..dst + n].copy_from_slice(out);
        }

        copy_down(l, verts, edges, faces, eff, 1);
    }

    fn subdiv_level(&mut self, eff: &EffectedSet, cur: usize) {
        let l = self.layout;
        let n = l.layers();
        let next = cur + 1;
        let simple = self.simple;
        let gs = grid_size(cur);
        let es = edge_size(cur);
        let Topology {
            verts,
            edges,
            faces,
        } = &mut *self.topo;
        let scratch = &mut *self.scratch;
        let (q, r, out) = (
            &mut scratch.q[..n],
            &mut scratch.r[..n],
            &mut scratch.out[..n],
        );

        // New face midpoints, interior edge midpoints and grid edge midpoints.
        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();
            let data = &mut face.data;

            for s in 0..nc {
                for y in 0..gs - 1 {
                    for x in 0..gs - 1 {
                        let (fx, fy) = (2 * x + 1, 2 * y + 1);
                        avg4_within(
                            data,
                            l.face_if(next, s, fx, fy),
                            [
                                l.face_if(cur, s, x, y),
                                l.face_if(cur, s, x + 1, y),
                                l.face_if(cur, s, x + 1, y + 1),
                                l.face_if(cur, s, x, y + 1),
                            ],
                            n,
                        );
                    }
                }
            }

            for s in 0..nc {
                let s1 = (s + 1) % nc;
                for x in 0..gs - 1 {
                    let fx = 2 * x + 1;
                    avg4_within(
                        data,
                        l.face_ie(next, s, fx),
                        [
                            l.face_ie(cur, s, x),
                            l.face_ie(cur, s, x + 1),
                            l.face_if(next, s1, 1, fx),
                            l.face_if(next, s, fx, 1),
                        ],
                        n,
                    );
                }

                // vertical
                for x in 1..gs - 1 {
                    for y in 0..gs - 1 {
                        let (fx, fy) = (2 * x, 2 * y + 1);
                        avg4_within(
                            data,
                            l.face_if(next, s, fx, fy),
                            [
                                l.face_if(cur, s, x, y),
                                l.face_if(cur, s, x, y + 1),
                                l.face_if(next, s, fx - 1, fy),
                                l.face_if(next, s, fx + 1, fy),
                            ],
                            n,
                        );
                    }
                }

                // horizontal
                for y in 1..gs - 1 {
                    for x in 0..gs - 1 {
                        let (fx, fy) = (2 * x + 1, 2 * y);
                        avg4_within(
                            data,
                            l.face_if(next, s, fx, fy),
                            [
                                l.face_if(cur, s, x, y),
                                l.face_if(cur, s, x + 1, y),
                                l.face_if(next, s, fx, fy - 1),
                                l.face_if(next, s, fx, fy + 1),
                            ],
                            n,
                        );
                    }
                }
            }
        }

        // Exterior edge midpoints.
        for &e in &eff.edges {
            let edge = &mut edges[e];
            let sharpness = edge.sharpness(cur);
            let boundary = edge.is_boundary() || sharpness >= 1.0;

            for x in 0..es - 1 {
                let fx = 2 * x + 1;
                let (c0, c1) = (l.edge_co(cur, x), l.edge_co(cur, x + 1));
                let co0 = &edge.data[c0..c0 + n];
                let co1 = &edge.data[c1..c1 + n];

                if boundary {
                    midpoint(out, co0, co1);
                } else {
                    copy(q, co0);
                    add(q, co1);
                    for &f in &edge.faces {
                        let face = &faces[f];
                        let off = face_if_edge(l, face, e, edge, next, fx, 1);
                        add(q, &face.data[off..off + n]);
                    }
                    scale(q, 1.0 / (2.0 + edge.faces.len() as f32));

                    midpoint(r, co0, co1);
                    copy(out, q);
                    lerp_to(out, r, sharpness);
                }

                let dst = l.edge_co(next, fx);
                edge.data[dst..dst + n].copy_from_slice(out);
            }
        }

        // Vertex points.
        for &v in &eff.verts {
            vert_point(l, verts, edges, faces, simple, v, cur, q, r, out);
            let dst = l.vert_co(next);
            verts[v].data[dst..dst + n].copy_from_slice(out);
        }

        // Exterior edge interior shift.
        for &e in &eff.edges {
            let edge = &mut edges[e];
            let sharpness = edge.sharpness(cur);
            let avg_sharpness = sharpness.min(1.0);

            for x in 1..es - 1 {
                let fx = 2 * x;
                let c = l.edge_co(cur, x);
                let (cp, cn) = (l.edge_co(cur, x - 1), l.edge_co(cur, x + 1));

                if edge.is_boundary() {
                    midpoint(r, &edge.data[cp..cp + n], &edge.data[cn..cn + n]);
                    copy(out, &edge.data[c..c + n]);
                    scale(out, 0.75);
                    scale(r, 0.25);
                    add(out, r);
                } else {
                    q.fill(0.0);
                    copy(r, &edge.data[cp..cp + n]);
                    add(r, &edge.data[cn..cn + n]);
                    for &f in &edge.faces {
                        let face = &faces[f];
                        let a = face_if_edge(l, face, e, edge, next, fx - 1, 1);
                        let b = face_if_edge(l, face, e, edge, next, fx + 1, 1);
                        let m = face_if_edge(l, face, e, edge, cur, x, 1);
                        add(q, &face.data[a..a + n]);
                        add(q, &face.data[b..b + n]);
                        add(r, &face.data[m..m + n]);
                    }
                    let nf = edge.faces.len() as f32;
                    scale(q, 1.0 / (nf * 2.0));
                    scale(r, 1.0 / (2.0 + nf));

                    copy(out, &edge.data[c..c + n]);
                    scale(out, nf);
                    add(out, q);
                    add(out, r);
                    scale(out, 1.0 / (2.0 + nf));

                    if sharpness != 0.0 {
                        // q = (6 co + left + right) / 8
                        copy(q, &edge.data[c..c + n]);
                        scale(q, 6.0);
                        add(q, &edge.data[cp..cp + n]);
                        add(q, &edge.data[cn..cn + n]);
                        scale(q, 1.0 / 8.0);
                        lerp_to(out, q, avg_sharpness);
                    }
                }

                let dst = l.edge_co(next, fx);
                edge.data[dst..dst + n].copy_from_slice(out);
            }
        }

        // Face center, interior grid and interior edge shifts.
        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();
            let ncf = nc as f32;
            let data = &mut face.data;

            q.fill(0.0);
            r.fill(0.0);
            for s in 0..nc {
                let a = l.face_if(next, s, 1, 1);
                let b = l.face_ie(cur, s, 1);
                add(q, &data[a..a + n]);
                add(r, &data[b..b + n]);
            }
            scale(q, 1.0 / ncf);
            scale(r, 1.0 / ncf);

            let c = l.face_center();
            let center = &mut data[c..c + n];
            scale(center, ncf - 2.0);
            add(center, q);
            add(center, r);
            scale(center, 1.0 / ncf);

            for s in 0..nc {
                let s1 = (s + 1) % nc;

                for x in 1..gs - 1 {
                    for y in 1..gs - 1 {
                        let (fx, fy) = (2 * x, 2 * y);
                        avg4_from(
                            q,
                            data,
                            [
                                l.face_if(next, s, fx - 1, fy - 1),
                                l.face_if(next, s, fx + 1, fy - 1),
                                l.face_if(next, s, fx + 1, fy + 1),
                                l.face_if(next, s, fx - 1, fy + 1),
                            ],
                        );
                        avg4_from(
                            r,
                            data,
                            [
                                l.face_if(next, s, fx - 1, fy),
                                l.face_if(next, s, fx + 1, fy),
                                l.face_if(next, s, fx, fy - 1),
                                l.face_if(next, s, fx, fy + 1),
                            ],
                        );
                        // Same storage as (x, y) on the current level.
                        let dst = l.face_if(next, s, fx, fy);
                        let co = &mut data[dst..dst + n];
                        sub(co, q);
                        scale(co, 0.25);
                        add(co, r);
                    }
                }

                for x in 1..gs - 1 {
                    let fx = 2 * x;
                    avg4_from(
                        q,
                        data,
                        [
                            l.face_if(next, s1, 1, fx - 1),
                            l.face_if(next, s1, 1, fx + 1),
                            l.face_if(next, s, fx + 1, 1),
                            l.face_if(next, s, fx - 1, 1),
                        ],
                    );
                    avg4_from(
                        r,
                        data,
                        [
                            l.face_ie(next, s, fx - 1),
                            l.face_ie(next, s, fx + 1),
                            l.face_if(next, s1, 1, fx),
                            l.face_if(next, s, fx, 1),
                        ],
                    );
                    let dst = l.face_ie(next, s, fx);
                    let co = &mut data[dst..dst + n];
                    sub(co, q);
                    scale(co, 0.25);
                    add(co, r);
                }
            }
        }

        copy_down(l, verts, edges, faces, eff, next);
    }
}

/// Seed the borders of every effected corner grid at `level` from the
/// vertex, edge and center samples, so shared borders agree exactly.
fn copy_down<H: Handle>(
    l: &Layout,
    verts: &Arena<VertIndex, Vert<H>>,
    edges: &mut Arena<EdgeIndex, Edge<H>>,
    faces: &mut Arena<FaceIndex, Face<H>>,
    eff: &EffectedSet,
    level: usize,
) {
    let w = l.width();
    let es = edge_size(level);
    let gs = grid_size(level);
    let corner = gs - 1;

    for &e in &eff.edges {
        let edge = &mut edges[e];
        let (first, last) = (l.edge_co(level, 0), l.edge_co(level, es - 1));
        edge.data[first..first + w].copy_from_slice(&verts[edge.v0].data[l.vert_co(level)..][..w]);
        edge.data[last..last + w].copy_from_slice(&verts[edge.v1].data[l.vert_co(level)..][..w]);
    }

    for &f in &eff.faces {
        let face = &mut faces[f];
        let nc = face.num_corners();
        let center = l.face_center();

        for s in 0..nc {
            let vs = face.verts[s];
            let edge = &edges[face.edges[s]];
            let prev = &edges[face.edges[(s + nc - 1) % nc]];
            let data = &mut face.data;

            copy_within(data, l.face_if(level, s, 0, 0), center, w);
            copy_within(data, l.face_ie(level, s, 0), center, w);

            let dst = l.face_if(level, s, corner, corner);
            data[dst..dst + w].copy_from_slice(&verts[vs].data[l.vert_co(level)..][..w]);

            let src = l.edge_co(level, corner);
            let dst = l.face_ie(level, s, corner);
            data[dst..dst + w].copy_from_slice(&edge.data[src..src + w]);

            for x in 1..gs - 1 {
                let ie = l.face_ie(level, s, x);
                copy_within(data, l.face_if(level, s, x, 0), ie, w);
                copy_within(data, l.face_if(level, (s + 1) % nc, 0, x), ie, w);
            }

            for x in 0..gs - 1 {
                let ei = gs - 1 - x;
                let src = l.edge_co_from(level, ei, edge.v0 == vs);
                let dst = l.face_if(level, s, corner, x);
                data[dst..dst + w].copy_from_slice(&edge.data[src..src + w]);

                let src = l.edge_co_from(level, ei, prev.v0 == vs);
                let dst = l.face_if(level, s, x, corner);
                data[dst..dst + w].copy_from_slice(&prev.data[src..src + w]);
            }
        }
    }
}
