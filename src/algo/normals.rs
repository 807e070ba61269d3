//! Finest-level normals.
//!
//! Every quad of a corner grid contributes its normal to the four samples it
//! touches and to the samples shared with neighbouring corners. Vertex and
//! edge samples shared between faces are then summed across those faces,
//! so each shared position ends up with one normal.

use nalgebra::Vector3;

use super::{corner_index, face_if_edge, EffectedSet, GridPass};
use crate::mesh::{edge_size, grid_size, Handle, Topology};

/// Lengths at or below this normalize to zero.
const MIN_LENGTH: f32 = 1e-35;

#[inline]
fn read3(data: &[f32], off: usize) -> Vector3<f32> {
    Vector3::new(data[off], data[off + 1], data[off + 2])
}

#[inline]
fn write3(data: &mut [f32], off: usize, v: &Vector3<f32>) {
    data[off..off + 3].copy_from_slice(v.as_slice());
}

#[inline]
fn add3(data: &mut [f32], off: usize, v: &Vector3<f32>) {
    for (d, s) in data[off..off + 3].iter_mut().zip(v.iter()) {
        *d += s;
    }
}

#[inline]
fn normalize(v: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(MIN_LENGTH).unwrap_or_else(Vector3::zeros)
}

impl<H: Handle> GridPass<'_, H> {
    /// Recompute finest-level normals for the effected set. No-op when
    /// normals are disabled.
    pub(crate) fn normals(&mut self, eff: &EffectedSet) {
        let l = self.layout;
        let Some(no) = l.normal_offset() else {
            return;
        };
        let lvl = l.levels();
        let gs = grid_size(lvl);
        let es = edge_size(lvl);
        let last = gs - 1;
        let Topology {
            verts,
            edges,
            faces,
        } = &mut *self.topo;

        let pos = |s: usize, x: usize, y: usize| l.face_if(lvl, s, x, y);
        let nrm = |s: usize, x: usize, y: usize| l.face_if(lvl, s, x, y) + no;
        let zero = Vector3::zeros();

        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();

            // Clear the samples this face owns. Borders are cleared only when
            // the vertex or edge they belong to is recomputed too.
            for s in 0..nc {
                let prev_effected = edges[face.edges[(s + nc - 1) % nc]].effected;
                let edge_effected = edges[face.edges[s]].effected;
                let vert_effected = verts[face.verts[s]].effected;
                let data = &mut face.data;

                for y in 0..last {
                    for x in 0..last {
                        write3(data, nrm(s, x, y), &zero);
                    }
                }
                if prev_effected {
                    for x in 0..last {
                        write3(data, nrm(s, x, last), &zero);
                    }
                }
                if edge_effected {
                    for y in 0..last {
                        write3(data, nrm(s, last, y), &zero);
                    }
                }
                if vert_effected {
                    write3(data, nrm(s, last, last), &zero);
                }
            }

            for s in 0..nc {
                let y_limit = !edges[face.edges[(s + nc - 1) % nc]].effected;
                let x_limit = !edges[face.edges[s]].effected;
                let y_limit_next = x_limit;
                let x_limit_prev = y_limit;
                let vert_effected = verts[face.verts[s]].effected;
                let next = (s + 1) % nc;
                let prev = (s + nc - 1) % nc;
                let data = &mut face.data;

                for y in 0..last {
                    for x in 0..last {
                        let x_plus_ok = !x_limit || x < gs - 2;
                        let y_plus_ok = !y_limit || y < gs - 2;

                        let a = read3(data, pos(s, x, y));
                        let b = read3(data, pos(s, x + 1, y));
                        let c = read3(data, pos(s, x + 1, y + 1));
                        let d = read3(data, pos(s, x, y + 1));
                        let n = normalize((d - b).cross(&(c - a)));

                        add3(data, nrm(s, x, y), &n);
                        if x_plus_ok {
                            add3(data, nrm(s, x + 1, y), &n);
                        }
                        if y_plus_ok {
                            add3(data, nrm(s, x, y + 1), &n);
                        }
                        if x_plus_ok && y_plus_ok && (x < gs - 2 || y < gs - 2 || vert_effected) {
                            add3(data, nrm(s, x + 1, y + 1), &n);
                        }

                        if x == 0 && y == 0 {
                            if !y_limit_next || 1 < last {
                                add3(data, nrm(next, 0, 1), &n);
                            }
                            if !x_limit_prev || 1 < last {
                                add3(data, nrm(prev, 1, 0), &n);
                            }
                            for k in (0..nc).filter(|&k| k != s) {
                                add3(data, nrm(k, 0, 0), &n);
                            }
                        } else if y == 0 {
                            add3(data, nrm(next, 0, x), &n);
                            if !y_limit_next || x < gs - 2 {
                                add3(data, nrm(next, 0, x + 1), &n);
                            }
                        } else if x == 0 {
                            add3(data, nrm(prev, y, 0), &n);
                            if !x_limit_prev || y < gs - 2 {
                                add3(data, nrm(prev, y + 1, 0), &n);
                            }
                        }
                    }
                }
            }
        }

        // Vertex normals: sum over the faces around the vertex. A vertex
        // without faces points away from the origin.
        for &v in &eff.verts {
            let vert = &mut verts[v];
            let mut n = Vector3::zeros();
            for &f in &vert.faces {
                let face = &faces[f];
                n += read3(&face.data, nrm(corner_index(face, v), last, last));
            }
            if vert.faces.is_empty() {
                n = read3(&vert.data, l.vert_co(lvl));
            }
            let n = normalize(n);

            write3(&mut vert.data, l.vert_co(lvl) + no, &n);
            for &f in &vert.faces {
                let face = &mut faces[f];
                let off = nrm(corner_index(face, v), last, last);
                write3(&mut face.data, off, &n);
            }
        }

        // Edge interiors: gather into the last face, then copy back.
        for &e in &eff.edges {
            let edge = &edges[e];
            let Some((&gather, rest)) = edge.faces.split_last() else {
                continue;
            };
            for &f in rest {
                for x in 1..es - 1 {
                    let face = &faces[f];
                    let n = read3(&face.data, face_if_edge(l, face, e, edge, lvl, x, 0) + no);
                    let target = &mut faces[gather];
                    let off = face_if_edge(l, target, e, edge, lvl, x, 0) + no;
                    add3(&mut target.data, off, &n);
                }
            }
            for &f in rest {
                for x in 1..es - 1 {
                    let source = &faces[gather];
                    let n = read3(&source.data, face_if_edge(l, source, e, edge, lvl, x, 0) + no);
                    let face = &mut faces[f];
                    let off = face_if_edge(l, face, e, edge, lvl, x, 0) + no;
                    write3(&mut face.data, off, &n);
                }
            }
        }

        for &f in &eff.faces {
            let face = &mut faces[f];
            let nc = face.num_corners();
            let data = &mut face.data;

            for s in 0..nc {
                let n = read3(data, nrm(s, last, 0));
                write3(data, nrm((s + 1) % nc, 0, last), &n);
            }

            for s in 0..nc {
                for y in 0..gs {
                    for x in 0..gs {
                        let off = nrm(s, x, y);
                        let n = normalize(read3(data, off));
                        write3(data, off, &n);
                    }
                }

                let n = read3(data, nrm(s, 0, 0));
                write3(data, l.face_center() + no, &n);

                for x in 1..last {
                    let n = read3(data, nrm(s, x, 0));
                    write3(data, l.face_ie(lvl, s, x) + no, &n);
                }
            }
        }

        // Edge rows take their normals from the first adjacent face.
        for &e in &eff.edges {
            let edge = &mut edges[e];
            match edge.faces.first() {
                Some(&f) => {
                    let face = &faces[f];
                    for x in 0..es {
                        let n = read3(&face.data, face_if_edge(l, face, e, edge, lvl, x, 0) + no);
                        let off = l.edge_co(lvl, x) + no;
                        write3(&mut edge.data, off, &n);
                    }
                }
                None => {
                    for x in 0..es {
                        let off = l.edge_co(lvl, x) + no;
                        write3(&mut edge.data, off, &zero);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use crate::mesh::MeshInterface;
    use crate::prelude::*;

    fn plane(levels: usize) -> Subsurf<u32> {
        // xyz + normal slot
        let ifc = MeshInterface::new(3).with_width(6);
        let mut ss = Subsurf::new(ifc, levels).unwrap();
        ss.set_normal_calculation(true, 3).unwrap();
        ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();

        // 2x2 quads in the z = 0 plane, counter-clockwise
        ss.init_full_sync().unwrap();
        for y in 0..3u32 {
            for x in 0..3u32 {
                ss.sync_vert(y * 3 + x, &[x as f32, y as f32, 0.0], false).unwrap();
            }
        }
        for y in 0..2u32 {
            for x in 0..2u32 {
                let a = y * 3 + x;
                ss.sync_face(y * 2 + x, &[a, a + 1, a + 4, a + 3]).unwrap();
            }
        }
        ss.process_sync().unwrap();
        ss
    }

    #[test]
    fn test_plane_normals_point_up() {
        let ss = plane(2);
        let up = Vector3::new(0.0, 0.0, 1.0);

        for v in ss.verts() {
            let n = ss.vert_normal(v).unwrap();
            assert!((n - up).norm() < 1e-5, "vertex normal {n:?}");
        }

        let g = ss.grid_size();
        for f in ss.faces() {
            for s in 0..ss.face_num_verts(f) {
                for y in 0..g {
                    for x in 0..g {
                        let n = &ss.face_grid_data(f, s, x, y)[3..6];
                        assert!((n[2] - 1.0).abs() < 1e-5, "grid normal {n:?}");
                    }
                }
            }
        }

        // every edge has at least one face, so its row is filled
        for e in ss.edges() {
            for x in 0..ss.edge_size() {
                let n = &ss.edge_level_data(e, x, 2).unwrap()[3..6];
                assert!((n[2] - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_disabled_leaves_slot_alone() {
        let ifc = MeshInterface::new(3).with_width(6);
        let mut ss: Subsurf<u32> = Subsurf::new(ifc, 1).unwrap();
        ss.init_full_sync().unwrap();
        ss.sync_vert(0, &[3.0, 0.0, 4.0], false).unwrap();
        ss.process_sync().unwrap();

        let v = ss.vert(0).unwrap();
        assert!(!ss.calculates_normals());
        assert_eq!(ss.vert_normal(v), None);
        assert_eq!(&ss.vert_level_data(v, 1).unwrap()[3..6], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lone_vertex_uses_its_direction() {
        let ifc = MeshInterface::new(3).with_width(6);
        let mut ss: Subsurf<u32> = Subsurf::new(ifc, 1).unwrap();
        ss.set_normal_calculation(true, 3).unwrap();
        ss.init_full_sync().unwrap();
        ss.sync_vert(0, &[3.0, 0.0, 4.0], false).unwrap();
        ss.process_sync().unwrap();

        let n = ss.vert_normal(ss.vert(0).unwrap()).unwrap();
        assert!((n - Vector3::new(0.6, 0.0, 0.8)).norm() < 1e-6);
    }
}
