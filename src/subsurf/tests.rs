use super::*;
use crate::error::ErrorKind;
use crate::mesh::PoolAllocator;

fn quad(levels: usize) -> Subsurf<u32> {
    let mut ss = Subsurf::new(MeshInterface::new(3), levels).unwrap();
    ss.init_full_sync().unwrap();
    let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    for (i, p) in pts.iter().enumerate() {
        ss.sync_vert(i as u32, p, false).unwrap();
    }
    for i in 0..4u32 {
        ss.sync_edge(i, i, (i + 1) % 4, 0.0).unwrap();
    }
    ss.sync_face(0, &[0, 1, 2, 3]).unwrap();
    ss.process_sync().unwrap();
    ss
}

/// Full sync of an `n` x `n` vertex lattice of quads, edges auto-created.
fn sync_lattice<A: BufferAllocator>(ss: &mut Subsurf<u32, A>, n: u32, lift: impl Fn(u32) -> f32) {
    ss.init_full_sync().unwrap();
    for y in 0..n {
        for x in 0..n {
            let i = y * n + x;
            ss.sync_vert(i, &[x as f32, y as f32, lift(i)], false).unwrap();
        }
    }
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let a = y * n + x;
            ss.sync_face(y * (n - 1) + x, &[a, a + 1, a + n + 1, a + n])
                .unwrap();
        }
    }
    ss.process_sync().unwrap();
}

fn lattice(n: u32, levels: usize, lift: impl Fn(u32) -> f32) -> Subsurf<u32> {
    let mut ss = Subsurf::new(MeshInterface::new(3), levels).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    sync_lattice(&mut ss, n, lift);
    ss
}

fn bumps(i: u32) -> f32 {
    ((i * 7) % 5) as f32 * 0.1
}

/// Every float of every element buffer, in arena order.
fn snapshot<A: BufferAllocator>(ss: &Subsurf<u32, A>) -> Vec<f32> {
    let mut out = Vec::new();
    for v in ss.verts() {
        out.extend_from_slice(ss.get_vert(v).data());
    }
    for e in ss.edges() {
        out.extend_from_slice(ss.get_edge(e).data());
    }
    for f in ss.faces() {
        out.extend_from_slice(ss.get_face(f).data());
    }
    out
}

fn assert_close(a: &[f32], b: &[f32], eps: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() < eps, "float {i}: {x} vs {y}");
    }
}

// ==== Counts and sizes ====

#[test]
fn test_quad_counts_level_one() {
    let ss = quad(1);

    assert_eq!(ss.num_verts(), 4);
    assert_eq!(ss.num_edges(), 4);
    assert_eq!(ss.num_faces(), 1);
    assert_eq!(ss.num_grids(), 4);

    assert_eq!(ss.edge_size(), 3);
    assert_eq!(ss.grid_size(), 2);
    assert_eq!(ss.num_final_verts(), 9);
    assert_eq!(ss.num_final_edges(), 12);
    assert_eq!(ss.num_final_faces(), 4);

    assert_eq!(ss.edge_level_size(0), Some(2));
    assert_eq!(ss.edge_level_size(2), None);
    assert_eq!(ss.grid_level_size(0), None);
    assert_eq!(ss.grid_level_size(1), Some(2));
}

#[test]
fn test_grid_count_mixed_polygons() {
    let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 2).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    ss.init_full_sync().unwrap();
    let pts = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [2.0, 0.5, 0.0],
        [-1.0, 0.0, 0.0],
        [-1.5, 1.0, 0.0],
        [-0.5, 2.0, 0.0],
    ];
    for (i, p) in pts.iter().enumerate() {
        ss.sync_vert(i as u32, p, false).unwrap();
    }
    ss.sync_face(0, &[0, 1, 2, 3]).unwrap();
    ss.sync_face(1, &[1, 4, 2]).unwrap();
    ss.sync_face(2, &[5, 0, 3, 7, 6]).unwrap();
    ss.process_sync().unwrap();

    assert_eq!(ss.num_grids(), 12);
    assert_eq!(ss.num_final_faces(), 12 * 4);
    assert_eq!(ss.num_edges(), 10);
}

// ==== Refinement scenarios ====

#[test]
fn test_boundary_triangle() {
    let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 1).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    ss.init_full_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
    ss.sync_vert(1, &[1.0, 0.0, 0.0], false).unwrap();
    ss.sync_vert(2, &[0.0, 1.0, 0.0], false).unwrap();
    let f = ss.sync_face(0, &[0, 1, 2]).unwrap();
    ss.process_sync().unwrap();

    assert_eq!(ss.num_final_verts(), 7);
    assert_eq!(ss.num_final_faces(), 3);

    let c = ss.face_center_data(f);
    assert_close(c, &[1.0 / 3.0, 1.0 / 3.0, 0.0], 1e-6);

    // boundary corners slide along the curve mask
    let v0 = ss.vert(0).unwrap();
    assert_close(ss.vert_data(v0), &[0.125, 0.125, 0.0], 1e-6);

    // boundary edges split at their midpoints
    let e = ss.edges().find(|&e| ss.edge_verts(e) == [ss.vert(0).unwrap(), ss.vert(1).unwrap()]);
    let e = e.unwrap();
    assert_close(ss.edge_data(e, 1), &[0.5, 0.0, 0.0], 1e-6);
}

/// Two quads folded along the shared edge `1-4`, which gets handle 100.
fn fold(crease: f32) -> Subsurf<u32> {
    let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 1).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    ss.init_full_sync().unwrap();
    let pts = [
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0],
        [2.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
        [1.0, 1.0, 0.0],
        [2.0, 1.0, 1.0],
    ];
    for (i, p) in pts.iter().enumerate() {
        ss.sync_vert(i as u32, p, false).unwrap();
    }
    ss.sync_edge(100, 1, 4, crease).unwrap();
    ss.sync_face(0, &[0, 1, 4, 3]).unwrap();
    ss.sync_face(1, &[1, 2, 5, 4]).unwrap();
    ss.process_sync().unwrap();
    ss
}

#[test]
fn test_crease_pulls_edge_point_to_midpoint() {
    let mid_z = |ss: &Subsurf<u32>| {
        let e = ss.edge(100).unwrap();
        ss.edge_level_data(e, 1, 1).unwrap()[2]
    };

    // smooth: average of endpoints and the two face centers
    assert!((mid_z(&fold(0.0)) - 0.25).abs() < 1e-6);
    assert!((mid_z(&fold(0.5)) - 0.125).abs() < 1e-6);
    assert!(mid_z(&fold(1.0)).abs() < 1e-6);
    assert!(mid_z(&fold(3.0)).abs() < 1e-6);
}

// ==== Resync ====

#[test]
fn test_unchanged_resync_is_idempotent() {
    let mut ss = lattice(3, 2, bumps);
    let before = snapshot(&ss);
    let v4 = ss.vert(4).unwrap();
    let generation = ss.generation();

    sync_lattice(&mut ss, 3, bumps);

    assert_eq!(ss.generation(), generation + 1);
    assert_eq!(ss.vert(4), Some(v4));
    assert_eq!(snapshot(&ss), before);
    assert!(ss.verts().all(|v| !ss.get_vert(v).is_changed()));
}

#[test]
fn test_move_and_restore_round_trip() {
    let mut ss = lattice(3, 2, bumps);
    let before = snapshot(&ss);

    sync_lattice(&mut ss, 3, |i| if i == 4 { 2.0 } else { bumps(i) });
    assert!(ss.get_vert(ss.vert(4).unwrap()).is_changed());
    sync_lattice(&mut ss, 3, bumps);

    assert_close(&snapshot(&ss), &before, 1e-6);
}

#[test]
fn test_full_sync_drops_unsynced_elements() {
    let mut ss = quad(1);
    ss.init_full_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
    ss.sync_vert(1, &[1.0, 0.0, 0.0], false).unwrap();
    ss.sync_edge(0, 0, 1, 0.0).unwrap();
    ss.process_sync().unwrap();

    assert_eq!(ss.num_verts(), 2);
    assert_eq!(ss.num_edges(), 1);
    assert_eq!(ss.num_faces(), 0);
    assert_eq!(ss.num_grids(), 0);
    assert_eq!(ss.vert(2), None);
    assert_eq!(ss.face(0), None);
    assert!(ss.vert_edges(ss.vert(0).unwrap()).len() == 1);
    assert!(ss.vert_faces(ss.vert(0).unwrap()).is_empty());
}

#[test]
fn test_partial_move_matches_fresh_sync() {
    let moved = |i| if i == 0 { 0.7 } else { bumps(i) };

    let mut ss = lattice(4, 3, bumps);
    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.7], false).unwrap();
    ss.process_sync().unwrap();

    let fresh = lattice(4, 3, moved);
    assert_close(&snapshot(&ss), &snapshot(&fresh), 1e-5);
}

#[test]
fn test_partial_face_replacement() {
    let mut ss = lattice(3, 2, bumps);

    ss.init_partial_sync().unwrap();
    ss.sync_face_del(0).unwrap();
    ss.sync_face(0, &[0, 1, 4, 3]).unwrap();
    ss.process_sync().unwrap();

    assert_eq!(ss.num_faces(), 4);
    assert_eq!(ss.num_grids(), 16);
    let f = ss.face(0).unwrap();
    assert_eq!(ss.face_num_verts(f), 4);
    let corners: Vec<u32> = ss.face_verts(f).iter().map(|&v| ss.get_vert(v).handle()).collect();
    assert_eq!(corners, vec![0, 1, 4, 3]);

    let fresh = lattice(3, 2, bumps);
    let g = fresh.grid_size();
    let cf = fresh.face(0).unwrap();
    for s in 0..4 {
        for y in 0..g {
            for x in 0..g {
                assert_close(ss.face_grid_data(f, s, x, y), fresh.face_grid_data(cf, s, x, y), 1e-5);
            }
        }
    }
}

// ==== Deletion ====

#[test]
fn test_edge_delete_blocked_by_faces() {
    let mut ss = quad(1);
    ss.init_partial_sync().unwrap();

    let err = ss.sync_edge_del(0).unwrap_err();
    assert!(matches!(err, SubsurfError::DanglingAdjacency { faces: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(ss.sync_state(), SyncState::Partial);
    assert_eq!(ss.num_edges(), 4);

    let err = ss.sync_vert_del(0).unwrap_err();
    assert!(matches!(err, SubsurfError::DanglingAdjacency { edges: 2, faces: 1, .. }));

    ss.sync_face_del(0).unwrap();
    ss.sync_edge_del(0).unwrap();
    ss.sync_edge_del(3).unwrap();
    ss.sync_vert_del(0).unwrap();
    ss.process_sync().unwrap();

    assert_eq!(ss.num_faces(), 0);
    assert_eq!(ss.num_edges(), 2);
    assert_eq!(ss.num_verts(), 3);
    assert_eq!(ss.num_grids(), 0);
    assert_eq!(ss.vert(0), None);
    assert_eq!(ss.edge(0), None);
}

#[test]
fn test_edge_endpoints_locked_by_faces() {
    let mut ss = quad(1);
    ss.init_partial_sync().unwrap();

    let err = ss.sync_edge(0, 0, 2, 0.0).unwrap_err();
    assert!(matches!(err, SubsurfError::EdgeEndpointsInUse { faces: 1, .. }));

    // crease edits on the same endpoints are fine
    let e = ss.sync_edge(0, 0, 1, 2.0).unwrap();
    ss.process_sync().unwrap();
    assert_eq!(ss.get_edge(e).crease(), 2.0);
}

#[test]
fn test_swapped_edge_endpoints_keep_edge() {
    let mut ss = quad(1);
    let e = ss.edge(0).unwrap();
    let f = ss.face(0).unwrap();
    let (v0, v1) = (ss.vert(0).unwrap(), ss.vert(1).unwrap());
    let before = snapshot(&ss);

    ss.init_partial_sync().unwrap();
    assert_eq!(ss.sync_edge(0, 1, 0, 0.0).unwrap(), e);
    ss.process_sync().unwrap();
    assert_eq!(ss.face(0), Some(f));
    assert_eq!(ss.edge_verts(e), [v0, v1]);
    assert_eq!(snapshot(&ss), before);

    // a full resync naming the edge the other way round reuses edge and face
    ss.init_full_sync().unwrap();
    let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    for (i, p) in pts.iter().enumerate() {
        ss.sync_vert(i as u32, p, false).unwrap();
    }
    assert_eq!(ss.sync_edge(0, 1, 0, 0.0).unwrap(), e);
    for i in 1..4u32 {
        ss.sync_edge(i, i, (i + 1) % 4, 0.0).unwrap();
    }
    assert_eq!(ss.sync_face(0, &[0, 1, 2, 3]).unwrap(), f);
    ss.process_sync().unwrap();
    assert_eq!(ss.edge_verts(e), [v0, v1]);
    assert_eq!(snapshot(&ss), before);

    // swapped endpoints with a new crease only update the crease
    ss.init_partial_sync().unwrap();
    assert_eq!(ss.sync_edge(0, 1, 0, 1.0).unwrap(), e);
    ss.process_sync().unwrap();
    assert_eq!(ss.get_edge(e).crease(), 1.0);
    assert_eq!(ss.face(0), Some(f));
}

#[test]
fn test_seam_corner_stays_pinned() {
    let mut ss = quad(2);
    let v = ss.vert(0).unwrap();
    let f = ss.face(0).unwrap();
    let g = ss.grid_size();
    assert_close(ss.vert_level_data(v, 1).unwrap(), &[0.125, 0.125, 0.0], 1e-6);

    // only the seam flag changes
    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], true).unwrap();
    ss.process_sync().unwrap();

    assert!(ss.get_vert(v).is_seam());
    assert!(ss.get_vert(v).is_changed());
    for level in 0..=2 {
        assert_close(ss.vert_level_data(v, level).unwrap(), &[0.0, 0.0, 0.0], 1e-6);
    }
    assert_close(ss.face_grid_data(f, 0, g - 1, g - 1), &[0.0, 0.0, 0.0], 1e-6);

    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
    ss.process_sync().unwrap();
    assert!(ss.get_vert(v).is_changed());
    assert_close(ss.vert_level_data(v, 1).unwrap(), &[0.125, 0.125, 0.0], 1e-6);

    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
    ss.process_sync().unwrap();
    assert!(!ss.get_vert(v).is_changed());
}

#[test]
#[should_panic(expected = "edge sample 5 out of range")]
fn test_edge_normal_rejects_out_of_range_sample() {
    let ss = quad(1);
    let e = ss.edge(0).unwrap();
    let _ = ss.edge_normal(e, 5);
}

// ==== Protocol errors ====

#[test]
fn test_calls_out_of_order_are_rejected() {
    let mut ss = quad(1);
    let before = snapshot(&ss);

    let err = ss.sync_vert(9, &[0.0, 0.0, 0.0], false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSyncState);
    assert!(ss.process_sync().is_err());
    assert!(ss.sync_face_del(0).is_err());

    ss.init_full_sync().unwrap();
    assert!(ss.init_partial_sync().is_err());
    assert!(ss.init_full_sync().is_err());
    assert!(ss.sync_face_del(0).is_err());
    assert!(ss.set_level_count(2).is_err());
    assert!(ss.set_normal_calculation(false, 0).is_err());
    assert!(ss.update_normals(None).is_err());

    for i in 0..4u32 {
        let p = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]][i as usize];
        ss.sync_vert(i, &p, false).unwrap();
    }
    ss.sync_edge(0, 0, 1, 0.0).unwrap();
    let err = ss.sync_vert(7, &[0.0, 0.0, 0.0], false).unwrap_err();
    assert!(matches!(
        err,
        SubsurfError::InvalidSyncState {
            operation: "sync_vert",
            state: SyncState::Edge
        }
    ));
    assert_eq!(ss.sync_state(), SyncState::Edge);
    for i in 1..4u32 {
        ss.sync_edge(i, i, (i + 1) % 4, 0.0).unwrap();
    }
    ss.sync_face(0, &[0, 1, 2, 3]).unwrap();
    assert!(ss.sync_edge(9, 0, 2, 0.0).is_err());
    ss.process_sync().unwrap();

    assert_eq!(ss.sync_state(), SyncState::None);
    assert_eq!(snapshot(&ss), before);
}

#[test]
fn test_bad_arguments_leave_context_unchanged() {
    let mut ss = quad(1);
    ss.init_partial_sync().unwrap();

    let err = ss.sync_edge(10, 0, 42, 0.0).unwrap_err();
    assert!(matches!(err, SubsurfError::MissingHandle { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert!(ss.sync_edge(10, 0, 0, 0.0).is_err());
    assert!(ss.sync_edge(10, 0, 2, -1.0).is_err());
    assert!(ss.sync_edge(10, 0, 2, f32::NAN).is_err());

    let err = ss.sync_face(1, &[0, 1, 42]).unwrap_err();
    assert!(matches!(err, SubsurfError::MissingHandle { .. }));
    let err = ss.sync_face(1, &[0, 1]).unwrap_err();
    assert!(matches!(err, SubsurfError::MalformedFace { .. }));
    let err = ss.sync_face(1, &[0, 1, 2, 1]).unwrap_err();
    assert!(matches!(err, SubsurfError::MalformedFace { .. }));
    // 0-2 is a diagonal with no edge, and auto-creation is off
    let err = ss.sync_face(1, &[0, 1, 2]).unwrap_err();
    assert!(matches!(err, SubsurfError::MalformedFace { .. }));

    let err = ss.sync_vert(5, &[0.0, 1.0], false).unwrap_err();
    assert_eq!(
        err,
        SubsurfError::InvalidSample {
            expected: 3,
            actual: 2
        }
    );

    assert!(ss.sync_vert_del(42).is_err());
    assert!(ss.sync_edge_del(42).is_err());
    assert!(ss.sync_face_del(42).is_err());

    ss.process_sync().unwrap();
    assert_eq!(ss.num_verts(), 4);
    assert_eq!(ss.num_edges(), 4);
    assert_eq!(ss.num_faces(), 1);
    assert_eq!(ss.num_grids(), 4);
}

#[test]
fn test_duplicate_handles_in_full_sync() {
    let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 1).unwrap();
    ss.init_full_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 0.0], false).unwrap();
    ss.sync_vert(1, &[1.0, 0.0, 0.0], false).unwrap();

    let err = ss.sync_vert(0, &[5.0, 0.0, 0.0], false).unwrap_err();
    assert!(matches!(err, SubsurfError::DuplicateHandle { .. }));
    assert_eq!(ss.vert_level_data(ss.vert(0).unwrap(), 0).unwrap(), &[0.0, 0.0, 0.0]);

    ss.sync_edge(0, 0, 1, 0.0).unwrap();
    assert!(matches!(
        ss.sync_edge(0, 1, 0, 0.0),
        Err(SubsurfError::DuplicateHandle { .. })
    ));
    ss.process_sync().unwrap();
    assert_eq!(ss.num_edges(), 1);
}

#[test]
fn test_configuration_validation() {
    let mut ss: Subsurf<u32> = Subsurf::new(MeshInterface::new(3), 1).unwrap();

    assert!(Subsurf::<u32>::new(MeshInterface::new(3), 0).is_err());
    assert!(Subsurf::<u32>::new(MeshInterface::new(3), MAX_LEVELS + 1).is_err());
    assert!(ss.set_normal_calculation(true, 3).is_err());
    assert!(ss.set_age_tracking(true, 0, 0, 0).is_err());
    assert!(ss.set_edge_auto_creation(true, -1.0, &[]).is_err());
    assert!(ss.set_edge_auto_creation(true, 0.0, &[1]).is_err());

    let ifc = MeshInterface::new(2).with_width(5);
    let mut flat: Subsurf<u32> = Subsurf::new(ifc, 1).unwrap();
    assert!(flat.set_normal_calculation(true, 2).is_err());
}

#[test]
fn test_huge_offsets_are_rejected() {
    let ifc = MeshInterface::new(3)
        .with_width(6)
        .with_vert_user_size(4)
        .with_edge_user_size(4)
        .with_face_user_size(4);
    let mut ss: Subsurf<u32> = Subsurf::new(ifc, 1).unwrap();

    for off in [usize::MAX, usize::MAX - 1, usize::MAX - 3] {
        assert!(matches!(
            ss.set_normal_calculation(true, off),
            Err(SubsurfError::InvalidParameter {
                name: "normal_offset",
                ..
            })
        ));
        assert!(matches!(
            ss.set_age_tracking(true, off, 0, 0),
            Err(SubsurfError::InvalidParameter {
                name: "vert_offset",
                ..
            })
        ));
        assert!(matches!(
            ss.set_age_tracking(true, 0, off, 0),
            Err(SubsurfError::InvalidParameter {
                name: "edge_offset",
                ..
            })
        ));
        assert!(matches!(
            ss.set_age_tracking(true, 0, 0, off),
            Err(SubsurfError::InvalidParameter {
                name: "face_offset",
                ..
            })
        ));
    }
    assert!(!ss.calculates_normals());
    assert_eq!(ss.age_tracking(), None);

    ss.set_normal_calculation(true, 3).unwrap();
    ss.set_age_tracking(true, 0, 0, 0).unwrap();
}

// ==== Auto edges and payloads ====

#[test]
fn test_auto_edges_revived_across_full_sync() {
    let ifc = MeshInterface::new(3).with_edge_user_size(4);
    let mut ss: Subsurf<u32> = Subsurf::new(ifc, 2).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[7, 1]).unwrap();
    sync_lattice(&mut ss, 2, |_| 0.0);

    assert_eq!(ss.num_edges(), 4);
    assert!(ss.edge_keys().all(|(key, _)| key.is_auto()));
    assert_eq!(ss.edge(0), None);
    let mut first: Vec<EdgeIndex> = ss.edges().collect();
    for &e in &first {
        assert_eq!(ss.edge_user_data(e), &[7, 1, 0, 0]);
        assert_eq!(ss.edge_faces(e).len(), 1);
    }

    sync_lattice(&mut ss, 2, |_| 0.0);
    let mut second: Vec<EdgeIndex> = ss.edges().collect();
    first.sort_unstable();
    second.sort_unstable();
    assert_eq!(first, second);
    assert_eq!(ss.num_edges(), 4);
}

#[test]
fn test_user_data_round_trip() {
    let ifc = MeshInterface::new(3)
        .with_vert_user_size(2)
        .with_face_user_size(8);
    let mut ss: Subsurf<u32> = Subsurf::new(ifc, 1).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    sync_lattice(&mut ss, 2, |_| 0.0);

    let v = ss.vert(3).unwrap();
    ss.vert_user_data_mut(v).copy_from_slice(&[4, 2]);
    let f = ss.face(0).unwrap();
    ss.face_user_data_mut(f)[7] = 9;

    // payloads survive an unchanged resync
    sync_lattice(&mut ss, 2, |_| 0.0);
    assert_eq!(ss.vert_user_data(v), &[4, 2]);
    assert_eq!(ss.face_user_data(f)[7], 9);
    assert!(ss.edge_user_data(ss.edges().next().unwrap()).is_empty());
}

#[test]
fn test_age_tracking() {
    let ifc = MeshInterface::new(3)
        .with_vert_user_size(4)
        .with_edge_user_size(4)
        .with_face_user_size(8);
    let mut ss: Subsurf<u32> = Subsurf::new(ifc, 2).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    assert_eq!(ss.vert_age(VertIndex::new(0)), None);
    ss.set_age_tracking(true, 0, 0, 4).unwrap();

    sync_lattice(&mut ss, 4, bumps);
    assert!(ss.verts().all(|v| ss.vert_age(v) == Some(0)));
    assert!(ss.faces().all(|f| ss.face_age(f) == Some(0)));

    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.0, 0.0, 1.5], false).unwrap();
    ss.process_sync().unwrap();

    let near = ss.vert(0).unwrap();
    let far = ss.vert(15).unwrap();
    assert_eq!(ss.vert_age(near), Some(0));
    assert_eq!(ss.vert_age(far), Some(1));
    assert!(ss.get_vert(near).is_changed());
    assert!(!ss.get_vert(far).is_changed());
    assert_eq!(ss.face_age(ss.face(0).unwrap()), Some(0));
    assert_eq!(ss.face_age(ss.face(8).unwrap()), Some(1));

    let e = ss.vert_edges(near)[0];
    assert_eq!(ss.edge_age(e), Some(0));
}

// ==== Allocation and teardown ====

#[test]
fn test_pool_allocator_reuses_buffers() {
    let mut ss: Subsurf<u32, PoolAllocator> =
        Subsurf::with_allocator(MeshInterface::new(3), 2, PoolAllocator::new()).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    sync_lattice(&mut ss, 3, bumps);
    assert_eq!(ss.allocator().reused(), 0);

    ss.init_partial_sync().unwrap();
    ss.sync_face_del(3).unwrap();
    ss.sync_face(3, &[4, 5, 8, 7]).unwrap();
    ss.process_sync().unwrap();
    assert_eq!(ss.allocator().reused(), 1);

    // an empty full sync frees everything into the pool
    ss.init_full_sync().unwrap();
    ss.process_sync().unwrap();
    assert_eq!(ss.num_verts(), 0);
    assert_eq!(ss.num_edges(), 0);
    assert_eq!(ss.num_faces(), 0);
    assert_eq!(ss.allocator().pooled(), 9 + 12 + 4);

    let pool = ss.free();
    assert_eq!(pool.pooled(), 0);
}

#[test]
fn test_free_with_open_sync() {
    let mut ss = quad(1);
    ss.init_partial_sync().unwrap();
    ss.sync_vert(0, &[0.5, 0.5, 0.5], false).unwrap();
    let _ = ss.free();
}

#[test]
fn test_set_level_count_drops_elements() {
    let mut ss = quad(1);

    ss.set_level_count(1).unwrap();
    assert_eq!(ss.num_faces(), 1);

    ss.set_level_count(3).unwrap();
    assert_eq!(ss.level_count(), 3);
    assert_eq!(ss.grid_size(), 5);
    assert_eq!(ss.num_verts(), 0);
    assert_eq!(ss.num_edges(), 0);
    assert_eq!(ss.num_faces(), 0);
    assert_eq!(ss.num_grids(), 0);
    assert_eq!(ss.vert(0), None);

    assert!(ss.set_level_count(0).is_err());
    assert!(ss.set_level_count(MAX_LEVELS + 1).is_err());
    assert_eq!(ss.level_count(), 3);

    // the next full sync starts from scratch at the new depth
    let mut ss = quad(1);
    ss.set_level_count(2).unwrap();
    ss.set_edge_auto_creation(true, 0.0, &[]).unwrap();
    sync_lattice(&mut ss, 2, |_| 0.0);
    assert_eq!(ss.num_final_faces(), 16);
}
