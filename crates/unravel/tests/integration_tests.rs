//! Integration tests for copperweave-unravel.

use copperweave_core::{Point, StepSolver};
use copperweave_mesh::{AssignedPoint, CapacityMesh, CapacityMeshNode, NodePortSegment, SegmentSet};
use copperweave_unravel::{
    apply_operation, candidate_full_hash, candidate_hash, find_issues, PointModifications,
    SectionBuilder, UnravelConfig, UnravelIssue, UnravelOperation, UnravelSolver,
};

fn cell(id: &str, cx: f64, cy: f64, width: f64, height: f64) -> CapacityMeshNode {
    CapacityMeshNode {
        id: id.to_string(),
        center: Point::new(cx, cy),
        width,
        height,
        available_z: vec![0, 1],
        depth: 1,
        contains_obstacle: false,
        completely_inside_obstacle: false,
        contains_target: false,
        target_connection_name: None,
    }
}

fn assigned(name: &str, x: f64, y: f64, z: u8) -> AssignedPoint {
    AssignedPoint {
        connection_name: name.to_string(),
        x,
        y,
        z,
    }
}

fn vertical_segment(
    id: &str,
    a: &str,
    b: &str,
    x: f64,
    y0: f64,
    y1: f64,
    points: Vec<AssignedPoint>,
) -> NodePortSegment {
    NodePortSegment {
        id: id.to_string(),
        node_ids: [a.to_string(), b.to_string()],
        start: Point::new(x, y0),
        end: Point::new(x, y1),
        assigned_points: points,
    }
}

/// Three cells in a row; two nets cross inside the middle cell on z = 0.
fn crossing_fixture() -> (CapacityMesh, SegmentSet) {
    let mesh = CapacityMesh::new(vec![
        cell("cn0", -10.0, 0.0, 10.0, 10.0),
        cell("cn1", 0.0, 0.0, 10.0, 10.0),
        cell("cn2", 10.0, 0.0, 10.0, 10.0),
    ]);
    let segments = SegmentSet::from_segments(vec![
        vertical_segment(
            "seg0",
            "cn0",
            "cn1",
            -5.0,
            -5.0,
            5.0,
            vec![assigned("net1", -5.0, 2.0, 0), assigned("net2", -5.0, -2.0, 0)],
        ),
        vertical_segment(
            "seg1",
            "cn1",
            "cn2",
            5.0,
            -5.0,
            5.0,
            vec![assigned("net1", 5.0, -2.0, 0), assigned("net2", 5.0, 2.0, 0)],
        ),
    ]);
    (mesh, segments)
}

mod crossing_resolution {
    use super::*;

    #[test]
    fn test_initial_candidate_has_one_crossing() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let solver = UnravelSolver::new(section, UnravelConfig::new());

        let original = solver.original_candidate();
        assert_eq!(original.issues.len(), 1);
        assert!(matches!(
            original.issues[0],
            UnravelIssue::SameLayerCrossing { .. }
        ));
        assert!(original.g > 0.0);
        assert!(original.point_modifications.is_empty());
    }

    #[test]
    fn test_solver_untangles_the_crossing() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let mut solver = UnravelSolver::new(section, UnravelConfig::new());

        solver.solve();

        assert!(solver.solved());
        let best = solver.best_candidate();
        assert!(best.issues.is_empty());
        assert_eq!(best.f, 0.0);
        assert!(!best.point_modifications.is_empty());
    }

    #[test]
    fn test_modifications_stay_on_mutable_segments() {
        // Crossing sits in cn2, between a mutable segment (seg1, touching
        // the mutable ring) and a frozen one (seg2).
        let mesh = CapacityMesh::new(vec![
            cell("cn0", 0.0, 0.0, 10.0, 10.0),
            cell("cn1", 10.0, 0.0, 10.0, 10.0),
            cell("cn2", 20.0, 0.0, 10.0, 10.0),
            cell("cn3", 30.0, 0.0, 10.0, 10.0),
        ]);
        let segments = SegmentSet::from_segments(vec![
            vertical_segment("seg0", "cn0", "cn1", 5.0, -5.0, 5.0, vec![]),
            vertical_segment(
                "seg1",
                "cn1",
                "cn2",
                15.0,
                -5.0,
                5.0,
                vec![assigned("net1", 15.0, 2.0, 0), assigned("net2", 15.0, -2.0, 0)],
            ),
            vertical_segment(
                "seg2",
                "cn2",
                "cn3",
                25.0,
                -5.0,
                5.0,
                vec![assigned("net1", 25.0, -2.0, 0), assigned("net2", 25.0, 2.0, 0)],
            ),
        ]);

        let section = SectionBuilder::new("cn0", &mesh, &segments)
            .with_mutable_hops(1)
            .build()
            .unwrap();
        assert!(section.is_segment_mutable("seg1"));
        assert!(!section.is_segment_mutable("seg2"));

        let mut solver = UnravelSolver::new(section, UnravelConfig::new());
        solver.solve();

        let best = solver.best_candidate();
        assert!(best.issues.is_empty(), "swap on seg1 resolves the crossing");
        for id in best.point_modifications.keys() {
            let segment_id = &solver.section().point(id).segment_id;
            assert!(
                solver.section().is_segment_mutable(segment_id),
                "modification touches frozen segment {}",
                segment_id
            );
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let (mesh, segments) = crossing_fixture();

        let run = || {
            let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
            let mut solver = UnravelSolver::new(section, UnravelConfig::new());
            solver.solve();
            (
                solver.iterations(),
                solver.best_candidate().f,
                solver.best_candidate().point_modifications.clone(),
            )
        };

        let (iterations_a, f_a, mods_a) = run();
        let (iterations_b, f_b, mods_b) = run();
        assert_eq!(iterations_a, iterations_b);
        assert_eq!(f_a, f_b);
        assert_eq!(mods_a, mods_b);
    }
}

mod frozen_via {
    use super::*;

    /// A transition via whose endpoints both sit on frozen segments: the
    /// solver has no legal move and keeps the original candidate.
    fn frozen_via_fixture() -> (CapacityMesh, SegmentSet) {
        let mesh = CapacityMesh::new(vec![
            cell("cn0", 0.0, 0.0, 10.0, 10.0),
            cell("cn1", 10.0, 0.0, 10.0, 10.0),
            cell("cn2", 17.5, 2.5, 5.0, 5.0),
            cell("cn3", 17.5, -2.5, 5.0, 5.0),
        ]);
        let segments = SegmentSet::from_segments(vec![
            vertical_segment("seg0", "cn0", "cn1", 5.0, -5.0, 5.0, vec![]),
            vertical_segment(
                "seg1",
                "cn1",
                "cn2",
                15.0,
                0.0,
                5.0,
                vec![assigned("netA", 15.0, 2.0, 0)],
            ),
            vertical_segment(
                "seg2",
                "cn1",
                "cn3",
                15.0,
                -5.0,
                0.0,
                vec![assigned("netA", 15.0, -2.0, 1)],
            ),
        ]);
        (mesh, segments)
    }

    #[test]
    fn test_unresolvable_via_emits_no_neighbors() {
        let (mesh, segments) = frozen_via_fixture();
        let section = SectionBuilder::new("cn0", &mesh, &segments)
            .with_mutable_hops(0)
            .build()
            .unwrap();

        // Only the root's own segment is editable
        assert!(section.is_segment_mutable("seg0"));
        assert!(!section.is_segment_mutable("seg1"));
        assert!(!section.is_segment_mutable("seg2"));

        let mut solver = UnravelSolver::new(section, UnravelConfig::new());
        let original_full_hash = solver.original_candidate().candidate_full_hash;

        assert_eq!(solver.original_candidate().issues.len(), 1);
        assert!(matches!(
            solver.original_candidate().issues[0],
            UnravelIssue::TransitionVia { .. }
        ));

        solver.solve();

        assert!(solver.solved());
        // Exactly one expansion (the original), then the queue ran dry
        assert_eq!(solver.iterations(), 1);
        let best = solver.best_candidate();
        assert!(best.point_modifications.is_empty());
        assert_eq!(best.candidate_full_hash, original_full_hash);
        assert_eq!(best.issues.len(), 1, "stagnation keeps the issue");
    }
}

mod deduplication {
    use super::*;

    #[test]
    fn test_double_flip_matches_baseline_full_hash() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        let flip_up = UnravelOperation::ChangeLayer {
            new_z: 1,
            point_ids: vec!["SP0".to_string()],
        };
        let flip_down = UnravelOperation::ChangeLayer {
            new_z: 0,
            point_ids: vec!["SP0".to_string()],
        };

        let empty = PointModifications::new();
        let once = apply_operation(&section, &empty, &flip_up);
        let twice = apply_operation(&section, &once, &flip_down);

        // The overlay is not empty, so the cheap hash differs...
        assert!(!twice.is_empty());
        assert_ne!(candidate_hash(&twice), candidate_hash(&empty));
        // ...but the resolved state is the baseline again
        assert_eq!(
            candidate_full_hash(&section, &twice),
            candidate_full_hash(&section, &empty)
        );
        assert_ne!(
            candidate_full_hash(&section, &once),
            candidate_full_hash(&section, &empty)
        );
    }

    #[test]
    fn test_equivalent_histories_share_full_hash() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let empty = PointModifications::new();

        // Flip both endpoints of net1's span one at a time...
        let first = apply_operation(
            &section,
            &empty,
            &UnravelOperation::ChangeLayer {
                new_z: 1,
                point_ids: vec!["SP0".to_string()],
            },
        );
        let one_at_a_time = apply_operation(
            &section,
            &first,
            &UnravelOperation::ChangeLayer {
                new_z: 1,
                point_ids: vec!["SP2".to_string()],
            },
        );

        // ...or both at once
        let both_at_once = apply_operation(
            &section,
            &empty,
            &UnravelOperation::ChangeLayer {
                new_z: 1,
                point_ids: vec!["SP0".to_string(), "SP2".to_string()],
            },
        );

        assert_eq!(
            candidate_full_hash(&section, &one_at_a_time),
            candidate_full_hash(&section, &both_at_once)
        );
    }
}

mod invariants {
    use super::*;

    #[test]
    fn test_issue_detection_is_idempotent() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        let mut mods = PointModifications::new();
        mods.insert(
            "SP0".to_string(),
            copperweave_unravel::PointModification {
                x: None,
                y: None,
                z: Some(1),
            },
        );

        let first = find_issues(&section, &mods);
        let second = find_issues(&section, &mods);
        assert_eq!(first, second);
        // Flipping one endpoint trades the crossing for a via
        assert!(first
            .iter()
            .all(|issue| matches!(issue, UnravelIssue::TransitionVia { .. })));
    }

    #[test]
    fn test_swap_is_an_involution() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        let swap = UnravelOperation::SwapPositionOnSegment {
            point_ids: ["SP0".to_string(), "SP1".to_string()],
        };

        let empty = PointModifications::new();
        let once = apply_operation(&section, &empty, &swap);
        let twice = apply_operation(&section, &once, &swap);

        for id in ["SP0", "SP1"] {
            let baseline = section.point(id);
            let resolved = section.resolved_point(id, &twice);
            assert_eq!(resolved.x, baseline.x);
            assert_eq!(resolved.y, baseline.y);
            assert_eq!(resolved.z, baseline.z);
        }

        // And a single swap really exchanges the two positions
        let swapped = section.resolved_point("SP0", &once);
        assert_eq!(swapped.y, section.point("SP1").y);
    }

    #[test]
    fn test_no_issues_costs_nothing() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let model = copperweave_unravel::CostModel::new(0.15);
        assert_eq!(model.compute_g(&section, &[]), 0.0);
    }

    #[test]
    fn test_stepwise_control_returns_between_expansions() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let mut solver = UnravelSolver::new(section, UnravelConfig::new());

        assert!(!solver.solved());
        solver.step();
        assert_eq!(solver.iterations(), 1);
        assert!(solver.last_processed_candidate().is_some());

        // The host can stop here; partial state stays inspectable
        let snapshot = solver.best_candidate().f;
        solver.step();
        assert!(solver.best_candidate().f <= snapshot);
    }

    #[test]
    fn test_iteration_budget_halts_search() {
        let (mesh, segments) = crossing_fixture();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();
        let mut solver =
            UnravelSolver::new(section, UnravelConfig::new().with_max_iterations(1));

        solver.solve();
        assert!(solver.failed());
        assert!(!solver.solved());
        assert_eq!(solver.iterations(), 1);
        // The best candidate is still the output
        assert_eq!(solver.best_candidate().issues.len(), 1);
    }
}
