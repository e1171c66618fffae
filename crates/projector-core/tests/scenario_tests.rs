//! End-to-end projector scenarios

use projector_core::{DataPoint, Dataset, ProjectionMethod, Projector, ProjectorConfig};

fn seeded(method: ProjectionMethod) -> ProjectorConfig {
    ProjectorConfig {
        method,
        seed: Some(1234),
        ..ProjectorConfig::default()
    }
}

fn assert_close(actual: [f64; 2], expected: [f64; 2]) {
    assert!(
        (actual[0] - expected[0]).abs() < 1e-9 && (actual[1] - expected[1]).abs() < 1e-9,
        "got {:?}, expected {:?}",
        actual,
        expected
    );
}

#[test]
fn test_first_point_at_origin() {
    let mut projector = Projector::new(3, seeded(ProjectionMethod::NnSubspace)).unwrap();
    assert!(projector.add_datapoint([0.0, 0.0, 0.0]).unwrap());
    assert_eq!(projector.coordinates(), vec![[0.0, 0.0]]);
}

#[test]
fn test_second_point_at_upstairs_distance() {
    let mut projector = Projector::new(3, seeded(ProjectionMethod::NnSubspace)).unwrap();
    projector.add_datapoint([0.0, 0.0, 0.0]).unwrap();
    projector.add_datapoint([3.0, 0.0, 0.0]).unwrap();
    let coords = projector.coordinates();
    assert_close(coords[1], [3.0, 0.0]);
}

#[test]
fn test_mirror_is_independent() {
    let mut original = Dataset::with_seed(3, 1);
    for i in 0..5 {
        let x = i as f64;
        original
            .add_point(DataPoint::from([x, x * x, -x]))
            .unwrap();
    }
    let original_distance = original.distance(4, 0).unwrap();

    let mut copy = Dataset::new(3);
    copy.mirror(&original);
    assert_eq!(copy.len(), 5);
    assert_eq!(copy.points(), original.points());

    copy.set_point(0, DataPoint::from([100.0, 0.0, 0.0])).unwrap();
    for i in 0..20 {
        copy.add_point(DataPoint::from([i as f64, 1.0, 2.0])).unwrap();
    }
    copy.calculate_distances();

    assert_eq!(original.len(), 5);
    assert_eq!(original.point(0).unwrap(), &DataPoint::from([0.0, 0.0, 0.0]));
    assert_eq!(original.distance(4, 0).unwrap(), original_distance);
    assert!(copy.cache_capacity() > original.cache_capacity());
}

#[test]
fn test_kth_variant_dimension() {
    let mut data = Dataset::new(4);
    for row in [
        [1.0, 0.0, -10.0, 5.0],
        [1.1, 2.0, 0.0, 5.0],
        [0.9, 4.0, 10.0, 5.5],
        [1.0, 6.0, 20.0, 5.0],
    ] {
        data.add_point(DataPoint::from(row)).unwrap();
    }
    assert_eq!(data.kth_variant_dimension(1).unwrap(), 2);
    assert_eq!(data.kth_variant_dimension(2).unwrap(), 1);
    assert_eq!(data.kth_variant_dimension(4).unwrap(), 0);
    assert!(data.kth_variant_dimension(5).is_err());
}

#[test]
fn test_sammon_improves_tetrahedron() {
    let h = (2.0f64 / 3.0).sqrt();
    let s = 3f64.sqrt();
    let mut projector = Projector::new(3, seeded(ProjectionMethod::NnSubspace)).unwrap();
    for v in [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.5, s / 2.0, 0.0],
        [0.5, s / 6.0, h],
    ] {
        assert!(projector.add_datapoint(v).unwrap());
    }

    projector.set_method(ProjectionMethod::Sammon).unwrap();
    let after_one = projector.iterate(1).unwrap();
    let after_hundred = projector.iterate(99).unwrap();
    assert!(
        after_hundred < after_one,
        "stress {} after 100 steps, {} after 1",
        after_hundred,
        after_one
    );
}

#[test]
fn test_reprojection_matches_incremental() {
    for method in [ProjectionMethod::NnSubspace, ProjectionMethod::Triangulate] {
        let mut projector = Projector::new(4, seeded(method)).unwrap();
        for i in 0..30 {
            let t = i as f64 * 0.37;
            projector
                .add_datapoint([t.sin(), t.cos(), (2.0 * t).sin(), t * 0.1])
                .unwrap();
        }
        let incremental = projector.coordinates();
        projector.set_method(method).unwrap();
        assert_eq!(projector.coordinates(), incremental);
    }
}

#[test]
fn test_switching_methods_preserves_history() {
    let mut projector = Projector::new(3, seeded(ProjectionMethod::Triangulate)).unwrap();
    for i in 0..12 {
        let t = i as f64;
        projector.add_datapoint([t, t * 0.5, (t * 0.3).cos()]).unwrap();
    }
    for method in ProjectionMethod::ALL {
        projector.set_method(method).unwrap();
        assert_eq!(projector.method(), method);
        assert_eq!(projector.len(), 12);
        let coords = projector.coordinates();
        assert_eq!(coords.len(), 12);
        assert!(coords.iter().flatten().all(|c| c.is_finite()));
    }
}

#[test]
fn test_pca_flattens_a_line() {
    let mut projector = Projector::new(3, seeded(ProjectionMethod::Pca)).unwrap();
    for t in 0..6 {
        let t = t as f64;
        projector.add_datapoint([t, 2.0 * t, -t]).unwrap();
    }
    let coords = projector.coordinates();
    let root6 = 6f64.sqrt();
    for (i, c) in coords.iter().enumerate() {
        assert!(c[1].abs() < 1e-9);
        if i > 0 {
            assert!(((c[0] - coords[i - 1][0]) - root6).abs() < 1e-9);
        }
    }
}

#[test]
fn test_config_from_json_drives_projector() {
    let config = ProjectorConfig::from_json(r#"{"method": "coordinate", "coordinate": {"axes": [2, 1], "auto_find": false}}"#)
        .unwrap();
    let mut projector = Projector::new(3, config).unwrap();
    projector.add_datapoint([1.0, 2.0, 3.0]).unwrap();
    assert_eq!(projector.coordinates(), vec![[3.0, 2.0]]);
}
