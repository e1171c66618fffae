//! Spatial index and distance cache properties over seeded random data

use projector_core::{DataPoint, Dataset, Insertion, SpatialIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_point(rng: &mut ChaCha8Rng, dimensions: usize) -> DataPoint {
    (0..dimensions)
        .map(|_| rng.gen_range(-10.0..10.0))
        .collect::<Vec<f64>>()
        .into()
}

fn brute_force(points: &[DataPoint], query: &DataPoint, k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .distance_squared(query)
            .total_cmp(&points[b].distance_squared(query))
            .then(a.cmp(&b))
    });
    order.truncate(k);
    order
}

#[test]
fn test_k_nearest_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut index = SpatialIndex::new(4);
    for _ in 0..300 {
        index.insert(random_point(&mut rng, 4), -1.0).unwrap();
    }
    for _ in 0..25 {
        let query = random_point(&mut rng, 4);
        for k in [1, 5, 20] {
            assert_eq!(
                index.k_nearest(k, &query).unwrap(),
                brute_force(index.points(), &query, k)
            );
        }
    }
}

/// NaN distances rank after every number, ties by position.
fn brute_force_nan_last(points: &[DataPoint], query: &DataPoint, k: usize) -> Vec<usize> {
    let key = |p: &DataPoint| {
        let d = p.distance_squared(query);
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    };
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| key(&points[a]).total_cmp(&key(&points[b])).then(a.cmp(&b)));
    order.truncate(k);
    order
}

#[test]
fn test_k_nearest_with_nan_points() {
    let mut index = SpatialIndex::new(2);
    for i in 0..40 {
        let y = i as f64;
        let point = if i % 3 == 0 {
            DataPoint::from([f64::NAN, y])
        } else {
            DataPoint::from([(i % 8) as f64, y])
        };
        index.insert(point, -1.0).unwrap();
    }
    for qx in -2..10 {
        for qy in (-5..45).step_by(3) {
            let query = DataPoint::from([qx as f64 + 0.25, qy as f64]);
            for k in [1, 3, 10] {
                assert_eq!(
                    index.k_nearest(k, &query).unwrap(),
                    brute_force_nan_last(index.points(), &query, k),
                    "query {}",
                    query
                );
            }
        }
    }
}

#[test]
fn test_k_nearest_is_prefix_of_k_plus_one() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut data = Dataset::with_seed(3, 5);
    for _ in 0..100 {
        data.add_point(random_point(&mut rng, 3)).unwrap();
    }
    let query = random_point(&mut rng, 3);
    let mut previous = data.k_nearest_neighbors(1, &query).unwrap();
    for k in 2..20 {
        let current = data.k_nearest_neighbors(k, &query).unwrap();
        assert_eq!(&current[..k - 1], previous.as_slice());
        let distances: Vec<f64> = current
            .iter()
            .map(|&i| data.point(i).unwrap().distance(&query))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        previous = current;
    }
    assert!(data.k_nearest_neighbors(100, &query).is_none());
}

#[test]
fn test_queries_after_replacement() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut data = Dataset::with_seed(2, 99);
    for _ in 0..80 {
        data.add_point(random_point(&mut rng, 2)).unwrap();
    }
    for i in (0..80).step_by(3) {
        data.set_point(i, random_point(&mut rng, 2)).unwrap();
    }
    for _ in 0..10 {
        let query = random_point(&mut rng, 2);
        assert_eq!(
            data.k_nearest_neighbors(6, &query).unwrap(),
            brute_force(data.points(), &query, 6)
        );
    }
}

#[test]
fn test_tolerance_keeps_points_apart() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut data = Dataset::with_seed(2, 3);
    let tolerance = 0.5;
    let mut rejected = 0;
    for _ in 0..400 {
        let point: DataPoint = (0..2)
            .map(|_| rng.gen_range(0.0..5.0))
            .collect::<Vec<f64>>()
            .into();
        match data.add_point_with_tolerance(point, tolerance).unwrap() {
            Insertion::Added { .. } => {}
            Insertion::Duplicate { existing } => {
                assert!(existing < data.len());
                rejected += 1;
            }
        }
    }
    assert!(rejected > 0);
    assert_eq!(rejected + data.len(), 400);
    assert!(data.minimum_distance() > tolerance);
}

#[test]
fn test_cached_distances_follow_updates() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut data = Dataset::with_seed(5, 8);
    for _ in 0..40 {
        data.add_point(random_point(&mut rng, 5)).unwrap();
        let n = data.len();
        assert!(data.cache_capacity() >= n * (n - 1) / 2);
    }
    data.calculate_distances();

    data.set_point(7, DataPoint::zeros(5)).unwrap();
    for j in 0..data.len() {
        let direct = data.point(7).unwrap().distance(data.point(j).unwrap());
        assert_eq!(data.distance(7, j).unwrap(), direct);
        assert_eq!(data.distance(j, 7).unwrap(), direct);
    }
    assert!(data.distance(0, 40).is_err());
    assert_eq!(data.distance_or_zero(0, 40), 0.0);
}
