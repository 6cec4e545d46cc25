//! Pool integration: mixed types, namespaces, merging, and concurrency.

use std::sync::Arc;

use corriente_core::{MergeMode, Pool, PoolError, Real, StereoSample, Tensor};

#[test]
fn mixed_types_share_one_namespace_tree() {
    let pool = Pool::new();
    pool.add("lowlevel.energy", 0.5_f32).unwrap();
    pool.add("lowlevel.mfcc", vec![1.0_f32, 2.0, 3.0]).unwrap();
    pool.add("metadata.tags", vec!["remix".to_string()]).unwrap();
    pool.add("stereo.samples", StereoSample::new(0.1, -0.1)).unwrap();
    pool.add("embeddings.frame", Tensor::zeros(vec![2, 8])).unwrap();
    pool.set("metadata.title", "untitled".to_string()).unwrap();
    pool.set("embeddings.mean", Tensor::zeros(vec![8])).unwrap();

    assert_eq!(
        pool.descriptor_names(),
        vec![
            "embeddings.frame".to_string(),
            "embeddings.mean".into(),
            "lowlevel.energy".into(),
            "lowlevel.mfcc".into(),
            "metadata.tags".into(),
            "metadata.title".into(),
            "stereo.samples".into(),
        ]
    );
    assert_eq!(
        pool.descriptor_names_in("lowlevel"),
        vec!["lowlevel.energy".to_string(), "lowlevel.mfcc".into()]
    );
    assert!(pool.is_single_value("metadata.title"));
    assert!(!pool.is_single_value("metadata.tags"));
    pool.check_integrity().unwrap();
}

#[test]
fn cross_type_conflicts_are_caught() {
    let pool = Pool::new();
    pool.set("meta.title", "x".to_string()).unwrap();
    // same name, multi-value real
    assert!(matches!(
        pool.add("meta.title", 1.0_f32),
        Err(PoolError::NameConflict { .. })
    ));
    // existing name becomes a namespace
    assert!(matches!(
        pool.add("meta.title.lang", 1.0_f32),
        Err(PoolError::ParentConflict { .. })
    ));
    // new name above an existing descriptor
    assert!(matches!(
        pool.add("meta", 1.0_f32),
        Err(PoolError::ChildConflict { .. })
    ));
}

#[test]
fn tensors_round_trip_and_merge() {
    let pool = Pool::new();
    let t = Tensor::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    pool.add("nn.out", t.clone()).unwrap();
    pool.merge("nn.out", vec![Tensor::zeros(vec![2, 2])], Some(MergeMode::Append))
        .unwrap();
    let stored = pool.value::<Tensor>("nn.out").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], t);
}

#[test]
fn merge_pool_carries_every_type() {
    let session = Pool::new();
    session.add("a.x", 1.0_f32).unwrap();
    session.set("a.meta", "first".to_string()).unwrap();

    let update = Pool::new();
    update.add("a.x", 2.0_f32).unwrap();
    update.set("a.meta", "second".to_string()).unwrap();
    update.add("b.samples", StereoSample::new(0.0, 1.0)).unwrap();

    session.merge_pool(&update, Some(MergeMode::Replace)).unwrap();
    assert_eq!(session.value::<Real>("a.x").unwrap(), vec![2.0]);
    assert_eq!(session.single_value::<String>("a.meta").unwrap(), "second");
    assert_eq!(session.value::<StereoSample>("b.samples").unwrap().len(), 1);
}

#[test]
fn namespace_removal_reports_counts() {
    let pool = Pool::new();
    pool.add("rhythm.bpm_curve", 120.0_f32).unwrap();
    pool.add("rhythm.onsets", vec![0.5_f32]).unwrap();
    pool.set("rhythm.meter", "4/4".to_string()).unwrap();
    pool.add("tonal.key", "F#".to_string()).unwrap();

    assert_eq!(pool.remove_namespace("rhythm"), 3);
    assert_eq!(pool.remove_namespace("rhythm"), 0);
    assert_eq!(pool.descriptor_names(), vec!["tonal.key".to_string()]);
    assert!(matches!(
        pool.value::<Real>("rhythm.bpm_curve"),
        Err(PoolError::NotFound { .. })
    ));
}

#[test]
fn concurrent_writers_on_disjoint_and_shared_keys() {
    let pool = Arc::new(Pool::new());
    let threads = 8;
    let per_thread = 200;

    std::thread::scope(|scope| {
        for t in 0..threads {
            let pool = Arc::clone(&pool);
            scope.spawn(move || {
                let own = format!("thread{t}.values");
                for i in 0..per_thread {
                    pool.add(&own, i as Real).unwrap();
                    pool.add("shared.values", i as Real).unwrap();
                }
            });
        }
    });

    assert_eq!(
        pool.value::<Real>("shared.values").unwrap().len(),
        threads * per_thread
    );
    for t in 0..threads {
        let own = format!("thread{t}.values");
        let values = pool.value::<Real>(&own).unwrap();
        // per-key order is preserved even under contention
        assert_eq!(values, (0..per_thread).map(|i| i as Real).collect::<Vec<_>>());
    }
    pool.check_integrity().unwrap();
}

#[test]
fn concurrent_readers_see_consistent_snapshots() {
    let pool = Arc::new(Pool::new());
    pool.add("data.v", 0.0_f32).unwrap();

    std::thread::scope(|scope| {
        let writer = Arc::clone(&pool);
        scope.spawn(move || {
            for i in 1..500 {
                writer.add("data.v", i as Real).unwrap();
            }
        });
        for _ in 0..4 {
            let reader = Arc::clone(&pool);
            scope.spawn(move || {
                for _ in 0..200 {
                    let values = reader.value::<Real>("data.v").unwrap();
                    // a snapshot is always a prefix of the final sequence
                    for (i, v) in values.iter().enumerate() {
                        assert_eq!(*v, i as Real);
                    }
                }
            });
        }
    });
}
