//! Unit tests for the synthetic volume generator.

use rstest::{fixture, rstest};

use super::{BOUNDARY_AFFINITY, INTRA_SEGMENT_AFFINITY, SyntheticVolume, SyntheticVolumeConfig, VolumeError};

fn base_config() -> SyntheticVolumeConfig {
    SyntheticVolumeConfig {
        extents: [4, 8, 8],
        segment_count: 6,
        background_fraction: 0.1,
        noise: 0.05,
        seed: 7,
    }
}

#[fixture]
fn config() -> SyntheticVolumeConfig {
    base_config()
}

#[rstest]
fn buffers_match_the_graph(config: SyntheticVolumeConfig) {
    let volume = SyntheticVolume::generate(&config).expect("valid config");
    let graph = volume.graph();
    assert_eq!(volume.labels().len(), 256);
    assert_eq!(volume.markers().len(), 256);
    assert_eq!(volume.affinities().len(), graph.slot_count());

    let edges = volume.edge_list();
    assert_eq!(edges.node1.len(), graph.edge_count());
    assert_eq!(edges.node2.len(), graph.edge_count());
    assert_eq!(edges.weights.len(), graph.edge_count());
}

#[rstest]
fn generation_is_deterministic(config: SyntheticVolumeConfig) {
    let first = SyntheticVolume::generate(&config).expect("first generation");
    let second = SyntheticVolume::generate(&config).expect("second generation");
    assert_eq!(first.labels(), second.labels());
    assert_eq!(first.affinities(), second.affinities());
}

#[rstest]
fn every_segment_has_one_marker(config: SyntheticVolumeConfig) {
    let volume = SyntheticVolume::generate(&config).expect("valid config");
    let mut marked: Vec<u64> = volume
        .markers()
        .iter()
        .copied()
        .filter(|&marker| marker != 0)
        .collect();
    marked.sort_unstable();
    assert_eq!(marked, (1..=6).collect::<Vec<u64>>());
    for (&marker, &label) in volume.markers().iter().zip(volume.labels()) {
        if marker != 0 {
            assert_eq!(marker, label);
        }
    }
}

#[rstest]
fn affinities_stay_in_unit_interval(config: SyntheticVolumeConfig) {
    let volume = SyntheticVolume::generate(&config).expect("valid config");
    assert!(
        volume
            .affinities()
            .iter()
            .all(|weight| (0.0..=1.0).contains(weight))
    );
}

#[rstest]
fn noiseless_affinities_follow_labels(mut config: SyntheticVolumeConfig) {
    config.noise = 0.0;
    let volume = SyntheticVolume::generate(&config).expect("valid config");
    let labels = volume.labels();
    let edges = volume.edge_list();
    for ((&source, &target), &weight) in edges.node1.iter().zip(&edges.node2).zip(&edges.weights) {
        let left = labels.get(usize::try_from(source).expect("site fits")).copied();
        let right = labels.get(usize::try_from(target).expect("site fits")).copied();
        let expected = if left == right && left != Some(0) {
            INTRA_SEGMENT_AFFINITY
        } else {
            BOUNDARY_AFFINITY
        };
        assert_eq!(weight, expected);
    }
    let binary = edges.thresholded(0.5);
    assert!(binary.iter().all(|&flag| flag == 0 || flag == 1));
}

#[rstest]
#[case::zero_segments(SyntheticVolumeConfig { segment_count: 0, ..base_config() }, "ZeroSegments")]
#[case::too_many_segments(SyntheticVolumeConfig { segment_count: 257, ..base_config() }, "SegmentCountExceedsSites")]
#[case::bad_background(SyntheticVolumeConfig { background_fraction: 1.5, ..base_config() }, "InvalidFloatParameter")]
#[case::bad_noise(SyntheticVolumeConfig { noise: f32::NAN, ..base_config() }, "InvalidFloatParameter")]
#[case::empty_grid(SyntheticVolumeConfig { extents: [0, 8, 8], ..base_config() }, "Graph")]
fn rejects_invalid_configs(#[case] config: SyntheticVolumeConfig, #[case] variant: &str) {
    let err = SyntheticVolume::generate(&config).expect_err("invalid config must fail");
    let name = match err {
        VolumeError::ZeroSegments => "ZeroSegments",
        VolumeError::SegmentCountExceedsSites { .. } => "SegmentCountExceedsSites",
        VolumeError::InvalidFloatParameter { .. } => "InvalidFloatParameter",
        VolumeError::Graph(_) => "Graph",
    };
    assert_eq!(name, variant);
}
