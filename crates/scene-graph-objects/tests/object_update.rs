//! End-to-end update-cycle tests against a live layered graph.

use scene_graph_core::{
    BoundingBox, FeatureMatrix, LayerId, LayeredGraph, NodeAttributes, NodeId, NodeSymbol,
    TaskEmbedding, TaskEmbeddingGroup,
};
use scene_graph_objects::{ObjectUpdateConfig, ObjectUpdater, UpdateInfo};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn tasks() -> TaskEmbeddingGroup {
    TaskEmbeddingGroup::new(vec![
        TaskEmbedding {
            name: "chair".to_string(),
            embedding: vec![1.0, 0.0],
        },
        TaskEmbedding {
            name: "table".to_string(),
            embedding: vec![0.0, 1.0],
        },
    ])
    .unwrap()
}

fn seg(i: u64) -> NodeId {
    NodeSymbol::new('S', i).id()
}

fn place(i: u64) -> NodeId {
    NodeSymbol::new('P', i).id()
}

fn obj(i: u64) -> NodeId {
    NodeSymbol::new('O', i).id()
}

/// Unit-height segment spanning `[x_min, x_max]` on the x axis.
fn segment_attrs(x_min: f64, x_max: f64, feature: Vec<f32>) -> NodeAttributes {
    NodeAttributes::at([(x_min + x_max) / 2.0, 0.5, 0.5])
        .with_bounding_box(BoundingBox::new([x_min, 0.0, 0.0], [x_max, 1.0, 1.0]))
        .with_feature(FeatureMatrix::from_single(feature))
}

fn add_segment(graph: &mut LayeredGraph, i: u64, x_min: f64, x_max: f64, feature: Vec<f32>) {
    graph
        .insert_node(LayerId::Segments, seg(i), segment_attrs(x_min, x_max, feature))
        .unwrap();
}

fn add_place(graph: &mut LayeredGraph, i: u64, position: [f64; 3], active: bool) {
    graph
        .insert_node(
            LayerId::Places,
            place(i),
            NodeAttributes::at(position).with_active(active),
        )
        .unwrap();
}

fn cycle(updater: &mut ObjectUpdater, graph: &mut LayeredGraph, sequence: u64) {
    let info = UpdateInfo {
        timestamp_ns: sequence * 1_000_000,
        sequence,
    };
    let report = updater.call(graph, &info).unwrap();
    assert!(report.is_empty(), "the driver never proposes node merges");
}

#[test]
fn test_overlapping_segments_become_one_object() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.5, 1.5, vec![1.0, 0.0]);
    add_place(&mut graph, 0, [0.0; 3], true);
    graph.insert_edge(seg(0), place(0)).unwrap();
    graph.insert_edge(seg(1), place(0)).unwrap();

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(graph.layer_len(LayerId::Objects), 1);
    let object = obj(0);
    assert!(graph.contains(object));

    // Segments keep their own place parents; the object anchors to the
    // segments' shared place and stays tracked while the place is active.
    assert_eq!(graph.parent(seg(0)).unwrap(), Some(place(0)));
    assert_eq!(graph.parent(seg(1)).unwrap(), Some(place(0)));
    assert_eq!(graph.parent(object).unwrap(), Some(place(0)));
    assert_eq!(updater.tracked_objects().collect::<Vec<_>>(), vec![object]);

    // Merged geometry: positions average, feature is the sample mean.
    let attrs = graph.attrs(object).unwrap();
    assert!((attrs.position[0] - 0.75).abs() < 1e-9);
    assert_eq!(attrs.mean_feature(), vec![1.0, 0.0]);

    assert_eq!(updater.component_count(), 1);
    assert_eq!(updater.component_of(seg(0)), Some(0));
    assert_eq!(updater.component_of(seg(1)), Some(0));
}

#[test]
fn test_semantic_split_inside_one_component() {
    init_tracing();
    // One overlap-connected chain, but the third segment matches a different
    // task: the component clusters into two objects.
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.5, 1.5, vec![1.0, 0.0]);
    add_segment(&mut graph, 2, 1.2, 2.2, vec![0.0, 1.0]);

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(updater.component_count(), 1, "chain is one component");
    assert_eq!(graph.layer_len(LayerId::Objects), 2);

    // Clusters materialize in ascending order of their lowest segment id:
    // the two look-alikes fuse into the first object, the off-task segment
    // gets the second.
    let fused = graph.attrs(obj(0)).unwrap();
    assert_eq!(fused.mean_feature(), vec![1.0, 0.0]);
    assert!((fused.position[0] - 0.75).abs() < 1e-9);

    let lone = graph.attrs(obj(1)).unwrap();
    assert_eq!(lone.mean_feature(), vec![0.0, 1.0]);
    assert!((lone.position[0] - 1.7).abs() < 1e-9);
}

#[test]
fn test_bridging_segment_invalidates_both_components() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.8, 1.8, vec![1.0, 0.0]);
    add_segment(&mut graph, 2, 3.0, 4.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 3, 3.8, 4.8, vec![1.0, 0.0]);

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(updater.component_count(), 2);
    assert_eq!(graph.layer_len(LayerId::Objects), 2);
    assert!(graph.contains(obj(0)));
    assert!(graph.contains(obj(1)));

    // A new segment overlapping both pairs arrives: both components must be
    // torn down and re-detected as one.
    add_segment(&mut graph, 4, 1.5, 3.2, vec![1.0, 0.0]);
    cycle(&mut updater, &mut graph, 1);

    assert!(!graph.contains(obj(0)), "stale object must leave the graph");
    assert!(!graph.contains(obj(1)), "stale object must leave the graph");
    assert_eq!(graph.layer_len(LayerId::Objects), 1);
    assert!(graph.contains(obj(2)), "object indices are never reused");

    // Component ids recycle through the freed pool.
    assert_eq!(updater.component_count(), 1);
    for i in 0..5 {
        assert_eq!(updater.component_of(seg(i)), Some(0));
    }
}

#[test]
fn test_archived_place_preferred_as_anchor() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.5, 1.5, vec![1.0, 0.0]);
    add_place(&mut graph, 0, [0.0; 3], true);
    add_place(&mut graph, 1, [10.0, 0.0, 0.0], false);
    graph.insert_edge(seg(0), place(0)).unwrap();
    graph.insert_edge(seg(1), place(1)).unwrap();

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(
        graph.parent(obj(0)).unwrap(),
        Some(place(1)),
        "an archived candidate wins over an active one"
    );
}

#[test]
fn test_object_settles_when_place_archives() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_place(&mut graph, 0, [0.0; 3], true);
    graph.insert_edge(seg(0), place(0)).unwrap();

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);
    assert_eq!(updater.tracked_objects().count(), 1);

    graph.attrs_mut(place(0)).unwrap().is_active = false;
    cycle(&mut updater, &mut graph, 1);

    assert_eq!(
        updater.tracked_objects().count(),
        0,
        "object under an archived place is settled"
    );
    assert!(graph.contains(obj(0)), "settling does not remove the object");
}

#[test]
fn test_parentless_object_anchors_to_nearest_place() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    // Far away, beyond the configured bound: the link is still made.
    add_place(&mut graph, 0, [5.0, 0.0, 0.0], true);

    let config = ObjectUpdateConfig::default().with_neighbor_max_distance(1.0);
    let mut updater = ObjectUpdater::new(config, tasks()).unwrap();

    cycle(&mut updater, &mut graph, 0);
    assert_eq!(graph.parent(obj(0)).unwrap(), None, "no candidate place yet");

    cycle(&mut updater, &mut graph, 1);
    assert_eq!(
        graph.parent(obj(0)).unwrap(),
        Some(place(0)),
        "a too-far neighbor is warned about but linked"
    );
    assert_eq!(
        updater.tracked_objects().count(),
        0,
        "anchoring settles the object even under an active place"
    );
}

#[test]
fn test_archived_anchor_survives_invalidation() {
    init_tracing();
    // Two components, all segments anchored to one archived place.
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.8, 1.8, vec![1.0, 0.0]);
    add_segment(&mut graph, 2, 3.0, 4.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 3, 3.8, 4.8, vec![1.0, 0.0]);
    add_place(&mut graph, 0, [0.0; 3], false);
    for i in 0..4 {
        graph.insert_edge(seg(i), place(0)).unwrap();
    }

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);
    assert_eq!(graph.parent(obj(0)).unwrap(), Some(place(0)));
    assert_eq!(graph.parent(obj(1)).unwrap(), Some(place(0)));

    // Bridge the two components: both objects are rebuilt as one, and the
    // replacement must inherit the segments' archived anchor rather than
    // falling back to a nearest-place query.
    add_segment(&mut graph, 4, 1.5, 3.2, vec![1.0, 0.0]);
    cycle(&mut updater, &mut graph, 1);

    assert!(!graph.contains(obj(0)));
    assert!(!graph.contains(obj(1)));
    assert_eq!(
        graph.parent(obj(2)).unwrap(),
        Some(place(0)),
        "the re-clustered object keeps the archived anchor"
    );
    for i in 0..4 {
        assert_eq!(
            graph.parent(seg(i)).unwrap(),
            Some(place(0)),
            "segment place parents are never rewritten"
        );
    }
}

#[test]
fn test_irrelevant_segment_is_permanently_ignored() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    // Equidistant from both tasks: best cosine score (1 + 0.707) / 2 < 0.9.
    add_segment(&mut graph, 0, 0.0, 1.0, vec![0.5, 0.5]);

    let config = ObjectUpdateConfig::default().with_scores(0.9, 0.0);
    let mut updater = ObjectUpdater::new(config, tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert!(updater.is_ignored(seg(0)));
    assert!(!graph.attrs(seg(0)).unwrap().is_active);
    assert_eq!(updater.component_of(seg(0)), None);
    assert_eq!(graph.layer_len(LayerId::Objects), 0);

    // Ignoring is monotone: later cycles never resurrect the segment.
    cycle(&mut updater, &mut graph, 1);
    assert!(updater.is_ignored(seg(0)));
    assert_eq!(graph.layer_len(LayerId::Objects), 0);
}

#[test]
fn test_featureless_segment_is_ignored_with_warning() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    graph
        .insert_node(
            LayerId::Segments,
            seg(0),
            NodeAttributes::at([0.0; 3])
                .with_bounding_box(BoundingBox::new([0.0; 3], [1.0; 3])),
        )
        .unwrap();

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert!(updater.is_ignored(seg(0)));
    assert!(!graph.attrs(seg(0)).unwrap().is_active);
}

#[test]
fn test_low_scoring_cluster_yields_no_object() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    // Anti-aligned with the first task, orthogonal to the second: best score
    // is exactly 0.5, above the segment gate but below the object gate.
    add_segment(&mut graph, 0, 0.0, 1.0, vec![-1.0, 0.0]);

    let config = ObjectUpdateConfig::default().with_scores(0.4, 0.6);
    let mut updater = ObjectUpdater::new(config, tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(graph.layer_len(LayerId::Objects), 0);
    assert!(!updater.is_ignored(seg(0)), "the segment itself stays eligible");
    assert_eq!(
        updater.component_of(seg(0)),
        Some(0),
        "gated clusters keep their segments assigned"
    );
}

#[test]
fn test_assigned_segments_are_stable_across_cycles() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 0.5, 1.5, vec![1.0, 0.0]);

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);
    let object_count = graph.layer_len(LayerId::Objects);
    let component = updater.component_of(seg(0));

    // Nothing new arrived: a second cycle must not re-cluster or duplicate.
    cycle(&mut updater, &mut graph, 1);
    assert_eq!(graph.layer_len(LayerId::Objects), object_count);
    assert_eq!(updater.component_of(seg(0)), component);
    assert_eq!(updater.component_count(), 1);
}

#[test]
fn test_disjoint_segments_form_separate_components() {
    init_tracing();
    let mut graph = LayeredGraph::new();
    add_segment(&mut graph, 0, 0.0, 1.0, vec![1.0, 0.0]);
    add_segment(&mut graph, 1, 5.0, 6.0, vec![0.0, 1.0]);

    let mut updater = ObjectUpdater::new(ObjectUpdateConfig::default(), tasks()).unwrap();
    cycle(&mut updater, &mut graph, 0);

    assert_eq!(updater.component_count(), 2);
    assert_eq!(graph.layer_len(LayerId::Objects), 2);
    assert_ne!(updater.component_of(seg(0)), updater.component_of(seg(1)));
    assert!(graph.neighbors(seg(0)).unwrap().is_empty());
}
