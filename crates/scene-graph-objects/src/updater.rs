//! The per-cycle object update driver.
//!
//! [`ObjectUpdater`] owns all incremental aggregation state between cycles:
//! which segments belong to which connected component, which segments are
//! permanently ignored, which object nodes still await a settled place
//! attachment, and the recyclable component id pool. The host graph itself
//! carries no aggregation bookkeeping.
//!
//! One [`ObjectUpdater::call`] runs four phases in order:
//!
//! 1. **Reconcile** object→place attachments and settle objects whose place
//!    archived.
//! 2. **Discover** adjacency edges for unassigned active segments, gated by
//!    semantic relevance; note every existing component a new edge touches.
//! 3. **Clear** touched components: their object nodes leave the graph, their
//!    segments become unassigned, their ids return to the pool.
//! 4. **Detect** connected components among unassigned active segments,
//!    cluster each, and materialize object nodes for clusters that score
//!    above the object threshold.
//!
//! All graph mutation is sequential; only the pairwise overlap scan in phase
//! 2 is data-parallel.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};

use scene_graph_core::{
    AttributeReducer, CosineDistance, DefaultReducer, EmbeddingDistance, FeatureMatrix, LayerId,
    LayeredGraph, NearestNodeFinder, NodeAttributes, NodeId, NodeSymbol, TaskEmbeddingGroup,
};

use crate::clustering::{cluster_agglomerative, ComponentWorkspace};
use crate::config::ObjectUpdateConfig;
use crate::error::{ConfigError, UpdateResult};
use crate::id_tracker::IdTracker;
use crate::overlap::IntersectionPolicy;
use crate::probability::{mutual_information, task_posterior};

/// Map from absorbed node to surviving node, proposed by an update cycle.
///
/// The aggregation core resolves everything by rebuilding components instead
/// of merging existing object nodes, so the report is always empty; the type
/// exists so the driver interface can carry merge proposals without changing
/// shape.
pub type MergeReport = BTreeMap<NodeId, NodeId>;

/// Per-cycle metadata supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateInfo {
    /// Host timestamp of the observations this cycle integrates.
    pub timestamp_ns: u64,
    /// Monotone cycle counter.
    pub sequence: u64,
}

/// Bookkeeping for one live connected component.
#[derive(Debug, Clone, Default)]
struct ComponentRecord {
    /// Segments assigned to the component.
    segments: BTreeSet<NodeId>,
    /// Object nodes materialized from the component's clusters.
    objects: Vec<NodeId>,
}

/// Incremental segment→object aggregation driver.
///
/// Construct once with a validated configuration and a task embedding group,
/// then feed it the host graph every cycle via [`ObjectUpdater::call`]. The
/// updater assumes exclusive access to the graph for the duration of a call
/// and that node ids it assigned are not reused by other producers.
pub struct ObjectUpdater {
    config: ObjectUpdateConfig,
    edge_policy: Box<dyn IntersectionPolicy>,
    tasks: TaskEmbeddingGroup,
    metric: Box<dyn EmbeddingDistance>,
    reducer: Box<dyn AttributeReducer>,
    components: BTreeMap<u64, ComponentRecord>,
    node_to_component: BTreeMap<NodeId, u64>,
    ignored: BTreeSet<NodeId>,
    tracked: BTreeSet<NodeId>,
    component_ids: IdTracker,
    next_object: NodeSymbol,
}

impl ObjectUpdater {
    /// Build a driver from a validated configuration.
    ///
    /// The distance metric defaults to [`CosineDistance`] and the attribute
    /// reducer to [`DefaultReducer`]; swap either with the builder methods.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] when the configuration fails
    /// validation.
    pub fn new(config: ObjectUpdateConfig, tasks: TaskEmbeddingGroup) -> Result<Self, ConfigError> {
        config.validate()?;
        let edge_policy = config.edge_policy.create();
        let next_object = NodeSymbol::new(config.prefix, 0);
        Ok(Self {
            config,
            edge_policy,
            tasks,
            metric: Box::new(CosineDistance),
            reducer: Box::new(DefaultReducer),
            components: BTreeMap::new(),
            node_to_component: BTreeMap::new(),
            ignored: BTreeSet::new(),
            tracked: BTreeSet::new(),
            component_ids: IdTracker::new(0),
            next_object,
        })
    }

    /// Builder: replace the embedding distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: Box<dyn EmbeddingDistance>) -> Self {
        self.metric = metric;
        self
    }

    /// Builder: replace the domain-attribute reducer.
    #[must_use]
    pub fn with_reducer(mut self, reducer: Box<dyn AttributeReducer>) -> Self {
        self.reducer = reducer;
        self
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &ObjectUpdateConfig {
        &self.config
    }

    /// Number of live components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Component a segment is currently assigned to, if any.
    #[must_use]
    pub fn component_of(&self, id: NodeId) -> Option<u64> {
        self.node_to_component.get(&id).copied()
    }

    /// Whether a segment has been permanently excluded from aggregation.
    #[must_use]
    pub fn is_ignored(&self, id: NodeId) -> bool {
        self.ignored.contains(&id)
    }

    /// Object nodes still awaiting a settled place attachment, ascending.
    pub fn tracked_objects(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tracked.iter().copied()
    }

    /// Run one full update cycle against the host graph.
    ///
    /// Returns the (always empty) merge report.
    ///
    /// # Errors
    /// [`crate::UpdateError`] on host-graph invariant breaches or
    /// feature/task shape mismatches; per-node data-quality anomalies are
    /// logged and skipped instead.
    pub fn call(
        &mut self,
        graph: &mut LayeredGraph,
        info: &UpdateInfo,
    ) -> UpdateResult<MergeReport> {
        let span = info_span!(
            "object_update",
            sequence = info.sequence,
            timestamp_ns = info.timestamp_ns
        );
        let _guard = span.enter();

        self.reconcile_active_parents(graph)?;
        let touched = self.add_segment_edges(graph)?;
        self.clear_components(graph, &touched)?;
        self.detect_objects(graph)?;

        info!(
            components = self.components.len(),
            tracked = self.tracked.len(),
            ignored = self.ignored.len(),
            "update cycle finished"
        );
        Ok(MergeReport::new())
    }

    /// Phase 1: resync the tracked set and reconcile place attachments.
    ///
    /// Every live object starts the cycle tracked. Objects whose place is
    /// archived settle out; parentless objects get anchored to their nearest
    /// place (linked even when it violates the distance bound, with a
    /// warning) and settle on any successful link.
    fn reconcile_active_parents(&mut self, graph: &mut LayeredGraph) -> UpdateResult<()> {
        let objects: Vec<NodeId> = graph.layer_nodes(LayerId::Objects).collect();
        self.tracked.extend(objects.iter().copied());
        self.tracked.retain(|id| graph.contains(*id));

        let finder = NearestNodeFinder::from_layer(graph, LayerId::Places);
        let mut settled = Vec::new();
        let mut orphans = Vec::new();
        for &object in &objects {
            match graph.parent(object)? {
                Some(place) => {
                    if !graph.attrs(place)?.is_active {
                        settled.push(object);
                    }
                }
                None => {
                    let position = graph.attrs(object)?.position;
                    let mut hit = None;
                    finder.find(position, 1, false, |id, _, distance| {
                        hit = Some((id, distance));
                    });
                    match hit {
                        Some((place, distance)) => orphans.push((object, place, distance)),
                        None => warn!(%object, "no place available to anchor object"),
                    }
                }
            }
        }

        for (object, place, distance) in orphans {
            let bound = self.config.neighbor_max_distance;
            if bound > 0.0 && distance >= bound {
                warn!(
                    %object,
                    %place,
                    distance,
                    bound,
                    "nearest place exceeds the attachment bound; linking anyway"
                );
            }
            graph.insert_edge(object, place)?;
            // Any successful anchoring settles the object for this cycle; the
            // resync re-admits it next cycle if the place is still active.
            settled.push(object);
        }
        for object in settled {
            debug!(%object, "object settled under archived place");
            self.tracked.remove(&object);
        }
        Ok(())
    }

    /// Phase 2: discover adjacency edges for unassigned active segments.
    ///
    /// Returns the ids of existing components touched by a new edge.
    fn add_segment_edges(&mut self, graph: &mut LayeredGraph) -> UpdateResult<BTreeSet<u64>> {
        let segments: Vec<NodeId> = graph.layer_nodes(LayerId::Segments).collect();
        let mut touched = BTreeSet::new();

        for &segment in &segments {
            if self.ignored.contains(&segment) || self.node_to_component.contains_key(&segment) {
                continue;
            }
            let attrs = graph.attrs(segment)?;
            if !attrs.is_active {
                continue;
            }
            let feature = attrs.mean_feature();
            if feature.is_empty() {
                warn!(%segment, "segment carries no feature samples; ignoring");
                self.ignored.insert(segment);
                graph.attrs_mut(segment)?.is_active = false;
                continue;
            }
            let best = self.tasks.best_score(self.metric.as_ref(), &feature)?;
            if best.score < self.config.min_segment_score {
                debug!(
                    %segment,
                    score = best.score,
                    threshold = self.config.min_segment_score,
                    "segment below relevance threshold; ignoring"
                );
                self.ignored.insert(segment);
                graph.attrs_mut(segment)?.is_active = false;
                continue;
            }

            let lhs = graph.attrs(segment)?.clone();
            let policy = self.edge_policy.as_ref();
            let ignored = &self.ignored;
            let graph_ref: &LayeredGraph = graph;
            let hits: Vec<NodeId> = segments
                .par_iter()
                .filter_map(|&other| {
                    if other == segment || ignored.contains(&other) {
                        return None;
                    }
                    let rhs = graph_ref.attrs(other).ok()?;
                    if !rhs.is_active {
                        return None;
                    }
                    policy.call(&lhs, rhs).then_some(other)
                })
                .collect();

            for other in hits {
                graph.insert_edge(segment, other)?;
                if let Some(&component) = self.node_to_component.get(&other) {
                    touched.insert(component);
                }
            }
        }

        if !touched.is_empty() {
            debug!(touched = touched.len(), "new edges reach existing components");
        }
        Ok(touched)
    }

    /// Phase 3: tear down every component touched by a new edge.
    fn clear_components(
        &mut self,
        graph: &mut LayeredGraph,
        touched: &BTreeSet<u64>,
    ) -> UpdateResult<()> {
        for &component in touched {
            let Some(record) = self.components.remove(&component) else {
                continue;
            };
            for segment in &record.segments {
                self.node_to_component.remove(segment);
            }
            for &object in &record.objects {
                if graph.contains(object) {
                    graph.remove_node(object)?;
                }
                self.tracked.remove(&object);
            }
            self.component_ids.mark_free(component);
            debug!(component, "cleared component for re-detection");
        }
        Ok(())
    }

    /// Phase 4: detect components among unassigned active segments, cluster
    /// each, and materialize object nodes.
    fn detect_objects(&mut self, graph: &mut LayeredGraph) -> UpdateResult<()> {
        let global_information = self.global_information(graph)?;

        let assigned = &self.node_to_component;
        let ignored = &self.ignored;
        let graph_ref: &LayeredGraph = graph;
        let components = graph_ref.connected_components(
            LayerId::Segments,
            |id| {
                !assigned.contains_key(&id)
                    && !ignored.contains(&id)
                    && graph_ref.attrs(id).map(|a| a.is_active).unwrap_or(false)
            },
            |_, _| true,
        );

        for members in components {
            let component_id = self.component_ids.next();
            let workspace = ComponentWorkspace::from_graph(graph, LayerId::Segments, &members)?;
            let mut posteriors = Vec::with_capacity(workspace.len());
            for &id in workspace.nodes() {
                let feature = graph.attrs(id)?.mean_feature();
                let scores = self.tasks.scores(self.metric.as_ref(), &feature)?;
                posteriors.push(task_posterior(&scores, self.config.selector.temperature));
            }
            let clusters = cluster_agglomerative(
                &workspace,
                &posteriors,
                &self.config.selector,
                global_information,
            );

            let mut record = ComponentRecord {
                segments: members.iter().copied().collect(),
                objects: Vec::new(),
            };
            for &id in &members {
                self.node_to_component.insert(id, component_id);
            }
            debug!(
                component = component_id,
                segments = members.len(),
                clusters = clusters.len(),
                "detected component"
            );

            for cluster in clusters {
                if cluster.is_empty() {
                    error!(component = component_id, "clustering produced an empty cluster");
                    continue;
                }
                let attrs = self.merged_attributes(graph, &cluster)?;
                let best = self
                    .tasks
                    .best_score(self.metric.as_ref(), &attrs.mean_feature())?;
                if best.score < self.config.min_object_score {
                    debug!(
                        component = component_id,
                        score = best.score,
                        threshold = self.config.min_object_score,
                        "merged cluster below object threshold; skipping"
                    );
                    continue;
                }

                // Segment membership lives in the component record; segments
                // keep their own place parents so a replacement object can
                // inherit the same anchor after invalidation.
                let parent = self.best_parent(graph, &cluster)?;

                let object = self.next_object.advance().id();
                graph.insert_node(LayerId::Objects, object, attrs)?;
                match parent {
                    Some(place) => {
                        graph.insert_edge(object, place)?;
                    }
                    None => warn!(%object, "new object has no candidate place"),
                }
                self.tracked.insert(object);
                record.objects.push(object);
                info!(%object, component = component_id, segments = cluster.len(), task = best.task, "materialized object");
            }
            self.components.insert(component_id, record);
        }
        Ok(())
    }

    /// Mutual information between segments and tasks over the whole layer,
    /// excluding ignored and feature-less segments.
    fn global_information(&self, graph: &LayeredGraph) -> UpdateResult<f64> {
        let mut posteriors = Vec::new();
        for id in graph.layer_nodes(LayerId::Segments) {
            if self.ignored.contains(&id) {
                continue;
            }
            let feature = graph.attrs(id)?.mean_feature();
            if feature.is_empty() {
                continue;
            }
            let scores = self.tasks.scores(self.metric.as_ref(), &feature)?;
            posteriors.push(task_posterior(&scores, self.config.selector.temperature));
        }
        Ok(mutual_information(&posteriors))
    }

    /// Merged attribute bundle for one cluster.
    ///
    /// Position and feature are averaged in f64 with a single division at the
    /// end; the merged feature becomes a single-sample matrix. Everything
    /// else folds through the reducer, once per extra member.
    fn merged_attributes(
        &self,
        graph: &LayeredGraph,
        cluster: &[NodeId],
    ) -> UpdateResult<NodeAttributes> {
        let mut merged = graph.attrs(cluster[0])?.clone();
        let mut position = [0.0f64; 3];
        let mut feature: Vec<f64> = Vec::new();
        let mut feature_count = 0usize;

        for &id in cluster {
            let attrs = graph.attrs(id)?;
            for (acc, value) in position.iter_mut().zip(attrs.position.iter()) {
                *acc += value;
            }
            let mean = attrs.mean_feature();
            if !mean.is_empty() {
                if feature.is_empty() {
                    feature = vec![0.0; mean.len()];
                }
                if feature.len() == mean.len() {
                    for (acc, value) in feature.iter_mut().zip(mean.iter()) {
                        *acc += f64::from(*value);
                    }
                    feature_count += 1;
                }
            }
            if id != cluster[0] {
                self.reducer.merge(attrs, &mut merged);
            }
        }

        let n = cluster.len() as f64;
        for (out, acc) in merged.position.iter_mut().zip(position.iter()) {
            *out = acc / n;
        }
        if feature_count > 0 {
            let scale = feature_count as f64;
            merged.feature = FeatureMatrix::from_single(
                feature.iter().map(|v| (v / scale) as f32).collect(),
            );
        }
        merged.is_active = true;
        Ok(merged)
    }

    /// Best place anchor for a cluster: the segments' current place parents,
    /// archived preferred over active, lowest id first.
    fn best_parent(
        &self,
        graph: &LayeredGraph,
        cluster: &[NodeId],
    ) -> UpdateResult<Option<NodeId>> {
        let mut candidates = BTreeSet::new();
        for &segment in cluster {
            if let Some(parent) = graph.parent(segment)? {
                if graph.layer_of(parent)? == LayerId::Places {
                    candidates.insert(parent);
                }
            }
        }
        for &place in &candidates {
            if !graph.attrs(place)?.is_active {
                return Ok(Some(place));
            }
        }
        Ok(candidates.into_iter().next())
    }
}
