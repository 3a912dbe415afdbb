//! Layer/position assignment behind the [`Placer`] seam.
//!
//! The routing phase only ever consumes node coordinates from this contract;
//! whatever internal edge geometry a placer computes is discarded. The
//! default [`LayeredPlacer`] does constraint-based layered placement:
//! longest-path layering downward, barycenter ordering within layers, and
//! generous spacing to leave room for the channel router.

use std::collections::{HashMap, VecDeque};

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, NodeIndexable};
use petgraph::Direction;
use tracing::debug;

use crate::geometry::Point;
use crate::layout::graph::LayoutGraph;
use crate::schema::ComponentType;

/// Position-assignment contract: graph in, top-left node coordinates out.
pub trait Placer {
    fn place(&self, graph: &LayoutGraph) -> HashMap<NodeIndex, Point>;
}

/// Default layered placement.
#[derive(Debug, Clone)]
pub struct LayeredPlacer {
    /// Vertical distance between layer tops.
    pub layer_gap: f64,
    /// Horizontal distance between node left edges within a layer.
    pub node_gap: f64,
    /// Top-left margin of the whole placement.
    pub margin: f64,
}

impl Default for LayeredPlacer {
    fn default() -> Self {
        Self {
            layer_gap: 140.0,
            node_gap: 100.0,
            margin: 40.0,
        }
    }
}

impl Placer for LayeredPlacer {
    fn place(&self, graph: &LayoutGraph) -> HashMap<NodeIndex, Point> {
        let layers = self.assign_layers(graph);
        let ordered = self.order_within_layers(graph, &layers);

        let mut positions = HashMap::new();
        for (layer, nodes) in ordered.iter().enumerate() {
            let y = self.margin + layer as f64 * self.layer_gap;
            let mut x = self.margin;
            for &idx in nodes {
                positions.insert(idx, Point::new(x, y));
                x += graph.node(idx).width + self.node_gap;
            }
        }

        debug!(
            nodes = positions.len(),
            layers = ordered.len(),
            "placement complete"
        );
        positions
    }
}

impl LayeredPlacer {
    /// Longest-path layering over the star edges. Cycles (feedback paths)
    /// are broken by processing whatever remains after Kahn's queue drains.
    /// The synthetic ground node is forced to the bottom layer.
    fn assign_layers(&self, graph: &LayoutGraph) -> HashMap<NodeIndex, usize> {
        let g = &graph.graph;
        let mut in_degree: HashMap<NodeIndex, usize> = g
            .node_indices()
            .map(|n| (n, g.edges_directed(n, Direction::Incoming).count()))
            .collect();

        let mut queue: VecDeque<NodeIndex> = g
            .node_indices()
            .filter(|n| in_degree[n] == 0)
            .collect();
        let mut order: Vec<NodeIndex> = Vec::with_capacity(g.node_count());
        let mut queued: Vec<bool> = vec![false; g.node_bound()];
        for n in &queue {
            queued[n.index()] = true;
        }

        while order.len() < g.node_count() {
            let next = match queue.pop_front() {
                Some(n) => n,
                None => {
                    // Cycle: pick the lowest-index unvisited node
                    match g.node_indices().find(|n| !queued[n.index()]) {
                        Some(n) => {
                            queued[n.index()] = true;
                            n
                        }
                        None => break,
                    }
                }
            };
            order.push(next);
            for edge in g.edges_directed(next, Direction::Outgoing) {
                let t = edge.target();
                if queued[t.index()] {
                    continue;
                }
                if let Some(d) = in_degree.get_mut(&t) {
                    *d = d.saturating_sub(1);
                    if *d == 0 {
                        queued[t.index()] = true;
                        queue.push_back(t);
                    }
                }
            }
        }

        let mut layers: HashMap<NodeIndex, usize> = HashMap::new();
        for &n in &order {
            let layer = g
                .edges_directed(n, Direction::Incoming)
                .filter_map(|e| layers.get(&e.source()).map(|l| l + 1))
                .max()
                .unwrap_or(0);
            layers.insert(n, layer);
        }

        let max_layer = layers.values().copied().max().unwrap_or(0);
        for n in g.node_indices() {
            if graph.node(n).component_type == ComponentType::Ground {
                layers.insert(n, max_layer + 1);
            }
        }
        layers
    }

    /// Order nodes within each layer by the barycenter of their neighbors'
    /// positions in the previous layer; ties keep insertion order.
    fn order_within_layers(
        &self,
        graph: &LayoutGraph,
        layers: &HashMap<NodeIndex, usize>,
    ) -> Vec<Vec<NodeIndex>> {
        let g = &graph.graph;
        let max_layer = layers.values().copied().max().unwrap_or(0);
        let mut by_layer: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_layer + 1];
        for n in g.node_indices() {
            by_layer[layers[&n]].push(n);
        }

        let mut slot: HashMap<NodeIndex, usize> = HashMap::new();
        for (i, &n) in by_layer[0].iter().enumerate() {
            slot.insert(n, i);
        }

        for layer in 1..by_layer.len() {
            let mut keyed: Vec<(f64, usize, NodeIndex)> = by_layer[layer]
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    let neighbor_slots: Vec<usize> = g
                        .edges_directed(n, Direction::Incoming)
                        .filter_map(|e| slot.get(&e.source()).copied())
                        .collect();
                    let barycenter = if neighbor_slots.is_empty() {
                        i as f64
                    } else {
                        neighbor_slots.iter().sum::<usize>() as f64
                            / neighbor_slots.len() as f64
                    };
                    (barycenter, i, n)
                })
                .collect();
            keyed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            by_layer[layer] = keyed.iter().map(|&(_, _, n)| n).collect();
            for (i, &n) in by_layer[layer].iter().enumerate() {
                slot.insert(n, i);
            }
        }

        by_layer
    }
}
