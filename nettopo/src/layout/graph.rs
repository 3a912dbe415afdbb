//! Layout phase A: netlist → node-and-port graph.
//!
//! One graph node per component (sized from the type dimension table) plus
//! one synthetic ground node; one port per pin at the type's fixed offset,
//! converted from the center-relative schematic frame to the placer's
//! top-left-relative frame; one edge per pair of same-net pins, star
//! topology from the first pin encountered per net.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tracing::warn;

use crate::geometry::Point;
use crate::netlist::ParsedNetlist;
use crate::schema::ComponentType;

/// Name of the synthetic ground node.
pub const GROUND_NODE: &str = "0";

/// A port: one pin of a node, positioned top-left-relative.
#[derive(Debug, Clone)]
pub struct Port {
    pub pin: String,
    /// Net this port belongs to.
    pub net: String,
    /// Offset from the node's top-left corner.
    pub offset: Point,
}

/// A graph node: one component, or the synthetic ground.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub name: String,
    pub component_type: ComponentType,
    pub value: String,
    pub width: f64,
    pub height: f64,
    pub ports: Vec<Port>,
}

impl LayoutNode {
    /// Absolute position of a port given the node's top-left corner.
    pub fn port_position(&self, pin: &str, top_left: Point) -> Option<Point> {
        self.ports.iter().find(|p| p.pin == pin).map(|p| {
            Point::new(top_left.x + p.offset.x, top_left.y + p.offset.y)
        })
    }
}

/// Edge between two nodes sharing a net, tagged with the net's identity for
/// routing-channel disambiguation.
#[derive(Debug, Clone)]
pub struct LayoutEdge {
    pub net: String,
}

/// One net's membership: (node, pin) pairs in encounter order.
#[derive(Debug, Clone)]
pub struct NetMembers {
    pub name: String,
    pub pins: Vec<(NodeIndex, String)>,
}

/// The node-and-port graph consumed by the placer and the router.
pub struct LayoutGraph {
    pub graph: StableDiGraph<LayoutNode, LayoutEdge>,
    /// Nets in first-encounter order.
    pub nets: Vec<NetMembers>,
    indices: HashMap<String, NodeIndex>,
}

impl LayoutGraph {
    /// Build the graph from a parsed netlist. Components with an unknown
    /// type are skipped with a warning.
    pub fn from_netlist(netlist: &ParsedNetlist) -> Self {
        let mut graph = StableDiGraph::new();
        let mut indices = HashMap::new();
        let mut nets: Vec<NetMembers> = Vec::new();
        let mut net_order: HashMap<String, usize> = HashMap::new();

        let uses_ground = netlist
            .components
            .iter()
            .any(|c| c.nodes.iter().any(|n| n == GROUND_NODE));

        for component in &netlist.components {
            let Some(component_type) = component.component_type else {
                warn!(name = %component.name, "skipping component with unknown type");
                continue;
            };
            let (width, height) = component_type.dimensions();

            let mut ports = Vec::new();
            for (i, pin) in component_type.pin_names().iter().enumerate() {
                let Some(net) = component.nodes.get(i) else {
                    continue;
                };
                let (dx, dy) = component_type.pin_offsets()[i];
                ports.push(Port {
                    pin: pin.to_string(),
                    net: net.clone(),
                    // Center-relative → top-left-relative
                    offset: Point::new(dx + width / 2.0, dy + height / 2.0),
                });
            }

            let idx = graph.add_node(LayoutNode {
                name: component.name.clone(),
                component_type,
                value: component.value.clone(),
                width,
                height,
                ports,
            });
            indices.insert(component.name.clone(), idx);

            for (i, pin) in component_type.pin_names().iter().enumerate() {
                let Some(net) = component.nodes.get(i) else {
                    continue;
                };
                let slot = *net_order.entry(net.clone()).or_insert_with(|| {
                    nets.push(NetMembers {
                        name: net.clone(),
                        pins: Vec::new(),
                    });
                    nets.len() - 1
                });
                nets[slot].pins.push((idx, pin.to_string()));
            }
        }

        // Synthetic ground node: joins every "0" connection.
        if uses_ground {
            let (width, height) = ComponentType::Ground.dimensions();
            let (dx, dy) = ComponentType::Ground.pin_offsets()[0];
            let idx = graph.add_node(LayoutNode {
                name: GROUND_NODE.to_string(),
                component_type: ComponentType::Ground,
                value: String::new(),
                width,
                height,
                ports: vec![Port {
                    pin: "1".to_string(),
                    net: GROUND_NODE.to_string(),
                    offset: Point::new(dx + width / 2.0, dy + height / 2.0),
                }],
            });
            indices.insert(GROUND_NODE.to_string(), idx);
            if let Some(slot) = net_order.get(GROUND_NODE) {
                nets[*slot].pins.push((idx, "1".to_string()));
            }
        }

        // Star edges: first pin of each net to every other member.
        let edges: Vec<(NodeIndex, NodeIndex, String)> = nets
            .iter()
            .flat_map(|net| {
                let first = net.pins.first().map(|(idx, _)| *idx);
                net.pins
                    .iter()
                    .skip(1)
                    .filter_map(move |(idx, _)| {
                        let from = first?;
                        (from != *idx).then_some((from, *idx, net.name.clone()))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        for (from, to, net) in edges {
            graph.add_edge(from, to, LayoutEdge { net });
        }

        Self {
            graph,
            nets,
            indices,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.indices.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &LayoutNode {
        &self.graph[idx]
    }
}
