//! Reverse path: parsed netlist → placed and routed schematic.
//!
//! Two phases behind one entry point. Phase A ([`graph`]) lifts the netlist
//! into a node-and-port graph and a placer assigns component positions from
//! it; the engine reads back only the node coordinates. Phase B ([`route`])
//! draws Manhattan wires for every net through dedicated channels below the
//! placed components.
//!
//! The output is a [`Schematic`] that survives the forward path: running
//! connectivity analysis and netlist synthesis over it reproduces the input
//! netlist's topology.

pub mod graph;
pub mod place;
pub mod route;

use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use thiserror::Error;
use tracing::debug;

use crate::geometry::Point;
use crate::netlist::ParsedNetlist;
use crate::schema::{Component, NodeLabel, Schematic};

pub use graph::{LayoutGraph, GROUND_NODE};
pub use place::{LayeredPlacer, Placer};
pub use route::{ChannelRouter, NetPins, RouteResult, RoutedNet};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("netlist contains no layoutable components")]
    EmptyNetlist,
}

/// Lay out a parsed netlist with the default layered placer.
pub fn layout(netlist: &ParsedNetlist) -> Result<Schematic, LayoutError> {
    layout_with(netlist, &LayeredPlacer::default())
}

/// Lay out a parsed netlist with a caller-provided placer.
pub fn layout_with(
    netlist: &ParsedNetlist,
    placer: &dyn Placer,
) -> Result<Schematic, LayoutError> {
    let graph = LayoutGraph::from_netlist(netlist);
    if graph.node_count() == 0 {
        return Err(LayoutError::EmptyNetlist);
    }

    let positions = placer.place(&graph);

    let mut schematic = Schematic::new(netlist.title.clone());
    let mut centers: HashMap<NodeIndex, Point> = HashMap::new();
    let mut bottom = f64::MIN;
    for idx in graph.graph.node_indices() {
        let node = graph.node(idx);
        let top_left = positions.get(&idx).copied().unwrap_or_default();
        let center = Point::new(
            top_left.x + node.width / 2.0,
            top_left.y + node.height / 2.0,
        )
        .snapped();
        bottom = bottom.max(center.y + node.height / 2.0);
        centers.insert(idx, center);
        schematic.add_component(
            Component::new(node.name.clone(), node.component_type, center)
                .with_value(node.value.clone()),
        );
    }

    // Net pins in graph encounter order, computed from the snapped centers
    // so routing and connectivity agree on the exact coordinates. Components
    // are placed unrotated, so a pin is just center + type offset.
    let mut net_pins = Vec::with_capacity(graph.nets.len());
    for net in &graph.nets {
        let mut pins = Vec::with_capacity(net.pins.len());
        for (idx, pin) in &net.pins {
            let node = graph.node(*idx);
            let Some(&center) = centers.get(idx) else {
                continue;
            };
            let names = node.component_type.pin_names();
            if let Some(i) = names.iter().position(|n| *n == pin.as_str()) {
                let (dx, dy) = node.component_type.pin_offsets()[i];
                pins.push(Point::new(center.x + dx, center.y + dy).snapped());
            }
        }
        net_pins.push(NetPins {
            name: net.name.clone(),
            pins,
        });
    }

    let routed = ChannelRouter::new(bottom).route(&net_pins);

    // Label each non-ground net at its first pin so a later connectivity
    // pass recovers the original net names.
    for net in &net_pins {
        if net.name == GROUND_NODE {
            continue;
        }
        if let Some(p) = net.pins.first() {
            schematic.node_labels.push(NodeLabel {
                x: p.x,
                y: p.y,
                text: net.name.clone(),
            });
        }
    }

    schematic.wires = routed.wires().copied().collect();
    schematic.junctions = routed.junctions;
    schematic.directives = netlist.directives.clone();
    schematic.parameters = netlist.parameters.clone();
    let mut models: Vec<_> = netlist.models.values().cloned().collect();
    models.sort_by(|a, b| a.name.cmp(&b.name));
    schematic.models = models;

    debug!(
        components = schematic.components.len(),
        wires = schematic.wires.len(),
        junctions = schematic.junctions.len(),
        "layout complete"
    );
    Ok(schematic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GRID;
    use crate::netlist;

    fn divider() -> Schematic {
        let parsed = netlist::parse(
            "divider\nV1 n1 0 5\nR1 n1 n2 1k\nR2 n2 0 2k\n.tran 1u 10m\n.end\n",
        );
        layout(&parsed).unwrap()
    }

    #[test]
    fn components_and_ground_are_placed() {
        let sch = divider();
        assert_eq!(sch.components.len(), 4);
        assert!(sch.component("V1").is_some());
        assert!(sch.component(GROUND_NODE).is_some());
        assert_eq!(sch.component("R1").unwrap().value(), "1k");
    }

    #[test]
    fn positions_and_wires_are_grid_aligned() {
        let sch = divider();
        for c in &sch.components {
            assert_eq!(c.position.x % GRID, 0.0);
            assert_eq!(c.position.y % GRID, 0.0);
        }
        assert!(!sch.wires.is_empty());
        for w in &sch.wires {
            for v in [w.x1, w.y1, w.x2, w.y2] {
                assert_eq!(v % GRID, 0.0);
            }
        }
    }

    #[test]
    fn net_labels_and_directives_carried() {
        let sch = divider();
        let labels: Vec<&str> = sch.node_labels.iter().map(|l| l.text.as_str()).collect();
        assert!(labels.contains(&"n1"));
        assert!(labels.contains(&"n2"));
        assert!(!labels.contains(&"0"));
        assert_eq!(sch.directives, vec![".tran 1u 10m"]);
        assert_eq!(sch.metadata.title, "divider");
    }

    #[test]
    fn ground_net_gets_a_junction() {
        // Three pins on net 0 (V1, R2, ground symbol) meet at a channel
        let sch = divider();
        assert!(!sch.junctions.is_empty());
    }

    #[test]
    fn net_labels_sit_on_component_pins() {
        // Labels are placed at each net's first routed pin; those positions
        // must coincide with the schematic's own pin geometry.
        let parsed = netlist::parse(
            "amp\nV1 vin 0 5\nQ1 c vin e 2N2222\nR1 c 0 1k\nR2 e 0 220\n.end\n",
        );
        let sch = layout(&parsed).unwrap();
        assert!(!sch.node_labels.is_empty());
        let pin_points: Vec<Point> = sch
            .components
            .iter()
            .flat_map(|c| c.pin_positions().into_iter().map(|(_, p)| p))
            .collect();
        for label in &sch.node_labels {
            assert!(
                pin_points
                    .iter()
                    .any(|p| p.x == label.x && p.y == label.y),
                "label {} at ({}, {}) is not on a pin",
                label.text,
                label.x,
                label.y
            );
        }
    }

    #[test]
    fn empty_netlist_is_an_error() {
        let parsed = netlist::parse("empty\n.end\n");
        assert!(matches!(layout(&parsed), Err(LayoutError::EmptyNetlist)));
    }
}
