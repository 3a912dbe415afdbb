//! Connectivity analysis: derives electrical nets from wire, junction, and
//! component-pin geometry.
//!
//! Every distinct rounded coordinate is interned once into a dense arena and
//! the equivalence classes are computed with union–find over integer ids.
//! The whole analysis is a pure function of the schematic; scratch state is
//! allocated per call and discarded.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::geometry::{is_axis_aligned, point_on_segment, Point, SNAP_TOLERANCE};
use crate::schema::Schematic;

/// An electrical net: the equivalence class of connected coordinates.
#[derive(Debug, Clone)]
pub struct Net {
    /// Derived name: `"0"` for ground, a label text, or a sequential integer.
    pub name: String,
    pub is_ground: bool,
    /// Member coordinates (rounded), in arena encounter order.
    pub points: Vec<Point>,
}

/// A resolved component pin.
#[derive(Debug, Clone)]
pub struct PinConnection {
    pub component_id: String,
    pub pin_name: String,
    pub position: Point,
    /// Index into [`ConnectivityResult::nets`]. Floating pins get their own
    /// singleton net, so this is never missing.
    pub net: usize,
}

/// Output of [`analyze`].
#[derive(Debug, Clone, Default)]
pub struct ConnectivityResult {
    pub nets: Vec<Net>,
    pub pin_connections: Vec<PinConnection>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConnectivityResult {
    pub fn net_for_pin(&self, component_id: &str, pin_name: &str) -> Option<&Net> {
        self.pin_connections
            .iter()
            .find(|pc| pc.component_id == component_id && pc.pin_name == pin_name)
            .map(|pc| &self.nets[pc.net])
    }

    pub fn net_name_for_pin(&self, component_id: &str, pin_name: &str) -> Option<&str> {
        self.net_for_pin(component_id, pin_name).map(|n| n.name.as_str())
    }
}

/// Dense coordinate arena plus union–find over the interned ids.
struct PointArena {
    ids: HashMap<(i64, i64), u32>,
    points: Vec<(i64, i64)>,
    parent: Vec<u32>,
    /// Whether a wire endpoint or junction was interned at this point.
    has_wire: Vec<bool>,
}

impl PointArena {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            points: Vec::new(),
            parent: Vec::new(),
            has_wire: Vec::new(),
        }
    }

    fn intern(&mut self, p: Point, from_wire: bool) -> u32 {
        let key = p.key();
        let id = match self.ids.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.points.len() as u32;
                self.ids.insert(key, id);
                self.points.push(key);
                self.parent.push(id);
                self.has_wire.push(false);
                id
            }
        };
        if from_wire {
            self.has_wire[id as usize] = true;
        }
        id
    }

    fn find(&mut self, mut i: u32) -> u32 {
        // Path halving
        while self.parent[i as usize] != i {
            let grandparent = self.parent[self.parent[i as usize] as usize];
            self.parent[i as usize] = grandparent;
            i = grandparent;
        }
        i
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra as usize] = rb;
        }
    }
}

/// Analyze a schematic and derive its nets and pin connections.
///
/// Deterministic: iteration follows input order everywhere, so two calls on
/// an unchanged schematic produce identical net names and pin mappings.
pub fn analyze(schematic: &Schematic) -> ConnectivityResult {
    let mut arena = PointArena::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Diagonal wires are rejected up front and excluded from the union.
    let mut wires = Vec::with_capacity(schematic.wires.len());
    for wire in &schematic.wires {
        let (a, b) = wire.endpoints();
        if !is_axis_aligned(a, b) {
            errors.push(format!(
                "diagonal wire rejected: ({}, {}) - ({}, {})",
                wire.x1, wire.y1, wire.x2, wire.y2
            ));
            continue;
        }
        wires.push((a, b));
    }

    // Step 1: union each wire's endpoints. Coincident endpoints across
    // wires collapse to the same arena id via coordinate rounding.
    for &(a, b) in &wires {
        let ia = arena.intern(a, true);
        let ib = arena.intern(b, true);
        arena.union(ia, ib);
    }

    // Step 2: union junctions with any wire they lie on.
    for junction in &schematic.junctions {
        let p = junction.position();
        let ij = arena.intern(p, true);
        for &(a, b) in &wires {
            if point_on_segment(p, a, b, SNAP_TOLERANCE) {
                let ia = arena.intern(a, true);
                arena.union(ij, ia);
            }
        }
    }

    // Step 3: attach component pins. A pin connects when it coincides with
    // a wire endpoint (same rounded coordinate) or lies on a wire segment.
    let mut pin_entries: Vec<(String, String, Point, u32)> = Vec::new();
    let mut pins_at: HashMap<u32, u32> = HashMap::new();
    for component in &schematic.components {
        for (pin_name, pos) in component.pin_positions() {
            let ip = arena.intern(pos, false);
            for &(a, b) in &wires {
                if point_on_segment(pos, a, b, SNAP_TOLERANCE) {
                    let ia = arena.intern(a, true);
                    arena.union(ip, ia);
                }
            }
            *pins_at.entry(ip).or_insert(0) += 1;
            pin_entries.push((component.id.clone(), pin_name.to_string(), pos, ip));
        }
    }

    // Ground roots: any root reachable from a ground-component pin.
    let mut ground_roots: Vec<u32> = Vec::new();
    for component in &schematic.components {
        if component.component_type.is_ground() {
            for (_, pos) in component.pin_positions() {
                let id = arena.intern(pos, false);
                let root = arena.find(id);
                if !ground_roots.contains(&root) {
                    ground_roots.push(root);
                }
            }
        }
    }

    // Symbolic names: a node label lying on a wire names that wire's net.
    let mut root_labels: HashMap<u32, String> = HashMap::new();
    for label in &schematic.node_labels {
        let p = Point::new(label.x, label.y);
        for &(a, b) in &wires {
            if point_on_segment(p, a, b, SNAP_TOLERANCE) {
                let ia = arena.intern(a, true);
                let root = arena.find(ia);
                root_labels.entry(root).or_insert_with(|| label.text.clone());
                break;
            }
        }
    }

    // Materialize one net per root, in arena encounter order.
    let mut root_to_net: HashMap<u32, usize> = HashMap::new();
    let mut nets: Vec<Net> = Vec::new();
    let mut next_number = 1u32;
    for id in 0..arena.points.len() as u32 {
        let root = arena.find(id);
        let net_idx = *root_to_net.entry(root).or_insert_with(|| {
            let is_ground = ground_roots.contains(&root);
            let name = if is_ground {
                "0".to_string()
            } else if let Some(label) = root_labels.get(&root) {
                label.clone()
            } else {
                let n = next_number.to_string();
                next_number += 1;
                n
            };
            nets.push(Net {
                name,
                is_ground,
                points: Vec::new(),
            });
            nets.len() - 1
        });
        let (x, y) = arena.points[id as usize];
        nets[net_idx].points.push(Point::new(x as f64, y as f64));
    }

    // Resolve pins. A pin whose root holds nothing but the pin itself is
    // floating; it keeps its singleton net and raises a warning.
    let mut root_members: HashMap<u32, u32> = HashMap::new();
    for id in 0..arena.points.len() as u32 {
        let root = arena.find(id);
        *root_members.entry(root).or_insert(0) += 1;
    }

    let mut pin_connections = Vec::with_capacity(pin_entries.len());
    for (component_id, pin_name, position, ip) in pin_entries {
        let root = arena.find(ip);
        let attached = arena.has_wire[ip as usize]
            || root_members.get(&root).copied().unwrap_or(0) > 1
            || pins_at.get(&ip).copied().unwrap_or(0) > 1;
        if !attached {
            warn!(component = %component_id, pin = %pin_name, "floating pin");
            warnings.push(format!(
                "floating pin: {} pin {} at ({}, {})",
                component_id, pin_name, position.x, position.y
            ));
        }
        let net = root_to_net[&root];
        pin_connections.push(PinConnection {
            component_id,
            pin_name,
            position,
            net,
        });
    }

    debug!(
        nets = nets.len(),
        pins = pin_connections.len(),
        warnings = warnings.len(),
        "connectivity analysis complete"
    );

    ConnectivityResult {
        nets,
        pin_connections,
        warnings,
        errors,
    }
}
