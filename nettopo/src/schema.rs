//! Schematic data model: components, wires, junctions, and the aggregate
//! exchanged between the forward (schematic → netlist) and reverse
//! (netlist → schematic) paths.
//!
//! Component geometry (pin offsets, body sizes) and netlist behaviour
//! (prefix letter, pin order) dispatch on the closed [`ComponentType`] enum,
//! so adding a type is a compile-time exhaustiveness exercise instead of a
//! lookup-table miss.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{transform_offset, Point};

/// Closed enumeration of supported component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    VoltageSource,
    CurrentSource,
    Ground,
    NpnTransistor,
    PnpTransistor,
    NmosTransistor,
    PmosTransistor,
}

impl ComponentType {
    /// SPICE element prefix letter. Ground is not a netlist element and has
    /// no prefix.
    pub fn prefix(&self) -> Option<char> {
        match self {
            ComponentType::Resistor => Some('R'),
            ComponentType::Capacitor => Some('C'),
            ComponentType::Inductor => Some('L'),
            ComponentType::Diode => Some('D'),
            ComponentType::VoltageSource => Some('V'),
            ComponentType::CurrentSource => Some('I'),
            ComponentType::Ground => None,
            ComponentType::NpnTransistor | ComponentType::PnpTransistor => Some('Q'),
            ComponentType::NmosTransistor | ComponentType::PmosTransistor => Some('M'),
        }
    }

    /// Base type for a netlist prefix letter. `Q` and `M` default to the
    /// N-flavoured variant until a `.model` line says otherwise.
    pub fn from_prefix(prefix: char) -> Option<ComponentType> {
        match prefix.to_ascii_uppercase() {
            'R' => Some(ComponentType::Resistor),
            'C' => Some(ComponentType::Capacitor),
            'L' => Some(ComponentType::Inductor),
            'D' => Some(ComponentType::Diode),
            'V' => Some(ComponentType::VoltageSource),
            'I' => Some(ComponentType::CurrentSource),
            'Q' => Some(ComponentType::NpnTransistor),
            'M' => Some(ComponentType::NmosTransistor),
            _ => None,
        }
    }

    /// Pin names in the fixed netlist order for this type.
    ///
    /// Diode = [Anode, Cathode]; BJT = [Collector, Base, Emitter];
    /// MOSFET = [Drain, Gate, Source].
    pub fn pin_names(&self) -> &'static [&'static str] {
        match self {
            ComponentType::Resistor
            | ComponentType::Capacitor
            | ComponentType::Inductor
            | ComponentType::CurrentSource => &["1", "2"],
            ComponentType::VoltageSource => &["+", "-"],
            ComponentType::Diode => &["A", "K"],
            ComponentType::Ground => &["1"],
            ComponentType::NpnTransistor | ComponentType::PnpTransistor => &["C", "B", "E"],
            ComponentType::NmosTransistor | ComponentType::PmosTransistor => &["D", "G", "S"],
        }
    }

    /// Local pin offsets (pre-rotation, pre-mirror), in netlist pin order.
    /// Two-terminal components are drawn vertically at rotation 0.
    pub fn pin_offsets(&self) -> &'static [(f64, f64)] {
        match self {
            ComponentType::Resistor
            | ComponentType::Capacitor
            | ComponentType::Inductor
            | ComponentType::CurrentSource
            | ComponentType::Diode
            | ComponentType::VoltageSource => &[(0.0, -30.0), (0.0, 30.0)],
            ComponentType::Ground => &[(0.0, -10.0)],
            ComponentType::NpnTransistor | ComponentType::PnpTransistor => {
                // Collector, Base, Emitter
                &[(30.0, -30.0), (-30.0, 0.0), (30.0, 30.0)]
            }
            ComponentType::NmosTransistor | ComponentType::PmosTransistor => {
                // Drain, Gate, Source
                &[(30.0, -30.0), (-30.0, 0.0), (30.0, 30.0)]
            }
        }
    }

    /// Body dimensions (width, height) used by the layout engine.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            ComponentType::Resistor
            | ComponentType::Capacitor
            | ComponentType::Inductor
            | ComponentType::CurrentSource
            | ComponentType::Diode
            | ComponentType::VoltageSource => (40.0, 60.0),
            ComponentType::Ground => (20.0, 20.0),
            ComponentType::NpnTransistor
            | ComponentType::PnpTransistor
            | ComponentType::NmosTransistor
            | ComponentType::PmosTransistor => (60.0, 60.0),
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, ComponentType::Ground)
    }
}

/// A placed component instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub component_type: ComponentType,
    pub position: Point,
    /// Rotation in degrees: 0, 90, 180 or 270.
    pub rotation: u16,
    pub mirror: bool,
    /// Free-form attributes. Always contains `name` (instance name) and
    /// `value`.
    pub attributes: HashMap<String, String>,
}

impl Component {
    pub fn new(id: impl Into<String>, component_type: ComponentType, position: Point) -> Self {
        let id = id.into();
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), id.clone());
        attributes.insert("value".to_string(), String::new());
        Self {
            id,
            component_type,
            position,
            rotation: 0,
            mirror: false,
            attributes,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.attributes.insert("value".to_string(), value.into());
        self
    }

    pub fn with_rotation(mut self, rotation: u16) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Instance name used in netlist lines (falls back to the id).
    pub fn name(&self) -> &str {
        self.attributes.get("name").map(|s| s.as_str()).unwrap_or(&self.id)
    }

    pub fn value(&self) -> &str {
        self.attributes.get("value").map(|s| s.as_str()).unwrap_or("")
    }

    /// Absolute pin positions in netlist pin order.
    pub fn pin_positions(&self) -> Vec<(&'static str, Point)> {
        self.component_type
            .pin_names()
            .iter()
            .zip(self.component_type.pin_offsets())
            .map(|(name, &(dx, dy))| {
                let p = transform_offset(
                    Point::new(dx, dy),
                    self.rotation,
                    self.mirror,
                    self.position,
                );
                (*name, p)
            })
            .collect()
    }
}

/// A single straight wire segment. Valid wires are axis-aligned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Wire {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Wire {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn endpoints(&self) -> (Point, Point) {
        (Point::new(self.x1, self.y1), Point::new(self.x2, self.y2))
    }
}

/// Explicit marker that wires meeting at this point are electrically joined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Junction {
    pub x: f64,
    pub y: f64,
}

impl Junction {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A symbolic net name attached to a position on a wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// A `.model` definition: model name, device type, and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiceModel {
    pub name: String,
    pub model_type: String,
    pub params: HashMap<String, String>,
}

/// Schematic metadata carried through serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchematicMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// The schematic aggregate: the persisted/exchanged unit between the
/// forward and reverse paths.
///
/// Connectivity (nets, pin connections) is derived on demand from this
/// geometry and never stored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schematic {
    pub components: Vec<Component>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    #[serde(default)]
    pub node_labels: Vec<NodeLabel>,
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default)]
    pub models: Vec<SpiceModel>,
    #[serde(default)]
    pub metadata: SchematicMetadata,
}

impl Schematic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            metadata: SchematicMetadata {
                title: title.into(),
                created: Some(Utc::now()),
                modified: None,
            },
            ..Default::default()
        }
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn add_wire(&mut self, wire: Wire) {
        self.wires.push(wire);
    }

    pub fn add_junction(&mut self, junction: Junction) {
        self.junctions.push(junction);
    }

    pub fn remove_component(&mut self, id: &str) -> Option<Component> {
        let idx = self.components.iter().position(|c| c.id == id)?;
        Some(self.components.remove(idx))
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn model(&self, name: &str) -> Option<&SpiceModel> {
        self.models.iter().find(|m| m.name == name)
    }
}

/// Per-prefix instance-name allocator.
///
/// Passed explicitly into placement and generation so there is no ambient
/// counter state; `next('R')` yields `R1`, `R2`, ...
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    counters: HashMap<char, u32>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: char) -> String {
        let n = self.counters.entry(prefix).or_insert(0);
        *n += 1;
        format!("{}{}", prefix, n)
    }

    /// Record an existing name so future allocations do not collide.
    pub fn reserve(&mut self, name: &str) {
        let mut chars = name.chars();
        let Some(prefix) = chars.next() else { return };
        if let Ok(n) = chars.as_str().parse::<u32>() {
            let entry = self.counters.entry(prefix.to_ascii_uppercase()).or_insert(0);
            if n > *entry {
                *entry = n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_order_is_type_specific() {
        assert_eq!(ComponentType::Diode.pin_names(), &["A", "K"]);
        assert_eq!(ComponentType::NpnTransistor.pin_names(), &["C", "B", "E"]);
        assert_eq!(ComponentType::NmosTransistor.pin_names(), &["D", "G", "S"]);
        assert_eq!(ComponentType::Resistor.pin_names(), &["1", "2"]);
    }

    #[test]
    fn ground_has_no_prefix() {
        assert_eq!(ComponentType::Ground.prefix(), None);
        assert_eq!(ComponentType::Resistor.prefix(), Some('R'));
        assert_eq!(ComponentType::PnpTransistor.prefix(), Some('Q'));
    }

    #[test]
    fn prefix_roundtrip_for_netlist_elements() {
        for prefix in ['R', 'C', 'L', 'D', 'V', 'I', 'Q', 'M'] {
            let ty = ComponentType::from_prefix(prefix).unwrap();
            assert_eq!(ty.prefix(), Some(prefix));
        }
        assert!(ComponentType::from_prefix('X').is_none());
    }

    #[test]
    fn pin_positions_follow_rotation() {
        let c = Component::new("R1", ComponentType::Resistor, Point::new(100.0, 100.0))
            .with_rotation(90);
        let pins = c.pin_positions();
        assert_eq!(pins[0].1, Point::new(130.0, 100.0));
        assert_eq!(pins[1].1, Point::new(70.0, 100.0));
    }

    #[test]
    fn name_allocator_is_per_prefix() {
        let mut names = NameAllocator::new();
        assert_eq!(names.next('R'), "R1");
        assert_eq!(names.next('R'), "R2");
        assert_eq!(names.next('C'), "C1");

        names.reserve("R7");
        assert_eq!(names.next('R'), "R8");
    }

    #[test]
    fn aggregate_serde_roundtrip() {
        let mut sch = Schematic::new("test");
        sch.add_component(
            Component::new("R1", ComponentType::Resistor, Point::new(100.0, 100.0))
                .with_value("10k"),
        );
        sch.add_wire(Wire::new(100.0, 130.0, 100.0, 200.0));
        sch.add_junction(Junction { x: 100.0, y: 200.0 });
        sch.parameters.insert("rload".to_string(), "1k".to_string());

        let json = serde_json::to_string(&sch).unwrap();
        let back: Schematic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.components.len(), 1);
        assert_eq!(back.components[0].value(), "10k");
        assert_eq!(back.wires.len(), 1);
        assert_eq!(back.parameters.get("rload").map(|s| s.as_str()), Some("1k"));
    }
}
