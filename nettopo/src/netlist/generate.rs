//! Netlist synthesis: schematic + connectivity → SPICE component statements.

use tracing::debug;

use crate::connectivity::{self, ConnectivityResult};
use crate::schema::Schematic;

/// One netlist element line, structured.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiceComponent {
    pub prefix: char,
    pub name: String,
    /// Node names in the component's fixed pin order.
    pub nodes: Vec<String>,
    pub value: String,
    /// Extra parameters appended after the value, if any.
    pub params: Vec<String>,
}

impl SpiceComponent {
    /// Render as a netlist line: `<prefix><name> <node...> <value> [extra]`.
    pub fn to_line(&self) -> String {
        let mut line = self.name.clone();
        for node in &self.nodes {
            line.push(' ');
            line.push_str(node);
        }
        if !self.value.is_empty() {
            line.push(' ');
            line.push_str(&self.value);
        }
        for p in &self.params {
            line.push(' ');
            line.push_str(p);
        }
        line
    }
}

/// Output of [`generate`]: components plus directives, with connectivity
/// diagnostics carried along. Errors never abort synthesis; the netlist is
/// still emitted so the caller sees partial results.
#[derive(Debug, Clone, Default)]
pub struct NetlistResult {
    pub title: String,
    pub components: Vec<SpiceComponent>,
    pub directives: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Generate netlist statements from a schematic.
///
/// Ground components are skipped (they only define the `"0"` node). Pins
/// that resolve to no net emit `"?"` and record an error.
pub fn generate(schematic: &Schematic, title: &str) -> NetlistResult {
    let connectivity = connectivity::analyze(schematic);
    generate_with_connectivity(schematic, title, &connectivity)
}

/// Like [`generate`], for callers that already hold a connectivity result.
pub fn generate_with_connectivity(
    schematic: &Schematic,
    title: &str,
    connectivity: &ConnectivityResult,
) -> NetlistResult {
    let mut result = NetlistResult {
        title: title.to_string(),
        warnings: connectivity.warnings.clone(),
        errors: connectivity.errors.clone(),
        ..Default::default()
    };

    for component in &schematic.components {
        let Some(prefix) = component.component_type.prefix() else {
            continue; // ground symbol
        };

        let mut nodes = Vec::new();
        for pin in component.component_type.pin_names() {
            match connectivity.net_name_for_pin(&component.id, pin) {
                Some(net) => nodes.push(net.to_string()),
                None => {
                    result.errors.push(format!(
                        "unresolved node for {} pin {}",
                        component.name(),
                        pin
                    ));
                    nodes.push("?".to_string());
                }
            }
        }

        let name = component.name().to_string();
        let name = if name
            .chars()
            .next()
            .map(|c| c.eq_ignore_ascii_case(&prefix))
            .unwrap_or(false)
        {
            name
        } else {
            format!("{}{}", prefix, name)
        };

        result.components.push(SpiceComponent {
            prefix,
            name,
            nodes,
            value: component.value().to_string(),
            params: Vec::new(),
        });
    }

    for directive in &schematic.directives {
        result.directives.push(directive.clone());
    }
    let has_analysis = result.directives.iter().any(|d| {
        let d = d.to_ascii_lowercase();
        d.starts_with(".tran") || d.starts_with(".ac") || d.starts_with(".dc") || d.starts_with(".op")
    });
    if !has_analysis {
        result.directives.push(".tran 1u 10m".to_string());
    }

    debug!(
        components = result.components.len(),
        errors = result.errors.len(),
        "netlist generated"
    );
    result
}

/// Serialize a [`NetlistResult`] to SPICE text.
///
/// Warnings and errors appear as comment lines so the user sees them in the
/// exported netlist without the export failing.
pub fn to_text(result: &NetlistResult) -> String {
    let mut out = String::new();
    out.push_str(&result.title);
    out.push('\n');

    for warning in &result.warnings {
        out.push_str("* warning: ");
        out.push_str(warning);
        out.push('\n');
    }
    for error in &result.errors {
        out.push_str("* error: ");
        out.push_str(error);
        out.push('\n');
    }

    for component in &result.components {
        out.push_str(&component.to_line());
        out.push('\n');
    }
    for directive in &result.directives {
        out.push_str(directive);
        out.push('\n');
    }
    out.push_str(".end\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::schema::{Component, ComponentType, Wire};

    fn divider() -> Schematic {
        let mut sch = Schematic::new("divider");
        sch.add_component(
            Component::new("V1", ComponentType::VoltageSource, Point::new(100.0, 100.0))
                .with_value("5"),
        );
        sch.add_component(
            Component::new("R1", ComponentType::Resistor, Point::new(200.0, 100.0))
                .with_value("1k"),
        );
        sch.add_component(Component::new(
            "GND1",
            ComponentType::Ground,
            Point::new(100.0, 180.0),
        ));
        // V1.+ -> R1.1
        sch.add_wire(Wire::new(100.0, 70.0, 200.0, 70.0));
        // R1.2 -> V1.- through the ground pin at (100, 170)
        sch.add_wire(Wire::new(200.0, 130.0, 200.0, 170.0));
        sch.add_wire(Wire::new(200.0, 170.0, 100.0, 170.0));
        sch.add_wire(Wire::new(100.0, 170.0, 100.0, 130.0));
        sch
    }

    #[test]
    fn ground_components_are_skipped() {
        let result = generate(&divider(), "divider");
        assert_eq!(result.components.len(), 2);
        assert!(result.components.iter().all(|c| c.prefix != ' '));
    }

    #[test]
    fn nodes_follow_pin_order() {
        let result = generate(&divider(), "divider");
        let v1 = result.components.iter().find(|c| c.name == "V1").unwrap();
        let r1 = result.components.iter().find(|c| c.name == "R1").unwrap();

        // V1.+ shares a node with R1.1; V1.- is ground
        assert_eq!(v1.nodes[0], r1.nodes[0]);
        assert_eq!(v1.nodes[1], "0");
        assert_eq!(r1.nodes[1], "0");
    }

    #[test]
    fn default_transient_directive_appended() {
        let result = generate(&divider(), "divider");
        assert!(result.directives.iter().any(|d| d == ".tran 1u 10m"));

        let mut sch = divider();
        sch.directives.push(".ac dec 10 1 100k".to_string());
        let result = generate(&sch, "divider");
        assert!(!result.directives.iter().any(|d| d == ".tran 1u 10m"));
    }

    #[test]
    fn floating_pin_warning_becomes_comment() {
        let mut sch = divider();
        sch.add_component(
            Component::new("C1", ComponentType::Capacitor, Point::new(400.0, 100.0))
                .with_value("100n"),
        );
        let result = generate(&sch, "divider");
        assert_eq!(result.warnings.len(), 2);

        let text = to_text(&result);
        assert!(text.contains("* warning: floating pin"));
        // Floating pins still produce nodes (singleton nets), never "?"
        let c1 = result.components.iter().find(|c| c.name == "C1").unwrap();
        assert!(c1.nodes.iter().all(|n| n != "?"));
    }

    #[test]
    fn text_ends_with_end_directive() {
        let text = to_text(&generate(&divider(), "divider"));
        assert!(text.starts_with("divider\n"));
        assert!(text.ends_with(".end\n"));
        assert!(text.contains("V1 "));
        assert!(text.contains("R1 "));
    }
}
