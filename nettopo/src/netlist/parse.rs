//! Line-oriented SPICE netlist parser: the inverse of the synthesizer.
//!
//! Malformed lines are skipped and recorded, never fatal. `{name}`
//! parameter references are expanded against the running `.param` map as
//! lines are read, so later lines see earlier definitions.

use std::collections::HashMap;

use tracing::debug;

use crate::netlist::value::substitute_params;
use crate::schema::{ComponentType, SpiceModel};

/// A component statement recovered from netlist source.
#[derive(Debug, Clone)]
pub struct ParsedComponent {
    /// Full instance name including the prefix letter (e.g. `R1`).
    pub name: String,
    pub prefix: char,
    /// Resolved type; `None` for an unknown prefix (the line is also
    /// recorded as an error).
    pub component_type: Option<ComponentType>,
    pub nodes: Vec<String>,
    pub value: String,
    pub extra: Vec<String>,
}

/// Structured netlist recovered from text.
#[derive(Debug, Clone, Default)]
pub struct ParsedNetlist {
    pub title: String,
    pub components: Vec<ParsedComponent>,
    pub models: HashMap<String, SpiceModel>,
    pub parameters: HashMap<String, String>,
    /// Analysis and other dot directives, verbatim (without `.param`,
    /// `.model`, `.end`).
    pub directives: Vec<String>,
    pub errors: Vec<String>,
}

impl ParsedNetlist {
    /// Distinct node names across all components, in first-seen order.
    pub fn node_names(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for c in &self.components {
            for node in &c.nodes {
                if !seen.contains(&node.as_str()) {
                    seen.push(node.as_str());
                }
            }
        }
        seen
    }
}

/// How many node fields a component line carries for this prefix.
fn node_count(prefix: char) -> usize {
    match prefix {
        'Q' | 'M' => 3,
        _ => 2,
    }
}

/// Parse SPICE netlist text into a [`ParsedNetlist`].
pub fn parse(text: &str) -> ParsedNetlist {
    let mut netlist = ParsedNetlist::default();

    // Fold continuation lines ("+ ...") into their predecessor.
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix('+') {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(rest.trim());
                continue;
            }
        }
        lines.push(trimmed.to_string());
    }

    let mut first_content_line = true;
    for line in &lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('*') {
            continue;
        }

        // SPICE convention: the first line is the title, unless it is
        // clearly a directive or a component statement.
        if first_content_line {
            first_content_line = false;
            if !line.starts_with('.') && !looks_like_component(line) {
                netlist.title = line.clone();
                continue;
            }
        }

        if line.starts_with('.') {
            parse_directive(line, &mut netlist);
            continue;
        }

        parse_component_line(line, &mut netlist);
    }

    resolve_transistor_types(&mut netlist);

    debug!(
        components = netlist.components.len(),
        models = netlist.models.len(),
        parameters = netlist.parameters.len(),
        "netlist parsed"
    );
    netlist
}

fn looks_like_component(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return false;
    };
    let Some(prefix) = first.chars().next() else {
        return false;
    };
    ComponentType::from_prefix(prefix).is_some() && tokens.count() >= 2
}

fn parse_directive(line: &str, netlist: &mut ParsedNetlist) {
    let lower = line.to_ascii_lowercase();

    if lower.starts_with(".end") && !lower.starts_with(".ends") {
        return;
    }

    if lower.starts_with(".param") {
        let rest = line[".param".len()..].trim();
        match rest.split_once('=') {
            Some((name, value)) => {
                let value = substitute_params(value.trim(), &netlist.parameters);
                netlist
                    .parameters
                    .insert(name.trim().to_string(), value);
            }
            None => netlist
                .errors
                .push(format!("malformed .param directive: {}", line)),
        }
        return;
    }

    if lower.starts_with(".model") {
        match parse_model(line) {
            Some(model) => {
                netlist.models.insert(model.name.clone(), model);
            }
            None => netlist
                .errors
                .push(format!("malformed .model directive: {}", line)),
        }
        return;
    }

    netlist.directives.push(line.to_string());
}

/// Parse `.model name TYPE(key=value ...)`.
fn parse_model(line: &str) -> Option<SpiceModel> {
    let rest = line[".model".len()..].trim();
    let (name, rest) = rest.split_once(char::is_whitespace)?;
    let rest = rest.trim();

    let (model_type, params_text) = match rest.find('(') {
        Some(open) => {
            let close = rest.rfind(')').unwrap_or(rest.len());
            (rest[..open].trim(), &rest[open + 1..close])
        }
        None => (rest, ""),
    };
    if model_type.is_empty() {
        return None;
    }

    let mut params = HashMap::new();
    for assignment in params_text.split_whitespace() {
        if let Some((k, v)) = assignment.split_once('=') {
            params.insert(k.trim().to_string(), v.trim().to_string());
        }
    }

    Some(SpiceModel {
        name: name.to_string(),
        model_type: model_type.to_ascii_uppercase(),
        params,
    })
}

fn parse_component_line(line: &str, netlist: &mut ParsedNetlist) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let name = tokens[0].to_string();
    let prefix = name.chars().next().unwrap_or(' ').to_ascii_uppercase();

    let component_type = ComponentType::from_prefix(prefix);
    if component_type.is_none() {
        netlist
            .errors
            .push(format!("unknown component type prefix '{}': {}", prefix, line));
        return;
    }

    let n = node_count(prefix);
    if tokens.len() < 1 + n + 1 {
        netlist
            .errors
            .push(format!("malformed component line (too few fields): {}", line));
        return;
    }

    let nodes = tokens[1..1 + n].iter().map(|s| s.to_string()).collect();
    let value = substitute_params(tokens[1 + n], &netlist.parameters);
    let extra = tokens[2 + n..]
        .iter()
        .map(|s| substitute_params(s, &netlist.parameters))
        .collect();

    netlist.components.push(ParsedComponent {
        name,
        prefix,
        component_type,
        nodes,
        value,
        extra,
    });
}

/// Refine Q/M component types using their `.model` definitions: a `Q`
/// element referencing a PNP model becomes [`ComponentType::PnpTransistor`],
/// and likewise for PMOS.
fn resolve_transistor_types(netlist: &mut ParsedNetlist) {
    for component in &mut netlist.components {
        let Some(model) = netlist.models.get(&component.value) else {
            continue;
        };
        component.component_type = match (component.prefix, model.model_type.as_str()) {
            ('Q', "PNP") => Some(ComponentType::PnpTransistor),
            ('Q', "NPN") => Some(ComponentType::NpnTransistor),
            ('M', "PMOS") => Some(ComponentType::PmosTransistor),
            ('M', "NMOS") => Some(ComponentType::NmosTransistor),
            _ => component.component_type,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_netlist() {
        let text = "\
voltage divider
V1 n1 0 5
R1 n1 n2 1k
R2 n2 0 2k
.tran 1u 10m
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.title, "voltage divider");
        assert_eq!(netlist.components.len(), 3);
        assert_eq!(netlist.directives, vec![".tran 1u 10m"]);
        assert!(netlist.errors.is_empty());

        let r1 = &netlist.components[1];
        assert_eq!(r1.name, "R1");
        assert_eq!(r1.component_type, Some(ComponentType::Resistor));
        assert_eq!(r1.nodes, vec!["n1", "n2"]);
        assert_eq!(r1.value, "1k");
    }

    #[test]
    fn param_references_expand() {
        let text = "\
params
.param rload=10k
R1 n1 0 {rload}
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.components[0].value, "10k");
        assert_eq!(
            netlist.parameters.get("rload").map(|s| s.as_str()),
            Some("10k")
        );
    }

    #[test]
    fn model_directive_parsed() {
        let text = "\
diode test
D1 n1 0 D1N4148
.model D1N4148 D(Is=2.52n N=1.752)
.end
";
        let netlist = parse(text);
        let model = netlist.models.get("D1N4148").unwrap();
        assert_eq!(model.model_type, "D");
        assert_eq!(model.params.get("Is").map(|s| s.as_str()), Some("2.52n"));
        assert_eq!(model.params.get("N").map(|s| s.as_str()), Some("1.752"));
    }

    #[test]
    fn transistor_type_refined_by_model() {
        let text = "\
bjt test
Q1 c b e 2N3906
Q2 c2 b2 e2 2N2222
M1 d g s IRF9540
.model 2N3906 PNP(Bf=200)
.model 2N2222 NPN(Bf=255)
.model IRF9540 PMOS(Vto=-3.7)
.end
";
        let netlist = parse(text);
        assert_eq!(
            netlist.components[0].component_type,
            Some(ComponentType::PnpTransistor)
        );
        assert_eq!(
            netlist.components[1].component_type,
            Some(ComponentType::NpnTransistor)
        );
        assert_eq!(
            netlist.components[2].component_type,
            Some(ComponentType::PmosTransistor)
        );
    }

    #[test]
    fn continuation_lines_folded() {
        let text = "\
continuations
V1 n1 0
+ 5
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.components.len(), 1);
        assert_eq!(netlist.components[0].value, "5");
    }

    #[test]
    fn malformed_lines_skipped_not_fatal() {
        let text = "\
bad lines
R1 n1
X1 a b c d
R2 n1 0 1k
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.components.len(), 1);
        assert_eq!(netlist.components[0].name, "R2");
        assert_eq!(netlist.errors.len(), 2);
    }

    #[test]
    fn comments_ignored() {
        let text = "\
comments
* this is a comment
R1 n1 0 1k
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.components.len(), 1);
    }

    #[test]
    fn netlist_without_title_line() {
        let text = "\
R1 n1 0 1k
V1 n1 0 5
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.title, "");
        assert_eq!(netlist.components.len(), 2);
    }

    #[test]
    fn node_names_in_first_seen_order() {
        let text = "\
nodes
V1 n1 0 5
R1 n1 n2 1k
.end
";
        let netlist = parse(text);
        assert_eq!(netlist.node_names(), vec!["n1", "0", "n2"]);
    }
}
