//! Derived current computation.
//!
//! The external simulator only reports currents through voltage sources and
//! inductors. Currents through resistors, capacitors, and diodes are
//! reconstructed here from node-voltage time series, using the component's
//! resolved nodes from connectivity analysis.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connectivity::{self, ConnectivityResult};
use crate::netlist::value::{parse_spice_value, substitute_params};
use crate::schema::{Component, ComponentType, Schematic};

/// Room-temperature thermal voltage, volts.
const THERMAL_VOLTAGE: f64 = 0.02585;
/// Default diode saturation current when no `.model` supplies one.
const DEFAULT_DIODE_IS: f64 = 2.52e-9;
/// Default diode emission coefficient.
const DEFAULT_DIODE_N: f64 = 1.752;
/// Exponent clamp for the Shockley relation.
const EXP_CLAMP: f64 = 40.0;
/// Diode voltage clamp before exponentiation, volts.
const DIODE_V_CLAMP: f64 = 1.0;

/// Kind of a simulation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Voltage,
    Current,
    Time,
    Frequency,
    NoType,
}

/// One named time/frequency series from (or derived for) the simulator.
///
/// Voltage series are named `V(<net>)`, current series `I(<instance>)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub values: Vec<f64>,
}

/// A simulation result: shared time axis plus named traces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceSet {
    pub time: Vec<f64>,
    pub traces: Vec<Trace>,
}

impl TraceSet {
    pub fn get(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// Voltage samples for a net. Ground is all zeros; a missing trace is
    /// treated the same way.
    fn net_voltage(&self, net: &str) -> Vec<f64> {
        if net == "0" {
            return vec![0.0; self.time.len()];
        }
        self.get(&format!("V({})", net))
            .map(|t| t.values.clone())
            .unwrap_or_else(|| vec![0.0; self.time.len()])
    }
}

/// Calculator bound to one schematic's connectivity and parameters.
pub struct CurrentCalculator<'a> {
    schematic: &'a Schematic,
    connectivity: ConnectivityResult,
}

impl<'a> CurrentCalculator<'a> {
    pub fn new(schematic: &'a Schematic) -> Self {
        Self {
            schematic,
            connectivity: connectivity::analyze(schematic),
        }
    }

    /// Reuse an existing connectivity result instead of re-analyzing.
    pub fn with_connectivity(schematic: &'a Schematic, connectivity: ConnectivityResult) -> Self {
        Self {
            schematic,
            connectivity,
        }
    }

    /// Derive the current trace for one component, or `None` when the type
    /// is not client-derivable (inductors, sources, transistors) or its
    /// value does not parse.
    pub fn derive(&self, component: &Component, traces: &TraceSet) -> Option<Trace> {
        let pins = component.component_type.pin_names();
        if pins.len() != 2 {
            return None;
        }
        let n1 = self.connectivity.net_name_for_pin(&component.id, pins[0])?;
        let n2 = self.connectivity.net_name_for_pin(&component.id, pins[1])?;
        let v1 = traces.net_voltage(n1);
        let v2 = traces.net_voltage(n2);

        let value = substitute_params(component.value(), &self.schematic.parameters);

        let values = match component.component_type {
            ComponentType::Resistor => {
                let r = parse_spice_value(&value)?;
                if r == 0.0 {
                    return None;
                }
                v1.iter().zip(&v2).map(|(a, b)| (a - b) / r).collect()
            }
            ComponentType::Capacitor => {
                let c = parse_spice_value(&value)?;
                let dv: Vec<f64> = v1.iter().zip(&v2).map(|(a, b)| a - b).collect();
                derivative(&dv, &traces.time)
                    .into_iter()
                    .map(|d| c * d)
                    .collect()
            }
            ComponentType::Diode => {
                let (is, n) = self.diode_params(&value);
                v1.iter()
                    .zip(&v2)
                    .map(|(a, b)| shockley(a - b, is, n))
                    .collect()
            }
            // Integrating dI/dt from voltage accumulates drift; the
            // simulator reports inductor currents natively.
            _ => return None,
        };

        Some(Trace {
            name: format!("I({})", component.name()),
            kind: TraceKind::Current,
            values,
        })
    }

    /// Append derived current traces for every two-terminal component the
    /// simulator did not already report.
    pub fn extend_with_derived_currents(&self, traces: &mut TraceSet) {
        let mut derived = Vec::new();
        for component in &self.schematic.components {
            let name = format!("I({})", component.name());
            if traces.get(&name).is_some() {
                continue;
            }
            if let Some(trace) = self.derive(component, traces) {
                derived.push(trace);
            }
        }
        debug!(count = derived.len(), "derived current traces");
        for trace in derived {
            traces.push(trace);
        }
    }

    /// Diode Is/N: from the `.model` named by the component value, falling
    /// back to small-signal defaults.
    fn diode_params(&self, value: &str) -> (f64, f64) {
        let model = self.schematic.model(value);
        let is = model
            .and_then(|m| m.params.get("Is").or_else(|| m.params.get("IS")))
            .and_then(|v| parse_spice_value(v))
            .unwrap_or(DEFAULT_DIODE_IS);
        let n = model
            .and_then(|m| m.params.get("N"))
            .and_then(|v| parse_spice_value(v))
            .unwrap_or(DEFAULT_DIODE_N);
        (is, n)
    }
}

/// Numeric derivative: forward difference at the first sample, backward at
/// the last, central elsewhere. A zero or negative time step yields a zero
/// sample instead of a division error.
fn derivative(values: &[f64], time: &[f64]) -> Vec<f64> {
    let n = values.len().min(time.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let (dv, dt) = if i == 0 {
            (values[1] - values[0], time[1] - time[0])
        } else if i == n - 1 {
            (values[n - 1] - values[n - 2], time[n - 1] - time[n - 2])
        } else {
            (values[i + 1] - values[i - 1], time[i + 1] - time[i - 1])
        };
        out.push(if dt > 0.0 { dv / dt } else { 0.0 });
    }
    out
}

/// Shockley large-signal diode current with overflow clamping.
///
/// The voltage is clamped to [`DIODE_V_CLAMP`] before exponentiation and
/// the exponent itself to ±[`EXP_CLAMP`]: above +40 the exponential is
/// extended linearly (first-order), below −40 the reverse current is
/// approximated as −Is.
fn shockley(v: f64, is: f64, n: f64) -> f64 {
    let v = v.min(DIODE_V_CLAMP);
    let x = v / (n * THERMAL_VOLTAGE);
    if x > EXP_CLAMP {
        is * (EXP_CLAMP.exp() * (1.0 + (x - EXP_CLAMP)) - 1.0)
    } else if x < -EXP_CLAMP {
        -is
    } else {
        is * (x.exp() - 1.0)
    }
}
