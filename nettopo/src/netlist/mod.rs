//! Netlist synthesis and parsing.
//!
//! The forward path maps a schematic plus its connectivity result into
//! SPICE-style component statements and serializes them to text. The inverse
//! parser recovers structured components, models, and parameters from
//! netlist source.

pub mod generate;
pub mod parse;
pub mod value;

pub use generate::{generate, to_text, NetlistResult, SpiceComponent};
pub use parse::{parse, ParsedComponent, ParsedNetlist};
pub use value::{parse_spice_value, substitute_params};
