//! High-level engine facade tying the forward and reverse paths together,
//! plus schematic persistence.
//!
//! Library users who do not need phase-level control call these functions;
//! everything here is a thin composition of the per-module entry points.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::connectivity::{self, ConnectivityResult};
use crate::layout::{self, LayoutError};
use crate::netlist::{self, NetlistResult, ParsedNetlist};
use crate::schema::Schematic;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("schematic file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("schematic serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Derive nets and pin connections from schematic geometry.
pub fn analyze(schematic: &Schematic) -> ConnectivityResult {
    connectivity::analyze(schematic)
}

/// Forward path: schematic → structured netlist.
pub fn generate_netlist(schematic: &Schematic) -> NetlistResult {
    let title = if schematic.metadata.title.is_empty() {
        "untitled"
    } else {
        schematic.metadata.title.as_str()
    };
    netlist::generate(schematic, title)
}

/// Forward path: schematic → netlist text.
pub fn netlist_text(schematic: &Schematic) -> String {
    netlist::to_text(&generate_netlist(schematic))
}

/// Parse netlist text without laying it out.
pub fn parse_netlist(text: &str) -> ParsedNetlist {
    netlist::parse(text)
}

/// Reverse path: netlist text → placed and routed schematic.
pub fn schematic_from_netlist(text: &str) -> Result<Schematic, EngineError> {
    let parsed = netlist::parse(text);
    let schematic = layout::layout(&parsed)?;
    info!(
        components = schematic.components.len(),
        parse_errors = parsed.errors.len(),
        "schematic synthesized from netlist"
    );
    Ok(schematic)
}

/// Load a schematic from its JSON file format.
pub fn load_schematic(path: impl AsRef<Path>) -> Result<Schematic, EngineError> {
    let text = fs::read_to_string(path.as_ref())?;
    let schematic = serde_json::from_str(&text)?;
    Ok(schematic)
}

/// Save a schematic to its JSON file format (pretty-printed).
pub fn save_schematic(path: impl AsRef<Path>, schematic: &Schematic) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(schematic)?;
    fs::write(path.as_ref(), text)?;
    info!(path = %path.as_ref().display(), "schematic saved");
    Ok(())
}
