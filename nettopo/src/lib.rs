//! nettopo - circuit topology engine for schematic capture
//!
//! This library derives electrical structure from schematic geometry and
//! back again: connectivity analysis over wires and pins, SPICE netlist
//! synthesis and parsing, derived current traces for components a simulator
//! does not report directly, and automatic placement and Manhattan routing
//! of imported netlists.
//!
//! # Quick Start
//!
//! ```no_run
//! use nettopo::engine;
//!
//! let schematic = engine::load_schematic("divider.json").unwrap();
//! let connectivity = engine::analyze(&schematic);
//! for net in &connectivity.nets {
//!     println!("{}: {} points", net.name, net.points.len());
//! }
//! println!("{}", engine::netlist_text(&schematic));
//! ```
//!
//! # Features
//!
//! - **Connectivity**: union-find over snapped wire/junction/pin geometry
//! - **Netlist**: SPICE synthesis with fixed pin orders, plus the inverse parser
//! - **Currents**: Ohm, capacitor dv/dt, and Shockley diode derivations
//! - **Layout**: layered placement and channel routing for imported netlists

pub mod connectivity;
pub mod current;
pub mod engine;
pub mod geometry;
pub mod layout;
pub mod netlist;
pub mod schema;

// Re-export main types
pub use connectivity::{ConnectivityResult, Net, PinConnection};
pub use current::{CurrentCalculator, Trace, TraceKind, TraceSet};
pub use engine::EngineError;
pub use geometry::{Point, GRID};
pub use layout::{LayoutError, Placer};
pub use netlist::{NetlistResult, ParsedNetlist};
pub use schema::{Component, ComponentType, Junction, NameAllocator, Schematic, Wire};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Component, ComponentType, ConnectivityResult, CurrentCalculator, EngineError, Junction,
        Point, Schematic, TraceSet, Wire,
    };
}
