//! Example: lay out a SPICE netlist and regenerate it from the schematic.
//! Run with: cargo run --example round_trip [path/to/netlist.cir]

use nettopo::engine;

fn main() -> Result<(), nettopo::EngineError> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => "divider\nV1 vin 0 5\nR1 vin vout 1k\nR2 vout 0 2k\n.end\n".to_string(),
    };

    let schematic = engine::schematic_from_netlist(&text)?;
    println!(
        "Placed {} components, {} wires, {} junctions",
        schematic.components.len(),
        schematic.wires.len(),
        schematic.junctions.len()
    );

    let connectivity = engine::analyze(&schematic);
    for net in &connectivity.nets {
        println!("  net {}: {} points", net.name, net.points.len());
    }
    for warning in &connectivity.warnings {
        eprintln!("  warning: {}", warning);
    }

    println!("\nRegenerated netlist:\n{}", engine::netlist_text(&schematic));
    Ok(())
}
