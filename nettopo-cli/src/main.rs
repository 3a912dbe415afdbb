//! nettopo CLI - netlist synthesis, netlist import, and connectivity checks
//! from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use nettopo::engine;
use nettopo::ConnectivityResult;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "nettopo")]
#[command(about = "Circuit topology tool: schematics to netlists and back", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a SPICE netlist from a schematic JSON file
    Netlist {
        /// Path to schematic .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write netlist here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Title line for the netlist (defaults to the schematic title)
        #[arg(long)]
        title: Option<String>,

        /// Exit with error code if the schematic has connectivity errors
        #[arg(long)]
        strict: bool,
    },

    /// Build a placed and routed schematic from a SPICE netlist
    Layout {
        /// Path to netlist file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write schematic JSON here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Analyze a schematic's connectivity and report nets and problems
    Check {
        /// Path to schematic .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Netlist {
            file,
            output,
            title,
            strict,
        } => handle_netlist(&file, output.as_deref(), title.as_deref(), strict),
        Commands::Layout { file, output } => handle_layout(&file, output.as_deref()),
        Commands::Check {
            file,
            format,
            strict,
        } => handle_check(&file, format, strict),
    };

    process::exit(exit_code);
}

fn handle_netlist(
    file: &PathBuf,
    output: Option<&std::path::Path>,
    title: Option<&str>,
    strict: bool,
) -> i32 {
    let mut schematic = match engine::load_schematic(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(title) = title {
        schematic.metadata.title = title.to_string();
    }

    let result = engine::generate_netlist(&schematic);
    let text = nettopo::netlist::to_text(&result);

    if let Err(e) = write_output(output, &text) {
        eprintln!("Error: {}", e);
        return 1;
    }

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }
    for error in &result.errors {
        eprintln!("Error: {}", error);
    }
    if !result.errors.is_empty() || (strict && !result.warnings.is_empty()) {
        return 1;
    }
    0
}

fn handle_layout(file: &PathBuf, output: Option<&std::path::Path>) -> i32 {
    let text = match fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let parsed = engine::parse_netlist(&text);
    for error in &parsed.errors {
        eprintln!("Warning: {}", error);
    }

    let schematic = match nettopo::layout::layout(&parsed) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let json = match serde_json::to_string_pretty(&schematic) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = write_output(output, &json) {
        eprintln!("Error: {}", e);
        return 1;
    }
    0
}

fn handle_check(file: &PathBuf, format: OutputFormat, strict: bool) -> i32 {
    let schematic = match engine::load_schematic(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let result = engine::analyze(&schematic);
    match format {
        OutputFormat::Human => output_human(file, &result),
        OutputFormat::Json => output_json(&result),
    }

    if !result.errors.is_empty() || (strict && !result.warnings.is_empty()) {
        return 1;
    }
    0
}

fn output_human(file: &PathBuf, result: &ConnectivityResult) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    println!("\n  Nets:");
    for net in &result.nets {
        let pins = result
            .pin_connections
            .iter()
            .filter(|pc| result.nets[pc.net].name == net.name)
            .count();
        let tag = if net.is_ground { " (ground)" } else { "" };
        println!(
            "    {}{}: {} points, {} pins",
            net.name,
            tag,
            net.points.len(),
            pins
        );
    }

    if !result.warnings.is_empty() {
        println!("\n  WARNINGS:");
        for warning in &result.warnings {
            println!("    - {}", warning);
        }
    }
    if !result.errors.is_empty() {
        println!("\n  ERRORS:");
        for error in &result.errors {
            println!("    - {}", error);
        }
    }

    println!("\n  Summary:");
    println!("    Nets:     {}", result.nets.len());
    println!("    Pins:     {}", result.pin_connections.len());
    println!("    Warnings: {}", result.warnings.len());
    println!("    Errors:   {}", result.errors.len());
}

fn output_json(result: &ConnectivityResult) {
    let output = serde_json::json!({
        "nets": result.nets.iter().map(|n| {
            serde_json::json!({
                "name": n.name,
                "is_ground": n.is_ground,
                "points": n.points.len(),
            })
        }).collect::<Vec<_>>(),
        "pins": result.pin_connections.iter().map(|pc| {
            serde_json::json!({
                "component": pc.component_id,
                "pin": pc.pin_name,
                "net": result.nets[pc.net].name,
            })
        }).collect::<Vec<_>>(),
        "warnings": result.warnings,
        "errors": result.errors,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn write_output(output: Option<&std::path::Path>, text: &str) -> std::io::Result<()> {
    match output {
        Some(path) => fs::write(path, text),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}
