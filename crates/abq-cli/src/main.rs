use std::path::{Path, PathBuf};
use std::process::ExitCode;

use abq_io::{InpParser, ParseOptions, ParseOutput, save_ir_json};
use abq_model::ModelSummary;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "abq-cli")]
#[command(about = "Parse Abaqus .inp decks and export their mesh")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a deck, optionally streaming its mesh to legacy VTK
    Parse {
        input: PathBuf,
        /// Stream NODE/ELEMENT sections to this .vtk file
        #[arg(long, value_name = "OUT.vtk")]
        vtk: Option<PathBuf>,
        /// Write the intermediate representation as JSON
        #[arg(long, value_name = "OUT.json")]
        json: Option<PathBuf>,
    },
    /// Print a summary of the deck
    Summary {
        input: PathBuf,
        #[arg(long, value_name = "OUT.vtk")]
        vtk: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(vtk: Option<PathBuf>) -> ParseOptions {
    let mut options = ParseOptions::from_env();
    if vtk.is_some() {
        options.mesh_output = vtk;
    }
    options
}

fn print_summary(summary: &ModelSummary) {
    println!("total_sections: {}", summary.total_sections);
    println!("total_data_lines: {}", summary.total_data_lines);
    println!("node_rows: {}", summary.node_rows);
    println!("element_rows: {}", summary.element_rows);
    println!("node_sets: {}", summary.node_sets);
    println!("element_sets: {}", summary.element_sets);
    println!("surfaces: {}", summary.surfaces);
    println!("instances: {}", summary.instances);
    println!("materials: {}", summary.materials);
    println!("property_sections: {}", summary.property_sections);
    println!("boundary_conditions: {}", summary.boundary_conditions);
    println!("loads: {}", summary.loads);
    println!("steps: {}", summary.steps);
    if !summary.procedures.is_empty() {
        println!("procedures: {}", summary.procedures.join(", "));
    }
    println!("geometry_keywords: {}", summary.geometry_keywords.join(", "));
    println!("metadata_keywords: {}", summary.metadata_keywords.join(", "));
    println!("non_geometry_keywords: {}", summary.non_geometry_keywords.join(", "));
    if let Some(mesh) = &summary.mesh {
        println!("mesh_points: {}", mesh.points);
        println!("mesh_cells: {}", mesh.cells);
        println!("unmapped_elements: {}", mesh.unmapped_elements);
    }
}

fn parse(input: &Path, options: ParseOptions) -> Option<ParseOutput> {
    match InpParser::new(options).parse_file(input) {
        Ok(output) => Some(output),
        Err(err) => {
            eprintln!("parse error: {err}");
            None
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing();

    match cli.command {
        Command::Parse { input, vtk, json } => {
            let Some(output) = parse(&input, options(vtk)) else {
                return ExitCode::from(1);
            };
            if let Some(report) = &output.mesh {
                println!(
                    "mesh: {} ({} points, {} cells)",
                    report.path.display(),
                    report.points,
                    report.cells
                );
            }
            println!("keywords: {}", output.ir.len());
            if let Some(path) = json {
                if let Err(err) = save_ir_json(&path, &output.ir) {
                    eprintln!("json export failed: {err}");
                    return ExitCode::from(1);
                }
                info!(path = %path.display(), "wrote IR json");
            }
            ExitCode::SUCCESS
        }
        Command::Summary { input, vtk, json } => {
            let Some(output) = parse(&input, options(vtk)) else {
                return ExitCode::from(1);
            };
            let summary = output.summary();
            if !json {
                print_summary(&summary);
                return ExitCode::SUCCESS;
            }
            match serde_json::to_string_pretty(&summary) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("json export failed: {err}");
                    ExitCode::from(1)
                }
            }
        }
    }
}
