use clap::Parser;
use std::path::PathBuf;
use voromap_core::export;
use voromap_core::format::usd_compact;
use voromap_core::loader;
use voromap_core::tessellate::PowerDiagram;
use voromap_core::ChartLayout;

#[derive(Parser, Debug)]
#[command(name = "voromap-cli", about = "Voronoi treemap layout generator")]
struct Args {
    /// Input CSV with symbol, name, marketcap and country columns
    input: PathBuf,
    /// Write the layout as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write the rendered chart as SVG
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Write one row per leaf as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Tessellation seed; the same seed reproduces the same layout
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() {
    voromap_core::init_tracing();
    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let records = loader::load_path(&args.input)?;
    let layout = ChartLayout::compute(&records, &PowerDiagram::default(), args.seed)?;

    if let Some(path) = &args.json {
        let json = export::to_json(&layout);
        std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    }
    if let Some(path) = &args.svg {
        export::save_svg(&layout, path)?;
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)?;
        export::to_csv(&layout, file)?;
    }

    let total = layout.hierarchy.node(layout.hierarchy.root).value;
    println!(
        "{} leaves in {} groups, {} total",
        layout.hierarchy.leaves().count(),
        layout.hierarchy.groups().count(),
        usd_compact(total)
    );
    for group in layout.hierarchy.groups() {
        println!(
            "  {:<24} {:>8}  {} companies",
            group.key,
            usd_compact(group.value),
            group.children.len()
        );
    }
    Ok(())
}
