use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use memmap2::Mmap;

use unbiased_space_saving::edges::{self, EdgeReader, NodeId};
use unbiased_space_saving::{Result, UnbiasedSpaceSaving};

/// Estimate the highest-degree nodes of an edge stream with Unbiased Space-Saving.
///
/// Writes the top N_BAR nodes to <OUTPUT_PREFIX>_top_nodes.csv.
#[derive(Parser, Debug)]
#[command(name = "uss", version)]
struct Args {
    /// Edge stream, one `<u> <v> [<timestamp>]` edge per line
    input: PathBuf,

    /// Prefix for the output CSV
    output_prefix: String,

    /// Number of nodes the sketch tracks
    k: usize,

    /// Random seed
    seed: u64,

    /// Number of top nodes to write
    n_bar: usize,

    /// Ground-truth `<node> <degree>` file; reports recall of the written nodes
    #[arg(long)]
    oracle: Option<PathBuf>,

    /// Also print the top nodes to stdout
    #[arg(long)]
    print: bool,
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    // The file is only read and is not expected to change while mapped.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

fn run(args: &Args) -> Result<()> {
    let mut sketch: UnbiasedSpaceSaving<NodeId> = UnbiasedSpaceSaving::new(args.k, args.seed)?;

    let input = map_file(&args.input)?;
    eprintln!("Start reading {}", args.input.display());

    let start = Instant::now();
    let mut num_edges: u64 = 0;
    for edge in EdgeReader::new(&input) {
        let (u, v) = edge?;
        sketch.update(u);
        sketch.update(v);
        num_edges += 1;
    }
    let duration = start.elapsed();

    let num_of_seconds = duration.as_secs_f64();
    eprintln!(
        "processed {} edges ({} updates) in {} seconds, {} resident nodes",
        num_edges,
        sketch.observed(),
        num_of_seconds,
        sketch.len()
    );
    if num_of_seconds > 0.0 {
        let throughput = (sketch.observed() as f64 / 1_000_000.0) / num_of_seconds;
        eprintln!(
            "throughput: {} M updates/s, each update uses {} ns",
            throughput,
            1_000.0 / throughput
        );
    }

    let top = sketch.into_top_n(args.n_bar);

    let output_path = format!("{}_top_nodes.csv", args.output_prefix);
    edges::write_top_nodes(BufWriter::new(File::create(&output_path)?), &top)?;
    eprintln!("wrote {} nodes to {}", top.len(), output_path);

    if args.print {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for node in &top {
            writeln!(out, "{} {}", node.item, node.count)?;
        }
    }

    if let Some(oracle) = &args.oracle {
        let truth = edges::read_degrees(&map_file(oracle)?)?;
        eprintln!("recall: {}", edges::recall(&truth, &top));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
