//! varsync: synchronized reading of sorted VCF files
//!
//! Usage: varsync <COMMAND> [OPTIONS]

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use varsync::index::{index_path_for, GenomicIndex};
use varsync::streaming::buffers::output_buffer_size;
use varsync::streaming::RowWriter;
use varsync::{OverlapMode, ReaderOptions, SyncedReader, VcfError};

#[derive(Parser)]
#[command(name = "varsync")]
#[command(version)]
#[command(about = "Position-synchronized reading of sorted, indexed VCF files", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Overlap {
    /// Record reference span overlaps the region
    Record,
    /// Record POS lies inside the region
    Position,
}

impl From<Overlap> for OverlapMode {
    fn from(value: Overlap) -> Self {
        match value {
            Overlap::Record => OverlapMode::Record,
            Overlap::Position => OverlapMode::Position,
        }
    }
}

#[derive(Args)]
struct SyncArgs {
    /// Input VCF files
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Comma-separated regions (contig, contig:pos, contig:beg-end, contig:beg-)
    #[arg(short = 'r', long, default_value = "")]
    regions: String,

    /// How records are matched against regions
    #[arg(long, value_enum, default_value = "record")]
    overlap: Overlap,

    /// Print the present records after each row
    #[arg(long)]
    records: bool,

    /// Only report coordinates present in every file
    #[arg(long)]
    cluster: bool,

    /// Fail on out-of-order records
    #[arg(long)]
    validate_sort: bool,

    /// Require an index even without regions
    #[arg(long)]
    require_index: bool,

    /// Use small I/O buffers
    #[arg(long)]
    low_memory: bool,

    /// Print a column header line
    #[arg(long)]
    header: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk several sorted VCF files in lock-step and report per-file presence
    Sync(SyncArgs),

    /// Build the index sidecar (<file>.vsi) of sorted VCF files
    Index {
        /// Input VCF files
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("varsync=debug,info")
        } else {
            EnvFilter::new("varsync=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Sync(args) => run_sync(args),
        Commands::Index { inputs } => run_index(inputs),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_sync(args: SyncArgs) -> Result<(), VcfError> {
    let options = ReaderOptions::new()
        .overlap(args.overlap.into())
        .validate_sort(args.validate_sort)
        .require_index(args.require_index)
        .low_memory(args.low_memory);
    let reader = SyncedReader::with_options(args.inputs.as_slice(), &args.regions, options)?;
    let source_count = reader.source_count();

    let stdout = io::stdout();
    let mut writer = RowWriter::with_capacity(output_buffer_size(args.low_memory), stdout.lock());
    if args.header {
        let names: Vec<String> = args.inputs.iter().map(|p| p.display().to_string()).collect();
        writer.write_header(&names)?;
    }
    for row in reader {
        let row = row?;
        if args.cluster && row.present_count() != source_count {
            continue;
        }
        writer.write_row(&row)?;
        if args.records {
            writer.write_records(&row)?;
        }
    }
    writer.flush()
}

fn run_index(inputs: Vec<PathBuf>) -> Result<(), VcfError> {
    for input in &inputs {
        let index = GenomicIndex::scan(input)?;
        let sidecar = index_path_for(input);
        index.write(&sidecar)?;
        eprintln!("Wrote {}", sidecar.display());
    }
    Ok(())
}
