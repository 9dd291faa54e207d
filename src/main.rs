use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use pension_ingest::config::Config;
use pension_ingest::constants;
use pension_ingest::error::IngestError;
use pension_ingest::pipeline::ingestion::NdjsonReader;
use pension_ingest::pipeline::processing::age::AgeDeriver;
use pension_ingest::pipeline::processing::geography::GeographyResolver;
use pension_ingest::pipeline::processing::normalize::adapters::{ManualListAdapter, SourceAdapter};
use pension_ingest::pipeline::{AdapterRegistry, CanonicalRecordBuilder, IngestionController, IngestionReport};
use pension_ingest::storage::SqliteStore;
use pension_ingest::logging;
use pension_ingest::metrics::init_metrics;

#[derive(Parser)]
#[command(name = "pension_ingest")]
#[command(about = "Normalize and deduplicate pensioner records from many sources")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "pension_ingest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one source file (NDJSON, one array of cells per line)
    Ingest {
        /// Source identifier or friendly name (e.g. dlc_portal, iob, dop, manual)
        #[arg(long)]
        source: String,
        /// Input file
        #[arg(long)]
        input: PathBuf,
        /// Provenance tag stored on each record; defaults to the source identifier
        #[arg(long)]
        data_source: Option<String>,
        /// Header rows to skip; overrides the config
        #[arg(long)]
        header_rows: Option<usize>,
        /// Reference date for ages (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered sources
    Sources,
    /// Resolve a pincode to its state using the configured table
    ResolveState {
        pincode: String,
    },
}

fn print_report(report: &IngestionReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("\n📊 Ingestion results for {}:", report.data_source);
    println!("   Rows:       {}", report.total_rows);
    println!("   Inserted:   {}", report.inserted);
    println!("   Duplicates: {}", report.duplicates);
    println!("   Errors:     {}", report.errors);
    println!("   Chunks:     {}", report.chunks_committed);
    if !report.row_errors.is_empty() {
        println!("\n⚠️  Rejected rows:");
        for row_error in &report.row_errors {
            println!("   - row {}: {}", row_error.row_index, row_error.reason);
        }
    }
    Ok(())
}

fn run_ingest(
    config: &Config,
    source: &str,
    input: PathBuf,
    data_source: Option<String>,
    header_rows: Option<usize>,
    as_of: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let source_id = constants::source_name_to_id(source);
    let mut options = config.ingest_options();
    if let Some(header_rows) = header_rows {
        options.header_rows = header_rows;
    }

    let mut rows = NdjsonReader::open(&input).with_context(|| format!("opening {}", input.display()))?;
    let mut leading = Vec::new();

    // Manual lists are addressed by header name; the last header row builds the adapter
    let manual_adapter;
    let registry = AdapterRegistry::new();
    let adapter: &dyn SourceAdapter = if source_id == constants::MANUAL_SOURCE {
        options.header_rows = options.header_rows.max(1);
        leading.extend(rows.by_ref().take(options.header_rows));
        if !matches!(leading.last(), Some(Ok(_))) {
            anyhow::bail!("manual list {} has no readable header row", input.display());
        }
        let block: Vec<_> = leading.iter().filter_map(|row| row.as_ref().ok().cloned()).collect();
        manual_adapter = ManualListAdapter::from_header_block(&block)?;
        &manual_adapter
    } else {
        registry.require(&source_id)?
    };

    let reference = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let builder = CanonicalRecordBuilder::new(
        GeographyResolver::load_or_empty(&config.geography.path),
        AgeDeriver::new(reference),
    );
    let store = SqliteStore::open(&config.store.sqlite_path)?;
    let mut controller = IngestionController::new(store, builder, options);
    let data_source = data_source.unwrap_or_else(|| source_id.clone());

    info!("Ingesting {} as {} (ages as of {})", input.display(), data_source, reference);
    match controller.run(adapter, &data_source, leading.into_iter().chain(rows)) {
        Ok(report) => print_report(&report, json),
        Err(IngestError::Flush {
            chunk_index,
            report,
            source,
        }) => {
            error!("Flush failed at chunk {}: {}", chunk_index, source);
            print_report(&report, json)?;
            anyhow::bail!(
                "run failed at chunk {} after {} chunk(s) committed; re-running is safe",
                chunk_index,
                report.chunks_committed
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let _guard = logging::init_logging(&config.logging.dir);
    init_metrics();

    match cli.command {
        Commands::Ingest {
            source,
            input,
            data_source,
            header_rows,
            as_of,
            json,
        } => run_ingest(&config, &source, input, data_source, header_rows, as_of, json),
        Commands::Sources => {
            for source in AdapterRegistry::new().list_sources() {
                println!("{source}");
            }
            Ok(())
        }
        Commands::ResolveState { pincode } => {
            let resolver = GeographyResolver::load_or_empty(&config.geography.path);
            println!("{}", resolver.resolve_state(Some(&pincode)));
            Ok(())
        }
    }
}
