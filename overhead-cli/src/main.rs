//! overhead: CLI for finding and identifying aircraft flying nearby.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use tokio_util::sync::CancellationToken;

use overhead_core::config::{self, Config, SourceMode};
use overhead_core::{
    distance_km, lookup, Coordinate, ResolvedAircraftRecord, SearchRadius,
    TypeDescriptionIndex, UNKNOWN_AIRCRAFT,
};
use overhead_resolver::{source, BatchResolver, MetadataClient, PrefixResolver, ResolveError};

#[derive(Parser)]
#[command(
    name = "overhead",
    version,
    about = "Find and identify aircraft flying nearby"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find aircraft near the observer and identify them
    Nearby {
        /// Observer latitude (falls back to config)
        #[arg(long)]
        lat: Option<f64>,

        /// Observer longitude (falls back to config)
        #[arg(long)]
        lon: Option<f64>,

        /// Search radius in kilometers (falls back to config)
        #[arg(long)]
        radius_km: Option<f64>,

        /// Traffic source: flightsearch or receiver
        #[arg(long)]
        source: Option<String>,

        /// Print narration sentences instead of a table
        #[arg(long)]
        speak: bool,
    },

    /// Resolve a single ICAO hex address to an aircraft description
    Lookup {
        /// ICAO hex address, e.g. A12345
        hex: String,
    },

    /// Write the default config file
    InitConfig,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Nearby {
            lat,
            lon,
            radius_km,
            source,
            speak,
        } => cmd_nearby(lat, lon, radius_km, source, speak).await,
        Commands::Lookup { hex } => cmd_lookup(&hex).await,
        Commands::InitConfig => cmd_init_config(),
    }
}

// ---------------------------------------------------------------------------
// nearby
// ---------------------------------------------------------------------------

async fn cmd_nearby(
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: Option<f64>,
    source_override: Option<String>,
    speak: bool,
) {
    let mut config = config::load_config();
    if let Some(mode) = source_override {
        match SourceMode::parse(&mode) {
            Some(m) => config.source.mode = m,
            None => {
                eprintln!("Unknown source {mode:?} (expected flightsearch or receiver)");
                process::exit(2);
            }
        }
    }

    let lat = lat.or(config.observer.lat).unwrap_or_else(|| {
        eprintln!("No observer latitude; pass --lat or set observer.lat in the config");
        process::exit(2);
    });
    let lon = lon.or(config.observer.lon).unwrap_or_else(|| {
        eprintln!("No observer longitude; pass --lon or set observer.lon in the config");
        process::exit(2);
    });
    let origin = Coordinate::new(lat, lon).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(2);
    });
    let radius = radius_km.unwrap_or(config.observer.radius_km);
    let search = SearchRadius::new(origin, radius).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(2);
    });

    let index = load_index(&config);
    let traffic = source::source_from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(2);
    });

    eprintln!(
        "Searching within {:.0} km of {:.4}, {:.4} ({})",
        search.radius_km(),
        origin.lat(),
        origin.lon(),
        config.source.mode.as_str()
    );
    let observations = match traffic.fetch(&search).await {
        Ok(obs) => obs,
        Err(e) => {
            eprintln!("Error fetching traffic: {e}");
            process::exit(1);
        }
    };
    eprintln!("{} aircraft reported", observations.len());

    let resolver = PrefixResolver::new(metadata_client(&config));
    let batch =
        BatchResolver::new(resolver, index).with_max_in_flight(config.service.max_concurrent);

    // Ctrl-C abandons the batch instead of printing a stale result
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let records = match batch.resolve_all(observations, &search, &cancel).await {
        Ok(records) => records,
        Err(ResolveError::Cancelled) => {
            eprintln!("Cancelled.");
            process::exit(130);
        }
        Err(e) => {
            eprintln!("Error resolving batch: {e}");
            process::exit(1);
        }
    };

    if records.is_empty() {
        println!("No flights found.");
        return;
    }

    if speak {
        for record in &records {
            println!("{}", record.spoken_summary());
        }
    } else {
        print_table(&search, records);
    }
}

fn print_table(search: &SearchRadius, mut records: Vec<ResolvedAircraftRecord>) {
    let distance_of = |record: &ResolvedAircraftRecord| -> Option<f64> {
        match (record.observation.lat, record.observation.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
                .ok()
                .map(|pos| distance_km(search.origin(), pos)),
            _ => None,
        }
    };

    records.sort_by(|a, b| {
        let da = distance_of(a).unwrap_or(f64::MAX);
        let db = distance_of(b).unwrap_or(f64::MAX);
        da.total_cmp(&db)
    });

    let mut table = Table::new();
    table.set_header(vec![
        "Aircraft", "Hex", "Callsign", "FL", "Speed", "Distance",
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.description),
            Cell::new(&record.observation.icao_hex),
            Cell::new(record.observation.callsign.as_deref().unwrap_or("-")),
            Cell::new(record.flight_level()),
            Cell::new(
                record
                    .observation
                    .ground_speed_kts
                    .map(|v| format!("{v} kt"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(
                distance_of(record)
                    .map(|d| format!("{d:.1} km"))
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
}

// ---------------------------------------------------------------------------
// lookup
// ---------------------------------------------------------------------------

async fn cmd_lookup(hex: &str) {
    let config = config::load_config();
    let index = load_index(&config);
    let resolver = PrefixResolver::new(metadata_client(&config));

    match resolver.resolve(hex).await {
        Ok(Some(record)) => {
            let description = index.describe_or_unknown(record.type_code.as_deref());
            match &record.type_code {
                Some(code) => println!("{hex}: {description} [{code}]"),
                None => println!("{hex}: {description}"),
            }
        }
        Ok(None) => println!("{hex}: {UNKNOWN_AIRCRAFT}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

// ---------------------------------------------------------------------------
// init-config
// ---------------------------------------------------------------------------

fn cmd_init_config() {
    match config::save_config(&Config::default()) {
        Ok(path) => println!("Wrote {}", path.display()),
        Err(e) => {
            eprintln!("Error writing config: {e}");
            process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// shared construction
// ---------------------------------------------------------------------------

fn load_index(config: &Config) -> TypeDescriptionIndex {
    let manufacturers =
        lookup::load_manufacturers(&config.datasets.manufacturers).unwrap_or_else(|e| {
            eprintln!("Error loading {}: {e}", config.datasets.manufacturers);
            process::exit(1);
        });
    let types = lookup::load_aircraft_types(&config.datasets.aircraft_types).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {e}", config.datasets.aircraft_types);
        process::exit(1);
    });
    let index = TypeDescriptionIndex::build(&manufacturers, &types);
    eprintln!("Loaded {} aircraft type descriptions", index.len());
    index
}

fn metadata_client(config: &Config) -> MetadataClient {
    MetadataClient::new(
        &config.service.base_url,
        Duration::from_secs(config.service.timeout_sec),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error building metadata client: {e}");
        process::exit(1);
    })
}
