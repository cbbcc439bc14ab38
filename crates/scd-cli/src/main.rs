use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "scd")]
#[command(about = "Shipping zone resolution and cost reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile charged vs carrier shipping cost for a date range
    Reconcile {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Zone name, or "all"
        #[arg(long, default_value = "all")]
        zone: String,

        /// all | loss | gain
        #[arg(long, default_value = "all")]
        loss: String,

        /// Substring over order number, customer email and name
        #[arg(long, default_value = "")]
        search: String,

        /// 1-based page number; requires --page-size
        #[arg(long, requires = "page_size")]
        page: Option<usize>,

        #[arg(long)]
        page_size: Option<usize>,

        /// Print the full report as JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Resolve the zone for one address against a zones JSON file
    MatchZone {
        /// JSON array of zones (same shape as the file store)
        #[arg(long)]
        zones: String,

        #[arg(long, default_value = "")]
        country: String,

        #[arg(long, default_value = "")]
        region: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        postal_code: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail if the merged config has keys this surface never reads
        #[arg(long, value_parser = ["cli", "daemon"])]
        check: Option<String>,
    },
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev convenience: load .env.local if present. Does not override real env.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            config_paths,
            start,
            end,
            zone,
            loss,
            search,
            page,
            page_size,
            json,
        } => {
            let args = commands::reconcile::ReconcileArgs {
                config_paths,
                start,
                end,
                zone,
                loss,
                search,
                page,
                page_size,
                json,
            };
            commands::reconcile::run(args).await?;
        }

        Commands::MatchZone {
            zones,
            country,
            region,
            city,
            postal_code,
        } => {
            commands::zones::match_zone(&zones, &country, &region, &city, &postal_code).await?;
        }

        Commands::ConfigHash { paths, check } => {
            let loaded = scd_config::load_layered_yaml(&paths)?;
            if let Some(surface) = check.as_deref() {
                let surface = match surface {
                    "daemon" => scd_config::ConfigSurface::Daemon,
                    _ => scd_config::ConfigSurface::Cli,
                };
                scd_config::unused_keys(surface, &loaded.config_json).ensure_clean()?;
            }
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
