use anyhow::Result;
use clap::{Parser, Subcommand};
use incidentd::config::Config;
use incidentd::incident::bulk::{self, BulkUpdate};
use incidentd::incident::generate::Generator;
use incidentd::incident::query::{AssigneeFilter, QueryEngine, StatusFilter};
use incidentd::incident::store::IncidentStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "incidentd",
    about = "Incident tracking daemon with a queryable dashboard API",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (API server)
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        bind: Option<String>,
    },

    /// List incidents with the dashboard filters and summary counts
    List {
        /// Status filter: Open, Any, or a literal status
        #[arg(long)]
        status: Option<String>,

        /// Assignee filter: 'me' resolves to the configured identity
        #[arg(long = "assigned-to")]
        assigned_to: Option<String>,
    },

    /// Show one incident by its number
    Show {
        /// Incident number (the external identifier, not the internal id)
        number: i64,
    },

    /// Generate synthetic incidents for load/demo testing
    Generate {
        /// How many incidents to mint
        #[arg(long, default_value = "1")]
        count: usize,

        /// RNG seed for reproducible attributes
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Apply one action across a set of incident numbers
    Bulk {
        /// Action: resolve, acknowledge, or reassign
        #[arg(long)]
        action: String,

        /// Comma-separated incident numbers
        #[arg(long, value_delimiter = ',', required = true)]
        numbers: Vec<i64>,

        /// Assignee name (reassign only)
        #[arg(long)]
        assignee: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            tracing::info!(bind = %config.bind, "Starting incidentd daemon");
            incidentd::serve(&config).await?;
        }
        Commands::List {
            status,
            assigned_to,
        } => {
            let pool = incidentd::open_storage(&config.db_path)?;
            let query = QueryEngine::new(pool, config.current_user.clone());

            let status = StatusFilter::parse(status.as_deref())?;
            let assignee = AssigneeFilter::parse(assigned_to.as_deref());

            let summary = query.aggregate_counts()?;
            println!(
                "Open: {}  (Triggered: {}, Acknowledged: {})  Resolved: {}  Total: {}",
                summary.open_count,
                summary.triggered_count,
                summary.acknowledged_count,
                summary.resolved_count,
                summary.total
            );
            println!();

            let incidents = query.filter(status, assignee)?;
            if incidents.is_empty() {
                println!("No incidents match.");
            } else {
                println!(
                    "{:<8} | {:<12} | {:<12} | {:<22} | Title",
                    "Number", "Status", "Assigned", "Service"
                );
                println!("{:-<8}-|-{:-<12}-|-{:-<12}-|-{:-<22}-|-{:-<30}", "", "", "", "", "");
                for inc in incidents {
                    println!(
                        "{:<8} | {:<12} | {:<12} | {:<22} | {}",
                        inc.number, inc.status, inc.assigned_to, inc.service, inc.title
                    );
                }
            }
        }
        Commands::Show { number } => {
            let pool = incidentd::open_storage(&config.db_path)?;
            let store = IncidentStore::new(pool);

            let inc = store.find_by_number(number)?;
            println!("Incident #{}", inc.number);
            println!("  Title:       {}", inc.title);
            println!("  Service:     {}", inc.service);
            println!("  Status:      {}", inc.status);
            println!("  Assigned to: {}", inc.assigned_to);
            println!("  Created at:  {}", inc.created_at.to_rfc3339());
        }
        Commands::Generate { count, seed } => {
            let pool = incidentd::open_storage(&config.db_path)?;
            let generator = Generator::new(pool);

            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            let minted = generator.generate(count, &mut rng)?;
            println!("Generated {} incidents:", minted.len());
            for number in minted {
                println!("  #{number}");
            }
        }
        Commands::Bulk {
            action,
            numbers,
            assignee,
        } => {
            let pool = incidentd::open_storage(&config.db_path)?;
            let store = IncidentStore::new(pool);

            let req = BulkUpdate {
                numbers,
                action: Some(action),
                assignee,
            };
            let updated = bulk::apply(&store, &req)?;
            println!("Updated {updated} incidents.");
        }
    }

    Ok(())
}
