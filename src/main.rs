use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foundry_hub::api::{self, AppState};
use foundry_hub::config::HubConfig;
use foundry_hub::manifest::ManifestValidator;
use foundry_hub::metrics::EmpireSnapshot;
use foundry_hub::patterns::PatternDetector;
use foundry_hub::store::{ManifestStore, Severity};

#[derive(Parser)]
#[command(name = "foundry")]
#[command(about = "Unified status hub for manifest-driven projects")]
struct Cli {
    /// Manifest directory; overrides FOUNDRY_HUB_DIR and the platform
    /// default.
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the report API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print the project status report
    Status {
        /// Include archived projects
        #[arg(long)]
        all: bool,
    },
    /// Print the metrics snapshot as JSON
    Metrics,
    /// Validate manifests and list diagnostics
    Check,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "foundry_hub=info,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = HubConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.manifest_dir = dir;
    }

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        Some(Commands::Status { all }) => status(&config, all)?,
        Some(Commands::Metrics) => metrics(&config)?,
        Some(Commands::Check) => check(&config)?,
        None => serve(config, 3000).await?,
    }

    Ok(())
}

async fn serve(config: HubConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!(
        dir = %config.manifest_dir.display(),
        "Starting Foundry Hub server on port {}",
        port
    );

    let store = load_store(&config)?;
    let detector = PatternDetector::new(config.patterns);
    let app = api::create_router(AppState::new(store, detector));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Foundry Hub server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn status(config: &HubConfig, all: bool) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let scan = store.current();
    let snapshot = EmpireSnapshot::compute(scan.projects());

    println!("Project Status Report");
    println!("{}", "=".repeat(60));

    for project in scan.projects() {
        if !all && project.status == foundry_hub::models::ProjectStatus::Archived {
            continue;
        }
        println!("\n{} [{}]", project.name, project.id);
        println!("   Type:    {}", project.project_type);
        println!("   Status:  {}", project.status.as_str());
        if !project.revenue.is_zero() {
            println!("   Revenue: {}", project.revenue);
        }
        if project.users > 0 {
            println!("   Users:   {}", project.users);
        }
        let open = project.tasks.iter().filter(|t| t.status.is_open()).count();
        if !project.tasks.is_empty() {
            println!("   Tasks:   {} ({} open)", project.tasks.len(), open);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{} projects ({} active), total revenue {}",
        snapshot.total_projects, snapshot.active_projects, snapshot.total_revenue
    );
    if !scan.diagnostics().is_empty() {
        println!(
            "{} diagnostics; run `foundry check` for details",
            scan.diagnostics().len()
        );
    }

    Ok(())
}

fn metrics(config: &HubConfig) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let scan = store.current();
    let snapshot = EmpireSnapshot::compute(scan.projects());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn check(config: &HubConfig) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let diagnostics = store.diagnostics();

    if diagnostics.is_empty() {
        println!("All manifests valid.");
        return Ok(());
    }

    for diagnostic in &diagnostics {
        println!(
            "{}: {}: {}",
            match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            diagnostic.path.display(),
            diagnostic.error
        );
    }

    let rejected = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if rejected > 0 {
        anyhow::bail!("{} manifest file(s) rejected", rejected);
    }
    Ok(())
}

fn load_store(config: &HubConfig) -> anyhow::Result<ManifestStore> {
    ManifestStore::load(
        config.manifest_dir.clone(),
        ManifestValidator::new(config.validator.clone()),
    )
}
