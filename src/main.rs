use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use harvester::collectors::HttpCollector;
use harvester::config::load_agent_config;
use harvester::lifecycle::EventChannel;
use harvester::storage::{DataStore, InMemoryDataStore};
use harvester::{
    CollectionAgent, CollectionPipeline, CollectionRequest, Config, DataTarget, ExecutionContext,
    SourceType,
};

#[derive(Parser)]
#[command(name = "harvester")]
#[command(about = "Run lifecycle-managed data collection agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an agent config file
    Validate {
        #[arg(help = "Agent config (.json, .toml, .yaml)")]
        config: PathBuf,
    },
    /// Run a single collection and print the result as JSON
    Collect {
        #[arg(help = "Agent config (.json, .toml, .yaml)")]
        config: PathBuf,
        #[arg(long, help = "Collect from this URL instead of the configured sources")]
        target: Option<String>,
        #[arg(long, default_value = "website", help = "Source type of --target")]
        target_type: String,
    },
    /// Collect repeatedly until interrupted
    Watch {
        #[arg(help = "Agent config (.json, .toml, .yaml)")]
        config: PathBuf,
        #[arg(long, default_value_t = 300, help = "Seconds between runs")]
        interval: u64,
    },
    /// Test every configured data source
    Health {
        #[arg(help = "Agent config (.json, .toml, .yaml)")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config)?,
        Commands::Collect {
            config,
            target,
            target_type,
        } => collect(&config, target, &target_type).await?,
        Commands::Watch { config, interval } => watch_sources(&config, interval).await?,
        Commands::Health { config } => health(&config).await?,
    }

    Ok(())
}

fn build_agent(
    settings: &Config,
    path: &Path,
) -> Result<(CollectionAgent<HttpCollector>, Arc<InMemoryDataStore>)> {
    let agent_config = load_agent_config(path)?;
    let store = Arc::new(InMemoryDataStore::new());

    let pipeline = CollectionPipeline::new(HttpCollector::new(settings)?)
        .with_store(store.clone() as Arc<dyn DataStore>);
    let agent = CollectionAgent::with_events(
        agent_config,
        pipeline,
        EventChannel::new(settings.event_channel_capacity),
    );

    Ok((agent, store))
}

fn validate(path: &Path) -> Result<()> {
    let (agent, _) = build_agent(&Config::from_env(), path)?;
    let outcome = agent.validate_config(agent.config());

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        bail!("{} is not a valid agent config", path.display());
    }
    Ok(())
}

async fn collect(path: &Path, target: Option<String>, target_type: &str) -> Result<()> {
    let (mut agent, store) = build_agent(&Config::from_env(), path)?;
    let config = agent.config().clone();
    agent.initialize(config).await?;

    let request = match target {
        Some(url) => {
            let Some(kind) = SourceType::parse(target_type) else {
                bail!("Unknown target type: {}", target_type);
            };
            CollectionRequest::for_targets(vec![DataTarget::new("cli", kind, url)])
        }
        None => CollectionRequest::default(),
    };

    let context = ExecutionContext::new("cli");
    let result = agent.execute(&request, &context).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    log::info!("Stored {} items", store.count().await?);
    agent.cleanup().await?;
    Ok(())
}

async fn watch_sources(path: &Path, interval: u64) -> Result<()> {
    let (mut agent, store) = build_agent(&Config::from_env(), path)?;
    let config = agent.config().clone();
    agent.initialize(config).await?;

    let mut events = agent.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log::debug!("{}", serde_json::to_string(&event).unwrap_or_default());
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, stopping collection");
            let _ = shutdown_tx.send(true);
        }
    });

    let context = ExecutionContext::new("cli");
    let runs = agent
        .run_until_stopped(Duration::from_secs(interval), &context, shutdown_rx)
        .await?;

    println!(
        "Completed {} runs, {} items stored, metrics: {}",
        runs,
        store.count().await?,
        serde_json::to_string(&agent.metrics())?
    );
    agent.cleanup().await?;
    Ok(())
}

async fn health(path: &Path) -> Result<()> {
    let (mut agent, _) = build_agent(&Config::from_env(), path)?;
    let config = agent.config().clone();
    agent.initialize(config).await?;

    let healthy = agent.health_check().await;
    println!("{}", if healthy { "healthy" } else { "unhealthy" });
    agent.cleanup().await?;

    if !healthy {
        bail!("One or more data sources are unreachable");
    }
    Ok(())
}
