mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cf_av::ToolRegistry;
use cf_core::config::Config;
use cf_pipeline::{FsOutputStore, RetentionManager, RetentionPolicy};
use clap::Parser;
use cli::{Cli, Commands};

fn load_config(path: Option<&Path>, data_dir: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir.to_path_buf();
    }
    config
}

async fn start_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting clipforge {}", env!("CARGO_PKG_VERSION"));
    cf_server::start(config).await?;
    Ok(())
}

async fn run_cut(config: Config, source: &str, ranges: &str, json: bool) -> Result<()> {
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let pipeline = cf_pipeline::build_pipeline(&config, tools, true)
        .context("failed to set up the pipeline")?;

    let artifact = pipeline.run(source, ranges).await?;

    if json {
        let mut value = serde_json::to_value(&artifact)?;
        value["path"] = serde_json::Value::String(artifact.path.display().to_string());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", artifact.path.display());
    }
    Ok(())
}

async fn run_cleanup(config: Config) -> Result<()> {
    let store = Arc::new(FsOutputStore::new(
        config.storage.output_dir(),
        &config.encode.container,
    ));
    let retention = RetentionManager::new(
        store,
        config.storage.scratch_dir(),
        RetentionPolicy::from(&config.retention),
    );

    let report = retention.force_pass().await;
    println!(
        "Kept {} output(s), removed {} output(s) and {} stale workspace(s)",
        report.outputs_kept, report.outputs_removed, report.workspaces_removed
    );
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        anyhow::bail!("ffmpeg is missing; install it or set tools.ffmpeg_path");
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration parsed");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data dir: {}", config.storage.data_dir.display());
    println!("  Max outputs: {}", config.retention.max_outputs);
    println!(
        "  Workspace max age: {}s",
        config.retention.workspace_max_age_secs
    );
    println!(
        "  Fetch endpoint: {}",
        config.fetcher.endpoint.as_deref().unwrap_or("(none)")
    );

    let warnings = config.validate();
    for warning in &warnings {
        println!("  ! {warning}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=trace,cf_core=trace,cf_av=trace,cf_pipeline=trace,cf_server=debug,tower_http=debug"
                .to_string()
        } else {
            "clipforge=info,cf_core=info,cf_av=info,cf_pipeline=info,cf_server=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config = load_config(cli.config.as_deref(), cli.data_dir.as_deref());

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(config, host, port))
        }
        Commands::Cut {
            source,
            ranges,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_cut(config, &source, &ranges, json))
        }
        Commands::Cleanup => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_cleanup(config))
        }
        Commands::CheckTools => check_tools(&config),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
