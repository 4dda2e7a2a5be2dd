mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

use tf_av::ToolRegistry;
use tf_core::Config;
use tf_pipeline::{Pipeline, PipelineContext};
use tf_state::{Stage, StateStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive defaults from --verbose
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trendforge=trace,tf_pipeline=trace,tf_agents=trace,tf_av=debug,tf_state=debug"
                .to_string()
        } else {
            "trendforge=info,tf_pipeline=info,tf_agents=info,tf_av=info,tf_state=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_pipeline(cli.config.as_deref()))
        }
        Commands::Reset { seed } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(reset_pipeline(cli.config.as_deref(), seed))
        }
        Commands::RunFrom { stage } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_from(cli.config.as_deref(), stage))
        }
        Commands::Status { json } => status(cli.config.as_deref(), json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("trendforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(config_path: Option<&Path>) -> Config {
    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("config: {warning}");
    }
    config
}

fn build_pipeline(config_path: Option<&Path>) -> Pipeline {
    let config = load_config(config_path);
    Pipeline::new(PipelineContext::production(config))
}

async fn run_pipeline(config_path: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config_path);
    let state = pipeline.run().await?;
    println!("Pipeline complete: stage {}", state.stage);
    println!(
        "Output: {}",
        pipeline.context().config.output_path().display()
    );
    Ok(())
}

async fn reset_pipeline(config_path: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let pipeline = build_pipeline(config_path);
    let state = pipeline.reset_and_run(seed).await?;
    println!("Pipeline complete: stage {} (seed {})", state.stage, state.seed);
    Ok(())
}

async fn run_from(config_path: Option<&Path>, stage: Stage) -> Result<()> {
    let pipeline = build_pipeline(config_path);
    let state = pipeline.run_from_stage(stage).await?;
    println!("Pipeline complete: stage {}", state.stage);
    Ok(())
}

fn status(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path);
    let store = StateStore::new(config.state_path());

    if !store.path().exists() {
        println!("No project state at {}", store.path().display());
        println!("Run `trendforge run` to start a project.");
        return Ok(());
    }

    let state = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("Project: {}", state.project_id);
    println!("Stage:   {}", state.stage);
    println!("Seed:    {}", state.seed);
    match state.trend {
        Some(ref trend) => println!("Trend:   {}", trend.name),
        None => println!("Trend:   (none yet)"),
    }
    if let Some(ref quality) = state.trend_quality {
        println!(
            "Quality: {:.1} ({})",
            quality.overall,
            if quality.passed { "passed" } else { "rejected" }
        );
    }
    if state.regeneration_count > 0 {
        println!("Regenerations: {}", state.regeneration_count);
    }

    let visualized = state
        .scenes
        .iter()
        .filter(|s| s.visual_prompt.is_some())
        .count();
    let generated = state
        .scenes
        .iter()
        .filter(|s| s.video_clip_path.is_some())
        .count();
    println!(
        "Scenes:  {} planned, {} visualized, {} clips",
        state.scenes.len(),
        visualized,
        generated
    );

    if let Some(ref err) = state.last_error {
        println!("Last error: {err}");
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path);
    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in registry.check_all() {
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
        println!("Some tools are missing. Install them to enable assembly.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration parsed with {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    println!("  State file: {}", config.state_path().display());
    println!("  Output:     {}", config.output_path().display());
    println!(
        "  Quality gate: threshold {:.1}, max {} attempts",
        config.quality.pass_threshold, config.quality.max_attempts
    );
    println!("  Scenes: {}", config.planning.scene_count);

    Ok(())
}
