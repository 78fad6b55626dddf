use anyhow::{Context, Result};
use stackdeploy::cli::console::{print_logs, print_status};
use stackdeploy::cli::{Args, ConfigDiscovery, ConsoleObserver, DeployOptions, DetectOptions, ExecutionMode};
use stackdeploy::container::ContainerState;
use stackdeploy::pipeline::{DeploymentConfig, Deployer};
use stackdeploy::{VERSION, detect, recipe};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    debug!("stackdeploy v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let exit_code = match run(mode).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(args: &Args) {
    let level = args.effective_log_level();
    let mut filter = EnvFilter::from_default_env();

    if env::var("RUST_LOG").is_err()
        && let Ok(directive) = format!("stackdeploy={}", level).parse::<Directive>()
    {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

async fn run(mode: ExecutionMode) -> Result<i32> {
    match mode {
        ExecutionMode::Deploy(options) => run_deploy(options).await,
        ExecutionMode::Detect(options) => run_detect(options),
        ExecutionMode::Status { config } => {
            let config = load_config(config.as_deref(), None, None)?;
            let status = Deployer::for_config(&config)
                .lifecycle()
                .status(&config.container_name)
                .await;
            println!("Container: {}", config.container_name);
            print_status(&status);
            Ok(if status.state == ContainerState::Unknown { 1 } else { 0 })
        }
        ExecutionMode::Logs { tail, config } => {
            let config = load_config(config.as_deref(), None, None)?;
            let tail = tail.unwrap_or(config.log_tail_lines);
            let logs = Deployer::for_config(&config)
                .lifecycle()
                .logs(&config.container_name, tail)
                .await
                .with_context(|| format!("Failed to fetch logs for {}", config.container_name))?;
            print_logs(&logs);
            Ok(0)
        }
        ExecutionMode::Remove { config } => {
            let config = load_config(config.as_deref(), None, None)?;
            Deployer::for_config(&config)
                .lifecycle()
                .remove_existing(&config.container_name)
                .await;
            println!("Removed container (if it existed): {}", config.container_name);
            Ok(0)
        }
        ExecutionMode::ShowConfig { config } => {
            ConfigDiscovery::show_discovery_info(config.as_deref());
            Ok(0)
        }
    }
}

fn load_config(explicit: Option<&Path>, dir: Option<PathBuf>, port: Option<u16>) -> Result<DeploymentConfig> {
    let defaults = ConfigDiscovery::load(explicit).context("Failed to load configuration")?;
    Ok(defaults.to_deployment_config(dir, port)?)
}

async fn run_deploy(options: DeployOptions) -> Result<i32> {
    let config = load_config(options.config_override.as_deref(), options.dir, options.port)?;
    debug!("Deployment configuration: {:?}", config);

    let mut observer = ConsoleObserver::new(true);
    let deployed = Deployer::for_config(&config).deploy(&config, &mut observer).await;

    Ok(if deployed { 0 } else { 1 })
}

fn run_detect(options: DetectOptions) -> Result<i32> {
    let dir = match options.dir {
        Some(dir) => dir,
        None => env::current_dir().context("Failed to determine current directory")?,
    };

    let descriptor = detect(&dir)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("Project type: {}", descriptor.stack);
        if let Some(version) = &descriptor.language_version {
            println!("Java version: {}", version);
        }
        for flag in &descriptor.flags {
            println!("  - {}", flag);
        }
    }

    if options.print_recipe {
        match recipe::generate(&descriptor) {
            Ok(recipe) => {
                println!();
                print!("{}", recipe.dockerfile);
            }
            Err(e) => {
                eprintln!("{}", e);
                return Ok(1);
            }
        }
    }

    Ok(if descriptor.stack.is_recognized() { 0 } else { 1 })
}
