mod fleet;
mod live;
mod stream;
mod telemetry;
mod track;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use web::Config;

#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(about = "Drone fleet telemetry dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    CheckConfig { config: String },
    /// Run the dashboard server
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config } => check_config(&config),
        Commands::Serve { config } => serve(&config),
    }
}

fn check_config(path: &str) -> ExitCode {
    match Config::from_file(path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("  upstream api:     {}", config.upstream.base_url);
            println!("  stream template:  {}", config.upstream.stream_url);
            println!("  bind:             {}", config.web.bind);
            println!("  stale threshold:  {:?}", config.live.stale_threshold);
            println!("  history capacity: {}", config.live.history_capacity);
            println!("  track point cap:  {}", config.live.track_point_cap);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Config error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
