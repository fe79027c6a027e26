use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use json_param_rs::config::load_with_env;
use json_param_rs::http::start_options_host;
use json_param_rs::logging::log_info;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "json-param-server")]
#[command(about = "Serve dynamic parameter options over HTTP")]
struct CliOptions {
    /// Config file describing documents, credentials and jobs (TOML/YAML/JSON)
    #[arg(long = "config", short = 'c')]
    config: PathBuf,

    /// Override the bind host
    #[arg(long = "host")]
    host: Option<String>,

    /// Override the bind port (0 picks a free port)
    #[arg(long = "port", short = 'p')]
    port: Option<u16>,

    /// Override the route prefix
    #[arg(long = "base-path")]
    base_path: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opts = CliOptions::parse();
    let (config, base_dir) = load_with_env(&opts.config)?;

    let mut settings = config.host_settings();
    if let Some(host) = opts.host {
        settings.host = host;
    }
    if let Some(port) = opts.port {
        settings.port = port;
    }
    if let Some(base_path) = opts.base_path {
        settings.base_path = base_path;
    }

    let endpoint = config
        .build_endpoint(&base_dir)
        .with_context(|| format!("invalid config {}", opts.config.display()))?;
    let mut host = start_options_host(endpoint, &settings)?;
    println!("{}", host.url());

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    log_info(
        "shutdown requested",
        Some(json!({ "url": host.url() })),
        Some(json!({ "module": "server" })),
    );
    host.stop()
}
