use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use json_param_rs::config::load_with_env;
use json_param_rs::endpoint::{error_body, to_wire};
use json_param_rs::JsonResult;

#[derive(Parser, Debug)]
#[command(name = "json-param-options")]
#[command(about = "Print the option list of one parameter")]
struct CliOptions {
    /// Config file describing documents, credentials and jobs (TOML/YAML/JSON)
    #[arg(long = "config", short = 'c')]
    config: PathBuf,

    /// Job path, e.g. team/app/build
    #[arg(long = "job", short = 'j')]
    job: String,

    /// Parameter name within the job
    #[arg(long = "param", short = 'p')]
    param: String,

    /// Current value of the referenced parameter; omitted means initial render
    #[arg(long = "ref-value")]
    ref_value: Option<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let opts = CliOptions::parse();
    let (config, base_dir) = load_with_env(&opts.config)?;
    let endpoint = config.build_endpoint(&base_dir)?;

    let result = match opts.ref_value.as_deref() {
        Some(ref_value) => endpoint.handle(&opts.job, &opts.param, ref_value),
        None => endpoint.render(&opts.job, &opts.param),
    };
    match &result {
        JsonResult::Failure(failure) if failure.is_context_loss() => {
            eprintln!("{}", serde_json::to_string_pretty(&error_body(failure))?);
            Ok(1)
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(&to_wire(&result))?);
            Ok(0)
        }
    }
}
