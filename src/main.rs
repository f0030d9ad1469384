// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use the_bindery::backends::ProcessToolFactory;
use the_bindery::config::{load_and_validate_config, RuntimeBuilder};
use the_bindery::engine::RunReport;
use the_bindery::model::StageStatus;

const USAGE: &str = "Usage: the-bindery <run.yaml> [--resume-off]";

/// Command-line options.
#[derive(Debug, PartialEq)]
struct Options {
    config: PathBuf,
    resume: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Options> {
    let mut config = None;
    let mut resume = true;

    for arg in args {
        match arg.as_str() {
            "--resume-off" => resume = false,
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            path if config.is_none() => config = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{}'\n{}", extra, USAGE),
        }
    }

    match config {
        Some(config) => Ok(Options { config, resume }),
        None => bail!("{}", USAGE),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let options = parse_args(env::args().skip(1))?;

    let mut cfg = load_and_validate_config(&options.config)
        .with_context(|| format!("loading {}", options.config.display()))?;
    if !options.resume {
        cfg.resume = false;
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("⏹  interrupt received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let pipeline = RuntimeBuilder::from_config(&cfg, cancel, &ProcessToolFactory)
        .context("building pipeline")?;

    println!("🧬 The Bindery");
    println!("Config:  {}", options.config.display());
    println!("Mode:    {}", pipeline.mode());
    println!("Output:  {}", cfg.output_dir.display());
    println!();

    let started = Instant::now();
    let outcome = pipeline.run().await.context("run aborted")?;
    let report = RunReport::new(pipeline.mode(), &outcome);
    report
        .write(pipeline.report_path())
        .await
        .with_context(|| format!("writing {}", pipeline.report_path().display()))?;

    for stage in &report.stages {
        let status = match &stage.status {
            StageStatus::Completed => format!("{}/{} succeeded", stage.succeeded, stage.tasks),
            StageStatus::Disabled => "disabled".to_string(),
            StageStatus::Skipped { reason } => format!("skipped ({})", reason),
        };
        println!("  {:<22} {}", stage.stage.as_str(), status);
    }
    println!();
    println!(
        "✅ {} designs summarised in {}",
        outcome.consolidation.rows,
        outcome.consolidation.summary_path.display()
    );
    println!("📄 Report: {}", pipeline.report_path().display());
    println!(
        "⏱  {:?}, {} failed tasks",
        started.elapsed(),
        report.failed_tasks()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_path_with_resume_on_by_default() {
        let options = parse_args(args(&["run.yaml"])).unwrap();
        assert_eq!(options.config, PathBuf::from("run.yaml"));
        assert!(options.resume);
    }

    #[test]
    fn resume_off_flag() {
        let options = parse_args(args(&["--resume-off", "run.yaml"])).unwrap();
        assert!(!options.resume);
    }

    #[test]
    fn rejects_missing_or_extra_arguments() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.yaml", "b.yaml"])).is_err());
        assert!(parse_args(args(&["--verbose", "a.yaml"])).is_err());
    }
}
