use anyhow::{anyhow, Context};
use clap::Parser;
use railprobe_core::backend::PageDriver;
use railprobe_core::config::{ConfigLoader, RailprobeConfig};
use railprobe_core::scenario::{
    builtin_scenarios, run_scenarios, select_scenarios, ScenarioContext, ScenarioReport,
};
use railprobe_h::HeadlessDriver;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "railprobe", version, about = "Smoke scenarios for a railway operator's website")]
struct Args {
    /// Configuration file (default: ./railprobe.yaml, then ~/.railprobe/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,

    /// Override the site under test
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for success screenshots
    #[arg(long)]
    screenshots: Option<PathBuf>,

    /// List the available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Scenarios to run, in order (default: all)
    scenarios: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // stdout carries the report; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list {
        for scenario in builtin_scenarios() {
            println!("{:<26} {}", scenario.name(), scenario.description());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let scenarios = select_scenarios(&args.scenarios).map_err(|e| anyhow!(e))?;
    let config = load_config(&args).await?;

    let ctx = ScenarioContext::new(config);
    ctx.prepare().await.with_context(|| {
        format!(
            "creating screenshot directory {}",
            ctx.config.screenshots.dir.display()
        )
    })?;

    let config = &ctx.config;
    let mut driver = HeadlessDriver::new_with_visibility(config.browser.visible)
        .with_window(config.viewport.width, config.viewport.height);
    driver
        .launch()
        .await
        .context("Failed to launch headless browser")?;

    let reports = run_scenarios(&mut driver, &ctx, &scenarios).await;

    if let Err(e) = driver.close().await {
        tracing::warn!("Error closing browser: {}", e);
    }

    print_summary(&reports);
    if reports.iter().all(|r| r.passed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn load_config(args: &Args) -> anyhow::Result<RailprobeConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    if args.visible {
        config.browser.visible = true;
    }
    if let Some(url) = &args.base_url {
        config.site.base_url = url.clone();
    }
    if let Some(dir) = &args.screenshots {
        config.screenshots.dir = dir.clone();
    }
    Ok(config)
}

fn print_summary(reports: &[ScenarioReport]) {
    println!();
    for report in reports {
        let status = if report.passed { "PASS" } else { "FAIL" };
        println!(
            "{} {:<26} {:>6.1}s",
            status,
            report.name,
            report.duration.as_secs_f64()
        );
        if let Some(path) = &report.screenshot {
            println!("     screenshot: {}", path.display());
        }
        if let Some(message) = &report.message {
            for line in message.lines() {
                println!("     {}", line);
            }
        }
    }
    let passed = reports.iter().filter(|r| r.passed).count();
    println!("\n{} passed, {} failed", passed, reports.len() - passed);
}
