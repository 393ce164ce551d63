use clap::Parser as ClapParser;
use railprobe_core::backend::{LoadState, PageDriver};
use railprobe_core::locator::LocatorCandidate;
use railprobe_core::resolution::{ResolveOptions, Resolver};
use railprobe_h::HeadlessDriver;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Open a page and report how each locator resolves against it.
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to open
    url: String,

    /// CSS selector candidate (repeatable)
    #[arg(long)]
    css: Vec<String>,

    /// Visible-text candidate (repeatable)
    #[arg(long)]
    text: Vec<String>,

    /// Per-attempt window in milliseconds
    #[arg(long, default_value_t = 2000)]
    attempt_ms: u64,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let candidates: Vec<LocatorCandidate> = args
        .css
        .iter()
        .map(LocatorCandidate::css)
        .chain(args.text.iter().map(LocatorCandidate::text))
        .collect();
    if candidates.is_empty() {
        return Err("give at least one --css or --text candidate".into());
    }

    let mut driver = HeadlessDriver::new_with_visibility(args.visible);
    driver.launch().await?;
    driver.navigate(&args.url).await?;
    if let Err(e) = driver
        .wait_for_load(LoadState::Load, Duration::from_secs(10))
        .await
    {
        eprintln!("Page did not finish loading: {}", e);
    }

    let resolver = Resolver::new(ResolveOptions {
        per_attempt_timeout: Duration::from_millis(args.attempt_ms),
        ..ResolveOptions::default()
    });
    for candidate in &candidates {
        let outcome = resolver
            .resolve(&mut driver, &candidate.to_string(), std::slice::from_ref(candidate), None)
            .await;
        match outcome {
            Ok(resolved) => println!(
                "{:<40} found ({}, {:?})",
                candidate.to_string(),
                candidate.kind().name(),
                resolved.attempts.last().map(|a| a.elapsed).unwrap_or_default()
            ),
            Err(failure) => println!("{:<40} {}", candidate.to_string(), failure.kind),
        }
    }

    driver.close().await?;
    Ok(())
}
