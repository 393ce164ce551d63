//! End-to-end scenarios against the operator's public site.
//!
//! Scenarios run one after another on a single page driver. A failing
//! scenario is reported and the suite moves on.

mod connection;
mod landing;
mod menu;
mod search;

pub use connection::{GoToConnectionSearch, TrainConnectionSearch};
pub use landing::LandingAndCookies;
pub use menu::{menu_slug, MainMenu};
pub use search::SearchEngine;

use crate::backend::{DriverError, PageDriver};
use crate::config::RailprobeConfig;
use crate::cookies::{dismiss_cookie_banner, CookieOutcome};
use crate::interact::InteractionError;
use crate::resolution::{ResolutionFailure, ResolveOptions, Resolver};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Interaction(#[from] InteractionError),

    #[error("failed to write screenshot: {0}")]
    Io(#[from] std::io::Error),
}

impl ScenarioError {
    /// Message for reports; resolution failures list every attempt.
    pub fn report_message(&self) -> String {
        match self {
            ScenarioError::Resolution(failure) => failure.diagnostics(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScenarioSuccess {
    pub screenshot: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub passed: bool,
    pub duration: Duration,
    pub message: Option<String>,
    pub screenshot: Option<PathBuf>,
}

pub struct ScenarioContext {
    pub config: RailprobeConfig,
    pub resolver: Resolver,
}

impl ScenarioContext {
    pub fn new(config: RailprobeConfig) -> Self {
        let resolver = Resolver::new(config.resolve_options());
        Self { config, resolver }
    }

    /// Resolver with a different per-attempt window.
    pub fn resolver_with_attempt(&self, per_attempt: Duration) -> Resolver {
        Resolver::new(ResolveOptions {
            per_attempt_timeout: per_attempt,
            ..*self.resolver.options()
        })
    }

    /// Create the screenshot directory up front, before a browser is launched.
    pub async fn prepare(&self) -> Result<(), ScenarioError> {
        tokio::fs::create_dir_all(&self.config.screenshots.dir).await?;
        Ok(())
    }

    /// Navigate to a site path and clear the consent banner.
    pub async fn open(
        &self,
        driver: &mut dyn PageDriver,
        path: &str,
    ) -> Result<CookieOutcome, ScenarioError> {
        let url = self.config.site.url(path);
        driver.navigate(&url).await?;
        Ok(dismiss_cookie_banner(driver, &self.config.cookies).await)
    }

    /// Write `scr_<scenario>_success.png` to the screenshot directory.
    pub async fn capture_success(
        &self,
        driver: &mut dyn PageDriver,
        scenario: &str,
    ) -> Result<PathBuf, ScenarioError> {
        let bytes = driver.screenshot().await?;
        let dir = &self.config.screenshots.dir;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("scr_{}_success.png", scenario));
        tokio::fs::write(&path, bytes).await?;
        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError>;
}

pub fn builtin_scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(LandingAndCookies),
        Box::new(MainMenu),
        Box::new(SearchEngine),
        Box::new(GoToConnectionSearch),
        Box::new(TrainConnectionSearch),
    ]
}

/// Pick scenarios by name, keeping the requested order.
pub fn select_scenarios(names: &[String]) -> Result<Vec<Box<dyn Scenario>>, String> {
    if names.is_empty() {
        return Ok(builtin_scenarios());
    }
    let mut pool = builtin_scenarios();
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let idx = pool
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| format!("unknown scenario '{}'", name))?;
        selected.push(pool.remove(idx));
    }
    Ok(selected)
}

pub async fn run_scenarios(
    driver: &mut dyn PageDriver,
    ctx: &ScenarioContext,
    scenarios: &[Box<dyn Scenario>],
) -> Vec<ScenarioReport> {
    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        info!("Running scenario {}: {}", scenario.name(), scenario.description());
        let started = Instant::now();
        let report = match scenario.run(driver, ctx).await {
            Ok(success) => {
                info!("Scenario {} passed", scenario.name());
                ScenarioReport {
                    name: scenario.name(),
                    passed: true,
                    duration: started.elapsed(),
                    message: None,
                    screenshot: success.screenshot,
                }
            }
            Err(e) => {
                let message = e.report_message();
                error!("Scenario {} failed: {}", scenario.name(), message);
                ScenarioReport {
                    name: scenario.name(),
                    passed: false,
                    duration: started.elapsed(),
                    message: Some(message),
                    screenshot: None,
                }
            }
        };
        reports.push(report);
    }
    reports
}
