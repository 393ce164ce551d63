use super::{Scenario, ScenarioContext, ScenarioError, ScenarioSuccess};
use crate::backend::{LoadState, PageDriver};
use crate::interact::fill_field;
use crate::locator::{AttrMatch, LocatorCandidate};
use crate::resolution::{Discovery, Target};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

const QUERY: &str = "vlakové spojení";

fn search_input() -> Target {
    Target::optional(
        "search input",
        vec![
            LocatorCandidate::attr(Some("input"), "type", AttrMatch::Equals, "search"),
            LocatorCandidate::attr(Some("input"), "name", AttrMatch::Equals, "search"),
            LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, "Hledat"),
            LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, "vyhledat"),
            LocatorCandidate::css(".search input"),
            LocatorCandidate::css("form input[type='text']"),
        ],
    )
    .with_discovery(Discovery::new(
        vec![
            LocatorCandidate::attr(Some("button"), "aria-label", AttrMatch::Contains, "hled"),
            LocatorCandidate::css(".search-trigger"),
            LocatorCandidate::css(".search-icon"),
            LocatorCandidate::text_in("button", "Hledat"),
        ],
        vec![
            LocatorCandidate::attr(Some("input"), "type", AttrMatch::Equals, "search"),
            LocatorCandidate::attr(Some("input"), "name", AttrMatch::Equals, "search"),
        ],
    ))
}

fn connection_form() -> Target {
    Target::mandatory(
        "connection form",
        vec![
            LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, "ODKUD"),
            LocatorCandidate::attr(Some("input"), "name", AttrMatch::Contains, "from"),
        ],
    )
}

/// Site search accepts a query; without one the connection form must exist.
pub struct SearchEngine;

#[async_trait]
impl Scenario for SearchEngine {
    fn name(&self) -> &'static str {
        "search_engine"
    }

    fn description(&self) -> &'static str {
        "site search field accepts a query, or the connection form is present"
    }

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError> {
        ctx.open(driver, "/").await?;

        let mut target = search_input();
        if let Some(discovery) = target.discovery.take() {
            target.discovery = Some(discovery.with_settle(ctx.config.timeouts.settle()));
        }

        let found = ctx.resolver.sized_for(&target).resolve_target(driver, &target).await?;
        let Some(input) = found else {
            info!("No general site search, checking the connection form instead");
            ctx.resolver_with_attempt(Duration::from_millis(4000))
                .resolve_target(driver, &connection_form())
                .await?;
            return Ok(ScenarioSuccess::default());
        };

        fill_field(driver, &input, QUERY, ctx.config.timeouts.settle()).await?;
        driver.press_key(Some(&input.handle), "Enter").await?;
        driver
            .wait_for_load(LoadState::NetworkIdle, ctx.config.timeouts.load())
            .await?;

        let screenshot = ctx.capture_success(driver, self.name()).await?;
        Ok(ScenarioSuccess {
            screenshot: Some(screenshot),
        })
    }
}
