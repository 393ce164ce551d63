use super::{Scenario, ScenarioContext, ScenarioError, ScenarioSuccess};
use crate::backend::{LoadState, PageDriver};
use crate::interact::{fill_field, safe_click, settle_on};
use crate::locator::{AttrMatch, LocatorCandidate};
use crate::resolution::{Discovery, ResolvedElement, Target};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

const CONNECTION_PATH: &str = "/spojeni-a-jizdenka/";
const ORIGIN: &str = "Praha hl.n.";
const DESTINATION: &str = "Wien Hbf";

const RESULTS_WAIT: Duration = Duration::from_millis(20000);
const INDICATOR_WAIT: Duration = Duration::from_millis(3000);

/// The connection search page is reachable directly.
pub struct GoToConnectionSearch;

#[async_trait]
impl Scenario for GoToConnectionSearch {
    fn name(&self) -> &'static str {
        "go_to_connection_search"
    }

    fn description(&self) -> &'static str {
        "connection search page opens"
    }

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError> {
        ctx.open(driver, "/").await?;
        driver.navigate(&ctx.config.site.url(CONNECTION_PATH)).await?;
        driver
            .wait_for_load(LoadState::Load, ctx.config.timeouts.load())
            .await?;

        let url = driver.current_url().await?;
        if !url.contains("spojeni-a-jizdenka") {
            return Err(ScenarioError::Assertion(format!(
                "connection search page not reached, URL: {}",
                url
            )));
        }
        Ok(ScenarioSuccess::default())
    }
}

/// Station input for one side of the route.
///
/// `label` is the visible caption above the field; clicking it reveals the
/// input on layouts that render a placeholder widget first.
fn station_input(name: &str, attr_key: &str, label: &str, visible_index: usize) -> Target {
    let lower = label.to_lowercase();
    Target::mandatory(
        name,
        vec![
            LocatorCandidate::attr(
                Some("input"),
                "name",
                AttrMatch::Equals,
                format!("{}StationDisplayName", attr_key),
            ),
            LocatorCandidate::attr(Some("input"), "id", AttrMatch::Contains, attr_key),
            LocatorCandidate::attr(Some("input"), "class", AttrMatch::Contains, attr_key),
            LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, &lower),
            LocatorCandidate::attr(Some("input"), "aria-label", AttrMatch::Contains, &lower),
            LocatorCandidate::css(format!(".{} input", attr_key)),
            LocatorCandidate::nth(".route-search input", visible_index),
            LocatorCandidate::nth("form input", visible_index),
        ],
    )
    .with_discovery(Discovery::new(
        vec![LocatorCandidate::text(label)],
        vec![LocatorCandidate::nth("input", visible_index)],
    ))
}

fn search_button() -> Target {
    Target::optional(
        "search button",
        vec![
            LocatorCandidate::text_in("button", "Vyhledat"),
            LocatorCandidate::text_in("button", "Hledat"),
            LocatorCandidate::attr(Some("input"), "type", AttrMatch::Equals, "submit"),
            LocatorCandidate::attr(Some("button"), "type", AttrMatch::Equals, "submit"),
            LocatorCandidate::text_in("[role='button']", "Vyhledat"),
            LocatorCandidate::attr(Some("button"), "class", AttrMatch::Contains, "search"),
            LocatorCandidate::css(".search-button"),
        ],
    )
}

fn result_indicators() -> Target {
    Target::optional(
        "result indicator",
        vec![
            LocatorCandidate::text("Praha"),
            LocatorCandidate::text("Wien"),
            LocatorCandidate::css("table"),
            LocatorCandidate::css(".results"),
            LocatorCandidate::css(".connection"),
            LocatorCandidate::text("vlak"),
            LocatorCandidate::text("spojení"),
        ],
    )
}

/// Origin and destination are filled, the search runs and results appear.
pub struct TrainConnectionSearch;

impl TrainConnectionSearch {
    async fn fill_station(
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
        input: &ResolvedElement,
        station: &str,
    ) -> Result<(), ScenarioError> {
        fill_field(driver, input, station, ctx.config.timeouts.settle()).await?;
        info!("{} filled: {}", input.target, station);
        // Confirms the autocomplete suggestion.
        driver.press_key(None, "Tab").await?;
        Ok(())
    }
}

#[async_trait]
impl Scenario for TrainConnectionSearch {
    fn name(&self) -> &'static str {
        "train_connection"
    }

    fn description(&self) -> &'static str {
        "origin and destination search returns a results page"
    }

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError> {
        let start_url = ctx.config.site.url(CONNECTION_PATH);
        ctx.open(driver, CONNECTION_PATH).await?;
        driver
            .wait_for_load(LoadState::Load, ctx.config.timeouts.load())
            .await?;
        // The route form is rendered client-side after load.
        settle_on(
            driver,
            "document.querySelectorAll('input').length > 0",
            ctx.config.timeouts.load(),
        )
        .await;

        let settle = ctx.config.timeouts.settle();
        let mut targets = [
            station_input("departure station", "departure", "ODKUD", 0),
            station_input("arrival station", "arrival", "KAM", 1),
        ];
        for target in targets.iter_mut() {
            if let Some(discovery) = target.discovery.take() {
                target.discovery = Some(discovery.with_settle(settle));
            }
        }
        let [from_target, to_target] = targets;

        let from_input = ctx
            .resolver
            .sized_for(&from_target)
            .resolve_target(driver, &from_target)
            .await?
            .ok_or_else(|| ScenarioError::Assertion("departure field not found".into()))?;
        let to_input = ctx
            .resolver
            .sized_for(&to_target)
            .resolve_target(driver, &to_target)
            .await?
            .ok_or_else(|| ScenarioError::Assertion("arrival field not found".into()))?;

        Self::fill_station(driver, ctx, &from_input, ORIGIN).await?;
        Self::fill_station(driver, ctx, &to_input, DESTINATION).await?;

        let button = search_button();
        match ctx.resolver.sized_for(&button).resolve_target(driver, &button).await? {
            Some(button) => safe_click(driver, &button).await?,
            None => {
                info!("Search button not found, pressing Enter in the arrival field");
                driver.press_key(Some(&to_input.handle), "Enter").await?;
            }
        }

        let results_ready = format!(
            "window.location.href !== '{}' || !!document.querySelector('table, .results, .connection')",
            start_url.replace('\'', "\\'")
        );
        if !settle_on(driver, &results_ready, RESULTS_WAIT).await {
            info!("Timed out waiting for results, checking the page anyway");
        }

        let screenshot = ctx.capture_success(driver, self.name()).await?;

        let current_url = driver.current_url().await?;
        info!("Current URL: {}", current_url);
        let lower = current_url.to_lowercase();
        let url_signals = current_url != start_url
            || current_url.contains('?')
            || lower.contains("vysledky")
            || lower.contains("results");

        let indicators = result_indicators();
        let success = url_signals
            || ctx
                .resolver_with_attempt(INDICATOR_WAIT)
                .sized_for(&indicators)
                .find_visible(driver, &indicators.name, &indicators.candidates)
                .await
                .is_some();

        if !success {
            return Err(ScenarioError::Assertion(format!(
                "search did not produce results, URL: {}",
                current_url
            )));
        }
        Ok(ScenarioSuccess {
            screenshot: Some(screenshot),
        })
    }
}
