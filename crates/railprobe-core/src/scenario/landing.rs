use super::{Scenario, ScenarioContext, ScenarioError, ScenarioSuccess};
use crate::backend::{LoadState, PageDriver};
use crate::locator::LocatorCandidate;
use crate::resolution::Target;
use async_trait::async_trait;
use std::time::Duration;

/// Homepage loads, the consent banner goes away and the header shows.
pub struct LandingAndCookies;

#[async_trait]
impl Scenario for LandingAndCookies {
    fn name(&self) -> &'static str {
        "landing_and_cookies"
    }

    fn description(&self) -> &'static str {
        "homepage loads and the cookie banner can be dismissed"
    }

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError> {
        driver.navigate(&ctx.config.site.url("/")).await?;
        driver
            .wait_for_load(LoadState::Load, ctx.config.timeouts.load())
            .await?;
        crate::cookies::dismiss_cookie_banner(driver, &ctx.config.cookies).await;

        let header = Target::mandatory("page header", vec![LocatorCandidate::css("header")]);
        ctx.resolver_with_attempt(Duration::from_millis(4000))
            .resolve_target(driver, &header)
            .await?;
        Ok(ScenarioSuccess::default())
    }
}
