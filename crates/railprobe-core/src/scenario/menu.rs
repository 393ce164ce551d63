use super::{Scenario, ScenarioContext, ScenarioError, ScenarioSuccess};
use crate::backend::{LoadState, PageDriver};
use crate::interact::{safe_click, wait_for_url};
use crate::locator::LocatorCandidate;
use crate::resolution::Target;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

const SUBNAV: &str = "body > div.subheader > div > div.subheader__content-wrapper > div > ul";

const MENU_ITEMS: &[(&str, &str)] = &[
    ("Spojení a jízdenka", "li:nth-child(1)"),
    ("Vlak", "li:nth-child(2)"),
    ("Stanice", "li:nth-child(3)"),
    ("Moje cestování", "li.last.subnav__item"),
];

const ITEM_WAIT: Duration = Duration::from_millis(4000);
const NAV_WAIT: Duration = Duration::from_millis(5000);

/// URL fragment a menu item is expected to lead to.
pub fn menu_slug(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .replace('á', "a")
        .replace('í', "i")
}

/// Each main sub-navigation entry is visible and leads to its page.
pub struct MainMenu;

#[async_trait]
impl Scenario for MainMenu {
    fn name(&self) -> &'static str {
        "main_menu"
    }

    fn description(&self) -> &'static str {
        "main navigation items are visible and navigate to their sections"
    }

    async fn run(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &ScenarioContext,
    ) -> Result<ScenarioSuccess, ScenarioError> {
        ctx.open(driver, "/").await?;
        let viewport = &ctx.config.viewport;
        driver.set_viewport(viewport.width, viewport.height).await?;

        let resolver = ctx.resolver_with_attempt(ITEM_WAIT);
        for (item_name, item_selector) in MENU_ITEMS {
            let item_css = format!("{} > {}", SUBNAV, item_selector);

            // Handles die with each navigation, so both are resolved per item.
            let item = Target::optional(*item_name, vec![LocatorCandidate::css(&item_css)]);
            if resolver.resolve_target(driver, &item).await?.is_none() {
                continue;
            }
            let link = Target::optional(
                format!("{} link", item_name),
                vec![LocatorCandidate::css(format!("{} a", item_css))],
            );
            let Some(link) = resolver.resolve_target(driver, &link).await? else {
                continue;
            };

            let Some(href) = driver.attribute(&link.handle, "href").await? else {
                warn!("Menu item '{}' has no href, skipping navigation", item_name);
                continue;
            };

            let before = driver.current_url().await?;
            safe_click(driver, &link).await?;
            wait_for_url(driver, NAV_WAIT, |url| url != before).await;
            driver.wait_for_load(LoadState::Load, NAV_WAIT).await?;

            let url = driver.current_url().await?;
            let expected = menu_slug(item_name);
            if !(url.to_lowercase().contains(&expected) || url.contains(&href.replace('/', ""))) {
                return Err(ScenarioError::Assertion(format!(
                    "menu item '{}' led to {} (expected '{}' or '{}')",
                    item_name, url, expected, href
                )));
            }
            info!("Menu item '{}' opened {}", item_name, url);

            driver.go_back().await?;
            driver.wait_for_load(LoadState::Load, NAV_WAIT).await?;
        }
        Ok(ScenarioSuccess::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_matches_section_paths() {
        assert_eq!(menu_slug("Spojení a jízdenka"), "spojeni-a-jizdenka");
        assert_eq!(menu_slug("Moje cestování"), "moje-cestovani");
        assert_eq!(menu_slug("Vlak"), "vlak");
    }
}
