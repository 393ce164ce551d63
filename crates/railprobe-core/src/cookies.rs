//! Cookie-consent banner dismissal.

use crate::backend::PageDriver;
use crate::config::schema::CookieConfig;
use crate::interact::{safe_click, settle_on};
use crate::locator::LocatorCandidate;
use crate::resolution::{ResolveOptions, Resolver};
use std::time::Duration;
use tracing::{info, warn};

/// Fires once the consent modal has released the page.
const MODAL_CLOSED: &str = "!document.querySelector('body.modal-open')";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieOutcome {
    Dismissed(LocatorCandidate),
    NotPresent,
}

/// Click the first visible consent button, if any.
///
/// A missing banner is not an error, so calling this on a page without one
/// (or twice in a row) is a no-op.
pub async fn dismiss_cookie_banner<D: PageDriver + ?Sized>(
    driver: &mut D,
    config: &CookieConfig,
) -> CookieOutcome {
    let per_attempt = Duration::from_millis(config.per_attempt_ms);
    let resolver = Resolver::new(ResolveOptions {
        per_attempt_timeout: per_attempt,
        overall_timeout: per_attempt * config.candidates.len().max(1) as u32,
        ..ResolveOptions::default()
    });

    let Some(button) = resolver
        .find_visible(driver, "cookie banner", &config.candidates)
        .await
    else {
        info!("No cookie banner found");
        return CookieOutcome::NotPresent;
    };

    if let Err(e) = safe_click(driver, &button).await {
        warn!("Cookie banner button matched but click failed: {}", e);
        return CookieOutcome::NotPresent;
    }

    settle_on(
        driver,
        MODAL_CLOSED,
        Duration::from_millis(config.close_timeout_ms),
    )
    .await;
    info!("Cookie banner dismissed via {}", button.candidate);
    CookieOutcome::Dismissed(button.candidate)
}
