mod common;

use common::{Click, FakeElement, FakePage};
use railprobe_core::backend::{BoundingBox, DriverError};
use railprobe_core::cookies::{dismiss_cookie_banner, CookieOutcome};
use railprobe_core::config::schema::CookieConfig;
use railprobe_core::interact::{fill_field, safe_click, wait_for_url};
use railprobe_core::locator::LocatorCandidate;
use railprobe_core::resolution::{ResolveOptions, ResolvedElement, Resolver};
use std::time::Duration;
use tokio::time::Instant;

async fn resolve(page: &mut FakePage, candidate: LocatorCandidate) -> ResolvedElement {
    Resolver::new(ResolveOptions::default())
        .resolve(page, "element", &[candidate], None)
        .await
        .expect("element should resolve")
}

#[tokio::test(start_paused = true)]
async fn test_safe_click_uses_box_center() {
    let button = LocatorCandidate::css("#go");
    let mut el = FakeElement::new(1).matching(button.clone());
    el.bbox = Some(BoundingBox {
        x: 100.0,
        y: 50.0,
        width: 40.0,
        height: 20.0,
    });
    let mut page = FakePage::new(vec![el]);

    let resolved = resolve(&mut page, button).await;
    safe_click(&mut page, &resolved).await.unwrap();

    assert_eq!(page.clicks, vec![Click::At(120.0, 60.0)]);
}

#[tokio::test(start_paused = true)]
async fn test_safe_click_without_box_clicks_directly() {
    let link = LocatorCandidate::css("a.detached");
    let mut page = FakePage::new(vec![FakeElement::new(4).matching(link.clone()).without_box()]);

    let resolved = resolve(&mut page, link).await;
    safe_click(&mut page, &resolved).await.unwrap();

    assert_eq!(page.clicks, vec![Click::Direct(4)]);
}

#[tokio::test(start_paused = true)]
async fn test_safe_click_falls_back_when_coordinate_click_fails() {
    let button = LocatorCandidate::css("#go");
    let mut page = FakePage::new(vec![FakeElement::new(2).matching(button.clone())]);
    page.click_at_fails = true;

    let resolved = resolve(&mut page, button).await;
    safe_click(&mut page, &resolved).await.unwrap();

    assert_eq!(page.clicks, vec![Click::Direct(2)]);
}

#[tokio::test(start_paused = true)]
async fn test_safe_click_surfaces_direct_click_error() {
    let button = LocatorCandidate::css("#covered");
    let mut page = FakePage::new(vec![FakeElement::new(3).matching(button.clone()).without_box()]);
    page.direct_click_fails = true;

    let resolved = resolve(&mut page, button).await;
    let err = safe_click(&mut page, &resolved).await.unwrap_err();

    assert_eq!(err.target, "element");
    assert!(matches!(err.source, DriverError::ElementNotInteractable { id: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_fill_field_sets_value() {
    let field = LocatorCandidate::css("input[name='departureStationDisplayName']");
    let mut page = FakePage::new(vec![FakeElement::new(9).matching(field.clone())]);
    page.values.insert(9, "stale text".into());

    let resolved = resolve(&mut page, field).await;
    fill_field(&mut page, &resolved, "Praha hl.n.", Duration::from_millis(500))
        .await
        .unwrap();

    assert_eq!(page.values.get(&9).map(String::as_str), Some("Praha hl.n."));
    assert_eq!(page.clicks.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fill_field_with_zero_settle_returns_at_once() {
    let field = LocatorCandidate::css("input[name='arrivalStationDisplayName']");
    let mut page = FakePage::new(vec![FakeElement::new(5).matching(field.clone())]);
    let resolved = resolve(&mut page, field).await;

    let start = Instant::now();
    fill_field(&mut page, &resolved, "Wien Hbf", Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(page.values.get(&5).map(String::as_str), Some("Wien Hbf"));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_url_sees_change() {
    let mut page = FakePage::new(vec![]);
    page.url = "https://www.cd.cz/vlak/".into();

    let url = wait_for_url(&mut page, Duration::from_secs(1), |u| u.contains("vlak")).await;
    assert_eq!(url.as_deref(), Some("https://www.cd.cz/vlak/"));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_url_bounded_when_driver_hangs() {
    let mut page = FakePage::new(vec![]);
    page.url_delay = Duration::from_secs(30);

    let start = Instant::now();
    let url = wait_for_url(&mut page, Duration::from_secs(2), |_| true).await;

    assert!(url.is_none());
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_url_gives_up_at_timeout() {
    let mut page = FakePage::new(vec![]);
    page.url = "https://www.cd.cz/".into();

    let start = Instant::now();
    let url = wait_for_url(&mut page, Duration::from_millis(750), |u| u.contains("vlak")).await;

    assert!(url.is_none());
    assert_eq!(start.elapsed(), Duration::from_millis(750));
}

fn cookie_config() -> CookieConfig {
    CookieConfig {
        per_attempt_ms: 300,
        ..CookieConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_cookie_banner_first_visible_button_clicked() {
    let config = cookie_config();
    let mut page = FakePage::new(vec![
        FakeElement::new(1)
            .matching(LocatorCandidate::text_in("button", "zde"))
            .hidden(),
        FakeElement::new(2).matching(LocatorCandidate::text_in("button", "Odmítnout")),
        FakeElement::new(3).matching(LocatorCandidate::text_in("button", "Odmítnout vše")),
    ]);

    let outcome = dismiss_cookie_banner(&mut page, &config).await;

    assert_eq!(
        outcome,
        CookieOutcome::Dismissed(LocatorCandidate::text_in("button", "Odmítnout"))
    );
    assert_eq!(page.clicks.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cookie_banner_absent_is_noop() {
    let config = cookie_config();
    let mut page = FakePage::new(vec![]);

    assert_eq!(
        dismiss_cookie_banner(&mut page, &config).await,
        CookieOutcome::NotPresent
    );
    assert_eq!(
        dismiss_cookie_banner(&mut page, &config).await,
        CookieOutcome::NotPresent
    );
    assert!(page.clicks.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cookie_banner_ignores_slow_modal_close() {
    let config = cookie_config();
    let mut page = FakePage::new(vec![
        FakeElement::new(1).matching(LocatorCandidate::text_in("a", "zde"))
    ]);
    page.conditions_hold = false;

    let outcome = dismiss_cookie_banner(&mut page, &config).await;

    assert_eq!(
        outcome,
        CookieOutcome::Dismissed(LocatorCandidate::text_in("a", "zde"))
    );
}
