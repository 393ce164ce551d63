use railprobe_core::backend::{DriverError, LoadState, PageDriver};
use railprobe_core::interact::{fill_field, safe_click};
use railprobe_core::locator::{AttrMatch, LocatorCandidate};
use railprobe_core::resolution::{FailureKind, ResolveOptions, Resolver};
use railprobe_h::HeadlessDriver;
use serial_test::serial;
use std::time::Duration;

const PAGE: &str = "data:text/html;charset=utf-8,<html><body>\
<header><nav><a id='first' href='%23a'>Spojení</a></nav></header>\
<div id='hidden' style='display:none'>Skryté</div>\
<input placeholder='Odkud jedete'>\
<input id='to' name='arrival'>\
<button onclick=\"document.title='clicked'\">Vyhledat spojení</button>\
</body></html>";

fn resolver() -> Resolver {
    Resolver::new(ResolveOptions {
        per_attempt_timeout: Duration::from_millis(500),
        overall_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(50),
    })
}

async fn launched() -> Option<HeadlessDriver> {
    let mut driver = HeadlessDriver::new();
    match driver.launch().await {
        Ok(()) => Some(driver),
        Err(e) => {
            eprintln!("Skipping test: Headless browser not available: {}", e);
            None
        }
    }
}

#[tokio::test]
#[serial]
async fn test_resolves_each_locator_kind() {
    let Some(mut driver) = launched().await else {
        return;
    };
    driver.navigate(PAGE).await.expect("navigate");
    driver
        .wait_for_load(LoadState::Load, Duration::from_secs(5))
        .await
        .expect("load");

    let resolver = resolver();
    let candidates = [
        LocatorCandidate::css("header"),
        LocatorCandidate::text_in("button", "vyhledat"),
        LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, "Odkud"),
        LocatorCandidate::nth("input", 1),
    ];
    for candidate in candidates {
        let resolved = resolver
            .resolve(&mut driver, "probe", std::slice::from_ref(&candidate), None)
            .await
            .unwrap_or_else(|f| panic!("{}", f.diagnostics()));
        assert_eq!(resolved.candidate, candidate);
    }

    let hidden = resolver
        .resolve(&mut driver, "hidden", &[LocatorCandidate::css("#hidden")], None)
        .await
        .unwrap_err();
    assert_eq!(hidden.kind, FailureKind::NotVisible);

    driver.close().await.expect("close");
}

#[tokio::test]
#[serial]
async fn test_click_fill_and_stale_handles() {
    let Some(mut driver) = launched().await else {
        return;
    };
    driver.navigate(PAGE).await.expect("navigate");

    let resolver = resolver();
    let input = resolver
        .resolve(&mut driver, "arrival", &[LocatorCandidate::css("#to")], None)
        .await
        .expect("input");
    fill_field(&mut driver, &input, "Wien Hbf", Duration::from_millis(500))
        .await
        .expect("fill");
    assert_eq!(
        driver.input_value(&input.handle).await.expect("value"),
        "Wien Hbf"
    );
    assert_eq!(
        driver.attribute(&input.handle, "name").await.expect("attr"),
        Some("arrival".to_string())
    );

    let button = resolver
        .resolve(&mut driver, "button", &[LocatorCandidate::text_in("button", "Vyhledat")], None)
        .await
        .expect("button");
    safe_click(&mut driver, &button).await.expect("click");
    driver
        .wait_for_function("document.title === 'clicked'", Duration::from_secs(2))
        .await
        .expect("click handler ran");

    // A fresh document invalidates every handle from the previous one.
    driver.navigate(PAGE).await.expect("reload");
    let err = driver.is_visible(&input.handle).await.unwrap_err();
    assert!(matches!(err, DriverError::ElementStale { .. }));

    driver.close().await.expect("close");
}
