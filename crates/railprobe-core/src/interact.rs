//! Interactions with resolved elements.

use crate::backend::{DriverError, ElementHandle, PageDriver};
use crate::resolution::ResolvedElement;
use crate::wait::Poller;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Click or fill failed on an element that was already resolved.
#[derive(Debug, Clone, Error)]
#[error("interaction with '{target}' failed: {source}")]
pub struct InteractionError {
    pub target: String,
    #[source]
    pub source: DriverError,
}

impl InteractionError {
    fn new(target: &str, source: DriverError) -> Self {
        Self {
            target: target.to_string(),
            source,
        }
    }
}

const FILL_POLL: Duration = Duration::from_millis(50);
const URL_POLL: Duration = Duration::from_millis(100);

/// Scroll into view and click the element's centre by coordinates.
///
/// Overlays that swallow direct clicks usually let a coordinate click
/// through. Falls back to a direct click once when the box is missing or
/// empty, or when the coordinate click itself errors.
pub async fn safe_click<D: PageDriver + ?Sized>(
    driver: &mut D,
    element: &ResolvedElement,
) -> Result<(), InteractionError> {
    click_handle(driver, &element.handle, &element.target).await
}

pub(crate) async fn click_handle<D: PageDriver + ?Sized>(
    driver: &mut D,
    handle: &ElementHandle,
    target: &str,
) -> Result<(), InteractionError> {
    driver
        .scroll_into_view(handle)
        .await
        .map_err(|e| InteractionError::new(target, e))?;

    match driver.bounding_box(handle).await {
        Ok(Some(bbox)) if bbox.has_area() => {
            let (x, y) = bbox.center();
            match driver.click_at(x, y).await {
                Ok(()) => return Ok(()),
                Err(e) => debug!("Coordinate click on '{}' failed ({}), clicking directly", target, e),
            }
        }
        Ok(_) => debug!("'{}' has no usable bounding box, clicking directly", target),
        Err(e) => debug!("Bounding box for '{}' failed ({}), clicking directly", target, e),
    }

    driver
        .click(handle)
        .await
        .map_err(|e| InteractionError::new(target, e))
}

/// Click, clear and fill a field, then wait until it reports the value.
///
/// Widgets such as station autocompletes may rewrite the value; a mismatch
/// after `settle` is logged rather than treated as an error.
pub async fn fill_field<D: PageDriver + ?Sized>(
    driver: &mut D,
    element: &ResolvedElement,
    text: &str,
    settle: Duration,
) -> Result<(), InteractionError> {
    safe_click(driver, element).await?;
    let handle = &element.handle;
    driver
        .fill(handle, "")
        .await
        .map_err(|e| InteractionError::new(&element.target, e))?;
    driver
        .fill(handle, text)
        .await
        .map_err(|e| InteractionError::new(&element.target, e))?;

    let poller = Poller::new(settle, FILL_POLL);
    loop {
        match poller.check(driver.input_value(handle)).await {
            Ok(Ok(value)) if value == text => return Ok(()),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(InteractionError::new(&element.target, e)),
            Err(_) => break,
        }
        if poller.next_round().await.is_err() {
            break;
        }
    }
    debug!("'{}' did not echo the filled value within {:?}", element.target, settle);
    Ok(())
}

/// Wait for a JavaScript condition without failing on timeout.
pub async fn settle_on<D: PageDriver + ?Sized>(
    driver: &mut D,
    predicate: &str,
    timeout: Duration,
) -> bool {
    match driver.wait_for_function(predicate, timeout).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Condition `{}` not met: {}", predicate, e);
            false
        }
    }
}

/// Wait until the current URL satisfies `pred`. Each URL read is bounded by
/// the same deadline, so a hung driver cannot hold the caller past `timeout`.
pub async fn wait_for_url<D, F>(driver: &mut D, timeout: Duration, pred: F) -> Option<String>
where
    D: PageDriver + ?Sized,
    F: Fn(&str) -> bool,
{
    let poller = Poller::new(timeout, URL_POLL);
    loop {
        if let Ok(Ok(url)) = poller.check(driver.current_url()).await {
            if pred(&url) {
                return Some(url);
            }
        }
        poller.next_round().await.ok()?;
    }
}
