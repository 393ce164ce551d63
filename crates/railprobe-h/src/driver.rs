use crate::cdp::CdpClient;
use crate::script::{
    call_expression, query_expression, CallReply, QueryReply, RUNTIME_JS, RUNTIME_LOADED_JS,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use railprobe_core::backend::{
    BoundingBox, DriverError, ElementHandle, LoadState, NavigationResult, PageDriver,
};
use railprobe_core::locator::LocatorCandidate;
use railprobe_core::wait::poll_until;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Upper bound for a single evaluation; a blocked JS thread must not hang us.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resource count must hold still this long to count as network idle.
const NETWORK_QUIET: Duration = Duration::from_millis(500);

fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Page driver over headless (or headed) Chromium via CDP.
pub struct HeadlessDriver {
    client: Option<CdpClient>,
    visible: bool,
    window: (u32, u32),
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self {
            client: None,
            visible: false,
            window: (1200, 800),
        }
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            visible,
            ..Self::new()
        }
    }

    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = (width, height);
        self
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    fn page(&self) -> Result<&Page, DriverError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(DriverError::NotReady)
    }
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, expression: &str) -> Result<T, DriverError> {
    let mut last_error = None;
    for attempt in 0..MAX_CONTEXT_RETRIES {
        match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await {
            Err(_) => {
                return Err(DriverError::timeout(
                    "evaluation (possibly blocked by a dialog)",
                ))
            }
            Ok(Err(e)) => {
                let err_str = e.to_string();
                if !is_context_error(&err_str) {
                    return Err(DriverError::ScriptError(err_str));
                }
                debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Ok(Ok(result)) => {
                return result
                    .into_value::<T>()
                    .map_err(|e| DriverError::Serialization(e.to_string()))
            }
        }
    }
    Err(DriverError::ScriptError(last_error.unwrap_or_else(|| {
        "evaluation failed after retries".to_string()
    })))
}

async fn ensure_runtime(page: &Page) -> Result<(), DriverError> {
    let loaded: bool = evaluate(page, RUNTIME_LOADED_JS).await?;
    if !loaded {
        let injected: bool = evaluate(page, RUNTIME_JS).await.map_err(|e| match e {
            DriverError::ScriptError(msg) => {
                DriverError::ScriptError(format!("runtime injection failed: {}", msg))
            }
            other => other,
        })?;
        if !injected {
            return Err(DriverError::ScriptError("runtime injection returned false".into()));
        }
    }
    Ok(())
}

async fn call(
    page: &Page,
    element: &ElementHandle,
    op: &str,
    arg: Value,
) -> Result<Value, DriverError> {
    ensure_runtime(page).await?;
    let expression = call_expression(element.id(), element.document(), op, &arg)?;
    match evaluate::<CallReply>(page, &expression).await? {
        CallReply::Ok { value } => Ok(value),
        CallReply::Stale => Err(DriverError::ElementStale { id: element.id() }),
        CallReply::Error { message } => Err(DriverError::ScriptError(message)),
    }
}

async fn dispatch_mouse(
    page: &Page,
    kind: DispatchMouseEventType,
    x: f64,
    y: f64,
) -> Result<(), DriverError> {
    let params = DispatchMouseEventParams::builder()
        .r#type(kind)
        .x(x)
        .y(y)
        .button(MouseButton::Left)
        .click_count(1)
        .build()
        .map_err(|e| DriverError::Other(format!("Failed to build mouse event: {:?}", e)))?;
    page.execute(params)
        .await
        .map_err(|e| DriverError::Other(format!("mouse event failed: {}", e)))?;
    Ok(())
}

async fn dispatch_key(
    page: &Page,
    kind: DispatchKeyEventType,
    key: &str,
) -> Result<(), DriverError> {
    let down = matches!(kind, DispatchKeyEventType::KeyDown);
    let mut builder = DispatchKeyEventParams::builder().r#type(kind).key(key).code(key);
    match key {
        // Only a key event carrying text submits a form.
        "Enter" => {
            builder = builder.windows_virtual_key_code(13);
            if down {
                builder = builder.text("\r");
            }
        }
        "Tab" => builder = builder.windows_virtual_key_code(9),
        "Escape" => builder = builder.windows_virtual_key_code(27),
        _ => {}
    }
    let params = builder
        .build()
        .map_err(|e| DriverError::Other(format!("Failed to build key event: {:?}", e)))?;
    page.execute(params)
        .await
        .map_err(|e| DriverError::Other(format!("key event failed: {}", e)))?;
    Ok(())
}

async fn navigation_result(page: &Page) -> Result<NavigationResult, DriverError> {
    let title = page
        .get_title()
        .await
        .unwrap_or_default()
        .unwrap_or_default();
    let url = page
        .url()
        .await
        .map_err(|e| DriverError::Navigation(e.to_string()))?
        .unwrap_or_default();
    Ok(NavigationResult { url, title })
}

#[async_trait]
impl PageDriver for HeadlessDriver {
    async fn launch(&mut self) -> Result<(), DriverError> {
        info!("Launching headless driver (Chromium)...");
        let client = CdpClient::launch(self.visible, self.window)
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| DriverError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let page = self.page()?;
        info!("Navigating to: {}", url);
        tokio::time::timeout(NAVIGATION_TIMEOUT, page.goto(url))
            .await
            .map_err(|_| DriverError::timeout(format!("navigate to {}", url)))?
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        navigation_result(page).await
    }

    async fn go_back(&mut self) -> Result<NavigationResult, DriverError> {
        let page = self.page()?;
        let before = page.url().await.ok().flatten().unwrap_or_default();
        page.evaluate("history.back();")
            .await
            .map_err(|e| DriverError::Navigation(format!("go_back failed: {}", e)))?;

        let page_ref = page.clone();
        let changed = poll_until(Duration::from_secs(5), POLL_INTERVAL, || {
            let page = page_ref.clone();
            let before = before.clone();
            async move {
                let url = page.url().await.ok().flatten()?;
                (url != before).then_some(())
            }
        })
        .await;
        if changed.is_err() {
            debug!("URL unchanged after history.back()");
        }
        navigation_result(page).await
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        let page = self.page()?;
        Ok(page
            .url()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?
            .unwrap_or_default())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        let page = self.page()?;
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(width as i64)
            .height(height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| DriverError::Other(format!("Failed to build viewport: {:?}", e)))?;
        page.execute(params)
            .await
            .map_err(|e| DriverError::Other(format!("set_viewport failed: {}", e)))?;
        Ok(())
    }

    async fn wait_for_load(
        &mut self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let page = self.page()?.clone();
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<(u64, Instant)> = None;

        loop {
            let complete: bool = evaluate(&page, "document.readyState === 'complete'")
                .await
                .unwrap_or(false);
            if complete {
                match state {
                    LoadState::Load => return Ok(()),
                    LoadState::NetworkIdle => {
                        let count: u64 = evaluate(
                            &page,
                            "performance.getEntriesByType('resource').length",
                        )
                        .await?;
                        match last_count {
                            Some((prev, since)) if prev == count => {
                                if since.elapsed() >= NETWORK_QUIET {
                                    return Ok(());
                                }
                            }
                            _ => last_count = Some((count, Instant::now())),
                        }
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::timeout(format!("wait for {:?}", state)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_function(
        &mut self,
        predicate: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let page = self.page()?.clone();
        let expression = format!("!!({})", predicate);
        poll_until(timeout, POLL_INTERVAL, || {
            let page = page.clone();
            let expression = expression.clone();
            async move {
                evaluate::<bool>(&page, &expression)
                    .await
                    .ok()
                    .filter(|ok| *ok)
            }
        })
        .await
        .map(|_| ())
        .map_err(|_| DriverError::timeout(format!("condition `{}`", predicate)))
    }

    async fn query(
        &mut self,
        candidate: &LocatorCandidate,
    ) -> Result<Option<ElementHandle>, DriverError> {
        let page = self.page()?;
        ensure_runtime(page).await?;
        let expression = query_expression(candidate)?;
        match evaluate::<QueryReply>(page, &expression).await? {
            QueryReply::Found { id, doc } => Ok(Some(ElementHandle::new(id, doc))),
            QueryReply::Missing => Ok(None),
            QueryReply::Error { message } => Err(DriverError::SelectorInvalid {
                selector: format!("{} ({})", candidate, message),
            }),
        }
    }

    async fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        let value = call(self.page()?, element, "visible", Value::Null).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        call(self.page()?, element, "scroll", Value::Null).await?;
        Ok(())
    }

    async fn bounding_box(
        &mut self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, DriverError> {
        let value = call(self.page()?, element, "box", Value::Null).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn click_at(&mut self, x: f64, y: f64) -> Result<(), DriverError> {
        let page = self.page()?;
        dispatch_mouse(page, DispatchMouseEventType::MouseMoved, x, y).await?;
        dispatch_mouse(page, DispatchMouseEventType::MousePressed, x, y).await?;
        dispatch_mouse(page, DispatchMouseEventType::MouseReleased, x, y).await
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        call(self.page()?, element, "click", Value::Null).await?;
        Ok(())
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        call(self.page()?, element, "fill", json!(text)).await?;
        Ok(())
    }

    async fn input_value(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        let value = call(self.page()?, element, "value", Value::Null).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let value = call(self.page()?, element, "attr", json!(name)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn press_key(
        &mut self,
        element: Option<&ElementHandle>,
        key: &str,
    ) -> Result<(), DriverError> {
        let page = self.page()?;
        if let Some(element) = element {
            call(page, element, "focus", Value::Null).await?;
        }
        dispatch_key(page, DispatchKeyEventType::KeyDown, key).await?;
        dispatch_key(page, DispatchKeyEventType::KeyUp, key).await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        let page = self.page()?;
        page.screenshot(chromiumoxide::page::ScreenshotParams::builder().build())
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }
}
