//! In-memory page used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use railprobe_core::backend::{
    BoundingBox, DriverError, ElementHandle, LoadState, NavigationResult, PageDriver,
};
use railprobe_core::locator::LocatorCandidate;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Click {
    At(f64, f64),
    Direct(u64),
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub id: u64,
    pub matches: Vec<LocatorCandidate>,
    pub appears_after: Duration,
    pub visible: bool,
    pub revealed_by: Option<u64>,
    pub bbox: Option<BoundingBox>,
    pub attrs: HashMap<String, String>,
    pub navigates_to: Option<String>,
}

impl FakeElement {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            matches: Vec::new(),
            appears_after: Duration::ZERO,
            visible: true,
            revealed_by: None,
            bbox: Some(BoundingBox {
                x: 10.0 * id as f64,
                y: 20.0,
                width: 8.0,
                height: 4.0,
            }),
            attrs: HashMap::new(),
            navigates_to: None,
        }
    }

    pub fn matching(mut self, candidate: LocatorCandidate) -> Self {
        self.matches.push(candidate);
        self
    }

    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn revealed_by(mut self, trigger: u64) -> Self {
        self.revealed_by = Some(trigger);
        self
    }

    pub fn without_box(mut self) -> Self {
        self.bbox = None;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.navigates_to = Some(url.to_string());
        self
    }
}

#[derive(Debug)]
pub struct FakePage {
    pub elements: Vec<FakeElement>,
    pub url: String,
    pub generation: u64,
    pub loaded_at: Instant,
    pub clicks: Vec<Click>,
    pub values: HashMap<u64, String>,
    pub keys: Vec<String>,
    pub history: Vec<String>,
    pub revealed: HashSet<u64>,
    pub query_delay: Duration,
    pub url_delay: Duration,
    pub invalid: Vec<LocatorCandidate>,
    pub click_at_fails: bool,
    pub direct_click_fails: bool,
    pub conditions_hold: bool,
    pub viewport: Option<(u32, u32)>,
    pub queries: usize,
}

impl FakePage {
    pub fn new(elements: Vec<FakeElement>) -> Self {
        Self {
            elements,
            url: "about:blank".to_string(),
            generation: 0,
            loaded_at: Instant::now(),
            clicks: Vec::new(),
            values: HashMap::new(),
            keys: Vec::new(),
            history: Vec::new(),
            revealed: HashSet::new(),
            query_delay: Duration::ZERO,
            url_delay: Duration::ZERO,
            invalid: Vec::new(),
            click_at_fails: false,
            direct_click_fails: false,
            conditions_hold: true,
            viewport: None,
            queries: 0,
        }
    }

    fn present(&self, el: &FakeElement) -> bool {
        self.loaded_at.elapsed() >= el.appears_after
            && el.revealed_by.map_or(true, |t| self.revealed.contains(&t))
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<&FakeElement, DriverError> {
        if handle.document() != self.generation.to_string() {
            return Err(DriverError::ElementStale { id: handle.id() });
        }
        self.elements
            .iter()
            .find(|e| e.id == handle.id() && self.present(e))
            .ok_or(DriverError::ElementStale { id: handle.id() })
    }

    fn activate(&mut self, id: u64) {
        self.revealed.insert(id);
        let target = self
            .elements
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.navigates_to.clone());
        if let Some(url) = target {
            let previous = std::mem::replace(&mut self.url, url);
            self.history.push(previous);
            self.generation += 1;
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn launch(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let previous = std::mem::replace(&mut self.url, url.to_string());
        self.history.push(previous);
        self.generation += 1;
        self.loaded_at = Instant::now();
        self.revealed.clear();
        Ok(NavigationResult {
            url: url.to_string(),
            title: "fake".to_string(),
        })
    }

    async fn go_back(&mut self) -> Result<NavigationResult, DriverError> {
        let url = self
            .history
            .pop()
            .ok_or_else(|| DriverError::Navigation("no history".into()))?;
        self.url = url.clone();
        self.generation += 1;
        Ok(NavigationResult {
            url,
            title: "fake".to_string(),
        })
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        if !self.url_delay.is_zero() {
            tokio::time::sleep(self.url_delay).await;
        }
        Ok(self.url.clone())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        self.viewport = Some((width, height));
        Ok(())
    }

    async fn wait_for_load(
        &mut self,
        _state: LoadState,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for_function(
        &mut self,
        _predicate: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if self.conditions_hold {
            Ok(())
        } else {
            tokio::time::sleep(timeout).await;
            Err(DriverError::timeout("wait_for_function"))
        }
    }

    async fn query(
        &mut self,
        candidate: &LocatorCandidate,
    ) -> Result<Option<ElementHandle>, DriverError> {
        self.queries += 1;
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        if self.invalid.contains(candidate) {
            return Err(DriverError::SelectorInvalid {
                selector: candidate.to_string(),
            });
        }
        Ok(self
            .elements
            .iter()
            .find(|e| e.matches.contains(candidate) && self.present(e))
            .map(|e| ElementHandle::new(e.id, self.generation.to_string())))
    }

    async fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        Ok(self.lookup(element)?.visible)
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        self.lookup(element).map(|_| ())
    }

    async fn bounding_box(
        &mut self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, DriverError> {
        Ok(self.lookup(element)?.bbox)
    }

    async fn click_at(&mut self, x: f64, y: f64) -> Result<(), DriverError> {
        if self.click_at_fails {
            return Err(DriverError::Other("overlay intercepted pointer".into()));
        }
        self.clicks.push(Click::At(x, y));
        let hit = self
            .elements
            .iter()
            .filter(|e| self.present(e))
            .find(|e| {
                e.bbox.is_some_and(|b| {
                    x >= b.x && x <= b.x + b.width && y >= b.y && y <= b.y + b.height
                })
            })
            .map(|e| e.id);
        if let Some(id) = hit {
            self.activate(id);
        }
        Ok(())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        let id = self.lookup(element)?.id;
        if self.direct_click_fails {
            return Err(DriverError::ElementNotInteractable {
                id,
                reason: "covered".into(),
            });
        }
        self.clicks.push(Click::Direct(id));
        self.activate(id);
        Ok(())
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        let id = self.lookup(element)?.id;
        self.values.insert(id, text.to_string());
        Ok(())
    }

    async fn input_value(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        let id = self.lookup(element)?.id;
        Ok(self.values.get(&id).cloned().unwrap_or_default())
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        Ok(self.lookup(element)?.attrs.get(name).cloned())
    }

    async fn press_key(
        &mut self,
        element: Option<&ElementHandle>,
        key: &str,
    ) -> Result<(), DriverError> {
        if let Some(element) = element {
            self.lookup(element)?;
        }
        self.keys.push(key.to_string());
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }
}
