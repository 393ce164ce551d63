use crate::locator::LocatorCandidate;
use crate::resolution::ResolveOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailprobeConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub screenshots: ScreenshotConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl RailprobeConfig {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            per_attempt_timeout: Duration::from_millis(self.timeouts.per_attempt_ms),
            overall_timeout: Duration::from_millis(self.timeouts.overall_ms),
            poll_interval: Duration::from_millis(self.timeouts.poll_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl SiteConfig {
    /// Join a path onto the base URL without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn default_base_url() -> String {
    "https://www.cd.cz".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_per_attempt_ms")]
    pub per_attempt_ms: u64,
    #[serde(default = "default_overall_ms")]
    pub overall_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_load_ms")]
    pub load_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            per_attempt_ms: default_per_attempt_ms(),
            overall_ms: default_overall_ms(),
            settle_ms: default_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            load_ms: default_load_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn load(&self) -> Duration {
        Duration::from_millis(self.load_ms)
    }
}

fn default_per_attempt_ms() -> u64 {
    2000
}

fn default_overall_ms() -> u64 {
    15000
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_load_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    800
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default = "default_screenshot_dir")]
    pub dir: PathBuf,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            dir: default_screenshot_dir(),
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(
        default = "default_cookie_candidates",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub candidates: Vec<LocatorCandidate>,
    #[serde(default = "default_cookie_attempt_ms")]
    pub per_attempt_ms: u64,
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            candidates: default_cookie_candidates(),
            per_attempt_ms: default_cookie_attempt_ms(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

fn default_cookie_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::text_in("button", "zde"),
        LocatorCandidate::text_in("a", "zde"),
        LocatorCandidate::text_in("button", "Povolit pouze nezbytné"),
        LocatorCandidate::text_in("button", "Pouze nezbytné"),
        LocatorCandidate::text_in("button", "Odmítnout"),
        LocatorCandidate::text_in("button", "Odmítnout vše"),
    ]
}

fn default_cookie_attempt_ms() -> u64 {
    2000
}

fn default_close_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run with a visible window instead of headless.
    #[serde(default)]
    pub visible: bool,
}
