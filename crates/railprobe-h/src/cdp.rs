use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(
        visible: bool,
        window: (u32, u32),
    ) -> Result<Self, LaunchError> {
        let mut config_builder = BrowserConfig::builder();
        config_builder = config_builder.no_sandbox(); // containers and CI lack the sandbox
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder
            .user_data_dir(&user_data_dir)
            .window_size(window.0, window.1);

        if visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                    continue;
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        spawn_console_logger(&page).await?;
        spawn_dialog_acceptor(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), LaunchError> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.cleanup_user_data_dir {
            if let Some(dir) = &self.user_data_dir {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
                }
            }
        }

        Ok(())
    }
}

pub type LaunchError = Box<dyn std::error::Error + Send + Sync>;

/// Mirror page console output into the debug log.
async fn spawn_console_logger(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| arg.description.clone().unwrap_or_else(|| "unknown".into()))
                .collect();
            tracing::debug!("Browser Console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// Accept alert/confirm/prompt dialogs; an open dialog blocks every evaluation.
async fn spawn_dialog_acceptor(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!("Accepting {:?} dialog: {}", event.r#type, event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::error!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn resolve_user_data_dir() -> Result<(PathBuf, bool), LaunchError> {
    if let Ok(dir) = std::env::var("RAILPROBE_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from RAILPROBE_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("railprobe-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
