//! Chrome DevTools Protocol driver.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::accessibility::GetFullAxTreeParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use devtools_core::config::BrowserConfig;

use crate::PageDriver;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A single Chrome page launched and owned by this process.
pub struct CdpPage {
    page: Page,
    _browser: Browser,
    handler: JoinHandle<()>,
}

impl CdpPage {
    /// Launch Chrome and open `url` in a fresh page.
    pub async fn launch(config: &BrowserConfig, url: &str) -> anyhow::Result<Self> {
        let mut builder = chromiumoxide::BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|e| anyhow!(e))?;

        let (browser, mut events) = Browser::launch(cdp_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    warn!("CDP handler stopped: {e}");
                    break;
                }
            }
        });

        info!(url, "Opening CDP page");
        let page = browser.new_page(url).await?;

        Ok(Self {
            page,
            _browser: browser,
            handler,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expression: String) -> anyhow::Result<T> {
        Ok(self.page.evaluate(expression).await?.into_value()?)
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn content(&self) -> anyhow::Result<String> {
        Ok(self.page.content().await?)
    }

    async fn inner_html(&self, selector: &str) -> anyhow::Result<Option<String>> {
        let selector = serde_json::to_string(selector)?;
        self.eval(format!(
            "(() => {{ const el = document.querySelector({selector}); return el ? el.innerHTML : null; }})()"
        ))
        .await
    }

    async fn wait_for_text(&self, text: &str) -> anyhow::Result<()> {
        let needle = serde_json::to_string(text)?;
        let expression =
            format!("(document.body ? document.body.innerText : '').includes({needle})");
        loop {
            if self.eval::<bool>(expression.clone()).await? {
                return Ok(());
            }
            debug!(text, "Text not present yet");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn accessibility_snapshot(&self, verbose: bool) -> anyhow::Result<String> {
        let tree = self.page.execute(GetFullAxTreeParams::default()).await?;
        let mut out = String::new();
        for (uid, node) in tree.result.nodes.iter().enumerate() {
            if node.ignored && !verbose {
                continue;
            }
            let role = ax_text(node.role.as_ref().and_then(|v| v.value.as_ref()));
            let name = ax_text(node.name.as_ref().and_then(|v| v.value.as_ref()));
            if !verbose && (role == "generic" || role == "none") && name.is_empty() {
                continue;
            }
            out.push_str(&format!("uid={uid} {role}"));
            if !name.is_empty() {
                out.push_str(&format!(" \"{name}\""));
            }
            out.push('\n');
        }
        Ok(out)
    }
}

fn ax_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
