use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::{BrowserContextProvider, ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, DesignContext, SubContext};
use crate::shell::CommandRunner;

const DESIGN_APPS: &[&str] = &["Figma", "Sketch", "Adobe"];

/// Browser Figma is most often opened from when the desktop app is frontmost.
const FIGMA_BROWSER: &str = "Safari";

pub struct DesignContextProvider {
    browser: BrowserContextProvider,
}

impl DesignContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            browser: BrowserContextProvider::new(shell),
        }
    }

    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.browser = self.browser.with_scripting(enabled);
        self
    }
}

#[async_trait]
impl ContextProvider for DesignContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Design
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        let app = input.app_name.as_str();
        if !DESIGN_APPS.iter().any(|name| app.contains(name)) {
            return Ok(SubContext::Design(DesignContext::default()));
        }

        let mut context = DesignContext::default();
        if app.contains("Figma") {
            let tab = self.browser.active_tab(FIGMA_BROWSER).await;
            if let Some((file_id, file_name)) = tab.current_tab.as_deref().and_then(parse_figma_url)
            {
                context.figma_file_id = Some(file_id);
                context.figma_file_name = Some(file_name);
            }
        }

        Ok(SubContext::Design(context))
    }
}

/// `(file id, decoded file name)` from a `figma.com/file/<id>/<name>` URL.
pub fn parse_figma_url(raw: &str) -> Option<(String, String)> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    if host != "figma.com" && !host.ends_with(".figma.com") {
        return None;
    }

    let mut segments = url.path_segments()?;
    match segments.next()? {
        "file" | "design" => {}
        _ => return None,
    }

    let file_id = segments.next().filter(|id| !id.is_empty())?;
    let file_name = segments.next().filter(|name| !name.is_empty())?;
    let file_name = urlencoding::decode(file_name).ok()?;

    Some((file_id.to_string(), file_name.into_owned()))
}
