//! One provider per sub-context. Providers never fail the capture: anything they
//! cannot determine is left as `None`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

use super::models::{ContextKind, SubContext};
use crate::error::ShellError;
use crate::shell::{shell_quote, CommandRunner};

pub mod browser;
pub mod communication;
pub mod design;
pub mod development;
pub mod git;
pub mod ide;
pub mod media;
pub mod system;
pub mod temporal;
pub mod visual;

pub use browser::BrowserContextProvider;
pub use communication::CommunicationContextProvider;
pub use design::DesignContextProvider;
pub use development::DevelopmentContextProvider;
pub use git::GitContextProvider;
pub use ide::IdeContextProvider;
pub use media::MediaContextProvider;
pub use system::SystemContextProvider;
pub use temporal::TemporalContextProvider;
pub use visual::VisualContextProvider;

/// What a provider knows about the moment of capture.
#[derive(Debug, Clone, Default)]
pub struct ProviderInput {
    pub app_name: String,
    pub window_title: Option<String>,
    pub image: Option<Arc<DynamicImage>>,
}

impl ProviderInput {
    pub fn for_app(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            window_title: None,
            image: None,
        }
    }
}

#[async_trait]
pub trait ContextProvider: Send + Sync {
    fn kind(&self) -> ContextKind;

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext>;
}

/// Collapse a shell result into "present or absent".
pub(crate) fn present(result: std::result::Result<String, ShellError>) -> Option<String> {
    result.ok()
}

/// Run an AppleScript snippet through `osascript`.
pub(crate) async fn run_applescript(shell: &dyn CommandRunner, script: &str) -> Option<String> {
    let command = format!("osascript -e {}", shell_quote(script));
    present(shell.execute(&command, None).await)
}

/// Split AppleScript list output (`"a, b"`) into its first and last items.
pub(crate) fn split_pair(output: &str) -> (Option<String>, Option<String>) {
    match output.rsplit_once(", ") {
        Some((first, last)) => (non_empty(first), non_empty(last)),
        None => (non_empty(output), None),
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
