use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use super::{present, ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, SubContext, SystemContext};
use crate::shell::CommandRunner;

const MAX_PROCESS_NAMES: usize = 20;
const MAX_CLIPBOARD_CHARS: usize = 200;

pub struct SystemContextProvider {
    shell: Arc<dyn CommandRunner>,
    scripting: bool,
}

impl SystemContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            shell,
            scripting: cfg!(target_os = "macos"),
        }
    }

    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.scripting = enabled;
        self
    }

    async fn clipboard(&self) -> Option<String> {
        if !self.scripting {
            return None;
        }

        present(self.shell.execute("pbpaste", None).await)
            .map(|text| text.chars().take(MAX_CLIPBOARD_CHARS).collect())
    }
}

#[async_trait]
impl ContextProvider for SystemContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::System
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        let working_directory = std::env::current_dir()
            .ok()
            .map(|dir| dir.to_string_lossy().into_owned());

        let names = tokio::task::spawn_blocking(running_process_names)
            .await
            .context("process listing worker failed")?;
        let running_processes = serde_json::to_string(&names).ok();

        Ok(SubContext::System(SystemContext {
            working_directory,
            running_processes,
            active_window_title: input.window_title.clone(),
            clipboard_content: self.clipboard().await,
        }))
    }
}

/// Distinct process names, sorted, capped.
fn running_process_names() -> Vec<String> {
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

    let names: BTreeSet<String> = system
        .processes()
        .values()
        .map(|process| process.name().to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .collect();

    names.into_iter().take(MAX_PROCESS_NAMES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::providers::testing::ScriptedShell;

    fn system_context(sub: SubContext) -> SystemContext {
        match sub {
            SubContext::System(context) => context,
            other => panic!("expected system context, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reports_window_title_and_processes() {
        let provider = SystemContextProvider::new(Arc::new(ScriptedShell::new()))
            .with_scripting(false);
        let input = ProviderInput {
            window_title: Some("notes.md".into()),
            ..ProviderInput::for_app("TextEdit")
        };

        let context = system_context(provider.capture(&input).await.unwrap());

        assert_eq!(context.active_window_title.as_deref(), Some("notes.md"));
        assert!(context.working_directory.is_some());
        assert_eq!(context.clipboard_content, None);

        let names: Vec<String> =
            serde_json::from_str(context.running_processes.as_deref().unwrap()).unwrap();
        assert!(names.len() <= MAX_PROCESS_NAMES);
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn clipboard_is_truncated() {
        let long = "x".repeat(500);
        let shell = Arc::new(ScriptedShell::new().respond("pbpaste", Ok(long)));
        let provider = SystemContextProvider::new(shell).with_scripting(true);

        let context = system_context(
            provider
                .capture(&ProviderInput::for_app("Terminal"))
                .await
                .unwrap(),
        );

        assert_eq!(
            context.clipboard_content.map(|text| text.chars().count()),
            Some(MAX_CLIPBOARD_CHARS)
        );
    }
}
