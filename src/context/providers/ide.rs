use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{non_empty, run_applescript, split_pair, ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, IdeContext, SubContext};
use crate::shell::CommandRunner;

const XCODE_SCRIPT: &str = r#"tell application "Xcode"
    if (count of windows) > 0 then
        set activeDoc to active workspace document
        if activeDoc is not missing value then
            return {path of activeDoc, name of activeDoc}
        end if
    end if
end tell"#;

/// Editors whose window title reads `file - project - Editor`.
const DASH_TITLED_EDITORS: &[&str] = &["Visual Studio Code", "Code", "Cursor"];

/// JetBrains IDEs title windows `project – file` (en dash).
const JETBRAINS_EDITORS: &[&str] = &["IntelliJ", "WebStorm", "PyCharm", "RustRover", "GoLand"];

pub struct IdeContextProvider {
    shell: Arc<dyn CommandRunner>,
    scripting: bool,
}

impl IdeContextProvider {
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
}

#[async_trait]
impl ContextProvider for IdeContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Ide
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        let app = input.app_name.as_str();

        let context = if app.contains("Xcode") {
            if self.scripting {
                match run_applescript(self.shell.as_ref(), XCODE_SCRIPT).await {
                    Some(output) => {
                        let (active_file, project_name) = split_pair(&output);
                        IdeContext {
                            active_file,
                            project_name,
                            ..IdeContext::default()
                        }
                    }
                    None => IdeContext::default(),
                }
            } else {
                IdeContext::default()
            }
        } else {
            input
                .window_title
                .as_deref()
                .map(|title| ide_from_window_title(app, title))
                .unwrap_or_default()
        };

        Ok(SubContext::Ide(context))
    }
}

/// Derive file and project from an editor's window title.
pub fn ide_from_window_title(app_name: &str, title: &str) -> IdeContext {
    if JETBRAINS_EDITORS.iter().any(|ide| app_name.contains(ide)) {
        let parts: Vec<&str> = title.split(" – ").collect();
        if parts.len() > 1 {
            return IdeContext {
                active_file: parts.last().and_then(|part| non_empty(part)),
                project_name: parts.first().and_then(|part| non_empty(part)),
                ..IdeContext::default()
            };
        }
        return IdeContext::default();
    }

    let Some(editor) = DASH_TITLED_EDITORS
        .iter()
        .find(|editor| app_name.contains(*editor))
    else {
        return IdeContext::default();
    };

    let mut parts: Vec<&str> = title.split(" - ").map(str::trim).collect();
    if parts.len() > 2 && parts.last().is_some_and(|last| last.contains(editor)) {
        parts.pop();
    }

    if parts.len() < 2 {
        return IdeContext::default();
    }

    IdeContext {
        active_file: parts.first().and_then(|part| non_empty(part)),
        project_name: parts.last().and_then(|part| non_empty(part)),
        ..IdeContext::default()
    }
}
