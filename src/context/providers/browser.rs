use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::{run_applescript, split_pair, ContextProvider, ProviderInput};
use crate::context::models::{BrowserContext, ContextKind, SubContext};
use crate::shell::CommandRunner;

/// Browsers whose scripting dictionary exposes the active tab as
/// `active tab of front window` with `title`/`URL` properties.
const CHROMIUM_BROWSERS: &[&str] = &["Google Chrome", "Brave Browser", "Microsoft Edge", "Arc"];

pub struct BrowserContextProvider {
    shell: Arc<dyn CommandRunner>,
    scripting: bool,
}

impl BrowserContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            shell,
            scripting: cfg!(target_os = "macos"),
        }
    }

    /// Override whether AppleScript is available on this host.
    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.scripting = enabled;
        self
    }

    /// Active tab of `app_name`, if it is a scriptable browser.
    pub async fn active_tab(&self, app_name: &str) -> BrowserContext {
        if !self.scripting {
            return BrowserContext::default();
        }

        let Some(script) = active_tab_script(app_name) else {
            return BrowserContext::default();
        };

        match run_applescript(self.shell.as_ref(), &script).await {
            Some(output) => parse_tab_info(&output),
            None => BrowserContext::default(),
        }
    }
}

#[async_trait]
impl ContextProvider for BrowserContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Browser
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        Ok(SubContext::Browser(self.active_tab(&input.app_name).await))
    }
}

fn active_tab_script(app_name: &str) -> Option<String> {
    if app_name.contains("Safari") {
        return Some(
            r#"tell application "Safari"
    if (count of windows) > 0 then
        set currentTab to current tab of front window
        return {name of currentTab, URL of currentTab}
    end if
end tell"#
                .to_string(),
        );
    }

    let browser = CHROMIUM_BROWSERS.iter().find(|name| {
        app_name.contains(*name)
            || (**name == "Google Chrome" && app_name.contains("Chrome"))
            || (**name == "Brave Browser" && app_name.contains("Brave"))
    })?;

    Some(format!(
        r#"tell application "{browser}"
    if (count of windows) > 0 then
        set currentTab to active tab of front window
        return {{title of currentTab, URL of currentTab}}
    end if
end tell"#
    ))
}

/// Parse `"<title>, <url>"` as printed by `osascript`.
pub fn parse_tab_info(output: &str) -> BrowserContext {
    let (page_title, url) = split_pair(output);
    let domain = url
        .as_deref()
        .and_then(|raw| Url::parse(raw).ok())
        .and_then(|parsed| parsed.host_str().map(str::to_string));

    BrowserContext {
        page_title,
        domain,
        current_tab: url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::providers::testing::ScriptedShell;

    #[test]
    fn parses_title_and_domain() {
        let context = parse_tab_info("Pull requests, acme/trace · GitHub, https://github.com/acme/trace/pulls");
        assert_eq!(
            context.page_title.as_deref(),
            Some("Pull requests, acme/trace · GitHub")
        );
        assert_eq!(context.domain.as_deref(), Some("github.com"));
        assert_eq!(
            context.current_tab.as_deref(),
            Some("https://github.com/acme/trace/pulls")
        );
    }

    #[test]
    fn unparseable_url_has_no_domain() {
        let context = parse_tab_info("Start Page, not a url");
        assert_eq!(context.page_title.as_deref(), Some("Start Page"));
        assert_eq!(context.domain, None);
    }

    #[test]
    fn only_known_browsers_get_a_script() {
        assert!(active_tab_script("Safari").is_some());
        assert!(active_tab_script("Google Chrome").is_some());
        assert!(active_tab_script("Brave Browser").is_some());
        assert!(active_tab_script("Terminal").is_none());
    }

    #[tokio::test]
    async fn non_browser_app_runs_nothing() {
        let shell = Arc::new(ScriptedShell::new());
        let provider = BrowserContextProvider::new(shell.clone()).with_scripting(true);

        let context = provider
            .capture(&ProviderInput::for_app("Terminal"))
            .await
            .unwrap();

        assert_eq!(context, SubContext::Browser(BrowserContext::default()));
        assert!(shell.calls().is_empty());
    }

    #[tokio::test]
    async fn queries_active_tab_through_osascript() {
        let shell = Arc::new(
            ScriptedShell::new().respond("osascript", Ok("Docs, https://docs.rs/tokio".into())),
        );
        let provider = BrowserContextProvider::new(shell.clone()).with_scripting(true);

        let context = provider.active_tab("Safari").await;

        assert_eq!(context.page_title.as_deref(), Some("Docs"));
        assert_eq!(context.domain.as_deref(), Some("docs.rs"));
        assert_eq!(shell.calls().len(), 1);
    }
}
