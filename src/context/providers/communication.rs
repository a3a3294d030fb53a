use anyhow::Result;
use async_trait::async_trait;

use super::{non_empty, ContextProvider, ProviderInput};
use crate::context::models::{CommunicationContext, ContextKind, SubContext};

/// Reads channel and subject straight from the frontmost window title.
pub struct CommunicationContextProvider;

#[async_trait]
impl ContextProvider for CommunicationContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Communication
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        let context = input
            .window_title
            .as_deref()
            .map(|title| communication_from_window_title(&input.app_name, title))
            .unwrap_or_default();
        Ok(SubContext::Communication(context))
    }
}

pub fn communication_from_window_title(app_name: &str, title: &str) -> CommunicationContext {
    let mut context = CommunicationContext::default();

    if app_name.contains("Slack") {
        // "#channel | Workspace"
        context.slack_channel = title.split(" | ").next().and_then(non_empty);
    } else if app_name.contains("Mail") || app_name.contains("Outlook") {
        context.email_subject = non_empty(title);
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_channel_from_title() {
        let context = communication_from_window_title("Slack", "#eng-platform | Acme");
        assert_eq!(context.slack_channel.as_deref(), Some("#eng-platform"));
        assert_eq!(context.email_subject, None);
    }

    #[test]
    fn mail_subject_from_title() {
        let context =
            communication_from_window_title("Microsoft Outlook", "Re: Q3 launch checklist");
        assert_eq!(context.email_subject.as_deref(), Some("Re: Q3 launch checklist"));
    }

    #[tokio::test]
    async fn missing_title_is_absent() {
        let context = CommunicationContextProvider
            .capture(&ProviderInput::for_app("Slack"))
            .await
            .unwrap();
        assert_eq!(
            context,
            SubContext::Communication(CommunicationContext::default())
        );
    }
}
