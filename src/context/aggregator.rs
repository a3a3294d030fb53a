use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;

use super::models::{CapturedContext, ContextKind};
use super::providers::{
    BrowserContextProvider, CommunicationContextProvider, ContextProvider,
    DesignContextProvider, DevelopmentContextProvider, GitContextProvider, IdeContextProvider,
    MediaContextProvider, ProviderInput, SystemContextProvider, TemporalContextProvider,
    VisualContextProvider,
};
use crate::settings::CaptureSettings;
use crate::shell::{CommandRunner, ShellGateway};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Fans a capture out to every registered provider and merges what comes back.
///
/// Each provider runs as its own task under its own timeout. A provider that times
/// out, errors or panics leaves its sub-context absent; the others are unaffected.
/// Dropping the future returned by [`ContextAggregator::collect_for`] aborts every
/// provider task still running.
pub struct ContextAggregator {
    providers: Vec<Arc<dyn ContextProvider>>,
    timeout: Duration,
}

impl ContextAggregator {
    pub fn new(providers: Vec<Arc<dyn ContextProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// The full provider registry. Every provider that shells out gets its own
    /// gateway so one slow command cannot hold up another provider.
    pub fn with_default_providers(settings: &CaptureSettings) -> Self {
        let shell_timeout = settings.shell_timeout();
        let gateway = || -> Arc<dyn CommandRunner> { Arc::new(ShellGateway::new(shell_timeout)) };

        let registry: Vec<Arc<dyn ContextProvider>> = vec![
            Arc::new(GitContextProvider::new(gateway(), settings.git.clone())),
            Arc::new(BrowserContextProvider::new(gateway())),
            Arc::new(IdeContextProvider::new(gateway())),
            Arc::new(SystemContextProvider::new(gateway())),
            Arc::new(DesignContextProvider::new(gateway())),
            Arc::new(CommunicationContextProvider),
            Arc::new(DevelopmentContextProvider::new(gateway())),
            Arc::new(VisualContextProvider),
            Arc::new(TemporalContextProvider),
            Arc::new(MediaContextProvider::new(gateway())),
        ];

        let providers = registry
            .into_iter()
            .filter(|provider| settings.is_enabled(provider.kind()))
            .collect();

        Self::new(providers, settings.provider_timeout())
    }

    pub fn kinds(&self) -> Vec<ContextKind> {
        self.providers.iter().map(|provider| provider.kind()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Context for `app_name` with no window title or image.
    pub async fn collect(&self, app_name: &str) -> CapturedContext {
        self.collect_for(&ProviderInput::for_app(app_name)).await
    }

    pub async fn collect_for(&self, input: &ProviderInput) -> CapturedContext {
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let input = input.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                let kind = provider.kind();
                let outcome = tokio::time::timeout(timeout, provider.capture(&input)).await;
                (kind, outcome)
            });
        }

        let mut parts = Vec::with_capacity(self.providers.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(Ok(part)))) if part.kind() == kind => parts.push(part),
                Ok((kind, Ok(Ok(part)))) => {
                    log_warn!(
                        "{} provider returned {} context, discarding",
                        kind.as_str(),
                        part.kind().as_str()
                    );
                }
                Ok((kind, Ok(Err(err)))) => {
                    log_warn!("{} provider failed: {err:#}", kind.as_str());
                }
                Ok((kind, Err(_))) => {
                    log_warn!(
                        "{} provider timed out after {}ms",
                        kind.as_str(),
                        self.timeout.as_millis()
                    );
                }
                Err(err) => log_warn!("context provider task failed: {err}"),
            }
        }

        log_debug!(
            "collected {}/{} context facets for {} in {}ms",
            parts.len(),
            self.providers.len(),
            input.app_name,
            started.elapsed().as_millis()
        );

        CapturedContext::from_parts(parts)
    }
}
