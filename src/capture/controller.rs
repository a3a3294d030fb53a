use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::bridge::CaptureStore;
use super::models::{CaptureRequest, CaptureResult, WindowMetadata};
use super::pipeline::CapturePipeline;
use crate::error::{CaptureError, Result};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Windows that belong to the desktop chrome rather than to an app.
const SYSTEM_BUNDLES: &[&str] = &[
    "com.apple.dock",
    "com.apple.systemuiserver",
    "com.apple.WindowManager",
];

struct SessionState {
    pipeline: Arc<CapturePipeline>,
    token: CancellationToken,
    generation: u64,
    last_result: Option<Arc<CaptureResult>>,
    last_error: Option<String>,
}

/// Runs captures one at a time, latest wins.
///
/// Starting a capture cancels whichever capture is still in flight. A cancelled or
/// superseded call resolves to `Ok(None)` and never touches storage or
/// `last_result`. Commits happen under the state lock, after re-checking that the
/// call is still current.
pub struct CaptureSession {
    store: Option<Arc<dyn CaptureStore>>,
    state: Mutex<SessionState>,
}

impl CaptureSession {
    pub fn new(pipeline: Arc<CapturePipeline>) -> Self {
        Self {
            store: None,
            state: Mutex::new(SessionState {
                pipeline,
                token: CancellationToken::new(),
                generation: 0,
                last_result: None,
                last_error: None,
            }),
        }
    }

    /// Save every successful capture to `store` before publishing it.
    pub fn with_store(mut self, store: Arc<dyn CaptureStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn capture(&self, request: CaptureRequest) -> Result<Option<Arc<CaptureResult>>> {
        let token = CancellationToken::new();
        let (generation, pipeline) = {
            let mut state = self.state.lock().await;
            state.token.cancel();
            state.token = token.clone();
            state.generation += 1;
            (state.generation, Arc::clone(&state.pipeline))
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                log_info!("capture #{generation} cancelled");
                return Ok(None);
            }
            outcome = pipeline.run(&request) => outcome,
        };

        let mut state = self.state.lock().await;
        if token.is_cancelled() || state.generation != generation {
            log_info!("capture #{generation} superseded before commit");
            return Ok(None);
        }

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                log_error!("capture #{generation} failed: {err}");
                state.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        if let Some(store) = &self.store {
            match store.save(&result).await {
                Ok(id) => log_info!("capture #{generation} saved as {id}"),
                Err(err) => {
                    let err = CaptureError::Persistence(format!("{err:#}"));
                    log_error!("capture #{generation} could not be saved: {err}");
                    state.last_error = Some(err.to_string());
                    return Err(err);
                }
            }
        }

        let result = Arc::new(result);
        state.last_result = Some(Arc::clone(&result));
        state.last_error = None;
        Ok(Some(result))
    }

    /// Run later captures through `pipeline`. The in-flight capture is cancelled;
    /// `last_result` and `last_error` are kept.
    pub async fn replace_pipeline(&self, pipeline: Arc<CapturePipeline>) {
        let mut state = self.state.lock().await;
        state.token.cancel();
        state.pipeline = pipeline;
    }

    /// Cancel the in-flight capture, if any.
    pub async fn cancel(&self) {
        self.state.lock().await.token.cancel();
    }

    pub async fn last_result(&self) -> Option<Arc<CaptureResult>> {
        self.state.lock().await.last_result.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    /// Capturable windows, without desktop chrome or untitled windows.
    pub async fn available_windows(&self) -> Result<Vec<WindowMetadata>> {
        let pipeline = Arc::clone(&self.state.lock().await.pipeline);
        let windows = pipeline
            .backend()
            .list_windows()
            .await
            .map_err(|err| CaptureError::Backend(format!("{err:#}")))?;

        Ok(windows
            .into_iter()
            .filter(|window| !SYSTEM_BUNDLES.contains(&window.bundle_id.as_str()))
            .filter(|window| !window.title.trim().is_empty())
            .collect())
    }
}
