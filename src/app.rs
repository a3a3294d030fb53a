use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use crate::capture::{
    CaptureBackend, CapturePipeline, CaptureRequest, CaptureResult, CaptureSession,
    CaptureStore, OcrEngine, StoredCapture, WindowMetadata,
};
use crate::context::ContextAggregator;
use crate::db::CaptureDatabase;
use crate::error::CaptureError;
use crate::settings::{CaptureSettings, SettingsStore};

const ENABLE_LOGS: bool = true;

use crate::log_info;

const DATABASE_FILE: &str = "trace.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

/// Everything a host UI needs: capture, gallery and settings over one data directory.
pub struct TraceApp {
    data_dir: PathBuf,
    backend: Arc<dyn CaptureBackend>,
    ocr: Arc<dyn OcrEngine>,
    db: CaptureDatabase,
    settings: SettingsStore,
    session: CaptureSession,
}

impl TraceApp {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        backend: Arc<dyn CaptureBackend>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = CaptureDatabase::new(data_dir.join(DATABASE_FILE))?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        let store: Arc<dyn CaptureStore> = Arc::new(db.clone());
        let session = CaptureSession::new(build_pipeline(&backend, &ocr, &settings.current()))
            .with_store(store);

        log_info!("trace ready at {}", data_dir.display());

        Ok(Self {
            data_dir,
            backend,
            ocr,
            db,
            settings,
            session,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Capture, then save and publish. `Ok(None)` when cancelled or superseded.
    pub async fn capture(
        &self,
        request: CaptureRequest,
    ) -> std::result::Result<Option<Arc<CaptureResult>>, CaptureError> {
        self.session.capture(request).await
    }

    pub async fn cancel(&self) {
        self.session.cancel().await;
    }

    pub async fn last_result(&self) -> Option<Arc<CaptureResult>> {
        self.session.last_result().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.session.last_error().await
    }

    pub async fn available_windows(
        &self,
    ) -> std::result::Result<Vec<WindowMetadata>, CaptureError> {
        self.session.available_windows().await
    }

    /// Saved captures, newest first.
    pub async fn gallery(&self) -> Result<Vec<StoredCapture>> {
        self.db.fetch_all().await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.db.delete(id).await
    }

    pub async fn export(&self, id: &str, dir: &Path) -> Result<PathBuf> {
        self.db.export(id, dir).await
    }

    pub fn settings(&self) -> CaptureSettings {
        self.settings.current()
    }

    /// Persist new settings and rebuild the provider registry. A capture still in
    /// flight on the old registry is cancelled; the last result stays visible.
    pub async fn update_settings(&self, settings: CaptureSettings) -> Result<()> {
        self.settings.update(settings.clone())?;

        self.session
            .replace_pipeline(build_pipeline(&self.backend, &self.ocr, &settings))
            .await;

        log_info!(
            "settings updated: provider timeout {}ms, {} providers disabled",
            settings.provider_timeout_ms,
            settings.disabled_providers.len()
        );
        Ok(())
    }
}

fn build_pipeline(
    backend: &Arc<dyn CaptureBackend>,
    ocr: &Arc<dyn OcrEngine>,
    settings: &CaptureSettings,
) -> Arc<CapturePipeline> {
    let aggregator = Arc::new(ContextAggregator::with_default_providers(settings));
    Arc::new(CapturePipeline::new(
        Arc::clone(backend),
        Arc::clone(ocr),
        aggregator,
    ))
}
