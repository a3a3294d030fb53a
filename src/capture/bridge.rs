//! Capability interfaces to the platform: pixel capture, OCR and persistence.
//!
//! Implementations live with the host application (ScreenCaptureKit + Vision on
//! macOS, for example); this crate only orchestrates them.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

use super::models::{CaptureResult, OcrOutput, WindowHandle, WindowMetadata};
use crate::error::CaptureError;

#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn capture_full_screen(&self) -> std::result::Result<DynamicImage, CaptureError>;

    async fn capture_window(
        &self,
        handle: WindowHandle,
    ) -> std::result::Result<DynamicImage, CaptureError>;

    /// Metadata for the frontmost window.
    async fn active_window(&self) -> Result<WindowMetadata>;

    /// On-screen windows that could be captured.
    async fn list_windows(&self) -> Result<Vec<WindowMetadata>> {
        Ok(Vec::new())
    }
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput>;
}

/// A capture as read back from storage.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCapture {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub result: CaptureResult,
}

#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Persist a capture and return its id.
    async fn save(&self, result: &CaptureResult) -> Result<String>;

    /// All captures, newest first.
    async fn fetch_all(&self) -> Result<Vec<StoredCapture>>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Write the capture's PNG into `dir` and return the file path.
    async fn export(&self, id: &str, dir: &Path) -> Result<PathBuf>;
}
