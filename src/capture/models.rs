use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::CapturedContext;
use crate::detect::{derive_title, detect_sensitive_ranges, SensitiveRange};
use crate::error::{CaptureError, Result};

/// Opaque identifier of an on-screen window, as handed out by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    FullScreen,
    Window,
    Region,
    Video,
}

/// Pixel rectangle on the main display, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub mode: CaptureMode,
    pub target_window: Option<WindowHandle>,
    pub region: Option<CaptureRect>,
}

impl CaptureRequest {
    pub fn full_screen() -> Self {
        Self {
            mode: CaptureMode::FullScreen,
            target_window: None,
            region: None,
        }
    }

    pub fn window(handle: WindowHandle) -> Self {
        Self {
            mode: CaptureMode::Window,
            target_window: Some(handle),
            region: None,
        }
    }

    pub fn region(rect: CaptureRect) -> Self {
        Self {
            mode: CaptureMode::Region,
            target_window: None,
            region: Some(rect),
        }
    }

    pub fn video() -> Self {
        Self {
            mode: CaptureMode::Video,
            target_window: None,
            region: None,
        }
    }

    /// Resolve the request into something the backend can act on.
    pub fn validate(&self) -> Result<CaptureTarget> {
        match self.mode {
            CaptureMode::Video => Err(CaptureError::Unsupported),
            CaptureMode::FullScreen => Ok(CaptureTarget::FullScreen),
            CaptureMode::Window => self
                .target_window
                .map(CaptureTarget::Window)
                .ok_or(CaptureError::NoWindowProvided),
            CaptureMode::Region => {
                let rect = self.region.ok_or(CaptureError::NoRegionProvided)?;
                if rect.width == 0 || rect.height == 0 {
                    return Err(CaptureError::InvalidRegion(format!(
                        "{}x{} region has no area",
                        rect.width, rect.height
                    )));
                }
                Ok(CaptureTarget::Region(rect))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    FullScreen,
    Window(WindowHandle),
    Region(CaptureRect),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetadata {
    pub handle: WindowHandle,
    pub bundle_id: String,
    pub title: String,
    pub owner_name: String,
    pub bounds: WindowBounds,
}

/// One OCR-detected line with its bounding box in image pixels (top-left origin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrOutput {
    pub full_text: String,
    /// In engine order; not necessarily top-to-bottom.
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    #[serde(skip)]
    pub image_bytes: Arc<Vec<u8>>,
    pub recognized_text: String,
    pub text_spans: Vec<TextSpan>,
    pub app_name: String,
    pub window_title: Option<String>,
    pub context: CapturedContext,
    pub captured_at: DateTime<Utc>,
}

impl CaptureResult {
    /// Display title derived from the recognized text, falling back to the app name.
    pub fn title(&self) -> String {
        derive_title(&self.recognized_text, &self.app_name)
    }

    /// Redaction candidates in the recognized text. Recomputed on every call.
    pub fn sensitive_ranges(&self) -> Vec<SensitiveRange> {
        detect_sensitive_ranges(&self.recognized_text)
    }
}
