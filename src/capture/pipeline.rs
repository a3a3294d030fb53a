use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use image::{DynamicImage, ImageFormat};
use tokio::time::Instant;

use super::bridge::{CaptureBackend, OcrEngine};
use super::models::{CaptureRect, CaptureRequest, CaptureResult, CaptureTarget, OcrOutput};
use crate::context::{ContextAggregator, ProviderInput};
use crate::error::{CaptureError, Result};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const UNKNOWN_APP: &str = "Unknown";

/// One capture from request to assembled result: validate, grab pixels, then OCR
/// and context collection side by side, then PNG encoding.
pub struct CapturePipeline {
    backend: Arc<dyn CaptureBackend>,
    ocr: Arc<dyn OcrEngine>,
    context: Arc<ContextAggregator>,
}

impl CapturePipeline {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        ocr: Arc<dyn OcrEngine>,
        context: Arc<ContextAggregator>,
    ) -> Self {
        Self {
            backend,
            ocr,
            context,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CaptureBackend> {
        &self.backend
    }

    pub async fn run(&self, request: &CaptureRequest) -> Result<CaptureResult> {
        let target = request.validate()?;
        let capture_start = Instant::now();

        let (app_name, window_title) = match self.backend.active_window().await {
            Ok(metadata) => {
                let title = Some(metadata.title).filter(|title| !title.is_empty());
                (metadata.owner_name, title)
            }
            Err(err) => {
                log_warn!("active window lookup failed, continuing as {UNKNOWN_APP}: {err:#}");
                (UNKNOWN_APP.to_string(), None)
            }
        };

        let screenshot_start = Instant::now();
        let image = match target {
            CaptureTarget::FullScreen => self.backend.capture_full_screen().await?,
            CaptureTarget::Window(handle) => self.backend.capture_window(handle).await?,
            CaptureTarget::Region(rect) => {
                let screen = self.backend.capture_full_screen().await?;
                tokio::task::spawn_blocking(move || crop_to_region(&screen, rect))
                    .await
                    .map_err(|err| CaptureError::Internal(format!("crop worker failed: {err}")))??
            }
        };
        let screenshot_duration_ms = screenshot_start.elapsed().as_millis();
        let image = Arc::new(image);

        let input = ProviderInput {
            app_name: app_name.clone(),
            window_title: window_title.clone(),
            image: Some(Arc::clone(&image)),
        };

        let analysis_start = Instant::now();
        let (ocr, context) = tokio::join!(
            self.ocr.recognize(image.as_ref()),
            self.context.collect_for(&input),
        );
        let analysis_duration_ms = analysis_start.elapsed().as_millis();

        let ocr = ocr.unwrap_or_else(|err| {
            log_warn!("ocr failed, continuing without text: {err:#}");
            OcrOutput::default()
        });

        let png_bytes = tokio::task::spawn_blocking({
            let image = Arc::clone(&image);
            move || encode_png(&image)
        })
        .await
        .map_err(|err| CaptureError::Internal(format!("png worker failed: {err}")))??;

        log_info!(
            "captured {} ({}x{}, {} bytes, {} spans) in {}ms (screenshot: {}ms, ocr+context: {}ms)",
            app_name,
            image.width(),
            image.height(),
            png_bytes.len(),
            ocr.spans.len(),
            capture_start.elapsed().as_millis(),
            screenshot_duration_ms,
            analysis_duration_ms
        );
        log_info!(
            "context for {}: {}",
            app_name,
            context.summary().as_deref().unwrap_or("nothing collected")
        );

        Ok(CaptureResult {
            image_bytes: Arc::new(png_bytes),
            recognized_text: ocr.full_text,
            text_spans: ocr.spans,
            app_name,
            window_title,
            context,
            captured_at: Utc::now(),
        })
    }
}

/// Cut `rect` out of a full-screen capture. The rect must lie inside the image.
pub fn crop_to_region(screen: &DynamicImage, rect: CaptureRect) -> Result<DynamicImage> {
    let right = rect.x.checked_add(rect.width);
    let bottom = rect.y.checked_add(rect.height);

    match (right, bottom) {
        (Some(right), Some(bottom)) if right <= screen.width() && bottom <= screen.height() => {
            Ok(screen.crop_imm(rect.x, rect.y, rect.width, rect.height))
        }
        _ => Err(CaptureError::InvalidRegion(format!(
            "{}x{} at ({}, {}) is outside the {}x{} display",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            screen.width(),
            screen.height()
        ))),
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| CaptureError::Encoding(err.to_string()))?;
    Ok(bytes)
}
