//! Context-aware screen capture: grab pixels, recognize text, and record what the
//! user was working on at that moment.
//!
//! The platform pieces (pixel capture, OCR) are supplied by the host through
//! [`CaptureBackend`] and [`OcrEngine`]; everything else lives here.

pub mod app;
pub mod capture;
pub mod context;
pub mod db;
pub mod detect;
pub mod error;
pub mod settings;
pub mod shell;
pub mod utils;

pub use app::TraceApp;
pub use capture::{
    CaptureBackend, CaptureMode, CapturePipeline, CaptureRect, CaptureRequest, CaptureResult,
    CaptureSession, CaptureStore, OcrEngine, OcrOutput, StoredCapture, TextSpan, WindowHandle,
    WindowMetadata,
};
pub use context::{CapturedContext, ContextAggregator, ContextKind};
pub use db::CaptureDatabase;
pub use detect::{derive_title, detect_sensitive_ranges, SensitiveKind, SensitiveRange};
pub use error::{CaptureError, ShellError};
pub use settings::{CaptureSettings, GitSearchSettings, SettingsStore};
pub use shell::{CommandRunner, ShellGateway};
pub use utils::init_logging;
