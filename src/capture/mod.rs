pub mod bridge;
pub mod controller;
pub mod models;
pub mod pipeline;

pub use bridge::{CaptureBackend, CaptureStore, OcrEngine, StoredCapture};
pub use controller::CaptureSession;
pub use models::{
    CaptureMode, CaptureRect, CaptureRequest, CaptureResult, CaptureTarget, OcrOutput, TextSpan,
    WindowBounds, WindowHandle, WindowMetadata,
};
pub use pipeline::CapturePipeline;
