//! Twibbon is an interactive frame-overlay compositing engine.
//!
//! A user photo is placed beneath a frame overlay, positioned by drag
//! gestures and discrete scale/rotation controls, then flattened and
//! exported as a PNG. The public API is session-oriented:
//!
//! - Feed decoded rasters into an [`EditorSession`] through load tokens
//! - Drive the transform with pointer events and control actions
//! - Render previews with a [`Compositor`] and export with [`EditorSession::export`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod catalog;
pub mod core;
pub mod editor;
pub mod error;
pub mod export;
pub mod pointer;
pub mod render_cpu;
pub mod transform;

pub use assets::decode::decode_image;
pub use assets::{LoadToken, PreparedImage, RasterRole, RasterStore};
pub use catalog::{FrameCatalog, FrameSelection};
pub use crate::core::{Affine, Canvas, Point, Rect, Vec2};
pub use editor::EditorSession;
pub use error::{TwibbonError, TwibbonResult};
pub use export::{ExportArtifact, encode_png, export_file_name};
pub use pointer::{PointerController, Viewport};
pub use render_cpu::{Compositor, FrameRGBA, photo_draw_size};
pub use transform::{
    PhotoTransform, ROTATION_STEP_DEG, SCALE_MAX, SCALE_MIN, SCALE_STEP,
};
