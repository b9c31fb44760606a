use std::time::SystemTime;

use crate::assets::{LoadToken, PreparedImage, RasterRole, RasterStore};
use crate::catalog::FrameSelection;
use crate::core::{Canvas, Point};
use crate::error::TwibbonResult;
use crate::export::{ExportArtifact, encode_png, export_file_name};
use crate::pointer::{PointerController, Viewport};
use crate::render_cpu::{Compositor, FrameRGBA};
use crate::transform::{PhotoTransform, ROTATION_STEP_DEG, SCALE_STEP};

/// Single owned state container for one editing session.
///
/// All mutation is synchronous and happens on the caller's thread. Raster
/// decoding is the one asynchronous concern and stays outside the session:
/// callers obtain a [`LoadToken`], decode however they like, and re-enter
/// through the tokened install methods, which discard superseded results.
///
/// Every state change that invalidates the preview bumps [`revision`]; a UI
/// layer re-renders whenever the revision it last drew differs.
///
/// [`revision`]: EditorSession::revision
pub struct EditorSession {
    canvas: Canvas,
    transform: PhotoTransform,
    pointer: PointerController,
    rasters: RasterStore,
    selection: Option<FrameSelection>,
    revision: u64,
}

impl EditorSession {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            transform: PhotoTransform::centered(canvas),
            pointer: PointerController::new(),
            rasters: RasterStore::new(),
            selection: None,
            revision: 0,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn transform(&self) -> &PhotoTransform {
        &self.transform
    }

    pub fn frame_selection(&self) -> Option<&FrameSelection> {
        self.selection.as_ref()
    }

    /// Monotonic counter of preview-invalidating state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ---- raster intake -------------------------------------------------

    /// Start a photo upload; the returned token gates the later install.
    pub fn begin_photo_upload(&mut self) -> LoadToken {
        self.rasters.begin_load(RasterRole::Photo)
    }

    /// Switch the frame source to a user upload and start its load.
    pub fn begin_frame_upload(&mut self) -> LoadToken {
        self.set_selection(FrameSelection::Upload);
        self.rasters.begin_load(RasterRole::Frame)
    }

    /// Switch the frame source to a catalog preset and start its load.
    ///
    /// The caller resolves the name against its [`FrameCatalog`], decodes,
    /// and installs with the returned token.
    ///
    /// [`FrameCatalog`]: crate::catalog::FrameCatalog
    pub fn select_preset_frame(&mut self, name: impl Into<String>) -> LoadToken {
        self.set_selection(FrameSelection::Preset(name.into()));
        self.rasters.begin_load(RasterRole::Frame)
    }

    fn set_selection(&mut self, selection: FrameSelection) {
        if self.selection.as_ref() != Some(&selection) {
            self.selection = Some(selection);
            self.touch();
        }
    }

    /// Install a finished photo decode. Stale tokens and decode failures
    /// leave the current state untouched.
    pub fn install_photo(
        &mut self,
        token: LoadToken,
        result: TwibbonResult<PreparedImage>,
    ) -> bool {
        self.install(token, result)
    }

    /// Install a finished frame decode, same rules as [`install_photo`].
    ///
    /// [`install_photo`]: EditorSession::install_photo
    pub fn install_frame(
        &mut self,
        token: LoadToken,
        result: TwibbonResult<PreparedImage>,
    ) -> bool {
        self.install(token, result)
    }

    fn install(&mut self, token: LoadToken, result: TwibbonResult<PreparedImage>) -> bool {
        match result {
            Ok(image) => {
                let installed = self.rasters.install(token, image);
                if installed {
                    self.touch();
                }
                installed
            }
            Err(err) => {
                self.rasters.reject(token, &err);
                false
            }
        }
    }

    pub fn photo(&self) -> Option<&std::sync::Arc<PreparedImage>> {
        self.rasters.photo()
    }

    pub fn frame(&self) -> Option<&std::sync::Arc<PreparedImage>> {
        self.rasters.frame()
    }

    // ---- pointer protocol ----------------------------------------------

    /// Pointer or first-touch down. Ignored while no photo is present.
    pub fn pointer_down(&mut self, display_pt: Point, viewport: &Viewport) {
        if self.rasters.photo().is_none() {
            return;
        }
        self.pointer.pointer_down(display_pt, viewport, &self.transform);
    }

    /// Pointer or first-touch move; drags the photo while a gesture is
    /// active.
    pub fn pointer_move(&mut self, display_pt: Point, viewport: &Viewport) {
        if self.rasters.photo().is_none() {
            return;
        }
        if self
            .pointer
            .pointer_move(display_pt, viewport, &mut self.transform)
        {
            self.touch();
        }
    }

    /// Pointer up or touch end.
    pub fn pointer_up(&mut self) {
        self.pointer.pointer_up();
    }

    /// Pointer left the surface mid-gesture.
    pub fn pointer_cancel(&mut self) {
        self.pointer.pointer_cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.is_dragging()
    }

    // ---- control surface -----------------------------------------------

    pub fn zoom_in(&mut self) {
        self.mutate_transform(|t| t.adjust_scale(SCALE_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.mutate_transform(|t| t.adjust_scale(-SCALE_STEP));
    }

    pub fn rotate_step(&mut self) {
        self.mutate_transform(|t| t.adjust_rotation(ROTATION_STEP_DEG));
    }

    /// Absolute scale slider; out-of-range values are coerced, never
    /// rejected.
    pub fn set_scale(&mut self, value: f64) {
        self.mutate_transform(|t| t.set_scale(value));
    }

    /// Absolute rotation slider; values are normalized into `[0, 360)`.
    pub fn set_rotation(&mut self, value: f64) {
        self.mutate_transform(|t| t.set_rotation(value));
    }

    /// Place the photo center directly (programmatic counterpart of a drag).
    pub fn set_translation(&mut self, x: f64, y: f64) {
        self.mutate_transform(|t| t.set_translation(x, y));
    }

    pub fn reset(&mut self) {
        let canvas = self.canvas;
        self.mutate_transform(|t| t.reset(canvas));
    }

    fn mutate_transform(&mut self, f: impl FnOnce(&mut PhotoTransform)) {
        let before = self.transform;
        f(&mut self.transform);
        if self.transform != before {
            self.touch();
        }
    }

    // ---- rendering and export ------------------------------------------

    /// Composite the current state into one preview frame.
    #[tracing::instrument(skip_all)]
    pub fn render(&self, compositor: &mut Compositor) -> TwibbonResult<FrameRGBA> {
        compositor.render(
            self.rasters.photo().map(|a| a.as_ref()),
            self.rasters.frame().map(|a| a.as_ref()),
            &self.transform,
            self.canvas,
        )
    }

    /// Flatten and PNG-encode the current state.
    ///
    /// Returns `Ok(None)` unless both a photo and a resolved frame are
    /// present; a disabled export action is a no-op, not an error.
    #[tracing::instrument(skip_all)]
    pub fn export(
        &self,
        compositor: &mut Compositor,
        at: SystemTime,
    ) -> TwibbonResult<Option<ExportArtifact>> {
        if self.rasters.photo().is_none() || self.rasters.frame().is_none() {
            return Ok(None);
        }
        let frame = self.render(compositor)?;
        let png = encode_png(&frame)?;
        Ok(Some(ExportArtifact {
            file_name: export_file_name(at),
            png,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn img(w: u32, h: u32) -> PreparedImage {
        PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new(vec![255u8; (w * h * 4) as usize]),
        }
    }

    #[test]
    fn new_session_starts_centered() {
        let s = EditorSession::new(Canvas::DEFAULT);
        assert_eq!(*s.transform(), PhotoTransform::centered(Canvas::DEFAULT));
        assert!(s.photo().is_none());
        assert!(s.frame().is_none());
        assert!(s.frame_selection().is_none());
    }

    #[test]
    fn pointer_down_without_photo_is_ignored() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let vp = Viewport::identity(Canvas::DEFAULT);
        s.pointer_down(Point::new(100.0, 100.0), &vp);
        assert!(!s.is_dragging());
        s.pointer_move(Point::new(200.0, 200.0), &vp);
        assert_eq!(*s.transform(), PhotoTransform::centered(Canvas::DEFAULT));
    }

    #[test]
    fn stale_photo_install_is_discarded() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let t1 = s.begin_photo_upload();
        let t2 = s.begin_photo_upload();
        assert!(!s.install_photo(t1, Ok(img(1, 1))));
        assert!(s.photo().is_none());
        assert!(s.install_photo(t2, Ok(img(2, 2))));
        assert_eq!(s.photo().unwrap().width, 2);
    }

    #[test]
    fn failed_decode_keeps_previous_photo() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let t1 = s.begin_photo_upload();
        assert!(s.install_photo(t1, Ok(img(4, 4))));
        let rev = s.revision();

        let t2 = s.begin_photo_upload();
        assert!(!s.install_photo(
            t2,
            Err(crate::error::TwibbonError::decode("truncated stream"))
        ));
        assert_eq!(s.photo().unwrap().width, 4);
        assert_eq!(s.revision(), rev);
    }

    #[test]
    fn switching_frame_selection_supersedes_in_flight_load() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let t_preset = s.select_preset_frame("frame1.png");
        assert_eq!(
            s.frame_selection(),
            Some(&FrameSelection::Preset("frame1.png".to_string()))
        );

        // The user switches to uploading before the preset decode lands.
        let t_upload = s.begin_frame_upload();
        assert_eq!(s.frame_selection(), Some(&FrameSelection::Upload));

        assert!(!s.install_frame(t_preset, Ok(img(1, 1))));
        assert!(s.frame().is_none());
        assert!(s.install_frame(t_upload, Ok(img(8, 8))));
        assert_eq!(s.frame().unwrap().width, 8);
    }

    #[test]
    fn reselecting_same_preset_does_not_bump_selection_revision_twice() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        s.select_preset_frame("frame1.png");
        let rev = s.revision();
        s.select_preset_frame("frame1.png");
        assert_eq!(s.revision(), rev);
    }

    #[test]
    fn control_surface_bumps_revision_only_on_change() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let r0 = s.revision();

        s.zoom_in();
        assert_eq!(s.transform().scale, 1.1);
        assert!(s.revision() > r0);

        // Reset when already at defaults is observable-state neutral.
        s.reset();
        let r1 = s.revision();
        s.reset();
        assert_eq!(s.revision(), r1);

        // Clamped-at-bound adjustments change nothing.
        s.set_scale(3.0);
        let r2 = s.revision();
        s.zoom_in();
        assert_eq!(s.revision(), r2);
        assert_eq!(s.transform().scale, 3.0);
    }

    #[test]
    fn drag_updates_transform_and_revision() {
        let mut s = EditorSession::new(Canvas::DEFAULT);
        let vp = Viewport::identity(Canvas::DEFAULT);
        let t = s.begin_photo_upload();
        assert!(s.install_photo(t, Ok(img(4, 4))));

        s.set_translation(300.0, 300.0);
        s.pointer_down(Point::new(350.0, 320.0), &vp);
        assert!(s.is_dragging());
        let rev = s.revision();
        s.pointer_move(Point::new(500.0, 450.0), &vp);
        assert_eq!((s.transform().x, s.transform().y), (450.0, 430.0));
        assert!(s.revision() > rev);
        s.pointer_up();
        assert!(!s.is_dragging());
    }
}
