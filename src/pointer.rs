use crate::core::{Canvas, Point, Vec2};
use crate::error::{TwibbonError, TwibbonResult};
use crate::transform::PhotoTransform;

/// Mapping from raw display-space event coordinates into canvas space.
///
/// The surface may be displayed at a CSS/window size different from its
/// logical pixel dimensions; scale factors are independent per axis.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    canvas: Canvas,
    display_origin: Point,
    display_width: f64,
    display_height: f64,
}

impl Viewport {
    /// Create a validated viewport. Display extents must be finite and > 0.
    pub fn new(
        canvas: Canvas,
        display_origin: Point,
        display_width: f64,
        display_height: f64,
    ) -> TwibbonResult<Self> {
        if !display_width.is_finite() || display_width <= 0.0 {
            return Err(TwibbonError::validation(
                "viewport display_width must be finite and > 0",
            ));
        }
        if !display_height.is_finite() || display_height <= 0.0 {
            return Err(TwibbonError::validation(
                "viewport display_height must be finite and > 0",
            ));
        }
        Ok(Self {
            canvas,
            display_origin,
            display_width,
            display_height,
        })
    }

    /// A viewport displayed at exactly its logical size, origin (0,0).
    pub fn identity(canvas: Canvas) -> Self {
        Self {
            canvas,
            display_origin: Point::ZERO,
            display_width: f64::from(canvas.width),
            display_height: f64::from(canvas.height),
        }
    }

    /// Convert a raw display-space point into canvas space.
    pub fn to_canvas(&self, display_pt: Point) -> Point {
        let sx = f64::from(self.canvas.width) / self.display_width;
        let sy = f64::from(self.canvas.height) / self.display_height;
        Point::new(
            (display_pt.x - self.display_origin.x) * sx,
            (display_pt.y - self.display_origin.y) * sy,
        )
    }
}

/// Two-state drag machine: Idle and Dragging.
///
/// Mouse and touch streams feed the same entry points; touch callers pass the
/// first active touch point. On pointer-down the controller captures the
/// vector from the photo center to the pointer, so subsequent moves keep that
/// visual offset instead of snapping the center to the pointer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerController {
    anchor: Option<Vec2>,
}

impl PointerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag gesture. The photo-present guard is the caller's
    /// responsibility; the controller itself always arms.
    pub fn pointer_down(
        &mut self,
        display_pt: Point,
        viewport: &Viewport,
        transform: &PhotoTransform,
    ) {
        let p = viewport.to_canvas(display_pt);
        self.anchor = Some(Vec2::new(p.x - transform.x, p.y - transform.y));
    }

    /// Move the photo while a gesture is active. Returns `true` when the
    /// transform was updated; move events while Idle are ignored.
    pub fn pointer_move(
        &mut self,
        display_pt: Point,
        viewport: &Viewport,
        transform: &mut PhotoTransform,
    ) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let p = viewport.to_canvas(display_pt);
        transform.set_translation(p.x - anchor.x, p.y - anchor.y);
        true
    }

    /// End the gesture (pointer up or touch end).
    pub fn pointer_up(&mut self) {
        self.anchor = None;
    }

    /// Abort the gesture (pointer leaving the surface).
    pub fn pointer_cancel(&mut self) {
        self.anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }
}
