use std::sync::Arc;

use crate::assets::PreparedImage;
use crate::core::{Affine, Canvas};
use crate::error::{TwibbonError, TwibbonResult};
use crate::transform::PhotoTransform;

/// One composited output frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Draw dimensions for the photo layer.
///
/// Starts from the canvas extents times `scale`, then shrinks one axis so the
/// photo's aspect ratio is preserved: at scale 1 the photo spans the full
/// canvas in its longer dimension. Recomputed fresh each render from the
/// current raster, never cached across uploads.
pub fn photo_draw_size(photo_w: u32, photo_h: u32, canvas: Canvas, scale: f64) -> (f64, f64) {
    let aspect = f64::from(photo_w) / f64::from(photo_h);
    let mut dw = f64::from(canvas.width) * scale;
    let mut dh = f64::from(canvas.height) * scale;
    if aspect > 1.0 {
        dh = dw / aspect;
    } else {
        dw = dh * aspect;
    }
    (dw, dh)
}

#[derive(Clone)]
struct CachedPaint {
    key: usize,
    paint: vello_cpu::Image,
}

/// CPU compositor for the two-layer photo-under-frame scene.
///
/// `render` is a pure function of its inputs; the struct only carries a
/// reusable render context and per-raster paint uploads so repeated preview
/// renders stay allocation-light.
#[derive(Default)]
pub struct Compositor {
    ctx: Option<vello_cpu::RenderContext>,
    photo_paint: Option<CachedPaint>,
    frame_paint: Option<CachedPaint>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite `photo` (transformed, underneath) and `frame` (full-bleed,
    /// on top) onto a transparent canvas-sized surface.
    ///
    /// Either layer may be absent; the output is then the remaining layer
    /// alone, or fully transparent.
    pub fn render(
        &mut self,
        photo: Option<&PreparedImage>,
        frame: Option<&PreparedImage>,
        transform: &PhotoTransform,
        canvas: Canvas,
    ) -> TwibbonResult<FrameRGBA> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| TwibbonError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| TwibbonError::render("canvas height exceeds u16"))?;

        let mut out = vello_cpu::Pixmap::new(width, height);
        clear_pixmap_to_transparent(&mut out);

        self.with_ctx_mut(width, height, |this, ctx| {
            // Photo first: it always sits under the frame.
            if let Some(p) = photo {
                let (dw, dh) = photo_draw_size(p.width, p.height, canvas, transform.scale);
                let paint = image_paint(&mut this.photo_paint, p)?;
                let tr = Affine::translate((transform.x, transform.y))
                    * Affine::rotate(transform.rotation.to_radians())
                    * Affine::translate((-dw / 2.0, -dh / 2.0))
                    * Affine::scale_non_uniform(dw / f64::from(p.width), dh / f64::from(p.height));
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(p.width),
                    f64::from(p.height),
                ));
            }

            // Frame stretched to exactly fill the canvas, untransformed; its
            // own transparency decides how much photo shows through.
            if let Some(f) = frame {
                let paint = image_paint(&mut this.frame_paint, f)?;
                let tr = Affine::scale_non_uniform(
                    f64::from(canvas.width) / f64::from(f.width),
                    f64::from(canvas.height) / f64::from(f.height),
                );
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(f.width),
                    f64::from(f.height),
                ));
            }

            ctx.flush();
            ctx.render_to_pixmap(&mut out);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: out.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> TwibbonResult<R>,
    ) -> TwibbonResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

fn image_paint(
    slot: &mut Option<CachedPaint>,
    image: &PreparedImage,
) -> TwibbonResult<vello_cpu::Image> {
    let key = Arc::as_ptr(&image.rgba8_premul) as usize;
    if let Some(cached) = slot.as_ref()
        && cached.key == key
    {
        return Ok(cached.paint.clone());
    }

    let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };
    *slot = Some(CachedPaint {
        key,
        paint: paint.clone(),
    });
    Ok(paint)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> TwibbonResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TwibbonError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TwibbonError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(TwibbonError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}
