use std::io::Cursor;
use std::time::SystemTime;

use crate::error::{TwibbonError, TwibbonResult};
use crate::render_cpu::FrameRGBA;

/// A finished export: PNG bytes plus the suggested download file name.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// Encode a composited frame as PNG.
///
/// Premultiplied buffers are converted back to straight alpha first; PNG
/// carries straight-alpha RGBA.
pub fn encode_png(frame: &FrameRGBA) -> TwibbonResult<Vec<u8>> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_in_place(&mut data);
    }

    let img = image::RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| TwibbonError::export("rgba buffer size mismatch"))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| TwibbonError::export(format!("png encode failed: {e}")))?;
    Ok(png)
}

/// Suggested download name, `twibbon-<unix-epoch-ms>.png`.
pub fn export_file_name(at: SystemTime) -> String {
    let ms = at
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("twibbon-{ms}.png")
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
