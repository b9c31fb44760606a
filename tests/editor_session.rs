use std::sync::Arc;
use std::time::{Duration, SystemTime};

use twibbon::{
    Canvas, Compositor, EditorSession, Point, PreparedImage, TwibbonError, Viewport,
};

fn solid(w: u32, h: u32, rgba_premul: [u8; 4]) -> PreparedImage {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..(w * h) {
        data.extend_from_slice(&rgba_premul);
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(data),
    }
}

fn session_with(photo: Option<PreparedImage>, frame: Option<PreparedImage>) -> EditorSession {
    let mut s = EditorSession::new(Canvas::new(32, 32).unwrap());
    if let Some(p) = photo {
        let t = s.begin_photo_upload();
        assert!(s.install_photo(t, Ok(p)));
    }
    if let Some(f) = frame {
        let t = s.begin_frame_upload();
        assert!(s.install_frame(t, Ok(f)));
    }
    s
}

#[test]
fn export_is_a_noop_until_both_layers_are_present() {
    let mut compositor = Compositor::new();
    let now = SystemTime::now();

    let s = session_with(None, None);
    assert!(s.export(&mut compositor, now).unwrap().is_none());

    let s = session_with(Some(solid(8, 8, [255, 0, 0, 255])), None);
    assert!(s.export(&mut compositor, now).unwrap().is_none());

    let s = session_with(None, Some(solid(8, 8, [0, 0, 255, 255])));
    assert!(s.export(&mut compositor, now).unwrap().is_none());

    let s = session_with(
        Some(solid(8, 8, [255, 0, 0, 255])),
        Some(solid(8, 8, [0, 0, 255, 255])),
    );
    assert!(s.export(&mut compositor, now).unwrap().is_some());
}

#[test]
fn export_artifact_is_a_decodable_png_with_timestamped_name() {
    let s = session_with(
        Some(solid(8, 8, [255, 0, 0, 255])),
        Some(solid(8, 8, [0, 0, 255, 255])),
    );
    let mut compositor = Compositor::new();

    let at = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
    let artifact = s.export(&mut compositor, at).unwrap().unwrap();
    assert_eq!(artifact.file_name, "twibbon-1700000000123.png");

    let decoded = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (32, 32));
    // The fully opaque frame covers the photo everywhere.
    assert_eq!(decoded.get_pixel(16, 16).0, [0, 0, 255, 255]);
}

#[test]
fn preview_render_tolerates_absent_layers() {
    let s = session_with(None, None);
    let mut compositor = Compositor::new();
    let frame = s.render(&mut compositor).unwrap();
    assert_eq!((frame.width, frame.height), (32, 32));
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn drag_then_export_reflects_the_moved_photo() {
    let canvas = Canvas::new(32, 32).unwrap();
    let mut s = EditorSession::new(canvas);
    let t = s.begin_photo_upload();
    assert!(s.install_photo(t, Ok(solid(8, 8, [0, 255, 0, 255]))));
    s.set_scale(0.25); // 8x8 footprint on the 32x32 canvas

    // Displayed at half size: display deltas double in canvas space.
    let vp = Viewport::new(canvas, Point::ZERO, 16.0, 16.0).unwrap();
    s.pointer_down(Point::new(8.0, 8.0), &vp);
    s.pointer_move(Point::new(12.0, 8.0), &vp);
    s.pointer_up();
    assert_eq!((s.transform().x, s.transform().y), (24.0, 16.0));

    let mut compositor = Compositor::new();
    let out = s.render(&mut compositor).unwrap();
    let px = |x: u32, y: u32| {
        let i = ((y * out.width + x) * 4) as usize;
        <[u8; 4]>::try_from(&out.data[i..i + 4]).unwrap()
    };
    assert_eq!(px(24, 16), [0, 255, 0, 255]);
    assert_eq!(px(8, 16), [0, 0, 0, 0]);
}

#[test]
fn late_preset_decode_never_overwrites_a_newer_upload() {
    let mut s = session_with(Some(solid(8, 8, [255, 0, 0, 255])), None);
    let t_preset = s.select_preset_frame("frame3.png");
    let t_upload = s.begin_frame_upload();

    assert!(s.install_frame(t_upload, Ok(solid(4, 4, [0, 0, 255, 255]))));
    // The preset decode completes after the upload superseded it.
    assert!(!s.install_frame(t_preset, Ok(solid(2, 2, [9, 9, 9, 255]))));
    assert_eq!(s.frame().unwrap().width, 4);
}

#[test]
fn failed_frame_decode_leaves_export_gated_state_intact() {
    let mut s = session_with(
        Some(solid(8, 8, [255, 0, 0, 255])),
        Some(solid(8, 8, [0, 0, 255, 255])),
    );
    let t = s.begin_frame_upload();
    assert!(!s.install_frame(t, Err(TwibbonError::decode("corrupt upload"))));

    // The previous frame is still installed, so export still produces.
    let mut compositor = Compositor::new();
    assert!(
        s.export(&mut compositor, SystemTime::now())
            .unwrap()
            .is_some()
    );
}
