//! Photo-frame compositor.
//!
//! Layers a user photo beneath a decorative frame image. The frame dictates
//! the output resolution exactly; the photo is cover-fitted (scaled to fill,
//! overflow cropped, centered) underneath, and the frame is drawn unscaled
//! at the origin on top, its transparent cutouts letting the photo through.
//!
//! A photo or frame that fails to decode is an explicit error; callers are
//! never left waiting on an operation that cannot complete.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::imageops::FilterType;
use image::{imageops, GenericImageView, ImageFormat, RgbaImage};

/// Errors from composing a framed photo.
#[derive(Debug)]
pub enum CompositeError {
    /// The photo could not be decoded.
    PhotoDecode(String),
    /// The frame could not be decoded.
    FrameDecode(String),
    /// The frame has a zero dimension.
    EmptyFrame,
    /// PNG encoding of the result failed.
    Encode(String),
}

impl std::fmt::Display for CompositeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeError::PhotoDecode(e) => write!(f, "Failed to decode photo: {}", e),
            CompositeError::FrameDecode(e) => write!(f, "Failed to decode frame: {}", e),
            CompositeError::EmptyFrame => write!(f, "Frame image has zero dimensions"),
            CompositeError::Encode(e) => write!(f, "Failed to encode composite: {}", e),
        }
    }
}

impl std::error::Error for CompositeError {}

/// Cover-fit placement of a photo inside a canvas: the scaled size and the
/// centered crop window that matches the canvas exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverFit {
    pub width: u32,
    pub height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
}

/// Computes the cover fit of a `photo_w`×`photo_h` image into a
/// `canvas_w`×`canvas_h` canvas.
///
/// A photo relatively wider than the canvas is scaled to the canvas height
/// and cropped equally left and right; a relatively taller (or equal) photo
/// is scaled to the canvas width and cropped equally top and bottom.
pub fn cover_fit(photo_w: u32, photo_h: u32, canvas_w: u32, canvas_h: u32) -> CoverFit {
    let photo_ratio = photo_w as f64 / photo_h as f64;
    let canvas_ratio = canvas_w as f64 / canvas_h as f64;

    if photo_ratio > canvas_ratio {
        // Ceil so the scaled photo always covers the full canvas width.
        let width = ((canvas_h as f64 * photo_ratio).ceil() as u32).max(canvas_w);
        CoverFit {
            width,
            height: canvas_h,
            crop_x: (width - canvas_w) / 2,
            crop_y: 0,
        }
    } else {
        let height = ((canvas_w as f64 / photo_ratio).ceil() as u32).max(canvas_h);
        CoverFit {
            width: canvas_w,
            height,
            crop_x: 0,
            crop_y: (height - canvas_h) / 2,
        }
    }
}

/// Composes a photo under a frame. The output has exactly the frame's
/// pixel dimensions.
pub fn compose(photo_bytes: &[u8], frame_bytes: &[u8]) -> Result<RgbaImage, CompositeError> {
    let frame = image::load_from_memory(frame_bytes)
        .map_err(|e| CompositeError::FrameDecode(e.to_string()))?;
    let photo = image::load_from_memory(photo_bytes)
        .map_err(|e| CompositeError::PhotoDecode(e.to_string()))?;

    let (canvas_w, canvas_h) = frame.dimensions();
    if canvas_w == 0 || canvas_h == 0 {
        return Err(CompositeError::EmptyFrame);
    }

    let fit = cover_fit(photo.width(), photo.height(), canvas_w, canvas_h);
    let scaled = photo
        .resize_exact(fit.width, fit.height, FilterType::Triangle)
        .to_rgba8();

    // The cropped photo fills the canvas completely and becomes the bottom
    // layer; the frame goes on top, unscaled, at the origin.
    let mut canvas =
        imageops::crop_imm(&scaled, fit.crop_x, fit.crop_y, canvas_w, canvas_h).to_image();
    imageops::overlay(&mut canvas, &frame.to_rgba8(), 0, 0);

    Ok(canvas)
}

/// Composes and encodes to PNG bytes.
pub fn compose_to_png(photo_bytes: &[u8], frame_bytes: &[u8]) -> Result<Vec<u8>, CompositeError> {
    let canvas = compose(photo_bytes, frame_bytes)?;
    encode_png(&canvas)
}

/// Composes and encodes to a `data:image/png;base64,` URL, the form the
/// site hands to download links.
pub fn compose_to_data_url(
    photo_bytes: &[u8],
    frame_bytes: &[u8],
) -> Result<String, CompositeError> {
    let png = compose_to_png(photo_bytes, frame_bytes)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let mut buffer = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CompositeError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Frame with an opaque 2px red border and a transparent center.
    fn test_frame(w: u32, h: u32) -> Vec<u8> {
        let mut frame = RgbaImage::new(w, h);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            *pixel = if x < 2 || y < 2 || x >= w - 2 || y >= h - 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            };
        }
        encode_png(&frame).unwrap()
    }

    fn solid_photo(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let photo = RgbaImage::from_pixel(w, h, Rgba(color));
        encode_png(&photo).unwrap()
    }

    #[test]
    fn test_output_matches_frame_dimensions() {
        let frame = test_frame(40, 30);
        for (pw, ph) in [(100, 100), (10, 400), (400, 10), (40, 30)] {
            let photo = solid_photo(pw, ph, [0, 0, 255, 255]);
            let out = compose(&photo, &frame).unwrap();
            assert_eq!((out.width(), out.height()), (40, 30));
        }
    }

    #[test]
    fn test_frame_pixels_render_unchanged_on_top() {
        let frame = test_frame(40, 30);
        let photo = solid_photo(100, 100, [0, 0, 255, 255]);
        let out = compose(&photo, &frame).unwrap();

        // Border pixels come from the frame source.
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(39, 29), &Rgba([255, 0, 0, 255]));
        // The transparent cutout shows the photo.
        assert_eq!(out.get_pixel(20, 15), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_cover_fit_wider_photo_crops_sides_equally() {
        // 200x100 photo into 100x100 canvas: scale to height, crop 50/side.
        let fit = cover_fit(200, 100, 100, 100);
        assert_eq!(
            fit,
            CoverFit {
                width: 200,
                height: 100,
                crop_x: 50,
                crop_y: 0
            }
        );
    }

    #[test]
    fn test_cover_fit_taller_photo_crops_top_and_bottom() {
        let fit = cover_fit(100, 300, 100, 100);
        assert_eq!(
            fit,
            CoverFit {
                width: 100,
                height: 300,
                crop_x: 0,
                crop_y: 100
            }
        );
    }

    #[test]
    fn test_cover_fit_equal_ratio_scales_to_width() {
        let fit = cover_fit(50, 50, 100, 100);
        assert_eq!(
            fit,
            CoverFit {
                width: 100,
                height: 100,
                crop_x: 0,
                crop_y: 0
            }
        );
    }

    #[test]
    fn test_cover_fit_always_covers_canvas() {
        for (pw, ph) in [(7, 13), (13, 7), (1920, 1080), (333, 999)] {
            let fit = cover_fit(pw, ph, 640, 480);
            assert!(fit.width >= 640);
            assert!(fit.height >= 480);
            assert!(fit.crop_x + 640 <= fit.width);
            assert!(fit.crop_y + 480 <= fit.height);
        }
    }

    #[test]
    fn test_undecodable_inputs_fail_explicitly() {
        let frame = test_frame(10, 10);
        let garbage = b"not an image at all";

        assert!(matches!(
            compose(garbage, &frame),
            Err(CompositeError::PhotoDecode(_))
        ));
        let photo = solid_photo(10, 10, [1, 2, 3, 255]);
        assert!(matches!(
            compose(&photo, garbage),
            Err(CompositeError::FrameDecode(_))
        ));
    }

    #[test]
    fn test_data_url_prefix() {
        let frame = test_frame(8, 8);
        let photo = solid_photo(16, 16, [0, 255, 0, 255]);
        let url = compose_to_data_url(&photo, &frame).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
