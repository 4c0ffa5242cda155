use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use log::debug;

use crate::landmarks::FaceMesh;
use crate::mask::{build_face_mask, gaussian_blur};

/// Weight of the warped face in the colour pre-correction blend; the
/// template contributes the remainder.
const COLOR_CORRECTION_FACE_WEIGHT: f32 = 0.8;
/// Scale and offset of the final contrast/brightness pass.
const CONTRAST_SCALE: f32 = 1.1;
const BRIGHTNESS_OFFSET: f32 = 5.0;
/// Fallback circle radius as a multiple of the landmark spread.
const FALLBACK_RADIUS_FACTOR: f32 = 2.5;

/// Blend the aligned user face into the template.
///
/// Builds a face mask from each mesh, intersects them and re-smooths the
/// result; when either mask cannot be built, a blurred circle around the
/// template landmarks takes its place so blending always proceeds. The
/// warped face is pre-blended toward the template's colour grading, alpha
/// composited through the mask, and finished with a linear contrast pass.
pub fn composite(
    aligned: &RgbImage,
    template: &RgbImage,
    user_mesh: &FaceMesh,
    template_mesh: &FaceMesh,
) -> RgbImage {
    let (width, height) = template.dimensions();

    // Both masks live in the template's frame: the warped face already does,
    // and the user mesh is denormalized against the template's dimensions.
    let user_mask = build_face_mask(user_mesh, width, height);
    let template_mask = build_face_mask(template_mesh, width, height);

    let mask = match (user_mask, template_mask) {
        (Some(user), Some(template_m)) => gaussian_blur(&intersect(&user, &template_m), 11, 5.0),
        _ => {
            debug!("face masks unavailable, falling back to circular mask");
            fallback_circle_mask(template_mesh, width, height)
        }
    };

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let alpha = mask.get_pixel(x, y)[0] as f32 / 255.0;
        let face = aligned.get_pixel(x, y);
        let base = template.get_pixel(x, y);
        for c in 0..3 {
            let corrected = (COLOR_CORRECTION_FACE_WEIGHT * face[c] as f32
                + (1.0 - COLOR_CORRECTION_FACE_WEIGHT) * base[c] as f32)
                .round();
            let blended =
                (corrected * alpha + base[c] as f32 * (1.0 - alpha)).clamp(0.0, 255.0) as u8;
            pixel[c] = (CONTRAST_SCALE * blended as f32 + BRIGHTNESS_OFFSET)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Pixel-wise minimum of two masks.
fn intersect(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        *pixel = Luma([a.get_pixel(x, y)[0].min(b.get_pixel(x, y)[0])]);
    }
    out
}

/// Circular mask centred on the template's alignment points, with radius
/// 2.5x the larger per-axis spread, blurred with a 21x21 Gaussian (sigma 11).
fn fallback_circle_mask(template_mesh: &FaceMesh, width: u32, height: u32) -> GrayImage {
    let points = template_mesh.alignment_points(width, height);
    let mut mask = GrayImage::new(width, height);
    if points.is_empty() {
        return mask;
    }

    let n = points.len() as f32;
    let (mut cx, mut cy) = (0.0f32, 0.0f32);
    for p in &points {
        cx += p[0];
        cy += p[1];
    }
    cx /= n;
    cy /= n;

    let (mut var_x, mut var_y) = (0.0f32, 0.0f32);
    for p in &points {
        var_x += (p[0] - cx) * (p[0] - cx);
        var_y += (p[1] - cy) * (p[1] - cy);
    }
    let spread = (var_x / n).sqrt().max((var_y / n).sqrt());
    let radius = (FALLBACK_RADIUS_FACTOR * spread) as i32;

    draw_filled_circle_mut(&mut mask, (cx as i32, cy as i32), radius, Luma([255]));
    gaussian_blur(&mask, 21, 11.0)
}
