use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use nalgebra::{Matrix3, Vector3};

use crate::error::{ImageRole, SwapError};

/// Warp the user image into the template's coordinate frame.
///
/// With at least 4 key points on both sides the unique projective transform
/// through the first 4 correspondences is used; with 3 on both sides, the
/// affine transform through the first 3. Fewer than 3 points on either side
/// is an error. The output buffer has exactly `out_width` x `out_height`,
/// the template's dimensions; unmapped pixels stay black.
pub fn warp_to_template(
    user: &RgbImage,
    user_points: &[[f32; 2]],
    template_points: &[[f32; 2]],
    out_width: u32,
    out_height: u32,
) -> Result<RgbImage, SwapError> {
    if user_points.len() < 3 {
        return Err(SwapError::InsufficientLandmarks(ImageRole::User));
    }
    if template_points.len() < 3 {
        return Err(SwapError::InsufficientLandmarks(ImageRole::Template));
    }

    let projection = if user_points.len() >= 4 && template_points.len() >= 4 {
        projective_from_points(user_points, template_points)
    } else {
        affine_from_points(user_points, template_points)
    }
    // Degenerate correspondences (collinear or coincident points) admit no
    // unique transform; the points are present but unusable.
    .ok_or(SwapError::InsufficientLandmarks(ImageRole::User))?;

    let mut output = RgbImage::new(out_width, out_height);
    warp_into(
        user,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut output,
    );
    Ok(output)
}

/// Projective transform taking the first 4 source points onto the first 4
/// destination points.
fn projective_from_points(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Projection> {
    let from = [
        (src[0][0], src[0][1]),
        (src[1][0], src[1][1]),
        (src[2][0], src[2][1]),
        (src[3][0], src[3][1]),
    ];
    let to = [
        (dst[0][0], dst[0][1]),
        (dst[1][0], dst[1][1]),
        (dst[2][0], dst[2][1]),
        (dst[3][0], dst[3][1]),
    ];
    Projection::from_control_points(from, to)
}

/// Affine transform taking the first 3 source points onto the first 3
/// destination points, solved as two 3x3 linear systems.
fn affine_from_points(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Projection> {
    let m = Matrix3::new(
        src[0][0], src[0][1], 1.0,
        src[1][0], src[1][1], 1.0,
        src[2][0], src[2][1], 1.0,
    );
    let lu = m.lu();
    let xs = lu.solve(&Vector3::new(dst[0][0], dst[1][0], dst[2][0]))?;
    let ys = lu.solve(&Vector3::new(dst[0][1], dst[1][1], dst[2][1]))?;

    Projection::from_matrix([xs[0], xs[1], xs[2], ys[0], ys[1], ys[2], 0.0, 0.0, 1.0])
}
