use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use log::debug;

use crate::align;
use crate::blend;
use crate::error::{ImageRole, SwapError};
use crate::landmarks::{FaceMesh, LandmarkDetector};

/// Longest image side processed; larger inputs are downscaled first to
/// bound CPU cost.
pub const MAX_DIMENSION: u32 = 1024;

/// Classic face-swap pipeline: landmark detection on both images, geometric
/// alignment of the user's face onto the template, soft-mask blending and a
/// final contrast pass.
///
/// The detector is constructed by the caller and reused across invocations;
/// the engine itself keeps no per-request state, so independent engines may
/// run concurrently without coordination.
pub struct SwapEngine<D> {
    detector: D,
}

impl<D: LandmarkDetector> SwapEngine<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Swap at the byte boundary: decode both inputs, bound the working
    /// size, run the pipeline and encode the result as PNG.
    pub fn swap_bytes(&mut self, user: &[u8], template: &[u8]) -> Result<Vec<u8>, SwapError> {
        let user_img = decode(user, ImageRole::User)?;
        let template_img = decode(template, ImageRole::Template)?;

        let user_img = bound_size(user_img);
        let template_img = bound_size(template_img);

        let result = self.swap_images(&user_img, &template_img)?;

        let mut bytes = Vec::new();
        result
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(SwapError::Encode)?;
        Ok(bytes)
    }

    /// Run the pipeline on decoded images. The output has exactly the
    /// template's dimensions.
    pub fn swap_images(
        &mut self,
        user: &DynamicImage,
        template: &DynamicImage,
    ) -> Result<RgbImage, SwapError> {
        let user_mesh = self.detect(user, ImageRole::User)?;
        let template_mesh = self.detect(template, ImageRole::Template)?;

        let user_rgb = user.to_rgb8();
        let template_rgb = template.to_rgb8();
        let (width, height) = template_rgb.dimensions();

        let user_points = user_mesh.alignment_points(user_rgb.width(), user_rgb.height());
        let template_points = template_mesh.alignment_points(width, height);
        debug!(
            "alignment points: user={} template={}",
            user_points.len(),
            template_points.len()
        );

        let aligned =
            align::warp_to_template(&user_rgb, &user_points, &template_points, width, height)?;

        Ok(blend::composite(
            &aligned,
            &template_rgb,
            &user_mesh,
            &template_mesh,
        ))
    }

    fn detect(&mut self, image: &DynamicImage, role: ImageRole) -> Result<FaceMesh, SwapError> {
        self.detector
            .detect_landmarks(image)
            .map_err(SwapError::Detector)?
            .ok_or(SwapError::NoFaceDetected(role))
    }
}

fn decode(bytes: &[u8], role: ImageRole) -> Result<DynamicImage, SwapError> {
    image::load_from_memory(bytes).map_err(|source| SwapError::InvalidImage { role, source })
}

/// Downscale so the longest side is at most [`MAX_DIMENSION`], preserving
/// the aspect ratio. Smaller images pass through untouched.
fn bound_size(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let longest = width.max(height);
    if longest <= MAX_DIMENSION {
        return img;
    }
    let scale = MAX_DIMENSION as f32 / longest as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;
    debug!("downscaling {width}x{height} to {new_width}x{new_height}");
    img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
}
