//! Face-mesh landmark detector backed by an ONNX model.
//!
//! The model takes a 192x192 crop and predicts a dense fixed-length mesh of
//! facial points (468 x/y/z triples, pixel coordinates on the model input)
//! plus a face-presence score. The whole image is letterboxed into the
//! input square, so detection covers a single centred face.

use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::{session::Session, value::Value};

use crate::landmarks::{FaceMesh, LandmarkDetector, MESH_POINTS};

/// Square input size the face-mesh model expects.
const MESH_INPUT_SIZE: u32 = 192;
/// Minimum face-presence probability to accept the mesh.
const MIN_FACE_SCORE: f32 = 0.5;

pub struct MeshDetector {
    session: Session,
}

impl MeshDetector {
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            session: crate::model::mesh_session(path)?,
        })
    }

    fn run(&mut self, img: &DynamicImage) -> Result<Option<FaceMesh>> {
        let (orig_width, orig_height) = img.dimensions();
        let lb = letterbox(orig_width, orig_height, MESH_INPUT_SIZE);

        // Resize maintaining aspect ratio, then paste onto a square canvas
        let resized = img.resize_exact(
            lb.scaled_width,
            lb.scaled_height,
            image::imageops::FilterType::Triangle,
        );
        let mut canvas = DynamicImage::new_rgb8(MESH_INPUT_SIZE, MESH_INPUT_SIZE);
        image::imageops::overlay(&mut canvas, &resized, lb.offset_x as i64, lb.offset_y as i64);
        let rgb = canvas.to_rgb8();

        // NHWC tensor, RGB scaled to [0, 1]
        let size = MESH_INPUT_SIZE as usize;
        let mut input_data = Vec::with_capacity(size * size * 3);
        for px in rgb.pixels() {
            input_data.push(px[0] as f32 / 255.0);
            input_data.push(px[1] as f32 / 255.0);
            input_data.push(px[2] as f32 / 255.0);
        }
        let input_array = Array4::from_shape_vec((1, size, size, 3), input_data)?;
        let input_tensor = Value::from_array(input_array)?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;

        // Output naming varies across face-mesh exports; identify the
        // landmark and score tensors by element count.
        let mut coords: Option<Vec<f32>> = None;
        let mut raw_score: Option<f32> = None;
        for (_name, output) in outputs.iter() {
            let (_shape, data) = output.try_extract_tensor::<f32>()?;
            if data.len() >= MESH_POINTS * 3 {
                coords = Some(data.to_vec());
            } else if data.len() == 1 {
                raw_score = Some(data[0]);
            }
        }
        let coords = coords.context("face mesh model returned no landmark tensor")?;

        if let Some(raw) = raw_score {
            if sigmoid(raw) < MIN_FACE_SCORE {
                return Ok(None);
            }
        }

        // Coordinates are pixels on the model input; undo the letterbox and
        // normalize by the source dimensions.
        let mut points = Vec::with_capacity(MESH_POINTS);
        for i in 0..MESH_POINTS {
            let x = (coords[i * 3] - lb.offset_x as f32) / lb.scale / orig_width as f32;
            let y = (coords[i * 3 + 1] - lb.offset_y as f32) / lb.scale / orig_height as f32;
            points.push([x, y]);
        }

        Ok(Some(FaceMesh::new(points)))
    }
}

impl LandmarkDetector for MeshDetector {
    fn detect_landmarks(&mut self, image: &DynamicImage) -> Result<Option<FaceMesh>> {
        self.run(image)
    }
}

/// Geometry of an aspect-preserving paste onto a square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    scaled_width: u32,
    scaled_height: u32,
    offset_x: u32,
    offset_y: u32,
}

fn letterbox(width: u32, height: u32, target: u32) -> Letterbox {
    let max_dim = width.max(height);
    let scale = target as f32 / max_dim as f32;
    let scaled_width = (width as f32 * scale) as u32;
    let scaled_height = (height as f32 * scale) as u32;
    Letterbox {
        scale,
        scaled_width,
        scaled_height,
        offset_x: (target - scaled_width) / 2,
        offset_y: (target - scaled_height) / 2,
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_landscape() {
        let lb = letterbox(640, 480, 192);
        assert_eq!(lb.scaled_width, 192);
        assert_eq!(lb.scaled_height, 144);
        assert_eq!(lb.offset_x, 0);
        assert_eq!(lb.offset_y, 24);
    }

    #[test]
    fn test_letterbox_portrait() {
        let lb = letterbox(480, 960, 192);
        assert_eq!(lb.scaled_width, 96);
        assert_eq!(lb.scaled_height, 192);
        assert_eq!(lb.offset_x, 48);
        assert_eq!(lb.offset_y, 0);
    }

    #[test]
    fn test_letterbox_square_is_identity_paste() {
        let lb = letterbox(192, 192, 192);
        assert_eq!(lb.scale, 1.0);
        assert_eq!(lb.offset_x, 0);
        assert_eq!(lb.offset_y, 0);
    }

    #[test]
    fn test_letterbox_roundtrip_recovers_coordinates() {
        let lb = letterbox(800, 600, 192);
        // A point at (400, 300) in the source lands at the canvas centre;
        // undoing the letterbox and normalizing recovers (0.5, 0.5).
        let canvas_x = 400.0 * lb.scale + lb.offset_x as f32;
        let canvas_y = 300.0 * lb.scale + lb.offset_y as f32;
        let nx = (canvas_x - lb.offset_x as f32) / lb.scale / 800.0;
        let ny = (canvas_y - lb.offset_y as f32) / lb.scale / 600.0;
        assert!((nx - 0.5).abs() < 1e-6);
        assert!((ny - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!(sigmoid(0.0) - 0.5 < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
