use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::landmarks::FaceMesh;

/// Mesh indices along the jawline, in outline order.
const JAWLINE: std::ops::RangeInclusive<usize> = 0..=16;
/// Mesh indices approximating the forehead once lifted upward.
const FOREHEAD: [usize; 6] = [19, 24, 151, 337, 338, 396];
/// Vertical lift applied to the forehead points, in pixels.
const FOREHEAD_LIFT: f32 = 30.0;

/// Build the soft face-region mask for an image of the given dimensions.
///
/// The outline runs along the 17 jawline points and closes over the 6
/// forehead points lifted 30 px above their detected positions. The filled
/// polygon is smoothed with an 11x11 Gaussian (sigma 10). Returns `None`
/// when the mesh cannot supply a usable outline; the compositor falls back
/// to a circular mask in that case.
pub fn build_face_mask(mesh: &FaceMesh, width: u32, height: u32) -> Option<GrayImage> {
    let mut outline: Vec<Point<i32>> = Vec::with_capacity(17 + FOREHEAD.len());
    for idx in JAWLINE {
        let [x, y] = mesh.pixel(idx, width, height)?;
        outline.push(Point::new(x as i32, y as i32));
    }
    for &idx in &FOREHEAD {
        let [x, y] = mesh.pixel(idx, width, height)?;
        outline.push(Point::new(x as i32, (y - FOREHEAD_LIFT) as i32));
    }

    // draw_polygon_mut rejects an explicitly closed outline and coincident
    // neighbours; a collapsed outline has no interior to fill.
    outline.dedup();
    if outline.len() < 3 || outline.first() == outline.last() {
        return None;
    }

    let mut mask = GrayImage::new(width, height);
    draw_polygon_mut(&mut mask, &outline, Luma([255]));
    Some(gaussian_blur(&mask, 11, 10.0))
}

/// Gaussian blur with an explicit odd kernel size, applied separably with
/// reflected borders.
pub fn gaussian_blur(mask: &GrayImage, ksize: usize, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(ksize, sigma);
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i32, height as i32);
    let half = (ksize / 2) as i32;

    let mut horizontal = vec![0.0f32; (width * height) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect(x + k as i32 - half, w);
                acc += weight * mask.get_pixel(sx, y as u32)[0] as f32;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect(y + k as i32 - half, h) as i32;
                acc += weight * horizontal[(sy * w + x) as usize];
            }
            out.put_pixel(x as u32, y as u32, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

fn gaussian_kernel(ksize: usize, sigma: f32) -> Vec<f32> {
    debug_assert!(ksize % 2 == 1, "kernel size must be odd");
    let half = (ksize / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

// Reflect-101 border indexing (edge pixel not repeated).
fn reflect(i: i32, n: i32) -> u32 {
    if n == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::MESH_POINTS;

    fn face_mesh() -> FaceMesh {
        let mut points = vec![[0.5, 0.5]; MESH_POINTS];
        for i in 0..=16 {
            let t = i as f32 / 16.0;
            points[i] = [0.2 + 0.6 * t, 0.6 + 0.2 * (std::f32::consts::PI * t).sin()];
        }
        // Right to left, so jawline plus forehead close into a simple loop.
        for (k, &idx) in FOREHEAD.iter().enumerate() {
            points[idx] = [0.75 - 0.1 * k as f32, 0.4];
        }
        FaceMesh::new(points)
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        for (ksize, sigma) in [(11, 10.0), (11, 5.0), (21, 11.0)] {
            let kernel = gaussian_kernel(ksize, sigma);
            assert_eq!(kernel.len(), ksize);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            for i in 0..ksize / 2 {
                assert!((kernel[i] - kernel[ksize - 1 - i]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_blur_preserves_flat_regions() {
        let flat = GrayImage::from_pixel(32, 32, Luma([200]));
        let blurred = gaussian_blur(&flat, 11, 10.0);
        for pixel in blurred.pixels() {
            assert_eq!(pixel[0], 200);
        }
    }

    #[test]
    fn test_blur_removes_sharp_steps() {
        // Hard 0/255 vertical edge; after blurring no adjacent pair may
        // differ by more than a single kernel tap's worth.
        let step = GrayImage::from_fn(64, 64, |x, _| Luma([if x < 32 { 0 } else { 255 }]));
        let blurred = gaussian_blur(&step, 11, 10.0);
        for y in 0..64 {
            for x in 0..63 {
                let a = blurred.get_pixel(x, y)[0] as i16;
                let b = blurred.get_pixel(x + 1, y)[0] as i16;
                assert!((a - b).abs() <= 40, "step of {} at ({x}, {y})", (a - b).abs());
            }
        }
    }

    #[test]
    fn test_mask_covers_face_region_softly() {
        let mask = build_face_mask(&face_mesh(), 200, 200).expect("mask");
        assert_eq!(mask.dimensions(), (200, 200));

        // Interior of the outline saturates, far corners stay empty.
        assert_eq!(mask.get_pixel(100, 110)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(195, 195)[0], 0);

        for y in 0..200 {
            for x in 0..199 {
                let a = mask.get_pixel(x, y)[0] as i16;
                let b = mask.get_pixel(x + 1, y)[0] as i16;
                assert!((a - b).abs() <= 40);
            }
        }
    }

    #[test]
    fn test_short_mesh_yields_no_mask() {
        assert!(build_face_mask(&FaceMesh::new(vec![[0.5, 0.5]; 7]), 100, 100).is_none());
        assert!(build_face_mask(&FaceMesh::new(vec![]), 100, 100).is_none());
    }

    #[test]
    fn test_collapsed_outline_yields_no_mask() {
        let points = vec![[0.5, 0.5]; MESH_POINTS];
        assert!(build_face_mask(&FaceMesh::new(points), 100, 100).is_none());
    }
}
