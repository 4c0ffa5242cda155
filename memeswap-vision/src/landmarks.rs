use anyhow::Result;
use image::DynamicImage;

/// Number of points in a full face mesh.
pub const MESH_POINTS: usize = 468;

/// Mesh indices used for geometric alignment.
///
/// Eye corners, nose bridge and tip, mouth corners and eyebrows. The order
/// matters: the projective path takes the first 4 entries, the affine path
/// the first 3.
pub const ALIGNMENT_INDICES: [usize; 13] = [
    33, 133, // left eye corners
    362, 263, // right eye corners
    4, 5, 6, // nose bridge and tip
    61, 291, // mouth corners
    70, 105, // left eyebrow
    336, 300, // right eyebrow
];

/// Normalized facial landmarks for a single face.
///
/// Coordinates are proportions of the image in [0, 1], ordered by mesh
/// index. A full mesh has [`MESH_POINTS`] entries; detectors may produce
/// fewer.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMesh {
    points: Vec<[f32; 2]>,
}

impl FaceMesh {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Denormalize a single mesh point into pixel coordinates, or `None` if
    /// the mesh has no point at that index.
    pub fn pixel(&self, idx: usize, width: u32, height: u32) -> Option<[f32; 2]> {
        self.points
            .get(idx)
            .map(|p| [p[0] * width as f32, p[1] * height as f32])
    }

    /// Extract the alignment key points in pixel coordinates.
    ///
    /// Indices beyond the mesh length are skipped, so a truncated mesh
    /// yields a shorter point set.
    pub fn alignment_points(&self, width: u32, height: u32) -> Vec<[f32; 2]> {
        ALIGNMENT_INDICES
            .iter()
            .filter_map(|&idx| self.pixel(idx, width, height))
            .collect()
    }
}

/// Capability to locate facial landmarks in an image.
///
/// Implementations report the first detected face only and must be
/// deterministic for identical inputs. `None` means no face was found and
/// is not an error. The engine takes the detector by value so its lifetime
/// is managed by the caller.
pub trait LandmarkDetector {
    fn detect_landmarks(&mut self, image: &DynamicImage) -> Result<Option<FaceMesh>>;
}
