use thiserror::Error;

/// Which of the two input images a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    User,
    Template,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRole::User => write!(f, "user"),
            ImageRole::Template => write!(f, "template"),
        }
    }
}

/// Failures of the swap pipeline.
///
/// Mask construction is deliberately absent: a mask that cannot be built is
/// recovered internally with the circular fallback and never surfaces here.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid {role} image: {source}")]
    InvalidImage {
        role: ImageRole,
        #[source]
        source: image::ImageError,
    },

    /// No face was found in the image. Distinct from
    /// [`SwapError::InsufficientLandmarks`] so callers can phrase the two
    /// situations differently.
    #[error("no face detected in the {0} image")]
    NoFaceDetected(ImageRole),

    /// A face was found but fewer than 3 usable alignment points could be
    /// extracted from it.
    #[error("could not extract enough facial landmarks from the {0} image")]
    InsufficientLandmarks(ImageRole),

    #[error("landmark detector failed")]
    Detector(#[source] anyhow::Error),

    #[error("encoding result image")]
    Encode(#[source] image::ImageError),
}
