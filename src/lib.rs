pub mod config;
pub mod template;

// Re-export vision types for convenience
pub use memeswap_vision::{FaceMesh, ImageRole, LandmarkDetector, MeshDetector, SwapEngine, SwapError};
