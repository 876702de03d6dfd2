//! Panel view transforms.

mod camera;

pub use camera::{OrbitCamera, UvView};
