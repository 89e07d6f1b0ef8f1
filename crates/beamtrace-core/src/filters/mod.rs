pub mod gaussian_blur;
pub mod median;

pub use gaussian_blur::gaussian_blur_with_radius;
pub use median::median_filter_3x3;
