pub mod axis_estimator;
pub mod axis_sampler;
pub mod color_mask;
pub mod contour_extractor;
pub mod deflection_tracker;
pub mod error;
pub mod hsv_pixel;
pub mod oriented_rect;
pub mod region;
pub mod utils;
