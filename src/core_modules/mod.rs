pub mod contour;
pub mod frame;
pub mod frame_window;
pub mod motion_history;
pub mod motion_mask;
pub mod object_extractor;
pub mod overlay;
pub mod utils;
pub mod weighted_centroid;
