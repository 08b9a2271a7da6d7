//! Grid aggregation of detections for rendering and export

mod grid;
mod render;

pub use self::grid::{Anchored, DetectionGrid, GridCell, GridItem};
pub use self::render::{annotation_file_name, clamp_inside, item_window, CellRenderer, BOX_COLOUR};
