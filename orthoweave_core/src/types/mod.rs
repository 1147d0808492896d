//! Value types shared across the workspace: tiles, pixel bounding boxes and
//! world-file records.

mod pixel_bbox;
pub use pixel_bbox::*;

mod tile;
pub use tile::*;

mod world_file;
pub use world_file::*;
