//! CLI command handlers. Each command is in its own file.

mod get;
mod image;
mod split;

pub use get::{run_get, GetRequest};
pub use image::run_image;
pub use split::run_split;
