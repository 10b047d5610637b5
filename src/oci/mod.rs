mod error;
mod models;
mod rewrite;

pub use error::ImageRefError;
pub use models::{has_image_ref_prefix, ImageSuffix, LocalImageReference};
pub use rewrite::{replace_image_ref_prefix, NamespaceMapping};
