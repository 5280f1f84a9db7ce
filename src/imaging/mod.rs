//! 图片后处理

pub mod editor;

pub use editor::{BrandFilter, ImageEditor, ImageError};
