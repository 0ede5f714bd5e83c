//! Data models for the generation service

pub mod image;

pub use image::{ImageError, ImageFormat, ImagePayload};
