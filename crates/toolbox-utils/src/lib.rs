//! Shared helpers: ZIP containers, text decoding, XML, PDF access and PDF images.

pub mod archive;
pub mod encoding;
pub mod images;
pub mod pdf;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
