//! Core types for the PDF toolbox: source files, options, artifacts,
//! progress reporting, the `Tool` trait and the wizard state machine that
//! drives every tool through upload → configure → process → deliver.

pub mod artifact;
pub mod error;
pub mod options;
pub mod progress;
pub mod source;
pub mod tool;
pub mod wizard;
