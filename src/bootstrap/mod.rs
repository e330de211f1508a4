//! Image build and process launch.
//!
//! A build runs the recipe steps in order (workdir, dependencies, source,
//! environment, port) and writes `image.json` last. Launching an image
//! replaces the current process with the image command.

pub mod engine;
pub mod image;
pub mod installer;
pub mod launcher;
pub mod manifest;
pub mod materialize;

pub use engine::{Bootstrap, Phase};
pub use image::ImageConfig;
pub use launcher::Launcher;
pub use manifest::Manifest;
