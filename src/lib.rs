//! ChromaMarch path tracer
//!
//! Renders scenes described by signed distance fields: spheres, boxes and
//! cylinders with PBR materials, plus noise-driven cloud volumes. Rays are
//! sphere traced through the scene and shaded with a Monte-Carlo path
//! integrator; frames are rendered in parallel and blended progressively.

#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod accumulate;
pub mod camera;
pub mod cloud;
pub mod config;
pub mod environment;
pub mod error;
pub mod integrator;
pub mod interval;
pub mod light;
pub mod march;
pub mod material;
pub mod random;
pub mod ray;
pub mod renderer;
pub mod scene;
pub mod scenes;
pub mod sdf;
pub mod shading;
pub mod texture;
pub mod transform;

pub use config::Config;
pub use error::{Error, Result};
pub use renderer::Renderer;
