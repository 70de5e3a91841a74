//! Grid reveal contests.
//!
//! A field of chunks hides prizes drawn from a prize bank. Players submit
//! steps that reveal chunks, every submission is frozen into a snapshot, and
//! any snapshot can be rendered to PNG.

pub use bank::*;
pub use chunk::*;
pub use color::*;
pub use config::*;
pub use contest::*;
pub use engine::*;
pub use error::*;
pub use geometry::*;
pub use notify::*;
pub use render::*;
pub use snapshot::*;
pub use types::*;

mod bank;
mod chunk;
mod color;
mod config;
mod contest;
mod engine;
mod error;
mod geometry;
mod notify;
mod render;
mod snapshot;
mod types;
