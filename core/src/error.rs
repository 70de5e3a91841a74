use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ChunkCount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Empty color string")]
    Empty,
    #[error("Invalid color {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// Construction-time failures, always raised before any step is applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Grid must have at least one chunk per axis")]
    EmptyGrid,
    #[error("Derived chunk size {width}x{height} is not positive")]
    NonPositiveChunkSize { width: f32, height: f32 },
    #[error("Prize bank requests {requested} positions but the grid only has {capacity}")]
    TooManyPrizes {
        requested: ChunkCount,
        capacity: ChunkCount,
    },
    #[error("Prize {0} is configured more than once")]
    DuplicatePrize(u32),
    #[error("Invalid color: {0}")]
    InvalidColor(#[from] ColorError),
    #[error("Could not parse configuration: {0}")]
    Parse(String),
}

/// Rendering and export failures; none of these touch game state.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Could not load image {uri:?}")]
    Load {
        uri: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Could not encode image: {0}")]
    Encode(String),
    #[error("Could not write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported image format {0:?}")]
    UnsupportedFormat(String),
    #[error("Cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
}
