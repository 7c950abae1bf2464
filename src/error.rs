// src/error.rs

use thiserror::Error;

use crate::types::LaneSide;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LaneError {
    #[error("Degenerate {side} lane geometry (averaged slope {slope})")]
    DegenerateGeometry { side: LaneSide, slope: f64 },

    #[error("Frame is empty or unreadable")]
    EmptyFrame,

    #[error("Failed to open video source '{source_name}'")]
    VideoOpen { source_name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
