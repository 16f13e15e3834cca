use thiserror::Error;

use crate::shaders::Stage;
use crate::types::ShaderVariant;

/// Failures that prevent a render session from starting or continuing.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no graphics context available: {0}")]
    NoContext(String),

    #[error("{stage} shader for {variant} failed to compile:\n{log}")]
    Compile {
        stage: Stage,
        variant: ShaderVariant,
        log: String,
    },

    #[error("program for {variant} failed to link:\n{log}")]
    Link { variant: ShaderVariant, log: String },

    #[error("render session has been disposed")]
    Disposed,
}

/// Per-frame failures reported by the graphics device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("surface lost or outdated")]
    Lost,

    #[error("timed out acquiring the next surface texture")]
    Timeout,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("frame failed: {0}")]
    Other(String),
}

impl FrameError {
    /// Whether the session can keep drawing after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::Lost | FrameError::Timeout)
    }
}

/// Reasons a CPU still cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StillError {
    #[error("still size {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}
