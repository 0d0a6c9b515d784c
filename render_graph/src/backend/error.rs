//! Backend error types.

use std::fmt;

use super::QueueType;

/// Errors reported by a [`GpuBackend`](super::GpuBackend) or one of its
/// encoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not open a command encoder.
    EncoderCreationFailed(String),
    /// An encoder was closed twice.
    EncoderAlreadyClosed(String),
    /// An encoder was submitted before being closed.
    EncoderNotClosed(String),
    /// An encoder created by a different backend was submitted.
    ForeignEncoder,
    /// An encoder was submitted to a queue other than the one it records for.
    QueueMismatch {
        label: String,
        opened: QueueType,
        submitted: QueueType,
    },
    /// The queue rejected the submission.
    SubmissionFailed(String),
    /// The GPU device was lost.
    DeviceLost,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncoderCreationFailed(msg) => write!(f, "encoder creation failed: {msg}"),
            Self::EncoderAlreadyClosed(label) => write!(f, "encoder {label} is already closed"),
            Self::EncoderNotClosed(label) => write!(f, "encoder {label} submitted while open"),
            Self::ForeignEncoder => write!(f, "encoder belongs to a different backend"),
            Self::QueueMismatch {
                label,
                opened,
                submitted,
            } => write!(
                f,
                "encoder {label} records for {opened:?} but was submitted to {submitted:?}"
            ),
            Self::SubmissionFailed(msg) => write!(f, "submission failed: {msg}"),
            Self::DeviceLost => write!(f, "GPU device lost"),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::DeviceLost;
        assert_eq!(err.to_string(), "GPU device lost");

        let err = BackendError::EncoderNotClosed("gbuffer".to_string());
        assert_eq!(err.to_string(), "encoder gbuffer submitted while open");

        let err = BackendError::QueueMismatch {
            label: "ssao".to_string(),
            opened: QueueType::Compute,
            submitted: QueueType::Graphics,
        };
        assert_eq!(
            err.to_string(),
            "encoder ssao records for Compute but was submitted to Graphics"
        );
    }
}
