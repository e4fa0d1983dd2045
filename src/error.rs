use crate::{ColorComponent, CompressionFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// A byte span, output slice, or pixel buffer does not have the length
    /// required by the format or the image dimensions.
    ///
    /// This is always detected before any block is encoded or decoded.
    InvalidInputSize { expected: usize, actual: usize },
    /// The format cannot be used with the requested pixel type.
    ///
    /// E.g. BC6H blocks only encode/decode [`HdrTile`](crate::HdrTile)s, and
    /// all other formats only encode/decode [`RgbaTile`](crate::RgbaTile)s.
    UnsupportedFormat(CompressionFormat),
    /// The channel selection is not supported for the given format.
    ///
    /// E.g. BC5 requires two distinct channels, and luminance cannot be used
    /// as a BC5 decode target.
    UnsupportedComponent {
        format: CompressionFormat,
        component: ColorComponent,
    },
    /// The operation was aborted through the cancellation flag of its
    /// [`OperationContext`](crate::OperationContext).
    ///
    /// This is not a failure of the codec. Blocks that were already produced
    /// are valid, but the output as a whole must not be used.
    Cancelled,
    /// The worker pool for parallel execution could not be created.
    ThreadPool(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::InvalidInputSize { expected, actual } => {
                write!(
                    f,
                    "Invalid input size: expected {} bytes/elements, got {}",
                    expected, actual
                )
            }
            CodecError::UnsupportedFormat(format) => {
                write!(f, "Format {:?} is not supported for this operation", format)
            }
            CodecError::UnsupportedComponent { format, component } => {
                write!(
                    f,
                    "Component {:?} is not supported for format {:?}",
                    component, format
                )
            }
            CodecError::Cancelled => write!(f, "The operation was cancelled"),
            CodecError::ThreadPool(message) => {
                write!(f, "Failed to create worker pool: {}", message)
            }
        }
    }
}
impl std::error::Error for CodecError {}

#[cfg(feature = "rayon")]
impl From<rayon::ThreadPoolBuildError> for CodecError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        CodecError::ThreadPool(value.to_string())
    }
}
