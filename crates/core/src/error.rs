//! Error types for runout evaluation.

/// Errors that can occur while building grids or evaluating runout.
#[derive(Debug, Clone, PartialEq)]
pub enum RunoutError {
    /// Runout angle outside the open interval (0, 90) degrees
    InvalidAngle {
        /// The rejected angle in degrees
        degrees: f64,
    },
    /// Grid has zero width or height
    EmptyGrid,
    /// Elevation buffer length does not match width * height
    BufferSizeMismatch {
        /// Expected number of cells
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },
    /// Two grids that must be congruent have different dimensions
    DimensionMismatch {
        /// Expected (width, height)
        expected: (usize, usize),
        /// Actual (width, height)
        actual: (usize, usize),
    },
    /// Geotransform determinant is zero, cell lookup is impossible
    NonInvertibleTransform,
}

impl std::fmt::Display for RunoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunoutError::InvalidAngle { degrees } => {
                write!(f, "Runout angle {degrees} deg must be > 0 and < 90")
            }
            RunoutError::EmptyGrid => write!(f, "Grid must have nonzero width and height"),
            RunoutError::BufferSizeMismatch { expected, actual } => {
                write!(f, "Elevation buffer holds {actual} cells, expected {expected}")
            }
            RunoutError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Grid dimensions {}x{} do not match expected {}x{}",
                    actual.0, actual.1, expected.0, expected.1
                )
            }
            RunoutError::NonInvertibleTransform => {
                write!(f, "Geotransform is not invertible (zero determinant)")
            }
        }
    }
}

impl std::error::Error for RunoutError {}

/// Result type for runout operations.
pub type Result<T> = std::result::Result<T, RunoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RunoutError::InvalidAngle { degrees: 95.0 };
        assert!(err.to_string().contains("95"));

        let err = RunoutError::DimensionMismatch {
            expected: (10, 20),
            actual: (10, 21),
        };
        assert!(err.to_string().contains("10x21"));
        assert!(err.to_string().contains("10x20"));
    }
}
