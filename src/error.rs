//! # Error standards
//! 
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Precondition violations raised before any computation starts.
///
/// Every operation in this crate either produces a complete output for its documented valid
/// region or fails with one of these before allocating anything.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Image dimensions differ: expected {expected:?}, found {found:?}")]
    InvalidDimensions {
        expected: (u32, u32),
        found: (u32, u32)
    },

    #[error("Maximum disparity must be greater than zero")]
    ZeroMaxDisparity,

    #[error("Maximum disparity {0} cannot be stored in an 8-bit disparity map (limit is 256)")]
    MaxDisparityTooLarge(usize),

    #[error(
        "Window half size {window_half_size} does not fit in a {width}x{height} image \
        (2 * half size + 1 must not exceed the smaller dimension)"
    )]
    WindowTooLarge {
        window_half_size: usize,
        width: u32,
        height: u32
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String)
}

impl Error {
    /// Build an `InvalidDimensions` error from two `(width, height)` pairs.
    pub(crate) fn dimensions(expected: (u32, u32), found: (u32, u32)) -> Self {
        Error::InvalidDimensions { expected, found }
    }
}
