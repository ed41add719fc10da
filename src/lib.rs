//! # Disparity Computation
//!
//! This crate provides dense disparity map computation for rectified stereo pairs, using block
//! matching on the Sum of Squared Differences, and a left-right consistency check of the
//! resulting maps.
//!
//! # Features
//!
//! - `rayon` – computes the rows of each cost slice in parallel, and the left and right
//!   referenced searches concurrently. Results are bit-identical to the sequential build.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod consistency;
pub mod cost;
mod disparity;
mod error;
pub mod ssd;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::consistency::{Consistency, ConsistencyResult, FusedDisparityMap, ValidityMask};
    pub use crate::cost::CostField;
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap, Region, Side, StereoPair};
    pub use crate::error::{Error, Result};
    pub use crate::ssd::{Params, SsdBlockMatcher};
}
