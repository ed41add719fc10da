//! # SSD block matching
//!
//! Dense disparity by exhaustive block matching. Every candidate shift in `0..max_disparity`
//! produces a [`CostField`], and each interior pixel keeps the shift with the strictly smallest
//! Sum of Squared Differences seen so far. Shifts are folded in increasing order, so equal costs
//! resolve to the smallest shift.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::consistency::{self, ConsistencyResult};
use crate::cost::{check_window, cost_slice, CostField};
use crate::disparity::{DisparityAlgorithm, DisparityMap, Side, StereoPair};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Largest number of shifts an 8-bit disparity map can represent.
pub const MAX_DISPARITY_LIMIT: usize = u8::MAX as usize + 1;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// SSD block matcher over a rectified stereo pair.
#[derive(Debug, Clone)]
pub struct SsdBlockMatcher {
    params: Params
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Exclusive upper bound on the searched shift.
    pub max_disparity: usize,

    /// Half the side length of the square correlation window.
    pub window_half_size: usize
}

/// Accumulator of the shift fold: the running minimum cost and the disparity that produced it.
#[derive(Debug, Clone)]
pub struct SearchState {
    min_cost: CostField,
    map: DisparityMap
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_disparity: 16,
            window_half_size: 3
        }
    }
}

impl Params {
    /// Check the parameters against the dimensions of the images they will be used on.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.max_disparity == 0 {
            return Err(Error::ZeroMaxDisparity);
        }

        if self.max_disparity > MAX_DISPARITY_LIMIT {
            return Err(Error::MaxDisparityTooLarge(self.max_disparity));
        }

        check_window(width, height, self.window_half_size)
    }
}

impl SearchState {
    /// Start a search with the interior minimum set to [`sentinel_cost`].
    ///
    /// Fails if `params` are not valid for a `width` x `height` image.
    pub fn new(width: u32, height: u32, side: Side, params: &Params) -> Result<Self> {
        params.validate(width, height)?;

        let map = DisparityMap::new(
            width,
            height,
            side,
            params.window_half_size,
            params.max_disparity
        );

        let mut min_cost = CostField::new(width as usize, height as usize, f64::INFINITY);
        let sentinel = sentinel_cost(params.window_half_size);
        for (x, y) in map.interior().iter() {
            min_cost.put(x, y, sentinel);
        }

        Ok(Self { min_cost, map })
    }

    /// Fold the cost of `shift` into the running minimum.
    ///
    /// Only strictly smaller costs replace the current disparity, so shifts must be supplied in
    /// increasing order for ties to resolve to the smallest one.
    pub fn update(&mut self, shift: usize, cost: &CostField) -> Result<()> {
        if (cost.width(), cost.height()) != (self.map.width(), self.map.height()) {
            return Err(Error::dimensions(
                self.map.dimensions(),
                (cost.width() as u32, cost.height() as u32)
            ));
        }

        if shift >= self.map.max_disparity() || shift > u8::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "shift {} is outside the search range 0..{}",
                shift,
                self.map.max_disparity()
            )));
        }

        for (x, y) in self.map.interior().iter() {
            let c = cost.get(x, y);
            if c < self.min_cost.get(x, y) {
                self.map.put(x, y, shift as u8);
                self.min_cost.put(x, y, c);
            }
        }

        Ok(())
    }

    pub fn min_cost(&self) -> &CostField {
        &self.min_cost
    }

    pub fn map(&self) -> &DisparityMap {
        &self.map
    }

    pub fn finish(self) -> DisparityMap {
        self.map
    }
}

impl SsdBlockMatcher {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Compute the disparity map referenced from `side`.
    pub fn search(&self, pair: &StereoPair, side: Side) -> Result<DisparityMap> {
        let (width, height) = pair.dimensions();
        let initial = SearchState::new(width, height, side, &self.params)?;

        debug!(
            "SSD search ({:?} reference) on {}x{}, max disparity {}, window half size {}",
            side, width, height, self.params.max_disparity, self.params.window_half_size
        );

        let state = (0..self.params.max_disparity).try_fold(
            initial,
            |mut state, shift| {
                trace!("{:?} reference: shift {}", side, shift);

                let cost = cost_slice(pair, side, shift, self.params.window_half_size)?;
                state.update(shift, &cost)?;
                Ok::<_, Error>(state)
            }
        )?;

        debug!("SSD search ({:?} reference) done", side);

        Ok(state.finish())
    }

    /// Compute the left and right referenced maps, in that order.
    pub fn compute_pair(&self, pair: &StereoPair) -> Result<(DisparityMap, DisparityMap)> {
        #[cfg(feature = "rayon")]
        let (left, right) = rayon::join(
            || self.search(pair, Side::Left),
            || self.search(pair, Side::Right)
        );

        #[cfg(not(feature = "rayon"))]
        let (left, right) = (self.search(pair, Side::Left), self.search(pair, Side::Right));

        Ok((left?, right?))
    }

    /// Compute both maps and cross-check them.
    pub fn compute_consistent(&self, pair: &StereoPair) -> Result<ConsistencyResult> {
        let (left, right) = self.compute_pair(pair)?;
        consistency::check(&left, &right)
    }
}

impl DisparityAlgorithm for SsdBlockMatcher {
    fn compute(&mut self, pair: &StereoPair, side: Side) -> Result<DisparityMap> {
        self.search(pair, side)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Initial running minimum, above any cost a window of 8-bit samples can reach.
pub fn sentinel_cost(window_half_size: usize) -> f64 {
    let side = 2.0 * window_half_size as f64 + 1.0;
    side * side * 255.0 * 255.0
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
