//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, Luma};
use crate::cost::feasible_columns;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A rectified stereo pair of 8-bit grayscale images with identical dimensions.
///
/// True correspondences between the two images differ only in their x coordinate.
#[derive(Debug, Clone)]
pub struct StereoPair {
    left: GrayImage,
    right: GrayImage
}

/// Half-open rectangle of pixels, `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize
}

/// An 8-bit disparity map referenced from one image of a stereo pair.
///
/// Only pixels inside [`DisparityMap::interior`] hold a disparity. The border around it, where no
/// full correlation window fits, is filled with 0 but carries no meaning and must not be read as
/// a disparity of 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityMap {
    data: GrayImage,
    side: Side,
    window_half_size: usize,
    max_disparity: usize
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// The image a disparity map is referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Disparities are measured from the left image, matched at `x - d` in the right image.
    Left,

    /// Disparities are measured from the right image, matched at `x + d` in the left image.
    Right
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo pair, referenced from `side`.
    fn compute(&mut self, pair: &StereoPair, side: Side) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoPair {
    /// Build a pair, rejecting images whose dimensions differ.
    pub fn new(left: GrayImage, right: GrayImage) -> Result<Self> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::dimensions(left.dimensions(), right.dimensions()));
        }

        Ok(Self { left, right })
    }

    pub fn left(&self) -> &GrayImage {
        &self.left
    }

    pub fn right(&self) -> &GrayImage {
        &self.right
    }

    /// The image acting as reference for `side`.
    pub fn image(&self, side: Side) -> &GrayImage {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right
        }
    }

    pub fn width(&self) -> u32 {
        self.left.width()
    }

    pub fn height(&self) -> u32 {
        self.left.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.left.dimensions()
    }
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left
        }
    }
}

impl Region {
    /// The pixels at least `window_half_size` away from every image edge.
    pub fn interior(width: usize, height: usize, window_half_size: usize) -> Self {
        Self {
            x0: window_half_size,
            x1: width.saturating_sub(window_half_size),
            y0: window_half_size,
            y1: height.saturating_sub(window_half_size)
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    /// Iterate over all `(x, y)` in the region, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> {
        let Region { x0, x1, y0, y1 } = *self;
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}

impl DisparityMap {
    pub fn new(
        width: u32,
        height: u32,
        side: Side,
        window_half_size: usize,
        max_disparity: usize
    ) -> Self {
        DisparityMap {
            data: GrayImage::new(width, height),
            side,
            window_half_size,
            max_disparity
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data.get_pixel(x as u32, y as u32)[0]
    }

    pub fn put(&mut self, x: usize, y: usize, val: u8) {
        self.data.put_pixel(x as u32, y as u32, Luma([val]))
    }

    pub fn width(&self) -> usize {
        self.data.width() as usize
    }

    pub fn height(&self) -> usize {
        self.data.height() as usize
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.data.dimensions()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn window_half_size(&self) -> usize {
        self.window_half_size
    }

    pub fn max_disparity(&self) -> usize {
        self.max_disparity
    }

    /// Region holding a disparity in `[0, max_disparity)`.
    pub fn interior(&self) -> Region {
        Region::interior(self.width(), self.height(), self.window_half_size)
    }

    /// Region in which every shift up to `max_disparity - 1` was evaluated.
    ///
    /// Pixels in the interior but outside this region only compared the shifts whose window
    /// stayed inside the other image.
    pub fn searched_region(&self) -> Region {
        let cols = feasible_columns(
            self.width(),
            self.window_half_size,
            self.side,
            self.max_disparity.saturating_sub(1)
        );

        Region {
            x0: cols.start,
            x1: cols.end.max(cols.start),
            ..self.interior()
        }
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.data
    }

    pub fn into_image(self) -> GrayImage {
        self.data
    }

    /// Converts the map to a GrayImage stretched over the full 8-bit range.
    ///
    /// Normalises by the largest disparity searched, so that `max_disparity - 1` maps to 255.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let mult = match self.max_disparity {
            0 | 1 => 1.0,
            d => 255.0 / (d - 1) as f64
        };

        let mut new = GrayImage::new(self.data.width(), self.data.height());

        for (x, y, px) in self.data.enumerate_pixels() {
            let val = (px[0] as f64 * mult).round().min(255.0);
            new.put_pixel(x, y, Luma([val as u8]));
        }

        new
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
