//! # SSD cost slices
//!
//! One slice of the cost volume: the Sum of Squared Differences between a window in the reference
//! image and the same window displaced horizontally by a single candidate shift in the other
//! image.
//!
//! The window covers offsets `[-h, h - 1]` on both axes, one row and one column fewer on the
//! positive side than a centred window. Results are bit-for-bit comparable with maps produced
//! using that window shape.
//!
//! Pixels are only evaluated where every sample of the window, in both images, lies inside the
//! image. Everywhere else the slice holds `f64::INFINITY`, so a running minimum never selects it.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::convert::TryFrom;
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::disparity::{Region, Side, StereoPair};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Dense field of 64-bit matching costs, row-major, sized like its source image.
#[derive(Debug, Clone, PartialEq)]
pub struct CostField {
    data: Vec<f64>,
    width: usize,
    height: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostField {
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub fn put(&mut self, x: usize, y: usize, val: f64) {
        self.data[y * self.width + x] = val;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Compute the SSD cost of `shift` for every pixel of the `side` reference image.
///
/// For the left reference the cost at `(x, y)` compares `left(x + i, y + j)` against
/// `right(x + i - shift, y + j)`; the right reference compares `right(x + i, y + j)` against
/// `left(x + i + shift, y + j)`. Pixels outside the rows of the interior or outside
/// [`feasible_columns`] are `f64::INFINITY`.
pub fn cost_slice(
    pair: &StereoPair,
    side: Side,
    shift: usize,
    window_half_size: usize
) -> Result<CostField> {
    let (width, height) = pair.dimensions();
    check_window(width, height, window_half_size)?;

    let width = width as usize;
    let height = height as usize;

    let rows = Region::interior(width, height, window_half_size);
    let cols = feasible_columns(width, window_half_size, side, shift);

    let mut field = CostField::new(width, height, f64::INFINITY);
    if cols.is_empty() {
        return Ok(field);
    }

    let reference = pair.image(side).as_raw().as_slice();
    let other = pair.image(side.opposite()).as_raw().as_slice();
    let offset = column_offset(side, shift);

    let row_cost = |y: usize, row: &mut [f64]| {
        if y < rows.y0 || y >= rows.y1 {
            return;
        }

        for x in cols.clone() {
            row[x] = window_ssd(reference, other, width, x, y, window_half_size, offset);
        }
    };

    #[cfg(feature = "rayon")]
    field.data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| row_cost(y, row));

    #[cfg(not(feature = "rayon"))]
    field.data
        .chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| row_cost(y, row));

    Ok(field)
}

/// Columns of the interior at which `shift` keeps the whole window inside both images.
///
/// The range may be empty (start not below end) when the shift is wider than the image allows.
pub fn feasible_columns(
    width: usize,
    window_half_size: usize,
    side: Side,
    shift: usize
) -> Range<usize> {
    let end = width.saturating_sub(window_half_size);

    // An empty window samples nothing
    if window_half_size == 0 {
        return 0..end;
    }

    match side {
        Side::Left => window_half_size.saturating_add(shift)..end,
        Side::Right => {
            let last = width
                .saturating_add(1)
                .saturating_sub(window_half_size.saturating_add(shift));
            window_half_size..end.min(last)
        }
    }
}

/// Reject window sizes that do not fit inside a `width` x `height` image.
pub(crate) fn check_window(width: u32, height: u32, window_half_size: usize) -> Result<()> {
    let side = window_half_size
        .checked_mul(2)
        .and_then(|s| s.checked_add(1));

    match side {
        Some(s) if s <= width.min(height) as usize => Ok(()),
        _ => Err(Error::WindowTooLarge { window_half_size, width, height })
    }
}

fn column_offset(side: Side, shift: usize) -> isize {
    // Shifts past isize::MAX only get here with an empty window, which never applies the offset
    let shift = isize::try_from(shift).unwrap_or(isize::MAX);

    match side {
        Side::Left => -shift,
        Side::Right => shift
    }
}

#[inline]
fn window_ssd(
    reference: &[u8],
    other: &[u8],
    stride: usize,
    x: usize,
    y: usize,
    window_half_size: usize,
    offset: isize
) -> f64 {
    let h = window_half_size as isize;
    let mut acc = 0.0f64;

    for j in -h..h {
        let row = (y as isize + j) as usize * stride;

        for i in -h..h {
            let xr = (x as isize + i) as usize;
            let xo = (x as isize + i + offset) as usize;

            let diff = reference[row + xr] as f64 - other[row + xo] as f64;
            acc += diff * diff;
        }
    }

    acc
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn pair(left: GrayImage, right: GrayImage) -> StereoPair {
        StereoPair::new(left, right).unwrap()
    }

    #[test]
    fn zero_images_cost_nothing_wherever_evaluated() {
        let p = pair(GrayImage::new(5, 5), GrayImage::new(5, 5));

        for side in [Side::Left, Side::Right] {
            for shift in 0..2 {
                let field = cost_slice(&p, side, shift, 1).unwrap();
                let cols = feasible_columns(5, 1, side, shift);

                for y in 0..5 {
                    for x in 0..5 {
                        let c = field.get(x, y);
                        if (1..4).contains(&y) && cols.contains(&x) {
                            assert_eq!(c, 0.0, "{:?} shift {} at ({}, {})", side, shift, x, y);
                        } else {
                            assert!(c.is_infinite());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn window_is_asymmetric() {
        let left = GrayImage::new(7, 7);

        // A difference one column to the right of the centre is outside the window
        let mut right = GrayImage::new(7, 7);
        right.put_pixel(4, 3, Luma([10]));
        let field = cost_slice(&pair(left.clone(), right), Side::Left, 0, 1).unwrap();
        assert_eq!(field.get(3, 3), 0.0);

        // ... one column to the left is inside it
        let mut right = GrayImage::new(7, 7);
        right.put_pixel(2, 3, Luma([10]));
        let field = cost_slice(&pair(left, right), Side::Left, 0, 1).unwrap();
        assert_eq!(field.get(3, 3), 100.0);
    }

    #[test]
    fn shift_direction_follows_reference_side() {
        // Left image is a horizontal ramp, right image is the left shifted by 1
        let left = GrayImage::from_fn(8, 4, |x, _| Luma([(x * 10) as u8]));
        let right = GrayImage::from_fn(8, 4, |x, _| Luma([((x + 1) * 10) as u8]));
        let p = pair(left, right);

        let l = cost_slice(&p, Side::Left, 1, 1).unwrap();
        let r = cost_slice(&p, Side::Right, 1, 1).unwrap();
        assert_eq!(l.get(3, 2), 0.0);
        assert_eq!(r.get(3, 2), 0.0);

        // Wrong direction: every sample differs by 20, four samples per window
        let l = cost_slice(&p, Side::Left, 0, 1).unwrap();
        assert_eq!(l.get(3, 2), 4.0 * 100.0);
    }

    #[test]
    fn feasible_columns_keep_samples_in_bounds() {
        assert_eq!(feasible_columns(10, 1, Side::Left, 0), 1..9);
        assert_eq!(feasible_columns(10, 1, Side::Left, 3), 4..9);
        assert_eq!(feasible_columns(10, 1, Side::Right, 0), 1..9);
        assert_eq!(feasible_columns(10, 1, Side::Right, 3), 1..7);
        assert_eq!(feasible_columns(10, 0, Side::Right, 3), 0..10);
        assert!(feasible_columns(10, 2, Side::Left, 9).is_empty());
        assert!(feasible_columns(10, 2, Side::Left, usize::MAX).is_empty());
        assert!(feasible_columns(10, 2, Side::Right, usize::MAX).is_empty());
    }

    #[test]
    fn huge_shift_gives_an_infinite_slice() {
        let p = pair(GrayImage::new(6, 6), GrayImage::new(6, 6));

        for side in [Side::Left, Side::Right] {
            for shift in [6, u32::MAX as usize, usize::MAX] {
                let field = cost_slice(&p, side, shift, 1).unwrap();
                assert!(field.as_slice().iter().all(|c| c.is_infinite()), "{:?} {}", side, shift);
            }
        }

        // An empty window never samples the other image, whatever the shift
        let field = cost_slice(&p, Side::Left, usize::MAX, 0).unwrap();
        assert!(field.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let p = pair(GrayImage::new(6, 4), GrayImage::new(6, 4));
        assert!(cost_slice(&p, Side::Left, 0, 1).is_ok());
        assert_eq!(
            cost_slice(&p, Side::Left, 0, 2).unwrap_err(),
            Error::WindowTooLarge { window_half_size: 2, width: 6, height: 4 }
        );
    }
}
