//! # Left-right consistency
//!
//! Cross-checks a left referenced and a right referenced disparity map. A left pixel `(x, y)`
//! with disparity `d` matches when the right map holds the same `d` at `(x - d, y)`. Matching
//! pixels carry `d` into the fused map; everything else is flagged in the validity mask.
//!
//! The mask stores [`Consistency::Match`] as 0 and [`Consistency::Mismatch`] as 255. Callers
//! should compare against the enum rather than the raw sample values.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, Luma};
use log::debug;

use crate::disparity::{DisparityMap, Side};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Per-pixel outcome of the consistency check, stored as one 8-bit sample per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityMask {
    data: GrayImage
}

/// Disparity map holding values only where the check matched. Other pixels are 0 and undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedDisparityMap {
    data: GrayImage
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyResult {
    pub fused: FusedDisparityMap,
    pub mask: ValidityMask
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Consistency {
    /// Both maps agree on the disparity.
    Match = 0,

    /// The maps disagree, or the matched pixel has no defined disparity.
    Mismatch = 255
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Consistency {
    pub fn to_luma(self) -> u8 {
        self as u8
    }

    /// Decode a mask sample, `None` for values that are neither literal.
    pub fn from_luma(val: u8) -> Option<Self> {
        match val {
            0 => Some(Consistency::Match),
            255 => Some(Consistency::Mismatch),
            _ => None
        }
    }
}

impl ValidityMask {
    /// A mask with every pixel marked as a mismatch.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: GrayImage::from_pixel(width, height, Luma([Consistency::Mismatch.to_luma()]))
        }
    }

    /// Wrap an existing mask image, rejecting samples that are neither literal.
    pub fn from_image(data: GrayImage) -> Result<Self> {
        let stray = data
            .pixels()
            .map(|p| p[0])
            .find(|&v| Consistency::from_luma(v).is_none());

        match stray {
            Some(v) => Err(Error::InvalidParameter(format!(
                "validity mask sample {} is neither match nor mismatch",
                v
            ))),
            None => Ok(Self { data })
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Consistency {
        // Every stored sample is a literal, see `from_image` and `set`
        Consistency::from_luma(self.data.get_pixel(x as u32, y as u32)[0])
            .unwrap_or(Consistency::Mismatch)
    }

    pub fn set(&mut self, x: usize, y: usize, val: Consistency) {
        self.data.put_pixel(x as u32, y as u32, Luma([val.to_luma()]))
    }

    pub fn is_match(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Consistency::Match
    }

    pub fn count_matches(&self) -> usize {
        self.data
            .pixels()
            .filter(|p| p[0] == Consistency::Match.to_luma())
            .count()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.data.dimensions()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.data
    }

    pub fn into_image(self) -> GrayImage {
        self.data
    }
}

impl FusedDisparityMap {
    fn new(width: u32, height: u32) -> Self {
        Self { data: GrayImage::new(width, height) }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data.get_pixel(x as u32, y as u32)[0]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.data.dimensions()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.data
    }

    pub fn into_image(self) -> GrayImage {
        self.data
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Cross-check the two maps, returning the fused map and a freshly allocated mask.
pub fn check(left: &DisparityMap, right: &DisparityMap) -> Result<ConsistencyResult> {
    let (width, height) = left.dimensions();
    let mut mask = ValidityMask::new(width, height);
    let fused = check_into(left, right, &mut mask)?;

    Ok(ConsistencyResult { fused, mask })
}

/// Cross-check the two maps, writing the outcome of every pixel into `mask`.
///
/// Pixels outside the left map's interior are mismatches. So are pixels whose match column
/// `x - d` falls left of the image or outside the right map's interior: the right map is never
/// read there.
pub fn check_into(
    left: &DisparityMap,
    right: &DisparityMap,
    mask: &mut ValidityMask
) -> Result<FusedDisparityMap> {
    if left.side() != Side::Left || right.side() != Side::Right {
        return Err(Error::InvalidParameter(format!(
            "expected a left and a right referenced map, got {:?} and {:?}",
            left.side(),
            right.side()
        )));
    }

    if right.dimensions() != left.dimensions() {
        return Err(Error::dimensions(left.dimensions(), right.dimensions()));
    }

    if mask.dimensions() != left.dimensions() {
        return Err(Error::dimensions(left.dimensions(), mask.dimensions()));
    }

    if left.max_disparity() != right.max_disparity()
        || left.window_half_size() != right.window_half_size()
    {
        return Err(Error::InvalidParameter(format!(
            "maps were computed with different parameters: max disparity {} and {}, \
            window half size {} and {}",
            left.max_disparity(),
            right.max_disparity(),
            left.window_half_size(),
            right.window_half_size()
        )));
    }

    let (width, height) = left.dimensions();
    let mut fused = FusedDisparityMap::new(width, height);

    let left_interior = left.interior();
    let right_interior = right.interior();

    for y in 0..left.height() {
        for x in 0..left.width() {
            if !left_interior.contains(x, y) {
                mask.set(x, y, Consistency::Mismatch);
                continue;
            }

            let d = left.get(x, y);

            let consistent = match x.checked_sub(d as usize) {
                Some(xr) if right_interior.contains(xr, y) => right.get(xr, y) == d,
                _ => false
            };

            if consistent {
                mask.set(x, y, Consistency::Match);
                fused.data.put_pixel(x as u32, y as u32, Luma([d]));
            } else {
                mask.set(x, y, Consistency::Mismatch);
            }
        }
    }

    debug!(
        "Consistency check: {} of {} interior pixels match",
        mask.count_matches(),
        left_interior.width() * left_interior.height()
    );

    Ok(fused)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn maps(w: u32, h: u32, half: usize) -> (DisparityMap, DisparityMap) {
        (
            DisparityMap::new(w, h, Side::Left, half, 8),
            DisparityMap::new(w, h, Side::Right, half, 8)
        )
    }

    #[test]
    fn literals_decode() {
        assert_eq!(Consistency::from_luma(Consistency::Match.to_luma()), Some(Consistency::Match));
        assert_eq!(
            Consistency::from_luma(Consistency::Mismatch.to_luma()),
            Some(Consistency::Mismatch)
        );
        assert_eq!(Consistency::from_luma(17), None);
    }

    #[test]
    fn agreeing_disparity_is_fused() {
        let (mut left, mut right) = maps(12, 6, 1);
        left.put(7, 3, 4);
        right.put(3, 3, 4);

        let res = check(&left, &right).unwrap();
        assert_eq!(res.mask.get(7, 3), Consistency::Match);
        assert_eq!(res.fused.get(7, 3), 4);
    }

    #[test]
    fn disagreeing_disparity_is_flagged() {
        let (mut left, mut right) = maps(12, 6, 1);
        left.put(7, 3, 4);
        right.put(3, 3, 5);

        let res = check(&left, &right).unwrap();
        assert_eq!(res.mask.get(7, 3), Consistency::Mismatch);
        assert_eq!(res.fused.get(7, 3), 0);
    }

    #[test]
    fn match_left_of_the_image_is_a_mismatch() {
        let (mut left, right) = maps(12, 6, 1);
        left.put(2, 2, 5);

        let res = check(&left, &right).unwrap();
        assert_eq!(res.mask.get(2, 2), Consistency::Mismatch);
    }

    #[test]
    fn border_pixels_are_mismatches() {
        let (left, right) = maps(6, 6, 1);

        let res = check(&left, &right).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                let border = x == 0 || y == 0 || x == 5 || y == 5;
                // zero disparity on both sides agrees everywhere in the interior
                assert_eq!(res.mask.is_match(x, y), !border, "({}, {})", x, y);
            }
        }
        assert_eq!(res.mask.count_matches(), 16);
    }

    #[test]
    fn match_on_right_border_is_not_read() {
        let (mut left, mut right) = maps(12, 6, 2);
        left.put(3, 3, 2);
        // Column 1 is outside the right interior, whatever is stored there is undefined
        right.put(1, 3, 2);

        let res = check(&left, &right).unwrap();
        assert_eq!(res.mask.get(3, 3), Consistency::Mismatch);
    }

    #[test]
    fn mask_is_fully_overwritten() {
        let (left, right) = maps(6, 6, 1);
        let mut mask = ValidityMask::new(6, 6);
        mask.set(0, 0, Consistency::Match);

        check_into(&left, &right, &mut mask).unwrap();
        assert_eq!(mask.get(0, 0), Consistency::Mismatch);
        assert!(mask
            .as_image()
            .pixels()
            .all(|p| Consistency::from_luma(p[0]).is_some()));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let (left, right) = maps(6, 6, 1);

        let mut small = ValidityMask::new(5, 6);
        assert!(matches!(
            check_into(&left, &right, &mut small),
            Err(Error::InvalidDimensions { .. })
        ));

        let other = DisparityMap::new(6, 7, Side::Right, 1, 8);
        assert!(matches!(check(&left, &other), Err(Error::InvalidDimensions { .. })));

        assert!(matches!(check(&right, &left), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn rejects_maps_from_different_parameters() {
        let (left, _) = maps(12, 6, 1);

        let wider_search = DisparityMap::new(12, 6, Side::Right, 1, 16);
        assert!(matches!(check(&left, &wider_search), Err(Error::InvalidParameter(_))));

        let larger_window = DisparityMap::new(12, 6, Side::Right, 2, 8);
        let mut mask = ValidityMask::new(12, 6);
        mask.set(4, 3, Consistency::Match);
        assert!(matches!(
            check_into(&left, &larger_window, &mut mask),
            Err(Error::InvalidParameter(_))
        ));

        // Nothing is written before the inputs are rejected
        assert_eq!(mask.get(4, 3), Consistency::Match);
    }

    #[test]
    fn mask_decoding_agrees_with_literals() {
        let img = GrayImage::from_fn(3, 1, |x, _| match x {
            1 => Luma([Consistency::Match.to_luma()]),
            _ => Luma([Consistency::Mismatch.to_luma()])
        });
        let mask = ValidityMask::from_image(img.clone()).unwrap();
        for x in 0..3 {
            let raw = img.get_pixel(x as u32, 0)[0];
            assert_eq!(Some(mask.get(x, 0)), Consistency::from_luma(raw));
        }
        assert_eq!(mask.count_matches(), 1);

        let bad = GrayImage::from_pixel(3, 1, Luma([17]));
        assert!(matches!(ValidityMask::from_image(bad), Err(Error::InvalidParameter(_))));
    }
}
