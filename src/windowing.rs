use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// Window center/width (level/window) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f32,
    pub width: f32,
}

impl Default for WindowLevel {
    fn default() -> Self {
        Self {
            center: 40.0,
            width: 400.0,
        }
    }
}

impl WindowLevel {
    /// Create a window, rejecting non-finite values and negative widths.
    /// A width of zero is accepted and collapses the output to zero.
    pub fn new(center: f32, width: f32) -> Result<Self> {
        if !center.is_finite() || !width.is_finite() || width < 0.0 {
            return Err(Error::InvalidWindow { center, width });
        }
        Ok(Self { center, width })
    }

    /// Lower and upper clip bounds. The half width is floor-divided, so odd
    /// widths produce a window one unit narrower than requested.
    pub fn bounds(&self) -> (f32, f32) {
        let half = (self.width / 2.0).floor();
        (self.center - half, self.center + half)
    }

    #[inline]
    fn map(value: f32, lo: f32, hi: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        (value.clamp(lo, hi) - lo) / (hi - lo)
    }

    /// Map calibrated intensities to `[0, 1]`. The source is never modified.
    pub fn apply(&self, slice: ArrayView2<'_, f32>) -> Array2<f32> {
        let (lo, hi) = self.bounds();
        if hi == lo {
            return Array2::zeros(slice.raw_dim());
        }

        let mut windowed = slice.to_owned();
        windowed.par_mapv_inplace(|v| Self::map(v, lo, hi));
        windowed
    }
}

/// Free-function form of [`WindowLevel::apply`].
pub fn apply_window(slice: ArrayView2<'_, f32>, center: f32, width: f32) -> Result<Array2<f32>> {
    Ok(WindowLevel::new(center, width)?.apply(slice))
}

/// Slice-local min-max normalization to `[0, 1]`. A constant slice maps to
/// zero.
pub fn normalize_min_max(slice: ArrayView2<'_, f32>) -> Array2<f32> {
    let Some((min, max)) = min_max(slice) else {
        return Array2::zeros(slice.raw_dim());
    };
    if max <= min {
        return Array2::zeros(slice.raw_dim());
    }

    let range = max - min;
    slice.mapv(|v| if v.is_nan() { 0.0 } else { (v - min) / range })
}

/// Normalize only when the slice is not already within `[0, 1]`.
pub fn ensure_unit_range(slice: ArrayView2<'_, f32>) -> Array2<f32> {
    match min_max(slice) {
        Some((min, max)) if min >= 0.0 && max <= 1.0 => slice.to_owned(),
        _ => normalize_min_max(slice),
    }
}

fn min_max(slice: ArrayView2<'_, f32>) -> Option<(f32, f32)> {
    slice
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}
