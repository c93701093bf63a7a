use crate::enums::Orientation;
use crate::error::{Error, Result};
use crate::windowing::WindowLevel;

use ndarray::{Array2, Array3, ArrayView2, s};

/// Calibrated intensity volume stored as (slice, row, column).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volume {
    pub data: Array3<f32>,
    /// (row spacing, column spacing, slice thickness) in millimetres
    pub spacing: (f32, f32, f32),
}

impl Volume {
    pub fn new(data: Array3<f32>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Number of slices available along the orientation's axis
    pub fn len_of(&self, orientation: Orientation) -> usize {
        axis_len(self.dim(), orientation)
    }

    /// Borrow the 2-D cross-section at `index` along `orientation`.
    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Result<ArrayView2<'_, f32>> {
        slice_along(&self.data, index, orientation)
    }

    /// Cross-section at `index` mapped through `window` into `[0, 1]`.
    pub fn get_windowed_slice(
        &self,
        index: usize,
        orientation: Orientation,
        window: WindowLevel,
    ) -> Result<Array2<f32>> {
        let slice = self.get_slice_from_axis(index, orientation)?;
        Ok(window.apply(slice))
    }
}

pub(crate) fn axis_len(dim: (usize, usize, usize), orientation: Orientation) -> usize {
    match orientation {
        Orientation::Axial => dim.0,
        Orientation::Coronal => dim.1,
        Orientation::Sagittal => dim.2,
    }
}

/// Select the full extent of the two other axes at `index` on the
/// orientation's axis. Out-of-range indices are an error, never clamped.
pub fn slice_along<A>(
    data: &Array3<A>,
    index: usize,
    orientation: Orientation,
) -> Result<ArrayView2<'_, A>> {
    let len = axis_len(data.dim(), orientation);
    if index >= len {
        return Err(Error::IndexOutOfRange {
            axis: orientation.axis(),
            index,
            len,
        });
    }

    let slice = match orientation {
        Orientation::Axial => data.slice(s![index, .., ..]),
        Orientation::Coronal => data.slice(s![.., index, ..]),
        Orientation::Sagittal => data.slice(s![.., .., index]),
    };
    Ok(slice)
}

/// Axis-number form of [`slice_along`]; axes beyond 2 are rejected.
pub fn extract_slice<A>(data: &Array3<A>, axis: usize, index: usize) -> Result<ArrayView2<'_, A>> {
    slice_along(data, index, Orientation::try_from(axis)?)
}
