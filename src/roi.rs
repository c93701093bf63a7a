use crate::enums::Orientation;
use crate::error::{Error, Result};
use crate::interpolator::{Interpolator, Shape3};
use crate::volume::slice_along;

use ndarray::{Array3, ArrayView2, ArrayView3};

/// Binary region mask aligned with a reference DICOM volume.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiMask {
    pub filename: String,
    pub label: String,
    /// 0 = background, 1 = inside the region
    pub data: Array3<u8>,
    /// Distinct values of the source label volume, ascending
    pub unique_values: Vec<f32>,
    pub source_shape: Shape3,
}

/// Summary of a processed ROI for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiInfo {
    pub filename: String,
    pub label: String,
    pub unique_values: Vec<f32>,
    pub shape: Shape3,
}

impl RoiMask {
    /// Binarize `labels` and bring it onto the `reference` grid.
    pub fn from_label_volume(
        filename: impl Into<String>,
        label: impl Into<String>,
        labels: ArrayView3<'_, f32>,
        reference: Shape3,
    ) -> Result<Self> {
        let filename = filename.into();
        let source_shape = labels.dim();
        if source_shape != reference {
            log::warn!(
                "ROI {filename} has shape {source_shape:?}, reference volume has {reference:?}; resampling"
            );
        }

        Ok(Self {
            label: label.into(),
            unique_values: unique_values(labels),
            data: reconcile_roi_to_shape(labels, reference)?,
            source_shape,
            filename,
        })
    }

    pub fn dim(&self) -> Shape3 {
        self.data.dim()
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Result<ArrayView2<'_, u8>> {
        slice_along(&self.data, index, orientation)
    }

    pub fn info(&self) -> RoiInfo {
        RoiInfo {
            filename: self.filename.clone(),
            label: self.label.clone(),
            unique_values: self.unique_values.clone(),
            shape: self.dim(),
        }
    }
}

/// Any value > 0 becomes 1.
pub fn binarize(labels: ArrayView3<'_, f32>) -> Array3<u8> {
    labels.mapv(|v| u8::from(v > 0.0))
}

/// Binarize a label volume and resample it to exactly `target`.
///
/// Resampling is nearest-neighbour so the output holds only 0 and 1. When
/// the zoomed shape misses `target` by rounding, the result is padded with
/// zeros or cropped at the high end of each axis.
pub fn reconcile_roi_to_shape(labels: ArrayView3<'_, f32>, target: Shape3) -> Result<Array3<u8>> {
    if target.0 == 0 || target.1 == 0 || target.2 == 0 {
        return Err(Error::EmptyShape(target));
    }
    let source = labels.dim();
    if source.0 == 0 || source.1 == 0 || source.2 == 0 {
        return Err(Error::EmptyShape(source));
    }

    let mask = binarize(labels);
    if source == target {
        return Ok(mask);
    }

    let zoomed = Interpolator::get_zoomed_dimensions(source, target);
    let resampled = Interpolator::nearest_neighbor(mask.view(), zoomed);
    Ok(Interpolator::fit_to_shape(resampled, target))
}

fn unique_values(labels: ArrayView3<'_, f32>) -> Vec<f32> {
    let mut values: Vec<f32> = labels.iter().copied().filter(|v| !v.is_nan()).collect();
    values.sort_by(f32::total_cmp);
    values.dedup();
    values
}
