//! # DICOM ROI viewer library
//!
//! This crate implements the imaging pipeline behind a slice viewer for a
//! DICOM series with NIfTI region-of-interest (ROI) overlays.
//!
//! Volumes are loaded from a directory of single-slice DICOM files or from a
//! `.nii`/`.nii.gz` label file into a common (slice, row, column) grid of
//! `f32` values. DICOM pixel values are calibrated with RescaleSlope and
//! RescaleIntercept when present. ROI volumes whose grid differs from the
//! DICOM volume are binarized and resampled with nearest-neighbour
//! interpolation to exactly the DICOM shape. The volume can be sliced in the
//! three different medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Slices are windowed (center/width) into `[0, 1]`, optionally blended with
//! coloured ROI masks and serialized to PNG.
//!
//! Every operation is a pure function of its arguments. Per-user state is
//! an explicit [`Session`] value owned by the caller.
//!
//! # Examples
//!
//! ## Windowed axial slice with ROI overlay
//!
//! ```no_run
//! # use dicom_roi_viewer::{Orientation, PipelineConfig, Session};
//! let session = Session::load("series/", &["liver.nii.gz"], PipelineConfig::default())
//!     .expect("should have loaded series and ROI");
//! let window = session.resolve_window(None, None).expect("valid window");
//! let (png, legend) = session
//!     .render_overlay(Orientation::Axial, session.volume.dim().0 / 2, Some(window))
//!     .expect("should have rendered the center slice");
//! std::fs::write("overlay.png", png).unwrap();
//! for entry in legend {
//!     println!("{}: {:?}", entry.name, entry.color);
//! }
//! ```

pub mod config;
pub mod enums;
pub mod error;
mod interpolator;
pub mod metadata;
pub mod nifti_loader;
pub mod overlay;
pub mod raster;
pub mod roi;
pub mod session;
pub mod volume;
pub mod volume_loader;
pub mod windowing;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use std::path::Path;

pub use config::{AnonymizationConfig, PipelineConfig};
pub use enums::{Orientation, SortBy};
pub use error::{Error, ErrorKind, Result};
pub use metadata::{NiftiMetadata, VolumeMetadata};
pub use nifti_loader::{NiftiLoader, label_from_filename};
pub use overlay::{DEFAULT_PALETTE, LegendEntry, Overlay, OverlayCompositor, Rgb, RoiSlice};
pub use raster::{EncodeOptions, Raster, RasterEncoder, encode_raster};
pub use roi::{RoiInfo, RoiMask, reconcile_roi_to_shape};
pub use session::Session;
pub use volume::{Volume, extract_slice};
pub use volume_loader::VolumeLoader;
pub use windowing::{WindowLevel, apply_window};

/// Load a directory of DICOM slices with the default configuration.
pub fn load_dicom_series(directory: impl AsRef<Path>) -> Result<(Volume, VolumeMetadata)> {
    VolumeLoader::load_from_directory(directory, &PipelineConfig::default())
}

/// Load a single NIfTI volume.
pub fn load_nifti_volume(path: impl AsRef<Path>) -> Result<(Volume, NiftiMetadata)> {
    NiftiLoader::load(path)
}

/// Blend ordered `(mask, label)` pairs over `base` with the default
/// palette and alpha.
pub fn composite_overlay<'a>(
    base: ArrayView2<'_, f32>,
    rois: &[(ArrayView2<'a, u8>, &'a str)],
) -> Result<Overlay> {
    let slices: Vec<RoiSlice<'a>> = rois
        .iter()
        .map(|&(mask, name)| RoiSlice::new(mask, Some(name)))
        .collect();
    OverlayCompositor::default().composite(base, &slices)
}

/// Reconcile a label volume held as a [`Volume`] to a reference volume.
pub fn reconcile_roi_to_volume(roi: &Volume, reference: &Volume) -> Result<Array3<u8>> {
    reconcile_roi_to_shape(roi.data.view(), reference.dim())
}

/// Encode a (row, column, channel) array holding one or three channels.
pub fn encode_array3(array: ArrayView3<'_, f32>, transparent_background: bool) -> Result<Vec<u8>> {
    match array.dim().2 {
        1 => encode_raster(
            Raster::Gray(array.index_axis_move(Axis(2), 0)),
            transparent_background,
        ),
        _ => encode_raster(Raster::Rgb(array), transparent_background),
    }
}
