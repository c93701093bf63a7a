//! Per-user viewing state passed explicitly to every render call.
//!
//! A [`Session`] bundles the loaded DICOM volume, its metadata and the ROI
//! masks reconciled against it. The crate keeps no session registry; the
//! caller owns each `Session` value and decides its lifetime.

use crate::config::PipelineConfig;
use crate::enums::Orientation;
use crate::error::{Error, Result};
use crate::metadata::{NiftiMetadata, VolumeMetadata};
use crate::nifti_loader::{NiftiLoader, label_from_filename};
use crate::overlay::{LegendEntry, OverlayCompositor, RoiSlice};
use crate::raster::RasterEncoder;
use crate::roi::{RoiInfo, RoiMask};
use crate::volume::Volume;
use crate::volume_loader::VolumeLoader;
use crate::windowing::{WindowLevel, normalize_min_max};

use ndarray::ArrayView3;
use std::path::Path;

/// Colour of single-ROI slice exports
const ROI_EXPORT_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

#[derive(Debug, Clone)]
pub struct Session {
    pub volume: Volume,
    pub metadata: VolumeMetadata,
    pub rois: Vec<RoiMask>,
    /// Header metadata of each ROI source, parallel to `rois`
    pub roi_metadata: Vec<Option<NiftiMetadata>>,
    config: PipelineConfig,
}

impl Session {
    pub fn new(volume: Volume, metadata: VolumeMetadata, config: PipelineConfig) -> Self {
        Self {
            volume,
            metadata,
            rois: Vec::new(),
            roi_metadata: Vec::new(),
            config,
        }
    }

    /// Load a DICOM series and reconcile every ROI file against it.
    pub fn load(
        dicom_dir: impl AsRef<Path>,
        roi_paths: &[impl AsRef<Path>],
        config: PipelineConfig,
    ) -> Result<Self> {
        let (volume, metadata) = VolumeLoader::load_from_directory(dicom_dir, &config)?;
        let mut session = Self::new(volume, metadata, config);
        for path in roi_paths {
            session.add_roi_file(path)?;
        }
        Ok(session)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a NIfTI label file and append it as the next ROI.
    pub fn add_roi_file(&mut self, path: impl AsRef<Path>) -> Result<&RoiMask> {
        let path = path.as_ref();
        let (labels, nifti_metadata) = NiftiLoader::load(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mask = RoiMask::from_label_volume(
            filename,
            label_from_filename(path),
            labels.data.view(),
            self.volume.dim(),
        )?;
        Ok(self.push_roi(mask, Some(nifti_metadata)))
    }

    /// Append an in-memory label volume as the next ROI.
    pub fn add_roi_volume(
        &mut self,
        filename: &str,
        labels: ArrayView3<'_, f32>,
    ) -> Result<&RoiMask> {
        let mask = RoiMask::from_label_volume(
            filename,
            label_from_filename(filename),
            labels,
            self.volume.dim(),
        )?;
        Ok(self.push_roi(mask, None))
    }

    fn push_roi(&mut self, mask: RoiMask, metadata: Option<NiftiMetadata>) -> &RoiMask {
        self.rois.push(mask);
        self.roi_metadata.push(metadata);
        &self.rois[self.rois.len() - 1]
    }

    pub fn roi_infos(&self) -> Vec<RoiInfo> {
        self.rois.iter().map(RoiMask::info).collect()
    }

    /// Window for a request, falling back to header then configured defaults.
    pub fn resolve_window(&self, center: Option<f32>, width: Option<f32>) -> Result<WindowLevel> {
        self.metadata
            .resolve_window(center, width, self.config.default_window)
    }

    /// Windowed grayscale PNG of one DICOM slice.
    pub fn render_slice(
        &self,
        orientation: Orientation,
        index: usize,
        center: Option<f32>,
        width: Option<f32>,
    ) -> Result<Vec<u8>> {
        let window = self.resolve_window(center, width)?;
        let windowed = self.volume.get_windowed_slice(index, orientation, window)?;
        RasterEncoder::encode_gray(windowed.view())
    }

    /// Grayscale PNG of one DICOM slice with slice-local min-max contrast.
    pub fn render_raw_slice(&self, orientation: Orientation, index: usize) -> Result<Vec<u8>> {
        let slice = self.volume.get_slice_from_axis(index, orientation)?;
        RasterEncoder::encode_gray(normalize_min_max(slice).view())
    }

    /// Transparent PNG of one ROI slice.
    pub fn render_roi_slice(
        &self,
        roi_index: usize,
        orientation: Orientation,
        index: usize,
    ) -> Result<Vec<u8>> {
        let roi = self.rois.get(roi_index).ok_or(Error::RoiIndexOutOfRange {
            index: roi_index,
            count: self.rois.len(),
        })?;
        let slice = roi.get_slice_from_axis(index, orientation)?;
        RasterEncoder::encode_mask(slice, ROI_EXPORT_COLOR)
    }

    /// RGB PNG of a DICOM slice with every ROI blended on top, plus the
    /// legend of ROIs that were drawn. Without a window the base slice is
    /// min-max normalized.
    pub fn render_overlay(
        &self,
        orientation: Orientation,
        index: usize,
        window: Option<WindowLevel>,
    ) -> Result<(Vec<u8>, Vec<LegendEntry>)> {
        let base = self.volume.get_slice_from_axis(index, orientation)?;
        let base = match window {
            Some(window) => window.apply(base),
            None => base.to_owned(),
        };

        let roi_slices = self
            .rois
            .iter()
            .map(|roi| {
                roi.get_slice_from_axis(index, orientation)
                    .map(|mask| RoiSlice::new(mask, Some(roi.label.as_str())))
            })
            .collect::<Result<Vec<_>>>()?;

        let overlay = OverlayCompositor::from_config(&self.config).composite(base.view(), &roi_slices)?;
        let bytes = RasterEncoder::encode_rgb(overlay.rgb.view())?;
        Ok((bytes, overlay.legend))
    }
}
