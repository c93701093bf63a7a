use crate::{
    config::PipelineConfig,
    enums::SortBy,
    error::{Error, Result},
    metadata::VolumeMetadata,
    volume::Volume,
};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// One successfully parsed and decoded slice of a series.
struct SliceEntry {
    path: PathBuf,
    position_z: Option<f32>,
    instance_number: Option<i32>,
    header_dim: Option<(usize, usize)>,
    pixels: Array2<f32>,
    /// Header only, pixel data already decoded into `pixels`
    dicom_object: FileDicomObject<InMemDicomObject>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from a directory of single-slice DICOM files.
    ///
    /// Only files whose extension is listed in
    /// [`PipelineConfig::dicom_extensions`] are considered. Files that fail
    /// to parse or decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns error if the directory holds no candidate files, none of them
    /// is valid, or slices disagree on their row/column dimensions
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        config: &PipelineConfig,
    ) -> Result<(Volume, VolumeMetadata)> {
        let directory = path.as_ref();
        let mut paths: Vec<_> = fs::read_dir(directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| config.is_dicom_extension(ext))
            })
            .collect();

        if paths.is_empty() {
            return Err(Error::NoDicomFiles(directory.to_path_buf()));
        }
        paths.sort();

        Self::load_entries(directory, &paths, config)
    }

    /// Load a volume from explicit file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        config: &PipelineConfig,
    ) -> Result<(Volume, VolumeMetadata)> {
        let mut paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let source = paths
            .first()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if paths.is_empty() {
            return Err(Error::NoDicomFiles(source));
        }
        paths.sort();

        Self::load_entries(&source, &paths, config)
    }

    fn load_entries(
        source: &Path,
        paths: &[PathBuf],
        config: &PipelineConfig,
    ) -> Result<(Volume, VolumeMetadata)> {
        let mut entries: Vec<SliceEntry> = paths
            .par_iter()
            .filter_map(|path| match Self::read_slice(path) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Skipping slice: {err}");
                    None
                }
            })
            .collect();

        if entries.is_empty() {
            return Err(Error::NoValidImages(source.to_path_buf()));
        }
        log::debug!(
            "Decoded {} of {} DICOM files in {}",
            entries.len(),
            paths.len(),
            source.display()
        );

        let ordering = Self::sort_entries(&mut entries);
        let expected = Self::validate_dimensions(&entries)?;

        let first = &entries[0];
        let metadata = VolumeMetadata::from_dicom(
            &first.dicom_object,
            expected,
            entries.len(),
            ordering,
            &config.anonymization,
        );
        let spacing = (
            metadata.pixel_spacing.0,
            metadata.pixel_spacing.1,
            metadata.slice_thickness,
        );

        let volume_array = Self::build_volume_array(entries, expected);
        log::info!(
            "Loaded DICOM series from {} with shape {:?} ordered by {:?}",
            source.display(),
            volume_array.dim(),
            ordering
        );

        Ok((Volume::new(volume_array, spacing), metadata))
    }

    fn read_slice(path: &Path) -> Result<SliceEntry> {
        let mut dicom_object = open_file(path).map_err(|source| Error::Dicom {
            path: path.to_path_buf(),
            source,
        })?;
        let raw = Self::decode_image(&dicom_object)
            .ok_or_else(|| Error::UndecodablePixelData(path.to_path_buf()))?;
        Self::retain_header(&mut dicom_object);

        Ok(SliceEntry {
            path: path.to_path_buf(),
            position_z: Self::get_position_z(&dicom_object),
            instance_number: Self::get_instance_number(&dicom_object),
            header_dim: Self::get_header_dim(&dicom_object),
            pixels: Self::apply_rescale(raw, Self::get_rescale(&dicom_object)),
            dicom_object,
        })
    }

    /// First frame, first sample, as stored (no modality or VOI LUT)
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        let image = pixel_data.to_ndarray_with_options::<f32>(&options).ok()?;
        Some(image.slice_move(s![0, .., .., 0]))
    }

    /// Drop the encoded pixel data once it has been decoded
    fn retain_header(dicom_object: &mut FileDicomObject<InMemDicomObject>) {
        dicom_object.remove_element(tags::PIXEL_DATA);
    }

    /// `value = raw * slope + intercept` when both calibration values exist
    fn apply_rescale(mut raw: Array2<f32>, rescale: Option<(f32, f32)>) -> Array2<f32> {
        if let Some((slope, intercept)) = rescale {
            raw.mapv_inplace(|v| v.mul_add(slope, intercept));
        }
        raw
    }

    fn get_rescale(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<(f32, f32)> {
        let slope = dicom_object
            .element(tags::RESCALE_SLOPE)
            .ok()?
            .to_float32()
            .ok()?;
        let intercept = dicom_object
            .element(tags::RESCALE_INTERCEPT)
            .ok()?
            .to_float32()
            .ok()?;
        Some((slope, intercept))
    }

    fn get_position_z(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<f32> {
        let pos = dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?;
        pos.get(2).copied().filter(|z| z.is_finite())
    }

    fn get_instance_number(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<i32> {
        dicom_object
            .element(tags::INSTANCE_NUMBER)
            .ok()?
            .to_int::<i32>()
            .ok()
    }

    fn get_header_dim(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<(usize, usize)> {
        let rows = dicom_object.element(tags::ROWS).ok()?.to_int::<u32>().ok()?;
        let columns = dicom_object.element(tags::COLUMNS).ok()?.to_int::<u32>().ok()?;
        Some((rows as usize, columns as usize))
    }

    /// Order slices anatomically. Each key is used only when every slice
    /// carries it; sorting is stable so ties keep file name order.
    fn sort_entries(entries: &mut [SliceEntry]) -> SortBy {
        if entries.iter().all(|entry| entry.position_z.is_some()) {
            entries.sort_by(|a, b| {
                a.position_z
                    .partial_cmp(&b.position_z)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            return SortBy::ImagePositionPatient;
        }

        if entries.iter().all(|entry| entry.instance_number.is_some()) {
            entries.sort_by_key(|entry| entry.instance_number);
            return SortBy::InstanceNumber;
        }

        log::warn!(
            "Neither ImagePositionPatient nor InstanceNumber is available for every slice; \
             ordering {} slices by file name, which may not be anatomical",
            entries.len()
        );
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        SortBy::FileName
    }

    /// Every slice must match the first slice's rows and columns
    fn validate_dimensions(entries: &[SliceEntry]) -> Result<(usize, usize)> {
        let first = &entries[0];
        let expected = first.header_dim.unwrap_or_else(|| first.pixels.dim());

        for entry in entries {
            let found = entry.pixels.dim();
            if found != expected {
                return Err(Error::InconsistentSliceGeometry {
                    path: entry.path.clone(),
                    expected,
                    found,
                });
            }
        }
        Ok(expected)
    }

    fn build_volume_array(entries: Vec<SliceEntry>, (height, width): (usize, usize)) -> Array3<f32> {
        let depth = entries.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, entry) in entries.into_iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&entry.pixels);
        }

        volume
    }
}
