//! Descriptive records computed once at load time.

use dicom::core::Tag;
use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom_dictionary_std::tags;

use crate::config::AnonymizationConfig;
use crate::enums::SortBy;
use crate::error::Result;
use crate::windowing::WindowLevel;

/// Header summary of a DICOM series, anonymized.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMetadata {
    pub patient_id: String,
    pub patient_name: String,
    /// Year followed by a fixed month/day placeholder, e.g. `19800101`
    pub patient_birth_date: Option<String>,
    pub modality: String,
    pub slice_thickness: f32,
    /// (row spacing, column spacing)
    pub pixel_spacing: (f32, f32),
    pub rows: usize,
    pub columns: usize,
    pub num_slices: usize,
    pub window_center: Option<f32>,
    pub window_width: Option<f32>,
    pub slice_ordering: SortBy,
}

impl VolumeMetadata {
    /// Extract metadata from a representative slice. `rows`/`columns` fall
    /// back to the decoded pixel dimensions when the header omits them.
    pub fn from_dicom(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        pixel_dim: (usize, usize),
        num_slices: usize,
        slice_ordering: SortBy,
        anonymization: &AnonymizationConfig,
    ) -> Self {
        let pixel_spacing = read_multi_f32(dicom_object, tags::PIXEL_SPACING)
            .filter(|values| values.len() >= 2)
            .map(|values| (values[0], values[1]))
            .unwrap_or((1.0, 1.0));

        Self {
            patient_id: anonymize_patient_id(
                read_text(dicom_object, tags::PATIENT_ID).as_deref(),
                anonymization,
            ),
            patient_name: anonymization.name_placeholder.clone(),
            patient_birth_date: anonymize_birth_date(
                read_text(dicom_object, tags::PATIENT_BIRTH_DATE).as_deref(),
                anonymization,
            ),
            modality: read_text(dicom_object, tags::MODALITY).unwrap_or_else(|| "Unknown".to_owned()),
            slice_thickness: read_f32(dicom_object, tags::SLICE_THICKNESS).unwrap_or(0.0),
            pixel_spacing,
            rows: read_usize(dicom_object, tags::ROWS).unwrap_or(pixel_dim.0),
            columns: read_usize(dicom_object, tags::COLUMNS).unwrap_or(pixel_dim.1),
            num_slices,
            window_center: read_first_f32(dicom_object, tags::WINDOW_CENTER),
            window_width: read_first_f32(dicom_object, tags::WINDOW_WIDTH),
            slice_ordering,
        }
    }

    /// Resolve display window parameters: explicit request values first,
    /// then the values stored in the series header, then `fallback`.
    /// Each parameter falls back independently.
    pub fn resolve_window(
        &self,
        center: Option<f32>,
        width: Option<f32>,
        fallback: WindowLevel,
    ) -> Result<WindowLevel> {
        let center = center.or(self.window_center).unwrap_or(fallback.center);
        let width = width.or(self.window_width).unwrap_or(fallback.width);
        WindowLevel::new(center, width)
    }

    /// Field name / value pairs for display or serialization by the caller.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let optional = |value: Option<f32>| value.map_or_else(String::new, |v| v.to_string());
        vec![
            ("PatientID", self.patient_id.clone()),
            ("PatientName", self.patient_name.clone()),
            (
                "PatientBirthDate",
                self.patient_birth_date.clone().unwrap_or_default(),
            ),
            ("Modality", self.modality.clone()),
            ("SliceThickness", self.slice_thickness.to_string()),
            (
                "PixelSpacing",
                format!("{}\\{}", self.pixel_spacing.0, self.pixel_spacing.1),
            ),
            ("Rows", self.rows.to_string()),
            ("Columns", self.columns.to_string()),
            ("NumSlices", self.num_slices.to_string()),
            ("WindowCenter", optional(self.window_center)),
            ("WindowWidth", optional(self.window_width)),
        ]
    }
}

/// Geometry and type information of a NIfTI volume.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiMetadata {
    pub dimensions: (usize, usize, usize),
    /// Voxel size per spatial axis ("zooms")
    pub voxel_size: (f32, f32, f32),
    pub data_type: String,
    /// Voxel-to-world transform, row-major
    pub affine: [[f32; 4]; 4],
}

/// Keep only the configured prefix and the last few characters of an ID.
pub fn anonymize_patient_id(patient_id: Option<&str>, config: &AnonymizationConfig) -> String {
    let Some(patient_id) = patient_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return config.id_prefix.clone();
    };

    let chars: Vec<char> = patient_id.chars().collect();
    if chars.len() < config.id_suffix_len {
        return config.id_prefix.clone();
    }
    let suffix: String = chars[chars.len() - config.id_suffix_len..].iter().collect();
    format!("{}{}", config.id_prefix, suffix)
}

/// Truncate a DICOM date (YYYYMMDD) to its year plus a fixed month/day.
pub fn anonymize_birth_date(birth_date: Option<&str>, config: &AnonymizationConfig) -> Option<String> {
    let year = birth_date?.trim().get(..4)?;
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{year}{}", config.birth_month_day))
}

fn read_text(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<String> {
    dicom_object
        .element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_f32(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<f32> {
    dicom_object.element(tag).ok()?.to_float32().ok()
}

fn read_multi_f32(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<Vec<f32>> {
    dicom_object.element(tag).ok()?.to_multi_float32().ok()
}

fn read_first_f32(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<f32> {
    read_multi_f32(dicom_object, tag)?.first().copied()
}

fn read_usize(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<usize> {
    dicom_object.element(tag).ok()?.to_int::<u32>().ok().map(|v| v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_with_window(center: Option<f32>, width: Option<f32>) -> VolumeMetadata {
        VolumeMetadata {
            patient_id: "ANON-".to_owned(),
            patient_name: "ANONYMIZED".to_owned(),
            patient_birth_date: None,
            modality: "CT".to_owned(),
            slice_thickness: 1.0,
            pixel_spacing: (0.5, 0.5),
            rows: 4,
            columns: 4,
            num_slices: 2,
            window_center: center,
            window_width: width,
            slice_ordering: SortBy::ImagePositionPatient,
        }
    }

    mod anonymization_tests {
        use super::*;

        #[test]
        fn long_ids_keep_last_four_characters() {
            let config = AnonymizationConfig::default();
            assert_eq!(anonymize_patient_id(Some("PAT-0012345"), &config), "ANON-2345");
        }

        #[test]
        fn exactly_four_characters_are_kept() {
            let config = AnonymizationConfig::default();
            assert_eq!(anonymize_patient_id(Some("1234"), &config), "ANON-1234");
        }

        #[test]
        fn short_or_missing_ids_collapse_to_prefix() {
            let config = AnonymizationConfig::default();
            assert_eq!(anonymize_patient_id(Some("123"), &config), "ANON-");
            assert_eq!(anonymize_patient_id(Some("   "), &config), "ANON-");
            assert_eq!(anonymize_patient_id(None, &config), "ANON-");
        }

        #[test]
        fn birth_date_keeps_only_the_year() {
            let config = AnonymizationConfig::default();
            assert_eq!(
                anonymize_birth_date(Some("19800512"), &config).as_deref(),
                Some("19800101")
            );
        }

        #[test]
        fn malformed_birth_date_is_dropped() {
            let config = AnonymizationConfig::default();
            assert_eq!(anonymize_birth_date(Some("19"), &config), None);
            assert_eq!(anonymize_birth_date(Some("abcd0101"), &config), None);
            assert_eq!(anonymize_birth_date(None, &config), None);
        }
    }

    mod window_resolution_tests {
        use super::*;

        #[test]
        fn request_values_take_precedence() {
            let metadata = metadata_with_window(Some(300.0), Some(1500.0));
            let window = metadata
                .resolve_window(Some(50.0), Some(350.0), WindowLevel::default())
                .unwrap();
            assert_eq!(window, WindowLevel::new(50.0, 350.0).unwrap());
        }

        #[test]
        fn stored_values_are_used_when_request_omits_them() {
            let metadata = metadata_with_window(Some(300.0), Some(1500.0));
            let window = metadata
                .resolve_window(None, Some(800.0), WindowLevel::default())
                .unwrap();
            assert_eq!(window, WindowLevel::new(300.0, 800.0).unwrap());
        }

        #[test]
        fn global_defaults_are_the_last_resort() {
            let metadata = metadata_with_window(None, None);
            let window = metadata
                .resolve_window(None, None, WindowLevel::default())
                .unwrap();
            assert_eq!(window, WindowLevel::new(40.0, 400.0).unwrap());
        }
    }

    #[test]
    fn pairs_are_keyed_by_field_name() {
        let pairs = metadata_with_window(Some(40.0), None).to_pairs();
        let lookup = |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());
        assert_eq!(lookup("Modality").as_deref(), Some("CT"));
        assert_eq!(lookup("PixelSpacing").as_deref(), Some("0.5\\0.5"));
        assert_eq!(lookup("WindowCenter").as_deref(), Some("40"));
        assert_eq!(lookup("WindowWidth").as_deref(), Some(""));
    }
}
