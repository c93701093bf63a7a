use crate::overlay::{DEFAULT_PALETTE, Rgb};
use crate::windowing::WindowLevel;

/// Rules applied to patient-identifying header fields at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizationConfig {
    pub id_prefix: String,
    /// Number of trailing PatientID characters kept after the prefix
    pub id_suffix_len: usize,
    pub name_placeholder: String,
    /// Month and day appended to the retained birth year (MMDD)
    pub birth_month_day: String,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            id_prefix: "ANON-".to_owned(),
            id_suffix_len: 4,
            name_placeholder: "ANONYMIZED".to_owned(),
            birth_month_day: "0101".to_owned(),
        }
    }
}

/// Tunables of the imaging pipeline. Every field has a declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Used when neither the request nor the volume header provides a window
    pub default_window: WindowLevel,
    pub overlay_alpha: f32,
    pub palette: Vec<Rgb>,
    /// Stamp a colour swatch per legend entry into composited rasters
    pub legend_swatches: bool,
    /// File extensions recognised as DICOM, compared case-insensitively
    pub dicom_extensions: Vec<String>,
    pub anonymization: AnonymizationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_window: WindowLevel::default(),
            overlay_alpha: 0.5,
            palette: DEFAULT_PALETTE.to_vec(),
            legend_swatches: false,
            dicom_extensions: vec!["dcm".to_owned()],
            anonymization: AnonymizationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_default_window(mut self, window: WindowLevel) -> Self {
        self.default_window = window;
        self
    }

    /// Alpha is clamped to `[0, 1]`.
    pub fn with_overlay_alpha(mut self, alpha: f32) -> Self {
        self.overlay_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// An empty palette is ignored.
    pub fn with_palette(mut self, palette: Vec<Rgb>) -> Self {
        if !palette.is_empty() {
            self.palette = palette;
        }
        self
    }

    pub fn with_legend_swatches(mut self, enabled: bool) -> Self {
        self.legend_swatches = enabled;
        self
    }

    pub fn with_dicom_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dicom_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_anonymization(mut self, anonymization: AnonymizationConfig) -> Self {
        self.anonymization = anonymization;
        self
    }

    pub(crate) fn is_dicom_extension(&self, extension: &str) -> bool {
        self.dicom_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
