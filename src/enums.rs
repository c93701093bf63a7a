use crate::error::Error;

/// Anatomical viewing plane. The discriminant is the volume axis that is
/// held fixed when slicing: volumes are stored as (slice, row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Axial = 0,
    Coronal = 1,
    Sagittal = 2,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Coronal,
        Orientation::Sagittal,
    ];

    /// Index of the volume axis this orientation slices through
    pub fn axis(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Axial => "axial",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
        }
    }

    /// Map a view name to an orientation.
    ///
    /// Unrecognised names fall back to [`Orientation::Axial`] instead of
    /// failing, so a malformed `view` query parameter still renders
    /// something. The fallback is logged.
    pub fn from_view_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "axial" => Orientation::Axial,
            "coronal" => Orientation::Coronal,
            "sagittal" => Orientation::Sagittal,
            other => {
                log::warn!("Unrecognised view name {other:?}, falling back to axial");
                Orientation::Axial
            }
        }
    }
}

impl TryFrom<usize> for Orientation {
    type Error = Error;

    fn try_from(axis: usize) -> Result<Self, Self::Error> {
        match axis {
            0 => Ok(Orientation::Axial),
            1 => Ok(Orientation::Coronal),
            2 => Ok(Orientation::Sagittal),
            _ => Err(Error::InvalidAxis(axis)),
        }
    }
}

/// Strategy that determined the order of slices in a loaded DICOM series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// z component of ImagePositionPatient, ascending
    #[default]
    ImagePositionPatient,
    /// InstanceNumber, ascending
    InstanceNumber,
    /// Lexical order of file names. Not guaranteed to be anatomical.
    FileName,
}

impl SortBy {
    /// Whether the ordering is a last-resort heuristic
    pub fn is_degraded(self) -> bool {
        matches!(self, SortBy::FileName)
    }
}
