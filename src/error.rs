use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of [`Error`] for callers that map failures onto
/// responses (e.g. HTTP status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source files missing, unreadable or undecodable
    Load,
    /// Inconsistent geometry between slices or between a slice and an overlay
    Geometry,
    /// Slice index or axis out of bounds
    Range,
    /// Invalid window parameters
    Window,
    /// Raster serialization failed
    Encode,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No DICOM files found in {}", .0.display())]
    NoDicomFiles(PathBuf),

    #[error("No valid DICOM files in {}", .0.display())]
    NoValidImages(PathBuf),

    #[error(
        "Inconsistent slice geometry in {}: expected {expected:?}, found {found:?}",
        .path.display()
    )]
    InconsistentSliceGeometry {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Failed to read DICOM file {}: {source}", .path.display())]
    Dicom {
        path: PathBuf,
        #[source]
        source: dicom::object::ReadError,
    },

    #[error("No decodable pixel data in {}", .0.display())]
    UndecodablePixelData(PathBuf),

    #[error("Failed to load NIfTI file {}: {source}", .path.display())]
    Nifti {
        path: PathBuf,
        #[source]
        source: nifti::error::NiftiError,
    },

    #[error("Unsupported NIfTI dimensions {dim:?} in {}: expected a 3-D volume", .path.display())]
    UnsupportedNiftiShape { path: PathBuf, dim: Vec<u16> },

    #[error("Slice index {index} out of range for axis {axis} of length {len}")]
    IndexOutOfRange { axis: usize, index: usize, len: usize },

    #[error("Axis {0} out of range, expected 0, 1 or 2")]
    InvalidAxis(usize),

    #[error("Target shape {0:?} has an empty axis")]
    EmptyShape((usize, usize, usize)),

    #[error("Overlay slice shape {found:?} does not match base slice shape {expected:?}")]
    OverlayShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid window parameters: center {center}, width {width}")]
    InvalidWindow { center: f32, width: f32 },

    #[error("ROI index {index} out of range, {count} ROI(s) loaded")]
    RoiIndexOutOfRange { index: usize, count: usize },

    #[error("Raster encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Raster with {0} channel(s) cannot be encoded, expected 1 or 3")]
    UnsupportedChannels(usize),

    #[error("Raster of {width}x{height} does not fit the encoder")]
    RasterTooLarge { width: usize, height: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoDicomFiles(_)
            | Error::NoValidImages(_)
            | Error::Dicom { .. }
            | Error::UndecodablePixelData(_)
            | Error::Nifti { .. }
            | Error::UnsupportedNiftiShape { .. }
            | Error::Io(_) => ErrorKind::Load,
            Error::InconsistentSliceGeometry { .. }
            | Error::EmptyShape(_)
            | Error::OverlayShapeMismatch { .. } => ErrorKind::Geometry,
            Error::IndexOutOfRange { .. }
            | Error::InvalidAxis(_)
            | Error::RoiIndexOutOfRange { .. } => ErrorKind::Range,
            Error::InvalidWindow { .. } => ErrorKind::Window,
            Error::Encode(_) | Error::UnsupportedChannels(_) | Error::RasterTooLarge { .. } => {
                ErrorKind::Encode
            }
        }
    }
}
