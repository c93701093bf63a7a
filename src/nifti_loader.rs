use crate::error::{Error, Result};
use crate::metadata::NiftiMetadata;
use crate::volume::Volume;

use ndarray::Array3;
use nifti::{NiftiHeader, NiftiObject, NiftiVolume, RandomAccessNiftiVolume, ReaderOptions};
use std::path::Path;

pub struct NiftiLoader;

impl NiftiLoader {
    /// Load a `.nii` or `.nii.gz` file into a floating point volume.
    ///
    /// The array keeps the file's voxel index order `(i, j, k)` and values
    /// are scaled by `scl_slope`/`scl_inter` when the header sets them.
    /// Trailing singleton dimensions are dropped; anything beyond three
    /// non-singleton dimensions is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<(Volume, NiftiMetadata)> {
        let path = path.as_ref();
        let nifti_error = |source| Error::Nifti {
            path: path.to_path_buf(),
            source,
        };

        let obj = ReaderOptions::new().read_file(path).map_err(nifti_error)?;
        let header = obj.header().clone();
        let volume = obj.into_volume();

        let dim = volume.dim().to_vec();
        let shape = Self::spatial_shape(&dim).ok_or_else(|| Error::UnsupportedNiftiShape {
            path: path.to_path_buf(),
            dim: dim.clone(),
        })?;

        let mut data = Array3::<f32>::zeros(shape);
        let mut coords = vec![0u16; dim.len()];
        for ((i, j, k), value) in data.indexed_iter_mut() {
            for (axis, index) in [i, j, k].into_iter().enumerate().take(coords.len()) {
                coords[axis] = index as u16;
            }
            *value = volume.get_f32(&coords).map_err(nifti_error)?;
        }

        let voxel_size = (
            Self::zoom(&header, 1),
            Self::zoom(&header, 2),
            Self::zoom(&header, 3),
        );
        let metadata = NiftiMetadata {
            dimensions: shape,
            voxel_size,
            data_type: format!("{:?}", volume.data_type()),
            affine: Self::get_affine(&header),
        };
        log::info!(
            "Loaded NIfTI volume {} with shape {:?} ({})",
            path.display(),
            shape,
            metadata.data_type
        );

        Ok((
            Volume::new(data, (voxel_size.0, voxel_size.1, voxel_size.2)),
            metadata,
        ))
    }

    fn spatial_shape(dim: &[u16]) -> Option<(usize, usize, usize)> {
        if dim.is_empty() || dim.iter().skip(3).any(|&d| d > 1) {
            return None;
        }
        let at = |axis: usize| dim.get(axis).map_or(1, |&d| usize::from(d.max(1)));
        Some((at(0), at(1), at(2)))
    }

    /// Voxel size along spatial axis 1..=3, 1.0 when unset
    fn zoom(header: &NiftiHeader, axis: usize) -> f32 {
        let ndim = usize::from(header.dim[0]);
        match header.pixdim[axis] {
            size if axis <= ndim && size.is_finite() && size > 0.0 => size,
            _ => 1.0,
        }
    }

    /// Voxel-to-world transform: sform when set, else qform, else a base
    /// affine centred on the volume with a flipped first axis.
    pub fn get_affine(header: &NiftiHeader) -> [[f32; 4]; 4] {
        if header.sform_code > 0 {
            return [header.srow_x, header.srow_y, header.srow_z, [0.0, 0.0, 0.0, 1.0]];
        }
        if header.qform_code > 0 {
            return Self::qform_affine(header);
        }

        let zooms = [Self::zoom(header, 1), Self::zoom(header, 2), Self::zoom(header, 3)];
        let centre = |axis: usize| {
            let n = f32::from(header.dim[axis + 1].max(1));
            (n - 1.0) / 2.0 * zooms[axis]
        };
        [
            [-zooms[0], 0.0, 0.0, centre(0)],
            [0.0, zooms[1], 0.0, -centre(1)],
            [0.0, 0.0, zooms[2], -centre(2)],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    fn qform_affine(header: &NiftiHeader) -> [[f32; 4]; 4] {
        let (b, c, d) = (
            f64::from(header.quatern_b),
            f64::from(header.quatern_c),
            f64::from(header.quatern_d),
        );
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let rotation = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
        ];
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let scale = [
            f64::from(Self::zoom(header, 1)),
            f64::from(Self::zoom(header, 2)),
            f64::from(Self::zoom(header, 3)) * qfac,
        ];
        let offset = [header.quatern_x, header.quatern_y, header.quatern_z];

        let mut affine = [[0.0f32; 4]; 4];
        for (row, out) in affine.iter_mut().take(3).enumerate() {
            for col in 0..3 {
                out[col] = (rotation[row][col] * scale[col]) as f32;
            }
            out[3] = offset[row];
        }
        affine[3][3] = 1.0;
        affine
    }
}

/// Display label for a NIfTI file: the file name with its extension
/// stripped twice, so `liver.nii.gz` and `liver.nii` both become `liver`.
pub fn label_from_filename(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let once = path.file_stem().map(Path::new);
    once.and_then(Path::file_stem)
        .or_else(|| path.file_name())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
