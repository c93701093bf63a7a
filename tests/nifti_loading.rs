//! Integration tests for reading NIfTI label volumes.

mod common;

use std::fs;

use common::NiftiSpec;
use dicom_roi_viewer::{ErrorKind, NiftiLoader, label_from_filename, load_nifti_volume};
use tempfile::TempDir;

fn labelled_spec() -> NiftiSpec {
    let mut spec = NiftiSpec::zeros((4, 5, 6));
    spec.voxel_size = (0.5, 0.75, 2.0);
    spec.srow = Some([
        [0.5, 0.0, 0.0, -1.0],
        [0.0, 0.75, 0.0, -2.0],
        [0.0, 0.0, 2.0, -3.0],
    ]);
    spec.set((1, 2, 3), 2);
    spec.set((3, 4, 5), 1);
    spec
}

#[test]
fn compressed_label_volume_keeps_voxel_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("liver.nii.gz");
    labelled_spec().write(&path);

    let (volume, metadata) = load_nifti_volume(&path).unwrap();
    assert_eq!(volume.dim(), (4, 5, 6));
    assert_eq!(volume.data[[1, 2, 3]], 2.0);
    assert_eq!(volume.data[[3, 4, 5]], 1.0);
    assert_eq!(volume.data.iter().filter(|&&v| v != 0.0).count(), 2);

    assert_eq!(metadata.dimensions, (4, 5, 6));
    assert_eq!(metadata.voxel_size, (0.5, 0.75, 2.0));
    assert!(metadata.data_type.contains("Uint8"));
    assert_eq!(metadata.affine[0], [0.5, 0.0, 0.0, -1.0]);
    assert_eq!(metadata.affine[2], [0.0, 0.0, 2.0, -3.0]);
    assert_eq!(metadata.affine[3], [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(label_from_filename(&path), "liver");
}

#[test]
fn uncompressed_file_reads_the_same_values() {
    let dir = TempDir::new().unwrap();
    let compressed = dir.path().join("roi.nii.gz");
    let plain = dir.path().join("roi.nii");
    labelled_spec().write(&compressed);
    labelled_spec().write(&plain);

    let (a, _) = NiftiLoader::load(&compressed).unwrap();
    let (b, _) = NiftiLoader::load(&plain).unwrap();
    assert_eq!(a.data, b.data);
    assert_eq!(a.spacing, (0.5, 0.75, 2.0));
}

#[test]
fn missing_sform_falls_back_to_centred_affine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.nii");
    NiftiSpec::zeros((3, 3, 3)).write(&path);

    let (_, metadata) = NiftiLoader::load(&path).unwrap();
    assert_eq!(metadata.affine[0], [-1.0, 0.0, 0.0, 1.0]);
    assert_eq!(metadata.affine[1], [0.0, 1.0, 0.0, -1.0]);
    assert_eq!(metadata.affine[2], [0.0, 0.0, 1.0, -1.0]);
}

#[test]
fn garbage_file_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.nii");
    fs::write(&path, b"definitely not a nifti header").unwrap();

    let err = NiftiLoader::load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
}
