//! Fixture writers shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use flate2::Compression;
use flate2::write::GzEncoder;

/// Attributes of one synthetic CT slice
#[derive(Debug, Clone)]
pub struct SliceSpec {
    pub rows: u16,
    pub columns: u16,
    pub pixels: Vec<u16>,
    pub position_z: Option<f32>,
    pub instance_number: Option<i32>,
    pub rescale: Option<(f32, f32)>,
}

impl SliceSpec {
    pub fn filled(rows: u16, columns: u16, value: u16) -> Self {
        Self {
            rows,
            columns,
            pixels: vec![value; rows as usize * columns as usize],
            position_z: None,
            instance_number: None,
            rescale: None,
        }
    }

    pub fn with_pixel(mut self, row: usize, column: usize, value: u16) -> Self {
        self.pixels[row * self.columns as usize + column] = value;
        self
    }

    pub fn with_position_z(mut self, z: f32) -> Self {
        self.position_z = Some(z);
        self
    }

    pub fn with_instance_number(mut self, number: i32) -> Self {
        self.instance_number = Some(number);
        self
    }

    pub fn with_rescale(mut self, slope: f32, intercept: f32) -> Self {
        self.rescale = Some((slope, intercept));
        self
    }
}

fn ds(value: impl ToString) -> PrimitiveValue {
    PrimitiveValue::from(value.to_string())
}

fn ds_multi(values: &[f32]) -> PrimitiveValue {
    PrimitiveValue::Strs(values.iter().map(|v| v.to_string()).collect())
}

/// Write `spec` as an explicit VR little endian CT image file.
pub fn write_dicom_slice(path: &Path, spec: &SliceSpec, uid_suffix: usize) {
    let mut obj = InMemDicomObject::new_empty();
    let mut put = |tag, vr, value: PrimitiveValue| {
        obj.put(DataElement::new(tag, vr, value));
    };

    put(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(uids::CT_IMAGE_STORAGE));
    put(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(format!("1.2.826.0.1.3680043.2.1125.{uid_suffix}")),
    );
    put(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane"));
    put(tags::PATIENT_ID, VR::LO, PrimitiveValue::from("PAT-0012345"));
    put(tags::PATIENT_BIRTH_DATE, VR::DA, PrimitiveValue::from("19800512"));
    put(tags::MODALITY, VR::CS, PrimitiveValue::from("CT"));
    put(tags::SLICE_THICKNESS, VR::DS, ds(2.5));
    put(tags::PIXEL_SPACING, VR::DS, ds_multi(&[0.7, 0.8]));
    put(tags::WINDOW_CENTER, VR::DS, ds(40));
    put(tags::WINDOW_WIDTH, VR::DS, ds(400));

    if let Some(z) = spec.position_z {
        put(tags::IMAGE_POSITION_PATIENT, VR::DS, ds_multi(&[0.0, 0.0, z]));
    }
    if let Some(number) = spec.instance_number {
        put(tags::INSTANCE_NUMBER, VR::IS, ds(number));
    }
    if let Some((slope, intercept)) = spec.rescale {
        put(tags::RESCALE_SLOPE, VR::DS, ds(slope));
        put(tags::RESCALE_INTERCEPT, VR::DS, ds(intercept));
    }

    put(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16));
    put(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    );
    put(tags::ROWS, VR::US, PrimitiveValue::from(spec.rows));
    put(tags::COLUMNS, VR::US, PrimitiveValue::from(spec.columns));
    put(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16));
    put(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16));
    put(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16));
    put(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16));
    put(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(spec.pixels.as_slice().into()),
    );

    let file_object = obj
        .with_meta(FileMetaTableBuilder::new().transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN))
        .expect("should have built file meta table");
    file_object
        .write_to_file(path)
        .expect("should have written DICOM file");
}

/// Write a series into `dir`, one file per spec, named by `names`.
pub fn write_series(dir: &Path, names: &[&str], specs: &[SliceSpec]) -> Vec<PathBuf> {
    names
        .iter()
        .zip(specs)
        .enumerate()
        .map(|(i, (name, spec))| {
            let path = dir.join(name);
            write_dicom_slice(&path, spec, i + 1);
            path
        })
        .collect()
}

/// Voxel grid written into a NIfTI-1 single file
pub struct NiftiSpec {
    pub dim: (u16, u16, u16),
    pub voxel_size: (f32, f32, f32),
    /// uint8 values, first index fastest
    pub data: Vec<u8>,
    pub srow: Option<[[f32; 4]; 3]>,
}

impl NiftiSpec {
    pub fn zeros(dim: (u16, u16, u16)) -> Self {
        let len = dim.0 as usize * dim.1 as usize * dim.2 as usize;
        Self {
            dim,
            voxel_size: (1.0, 1.0, 1.0),
            data: vec![0; len],
            srow: None,
        }
    }

    pub fn set(&mut self, (i, j, k): (usize, usize, usize), value: u8) {
        let (nx, ny) = (self.dim.0 as usize, self.dim.1 as usize);
        self.data[i + j * nx + k * nx * ny] = value;
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; 352];
        let mut put = |offset: usize, raw: &[u8]| {
            bytes[offset..offset + raw.len()].copy_from_slice(raw);
        };

        put(0, &348_i32.to_le_bytes());
        let dims: [i16; 8] = [
            3,
            self.dim.0 as i16,
            self.dim.1 as i16,
            self.dim.2 as i16,
            1,
            1,
            1,
            1,
        ];
        for (i, d) in dims.iter().enumerate() {
            put(40 + i * 2, &d.to_le_bytes());
        }
        put(70, &2_i16.to_le_bytes());
        put(72, &8_i16.to_le_bytes());
        let pixdim: [f32; 8] = [
            1.0,
            self.voxel_size.0,
            self.voxel_size.1,
            self.voxel_size.2,
            0.0,
            0.0,
            0.0,
            0.0,
        ];
        for (i, p) in pixdim.iter().enumerate() {
            put(76 + i * 4, &p.to_le_bytes());
        }
        put(108, &352.0_f32.to_le_bytes());
        put(112, &1.0_f32.to_le_bytes());
        put(116, &0.0_f32.to_le_bytes());
        if let Some(srow) = self.srow {
            put(254, &1_i16.to_le_bytes());
            for (r, row) in srow.iter().enumerate() {
                for (c, v) in row.iter().enumerate() {
                    put(280 + r * 16 + c * 4, &v.to_le_bytes());
                }
            }
        }
        put(344, b"n+1\0");

        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn write(&self, path: &Path) {
        let bytes = self.to_bytes();
        let is_gz = path.extension().is_some_and(|ext| ext == "gz");
        if is_gz {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&bytes).expect("should have compressed");
            let compressed = encoder.finish().expect("should have finished gzip stream");
            fs::write(path, compressed).expect("should have written NIfTI file");
        } else {
            fs::write(path, bytes).expect("should have written NIfTI file");
        }
    }
}
