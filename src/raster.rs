use crate::error::{Error, Result};
use crate::overlay::Rgb;

use image::{ImageBuffer, ImageFormat, LumaA, Pixel, PixelWithColorType, Rgba};
use ndarray::{ArrayView2, ArrayView3, Axis};
use std::io::Cursor;

/// Image content to serialize. Values are expected in `[0, 1]` and are
/// clamped otherwise.
#[derive(Debug, Clone, Copy)]
pub enum Raster<'a> {
    /// (row, column)
    Gray(ArrayView2<'a, f32>),
    /// (row, column, channel) with three channels
    Rgb(ArrayView3<'a, f32>),
}

impl Raster<'_> {
    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Raster::Gray(view) => view.dim(),
            Raster::Rgb(view) => (view.len_of(Axis(0)), view.len_of(Axis(1))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Make background pixels (all channels zero) fully transparent
    pub transparent_background: bool,
}

/// Lossless PNG encoding of slices and overlays. The image is exactly the
/// data: one pixel per array element, no margins.
pub struct RasterEncoder;

impl RasterEncoder {
    #[inline]
    pub fn quantize(value: f32) -> u8 {
        if value.is_nan() {
            return 0;
        }
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn encode(raster: Raster<'_>, options: EncodeOptions) -> Result<Vec<u8>> {
        match (raster, options.transparent_background) {
            (Raster::Gray(view), false) => Self::encode_gray(view),
            (Raster::Gray(view), true) => {
                let pixels: Vec<u8> = view
                    .iter()
                    .flat_map(|&v| {
                        let gray = Self::quantize(v);
                        [gray, if gray == 0 { 0 } else { 255 }]
                    })
                    .collect();
                Self::write_png::<LumaA<u8>>(view.dim(), pixels)
            }
            (Raster::Rgb(view), transparent) => {
                let channels = view.len_of(Axis(2));
                if channels != 3 {
                    return Err(Error::UnsupportedChannels(channels));
                }
                let mut pixels = Vec::with_capacity(view.len() / 3 * 4);
                for row in view.outer_iter() {
                    for pixel in row.outer_iter() {
                        let rgb = [
                            Self::quantize(pixel[0]),
                            Self::quantize(pixel[1]),
                            Self::quantize(pixel[2]),
                        ];
                        let alpha = if transparent && rgb == [0, 0, 0] { 0 } else { 255 };
                        pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], alpha]);
                    }
                }
                if transparent {
                    Self::write_png::<Rgba<u8>>(raster.dim(), pixels)
                } else {
                    let opaque: Vec<u8> = pixels
                        .chunks_exact(4)
                        .flat_map(|px| [px[0], px[1], px[2]])
                        .collect();
                    Self::write_png::<image::Rgb<u8>>(raster.dim(), opaque)
                }
            }
        }
    }

    /// Single-channel 8-bit PNG
    pub fn encode_gray(view: ArrayView2<'_, f32>) -> Result<Vec<u8>> {
        let pixels: Vec<u8> = view.iter().map(|&v| Self::quantize(v)).collect();
        Self::write_png::<image::Luma<u8>>(view.dim(), pixels)
    }

    /// Three-channel 8-bit PNG
    pub fn encode_rgb(view: ArrayView3<'_, f32>) -> Result<Vec<u8>> {
        Self::encode(Raster::Rgb(view), EncodeOptions::default())
    }

    /// RGBA PNG of a single mask: `color` where set, transparent elsewhere.
    pub fn encode_mask(mask: ArrayView2<'_, u8>, color: Rgb) -> Result<Vec<u8>> {
        let tint = color.map(Self::quantize);
        let pixels: Vec<u8> = mask
            .iter()
            .flat_map(|&v| {
                if v == 0 {
                    [0, 0, 0, 0]
                } else {
                    [tint[0], tint[1], tint[2], 255]
                }
            })
            .collect();
        Self::write_png::<Rgba<u8>>(mask.dim(), pixels)
    }

    fn write_png<P>((height, width): (usize, usize), pixels: Vec<P::Subpixel>) -> Result<Vec<u8>>
    where
        P: Pixel + PixelWithColorType,
        [P::Subpixel]: image::EncodableLayout,
    {
        let too_large = || Error::RasterTooLarge { width, height };
        let w = u32::try_from(width).map_err(|_| too_large())?;
        let h = u32::try_from(height).map_err(|_| too_large())?;
        let image = ImageBuffer::<P, Vec<P::Subpixel>>::from_raw(w, h, pixels).ok_or_else(too_large)?;

        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Free-function form of [`RasterEncoder::encode`].
pub fn encode_raster(raster: Raster<'_>, transparent_background: bool) -> Result<Vec<u8>> {
    RasterEncoder::encode(
        raster,
        EncodeOptions {
            transparent_background,
        },
    )
}
