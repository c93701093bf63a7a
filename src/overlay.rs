use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::windowing::ensure_unit_range;

use ndarray::{Array3, ArrayView2, Axis, Zip, s};

/// Linear RGB colour with channels in `[0, 1]`
pub type Rgb = [f32; 3];

/// Ten distinct colours; ROI `i` gets `palette[i % palette.len()]`.
pub const DEFAULT_PALETTE: [Rgb; 10] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.5, 0.0],
    [0.5, 0.0, 1.0],
    [0.0, 0.5, 0.0],
    [0.5, 0.5, 1.0],
];

/// One ROI cross-section to draw, in draw order.
#[derive(Debug, Clone, Copy)]
pub struct RoiSlice<'a> {
    pub mask: ArrayView2<'a, u8>,
    pub name: Option<&'a str>,
}

impl<'a> RoiSlice<'a> {
    pub fn new(mask: ArrayView2<'a, u8>, name: Option<&'a str>) -> Self {
        Self { mask, name }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub name: String,
    pub color: Rgb,
    /// Position of the ROI in the input list
    pub roi_index: usize,
}

/// Composited raster: (row, column, channel) in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub rgb: Array3<f32>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    alpha: f32,
    palette: Vec<Rgb>,
    legend_swatches: bool,
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new(0.5, DEFAULT_PALETTE.to_vec())
    }
}

impl OverlayCompositor {
    /// An empty palette falls back to [`DEFAULT_PALETTE`].
    pub fn new(alpha: f32, palette: Vec<Rgb>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            palette
        };
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            palette,
            legend_swatches: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.overlay_alpha, config.palette.clone())
            .with_legend_swatches(config.legend_swatches)
    }

    pub fn with_legend_swatches(mut self, enabled: bool) -> Self {
        self.legend_swatches = enabled;
        self
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn color_for(&self, roi_index: usize) -> Rgb {
        self.palette[roi_index % self.palette.len()]
    }

    /// Blend ROI masks over a grayscale slice.
    ///
    /// The base is min-max normalized over the slice unless it already lies
    /// in `[0, 1]`. ROIs are drawn in list order with
    /// `out = base * (1 - alpha) + color * alpha`, so later ROIs dominate
    /// earlier ones where they overlap. Empty masks are skipped and get no
    /// legend entry.
    pub fn composite(&self, base: ArrayView2<'_, f32>, rois: &[RoiSlice<'_>]) -> Result<Overlay> {
        let (height, width) = base.dim();
        for roi in rois {
            if roi.mask.dim() != (height, width) {
                return Err(Error::OverlayShapeMismatch {
                    expected: (height, width),
                    found: roi.mask.dim(),
                });
            }
        }

        let gray = ensure_unit_range(base);
        let mut rgb = Array3::<f32>::zeros((height, width, 3));
        for channel in 0..3 {
            rgb.slice_mut(s![.., .., channel]).assign(&gray);
        }

        let alpha = self.alpha;
        let mut legend = Vec::new();
        for (roi_index, roi) in rois.iter().enumerate() {
            if roi.mask.iter().all(|&v| v == 0) {
                continue;
            }
            let color = self.color_for(roi_index);

            Zip::from(rgb.lanes_mut(Axis(2)))
                .and(&roi.mask)
                .for_each(|mut pixel, &inside| {
                    if inside != 0 {
                        for (value, tint) in pixel.iter_mut().zip(color) {
                            *value = *value * (1.0 - alpha) + tint * alpha;
                        }
                    }
                });

            if let Some(name) = roi.name {
                legend.push(LegendEntry {
                    name: name.to_owned(),
                    color,
                    roi_index,
                });
            }
        }

        rgb.mapv_inplace(|v| v.clamp(0.0, 1.0));
        if self.legend_swatches {
            draw_legend_swatches(&mut rgb, &legend);
        }

        Ok(Overlay { rgb, legend })
    }
}

/// Paint one opaque square per legend entry down the top-left corner.
/// Swatches that do not fit are clipped.
pub fn draw_legend_swatches(rgb: &mut Array3<f32>, legend: &[LegendEntry]) {
    let (height, width, _) = rgb.dim();
    let size = (height.min(width) / 16).max(2);

    for (i, entry) in legend.iter().enumerate() {
        let top = 1 + i * (size + 1);
        if top >= height || width <= 1 {
            break;
        }
        let bottom = (top + size).min(height);
        let right = (1 + size).min(width);
        for (channel, &value) in entry.color.iter().enumerate() {
            rgb.slice_mut(s![top..bottom, 1..right, channel]).fill(value);
        }
    }
}
