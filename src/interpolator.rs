use ndarray::{Array3, ArrayView3, s};

pub(crate) type Shape3 = (usize, usize, usize);

pub(crate) struct Interpolator;

impl Interpolator {
    /// Output shape of a zoom by `target / source` per axis, rounded the
    /// same way a zoom factor is applied. Usually equal to `target`, but
    /// the float ratio may round to a neighbouring size.
    pub(crate) fn get_zoomed_dimensions(source: Shape3, target: Shape3) -> Shape3 {
        let zoom = |src: usize, dst: usize| -> usize {
            let factor = dst as f64 / src as f64;
            (src as f64 * factor).round().max(1.0) as usize
        };
        (
            zoom(source.0, target.0),
            zoom(source.1, target.1),
            zoom(source.2, target.2),
        )
    }

    /// Nearest source index for output index `o` when mapping an axis of
    /// `src_len` samples onto `out_len` samples with aligned corners.
    #[inline]
    pub(crate) fn nearest_index(o: usize, src_len: usize, out_len: usize) -> usize {
        if out_len <= 1 || src_len <= 1 {
            return 0;
        }
        let position = o as f64 * (src_len - 1) as f64 / (out_len - 1) as f64;
        (position.round() as usize).min(src_len - 1)
    }

    /// Nearest-neighbour resampling. Output values are always copies of
    /// source values, never blends.
    pub(crate) fn nearest_neighbor<A: Copy + Default>(
        source: ArrayView3<'_, A>,
        shape: Shape3,
    ) -> Array3<A> {
        let (sd, sh, sw) = source.dim();
        let z_map: Vec<usize> = (0..shape.0).map(|o| Self::nearest_index(o, sd, shape.0)).collect();
        let y_map: Vec<usize> = (0..shape.1).map(|o| Self::nearest_index(o, sh, shape.1)).collect();
        let x_map: Vec<usize> = (0..shape.2).map(|o| Self::nearest_index(o, sw, shape.2)).collect();

        Array3::from_shape_fn(shape, |(z, y, x)| source[[z_map[z], y_map[y], x_map[x]]])
    }

    /// Force `array` to `shape`: short axes are zero-padded at the high end,
    /// long axes are cropped from the high end.
    pub(crate) fn fit_to_shape<A: Copy + Default>(array: Array3<A>, shape: Shape3) -> Array3<A> {
        let dim = array.dim();
        if dim == shape {
            return array;
        }
        log::debug!("Resampled shape {dim:?} differs from target {shape:?}, padding/cropping");

        let keep = (dim.0.min(shape.0), dim.1.min(shape.1), dim.2.min(shape.2));
        let mut fitted = Array3::<A>::default(shape);
        fitted
            .slice_mut(s![..keep.0, ..keep.1, ..keep.2])
            .assign(&array.slice(s![..keep.0, ..keep.1, ..keep.2]));
        fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoomed_dimensions_match_exact_ratios() {
        assert_eq!(
            Interpolator::get_zoomed_dimensions((64, 64, 64), (128, 256, 256)),
            (128, 256, 256)
        );
        assert_eq!(
            Interpolator::get_zoomed_dimensions((10, 20, 30), (7, 41, 30)),
            (7, 41, 30)
        );
    }

    #[test]
    fn nearest_index_aligns_corners() {
        assert_eq!(Interpolator::nearest_index(0, 4, 8), 0);
        assert_eq!(Interpolator::nearest_index(7, 4, 8), 3);
        assert_eq!(Interpolator::nearest_index(0, 5, 1), 0);
        assert_eq!(Interpolator::nearest_index(3, 1, 4), 0);
    }

    #[test]
    fn nearest_neighbor_only_copies_source_values() {
        let source = Array3::from_shape_fn((3, 3, 3), |(z, y, x)| ((z + y + x) % 2) as u8);
        let resampled = Interpolator::nearest_neighbor(source.view(), (7, 5, 2));
        assert_eq!(resampled.dim(), (7, 5, 2));
        assert!(resampled.iter().all(|&v| v == 0 || v == 1));
        assert_eq!(resampled[[0, 0, 0]], source[[0, 0, 0]]);
        assert_eq!(resampled[[6, 4, 1]], source[[2, 2, 2]]);
    }

    #[test]
    fn identity_shape_is_a_copy() {
        let source = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (z * 12 + y * 4 + x) as u8);
        assert_eq!(Interpolator::nearest_neighbor(source.view(), (2, 3, 4)), source);
    }

    #[test]
    fn fit_pads_and_crops_at_the_high_end() {
        let source = Array3::from_elem((2, 5, 3), 1u8);
        let fitted = Interpolator::fit_to_shape(source, (4, 3, 3));
        assert_eq!(fitted.dim(), (4, 3, 3));
        assert!(fitted.slice(s![..2, .., ..]).iter().all(|&v| v == 1));
        assert!(fitted.slice(s![2.., .., ..]).iter().all(|&v| v == 0));
    }

    #[test]
    fn fit_is_a_no_op_for_matching_shape() {
        let source = Array3::from_elem((2, 2, 2), 3u8);
        assert_eq!(Interpolator::fit_to_shape(source.clone(), (2, 2, 2)), source);
    }
}
