use super::ArrayBackend;
use crate::StrError;
use ndarray::{Array3, Axis};

/// Maps an index outside [0, n) back into the range by mirroring about the end entries
///
/// The end entries are not repeated, i.e., `-1 → 1` and `n → n - 2` (reflect-101 border mode).
pub fn reflect_101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Smooths a field with a box kernel along every axis longer than one entry
///
/// The window covering index `i` spans `[i - size/2, i - size/2 + size)` with reflect-101
/// borders. Each one-dimensional pass divides the window sum by `sqrt(size)`, thus white noise
/// keeps its standard deviation after smoothing.
pub fn box_filter(backend: &dyn ArrayBackend, field: &Array3<f64>, size: usize) -> Result<Array3<f64>, StrError> {
    if size == 0 {
        return Err("the size of the box kernel must be ≥ 1");
    }
    let mut current = field.clone();
    for axis in 0..3 {
        let n = current.len_of(Axis(axis));
        if n < 2 {
            continue;
        }
        let scale = 1.0 / f64::sqrt(size as f64);
        let start = -((size / 2) as isize);
        let mut next = Array3::<f64>::zeros(current.raw_dim());
        let source = &current;
        backend.fill_with(next.view_mut(), &|idx| {
            let (i, j, k) = idx;
            let center = [i, j, k][axis] as isize;
            let mut sum = 0.0;
            for offset in 0..size as isize {
                let m = reflect_101(center + start + offset, n);
                sum += match axis {
                    0 => source[[m, j, k]],
                    1 => source[[i, m, k]],
                    _ => source[[i, j, m]],
                };
            }
            sum * scale
        });
        current = next;
    }
    Ok(current)
}

/// Evaluates the Catmull-Rom cubic through four equally spaced values at t ∈ [0, 1]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1 + (p2 - p0) * t + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2 + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Returns the coarse coordinate of a fine entry (the corners of both grids coincide)
fn coarse_coordinate(i_fine: usize, n_coarse: usize, n_fine: usize) -> f64 {
    if n_coarse < 2 || n_fine < 2 {
        return 0.0;
    }
    (i_fine as f64) * ((n_coarse - 1) as f64) / ((n_fine - 1) as f64)
}

/// Resamples a field along one axis with cubic interpolation
fn resample_axis(backend: &dyn ArrayBackend, field: &Array3<f64>, axis: usize, n_fine: usize) -> Array3<f64> {
    let mut shape = [field.shape()[0], field.shape()[1], field.shape()[2]];
    let n_coarse = shape[axis];
    shape[axis] = n_fine;
    let mut fine = Array3::<f64>::zeros(shape);
    let last = n_coarse as isize - 1;
    backend.fill_with(fine.view_mut(), &|idx| {
        let (i, j, k) = idx;
        let x = coarse_coordinate([i, j, k][axis], n_coarse, n_fine);
        let base = f64::floor(x) as isize;
        let t = x - base as f64;
        let value = |m: usize| match axis {
            0 => field[[m, j, k]],
            1 => field[[i, m, k]],
            _ => field[[i, j, m]],
        };
        // ghost entries are extrapolated linearly from the two end entries
        let at = |m: isize| {
            if last == 0 {
                value(0)
            } else if m < 0 {
                value(0) + (m as f64) * (value(1) - value(0))
            } else if m > last {
                let l = last as usize;
                value(l) + ((m - last) as f64) * (value(l) - value(l - 1))
            } else {
                value(m as usize)
            }
        };
        catmull_rom(at(base - 1), at(base), at(base + 1), at(base + 2), t)
    });
    fine
}

/// Upsamples a coarse field onto a fine grid with separable cubic (Catmull-Rom) interpolation
///
/// The first and last entries of each axis of both grids coincide. The interpolant passes
/// through the coarse values, thus a constant field stays constant.
pub fn cubic_resample(
    backend: &dyn ArrayBackend,
    coarse: &Array3<f64>,
    shape: (usize, usize, usize),
) -> Result<Array3<f64>, StrError> {
    if coarse.is_empty() {
        return Err("cannot resample an empty field");
    }
    if shape.0 == 0 || shape.1 == 0 || shape.2 == 0 {
        return Err("the shape of the resampled field must not have zero entries");
    }
    let mut current = coarse.clone();
    for (axis, n_fine) in [shape.0, shape.1, shape.2].into_iter().enumerate() {
        current = resample_axis(backend, &current, axis, n_fine);
    }
    Ok(current)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{box_filter, cubic_resample, reflect_101};
    use crate::array::SerialBackend;
    use crate::StrError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn reflect_101_works() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(0, 5), 0);
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-3, 2), 1);
        assert_eq!(reflect_101(7, 1), 0);
    }

    #[test]
    fn box_filter_works() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        // constant field: each pass multiplies by size/sqrt(size) = sqrt(size)
        let field = Array3::from_elem((1, 5, 4), 2.0);
        let smooth = box_filter(&backend, &field, 4)?;
        assert_eq!(smooth.shape(), &[1, 5, 4]);
        for v in smooth.iter() {
            assert_relative_eq!(*v, 2.0 * 4.0, epsilon = 1e-14);
        }
        // impulse along z (the y and x axes have length 1 and are skipped)
        let mut field = Array3::<f64>::zeros((1, 7, 1));
        field[[0, 3, 0]] = 1.0;
        let smooth = box_filter(&backend, &field, 3)?;
        let s = 1.0 / f64::sqrt(3.0);
        let expected = [0.0, 0.0, s, s, s, 0.0, 0.0];
        for j in 0..7 {
            assert_relative_eq!(smooth[[0, j, 0]], expected[j], epsilon = 1e-15);
        }
        assert_eq!(box_filter(&backend, &field, 0).err(), Some("the size of the box kernel must be ≥ 1"));
        Ok(())
    }

    #[test]
    fn cubic_resample_works() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        // linear ramp along x is reproduced exactly
        let coarse = Array3::from_shape_fn((1, 2, 4), |(_, _, k)| k as f64);
        let fine = cubic_resample(&backend, &coarse, (3, 5, 10))?;
        assert_eq!(fine.shape(), &[3, 5, 10]);
        for ((_, _, k), v) in fine.indexed_iter() {
            assert_relative_eq!(*v, (k as f64) / 3.0, epsilon = 1e-13);
        }
        // coarse values are kept at the coinciding nodes
        let coarse = Array3::from_shape_fn((1, 1, 3), |(_, _, k)| [1.0, -2.0, 0.5][k]);
        let fine = cubic_resample(&backend, &coarse, (1, 1, 5))?;
        assert_relative_eq!(fine[[0, 0, 0]], 1.0, epsilon = 1e-15);
        assert_relative_eq!(fine[[0, 0, 2]], -2.0, epsilon = 1e-15);
        assert_relative_eq!(fine[[0, 0, 4]], 0.5, epsilon = 1e-15);
        Ok(())
    }

    #[test]
    fn cubic_resample_captures_errors() {
        let backend = SerialBackend::new();
        let coarse = Array3::<f64>::zeros((0, 1, 1));
        assert_eq!(
            cubic_resample(&backend, &coarse, (1, 1, 1)).err(),
            Some("cannot resample an empty field")
        );
        let coarse = Array3::<f64>::zeros((1, 1, 1));
        assert_eq!(
            cubic_resample(&backend, &coarse, (1, 0, 1)).err(),
            Some("the shape of the resampled field must not have zero entries")
        );
    }
}
