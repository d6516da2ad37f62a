//! 2D complex FFT wrappers around rustfft, plus quadrant shifts.
//!
//! Convention matches numpy:
//! - Forward FFT (fft2): unnormalized
//! - Inverse FFT (ifft2): normalized by 1/(nrows*ncols)
//! - fftshift moves index 0 to n/2, ifftshift undoes it (odd n included)

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// Forward 2D FFT. Matches `numpy.fft.fft2()`.
pub fn fft2(input: &Array2<Complex64>) -> Array2<Complex64> {
    transform_2d(input, FftDirection::Forward)
}

/// Inverse 2D FFT. Matches `numpy.fft.ifft2()`.
pub fn ifft2(input: &Array2<Complex64>) -> Array2<Complex64> {
    let (nrows, ncols) = input.dim();
    let mut data = transform_2d(input, FftDirection::Inverse);
    if nrows * ncols > 0 {
        let norm = 1.0 / (nrows * ncols) as f64;
        data.mapv_inplace(|c| c * norm);
    }
    data
}

/// Shift the zero-frequency sample to the array centre. Matches
/// `numpy.fft.fftshift()` over both axes.
pub fn fftshift<T: Clone>(input: &Array2<T>) -> Array2<T> {
    let (nrows, ncols) = input.dim();
    roll(input, nrows / 2, ncols / 2)
}

/// Inverse of [`fftshift`]. Matches `numpy.fft.ifftshift()`.
pub fn ifftshift<T: Clone>(input: &Array2<T>) -> Array2<T> {
    let (nrows, ncols) = input.dim();
    roll(input, nrows - nrows / 2, ncols - ncols / 2)
}

/// Circular shift: `out[(i + dr) % nr, (j + dc) % nc] = in[i, j]`.
fn roll<T: Clone>(input: &Array2<T>, dr: usize, dc: usize) -> Array2<T> {
    let (nrows, ncols) = input.dim();
    Array2::from_shape_fn((nrows, ncols), |(i, j)| {
        input[[(i + nrows - dr) % nrows, (j + ncols - dc) % ncols]].clone()
    })
}

/// Unnormalized 1D transforms along rows, then along columns.
fn transform_2d(input: &Array2<Complex64>, direction: FftDirection) -> Array2<Complex64> {
    let (nrows, ncols) = input.dim();
    if nrows == 0 || ncols == 0 {
        return input.clone();
    }
    let mut planner = FftPlanner::<f64>::new();

    // Row-major copy; rustfft processes the buffer one row-length chunk at a time
    let mut rows: Vec<Complex64> = input.iter().copied().collect();
    planner.plan_fft(ncols, direction).process(rows.as_mut_slice());

    // Columns via transpose
    let mut cols = vec![Complex64::new(0.0, 0.0); nrows * ncols];
    for i in 0..nrows {
        for j in 0..ncols {
            cols[j * nrows + i] = rows[i * ncols + j];
        }
    }
    planner.plan_fft(nrows, direction).process(cols.as_mut_slice());

    Array2::from_shape_fn((nrows, ncols), |(i, j)| cols[j * nrows + i])
}
