use crate::base::Backend;
use crate::StrError;
use ndarray::parallel::prelude::*;
use ndarray::{ArrayView3, ArrayViewMut3, Zip};

/// Defines the index of an entry of a 3D array (y, z, x)
pub type Idx3 = (usize, usize, usize);

/// Defines the capability interface for the element-wise and reduction operations
///
/// Every component of the solver receives a reference to an `ArrayBackend` and expresses its
/// computations as element-wise updates. Thus, the same component code runs serially or on
/// a thread pool.
pub trait ArrayBackend: Send + Sync {
    /// Returns a short name for logging
    fn name(&self) -> &'static str;

    /// Replaces each entry of `out` by `f(index, old_value)`
    ///
    /// The function must only read arrays other than `out`.
    fn update(&self, out: ArrayViewMut3<f64>, f: &(dyn Fn(Idx3, f64) -> f64 + Sync));

    /// Returns the sum of all entries
    fn sum(&self, a: ArrayView3<f64>) -> f64;

    /// Returns the (min, max) pair of all entries
    ///
    /// Returns (NaN, NaN) if any entry is NaN and (+∞, -∞) if the array is empty.
    fn min_max(&self, a: ArrayView3<f64>) -> (f64, f64);

    /// Sets each entry of `out` to `f(index)`
    fn fill_with(&self, out: ArrayViewMut3<f64>, f: &(dyn Fn(Idx3) -> f64 + Sync)) {
        self.update(out, &|idx, _| f(idx));
    }

    /// Returns the mean of all entries (zero if empty)
    fn mean(&self, a: ArrayView3<f64>) -> f64 {
        let n = a.len();
        if n == 0 {
            return 0.0;
        }
        self.sum(a) / (n as f64)
    }
}

/// Runs the operations on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialBackend;

/// Runs the operations on a dedicated thread pool
pub struct ParallelBackend {
    /// Holds the pool where all operations are executed
    thread_pool: rayon::ThreadPool,
}

impl SerialBackend {
    /// Allocates a new instance
    pub fn new() -> Self {
        SerialBackend
    }
}

impl ParallelBackend {
    /// Allocates a new instance
    pub fn new(n_thread: usize) -> Result<Self, StrError> {
        if n_thread == 0 {
            return Err("the number of threads must be ≥ 1");
        }
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_thread)
            .build()
            .map_err(|_| "cannot build the thread pool")?;
        Ok(ParallelBackend { thread_pool })
    }

    /// Returns the number of threads of the pool
    pub fn n_thread(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

/// Allocates the backend selected in the configuration
pub fn new_backend(option: &Backend) -> Result<Box<dyn ArrayBackend>, StrError> {
    match *option {
        Backend::Serial => Ok(Box::new(SerialBackend::new())),
        Backend::Parallel { n_thread } => Ok(Box::new(ParallelBackend::new(n_thread)?)),
    }
}

/// Merges two (min, max) pairs propagating NaN
fn merge_min_max(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    if a.0.is_nan() || b.0.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    (f64::min(a.0, b.0), f64::max(a.1, b.1))
}

impl ArrayBackend for SerialBackend {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn update(&self, out: ArrayViewMut3<f64>, f: &(dyn Fn(Idx3, f64) -> f64 + Sync)) {
        Zip::indexed(out).for_each(|idx, v| *v = f(idx, *v));
    }

    fn sum(&self, a: ArrayView3<f64>) -> f64 {
        a.sum()
    }

    fn min_max(&self, a: ArrayView3<f64>) -> (f64, f64) {
        a.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &v| merge_min_max(acc, (v, v)))
    }
}

impl ArrayBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn update(&self, out: ArrayViewMut3<f64>, f: &(dyn Fn(Idx3, f64) -> f64 + Sync)) {
        self.thread_pool.install(|| {
            Zip::indexed(out).par_for_each(|idx, v| *v = f(idx, *v));
        });
    }

    fn sum(&self, a: ArrayView3<f64>) -> f64 {
        self.thread_pool.install(|| a.into_par_iter().map(|&v| v).sum::<f64>())
    }

    fn min_max(&self, a: ArrayView3<f64>) -> (f64, f64) {
        let identity = || (f64::INFINITY, f64::NEG_INFINITY);
        self.thread_pool.install(|| {
            a.into_par_iter()
                .fold(identity, |acc, &v| merge_min_max(acc, (v, v)))
                .reduce(identity, merge_min_max)
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{new_backend, ArrayBackend, ParallelBackend, SerialBackend};
    use crate::base::Backend;
    use crate::StrError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn check_backend(backend: &dyn ArrayBackend) {
        let mut a = Array3::<f64>::zeros((3, 4, 5));
        backend.fill_with(a.view_mut(), &|(i, j, k)| (100 * i + 10 * j + k) as f64);
        assert_eq!(a[[2, 3, 4]], 234.0);
        assert_eq!(a[[1, 0, 2]], 102.0);
        backend.update(a.view_mut(), &|_, v| 2.0 * v);
        assert_eq!(a[[2, 3, 4]], 468.0);
        let expected: f64 = a.iter().sum();
        assert_relative_eq!(backend.sum(a.view()), expected, max_relative = 1e-14);
        assert_relative_eq!(backend.mean(a.view()), expected / 60.0, max_relative = 1e-14);
        assert_eq!(backend.min_max(a.view()), (0.0, 468.0));
        a[[1, 2, 3]] = f64::NAN;
        let (min, max) = backend.min_max(a.view());
        assert!(min.is_nan() && max.is_nan());
    }

    #[test]
    fn serial_backend_works() {
        let backend = SerialBackend::new();
        assert_eq!(backend.name(), "serial");
        check_backend(&backend);
    }

    #[test]
    fn parallel_backend_works() -> Result<(), StrError> {
        let backend = ParallelBackend::new(3)?;
        assert_eq!(backend.name(), "parallel");
        assert_eq!(backend.n_thread(), 3);
        check_backend(&backend);
        Ok(())
    }

    #[test]
    fn update_reads_other_arrays() {
        let backend = SerialBackend::new();
        let source = Array3::from_shape_fn((2, 2, 3), |(i, j, k)| (i + j + k) as f64);
        let mut out = Array3::<f64>::zeros((2, 2, 2));
        // forward difference along x
        backend.fill_with(out.view_mut(), &|(i, j, k)| source[[i, j, k + 1]] - source[[i, j, k]]);
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn new_backend_works() -> Result<(), StrError> {
        assert_eq!(new_backend(&Backend::Serial)?.name(), "serial");
        assert_eq!(new_backend(&Backend::Parallel { n_thread: 2 })?.name(), "parallel");
        assert_eq!(
            new_backend(&Backend::Parallel { n_thread: 0 }).err(),
            Some("the number of threads must be ≥ 1")
        );
        Ok(())
    }
}
