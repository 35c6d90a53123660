//! Thread-shared named parameter storage.
//!
//! A [`ParameterSpace`] holds named scalar arrays and named vector arrays.
//! Scalars are stored as `f64` bits in `AtomicU64` slots with relaxed
//! ordering; each vector slot has its own `RwLock`, so a whole vector is
//! always read and written as a unit. Concurrent read-modify-write updates of
//! the same slot may lose a step, which lock-free SGD tolerates.
//!
//! A name keeps the size (and dimension) it was declared with until it is
//! released.

use crate::core::error::{GBCentError, Result};
use crate::core::utils::random::{ParameterInitializer, RandomInitializer};

use static_assertions::assert_impl_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How newly declared parameters are filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// Every value is set to the constant.
    Constant(f64),
    /// Values are drawn from the space's initializer; vectors are optionally
    /// rescaled to the initializer's target norm.
    Random { normalize: bool },
}

#[derive(Debug)]
struct ScalarArray {
    values: Vec<AtomicU64>,
}

impl ScalarArray {
    fn slot(&self, index: usize) -> Result<&AtomicU64> {
        self.values
            .get(index)
            .ok_or_else(|| GBCentError::index_out_of_bounds(index, self.values.len()))
    }
}

#[derive(Debug)]
struct VectorArray {
    dim: usize,
    values: Vec<RwLock<Vec<f64>>>,
}

impl VectorArray {
    fn slot(&self, index: usize) -> Result<&RwLock<Vec<f64>>> {
        self.values
            .get(index)
            .ok_or_else(|| GBCentError::index_out_of_bounds(index, self.values.len()))
    }
}

fn read_lock<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockReadGuard<'a, T>> {
    lock.read()
        .map_err(|_| GBCentError::threading(format!("{} lock poisoned", what)))
}

fn write_lock<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| GBCentError::threading(format!("{} lock poisoned", what)))
}

/// Named scalar and vector parameters shared across optimizer threads.
#[derive(Debug)]
pub struct ParameterSpace {
    scalars: RwLock<HashMap<String, Arc<ScalarArray>>>,
    vectors: RwLock<HashMap<String, Arc<VectorArray>>>,
    initializer: Mutex<Box<dyn ParameterInitializer>>,
}

assert_impl_all!(ParameterSpace: Send, Sync);

impl ParameterSpace {
    /// Creates an empty space with an entropy-seeded random initializer.
    pub fn new() -> Self {
        Self::with_initializer(Box::new(RandomInitializer::new()))
    }

    /// Creates an empty space drawing random fills from `initializer`.
    pub fn with_initializer(initializer: Box<dyn ParameterInitializer>) -> Self {
        ParameterSpace {
            scalars: RwLock::new(HashMap::new()),
            vectors: RwLock::new(HashMap::new()),
            initializer: Mutex::new(initializer),
        }
    }

    /// Declare the scalar array `name` with `size` slots, or confirm an
    /// existing declaration. An existing array keeps its values.
    pub fn ensure_scalar(&self, name: &str, size: usize, fill: Fill) -> Result<()> {
        let mut scalars = write_lock(&self.scalars, "scalar table")?;
        if let Some(existing) = scalars.get(name) {
            if existing.values.len() != size {
                return Err(GBCentError::dimension_mismatch(
                    format!("scalar '{}' of size {}", name, existing.values.len()),
                    format!("size {}", size),
                ));
            }
            return Ok(());
        }

        let values = match fill {
            Fill::Constant(value) => (0..size).map(|_| AtomicU64::new(value.to_bits())).collect(),
            Fill::Random { .. } => {
                let mut init = self.lock_initializer()?;
                (0..size)
                    .map(|_| AtomicU64::new(init.init_value().to_bits()))
                    .collect()
            }
        };
        scalars.insert(name.to_string(), Arc::new(ScalarArray { values }));
        Ok(())
    }

    /// Declare the vector array `name` with `size` vectors of length `dim`,
    /// or confirm an existing declaration.
    pub fn ensure_vector(&self, name: &str, size: usize, dim: usize, fill: Fill) -> Result<()> {
        let mut vectors = write_lock(&self.vectors, "vector table")?;
        if let Some(existing) = vectors.get(name) {
            if existing.values.len() != size || existing.dim != dim {
                return Err(GBCentError::dimension_mismatch(
                    format!(
                        "vector '{}' of size {} and dimension {}",
                        name,
                        existing.values.len(),
                        existing.dim
                    ),
                    format!("size {} and dimension {}", size, dim),
                ));
            }
            return Ok(());
        }

        let values = match fill {
            Fill::Constant(value) => (0..size).map(|_| RwLock::new(vec![value; dim])).collect(),
            Fill::Random { normalize } => {
                let mut init = self.lock_initializer()?;
                (0..size)
                    .map(|_| {
                        let mut vec = vec![0.0; dim];
                        init.init_vector(&mut vec, normalize);
                        RwLock::new(vec)
                    })
                    .collect()
            }
        };
        vectors.insert(name.to_string(), Arc::new(VectorArray { dim, values }));
        Ok(())
    }

    /// Whether a scalar array named `name` is declared.
    pub fn has_scalar(&self, name: &str) -> bool {
        self.scalars
            .read()
            .map(|s| s.contains_key(name))
            .unwrap_or(false)
    }

    /// Whether a vector array named `name` is declared.
    pub fn has_vector(&self, name: &str) -> bool {
        self.vectors
            .read()
            .map(|v| v.contains_key(name))
            .unwrap_or(false)
    }

    /// Current value of scalar `name[index]`.
    pub fn scalar(&self, name: &str, index: usize) -> Result<f64> {
        let array = self.scalar_array_handle(name)?;
        let slot = array.slot(index)?;
        Ok(f64::from_bits(slot.load(Ordering::Relaxed)))
    }

    /// Overwrite scalar `name[index]`.
    pub fn set_scalar(&self, name: &str, index: usize, value: f64) -> Result<()> {
        let array = self.scalar_array_handle(name)?;
        let slot = array.slot(index)?;
        slot.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Replace scalar `name[index]` with `update(current)`.
    ///
    /// The load and the store are separate relaxed operations; a concurrent
    /// update landing in between is overwritten.
    pub fn update_scalar<F>(&self, name: &str, index: usize, update: F) -> Result<()>
    where
        F: FnOnce(f64) -> f64,
    {
        let array = self.scalar_array_handle(name)?;
        let slot = array.slot(index)?;
        let current = f64::from_bits(slot.load(Ordering::Relaxed));
        slot.store(update(current).to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Copy of vector `name[index]`.
    pub fn vector(&self, name: &str, index: usize) -> Result<Vec<f64>> {
        let array = self.vector_array_handle(name)?;
        let guard = read_lock(array.slot(index)?, "vector slot")?;
        Ok(guard.clone())
    }

    /// Overwrite vector `name[index]`.
    pub fn set_vector(&self, name: &str, index: usize, value: &[f64]) -> Result<()> {
        let array = self.vector_array_handle(name)?;
        if value.len() != array.dim {
            return Err(GBCentError::dimension_mismatch(
                format!("vector of dimension {}", array.dim),
                format!("dimension {}", value.len()),
            ));
        }
        let mut guard = write_lock(array.slot(index)?, "vector slot")?;
        guard.copy_from_slice(value);
        Ok(())
    }

    /// Apply `update` to vector `name[index]` in place, holding the slot's
    /// write lock for the duration of the closure.
    pub fn update_vector<F>(&self, name: &str, index: usize, update: F) -> Result<()>
    where
        F: FnOnce(&mut [f64]),
    {
        let array = self.vector_array_handle(name)?;
        let mut guard = write_lock(array.slot(index)?, "vector slot")?;
        update(guard.as_mut_slice());
        Ok(())
    }

    /// Snapshot of the whole scalar array `name`.
    pub fn scalar_array(&self, name: &str) -> Result<Vec<f64>> {
        let array = self.scalar_array_handle(name)?;
        Ok(array
            .values
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .collect())
    }

    /// Snapshot of the whole vector array `name`, one vector at a time.
    pub fn vector_array(&self, name: &str) -> Result<Vec<Vec<f64>>> {
        let array = self.vector_array_handle(name)?;
        array
            .values
            .iter()
            .map(|slot| read_lock(slot, "vector slot").map(|v| v.clone()))
            .collect()
    }

    /// Number of slots of scalar array `name`.
    pub fn scalar_size(&self, name: &str) -> Result<usize> {
        Ok(self.scalar_array_handle(name)?.values.len())
    }

    /// Number of vectors in vector array `name`.
    pub fn vector_size(&self, name: &str) -> Result<usize> {
        Ok(self.vector_array_handle(name)?.values.len())
    }

    /// Length of each vector in vector array `name`.
    pub fn vector_dim(&self, name: &str) -> Result<usize> {
        Ok(self.vector_array_handle(name)?.dim)
    }

    /// Drop the scalar array `name`. Returns whether it existed.
    pub fn release_scalar(&self, name: &str) -> Result<bool> {
        Ok(write_lock(&self.scalars, "scalar table")?
            .remove(name)
            .is_some())
    }

    /// Drop the vector array `name`. Returns whether it existed.
    pub fn release_vector(&self, name: &str) -> Result<bool> {
        Ok(write_lock(&self.vectors, "vector table")?
            .remove(name)
            .is_some())
    }

    /// Drop every declared array.
    pub fn release_all(&self) -> Result<()> {
        write_lock(&self.scalars, "scalar table")?.clear();
        write_lock(&self.vectors, "vector table")?.clear();
        Ok(())
    }

    /// Names of all scalar arrays, sorted.
    pub fn scalar_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = read_lock(&self.scalars, "scalar table")?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    /// Names of all vector arrays, sorted.
    pub fn vector_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = read_lock(&self.vectors, "vector table")?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    fn scalar_array_handle(&self, name: &str) -> Result<Arc<ScalarArray>> {
        read_lock(&self.scalars, "scalar table")?
            .get(name)
            .cloned()
            .ok_or_else(|| GBCentError::unknown_parameter(name))
    }

    fn vector_array_handle(&self, name: &str) -> Result<Arc<VectorArray>> {
        read_lock(&self.vectors, "vector table")?
            .get(name)
            .cloned()
            .ok_or_else(|| GBCentError::unknown_parameter(name))
    }

    fn lock_initializer(&self) -> Result<std::sync::MutexGuard<'_, Box<dyn ParameterInitializer>>> {
        self.initializer
            .lock()
            .map_err(|_| GBCentError::threading("initializer lock poisoned"))
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_ensure_is_idempotent() {
        let space = ParameterSpace::new();
        space.ensure_scalar("biases", 4, Fill::Constant(0.5)).unwrap();
        space.set_scalar("biases", 1, 2.0).unwrap();
        space.ensure_scalar("biases", 4, Fill::Constant(0.0)).unwrap();
        assert_eq!(space.scalar("biases", 1).unwrap(), 2.0);
        assert_eq!(space.scalar("biases", 0).unwrap(), 0.5);
    }

    #[test]
    fn test_ensure_with_other_size_fails() {
        let space = ParameterSpace::new();
        space.ensure_scalar("biases", 4, Fill::Constant(0.0)).unwrap();
        let err = space.ensure_scalar("biases", 5, Fill::Constant(0.0)).unwrap_err();
        assert_eq!(err.category(), "dimension_mismatch");

        space.ensure_vector("factors", 2, 3, Fill::Constant(0.0)).unwrap();
        assert!(space.ensure_vector("factors", 2, 4, Fill::Constant(0.0)).is_err());
    }

    #[test]
    fn test_unknown_and_out_of_range() {
        let space = ParameterSpace::new();
        assert!(matches!(
            space.scalar("missing", 0),
            Err(GBCentError::UnknownParameter { .. })
        ));
        space.ensure_scalar("biases", 2, Fill::Constant(0.0)).unwrap();
        assert!(matches!(
            space.scalar("biases", 2),
            Err(GBCentError::IndexOutOfBounds { index: 2, length: 2 })
        ));
    }

    #[test]
    fn test_vector_access() {
        let space = ParameterSpace::new();
        space.ensure_vector("factors", 3, 2, Fill::Constant(1.0)).unwrap();
        assert_eq!(space.vector("factors", 2).unwrap(), vec![1.0, 1.0]);

        space.set_vector("factors", 0, &[0.25, -0.5]).unwrap();
        space
            .update_vector("factors", 0, |v| v.iter_mut().for_each(|x| *x *= 2.0))
            .unwrap();
        assert_eq!(space.vector("factors", 0).unwrap(), vec![0.5, -1.0]);
        assert!(space.set_vector("factors", 0, &[1.0]).is_err());
        assert_eq!(space.vector_size("factors").unwrap(), 3);
        assert_eq!(space.vector_dim("factors").unwrap(), 2);
    }

    #[test]
    fn test_random_fill_normalized() {
        let space = ParameterSpace::with_initializer(Box::new(
            RandomInitializer::with_seed(7).range(1.0).target_norm(2.0),
        ));
        space
            .ensure_vector("factors", 5, 4, Fill::Random { normalize: true })
            .unwrap();
        for v in space.vector_array("factors").unwrap() {
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_relative_eq!(norm, 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_names_and_release() {
        let space = ParameterSpace::new();
        space.ensure_scalar("b", 1, Fill::Constant(0.0)).unwrap();
        space.ensure_scalar("a", 1, Fill::Constant(0.0)).unwrap();
        space.ensure_vector("v", 1, 1, Fill::Constant(0.0)).unwrap();
        assert_eq!(space.scalar_names().unwrap(), vec!["a", "b"]);
        assert_eq!(space.vector_names().unwrap(), vec!["v"]);

        assert!(space.release_scalar("a").unwrap());
        assert!(!space.release_scalar("a").unwrap());
        assert!(!space.has_scalar("a"));

        space.release_all().unwrap();
        assert!(space.scalar_names().unwrap().is_empty());
        assert!(!space.has_vector("v"));
    }

    #[test]
    fn test_concurrent_disjoint_updates() {
        let space = Arc::new(ParameterSpace::new());
        space.ensure_scalar("biases", 8, Fill::Constant(0.0)).unwrap();

        thread::scope(|s| {
            for t in 0..8 {
                let space = &space;
                s.spawn(move || {
                    for _ in 0..1000 {
                        space.update_scalar("biases", t, |v| v + 1.0).unwrap();
                    }
                });
            }
        });

        assert_eq!(space.scalar_array("biases").unwrap(), vec![1000.0; 8]);
    }

    #[test]
    fn test_shared_vector_slot_is_never_torn() {
        let space = ParameterSpace::new();
        space.ensure_vector("factors", 1, 64, Fill::Constant(0.0)).unwrap();

        thread::scope(|s| {
            for t in 0..4 {
                let space = &space;
                s.spawn(move || {
                    for i in 0..500 {
                        let fill = (t * 1000 + i) as f64;
                        if i % 2 == 0 {
                            space.set_vector("factors", 0, &[fill; 64]).unwrap();
                        } else {
                            space
                                .update_vector("factors", 0, |vec| vec.iter_mut().for_each(|v| *v = fill))
                                .unwrap();
                        }
                    }
                });
            }
            for _ in 0..4 {
                let space = &space;
                s.spawn(move || {
                    for _ in 0..2000 {
                        let seen = space.vector("factors", 0).unwrap();
                        assert!(seen.iter().all(|&v| v == seen[0]), "torn read: {:?}", seen);
                    }
                });
            }
        });

        let last = space.vector("factors", 0).unwrap();
        assert!(last.iter().all(|&v| v == last[0]));
    }
}
