//! Streaming learning data sources.

use crate::core::constants::DEFAULT_BATCH_SIZE;
use crate::core::error::Result;
use crate::core::traits::LearningData;
use crate::dataset::instance::{GBCentInstance, SvdFeatureInstance};
use crate::dataset::partition::partition_into_shards;
use std::sync::Arc;

/// Learning data held in memory and served in fixed-size batches.
///
/// The instances are shared behind an `Arc`, so cloning the source is cheap
/// and every clone keeps its own read position.
#[derive(Debug, Clone)]
pub struct InMemoryLearningData<I> {
    instances: Arc<Vec<I>>,
    batch_size: usize,
    cursor: usize,
}

impl<I: Clone> InMemoryLearningData<I> {
    /// Creates a source with the default batch size.
    pub fn new(instances: Vec<I>) -> Self {
        Self::with_batch_size(instances, DEFAULT_BATCH_SIZE)
    }

    /// Creates a source serving `batch_size` instances per batch.
    pub fn with_batch_size(instances: Vec<I>, batch_size: usize) -> Self {
        InMemoryLearningData {
            instances: Arc::new(instances),
            batch_size: batch_size.max(1),
            cursor: 0,
        }
    }

    /// Number of instances in the source.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the source holds no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// All instances, in stream order.
    pub fn instances(&self) -> &[I] {
        &self.instances
    }

    /// Split the instances into at most `num_shards` contiguous sources with
    /// the same batch size.
    pub fn into_shards(self, num_shards: usize) -> Result<Vec<InMemoryLearningData<I>>> {
        let batch_size = self.batch_size;
        let instances = Arc::try_unwrap(self.instances).unwrap_or_else(|shared| (*shared).clone());
        Ok(partition_into_shards(instances, num_shards)?
            .into_iter()
            .map(|shard| InMemoryLearningData::with_batch_size(shard, batch_size))
            .collect())
    }
}

impl<I: Clone> LearningData for InMemoryLearningData<I> {
    type Instance = I;

    fn start_new_iteration(&mut self) {
        self.cursor = 0;
    }

    fn next_batch(&mut self) -> Vec<I> {
        let end = (self.cursor + self.batch_size).min(self.instances.len());
        let batch = self.instances[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }
}

/// Drain one full pass of `data` into memory.
pub fn materialize<D>(data: &mut D) -> Vec<D::Instance>
where
    D: LearningData + ?Sized,
{
    let mut instances = Vec::new();
    data.start_new_iteration();
    loop {
        let batch = data.next_batch();
        if batch.is_empty() {
            break;
        }
        instances.extend(batch);
    }
    instances
}

/// Exposes the base model view of a composite stream.
#[derive(Debug)]
pub struct BaseModelView<D> {
    inner: D,
}

impl<D> BaseModelView<D>
where
    D: LearningData<Instance = GBCentInstance>,
{
    /// Wraps a composite stream.
    pub fn new(inner: D) -> Self {
        BaseModelView { inner }
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D> LearningData for BaseModelView<D>
where
    D: LearningData<Instance = GBCentInstance>,
{
    type Instance = SvdFeatureInstance;

    fn start_new_iteration(&mut self) {
        self.inner.start_new_iteration();
    }

    fn next_batch(&mut self) -> Vec<SvdFeatureInstance> {
        self.inner
            .next_batch()
            .into_iter()
            .map(GBCentInstance::into_base)
            .collect()
    }
}
