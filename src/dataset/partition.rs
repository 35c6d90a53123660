//! Partitioning of materialized learning data into optimizer shards.
//!
//! Instances are split into contiguous blocks of `ceil(n / num_shards)`, so
//! the first shards are full and only the last one may be short. Fewer than
//! `num_shards` blocks are produced when there are fewer instances than
//! shards.

use crate::core::error::{GBCentError, Result};

/// Compute the number of blocks and the block size for `count` items.
pub fn block_info(num_shards: usize, count: usize) -> (usize, usize) {
    if num_shards <= 1 || count == 0 {
        return (1, count);
    }
    let block_size = (count + num_shards - 1) / num_shards;
    let num_blocks = (count + block_size - 1) / block_size;
    (num_blocks, block_size)
}

/// Split `instances` into at most `num_shards` contiguous shards.
pub fn partition_into_shards<I>(instances: Vec<I>, num_shards: usize) -> Result<Vec<Vec<I>>> {
    crate::ensure!(
        num_shards > 0,
        GBCentError::invalid_parameter("num_shards", "0", "must be at least 1")
    );

    let (num_blocks, block_size) = block_info(num_shards, instances.len());
    if num_blocks == 1 {
        return Ok(vec![instances]);
    }

    let mut shards = Vec::with_capacity(num_blocks);
    let mut iter = instances.into_iter();
    for _ in 0..num_blocks {
        let shard: Vec<I> = iter.by_ref().take(block_size).collect();
        if shard.is_empty() {
            break;
        }
        shards.push(shard);
    }
    Ok(shards)
}
