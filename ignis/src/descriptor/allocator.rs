use anyhow::Result;
use ash::vk;

use crate::descriptor::{DescriptorPool, PoolSizeRatio};
use crate::traits::Destructible;
use crate::IgnisError;

/// Largest set count a grown pool is ever created with
const MAX_SETS_PER_POOL: u32 = 4092;

/// Next pool capacity under the 1.5x growth policy
pub fn next_pool_size(current: u32) -> u32 {
    (current + current / 2).min(MAX_SETS_PER_POOL)
}

/// Single-pool allocator for descriptor sets whose count is known up front
#[derive(Debug)]
pub struct DescriptorAllocator {
    pool: DescriptorPool,
}

impl DescriptorAllocator {
    pub fn new(
        device: crate::device::LogicalDevice,
        max_sets: u32,
        ratios: &[PoolSizeRatio],
    ) -> Result<Self> {
        let pool = DescriptorPool::new(
            device,
            ratios,
            max_sets,
            vk::DescriptorPoolCreateFlags::empty(),
        )?;
        Ok(Self { pool })
    }

    pub fn allocate(&self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        Ok(self.pool.allocate(layout)?)
    }

    /// Invalidates every set allocated so far
    pub fn clear(&mut self) -> Result<()> {
        self.pool.reset()
    }

    /// Surrenders the backing pool, usually to defer its release into a deletion queue
    pub fn into_pool(self) -> DescriptorPool {
        self.pool
    }
}

impl Destructible for DescriptorAllocator {
    fn destroy(&mut self) {
        self.pool.destroy();
    }
}

/// Hands out descriptor sets without the caller tracking pool exhaustion.
///
/// Allocation always targets the most recently created pool; when that pool runs out it is
/// parked in `full_pools`, a bigger pool is created and the allocation retried once. Total
/// capacity only ever grows; pools are reset, never shrunk.
#[derive(Debug)]
pub struct DescriptorAllocatorGrowable {
    device: crate::device::LogicalDevice,
    ratios: Vec<PoolSizeRatio>,
    full_pools: Vec<DescriptorPool>,
    ready_pools: Vec<DescriptorPool>,
    sets_per_pool: u32,
}

impl DescriptorAllocatorGrowable {
    pub fn new(
        device: crate::device::LogicalDevice,
        initial_sets: u32,
        ratios: Vec<PoolSizeRatio>,
    ) -> Result<Self> {
        let first_pool = DescriptorPool::new(
            device.clone(),
            ratios.as_slice(),
            initial_sets,
            vk::DescriptorPoolCreateFlags::empty(),
        )?;
        Ok(Self {
            device,
            ratios,
            full_pools: Vec::new(),
            ready_pools: vec![first_pool],
            sets_per_pool: next_pool_size(initial_sets),
        })
    }

    fn get_pool(&mut self) -> Result<DescriptorPool> {
        match self.ready_pools.pop() {
            Some(pool) => Ok(pool),
            None => {
                let pool = DescriptorPool::new(
                    self.device.clone(),
                    self.ratios.as_slice(),
                    self.sets_per_pool,
                    vk::DescriptorPoolCreateFlags::empty(),
                )?;
                self.sets_per_pool = next_pool_size(self.sets_per_pool);
                Ok(pool)
            }
        }
    }

    pub fn allocate(&mut self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let pool = self.get_pool()?;
        let set = match pool.allocate(layout) {
            Ok(set) => {
                self.ready_pools.push(pool);
                set
            }
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                // pool is spent, retry exactly once against a freshly grown pool
                self.full_pools.push(pool);
                let pool = self.get_pool()?;
                match pool.allocate(layout) {
                    Ok(set) => {
                        self.ready_pools.push(pool);
                        set
                    }
                    Err(_) => return Err(IgnisError::DescriptorPoolExhausted.into()),
                }
            }
            Err(err) => return Err(err.into()),
        };
        Ok(set)
    }

    /// Invalidates every set in every pool while keeping the pools alive
    pub fn reset_pools(&mut self) -> Result<()> {
        for pool in self.ready_pools.iter_mut() {
            pool.reset()?;
        }
        for mut pool in self.full_pools.drain(..) {
            pool.reset()?;
            self.ready_pools.push(pool);
        }
        Ok(())
    }

    /// Releases every owned pool
    pub fn destroy_pools(&mut self) {
        for mut pool in self.ready_pools.drain(..) {
            pool.destroy();
        }
        for mut pool in self.full_pools.drain(..) {
            pool.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_monotonic_until_the_cap() {
        let mut size = 4;
        let mut previous = size;
        for _ in 0..32 {
            size = next_pool_size(size);
            assert!(size >= previous);
            assert!(size <= MAX_SETS_PER_POOL);
            previous = size;
        }
        assert_eq!(size, MAX_SETS_PER_POOL);
    }

    #[test]
    fn growth_factor_is_one_point_five() {
        assert_eq!(next_pool_size(100), 150);
        assert_eq!(next_pool_size(1000), 1500);
    }

    #[test]
    fn capped_pools_stay_capped() {
        assert_eq!(next_pool_size(MAX_SETS_PER_POOL), MAX_SETS_PER_POOL);
        assert_eq!(next_pool_size(4000), MAX_SETS_PER_POOL);
    }
}
