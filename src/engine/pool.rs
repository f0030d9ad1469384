// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Kind of compute slot a tool occupies while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    #[default]
    Cpu,
    Accelerator,
}

impl ResourceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceClass::Cpu => "cpu",
            ResourceClass::Accelerator => "accelerator",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot budget partitioned by resource class.
///
/// This is the only mutable state shared between concurrently running tasks.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    cpu: Arc<Semaphore>,
    accelerator: Arc<Semaphore>,
    cpu_slots: usize,
    accelerator_slots: usize,
}

impl ResourcePool {
    pub fn new(cpu_slots: usize, accelerator_slots: usize) -> Self {
        Self {
            cpu: Arc::new(Semaphore::new(cpu_slots)),
            accelerator: Arc::new(Semaphore::new(accelerator_slots)),
            cpu_slots,
            accelerator_slots,
        }
    }

    pub fn capacity(&self, class: ResourceClass) -> usize {
        match class {
            ResourceClass::Cpu => self.cpu_slots,
            ResourceClass::Accelerator => self.accelerator_slots,
        }
    }

    pub fn available(&self, class: ResourceClass) -> usize {
        self.semaphore(class).available_permits()
    }

    /// Wait for a free slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self, class: ResourceClass) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore(class).clone().acquire_owned().await
    }

    fn semaphore(&self, class: ResourceClass) -> &Arc<Semaphore> {
        match class {
            ResourceClass::Cpu => &self.cpu,
            ResourceClass::Accelerator => &self.accelerator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classes_are_independent() {
        let pool = ResourcePool::new(2, 1);
        let gpu = pool.acquire(ResourceClass::Accelerator).await.unwrap();
        assert_eq!(pool.available(ResourceClass::Accelerator), 0);
        assert_eq!(pool.available(ResourceClass::Cpu), 2);

        drop(gpu);
        assert_eq!(pool.available(ResourceClass::Accelerator), 1);
        assert_eq!(pool.capacity(ResourceClass::Cpu), 2);
    }

    #[test]
    fn class_names_round_trip_through_yaml() {
        let class: ResourceClass = serde_yaml::from_str("accelerator").unwrap();
        assert_eq!(class, ResourceClass::Accelerator);
        assert_eq!(ResourceClass::default(), ResourceClass::Cpu);
    }
}
