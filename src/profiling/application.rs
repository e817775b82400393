//! Root aggregate: every instrumented kernel of the profiled application.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::kernel::KernelData;

/// Opaque kernel identifier assigned by the instrumentation engine.
pub type KernelId = u64;

/// Shared handle to one kernel's data.
pub type KernelHandle = Arc<Mutex<KernelData>>;

#[derive(Default)]
struct KernelTable {
    order: Vec<(KernelId, KernelHandle)>,
    index: HashMap<KernelId, usize>,
}

/// Kernel id → [`KernelData`], iterated in compile order.
///
/// Insertion is serialized by one coarse lock; each kernel then has its own
/// lock so invocations of different kernels never contend.
#[derive(Default)]
pub struct ApplicationData {
    kernels: Mutex<KernelTable>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ApplicationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the kernel built by `create` unless `id` is already known.
    /// Returns the handle and whether it was newly inserted.
    pub fn get_or_insert_with<F>(&self, id: KernelId, create: F) -> (KernelHandle, bool)
    where
        F: FnOnce() -> KernelData,
    {
        let mut table = lock(&self.kernels);
        if let Some(&pos) = table.index.get(&id) {
            return (Arc::clone(&table.order[pos].1), false);
        }
        let handle = Arc::new(Mutex::new(create()));
        let pos = table.order.len();
        table.order.push((id, Arc::clone(&handle)));
        table.index.insert(id, pos);
        (handle, true)
    }

    pub fn kernel(&self, id: KernelId) -> Option<KernelHandle> {
        let table = lock(&self.kernels);
        table
            .index
            .get(&id)
            .map(|&pos| Arc::clone(&table.order[pos].1))
    }

    /// Snapshot of all kernels in insertion order.
    pub fn kernels(&self) -> Vec<(KernelId, KernelHandle)> {
        lock(&self.kernels)
            .order
            .iter()
            .map(|(id, h)| (*id, Arc::clone(h)))
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.kernels).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a kernel handle, recovering the data if a producer thread panicked.
pub fn lock_kernel(handle: &KernelHandle) -> MutexGuard<'_, KernelData> {
    lock(handle)
}
