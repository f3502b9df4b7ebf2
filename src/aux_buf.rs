// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Auxiliary DMA buffers owned by codec contexts.
//!
//! Each codec context allocates the buffers its hardware block reads and writes besides the
//! frames themselves: CABAC and probability tables, segmentation maps, motion vector and control
//! output areas. They are allocated once when the context is set up and stay mapped, at a fixed
//! device address, until the context goes away.
//!
//! Memory handed out by a [`DmaAllocator`] is not zeroed. Callers clear whatever the hardware
//! expects to be zero.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("out of memory allocating {0} bytes")]
    OutOfMemory(usize),
    #[error("device address space exhausted")]
    AddressSpace,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AllocResult<T> = Result<T, AllocError>;

/// A DMA-coherent memory area, visible to the CPU and to the codec block.
pub trait DmaMemory: Send {
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];
    /// Address of the first byte as seen by the device.
    fn dma_addr(&self) -> u32;
}

/// Provider of DMA memory. The codec blocks only address 32 bits.
pub trait DmaAllocator: Send + Sync {
    fn allocate(&self, size: usize) -> AllocResult<Box<dyn DmaMemory>>;
}

/// Auxiliary buffer with stable CPU and device addresses.
pub struct AuxBuffer {
    name: &'static str,
    mem: Box<dyn DmaMemory>,
}

impl AuxBuffer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cpu(&self) -> &[u8] {
        self.mem.as_slice()
    }

    pub fn cpu_mut(&mut self) -> &mut [u8] {
        self.mem.as_mut_slice()
    }

    pub fn dma(&self) -> u32 {
        self.mem.dma_addr()
    }

    pub fn size(&self) -> usize {
        self.mem.as_slice().len()
    }

    pub fn clear(&mut self) {
        self.mem.as_mut_slice().fill(0);
    }

    /// Zeroes `len` bytes starting at `offset`, clamped to the buffer.
    pub fn clear_range(&mut self, offset: usize, len: usize) {
        let buf = self.mem.as_mut_slice();
        let start = offset.min(buf.len());
        let end = offset.saturating_add(len).min(buf.len());
        buf[start..end].fill(0);
    }
}

impl std::fmt::Debug for AuxBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuxBuffer")
            .field("name", &self.name)
            .field("dma", &format_args!("{:#010x}", self.dma()))
            .field("size", &self.size())
            .finish()
    }
}

/// Allocates and frees auxiliary buffers for one device.
#[derive(Clone)]
pub struct AuxBufferPool {
    allocator: Arc<dyn DmaAllocator>,
}

impl AuxBufferPool {
    pub fn new(allocator: Arc<dyn DmaAllocator>) -> Self {
        Self { allocator }
    }

    pub fn allocate(&self, name: &'static str, size: usize) -> AllocResult<AuxBuffer> {
        match self.allocator.allocate(size) {
            Ok(mem) => {
                log::debug!(
                    "allocated {} ({} bytes) at {:#010x}",
                    name,
                    size,
                    mem.dma_addr()
                );
                Ok(AuxBuffer { name, mem })
            }
            Err(e) => {
                log::error!("allocate {} failed: {}", name, e);
                Err(e)
            }
        }
    }

    pub fn free(&self, buf: AuxBuffer) {
        log::debug!("freeing {} at {:#010x}", buf.name, buf.dma());
        drop(buf);
    }

    /// Allocates `specs` in order. If one allocation fails, the buffers allocated before it are
    /// freed in reverse order and the error is returned.
    pub fn allocate_set<const N: usize>(
        &self,
        specs: [(&'static str, usize); N],
    ) -> AllocResult<[AuxBuffer; N]> {
        let mut bufs = Vec::with_capacity(N);
        for (name, size) in specs {
            match self.allocate(name, size) {
                Ok(buf) => bufs.push(buf),
                Err(e) => {
                    self.free_set(bufs);
                    return Err(e);
                }
            }
        }

        bufs.try_into()
            .map_err(|_| AllocError::Other(anyhow::anyhow!("buffer set size mismatch")))
    }

    /// Frees `bufs` in reverse order.
    pub fn free_set<I>(&self, bufs: I)
    where
        I: IntoIterator<Item = AuxBuffer>,
        I::IntoIter: DoubleEndedIterator,
    {
        for buf in bufs.into_iter().rev() {
            self.free(buf);
        }
    }
}

/// Base of the simulated device address space.
const SIM_IOVA_BASE: u32 = 0x1000_0000;
const SIM_IOVA_ALIGN: u32 = 0x1000;
/// Fill pattern of fresh simulated allocations, so that missing clears show up.
const SIM_POISON: u8 = 0xa5;

struct HeapMemory {
    data: Vec<u8>,
    dma: u32,
    live: Arc<AtomicUsize>,
}

impl DmaMemory for HeapMemory {
    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn dma_addr(&self) -> u32 {
        self.dma
    }
}

impl Drop for HeapMemory {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Heap-backed allocator handing out fake device addresses, for running without hardware.
///
/// Fresh allocations are filled with a poison pattern. The number of outstanding allocations is
/// tracked, and failures can be injected at a given allocation index.
pub struct HeapAllocator {
    next_iova: AtomicU32,
    count: AtomicUsize,
    live: Arc<AtomicUsize>,
    fail_at: Option<usize>,
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self {
            next_iova: AtomicU32::new(SIM_IOVA_BASE),
            count: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            fail_at: None,
        }
    }
}

impl HeapAllocator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes allocation number `k` (counting from 0) fail, and every one after it.
    pub fn failing_at(k: usize) -> Self {
        Self {
            fail_at: Some(k),
            ..Default::default()
        }
    }

    /// Number of allocations not yet freed.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of allocation attempts so far.
    pub fn attempts(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl DmaAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> AllocResult<Box<dyn DmaMemory>> {
        let index = self.count.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_at, Some(k) if index >= k) {
            return Err(AllocError::OutOfMemory(size));
        }

        let span = u32::try_from(size)
            .ok()
            .and_then(|s| s.checked_add(SIM_IOVA_ALIGN - 1))
            .map(|s| s & !(SIM_IOVA_ALIGN - 1))
            .ok_or(AllocError::AddressSpace)?;
        let dma = self.next_iova.fetch_add(span, Ordering::SeqCst);
        if dma.checked_add(span).is_none() {
            return Err(AllocError::AddressSpace);
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HeapMemory {
            data: vec![SIM_POISON; size],
            dma,
            live: self.live.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_stable_and_distinct() {
        let alloc = Arc::new(HeapAllocator::new());
        let pool = AuxBufferPool::new(alloc.clone());

        let a = pool.allocate("a", 100).unwrap();
        let mut b = pool.allocate("b", 5000).unwrap();
        assert_eq!(a.dma(), SIM_IOVA_BASE);
        assert_eq!(b.dma(), SIM_IOVA_BASE + 0x1000);
        assert_eq!(b.size(), 5000);
        assert!(b.cpu().iter().all(|&x| x == SIM_POISON));

        b.clear_range(4990, 100);
        assert_eq!(b.cpu()[4989], SIM_POISON);
        assert!(b.cpu()[4990..].iter().all(|&x| x == 0));

        assert_eq!(alloc.live(), 2);
        pool.free(b);
        pool.free(a);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_injected_failure() {
        let alloc = Arc::new(HeapAllocator::failing_at(1));
        let pool = AuxBufferPool::new(alloc.clone());

        let a = pool.allocate("a", 16).unwrap();
        assert!(matches!(
            pool.allocate("b", 16),
            Err(AllocError::OutOfMemory(16))
        ));
        drop(a);
        assert_eq!(alloc.live(), 0);
        assert_eq!(alloc.attempts(), 2);
    }

    #[test]
    fn test_set_rollback_at_every_index() {
        for k in 0..3 {
            let alloc = Arc::new(HeapAllocator::failing_at(k));
            let pool = AuxBufferPool::new(alloc.clone());
            assert!(pool
                .allocate_set([("a", 16), ("b", 32), ("c", 64)])
                .is_err());
            assert_eq!(alloc.attempts(), k + 1);
            assert_eq!(alloc.live(), 0);
        }

        let alloc = Arc::new(HeapAllocator::new());
        let pool = AuxBufferPool::new(alloc.clone());
        let [a, b, c] = pool.allocate_set([("a", 16), ("b", 32), ("c", 64)]).unwrap();
        assert_eq!((a.size(), b.size(), c.size()), (16, 32, 64));
        assert_eq!(alloc.live(), 3);
        pool.free_set([a, b, c]);
        assert_eq!(alloc.live(), 0);
    }
}
