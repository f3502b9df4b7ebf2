// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register window access for the codec blocks.
//!
//! A [`RegisterBlock`] is a bounds-checked view over one block's register window (the encoder or
//! decoder half of a VPU, or the whole RKVDEC). The window itself is provided by an
//! [`MmioRegion`]: either a [`MappedRegion`] over a device file, or a [`MemoryRegion`] that
//! simulates the registers in memory and records every write.

pub mod rkvdec;
pub mod vdpu;
pub mod vepu;

use std::ffi::c_void;
use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::os::fd::AsFd;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::fence;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Context;
use nix::sys::mman::mmap;
use nix::sys::mman::munmap;
use nix::sys::mman::MapFlags;
use nix::sys::mman::ProtFlags;

/// A bit field inside a 32-bit register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub shift: u32,
    pub width: u32,
}

impl Field {
    pub const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    pub const fn mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            ((1u32 << self.width) - 1) << self.shift
        }
    }

    /// Places `value` at this field's position. Values wider than the field are truncated after
    /// a warning.
    pub fn encode(&self, value: u32) -> u32 {
        let max = self.mask() >> self.shift;
        if value > max {
            log::warn!(
                "value {:#x} overflows {}-bit field at bit {}",
                value,
                self.width,
                self.shift
            );
        }
        (value & max) << self.shift
    }

    /// Two's complement variant of [`Field::encode`] for signed quantities.
    pub fn encode_signed(&self, value: i32) -> u32 {
        let half = 1i64 << (self.width - 1);
        if (value as i64) < -half || (value as i64) >= half {
            log::warn!(
                "signed value {} overflows {}-bit field at bit {}",
                value,
                self.width,
                self.shift
            );
        }
        ((value as u32) & (self.mask() >> self.shift)) << self.shift
    }

    pub fn decode(&self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.shift
    }
}

/// A field at a fixed register offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegField {
    pub offset: usize,
    pub field: Field,
}

impl RegField {
    pub const fn new(offset: usize, shift: u32, width: u32) -> Self {
        Self {
            offset,
            field: Field::new(shift, width),
        }
    }
}

/// Raw 32-bit access to a device register window. Offsets are in bytes.
pub trait MmioRegion: Send + Sync {
    /// Size of the window in bytes.
    fn len(&self) -> usize;
    fn read32(&self, offset: usize) -> u32;
    fn write32(&self, offset: usize, value: u32);

    /// Writes `value` after a full memory barrier.
    fn write32_barriered(&self, offset: usize, value: u32) {
        fence(Ordering::SeqCst);
        self.write32(offset, value);
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One write recorded by [`MemoryRegion`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub offset: usize,
    pub value: u32,
    /// Whether a full memory barrier preceded the write.
    pub barriered: bool,
}

/// In-memory register window, for running without hardware.
///
/// Registers behave like plain memory. Each write is appended to a log, which lets callers check
/// the ordering and barrier placement of a programming sequence.
pub struct MemoryRegion {
    regs: Vec<AtomicU32>,
    log: Mutex<Vec<WriteRecord>>,
}

impl MemoryRegion {
    pub fn new(len: usize) -> Self {
        Self {
            regs: (0..len / 4).map(|_| AtomicU32::new(0)).collect(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Sets a register as the hardware would, without logging it.
    pub fn poke(&self, offset: usize, value: u32) {
        if let Some(reg) = self.regs.get(offset / 4) {
            reg.store(value, Ordering::SeqCst);
        }
    }

    pub fn write_log(&self) -> Vec<WriteRecord> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    pub fn clear_log(&self) {
        match self.log.lock() {
            Ok(mut log) => log.clear(),
            Err(e) => e.into_inner().clear(),
        }
    }

    fn record(&self, offset: usize, value: u32, barriered: bool) {
        let rec = WriteRecord {
            offset,
            value,
            barriered,
        };
        match self.log.lock() {
            Ok(mut log) => log.push(rec),
            Err(e) => e.into_inner().push(rec),
        }
    }
}

impl MmioRegion for MemoryRegion {
    fn len(&self) -> usize {
        self.regs.len() * 4
    }

    fn read32(&self, offset: usize) -> u32 {
        self.regs
            .get(offset / 4)
            .map(|r| r.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.poke(offset, value);
        self.record(offset, value, false);
    }

    fn write32_barriered(&self, offset: usize, value: u32) {
        fence(Ordering::SeqCst);
        self.poke(offset, value);
        self.record(offset, value, true);
    }
}

/// Sub-window of another region, used to split a VPU window into its encoder and decoder halves.
pub struct SubRegion {
    parent: Arc<dyn MmioRegion>,
    base: usize,
    len: usize,
}

impl SubRegion {
    pub fn new(parent: Arc<dyn MmioRegion>, base: usize, len: usize) -> anyhow::Result<Self> {
        if base + len > parent.len() {
            return Err(anyhow!(
                "sub-window {:#x}+{:#x} exceeds parent window of {:#x} bytes",
                base,
                len,
                parent.len()
            ));
        }
        Ok(Self { parent, base, len })
    }
}

impl MmioRegion for SubRegion {
    fn len(&self) -> usize {
        self.len
    }

    fn read32(&self, offset: usize) -> u32 {
        self.parent.read32(self.base + offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.parent.write32(self.base + offset, value)
    }

    fn write32_barriered(&self, offset: usize, value: u32) {
        self.parent.write32_barriered(self.base + offset, value)
    }
}

/// Register window mapped from a device file (for instance `/dev/mem` at the block's physical
/// address).
pub struct MappedRegion {
    addr: NonNull<c_void>,
    len: usize,
}

// SAFETY: the mapping is only accessed through volatile 32-bit loads and stores.
unsafe impl Send for MappedRegion {}
// SAFETY: see above.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    pub fn new<P: AsRef<Path>>(
        path: P,
        phys_offset: nix::libc::off_t,
        len: usize,
    ) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())
            .with_context(|| format!("opening {}", path.as_ref().display()))?;
        let size = NonZeroUsize::new(len).ok_or(anyhow!("cannot map an empty register window"))?;

        // SAFETY: a fresh shared mapping that no Rust object aliases.
        let addr = unsafe {
            mmap(
                None,
                size,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                file.as_fd(),
                phys_offset,
            )
        }
        .context("mapping register window")?;

        Ok(Self { addr, len })
    }
}

impl MmioRegion for MappedRegion {
    fn len(&self) -> usize {
        self.len
    }

    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: callers go through RegisterBlock, which checks `offset + 4 <= len`.
        unsafe { std::ptr::read_volatile(self.addr.as_ptr().cast::<u8>().add(offset).cast::<u32>()) }
    }

    fn write32(&self, offset: usize, value: u32) {
        // SAFETY: see read32.
        unsafe {
            std::ptr::write_volatile(
                self.addr.as_ptr().cast::<u8>().add(offset).cast::<u32>(),
                value,
            )
        }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: `addr` and `len` come from the mmap call in `new`.
        if let Err(e) = unsafe { munmap(self.addr, self.len) } {
            log::error!("Unable to unmap register window: {e}");
        }
    }
}

/// Bounds-checked accessors over one block's register window.
///
/// Out-of-range or misaligned accesses are logged and dropped; reads return 0.
#[derive(Clone)]
pub struct RegisterBlock {
    name: &'static str,
    region: Arc<dyn MmioRegion>,
}

impl RegisterBlock {
    pub fn new(name: &'static str, region: Arc<dyn MmioRegion>) -> Self {
        Self { name, region }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    fn check(&self, offset: usize, op: &str) -> bool {
        if offset % 4 != 0 || offset + 4 > self.region.len() {
            log::error!(
                "{}: {} at {:#x} outside {:#x}-byte register window",
                self.name,
                op,
                offset,
                self.region.len()
            );
            return false;
        }
        true
    }

    pub fn read(&self, offset: usize) -> u32 {
        if !self.check(offset, "read") {
            return 0;
        }
        self.region.read32(offset)
    }

    /// Relaxed write: no ordering against earlier memory accesses.
    pub fn write(&self, offset: usize, value: u32) {
        if !self.check(offset, "write") {
            return;
        }
        self.region.write32(offset, value);
    }

    /// Write ordered after every preceding memory access, including writes to DMA buffers.
    pub fn write_barriered(&self, offset: usize, value: u32) {
        if !self.check(offset, "write") {
            return;
        }
        self.region.write32_barriered(offset, value);
    }

    /// Read-modify-write of the bits in `mask`.
    pub fn modify(&self, offset: usize, mask: u32, value: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !mask) | (value & mask));
    }

    pub fn write_field(&self, reg: RegField, value: u32) {
        self.modify(reg.offset, reg.field.mask(), reg.field.encode(value));
    }

    pub fn write_field_signed(&self, reg: RegField, value: i32) {
        self.modify(reg.offset, reg.field.mask(), reg.field.encode_signed(value));
    }

    pub fn read_field(&self, reg: RegField) -> u32 {
        reg.field.decode(self.read(reg.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_encode() {
        let f = Field::new(19, 9);
        assert_eq!(f.encode(120), 120 << 19);
        assert_eq!(f.decode(120 << 19 | 1), 120);
        assert_eq!(f.mask(), 0x1ff << 19);
        // Truncated after a warning.
        assert_eq!(f.encode(0x3ff), 0x1ff << 19);
        assert_eq!(Field::new(0, 7).encode_signed(-1), 0x7f);
        assert_eq!(Field::new(0, 32).mask(), u32::MAX);
    }

    #[test]
    fn test_block_accessors() {
        let region = Arc::new(MemoryRegion::new(0x100));
        let block = RegisterBlock::new("test", region.clone());

        block.write(0x10, 0xf0f0);
        block.modify(0x10, 0xff, 0x0a);
        assert_eq!(block.read(0x10), 0xf00a);
        block.write_field(RegField::new(0x14, 4, 4), 0x9);
        assert_eq!(block.read(0x14), 0x90);
        assert_eq!(block.read_field(RegField::new(0x14, 4, 4)), 0x9);
        block.write_field_signed(RegField::new(0x18, 2, 10), -6);
        assert_eq!(block.read(0x18), 0x3fa << 2);
        block.write_barriered(0x04, 1);

        let log = region.write_log();
        assert_eq!(log.len(), 5);
        assert!(log[..4].iter().all(|w| !w.barriered));
        assert_eq!(
            log[4],
            WriteRecord {
                offset: 0x04,
                value: 1,
                barriered: true
            }
        );
    }

    #[test]
    fn test_out_of_range_access_is_dropped() {
        let region = Arc::new(MemoryRegion::new(0x20));
        let block = RegisterBlock::new("test", region.clone());
        block.write(0x20, 1);
        block.write(0x02, 1);
        assert_eq!(block.read(0x100), 0);
        assert!(region.write_log().is_empty());
    }

    #[test]
    fn test_sub_region() {
        let region = Arc::new(MemoryRegion::new(0x800));
        let dec = SubRegion::new(region.clone(), 0x400, 0x400).unwrap();
        dec.write32(0x4, 7);
        assert_eq!(region.read32(0x404), 7);
        assert!(SubRegion::new(region, 0x400, 0x800).is_err());
    }
}
