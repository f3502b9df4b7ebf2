// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Run control of one VPU instance.
//!
//! A [`Device`] runs at most one job at a time. [`Device::run`] takes the job slot, powers the
//! device on, lets the context's backend pack its tables and program its registers, arms the
//! watchdog and finally issues the start write. The job then completes either through
//! [`Device::handle_irq`] or through the watchdog; both paths take the job slot lock, and only the
//! first one to find the job running finishes it. Finishing a job reads back its results, powers
//! the device off, returns it to [`RunState::Idle`] and then calls the completion callback.

pub mod variant;
pub mod watchdog;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;
use std::time::Duration;

use anyhow::anyhow;

use crate::aux_buf::AuxBufferPool;
use crate::aux_buf::DmaAllocator;
use crate::backend::CodecMode;
use crate::backend::Feedback;
use crate::backend::FrameRunParameters;
use crate::backend::HwBlock;
use crate::backend::IrqVerdict;
use crate::backend::Programmed;
use crate::backend::RunResult;
use crate::context::CodecContext;
use crate::context::ContextState;
use crate::device::variant::VpuVariant;
use crate::device::watchdog::Watchdog;
use crate::regs::MmioRegion;
use crate::regs::RegisterBlock;
use crate::regs::SubRegion;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// Time a run may take before the watchdog resets the block.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(2000);

/// Power and clock control of the device.
pub trait PowerControl: Send + Sync {
    /// Requests the bus clock rate. Called once, when the device is created.
    fn set_clock_rate(&self, rate: u64) -> anyhow::Result<()>;
    /// Powers the device on. May block.
    fn power_on(&self) -> anyhow::Result<()>;
    fn power_off(&self);
}

/// Power control that only counts calls, for running without hardware.
#[derive(Default)]
pub struct SimulatedPower {
    clock_rate: AtomicU64,
    power_ons: AtomicUsize,
    power_offs: AtomicUsize,
    fail_next: AtomicBool,
}

impl SimulatedPower {
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes the next `power_on` fail.
    pub fn fail_next_power_on(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn clock_rate(&self) -> u64 {
        self.clock_rate.load(Ordering::SeqCst)
    }

    pub fn power_ons(&self) -> usize {
        self.power_ons.load(Ordering::SeqCst)
    }

    pub fn power_offs(&self) -> usize {
        self.power_offs.load(Ordering::SeqCst)
    }

    pub fn is_on(&self) -> bool {
        self.power_ons() > self.power_offs()
    }
}

impl PowerControl for SimulatedPower {
    fn set_clock_rate(&self, rate: u64) -> anyhow::Result<()> {
        self.clock_rate.store(rate, Ordering::SeqCst);
        Ok(())
    }

    fn power_on(&self) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated power domain failure"));
        }
        self.power_ons.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn power_off(&self) {
        self.power_offs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Called once per started run, with its result and whatever the backend read back.
pub type DoneCallback = Box<dyn FnOnce(RunResult, Feedback) + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    PoweringOn,
    TablesPrepared,
    RegistersProgrammed,
    WatchdogArmed,
    HwRunning,
    Completed,
    TimedOut,
    PoweredOff,
}

/// Counters kept over the lifetime of a device.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Runs that reached the start write.
    pub runs: u64,
    pub completed: u64,
    /// Runs finished with an error, timeouts included.
    pub failed: u64,
    pub timeouts: u64,
    pub spurious_irqs: u64,
    /// References replaced by the destination buffer because their index was out of range.
    pub dpb_fallbacks: u64,
}

struct ActiveJob {
    id: u64,
    mode: CodecMode,
    ctx: Arc<Mutex<ContextState>>,
    on_done: DoneCallback,
}

struct JobSlot {
    state: RunState,
    job: Option<ActiveJob>,
    next_id: u64,
    stats: Stats,
}

impl JobSlot {
    fn transition(&mut self, to: RunState) {
        log::debug!("run state {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// Job waiting for its completion, if `state` says the hardware is running it.
    fn running_job(&self) -> Option<&ActiveJob> {
        match self.state {
            RunState::HwRunning => self.job.as_ref(),
            _ => None,
        }
    }
}

fn closed() -> VpuError {
    VpuError::Other(anyhow!("context is closed"))
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct DeviceInner {
    variant: &'static VpuVariant,
    blocks: Vec<(HwBlock, RegisterBlock)>,
    pool: AuxBufferPool,
    power: Arc<dyn PowerControl>,
    /// The IRQ lock: guards the job slot, and with it the watchdog.
    slot: Mutex<JobSlot>,
    idle: Condvar,
    watchdog: Watchdog,
    watchdog_timeout: Duration,
}

impl DeviceInner {
    pub(crate) fn variant(&self) -> &'static VpuVariant {
        self.variant
    }

    pub(crate) fn pool(&self) -> &AuxBufferPool {
        &self.pool
    }

    fn regs(&self, block: HwBlock) -> Option<&RegisterBlock> {
        self.blocks
            .iter()
            .find(|(b, _)| *b == block)
            .map(|(_, regs)| regs)
    }

    fn lock_slot(&self) -> MutexGuard<'_, JobSlot> {
        lock(&self.slot)
    }

    pub(crate) fn run(
        &self,
        ctx: &Arc<Mutex<ContextState>>,
        mode: CodecMode,
        params: FrameRunParameters,
        on_done: DoneCallback,
    ) -> VpuResult<()> {
        if params.mode() != mode {
            return Err(VpuError::ContextMismatch);
        }
        let regs = self.regs(mode.block()).ok_or_else(|| {
            VpuError::UnsupportedParameter(format!("{:?} on {}", mode, self.variant.name))
        })?;

        {
            let state = lock(ctx);
            let hw = state.hw.as_ref().ok_or_else(closed)?;
            hw.validate(&state.format, &params)?;
        }

        let id = {
            let mut slot = self.lock_slot();
            if slot.state != RunState::Idle {
                log::debug!("run rejected, device is {:?}", slot.state);
                return Err(VpuError::Busy);
            }

            let id = slot.next_id;
            slot.next_id += 1;
            slot.job = Some(ActiveJob {
                id,
                mode,
                ctx: ctx.clone(),
                on_done,
            });
            slot.transition(RunState::PoweringOn);
            id
        };

        if let Err(e) = self.power.power_on() {
            log::error!("power on failed: {:#}", e);
            self.abort(false);
            return Err(VpuError::PowerOn(e));
        }

        let programmed = match self.program(ctx, regs, &params) {
            Ok(programmed) => programmed,
            Err(e) => {
                self.abort(true);
                return Err(e);
            }
        };

        let mut slot = self.lock_slot();
        slot.transition(RunState::RegistersProgrammed);
        slot.stats.runs += 1;
        slot.stats.dpb_fallbacks += u64::from(programmed.dpb_fallbacks);

        self.watchdog.arm(id, self.watchdog_timeout);
        slot.transition(RunState::WatchdogArmed);

        regs.write_barriered(programmed.start.offset, programmed.start.value);
        slot.transition(RunState::HwRunning);
        log::debug!("job {} started on {}", id, regs.name());

        Ok(())
    }

    fn program(
        &self,
        ctx: &Arc<Mutex<ContextState>>,
        regs: &RegisterBlock,
        params: &FrameRunParameters,
    ) -> VpuResult<Programmed> {
        {
            let mut guard = lock(ctx);
            let state = &mut *guard;
            let hw = state.hw.as_mut().ok_or_else(closed)?;
            hw.prepare(&state.format, params)?;
        }
        self.lock_slot().transition(RunState::TablesPrepared);

        let mut guard = lock(ctx);
        let state = &mut *guard;
        let hw = state.hw.as_mut().ok_or_else(closed)?;
        hw.program(regs, &state.format, params, &state.dst_buffers)
    }

    /// Drops a job that never reached the start write.
    fn abort(&self, powered: bool) {
        if powered {
            self.power.power_off();
        }
        let mut slot = self.lock_slot();
        slot.job = None;
        slot.transition(RunState::Idle);
        self.idle.notify_all();
    }

    fn handle_irq(&self, block: HwBlock) -> IrqVerdict {
        let mut slot = self.lock_slot();

        let verdict = match (slot.running_job(), self.regs(block)) {
            (Some(job), Some(regs)) if job.mode.block() == block => job.mode.irq(regs),
            _ => IrqVerdict::Spurious,
        };

        let result = match verdict {
            IrqVerdict::Spurious => {
                log::debug!("spurious interrupt on {:?}", block);
                slot.stats.spurious_irqs += 1;
                return verdict;
            }
            IrqVerdict::Done(result) => result,
        };

        self.watchdog.cancel();
        slot.transition(RunState::Completed);
        let finishing = slot.job.as_ref().map(|job| (job.mode, job.ctx.clone()));
        drop(slot);

        if let Some((mode, ctx)) = finishing {
            self.finish(mode, &ctx, result);
        }
        verdict
    }

    /// Times out the running job. With `job` set, only that job.
    fn handle_timeout(&self, job: Option<u64>) {
        let mut slot = self.lock_slot();
        let finishing = match slot.running_job() {
            Some(running) if job.map_or(true, |id| id == running.id) => {
                (running.mode, running.ctx.clone())
            }
            _ => return,
        };

        let (mode, ctx) = finishing;
        if let Some(regs) = self.regs(mode.block()) {
            mode.reset(regs);
        }
        log::error!("frame processing timed out");
        slot.stats.timeouts += 1;
        self.watchdog.cancel();
        slot.transition(RunState::TimedOut);
        drop(slot);

        self.finish(mode, &ctx, RunResult::Error);
    }

    fn finish(&self, mode: CodecMode, ctx: &Arc<Mutex<ContextState>>, result: RunResult) {
        let feedback = {
            let mut state = lock(ctx);
            match (state.hw.as_mut(), self.regs(mode.block())) {
                (Some(hw), Some(regs)) => hw.done(regs, result),
                _ => Feedback::None,
            }
        };

        self.power.power_off();

        let job = {
            let mut slot = self.lock_slot();
            slot.transition(RunState::PoweredOff);
            match result {
                RunResult::Success => slot.stats.completed += 1,
                RunResult::Error => slot.stats.failed += 1,
            }
            let job = slot.job.take();
            slot.transition(RunState::Idle);
            self.idle.notify_all();
            job
        };

        if let Some(job) = job {
            log::debug!("job {} finished: {:?}", job.id, result);
            (job.on_done)(result, feedback);
        }
    }

    /// Blocks until no job of `ctx` is in flight.
    pub(crate) fn wait_released(&self, ctx: &Arc<Mutex<ContextState>>) {
        let mut slot = self.lock_slot();
        while slot
            .job
            .as_ref()
            .is_some_and(|job| Arc::ptr_eq(&job.ctx, ctx))
        {
            slot = self
                .idle
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Handle to one VPU instance. Clones refer to the same device.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Creates a device for `variant`, whose block windows are laid out in `region`.
    pub fn new(
        variant: &'static VpuVariant,
        region: Arc<dyn MmioRegion>,
        allocator: Arc<dyn DmaAllocator>,
        power: Arc<dyn PowerControl>,
    ) -> VpuResult<Self> {
        Self::with_watchdog_timeout(variant, region, allocator, power, WATCHDOG_TIMEOUT)
    }

    pub fn with_watchdog_timeout(
        variant: &'static VpuVariant,
        region: Arc<dyn MmioRegion>,
        allocator: Arc<dyn DmaAllocator>,
        power: Arc<dyn PowerControl>,
        watchdog_timeout: Duration,
    ) -> VpuResult<Self> {
        let mut blocks = Vec::with_capacity(variant.windows.len());
        for window in variant.windows {
            let sub = SubRegion::new(region.clone(), window.offset, window.len)?;
            let name = match window.block {
                HwBlock::Vepu => "vepu",
                HwBlock::Vdpu => "vdpu",
                HwBlock::Rkvdec => "rkvdec",
            };
            blocks.push((window.block, RegisterBlock::new(name, Arc::new(sub))));
        }

        power.set_clock_rate(variant.aclk_rate)?;
        log::debug!(
            "{}: aclk {} Hz, autosuspend after {:?}",
            variant.name,
            variant.aclk_rate,
            variant.autosuspend_delay
        );

        let inner = Arc::new_cyclic(|weak: &Weak<DeviceInner>| {
            let weak = weak.clone();
            DeviceInner {
                variant,
                blocks,
                pool: AuxBufferPool::new(allocator),
                power,
                slot: Mutex::new(JobSlot {
                    state: RunState::Idle,
                    job: None,
                    next_id: 0,
                    stats: Default::default(),
                }),
                idle: Condvar::new(),
                watchdog: Watchdog::new(move |job| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_timeout(Some(job));
                    }
                }),
                watchdog_timeout,
            }
        });

        Ok(Self { inner })
    }

    pub fn variant(&self) -> &'static VpuVariant {
        self.inner.variant
    }

    /// Opens a session running `mode` on frames of `format`, allocating its auxiliary buffers.
    pub fn open(&self, mode: CodecMode, format: FrameFormat) -> VpuResult<CodecContext> {
        CodecContext::open(self.inner.clone(), mode, format)
    }

    /// Interrupt handler of `block`. Returns whether the interrupt completed the running job.
    pub fn handle_irq(&self, block: HwBlock) -> IrqVerdict {
        self.inner.handle_irq(block)
    }

    /// Times out the running job as if its watchdog had fired. Does nothing without one.
    pub fn handle_timeout(&self) {
        self.inner.handle_timeout(None)
    }

    pub fn state(&self) -> RunState {
        self.inner.lock_slot().state
    }

    pub fn stats(&self) -> Stats {
        self.inner.lock_slot().stats
    }

    /// Blocks until the device is idle, or until `timeout` passes. Returns whether it is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let slot = self.inner.lock_slot();
        let (slot, _) = self
            .inner
            .idle
            .wait_timeout_while(slot, timeout, |slot| slot.state != RunState::Idle)
            .unwrap_or_else(PoisonError::into_inner);
        slot.state == RunState::Idle
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::aux_buf::HeapAllocator;
    use crate::backend::h264d::H264dRun;
    use crate::backend::vp8d::Vp8dRun;
    use crate::codec::h264::params::DecodeParams;
    use crate::codec::h264::params::DpbEntry;
    use crate::codec::vp8::params::FrameHeader;
    use crate::device::variant::RK3288_VPU;
    use crate::device::variant::RKVDEC;
    use crate::regs::rkvdec;
    use crate::regs::vdpu;
    use crate::regs::MemoryRegion;
    use crate::PixelFormat;

    const VDPU_BASE: usize = 0x400;

    struct Setup {
        device: Device,
        region: Arc<MemoryRegion>,
        power: Arc<SimulatedPower>,
    }

    fn setup(variant: &'static VpuVariant, timeout: Duration) -> Setup {
        let _ = env_logger::builder().is_test(true).try_init();
        let region = Arc::new(MemoryRegion::new(variant.region_size()));
        let power = Arc::new(SimulatedPower::new());
        let device = Device::with_watchdog_timeout(
            variant,
            region.clone(),
            Arc::new(HeapAllocator::new()),
            power.clone(),
            timeout,
        )
        .unwrap();
        Setup {
            device,
            region,
            power,
        }
    }

    fn format() -> FrameFormat {
        FrameFormat::new(176, 144, PixelFormat::NV12)
    }

    fn vp8d_run() -> FrameRunParameters {
        let mut header = FrameHeader {
            key_frame: true,
            width: 176,
            height: 144,
            num_dct_parts: 1,
            first_part_size: 100,
            header_size: 203,
            ..Default::default()
        };
        header.dct_part_sizes[0] = 300;
        FrameRunParameters::Vp8Decode(Vp8dRun {
            src: 0x1000_0000,
            src_len: 4096,
            dst: 0x2000_0000,
            last: None,
            golden: None,
            alt: None,
            header: Box::new(header),
        })
    }

    fn completion() -> (DoneCallback, mpsc::Receiver<(RunResult, Feedback)>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let on_done: DoneCallback = Box::new(move |result, feedback| {
            let _ = tx.lock().unwrap().send((result, feedback));
        });
        (on_done, rx)
    }

    fn raise_vdpu_irq(region: &MemoryRegion) {
        region.poke(
            VDPU_BASE + vdpu::INTERRUPT,
            vdpu::INTERRUPT_DEC_IRQ | vdpu::INTERRUPT_DEC_RDY_INT,
        );
    }

    #[test]
    fn test_clock_rate_set_at_creation() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        assert_eq!(s.power.clock_rate(), 400_000_000);
        assert_eq!(s.device.state(), RunState::Idle);
        assert!(!s.power.is_on());
    }

    #[test]
    fn test_region_too_small() {
        let region = Arc::new(MemoryRegion::new(0x400));
        assert!(Device::new(
            &RK3288_VPU,
            region,
            Arc::new(HeapAllocator::new()),
            Arc::new(SimulatedPower::new()),
        )
        .is_err());
    }

    #[test]
    fn test_run_completes_on_irq() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();
        let (on_done, rx) = completion();

        ctx.run(vp8d_run(), on_done).unwrap();
        assert_eq!(s.device.state(), RunState::HwRunning);
        assert!(s.power.is_on());

        // The start write is the only barriered one, and the last.
        let log = s.region.write_log();
        assert_eq!(log.iter().filter(|w| w.barriered).count(), 1);
        let last = log.last().unwrap();
        assert!(last.barriered);
        assert_eq!(last.offset, VDPU_BASE + vdpu::INTERRUPT);
        assert_eq!(last.value, vdpu::INTERRUPT_DEC_E);

        raise_vdpu_irq(&s.region);
        assert_eq!(
            s.device.handle_irq(HwBlock::Vdpu),
            IrqVerdict::Done(RunResult::Success)
        );
        assert_eq!(rx.try_recv().unwrap(), (RunResult::Success, Feedback::None));
        assert_eq!(s.device.state(), RunState::Idle);
        assert!(!s.power.is_on());

        let stats = s.device.stats();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.timeouts, 0);
    }

    #[test]
    fn test_busy_leaves_running_job_alone() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();
        let (on_done, rx) = completion();
        ctx.run(vp8d_run(), on_done).unwrap();
        let writes = s.region.write_log().len();

        let (second, second_rx) = completion();
        assert!(matches!(ctx.run(vp8d_run(), second), Err(VpuError::Busy)));
        assert_eq!(s.device.state(), RunState::HwRunning);
        assert_eq!(s.region.write_log().len(), writes);
        assert_eq!(s.power.power_ons(), 1);

        raise_vdpu_irq(&s.region);
        s.device.handle_irq(HwBlock::Vdpu);
        assert_eq!(rx.try_recv().unwrap().0, RunResult::Success);
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn test_spurious_irqs() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        assert_eq!(s.device.handle_irq(HwBlock::Vdpu), IrqVerdict::Spurious);

        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();
        let (on_done, rx) = completion();
        ctx.run(vp8d_run(), on_done).unwrap();

        // Ready without the interrupt bit, and an interrupt of the other block.
        s.region
            .poke(VDPU_BASE + vdpu::INTERRUPT, vdpu::INTERRUPT_DEC_RDY_INT);
        assert_eq!(s.device.handle_irq(HwBlock::Vdpu), IrqVerdict::Spurious);
        assert_eq!(s.device.handle_irq(HwBlock::Vepu), IrqVerdict::Spurious);
        assert_eq!(s.device.state(), RunState::HwRunning);
        assert!(rx.try_recv().is_err());
        assert_eq!(s.device.stats().spurious_irqs, 3);

        raise_vdpu_irq(&s.region);
        s.device.handle_irq(HwBlock::Vdpu);
        assert_eq!(rx.try_recv().unwrap().0, RunResult::Success);
    }

    #[test]
    fn test_watchdog_timeout() {
        let s = setup(&RK3288_VPU, Duration::from_millis(20));
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();
        let (on_done, rx) = completion();
        ctx.run(vp8d_run(), on_done).unwrap();

        let (result, _) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(result, RunResult::Error);
        assert!(s.device.wait_idle(Duration::from_secs(10)));
        assert!(!s.power.is_on());
        assert_eq!(s.power.power_offs(), 1);

        // The block was reset.
        assert_eq!(
            s.region.write_log().last().map(|w| (w.offset, w.value)),
            Some((VDPU_BASE + vdpu::CONFIG, 0))
        );

        // A late interrupt finds nothing to complete.
        raise_vdpu_irq(&s.region);
        assert_eq!(s.device.handle_irq(HwBlock::Vdpu), IrqVerdict::Spurious);

        let stats = s.device.stats();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.spurious_irqs, 1);
    }

    #[test]
    fn test_irq_and_watchdog_race() {
        let s = setup(&RK3288_VPU, Duration::from_secs(600));
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..50 {
            let c = calls.clone();
            ctx.run(vp8d_run(), move |_: RunResult, _: Feedback| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            raise_vdpu_irq(&s.region);

            let barrier = Arc::new(Barrier::new(2));
            let irq = {
                let device = s.device.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    device.handle_irq(HwBlock::Vdpu);
                })
            };
            let timeout = {
                let device = s.device.clone();
                thread::spawn(move || {
                    barrier.wait();
                    device.handle_timeout();
                })
            };
            irq.join().unwrap();
            timeout.join().unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), i + 1);
            assert_eq!(s.power.power_offs(), i + 1);
            assert_eq!(s.device.state(), RunState::Idle);
        }

        let stats = s.device.stats();
        assert_eq!(stats.completed + stats.timeouts, 50);
    }

    #[test]
    fn test_power_on_failure() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();

        s.power.fail_next_power_on();
        let (on_done, rx) = completion();
        assert!(matches!(
            ctx.run(vp8d_run(), on_done),
            Err(VpuError::PowerOn(_))
        ));
        assert_eq!(s.device.state(), RunState::Idle);
        assert!(s.region.write_log().is_empty());
        assert!(rx.try_recv().is_err());

        let (on_done, _rx) = completion();
        ctx.run(vp8d_run(), on_done).unwrap();
        assert_eq!(s.device.state(), RunState::HwRunning);
    }

    #[test]
    fn test_invalid_run_keeps_device_untouched() {
        let s = setup(&RK3288_VPU, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::Vp8Decode, format()).unwrap();

        let mut params = vp8d_run();
        if let FrameRunParameters::Vp8Decode(run) = &mut params {
            run.src_len = 16;
        }
        let (on_done, _rx) = completion();
        assert!(matches!(
            ctx.run(params, on_done),
            Err(VpuError::UnsupportedParameter(_))
        ));

        let (on_done, _rx) = completion();
        let h264 = FrameRunParameters::H264Decode(H264dRun {
            src: 0,
            src_len: 0,
            dst: 0,
            params: Default::default(),
        });
        assert!(matches!(
            ctx.run(h264, on_done),
            Err(VpuError::ContextMismatch)
        ));

        assert_eq!(s.power.power_ons(), 0);
        assert!(s.region.write_log().is_empty());
        assert_eq!(s.device.state(), RunState::Idle);
    }

    #[test]
    fn test_dpb_fallbacks_counted() {
        let s = setup(&RKVDEC, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::H264Decode, format()).unwrap();
        ctx.set_dst_buffers(vec![0x3000_0000, 0x3100_0000]);

        let mut params = DecodeParams::default();
        params.dpb[0] = DpbEntry {
            buf_index: 1,
            active: true,
            ..Default::default()
        };
        params.dpb[1] = DpbEntry {
            buf_index: 7,
            active: true,
            ..Default::default()
        };
        let (on_done, rx) = completion();
        ctx.run(
            FrameRunParameters::H264Decode(H264dRun {
                src: 0x1000_0000,
                src_len: 0x1000,
                dst: 0x2000_0000,
                params: Box::new(params),
            }),
            on_done,
        )
        .unwrap();
        assert_eq!(s.device.stats().dpb_fallbacks, 1);

        s.region.poke(rkvdec::INTERRUPT, rkvdec::RDY_STA);
        assert_eq!(
            s.device.handle_irq(HwBlock::Rkvdec),
            IrqVerdict::Done(RunResult::Success)
        );
        assert_eq!(rx.try_recv().unwrap().0, RunResult::Success);
    }

    #[test]
    fn test_rkvdec_error_completes_with_error() {
        let s = setup(&RKVDEC, WATCHDOG_TIMEOUT);
        let ctx = s.device.open(CodecMode::H264Decode, format()).unwrap();
        let (on_done, rx) = completion();
        ctx.run(
            FrameRunParameters::H264Decode(H264dRun {
                src: 0x1000_0000,
                src_len: 0x1000,
                dst: 0x2000_0000,
                params: Default::default(),
            }),
            on_done,
        )
        .unwrap();

        s.region
            .poke(rkvdec::INTERRUPT, rkvdec::RDY_STA | rkvdec::ERR_STA);
        assert_eq!(
            s.device.handle_irq(HwBlock::Rkvdec),
            IrqVerdict::Done(RunResult::Error)
        );
        assert_eq!(rx.try_recv().unwrap().0, RunResult::Error);
        assert_eq!(s.device.stats().failed, 1);
    }
}
