// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Codec mode backends.
//!
//! Each codec mode runs on one hardware block and provides the same set of operations: `init`
//! and `exit` allocate and free its auxiliary buffers, `prepare` packs the tables of a run,
//! `program` writes the registers and returns the write that starts the hardware, `done` reads
//! the results back. Interrupt decoding and reset depend only on the block and live here.
//!
//! The set of modes is closed: [`HwContext`] holds the per-mode state and [`FrameRunParameters`]
//! the per-run input, and a context only accepts the parameters of its own mode.

pub mod h264d;
pub mod h264e;
pub mod vp8d;
pub mod vp8e;
pub mod vp9d;

use thiserror::Error;

use crate::aux_buf::AuxBufferPool;
use crate::regs::rkvdec;
use crate::regs::vdpu;
use crate::regs::vepu;
use crate::regs::RegisterBlock;
use crate::utils::align_up;
use crate::utils::MB_DIM;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// Hardware block of a VPU instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HwBlock {
    /// Hantro H1 encoder.
    Vepu,
    /// Hantro G1 decoder.
    Vdpu,
    /// Rockchip H.264/VP9 decoder.
    Rkvdec,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    H264,
    Vp8,
    Vp9,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Encode,
    Decode,
}

/// Codec mode a context is bound to. Selects the backend, and with it the hardware block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodecMode {
    Vp8Encode,
    Vp8Decode,
    H264Encode,
    H264Decode,
    Vp9Decode,
}

impl CodecMode {
    pub fn new(direction: Direction, codec: Codec) -> Option<Self> {
        match (direction, codec) {
            (Direction::Encode, Codec::Vp8) => Some(CodecMode::Vp8Encode),
            (Direction::Decode, Codec::Vp8) => Some(CodecMode::Vp8Decode),
            (Direction::Encode, Codec::H264) => Some(CodecMode::H264Encode),
            (Direction::Decode, Codec::H264) => Some(CodecMode::H264Decode),
            (Direction::Decode, Codec::Vp9) => Some(CodecMode::Vp9Decode),
            (Direction::Encode, Codec::Vp9) => None,
        }
    }

    pub fn block(&self) -> HwBlock {
        match self {
            CodecMode::Vp8Encode | CodecMode::H264Encode => HwBlock::Vepu,
            CodecMode::Vp8Decode => HwBlock::Vdpu,
            CodecMode::H264Decode | CodecMode::Vp9Decode => HwBlock::Rkvdec,
        }
    }

    pub fn is_encoder(&self) -> bool {
        matches!(self, CodecMode::Vp8Encode | CodecMode::H264Encode)
    }

    /// Reads and acknowledges the interrupt status of this mode's block.
    pub fn irq(&self, regs: &RegisterBlock) -> IrqVerdict {
        match self.block() {
            HwBlock::Vepu => vepu_irq(regs),
            HwBlock::Vdpu => vdpu_irq(regs),
            HwBlock::Rkvdec => rkvdec_irq(regs),
        }
    }

    /// Stops the block after a timeout.
    pub fn reset(&self, regs: &RegisterBlock) {
        match self.block() {
            HwBlock::Vepu => enc_reset(regs),
            HwBlock::Vdpu => dec_reset(regs),
            HwBlock::Rkvdec => rkvdec_reset(regs),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunResult {
    Success,
    Error,
}

/// Outcome of reading a block's interrupt status.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrqVerdict {
    /// Not a completion of the running job.
    Spurious,
    Done(RunResult),
}

/// The register write that starts the hardware. It is issued with a barrier, after every other
/// write of the run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StartWrite {
    pub offset: usize,
    pub value: u32,
}

/// Result of programming the registers of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Programmed {
    pub start: StartWrite,
    /// Number of references that fell back to the destination buffer.
    pub dpb_fallbacks: u32,
}

/// Data read back by `done`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    None,
    Vp8Encode(vp8e::Vp8eFeedback),
    H264Encode(h264e::H264eFeedback),
    Vp9Decode(vp9d::Vp9dFeedback),
}

/// Per-run input of every codec mode.
#[derive(Clone, Debug)]
pub enum FrameRunParameters {
    Vp8Encode(vp8e::Vp8eRun),
    Vp8Decode(vp8d::Vp8dRun),
    H264Encode(h264e::H264eRun),
    H264Decode(h264d::H264dRun),
    Vp9Decode(vp9d::Vp9dRun),
}

impl FrameRunParameters {
    pub fn mode(&self) -> CodecMode {
        match self {
            FrameRunParameters::Vp8Encode(_) => CodecMode::Vp8Encode,
            FrameRunParameters::Vp8Decode(_) => CodecMode::Vp8Decode,
            FrameRunParameters::H264Encode(_) => CodecMode::H264Encode,
            FrameRunParameters::H264Decode(_) => CodecMode::H264Decode,
            FrameRunParameters::Vp9Decode(_) => CodecMode::Vp9Decode,
        }
    }
}

/// Failure to lay out an encoded frame in its destination buffer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssembleError {
    #[error("frame of {needed} bytes does not fit in a {capacity}-byte buffer")]
    Overflow { needed: usize, capacity: usize },
    #[error("hardware output at {offset}+{len} lies outside the {capacity}-byte buffer")]
    OutputOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("{len}-byte header cannot hold a {tag_size}-byte frame tag")]
    HeaderTooShort { len: usize, tag_size: usize },
}

/// Hardware state of one context, for the mode it was created with.
pub enum HwContext {
    Vp8e(vp8e::Vp8eContext),
    Vp8d(vp8d::Vp8dContext),
    H264e(h264e::H264eContext),
    H264d(h264d::H264dContext),
    Vp9d(vp9d::Vp9dContext),
}

impl HwContext {
    /// Allocates the auxiliary buffers of `mode`. On failure nothing stays allocated.
    pub fn init(mode: CodecMode, pool: &AuxBufferPool, format: &FrameFormat) -> VpuResult<Self> {
        Ok(match mode {
            CodecMode::Vp8Encode => HwContext::Vp8e(vp8e::Vp8eContext::init(pool, format)?),
            CodecMode::Vp8Decode => HwContext::Vp8d(vp8d::Vp8dContext::init(pool, format)?),
            CodecMode::H264Encode => HwContext::H264e(h264e::H264eContext::init(pool, format)?),
            CodecMode::H264Decode => HwContext::H264d(h264d::H264dContext::init(pool, format)?),
            CodecMode::Vp9Decode => HwContext::Vp9d(vp9d::Vp9dContext::init(pool, format)?),
        })
    }

    /// Frees the auxiliary buffers in reverse allocation order.
    pub fn exit(self, pool: &AuxBufferPool) {
        match self {
            HwContext::Vp8e(c) => c.exit(pool),
            HwContext::Vp8d(c) => c.exit(pool),
            HwContext::H264e(c) => c.exit(pool),
            HwContext::H264d(c) => c.exit(pool),
            HwContext::Vp9d(c) => c.exit(pool),
        }
    }

    pub fn mode(&self) -> CodecMode {
        match self {
            HwContext::Vp8e(_) => CodecMode::Vp8Encode,
            HwContext::Vp8d(_) => CodecMode::Vp8Decode,
            HwContext::H264e(_) => CodecMode::H264Encode,
            HwContext::H264d(_) => CodecMode::H264Decode,
            HwContext::Vp9d(_) => CodecMode::Vp9Decode,
        }
    }

    /// Checks `params` without touching the hardware.
    pub fn validate(&self, format: &FrameFormat, params: &FrameRunParameters) -> VpuResult<()> {
        match (self, params) {
            (HwContext::Vp8e(c), FrameRunParameters::Vp8Encode(p)) => c.validate(format, p),
            (HwContext::Vp8d(c), FrameRunParameters::Vp8Decode(p)) => c.validate(format, p),
            (HwContext::H264e(c), FrameRunParameters::H264Encode(p)) => c.validate(format, p),
            (HwContext::H264d(c), FrameRunParameters::H264Decode(p)) => c.validate(format, p),
            (HwContext::Vp9d(c), FrameRunParameters::Vp9Decode(p)) => c.validate(format, p),
            _ => Err(VpuError::ContextMismatch),
        }
    }

    /// Packs the auxiliary tables of a run.
    pub fn prepare(&mut self, format: &FrameFormat, params: &FrameRunParameters) -> VpuResult<()> {
        match (self, params) {
            (HwContext::Vp8e(c), FrameRunParameters::Vp8Encode(p)) => c.prepare(format, p),
            (HwContext::Vp8d(c), FrameRunParameters::Vp8Decode(p)) => c.prepare(format, p),
            (HwContext::H264e(c), FrameRunParameters::H264Encode(p)) => c.prepare(format, p),
            (HwContext::H264d(c), FrameRunParameters::H264Decode(p)) => c.prepare(format, p),
            (HwContext::Vp9d(c), FrameRunParameters::Vp9Decode(p)) => c.prepare(format, p),
            _ => Err(VpuError::ContextMismatch),
        }
    }

    /// Writes every register of the run with relaxed writes, and returns the start write.
    /// `dst_buffers` holds the addresses of the destination buffers registered with the context.
    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        params: &FrameRunParameters,
        dst_buffers: &[u32],
    ) -> VpuResult<Programmed> {
        match (self, params) {
            (HwContext::Vp8e(c), FrameRunParameters::Vp8Encode(p)) => {
                Ok(c.program(regs, format, p))
            }
            (HwContext::Vp8d(c), FrameRunParameters::Vp8Decode(p)) => {
                Ok(c.program(regs, format, p))
            }
            (HwContext::H264e(c), FrameRunParameters::H264Encode(p)) => {
                c.program(regs, format, p)
            }
            (HwContext::H264d(c), FrameRunParameters::H264Decode(p)) => {
                Ok(c.program(regs, format, p, dst_buffers))
            }
            (HwContext::Vp9d(c), FrameRunParameters::Vp9Decode(p)) => {
                Ok(c.program(regs, format, p))
            }
            _ => Err(VpuError::ContextMismatch),
        }
    }

    /// Reads the results of the finished run. Runs before the device accepts another job, with
    /// the registers still holding their final values.
    pub fn done(&mut self, regs: &RegisterBlock, result: RunResult) -> Feedback {
        match self {
            HwContext::Vp8e(c) => c.done(regs, result),
            HwContext::Vp8d(_) | HwContext::H264d(_) => Feedback::None,
            HwContext::H264e(c) => c.done(regs, result),
            HwContext::Vp9d(c) => c.done(result),
        }
    }
}

/// Input image control word of the H1 encoder for frames of `format`. The frame is padded to
/// whole macroblocks on the right (in units of 4 pixels) and at the bottom.
pub(crate) fn enc_in_img_ctrl(format: &FrameFormat) -> u32 {
    let width = format.coded.width;
    let height = format.coded.height;
    let overfill_right = (align_up(width, MB_DIM) - width) / 4;
    let overfill_bottom = align_up(height, MB_DIM) - height;

    vepu::in_img_row_length(align_up(width, MB_DIM))
        | vepu::in_img_overfill_right(overfill_right)
        | vepu::in_img_overfill_bottom(overfill_bottom)
        | vepu::in_img_fmt(format.pixel_format.encoder_input_format())
}

/// Programs the reference and reconstruction frames of the H1 encoder. Both live in `ext_dma`,
/// which holds two frames; they swap roles after every run.
pub(crate) fn enc_program_ref_rec(
    regs: &RegisterBlock,
    format: &FrameFormat,
    ext_dma: u32,
    swapped: &mut bool,
) {
    let luma_size = format.mb_aligned_luma_size() as u32;
    let frame_size = luma_size * 3 / 2;

    let (ref_dma, rec_dma) = if *swapped {
        (ext_dma, ext_dma + frame_size)
    } else {
        (ext_dma + frame_size, ext_dma)
    };
    *swapped = !*swapped;

    regs.write(vepu::ADDR_REF_LUMA, ref_dma);
    regs.write(vepu::ADDR_REF_CHROMA, ref_dma + luma_size);
    regs.write(vepu::ADDR_REC_LUMA, rec_dma);
    regs.write(vepu::ADDR_REC_CHROMA, rec_dma + luma_size);
}

/// Size of the encoder's reference/reconstruction buffer: two frames.
pub(crate) fn enc_ext_buf_size(format: &FrameFormat) -> usize {
    2 * format.mb_aligned_luma_size() * 3 / 2
}

/// Rejects frames wider or taller than the encoder's 9-bit macroblock counters.
pub(crate) fn enc_validate_format(format: &FrameFormat) -> VpuResult<()> {
    let (mbw, mbh) = (format.coded.mb_width(), format.coded.mb_height());
    if mbw == 0 || mbh == 0 || mbw > 0x1ff || mbh > 0x1ff {
        return Err(VpuError::UnsupportedParameter(format!(
            "encoder frame size {}x{}",
            format.coded.width, format.coded.height
        )));
    }
    Ok(())
}

/// Last programming step of every H1 run: bus configuration, interrupt acknowledge, and the
/// encoder control word that starts the block.
pub(crate) fn enc_start(
    regs: &RegisterBlock,
    format: &FrameFormat,
    mode: u32,
    intra: bool,
) -> StartWrite {
    regs.write(vepu::AXI_CTRL, vepu::AXI_CTRL_DEFAULT);
    regs.write(vepu::INTERRUPT, 0);

    let mut value = vepu::ENC_CTRL_NAL_MODE_BIT
        | vepu::enc_ctrl_width(format.coded.mb_width())
        | vepu::enc_ctrl_height(format.coded.mb_height())
        | mode
        | vepu::ENC_CTRL_EN_BIT;
    if intra {
        value |= vepu::ENC_PIC_INTRA;
    }
    StartWrite {
        offset: vepu::ENC_CTRL,
        value,
    }
}

fn vepu_irq(regs: &RegisterBlock) -> IrqVerdict {
    let status = regs.read(vepu::INTERRUPT);
    log::debug!("enc status {:#x}", status);
    regs.write(vepu::INTERRUPT, 0);

    if status & vepu::INTERRUPT_BIT == 0 {
        return IrqVerdict::Spurious;
    }
    regs.write(vepu::AXI_CTRL, 0);

    if status & vepu::INTERRUPT_FRAME_RDY != 0 {
        IrqVerdict::Done(RunResult::Success)
    } else {
        log::warn!("encoder stopped without a frame, status {:#x}", status);
        IrqVerdict::Done(RunResult::Error)
    }
}

fn vdpu_irq(regs: &RegisterBlock) -> IrqVerdict {
    let status = regs.read(vdpu::INTERRUPT);
    log::debug!("dec status {:#x}", status);
    regs.write(vdpu::INTERRUPT, 0);

    if status & vdpu::INTERRUPT_DEC_IRQ == 0 {
        return IrqVerdict::Spurious;
    }
    regs.write(vdpu::CONFIG, 0);

    if status & vdpu::INTERRUPT_DEC_RDY_INT != 0 {
        IrqVerdict::Done(RunResult::Success)
    } else {
        log::warn!("decoder stopped without a picture, status {:#x}", status);
        IrqVerdict::Done(RunResult::Error)
    }
}

fn rkvdec_irq(regs: &RegisterBlock) -> IrqVerdict {
    let status = regs.read(rkvdec::INTERRUPT);
    log::debug!("rkvdec status {:#x}", status);
    regs.write(rkvdec::INTERRUPT, 0);

    if status & rkvdec::ERROR_STA_MASK != 0 {
        log::warn!("rkvdec error status {:#x}", status);
        return IrqVerdict::Done(RunResult::Error);
    }
    if status & rkvdec::RDY_STA != 0 {
        return IrqVerdict::Done(RunResult::Success);
    }
    IrqVerdict::Spurious
}

fn enc_reset(regs: &RegisterBlock) {
    regs.write(vepu::INTERRUPT, vepu::INTERRUPT_DIS_BIT);
    regs.write(vepu::ENC_CTRL, 0);
    regs.write(vepu::AXI_CTRL, 0);
}

fn dec_reset(regs: &RegisterBlock) {
    regs.write(vdpu::INTERRUPT, vdpu::INTERRUPT_DEC_IRQ_DIS);
    regs.write(vdpu::CONFIG, 0);
}

fn rkvdec_reset(regs: &RegisterBlock) {
    regs.write(rkvdec::INTERRUPT, rkvdec::IRQ_DIS);
    regs.write(rkvdec::SYSCTRL, 0);
}
