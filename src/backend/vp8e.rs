// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! VP8 encoding on the H1 block.
//!
//! The rate control and frame header are produced upstream and arrive as a block of low level
//! register values ([`Vp8eRegParams`]) plus the frame header bytes. The hardware writes the
//! extended header at the stream start offset held in the `STR_OFFS` bits of `RLC_CTRL`, and
//! the DCT partition at a fixed offset further in; [`Vp8eFeedback::assemble`] puts the frame
//! back together once the run is done.

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use bytes::Bytes;

use crate::aux_buf::AuxBuffer;
use crate::aux_buf::AuxBufferPool;
use crate::backend::enc_ext_buf_size;
use crate::backend::enc_in_img_ctrl;
use crate::backend::enc_program_ref_rec;
use crate::backend::enc_start;
use crate::backend::enc_validate_format;
use crate::backend::AssembleError;
use crate::backend::Feedback;
use crate::backend::Programmed;
use crate::backend::RunResult;
use crate::regs::vepu;
use crate::regs::RegisterBlock;
use crate::utils::align_up;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// Size of the control buffer the encoder reports its output sizes in.
pub const CTRL_BUF_SIZE: usize = 1024;
/// Size of the frame tag of a key frame, including the start code and dimensions.
pub const KEY_FRAME_TAG_SIZE: usize = 10;
/// Size of the frame tag of an inter frame.
pub const INTER_FRAME_TAG_SIZE: usize = 3;

const FRAME_TAG_KEY_FRAME_BIT: u32 = 1 << 0;
const FRAME_TAG_LENGTH_SHIFT: u32 = 5;
const FRAME_TAG_LENGTH_MASK: u32 = 0x7ffff << FRAME_TAG_LENGTH_SHIFT;

/// Low level encoder parameters, one field per register (or register array) of the encoder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vp8eRegParams {
    /// Length of the software frame header in bytes.
    pub hdr_len: u32,
    pub enc_ctrl: u32,
    pub enc_ctrl0: u32,
    pub enc_ctrl1: u32,
    pub enc_ctrl2: u32,
    pub enc_ctrl3: u32,
    pub enc_ctrl5: u32,
    pub enc_ctrl4: u32,
    pub str_hdr_rem_msb: u32,
    pub str_hdr_rem_lsb: u32,
    pub mad_ctrl: u32,
    pub qp_val: [u32; 8],
    pub bool_enc: u32,
    pub vp8_ctrl0: u32,
    /// Carries the bit offset at which the hardware output starts, see
    /// [`vepu::RLC_CTRL_STR_OFFS`].
    pub rlc_ctrl: u32,
    pub mb_ctrl: u32,
    pub rgb_yuv_coeff: [u32; 2],
    pub rgb_mask_msb: u32,
    pub intra_area_ctrl: u32,
    pub cir_intra_ctrl: u32,
    pub first_roi_area: u32,
    pub second_roi_area: u32,
    pub mvc_ctrl: u32,
    pub intra_penalty: [u32; 7],
    pub seg_qp: [u32; 24],
    pub dmv_4p_1p_penalty: [u32; 32],
    pub dmv_qpel_penalty: [u32; 32],
    pub vp8_ctrl1: u32,
    pub bit_cost_golden: u32,
    pub loop_flt_delta: [u32; 2],
}

impl Vp8eRegParams {
    /// Bytes of software header in front of the hardware output.
    pub fn hdr_size(&self) -> usize {
        let start_offset = vepu::RLC_CTRL_STR_OFFS.decode(self.rlc_ctrl);
        (self.hdr_len + start_offset / 8) as usize
    }

    fn write(&self, regs: &RegisterBlock) {
        regs.write(vepu::ENC_CTRL0, self.enc_ctrl0);
        regs.write(vepu::ENC_CTRL1, self.enc_ctrl1);
        regs.write(vepu::ENC_CTRL2, self.enc_ctrl2);
        regs.write(vepu::ENC_CTRL3, self.enc_ctrl3);
        regs.write(vepu::ENC_CTRL5, self.enc_ctrl5);
        regs.write(vepu::ENC_CTRL4, self.enc_ctrl4);
        regs.write(vepu::STR_HDR_REM_MSB, self.str_hdr_rem_msb);
        regs.write(vepu::STR_HDR_REM_LSB, self.str_hdr_rem_lsb);
        regs.write(vepu::MAD_CTRL, self.mad_ctrl);

        for (i, &v) in self.qp_val.iter().enumerate() {
            regs.write(vepu::vp8_qp_val(i), v);
        }

        regs.write(vepu::VP8_BOOL_ENC, self.bool_enc);
        regs.write(vepu::VP8_CTRL0, self.vp8_ctrl0);
        regs.write(vepu::RLC_CTRL, self.rlc_ctrl);
        regs.write(vepu::MB_CTRL, self.mb_ctrl);

        for (i, &v) in self.rgb_yuv_coeff.iter().enumerate() {
            regs.write(vepu::rgb_yuv_coeff(i), v);
        }
        regs.write(vepu::RGB_MASK_MSB, self.rgb_mask_msb);
        regs.write(vepu::INTRA_AREA_CTRL, self.intra_area_ctrl);
        regs.write(vepu::CIR_INTRA_CTRL, self.cir_intra_ctrl);
        regs.write(vepu::FIRST_ROI_AREA, self.first_roi_area);
        regs.write(vepu::SECOND_ROI_AREA, self.second_roi_area);
        regs.write(vepu::MVC_CTRL, self.mvc_ctrl);

        for (i, &v) in self.intra_penalty.iter().enumerate() {
            regs.write(vepu::vp8_intra_penalty(i), v);
        }
        for (i, &v) in self.seg_qp.iter().enumerate() {
            regs.write(vepu::vp8_seg_qp(i), v);
        }
        for (i, &v) in self.dmv_4p_1p_penalty.iter().enumerate() {
            regs.write(vepu::dmv_4p_1p_penalty(i), v);
        }
        for (i, &v) in self.dmv_qpel_penalty.iter().enumerate() {
            regs.write(vepu::dmv_qpel_penalty(i), v);
        }

        regs.write(vepu::VP8_CTRL1, self.vp8_ctrl1);
        regs.write(vepu::VP8_BIT_COST_GOLDEN, self.bit_cost_golden);
        for (i, &v) in self.loop_flt_delta.iter().enumerate() {
            regs.write(vepu::vp8_loop_flt_delta(i), v);
        }

        regs.write(vepu::ENC_CTRL, self.enc_ctrl & !vepu::ENC_CTRL_EN_BIT);
    }
}

/// Parameters of a throw-away encode that brings the encoder back to a sane state after the
/// block was used for decoding.
pub fn dummy_encode_params() -> Vp8eRegParams {
    let mut dmv_4p_1p_penalty = [0u32; 32];
    for (i, v) in dmv_4p_1p_penalty.iter_mut().take(15).enumerate() {
        // Consecutive even bytes: 0x00020406, 0x080a0c0e, ..., 0x70727476.
        let b = (i as u32) * 8;
        *v = (b << 24) | ((b + 2) << 16) | ((b + 4) << 8) | (b + 6);
    }

    let seg_qp_group = [
        0x020213b1, 0x02825249, 0x048409d8, 0x03834c30, 0x020213b1, 0x02825249, 0x00340e0d,
        0x341c1a15,
    ];
    let mut seg_qp = [0u32; 24];
    for (i, v) in seg_qp.iter_mut().enumerate() {
        *v = seg_qp_group[i % 8];
    }

    Vp8eRegParams {
        hdr_len: 0x00000000,
        enc_ctrl: 0x00000008,
        enc_ctrl0: 0x00000000,
        enc_ctrl1: 0x00000000,
        enc_ctrl2: 0x00040014,
        enc_ctrl3: 0x404083c0,
        enc_ctrl5: 0x01006bff,
        enc_ctrl4: 0x00000039,
        str_hdr_rem_msb: 0x85848805,
        str_hdr_rem_lsb: 0x02000000,
        mad_ctrl: 0x00000000,
        qp_val: [
            0x020213b1, 0x02825249, 0x048409d8, 0x03834c30, 0x020213b1, 0x02825249, 0x00340e0d,
            0x401c1a15,
        ],
        bool_enc: 0x00018140,
        vp8_ctrl0: 0x000695c0,
        rlc_ctrl: 0x14000000,
        mb_ctrl: 0x00000000,
        rgb_yuv_coeff: [0x962b4c85, 0x90901d50],
        rgb_mask_msb: 0x0000b694,
        intra_area_ctrl: 0xffffffff,
        cir_intra_ctrl: 0x00000000,
        first_roi_area: 0xffffffff,
        second_roi_area: 0xffffffff,
        mvc_ctrl: 0x01780000,
        intra_penalty: [
            0x00010005, 0x00015011, 0x0000c005, 0x00016010, 0x0001a018, 0x00018015, 0x0001d01a,
        ],
        seg_qp,
        dmv_4p_1p_penalty,
        dmv_qpel_penalty: [0; 32],
        vp8_ctrl1: 0,
        bit_cost_golden: 0,
        loop_flt_delta: [0; 2],
    }
}

/// Input of one VP8 encode.
#[derive(Clone, Debug)]
pub struct Vp8eRun {
    /// Device addresses of the source planes. Unused planes are ignored.
    pub src: [u32; 3],
    pub dst: u32,
    pub dst_size: u32,
    pub key_frame: bool,
    pub reg_params: Box<Vp8eRegParams>,
    /// Software frame header, at least [`Vp8eRegParams::hdr_size`] bytes.
    pub header: Bytes,
    /// Probability table the encoder reads.
    pub prob_src: u32,
    /// Segmentation map the encoder reads.
    pub seg_map: u32,
    /// Buffer the encoder writes its probability counts to.
    pub prob_count: u32,
}

/// Output placement of a finished encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vp8eFeedback {
    pub key_frame: bool,
    pub hdr_size: usize,
    pub ext_hdr_size: usize,
    pub dct_size: usize,
    /// Where the hardware put the DCT partition.
    pub dct_offset: usize,
    pub header: Bytes,
}

impl Vp8eFeedback {
    /// Rewrites the hardware output in `dst` into a complete frame: software header, extended
    /// header, then the DCT partition moved up behind them. The frame tag is patched with the
    /// frame type and the first partition size. Returns the size of the frame.
    pub fn assemble(&self, dst: &mut [u8]) -> Result<usize, AssembleError> {
        let total = self.hdr_size + self.ext_hdr_size + self.dct_size;
        if total > dst.len() {
            return Err(AssembleError::Overflow {
                needed: total,
                capacity: dst.len(),
            });
        }
        if self.dct_offset + self.dct_size > dst.len() {
            return Err(AssembleError::OutputOutOfBounds {
                offset: self.dct_offset,
                len: self.dct_size,
                capacity: dst.len(),
            });
        }
        let tag_size = if self.key_frame {
            KEY_FRAME_TAG_SIZE
        } else {
            INTER_FRAME_TAG_SIZE
        };
        if self.hdr_size < tag_size.max(4) || self.header.len() < self.hdr_size {
            return Err(AssembleError::HeaderTooShort {
                len: self.hdr_size.min(self.header.len()),
                tag_size,
            });
        }

        log::debug!(
            "vp8e assemble: hdr_size = {}, ext_hdr_size = {}, dct_size = {}",
            self.hdr_size,
            self.ext_hdr_size,
            self.dct_size
        );

        let dct_dst = self.hdr_size + self.ext_hdr_size;
        dst.copy_within(self.dct_offset..self.dct_offset + self.dct_size, dct_dst);
        dst[..self.hdr_size].copy_from_slice(&self.header[..self.hdr_size]);

        let mut tag = LittleEndian::read_u32(&dst[..4]);
        if self.key_frame {
            tag &= !FRAME_TAG_KEY_FRAME_BIT;
        } else {
            tag |= FRAME_TAG_KEY_FRAME_BIT;
        }
        tag &= !FRAME_TAG_LENGTH_MASK;
        tag |= (((dct_dst - tag_size) as u32) << FRAME_TAG_LENGTH_SHIFT) & FRAME_TAG_LENGTH_MASK;
        LittleEndian::write_u32(&mut dst[..4], tag);

        Ok(total)
    }
}

struct PendingRun {
    key_frame: bool,
    hdr_size: usize,
    dct_offset: usize,
    header: Bytes,
}

pub struct Vp8eContext {
    ctrl_buf: AuxBuffer,
    mv_buf: AuxBuffer,
    ext_buf: AuxBuffer,
    ref_rec_swapped: bool,
    pending: Option<PendingRun>,
}

impl Vp8eContext {
    pub fn init(pool: &AuxBufferPool, format: &FrameFormat) -> VpuResult<Self> {
        let mbs = (format.coded.mb_width() * format.coded.mb_height()) as usize;
        let [ctrl_buf, mv_buf, ext_buf] = pool.allocate_set([
            ("vp8e ctrl_buf", CTRL_BUF_SIZE),
            ("vp8e mv_buf", mbs.div_ceil(4).max(1)),
            ("vp8e ext_buf", enc_ext_buf_size(format)),
        ])?;

        Ok(Self {
            ctrl_buf,
            mv_buf,
            ext_buf,
            ref_rec_swapped: false,
            pending: None,
        })
    }

    pub fn exit(self, pool: &AuxBufferPool) {
        pool.free_set([self.ctrl_buf, self.mv_buf, self.ext_buf]);
    }

    fn dct_offset(dst_size: u32) -> u32 {
        // A tenth of the buffer is left for the headers.
        align_up(dst_size / 10, 8)
    }

    pub fn validate(&self, format: &FrameFormat, run: &Vp8eRun) -> VpuResult<()> {
        enc_validate_format(format)?;

        let hdr_size = run.reg_params.hdr_size();
        if run.header.len() < hdr_size {
            return Err(VpuError::UnsupportedParameter(format!(
                "header of {} bytes, {} expected",
                run.header.len(),
                hdr_size
            )));
        }
        let dct_offset = Self::dct_offset(run.dst_size);
        if dct_offset as usize <= hdr_size || dct_offset >= run.dst_size {
            return Err(VpuError::UnsupportedParameter(format!(
                "destination of {} bytes too small",
                run.dst_size
            )));
        }
        Ok(())
    }

    pub fn prepare(&mut self, _format: &FrameFormat, _run: &Vp8eRun) -> VpuResult<()> {
        self.ctrl_buf.clear();
        Ok(())
    }

    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        run: &Vp8eRun,
    ) -> Programmed {
        run.reg_params.write(regs);

        let dct_offset = Self::dct_offset(run.dst_size);
        regs.write(vepu::ADDR_OUTPUT_STREAM, run.dst);
        regs.write(vepu::addr_vp8_dct_part(0), run.dst + dct_offset);
        regs.write(vepu::STR_BUF_LIMIT, run.dst_size - dct_offset);

        regs.write(vepu::ADDR_OUTPUT_CTRL, self.ctrl_buf.dma());
        regs.write(vepu::ADDR_MV_OUT, self.mv_buf.dma());
        regs.write(vepu::ADDR_VP8_PROB_CNT, run.prob_count);
        regs.write(vepu::ADDR_CABAC_TBL, run.prob_src);
        regs.write(vepu::ADDR_VP8_SEG_MAP, run.seg_map);

        enc_program_ref_rec(regs, format, self.ext_buf.dma(), &mut self.ref_rec_swapped);

        let planes = [
            vepu::ADDR_IN_PLANE_0,
            vepu::ADDR_IN_PLANE_1,
            vepu::ADDR_IN_PLANE_2,
        ];
        for (reg, &addr) in planes
            .iter()
            .zip(run.src.iter())
            .take(format.pixel_format.num_planes())
        {
            regs.write(*reg, addr);
        }
        regs.write(vepu::IN_IMG_CTRL, enc_in_img_ctrl(format));

        let hdr_size = run.reg_params.hdr_size();
        self.pending = Some(PendingRun {
            key_frame: run.key_frame,
            hdr_size,
            dct_offset: dct_offset as usize,
            header: run.header.clone(),
        });
        log::debug!(
            "vp8e run: dst {:#010x} size {} dct_offset {} hdr_size {}",
            run.dst,
            run.dst_size,
            dct_offset,
            hdr_size
        );

        Programmed {
            start: enc_start(regs, format, vepu::ENC_CTRL_ENC_MODE_VP8, run.key_frame),
            dpb_fallbacks: 0,
        }
    }

    pub fn done(&mut self, _regs: &RegisterBlock, result: RunResult) -> Feedback {
        let Some(pending) = self.pending.take() else {
            return Feedback::None;
        };
        if result != RunResult::Success {
            return Feedback::None;
        }

        let ctrl = self.ctrl_buf.cpu();
        Feedback::Vp8Encode(Vp8eFeedback {
            key_frame: pending.key_frame,
            hdr_size: pending.hdr_size,
            ext_hdr_size: LittleEndian::read_u32(&ctrl[0..4]) as usize,
            dct_size: LittleEndian::read_u32(&ctrl[4..8]) as usize,
            dct_offset: pending.dct_offset,
            header: pending.header,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::aux_buf::HeapAllocator;
    use crate::regs::MemoryRegion;
    use crate::PixelFormat;

    fn feedback(key_frame: bool) -> Vp8eFeedback {
        Vp8eFeedback {
            key_frame,
            hdr_size: 10,
            ext_hdr_size: 20,
            dct_size: 100,
            dct_offset: 50,
            header: Bytes::from_static(&[0xff, 0xff, 0xff, 0xff, 5, 6, 7, 8, 9, 10]),
        }
    }

    #[test]
    fn test_assemble_key_frame() {
        let mut dst = vec![0u8; 160];
        for (i, b) in dst[50..150].iter_mut().enumerate() {
            *b = i as u8;
        }

        let size = feedback(true).assemble(&mut dst).unwrap();
        assert_eq!(size, 130);

        // The DCT partition now follows the headers.
        for i in 0..100 {
            assert_eq!(dst[30 + i], i as u8);
        }
        assert_eq!(&dst[4..10], &[5u8, 6, 7, 8, 9, 10]);

        let tag = LittleEndian::read_u32(&dst[..4]);
        assert_eq!(tag & FRAME_TAG_KEY_FRAME_BIT, 0);
        assert_eq!((tag & FRAME_TAG_LENGTH_MASK) >> FRAME_TAG_LENGTH_SHIFT, 10 + 20 - 10);
        // Bits outside the patched fields keep the header's value.
        assert_eq!(tag & 0x1e, 0x1e);
        assert_eq!(tag >> 24, 0xff);
    }

    #[test]
    fn test_assemble_inter_frame() {
        let mut dst = vec![0u8; 160];
        feedback(false).assemble(&mut dst).unwrap();

        let tag = LittleEndian::read_u32(&dst[..4]);
        assert_eq!(tag & FRAME_TAG_KEY_FRAME_BIT, 1);
        assert_eq!((tag & FRAME_TAG_LENGTH_MASK) >> FRAME_TAG_LENGTH_SHIFT, 27);
    }

    #[test]
    fn test_assemble_size_checks() {
        let mut dst = vec![0u8; 120];
        assert_eq!(
            feedback(true).assemble(&mut dst),
            Err(AssembleError::Overflow {
                needed: 130,
                capacity: 120
            })
        );

        let mut dst = vec![0u8; 140];
        assert!(matches!(
            feedback(true).assemble(&mut dst),
            Err(AssembleError::OutputOutOfBounds { .. })
        ));

        let mut fb = feedback(true);
        fb.hdr_size = 8;
        let mut dst = vec![0u8; 160];
        assert!(matches!(
            fb.assemble(&mut dst),
            Err(AssembleError::HeaderTooShort { .. })
        ));
    }

    #[test]
    fn test_dummy_params() {
        let p = dummy_encode_params();
        assert_eq!(p.dmv_4p_1p_penalty[0], 0x00020406);
        assert_eq!(p.dmv_4p_1p_penalty[1], 0x080a0c0e);
        assert_eq!(p.dmv_4p_1p_penalty[14], 0x70727476);
        assert!(p.dmv_4p_1p_penalty[15..].iter().all(|&v| v == 0));
        assert_eq!(p.seg_qp[7], 0x341c1a15);
        assert_eq!(p.seg_qp[23], 0x341c1a15);
        assert_eq!(p.qp_val[7], 0x401c1a15);
        // 0x14000000 >> 23 = 40 bits of start offset, 5 bytes.
        assert_eq!(p.hdr_size(), 5);
    }

    fn setup() -> (Arc<MemoryRegion>, RegisterBlock, AuxBufferPool, FrameFormat) {
        let region = Arc::new(MemoryRegion::new(vepu::WINDOW_SIZE));
        let regs = RegisterBlock::new("vepu", region.clone());
        let pool = AuxBufferPool::new(Arc::new(HeapAllocator::new()));
        let format = FrameFormat::new(176, 144, PixelFormat::NV12);
        (region, regs, pool, format)
    }

    fn run() -> Vp8eRun {
        let mut reg_params = dummy_encode_params();
        reg_params.hdr_len = 10;
        reg_params.rlc_ctrl = 0;
        Vp8eRun {
            src: [0x2000_0000, 0x2001_0000, 0],
            dst: 0x3000_0000,
            dst_size: 1000,
            key_frame: true,
            reg_params: Box::new(reg_params),
            header: Bytes::from(vec![0u8; 10]),
            prob_src: 0x4000_0000,
            seg_map: 0x4000_0500,
            prob_count: 0x5000_0000,
        }
    }

    #[test]
    fn test_program() {
        let (region, regs, pool, format) = setup();
        let mut ctx = Vp8eContext::init(&pool, &format).unwrap();
        let run = run();

        ctx.validate(&format, &run).unwrap();
        ctx.prepare(&format, &run).unwrap();
        let programmed = ctx.program(&regs, &format, &run);

        assert_eq!(regs.read(vepu::ADDR_OUTPUT_STREAM), 0x3000_0000);
        assert_eq!(regs.read(vepu::addr_vp8_dct_part(0)), 0x3000_0000 + 104);
        assert_eq!(regs.read(vepu::STR_BUF_LIMIT), 1000 - 104);
        assert_eq!(regs.read(vepu::ADDR_CABAC_TBL), 0x4000_0000);
        assert_eq!(regs.read(vepu::vp8_seg_qp(23)), 0x341c1a15);
        assert_eq!(regs.read(vepu::ENC_CTRL), 0x8);
        assert_eq!(regs.read(vepu::ADDR_IN_PLANE_1), 0x2001_0000);

        let start = programmed.start;
        assert_eq!(start.offset, vepu::ENC_CTRL);
        assert_ne!(start.value & vepu::ENC_CTRL_EN_BIT, 0);
        assert_ne!(start.value & vepu::ENC_PIC_INTRA, 0);
        assert_eq!((start.value >> 19) & 0x1ff, 11);
        assert_eq!((start.value >> 10) & 0x1ff, 9);
        assert!(region.write_log().iter().all(|w| !w.barriered));

        // The reference and reconstruction frames swap every run.
        let rec = regs.read(vepu::ADDR_REC_LUMA);
        ctx.program(&regs, &format, &run);
        assert_eq!(regs.read(vepu::ADDR_REF_LUMA), rec);

        ctx.exit(&pool);
    }

    #[test]
    fn test_done_reads_sizes() {
        let (_, regs, pool, format) = setup();
        let mut ctx = Vp8eContext::init(&pool, &format).unwrap();
        let run = run();

        ctx.prepare(&format, &run).unwrap();
        assert!(ctx.ctrl_buf.cpu().iter().all(|&b| b == 0));
        ctx.program(&regs, &format, &run);

        LittleEndian::write_u32(&mut ctx.ctrl_buf.cpu_mut()[0..4], 20);
        LittleEndian::write_u32(&mut ctx.ctrl_buf.cpu_mut()[4..8], 300);

        let Feedback::Vp8Encode(fb) = ctx.done(&regs, RunResult::Success) else {
            panic!("no feedback");
        };
        assert_eq!(fb.ext_hdr_size, 20);
        assert_eq!(fb.dct_size, 300);
        assert_eq!(fb.dct_offset, 104);
        assert_eq!(fb.hdr_size, 10);

        ctx.program(&regs, &format, &run);
        assert_eq!(ctx.done(&regs, RunResult::Error), Feedback::None);

        ctx.exit(&pool);
    }

    #[test]
    fn test_validate() {
        let (_, _, pool, format) = setup();
        let ctx = Vp8eContext::init(&pool, &format).unwrap();

        let mut r = run();
        r.header = Bytes::from_static(&[0; 4]);
        assert!(ctx.validate(&format, &r).is_err());

        let mut r = run();
        r.dst_size = 50;
        assert!(ctx.validate(&format, &r).is_err());

        let big = FrameFormat::new(8192, 64, PixelFormat::NV12);
        assert!(ctx.validate(&big, &run()).is_err());

        ctx.exit(&pool);
    }
}
