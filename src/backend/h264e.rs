// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! H.264 encoding on the H1 block.
//!
//! The hardware produces slice data only. It is written behind room reserved for the SPS and
//! PPS, which [`H264eFeedback::assemble`] copies in front of it after the run.

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
use crate::codec::h264::cabac;
use crate::codec::h264::cabac::CabacInitIdc;
use crate::codec::h264::params::EncodeParams;
use crate::codec::h264::params::FrameCodingType;
use crate::codec::h264::params::NUM_CHECKPOINTS;
use crate::codec::h264::rate_tables::QpWeights;
use crate::regs::vepu;
use crate::regs::RegisterBlock;
use crate::utils::align_up;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// Frames above this many macroblocks are encoded without quarter pixel motion vectors.
const QPEL_MAX_MBS: u32 = 3600;
/// The encoder emits the byte stream start code itself: 32 bits preloaded from
/// `STR_HDR_REM_MSB`.
const START_CODE: u32 = 0x0000_0001;
const START_CODE_BITS: u32 = 32;
const ZERO_MV_FAVOR_DIV2: u32 = 10;

/// RGB to YUV conversion coefficients A, B, C, E and F.
const RGB_COEFF: [u32; 5] = [19589, 38443, 7504, 37008, 46740];

/// Input of one H.264 encode.
#[derive(Clone, Debug)]
pub struct H264eRun {
    /// Device addresses of the source planes. Unused planes are ignored.
    pub src: [u32; 3],
    pub dst: u32,
    pub dst_size: u32,
    pub params: EncodeParams,
    /// SPS and PPS NAL units, start codes included, placed in front of the slices.
    pub sps: Bytes,
    pub pps: Bytes,
}

impl H264eRun {
    /// Offset of the slice data in the destination buffer. The encoder needs an 8-byte aligned
    /// output address.
    fn slices_offset(&self) -> u32 {
        align_up((self.sps.len() + self.pps.len()) as u32, 8)
    }
}

/// Results of a finished encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct H264eFeedback {
    pub qp_sum: u32,
    pub mad_count: u32,
    pub rlc_count: u32,
    /// Bytes written at each rate control checkpoint.
    pub cp: [u32; NUM_CHECKPOINTS],
    pub slices_size: usize,
    pub slices_offset: usize,
    pub sps: Bytes,
    pub pps: Bytes,
}

impl H264eFeedback {
    /// Moves the slices behind the SPS and PPS and returns the size of the access unit.
    pub fn assemble(&self, dst: &mut [u8]) -> Result<usize, AssembleError> {
        let headers = self.sps.len() + self.pps.len();
        let total = headers + self.slices_size;
        if total > dst.len() {
            return Err(AssembleError::Overflow {
                needed: total,
                capacity: dst.len(),
            });
        }
        if self.slices_offset + self.slices_size > dst.len() {
            return Err(AssembleError::OutputOutOfBounds {
                offset: self.slices_offset,
                len: self.slices_size,
                capacity: dst.len(),
            });
        }

        log::debug!(
            "h264e assemble: sps_size = {}, pps_size = {}, slices_size = {}",
            self.sps.len(),
            self.pps.len(),
            self.slices_size
        );

        dst.copy_within(
            self.slices_offset..self.slices_offset + self.slices_size,
            headers,
        );
        dst[..self.sps.len()].copy_from_slice(&self.sps);
        dst[self.sps.len()..headers].copy_from_slice(&self.pps);

        Ok(total)
    }
}

struct PendingRun {
    slices_offset: usize,
    sps: Bytes,
    pps: Bytes,
}

pub struct H264eContext {
    cabac_tbl: AuxBuffer,
    ext_buf: AuxBuffer,
    /// Init idc the CABAC table currently holds.
    cabac_idc: Option<CabacInitIdc>,
    ref_rec_swapped: bool,
    pending: Option<PendingRun>,
}

impl H264eContext {
    pub fn init(pool: &AuxBufferPool, format: &FrameFormat) -> VpuResult<Self> {
        let [cabac_tbl, ext_buf] = pool.allocate_set([
            ("h264e cabac_tbl", cabac::ENC_TABLE_SIZE),
            ("h264e ext_buf", enc_ext_buf_size(format)),
        ])?;

        Ok(Self {
            cabac_tbl,
            ext_buf,
            cabac_idc: None,
            ref_rec_swapped: false,
            pending: None,
        })
    }

    pub fn exit(self, pool: &AuxBufferPool) {
        pool.free_set([self.cabac_tbl, self.ext_buf]);
    }

    pub fn validate(&self, format: &FrameFormat, run: &H264eRun) -> VpuResult<()> {
        enc_validate_format(format)?;
        run.params.validate()?;
        if run.slices_offset() >= run.dst_size {
            return Err(VpuError::UnsupportedParameter(format!(
                "destination of {} bytes cannot hold {} bytes of parameter sets",
                run.dst_size,
                run.sps.len() + run.pps.len()
            )));
        }
        Ok(())
    }

    pub fn prepare(&mut self, _format: &FrameFormat, run: &H264eRun) -> VpuResult<()> {
        let idc = run.params.cabac_init_idc()?;
        if self.cabac_idc != Some(idc) {
            cabac::build_encoder_table(self.cabac_tbl.cpu_mut(), idc)?;
            self.cabac_idc = Some(idc);
        }
        Ok(())
    }

    fn program_params(
        &self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        run: &H264eRun,
    ) -> VpuResult<()> {
        let p = &run.params;
        let mbs_in_row = format.coded.mb_width();
        let mbs_in_col = format.coded.mb_height();
        let w = QpWeights::new(p.qp, mbs_in_row, mbs_in_col)
            .ok_or_else(|| VpuError::UnsupportedParameter(format!("qp = {}", p.qp)))?;
        let disable_qpel = (mbs_in_row * mbs_in_col > QPEL_MAX_MBS) as u32;

        regs.write(
            vepu::ENC_CTRL0,
            (p.pic_init_qp as u32) << 26
                | ((p.slice_alpha_offset as u32) & 0xf) << 22
                | ((p.slice_beta_offset as u32) & 0xf) << 18
                | ((p.chroma_qp_index_offset as u32) & 0x1f) << 13
                | (p.filter_disable as u32) << 5
                | ((p.idr_pic_id as u32) & 0xf) << 1,
        );
        regs.write(
            vepu::ENC_CTRL1,
            (p.pps_id as u32) << 24 | (w.prev_mode_favor & 0xff) << 16 | p.frame_num as u32,
        );
        regs.write(
            vepu::ENC_CTRL2,
            (p.slice_size_mb_rows as u32) << 23
                | disable_qpel << 22
                | (p.transform8x8_mode as u32) << 21
                | (p.cabac_init_idc as u32) << 19
                | (p.enable_cabac as u32) << 18
                | (p.inter4x4_disabled as u32) << 17
                | w.intra16_favor & 0xffff,
        );
        // Split MV mode, then the 1p, 4p and 1p penalties.
        regs.write(
            vepu::ENC_CTRL3,
            1 << 30
                | w.diff_mv_penalty_1p
                | w.diff_mv_penalty_4p << 10
                | w.diff_mv_penalty_1p << 20,
        );
        regs.write(vepu::MVC_CTRL, ZERO_MV_FAVOR_DIV2 << 28);
        regs.write(vepu::ENC_CTRL5, 0);
        regs.write(vepu::ENC_CTRL4, w.skip_penalty << 24 | w.inter_favor);

        regs.write(vepu::STR_HDR_REM_MSB, START_CODE);
        regs.write(vepu::STR_HDR_REM_LSB, 0);
        regs.write(vepu::STR_BUF_LIMIT, run.dst_size - run.slices_offset());

        regs.write(
            vepu::MAD_CTRL,
            ((p.mad_qp_delta as u32) & 0xf) << 28 | (p.mad_threshold as u32 & 0x3f) << 22,
        );
        regs.write(
            vepu::QP_VAL,
            (p.qp as u32) << 26
                | (p.qp_max as u32) << 20
                | (p.qp_min as u32) << 14
                | p.cp_distance_mbs as u32,
        );

        for (i, pair) in p.cp_target.chunks(2).enumerate() {
            regs.write(
                vepu::checkpoint(i),
                (pair[0] as u32) << 16 | pair[1] as u32,
            );
        }
        for (i, pair) in p.target_error.chunks(2).enumerate() {
            regs.write(
                vepu::chkpt_word_err(i),
                ((pair[0] as u32) & 0xffff) << 16 | (pair[1] as u32) & 0xffff,
            );
        }
        let delta_qp = p
            .delta_qp
            .iter()
            .fold(0u32, |acc, &d| acc << 4 | (d as u32) & 0xf);
        regs.write(vepu::CHKPT_DELTA_QP, delta_qp);

        regs.write(vepu::RLC_CTRL, START_CODE_BITS << 23);
        regs.write(vepu::ADDR_NEXT_PIC, 0);
        regs.write(vepu::STAB_CTRL, 0);
        regs.write(vepu::ADDR_CABAC_TBL, self.cabac_tbl.dma());
        regs.write(vepu::ADDR_MV_OUT, 0);

        let [a, b, c, e, f] = RGB_COEFF;
        regs.write(vepu::rgb_yuv_coeff(0), b << 16 | a);
        regs.write(vepu::rgb_yuv_coeff(1), e << 16 | c);
        regs.write(vepu::RGB_MASK_MSB, f);
        Ok(())
    }

    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        run: &H264eRun,
    ) -> VpuResult<Programmed> {
        let intra = run.params.frame_coding_type == FrameCodingType::Intra;

        regs.write(
            vepu::ENC_CTRL,
            vepu::ENC_CTRL_TIMEOUT_EN
                | vepu::enc_ctrl_width(format.coded.mb_width())
                | vepu::enc_ctrl_height(format.coded.mb_height())
                | (run.params.frame_coding_type as u32) << 3
                | vepu::ENC_CTRL_ENC_MODE_H264,
        );
        self.program_params(regs, format, run)?;

        let slices_offset = run.slices_offset();
        regs.write(vepu::ADDR_OUTPUT_STREAM, run.dst + slices_offset);
        regs.write(vepu::ADDR_OUTPUT_CTRL, 0);
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

        self.pending = Some(PendingRun {
            slices_offset: slices_offset as usize,
            sps: run.sps.clone(),
            pps: run.pps.clone(),
        });
        log::debug!(
            "h264e run: qp {} {:?} dst {:#010x} slices at {}",
            run.params.qp,
            run.params.frame_coding_type,
            run.dst,
            slices_offset
        );

        Ok(Programmed {
            start: enc_start(regs, format, vepu::ENC_CTRL_ENC_MODE_H264, intra),
            dpb_fallbacks: 0,
        })
    }

    pub fn done(&mut self, regs: &RegisterBlock, result: RunResult) -> Feedback {
        let Some(pending) = self.pending.take() else {
            return Feedback::None;
        };
        if result != RunResult::Success {
            return Feedback::None;
        }

        let mut cp = [0u32; NUM_CHECKPOINTS];
        let mut prev = 0;
        let mut overflow = 0;
        for (i, out) in cp.iter_mut().enumerate() {
            // Two 16-bit counters per register, in units of 32 bytes, wrapping at 2^21 bytes.
            let shift = if i % 2 == 0 { 16 } else { 0 };
            let count = ((regs.read(vepu::checkpoint(i / 2)) >> shift) & 0xffff) * 32;
            if count < prev {
                overflow += 1 << 21;
            }
            prev = count;
            *out = count + overflow;
        }

        Feedback::H264Encode(H264eFeedback {
            qp_sum: (regs.read(vepu::MAD_CTRL) & 0x001f_ffff) * 2,
            mad_count: regs.read(vepu::MB_CTRL) >> 16,
            rlc_count: (regs.read(vepu::RLC_CTRL) & 0x0007_ffff) * 4,
            cp,
            slices_size: (regs.read(vepu::STR_BUF_LIMIT) / 8) as usize,
            slices_offset: pending.slices_offset,
            sps: pending.sps,
            pps: pending.pps,
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

    fn setup() -> (Arc<MemoryRegion>, RegisterBlock, AuxBufferPool, FrameFormat) {
        let region = Arc::new(MemoryRegion::new(vepu::WINDOW_SIZE));
        let regs = RegisterBlock::new("vepu", region.clone());
        let pool = AuxBufferPool::new(Arc::new(HeapAllocator::new()));
        let format = FrameFormat::new(320, 240, PixelFormat::I420);
        (region, regs, pool, format)
    }

    fn run() -> H264eRun {
        H264eRun {
            src: [0x2000_0000, 0x2001_0000, 0x2002_0000],
            dst: 0x3000_0000,
            dst_size: 0x10000,
            params: EncodeParams {
                qp: 30,
                qp_min: 10,
                qp_max: 51,
                delta_qp: [-1, 2, 0, 0, 0, 0, 3],
                cp_target: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                ..Default::default()
            },
            sps: Bytes::from_static(&[0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1e, 0x95, 0xa0]),
            pps: Bytes::from_static(&[0, 0, 0, 1, 0x68, 0xce, 0x38, 0x80]),
        }
    }

    #[test]
    fn test_program() {
        let (region, regs, pool, format) = setup();
        let mut ctx = H264eContext::init(&pool, &format).unwrap();
        let run = run();

        ctx.validate(&format, &run).unwrap();
        ctx.prepare(&format, &run).unwrap();
        let programmed = ctx.program(&regs, &format, &run).unwrap();

        // 18 bytes of parameter sets, slices at 24.
        assert_eq!(regs.read(vepu::ADDR_OUTPUT_STREAM), 0x3000_0000 + 24);
        assert_eq!(regs.read(vepu::STR_BUF_LIMIT), 0x10000 - 24);
        assert_eq!(regs.read(vepu::QP_VAL), 30 << 26 | 51 << 20 | 10 << 14);
        assert_eq!(regs.read(vepu::checkpoint(0)), 1 << 16 | 2);
        assert_eq!(regs.read(vepu::checkpoint(4)), 9 << 16 | 10);
        assert_eq!(regs.read(vepu::CHKPT_DELTA_QP), 0x0f20_0003);
        assert_eq!(regs.read(vepu::ADDR_CABAC_TBL), ctx.cabac_tbl.dma());
        assert_eq!(regs.read(vepu::ADDR_IN_PLANE_2), 0x2002_0000);
        assert_eq!(
            regs.read(vepu::IN_IMG_CTRL),
            vepu::in_img_row_length(320) | vepu::in_img_fmt(0)
        );
        assert_eq!(regs.read(vepu::RGB_MASK_MSB), 46740);

        let start = programmed.start;
        assert_eq!(start.offset, vepu::ENC_CTRL);
        assert_eq!(
            start.value,
            vepu::ENC_CTRL_NAL_MODE_BIT
                | vepu::enc_ctrl_width(20)
                | vepu::enc_ctrl_height(15)
                | vepu::ENC_CTRL_ENC_MODE_H264
                | vepu::ENC_CTRL_EN_BIT
                | vepu::ENC_PIC_INTRA
        );
        assert!(region.write_log().iter().all(|w| !w.barriered));

        ctx.exit(&pool);
    }

    #[test]
    fn test_cabac_table_rebuilt_on_idc_change() {
        let (_, _, pool, format) = setup();
        let mut ctx = H264eContext::init(&pool, &format).unwrap();
        let mut run = run();

        ctx.prepare(&format, &run).unwrap();
        let idc0 = ctx.cabac_tbl.cpu().to_vec();
        let mut expected = vec![0u8; cabac::ENC_TABLE_SIZE];
        cabac::build_encoder_table(&mut expected, CabacInitIdc::Idc0).unwrap();
        assert_eq!(idc0, expected);

        run.params.cabac_init_idc = 2;
        ctx.prepare(&format, &run).unwrap();
        cabac::build_encoder_table(&mut expected, CabacInitIdc::Idc2).unwrap();
        assert_eq!(ctx.cabac_tbl.cpu(), &expected[..]);

        ctx.exit(&pool);
    }

    #[test]
    fn test_feedback() {
        let (region, regs, pool, format) = setup();
        let mut ctx = H264eContext::init(&pool, &format).unwrap();
        let run = run();
        ctx.program(&regs, &format, &run).unwrap();

        region.poke(vepu::MAD_CTRL, 0xffe0_0010);
        region.poke(vepu::MB_CTRL, 0x0123_0000);
        region.poke(vepu::RLC_CTRL, 0x0000_0100);
        region.poke(vepu::STR_BUF_LIMIT, 800 * 8);
        // Counters 10, 20, 30, 40, then wrapping to 5, 6, 7, 8, 9, 10.
        let counters = [10u32, 20, 30, 40, 5, 6, 7, 8, 9, 10];
        for i in 0..5 {
            region.poke(
                vepu::checkpoint(i),
                counters[2 * i] << 16 | counters[2 * i + 1],
            );
        }

        let Feedback::H264Encode(fb) = ctx.done(&regs, RunResult::Success) else {
            panic!("no feedback");
        };
        assert_eq!(fb.qp_sum, 0x20);
        assert_eq!(fb.mad_count, 0x0123);
        assert_eq!(fb.rlc_count, 0x400);
        assert_eq!(fb.slices_size, 800);
        assert_eq!(fb.slices_offset, 24);
        assert_eq!(fb.cp[3], 40 * 32);
        assert_eq!(fb.cp[4], 5 * 32 + (1 << 21));
        assert_eq!(fb.cp[9], 10 * 32 + (1 << 21));

        ctx.exit(&pool);
    }

    #[test]
    fn test_assemble() {
        let run = run();
        let fb = H264eFeedback {
            qp_sum: 0,
            mad_count: 0,
            rlc_count: 0,
            cp: [0; NUM_CHECKPOINTS],
            slices_size: 6,
            slices_offset: 24,
            sps: run.sps.clone(),
            pps: run.pps.clone(),
        };

        let mut dst = vec![0u8; 32];
        dst[24..30].copy_from_slice(&[0, 0, 0, 1, 0x65, 0x88]);
        assert_eq!(fb.assemble(&mut dst), Ok(24));
        assert_eq!(&dst[..10], &run.sps[..]);
        assert_eq!(&dst[10..18], &run.pps[..]);
        assert_eq!(&dst[18..24], &[0u8, 0, 0, 1, 0x65, 0x88]);

        let mut small = vec![0u8; 20];
        assert_eq!(
            fb.assemble(&mut small),
            Err(AssembleError::Overflow {
                needed: 24,
                capacity: 20
            })
        );
        let mut short = vec![0u8; 28];
        assert!(matches!(
            fb.assemble(&mut short),
            Err(AssembleError::OutputOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let (_, _, pool, format) = setup();
        let ctx = H264eContext::init(&pool, &format).unwrap();

        let mut r = run();
        r.params.qp = 60;
        assert!(matches!(
            ctx.validate(&format, &r),
            Err(VpuError::UnsupportedParameter(_))
        ));

        let mut r = run();
        r.dst_size = 16;
        assert!(ctx.validate(&format, &r).is_err());

        ctx.exit(&pool);
    }
}
