// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! VP9 decoding on the RKVDEC block.
//!
//! Besides the per-frame tables, VP9 needs state from the previous decoded frame: its loop filter
//! deltas, segmentation features, size and motion vectors. That state lives in
//! [`LastFrameContext`], which only a successful run updates. The private table holds two
//! segmentation maps; each run reads the previous map from one and writes the current map to the
//! other, swapping the two whenever the map is rewritten.

use bytes::Bytes;

use crate::aux_buf::AuxBuffer;
use crate::aux_buf::AuxBufferPool;
use crate::backend::Feedback;
use crate::backend::Programmed;
use crate::backend::RunResult;
use crate::backend::StartWrite;
use crate::codec::vp9::params::DecodeParams;
use crate::codec::vp9::params::RefFrame;
use crate::codec::vp9::params::Segmentation;
use crate::codec::vp9::params::MAX_SEGMENTS;
use crate::codec::vp9::params::NUM_REF_FRAMES;
use crate::codec::vp9::params::SEG_LVL_ALT_L;
use crate::codec::vp9::params::SEG_LVL_ALT_Q;
use crate::codec::vp9::params::SEG_LVL_REF_FRAME;
use crate::codec::vp9::params::SEG_LVL_SKIP;
use crate::codec::vp9::probs::pack_prob_table;
use crate::codec::vp9::probs::COUNT_TABLE_SIZE;
use crate::codec::vp9::probs::MAX_SEGMAP_SIZE;
use crate::codec::vp9::probs::PROB_TABLE_SIZE;
use crate::regs::rkvdec;
use crate::regs::RegisterBlock;
use crate::utils::align_up;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

pub const PROBS_OFFSET: usize = 0;
pub const SEGMAP_OFFSET: usize = PROB_TABLE_SIZE;
pub const PRIV_TBL_SIZE: usize = SEGMAP_OFFSET + 2 * MAX_SEGMAP_SIZE;

/// Largest frame the segmentation maps are sized for.
const MAX_WIDTH: u32 = 4096;
const MAX_HEIGHT: u32 = 2304;

/// Reference scale factors are Q14 fixed point.
const REF_SCALE_SHIFT: u32 = 14;

/// Buffers and parameters of one VP9 decode.
#[derive(Clone, Debug)]
pub struct Vp9dRun {
    pub src: u32,
    pub src_len: u32,
    pub dst: u32,
    pub params: Box<DecodeParams>,
}

/// Plane strides of a frame of the given size, in bytes. Rows are padded to whole 128-bit
/// words, so the registers take `round_up(width * bit_depth, 128) / 128`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStrides {
    pub pitch: u32,
    pub y: u32,
    pub yuv: u32,
}

impl FrameStrides {
    pub fn new(width: u32, height: u32, bit_depth: u32) -> Self {
        let pitch = align_up(width * bit_depth, 128) / 8;
        let y = align_up(height, 64) * pitch;
        Self {
            pitch,
            y,
            yuv: y + y / 2,
        }
    }
}

/// Segmentation features as the hardware consumes them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegFeatures {
    pub enabled: bool,
    pub abs_delta: bool,
    pub feature_enabled: [[bool; 4]; MAX_SEGMENTS],
    pub feature_data: [[i16; 4]; MAX_SEGMENTS],
}

impl From<&Segmentation> for SegFeatures {
    fn from(seg: &Segmentation) -> Self {
        Self {
            enabled: seg.enabled,
            abs_delta: seg.abs_or_delta_update,
            feature_enabled: seg.feature_enabled,
            feature_data: seg.feature_data,
        }
    }
}

/// State carried from the last successfully decoded frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastFrameContext {
    /// A frame has been decoded since the context was opened.
    pub valid: bool,
    pub ref_deltas: [i8; 4],
    pub mode_deltas: [i8; 2],
    pub seg: SegFeatures,
    pub show_frame: bool,
    pub intra_only: bool,
    pub width: u16,
    pub height: u16,
    /// Where the frame's motion vectors were written.
    pub mv_base: u32,
    /// Which of the two segmentation maps holds the frame's map.
    pub segmap_id: usize,
}

/// Symbol counts of a successful decode, for probability adaptation upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vp9dFeedback {
    /// `None` when the frame does not adapt its probabilities.
    pub counts: Option<Bytes>,
}

/// What `done` commits to the last frame context.
struct PendingRun {
    next_last: LastFrameContext,
    backward_adaptation: bool,
}

pub struct Vp9dContext {
    priv_tbl: AuxBuffer,
    count_tbl: AuxBuffer,
    last: LastFrameContext,
    pending: Option<PendingRun>,
}

impl Vp9dContext {
    pub fn init(pool: &AuxBufferPool, _format: &FrameFormat) -> VpuResult<Self> {
        let [mut priv_tbl, count_tbl] = pool.allocate_set([
            ("vp9d priv_tbl", PRIV_TBL_SIZE),
            ("vp9d count_tbl", COUNT_TABLE_SIZE),
        ])?;
        priv_tbl.clear_range(SEGMAP_OFFSET, 2 * MAX_SEGMAP_SIZE);

        Ok(Self {
            priv_tbl,
            count_tbl,
            last: Default::default(),
            pending: None,
        })
    }

    pub fn exit(self, pool: &AuxBufferPool) {
        pool.free_set([self.priv_tbl, self.count_tbl]);
    }

    pub fn last_frame(&self) -> &LastFrameContext {
        &self.last
    }

    pub fn validate(&self, format: &FrameFormat, run: &Vp9dRun) -> VpuResult<()> {
        let params = &run.params;
        params.validate(run.src_len)?;

        let (width, height) = (params.width as u32, params.height as u32);
        if width > format.coded.width || height > format.coded.height {
            return Err(VpuError::UnsupportedParameter(format!(
                "frame of {}x{} in a {}x{} session",
                width, height, format.coded.width, format.coded.height
            )));
        }
        if format.coded.width > MAX_WIDTH || format.coded.height > MAX_HEIGHT {
            return Err(VpuError::UnsupportedParameter(format!(
                "session of {}x{} exceeds the segmentation map",
                format.coded.width, format.coded.height
            )));
        }
        if rkvdec::strm_len(run.src_len) != run.src_len {
            return Err(VpuError::UnsupportedParameter(format!(
                "stream of {} bytes",
                run.src_len
            )));
        }
        Ok(())
    }

    pub fn prepare(&mut self, _format: &FrameFormat, run: &Vp9dRun) -> VpuResult<()> {
        pack_prob_table(
            &run.params,
            &mut self.priv_tbl.cpu_mut()[PROBS_OFFSET..PROBS_OFFSET + PROB_TABLE_SIZE],
        )?;
        // Intra frames only count intra symbols, adaptation needs the rest zeroed.
        if run.params.is_intra_only() {
            self.count_tbl.clear();
        }
        Ok(())
    }

    /// Segmentation features in effect: a frame without new feature data keeps the last one's.
    fn seg_features(&self, params: &DecodeParams) -> SegFeatures {
        let seg = &params.seg;
        if seg.enabled && !seg.update_data && self.last.valid {
            SegFeatures {
                enabled: true,
                ..self.last.seg.clone()
            }
        } else {
            SegFeatures::from(seg)
        }
    }

    fn program_seg(regs: &RegisterBlock, seg: &SegFeatures) {
        for id in 0..MAX_SEGMENTS {
            let enabled = |feature: usize| seg.enabled && seg.feature_enabled[id][feature];
            let data = &seg.feature_data[id];

            let mut val = 0;
            if id == 0 && seg.abs_delta {
                val |= rkvdec::SEGID_ABS_DELTA;
            }
            if enabled(SEG_LVL_ALT_Q) {
                val |= rkvdec::SEGID_FRAME_QP_DELTA_EN
                    | rkvdec::segid_frame_qp_delta(data[SEG_LVL_ALT_Q] as i32);
            }
            if enabled(SEG_LVL_ALT_L) {
                val |= rkvdec::SEGID_FRAME_LOOPFILTER_VALUE_EN
                    | rkvdec::segid_frame_loopfilter_value(data[SEG_LVL_ALT_L] as i32);
            }
            if enabled(SEG_LVL_REF_FRAME) {
                val |= rkvdec::SEGID_REFERINFO_EN
                    | rkvdec::segid_referinfo(data[SEG_LVL_REF_FRAME] as u32);
            }
            if enabled(SEG_LVL_SKIP) {
                val |= rkvdec::SEGID_FRAME_SKIP_EN;
            }
            regs.write(rkvdec::vp9_segid_grp(id), val);
        }
    }

    /// Programs one reference. A missing reference is the frame being decoded, whose strides are
    /// the current ones.
    fn program_ref(regs: &RegisterBlock, i: usize, reference: &RefFrame, is_dst: bool) {
        const BASES: [usize; NUM_REF_FRAMES] = [
            rkvdec::VP9_REFERLAST_BASE,
            rkvdec::VP9_REFERGOLDEN_BASE,
            rkvdec::VP9_REFERALFTER_BASE,
        ];
        const Y_STRIDES: [usize; NUM_REF_FRAMES] = [
            rkvdec::VP9_LAST_YSTRIDE,
            rkvdec::VP9_GOLDEN_YSTRIDE,
            rkvdec::VP9_ALTREF_YSTRIDE,
        ];

        regs.write(
            rkvdec::vp9_frame_size(i),
            rkvdec::vp9_framewidth(reference.width as u32)
                | rkvdec::vp9_frameheight(reference.height as u32),
        );
        regs.write(BASES[i], reference.addr);
        if is_dst {
            return;
        }

        let strides = FrameStrides::new(
            reference.width as u32,
            reference.height as u32,
            reference.bit_depth as u32,
        );
        regs.write(
            rkvdec::vp9_hor_virstride(i),
            rkvdec::vp9_hor_y_virstride(strides.pitch / 16)
                | rkvdec::vp9_hor_uv_virstride(strides.pitch / 16),
        );
        regs.write(Y_STRIDES[i], strides.y / 16);
        // Only the last frame has a YUV stride register.
        if i == 0 {
            regs.write(rkvdec::VP9_LAST_YUVSTRIDE, strides.yuv / 16);
        }
    }

    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        run: &Vp9dRun,
    ) -> Programmed {
        let params = &run.params;
        let intra_only = params.is_intra_only();
        let last = &self.last;
        let bit_depth = params.bit_depth as u32;

        regs.write(rkvdec::SYSCTRL, rkvdec::mode(rkvdec::MODE_VP9));

        let strides = FrameStrides::new(format.coded.width, format.coded.height, bit_depth);
        regs.write(
            rkvdec::PICPAR,
            rkvdec::y_hor_virstride(strides.pitch / 16)
                | rkvdec::uv_hor_virstride(strides.pitch / 16),
        );
        regs.write(rkvdec::Y_VIRSTRIDE, rkvdec::y_virstride(strides.y / 16));
        regs.write(rkvdec::YUV_VIRSTRIDE, rkvdec::yuv_virstride(strides.yuv / 16));
        regs.write(rkvdec::STRM_LEN, rkvdec::strm_len(run.src_len));

        // The current map goes to the other buffer whenever it gets rewritten, the last map stays
        // readable for temporal prediction.
        let mut segmap_id = last.segmap_id;
        if last.valid && (!params.seg.enabled || params.seg.update_map) {
            segmap_id ^= 1;
        }

        let dst_ref = RefFrame {
            addr: run.dst,
            width: params.width,
            height: params.height,
            bit_depth: params.bit_depth,
        };
        for (i, reference) in params.refs.iter().enumerate() {
            match reference {
                Some(r) => Self::program_ref(regs, i, r, false),
                None => Self::program_ref(regs, i, &dst_ref, true),
            }
        }

        let seg = self.seg_features(params);
        Self::program_seg(regs, &seg);

        regs.write(
            rkvdec::VP9_CPRHEADER_CONFIG,
            rkvdec::vp9_tx_mode(params.tx_mode as u32)
                | rkvdec::vp9_frame_ref_mode(params.reference_mode as u32),
        );

        let mut info = 0;
        if !intra_only {
            let (ref_deltas, mode_deltas) = if last.valid {
                (last.ref_deltas, last.mode_deltas)
            } else {
                (params.lf.ref_deltas, params.lf.mode_deltas)
            };
            let mut val = 0;
            for (pos, &delta) in ref_deltas.iter().enumerate() {
                val |= rkvdec::vp9_ref_deltas_lastframe(pos as u32, delta as i32);
            }
            regs.write(rkvdec::VP9_REF_DELTAS_LASTFRAME, val);

            for (pos, &delta) in mode_deltas.iter().enumerate() {
                info |= rkvdec::vp9_mode_deltas_lastframe(pos as u32, delta as i32);
            }
            if last.valid {
                if last.seg.enabled {
                    info |= rkvdec::SEG_EN_LASTFRAME;
                }
                if last.show_frame {
                    info |= rkvdec::LAST_SHOW_FRAME;
                }
                if last.intra_only {
                    info |= rkvdec::LAST_INTRA_ONLY;
                }
            }
        }
        if last.valid && last.width == params.width && last.height == params.height {
            info |= rkvdec::LAST_WIDTHHEIGHT_EQCUR;
        }
        regs.write(rkvdec::VP9_INFO_LASTFRAME, info);

        let headers = params.uncompressed_header_size + params.compressed_header_size;
        regs.write(rkvdec::VP9_LASTTILE_SIZE, run.src_len.saturating_sub(headers));

        if !intra_only {
            for (i, reference) in params.refs.iter().enumerate() {
                let r = reference.unwrap_or(dst_ref);
                let hscale = ((r.width as u32) << REF_SCALE_SHIFT) / params.width as u32;
                let vscale = ((r.height as u32) << REF_SCALE_SHIFT) / params.height as u32;
                regs.write(
                    rkvdec::vp9_ref_scale(i),
                    rkvdec::vp9_ref_hor_scale(hscale) | rkvdec::vp9_ref_ver_scale(vscale),
                );
            }
        }

        let tbl = self.priv_tbl.dma();
        regs.write(rkvdec::DECOUT_BASE, run.dst);
        regs.write(rkvdec::STRM_RLC_BASE, run.src);
        regs.write(rkvdec::CABACTBL_PROB_BASE, tbl + PROBS_OFFSET as u32);
        regs.write(rkvdec::VP9COUNT_BASE, self.count_tbl.dma());
        regs.write(
            rkvdec::VP9_SEGIDCUR_BASE,
            tbl + (SEGMAP_OFFSET + segmap_id * MAX_SEGMAP_SIZE) as u32,
        );
        regs.write(
            rkvdec::VP9_SEGIDLAST_BASE,
            tbl + (SEGMAP_OFFSET + (segmap_id ^ 1) * MAX_SEGMAP_SIZE) as u32,
        );

        // Motion vectors are stored right after the picture.
        let mv_base = run.dst
            + FrameStrides::new(params.width as u32, params.height as u32, bit_depth).yuv;
        let colmv = if !intra_only && !params.error_resilient && last.valid {
            last.mv_base
        } else {
            mv_base
        };
        regs.write(rkvdec::VP9_REF_COLMV_BASE, colmv);

        regs.write(
            rkvdec::PERFORMANCE_CYCLE,
            format.coded.width | (format.coded.height << 16),
        );

        self.pending = Some(PendingRun {
            next_last: LastFrameContext {
                valid: true,
                ref_deltas: params.lf.ref_deltas,
                mode_deltas: params.lf.mode_deltas,
                seg,
                show_frame: params.show_frame,
                intra_only,
                width: params.width,
                height: params.height,
                mv_base,
                segmap_id,
            },
            backward_adaptation: params.backward_adaptation(),
        });

        log::debug!(
            "vp9d run: {}x{} intra_only {} segmap {} src {:#010x} len {}",
            params.width,
            params.height,
            intra_only,
            segmap_id,
            run.src,
            run.src_len
        );

        Programmed {
            start: StartWrite {
                offset: rkvdec::INTERRUPT,
                value: rkvdec::START,
            },
            dpb_fallbacks: 0,
        }
    }

    /// Commits the frame to the last frame context if it decoded.
    pub fn done(&mut self, result: RunResult) -> Feedback {
        let Some(pending) = self.pending.take() else {
            return Feedback::None;
        };
        if result != RunResult::Success {
            log::debug!("vp9d run failed, keeping the last frame context");
            return Feedback::None;
        }

        self.last = pending.next_last;
        let counts = pending
            .backward_adaptation
            .then(|| Bytes::copy_from_slice(self.count_tbl.cpu()));
        Feedback::Vp9Decode(Vp9dFeedback { counts })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::aux_buf::HeapAllocator;
    use crate::regs::MemoryRegion;
    use crate::PixelFormat;

    fn setup() -> (RegisterBlock, AuxBufferPool, FrameFormat) {
        let region = Arc::new(MemoryRegion::new(rkvdec::WINDOW_SIZE));
        let regs = RegisterBlock::new("rkvdec", region);
        let pool = AuxBufferPool::new(Arc::new(HeapAllocator::new()));
        let format = FrameFormat::new(352, 288, PixelFormat::NV12);
        (regs, pool, format)
    }

    fn key_frame() -> Vp9dRun {
        let mut params = DecodeParams {
            width: 352,
            height: 288,
            key_frame: true,
            uncompressed_header_size: 20,
            compressed_header_size: 30,
            ..Default::default()
        };
        params.lf.ref_deltas = [1, 0, -1, -1];
        params.lf.mode_deltas = [0, 2];
        Vp9dRun {
            src: 0x1000_0000,
            src_len: 1000,
            dst: 0x2000_0000,
            params: Box::new(params),
        }
    }

    fn inter_frame() -> Vp9dRun {
        let mut run = key_frame();
        run.dst = 0x2100_0000;
        run.params.key_frame = false;
        run.params.refs = [
            Some(RefFrame {
                addr: 0x2000_0000,
                width: 176,
                height: 144,
                bit_depth: 8,
            }),
            None,
            None,
        ];
        run
    }

    fn segid_cur(regs: &RegisterBlock, ctx: &Vp9dContext) -> usize {
        (regs.read(rkvdec::VP9_SEGIDCUR_BASE) - ctx.priv_tbl.dma()) as usize
    }

    #[test]
    fn test_strides() {
        let s = FrameStrides::new(352, 288, 8);
        assert_eq!(s.pitch, 352);
        assert_eq!(s.y, 352 * 320);
        assert_eq!(s.yuv, 352 * 320 * 3 / 2);

        // Register value in 128-bit words: round_up(width * bit_depth, 128) / 128.
        for (width, bit_depth) in [(352, 8), (1920, 10), (100, 8), (33, 10), (4096, 8)] {
            let pitch = FrameStrides::new(width, 64, bit_depth).pitch;
            assert_eq!(pitch / 16, (width * bit_depth + 127) / 128, "{}x{}", width, bit_depth);
            assert_eq!(pitch % 16, 0);
        }
        assert_eq!(FrameStrides::new(1920, 1080, 10).pitch, 2400);
        assert_eq!(FrameStrides::new(100, 64, 8).pitch, 112);
    }

    #[test]
    fn test_last_frame_updated_on_success_only() {
        let (regs, pool, format) = setup();
        let mut ctx = Vp9dContext::init(&pool, &format).unwrap();
        let run = key_frame();

        ctx.validate(&format, &run).unwrap();
        ctx.prepare(&format, &run).unwrap();
        ctx.program(&regs, &format, &run);
        assert_eq!(ctx.done(RunResult::Error), Feedback::None);
        assert!(!ctx.last_frame().valid);

        ctx.program(&regs, &format, &run);
        let fb = ctx.done(RunResult::Success);
        assert_eq!(fb, Feedback::Vp9Decode(Vp9dFeedback { counts: None }));
        let last = ctx.last_frame();
        assert!(last.valid);
        assert!(last.intra_only);
        assert_eq!(last.ref_deltas, [1, 0, -1, -1]);
        assert_eq!(last.width, 352);
        assert_eq!(last.mv_base, 0x2000_0000 + 352 * 320 * 3 / 2);

        // A second completion has nothing to commit.
        assert_eq!(ctx.done(RunResult::Success), Feedback::None);
        ctx.exit(&pool);
    }

    #[test]
    fn test_segmap_flip() {
        let (regs, pool, format) = setup();
        let mut ctx = Vp9dContext::init(&pool, &format).unwrap();

        // No last frame, no flip.
        ctx.program(&regs, &format, &key_frame());
        assert_eq!(segid_cur(&regs, &ctx), SEGMAP_OFFSET);
        ctx.done(RunResult::Success);

        // Segmentation disabled: the map is rewritten, flip.
        let mut run = inter_frame();
        ctx.program(&regs, &format, &run);
        assert_eq!(segid_cur(&regs, &ctx), SEGMAP_OFFSET + MAX_SEGMAP_SIZE);
        assert_eq!(
            regs.read(rkvdec::VP9_SEGIDLAST_BASE) - ctx.priv_tbl.dma(),
            SEGMAP_OFFSET as u32
        );
        ctx.done(RunResult::Success);
        assert_eq!(ctx.last_frame().segmap_id, 1);

        // Enabled without a map update keeps reading and writing the same map.
        run.params.seg.enabled = true;
        ctx.program(&regs, &format, &run);
        assert_eq!(segid_cur(&regs, &ctx), SEGMAP_OFFSET + MAX_SEGMAP_SIZE);
        ctx.done(RunResult::Success);

        run.params.seg.update_map = true;
        ctx.program(&regs, &format, &run);
        assert_eq!(segid_cur(&regs, &ctx), SEGMAP_OFFSET);
        // A failed run does not commit the flip.
        ctx.done(RunResult::Error);
        assert_eq!(ctx.last_frame().segmap_id, 1);
        ctx.exit(&pool);
    }

    #[test]
    fn test_inter_frame_registers() {
        let (regs, pool, format) = setup();
        let mut ctx = Vp9dContext::init(&pool, &format).unwrap();
        ctx.program(&regs, &format, &key_frame());
        ctx.done(RunResult::Success);

        let mut run = inter_frame();
        run.params.lf.ref_deltas = [5, 5, 5, 5];
        ctx.program(&regs, &format, &run);

        // Half-size last frame: scale 0.5 in Q14.
        let scale = regs.read(rkvdec::vp9_ref_scale(0));
        assert_eq!(scale & 0xffff, 1 << 13);
        assert_eq!(scale >> 16, 1 << 13);
        assert_eq!(regs.read(rkvdec::vp9_ref_scale(1)), (1 << 14) | (1 << 30));

        assert_eq!(regs.read(rkvdec::VP9_REFERLAST_BASE), 0x2000_0000);
        assert_eq!(regs.read(rkvdec::VP9_REFERGOLDEN_BASE), 0x2100_0000);
        assert_eq!(regs.read(rkvdec::VP9_LAST_YSTRIDE), 176 * 192 / 16);
        assert_eq!(
            regs.read(rkvdec::vp9_hor_virstride(0)),
            rkvdec::vp9_hor_y_virstride(11) | rkvdec::vp9_hor_uv_virstride(11)
        );
        assert_eq!(regs.read(rkvdec::vp9_frame_size(0)), 176 | (144 << 16));

        // Deltas come from the last frame, not from this one.
        let deltas = regs.read(rkvdec::VP9_REF_DELTAS_LASTFRAME);
        assert_eq!(deltas & 0x7f, 1);
        assert_eq!((deltas >> 14) & 0x7f, 0x7f);
        let info = regs.read(rkvdec::VP9_INFO_LASTFRAME);
        assert_eq!((info >> 7) & 0x7f, 2);
        assert_ne!(info & rkvdec::LAST_INTRA_ONLY, 0);
        assert_ne!(info & rkvdec::LAST_SHOW_FRAME, 0);
        assert_ne!(info & rkvdec::LAST_WIDTHHEIGHT_EQCUR, 0);
        assert_eq!(info & rkvdec::SEG_EN_LASTFRAME, 0);

        assert_eq!(regs.read(rkvdec::VP9_LASTTILE_SIZE), 1000 - 50);
        assert_eq!(
            regs.read(rkvdec::VP9_REF_COLMV_BASE),
            0x2000_0000 + 352 * 320 * 3 / 2
        );
        ctx.exit(&pool);
    }

    #[test]
    fn test_segment_groups() {
        let (regs, pool, format) = setup();
        let mut ctx = Vp9dContext::init(&pool, &format).unwrap();
        let mut run = key_frame();
        let seg = &mut run.params.seg;
        seg.enabled = true;
        seg.update_data = true;
        seg.abs_or_delta_update = true;
        seg.feature_enabled[0][SEG_LVL_ALT_Q] = true;
        seg.feature_data[0][SEG_LVL_ALT_Q] = -10;
        seg.feature_enabled[3][SEG_LVL_SKIP] = true;
        seg.feature_enabled[3][SEG_LVL_REF_FRAME] = true;
        seg.feature_data[3][SEG_LVL_REF_FRAME] = 2;
        ctx.program(&regs, &format, &run);

        let grp0 = regs.read(rkvdec::vp9_segid_grp(0));
        assert_ne!(grp0 & rkvdec::SEGID_ABS_DELTA, 0);
        assert_ne!(grp0 & rkvdec::SEGID_FRAME_QP_DELTA_EN, 0);
        assert_eq!((grp0 >> 2) & 0x1ff, 0x1f6);
        let grp3 = regs.read(rkvdec::vp9_segid_grp(3));
        assert_eq!(
            grp3,
            rkvdec::SEGID_FRAME_SKIP_EN | rkvdec::SEGID_REFERINFO_EN | rkvdec::segid_referinfo(2)
        );
        assert_eq!(regs.read(rkvdec::vp9_segid_grp(1)), 0);
        ctx.done(RunResult::Success);

        // Without new data the features of the last frame stay in effect.
        let mut run = inter_frame();
        run.params.seg.enabled = true;
        ctx.program(&regs, &format, &run);
        assert_eq!(regs.read(rkvdec::vp9_segid_grp(3)), grp3);
        ctx.exit(&pool);
    }

    #[test]
    fn test_counts_on_adaptation() {
        let (regs, pool, format) = setup();
        let mut ctx = Vp9dContext::init(&pool, &format).unwrap();
        let mut run = key_frame();
        run.params.refresh_frame_context = true;
        ctx.prepare(&format, &run).unwrap();
        ctx.count_tbl.cpu_mut()[0] = 42;
        ctx.program(&regs, &format, &run);

        let Feedback::Vp9Decode(fb) = ctx.done(RunResult::Success) else {
            panic!("no feedback");
        };
        let counts = fb.counts.unwrap();
        assert_eq!(counts.len(), COUNT_TABLE_SIZE);
        assert_eq!(counts[0], 42);
        ctx.exit(&pool);
    }

    #[test]
    fn test_validate() {
        let (_regs, pool, format) = setup();
        let ctx = Vp9dContext::init(&pool, &format).unwrap();
        let mut run = key_frame();
        run.params.width = 704;
        assert!(ctx.validate(&format, &run).is_err());

        let mut run = key_frame();
        run.src_len = 40;
        assert!(ctx.validate(&format, &run).is_err());
        ctx.exit(&pool);
    }
}
