// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! VP8 decoding on the G1 block.

use crate::aux_buf::AuxBuffer;
use crate::aux_buf::AuxBufferPool;
use crate::backend::Programmed;
use crate::backend::StartWrite;
use crate::codec::vp8::params::FrameHeader;
use crate::codec::vp8::tables::pack_prob_table;
use crate::codec::vp8::tables::segment_map_size;
use crate::codec::vp8::tables::MC_FILTER;
use crate::codec::vp8::tables::PROB_TABLE_SIZE;
use crate::regs::vdpu;
use crate::regs::RegisterBlock;
use crate::utils::clip3;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// The hardware fetches stream data from 64-bit aligned addresses.
const ALIGN_MASK: u32 = 0x7;

/// Registers composed from fields, cleared before each run.
const FIELD_REGS: [usize; 22] = [
    vdpu::DEC_CTRL1,
    vdpu::DEC_CTRL2,
    vdpu::DEC_CTRL3,
    vdpu::DEC_CTRL4,
    vdpu::DEC_CTRL6,
    vdpu::DEC_CTRL7,
    vdpu::ref_pic(0),
    vdpu::ref_pic(1),
    vdpu::ref_pic(2),
    vdpu::ref_pic(3),
    vdpu::ref_pic(4),
    vdpu::ref_pic(5),
    vdpu::ref_pic(6),
    vdpu::ref_pic(7),
    vdpu::LT_REF,
    vdpu::VALID_REF,
    vdpu::bd_ref_pic(0),
    vdpu::bd_ref_pic(1),
    vdpu::bd_ref_pic(2),
    vdpu::bd_ref_pic(3),
    vdpu::bd_ref_pic(4),
    vdpu::BD_P_REF_PIC,
];

/// Buffers and header of one VP8 decode.
#[derive(Clone, Debug)]
pub struct Vp8dRun {
    /// Bus address of the compressed frame, starting at the frame tag.
    pub src: u32,
    pub src_len: u32,
    pub dst: u32,
    /// Reference frames. A missing reference reads from the destination.
    pub last: Option<u32>,
    pub golden: Option<u32>,
    pub alt: Option<u32>,
    pub header: Box<FrameHeader>,
}

impl Vp8dRun {
    /// Bytes of the frame covered by the header's partition sizes.
    fn coded_len(&self) -> u64 {
        let hdr = &self.header;
        let parts = hdr.num_dct_parts as usize;
        hdr.first_part_offset() as u64
            + hdr.first_part_size as u64
            + (parts.saturating_sub(1) * 3) as u64
            + hdr.dct_part_sizes[..parts.min(8)]
                .iter()
                .map(|&s| s as u64)
                .sum::<u64>()
    }
}

pub struct Vp8dContext {
    prob_tbl: AuxBuffer,
    segment_map: AuxBuffer,
}

impl Vp8dContext {
    pub fn init(pool: &AuxBufferPool, format: &FrameFormat) -> VpuResult<Self> {
        let [prob_tbl, mut segment_map] = pool.allocate_set([
            ("vp8d prob_tbl", PROB_TABLE_SIZE),
            (
                "vp8d segment_map",
                segment_map_size(format.coded.width, format.coded.height),
            ),
        ])?;
        segment_map.clear();

        Ok(Self {
            prob_tbl,
            segment_map,
        })
    }

    pub fn exit(self, pool: &AuxBufferPool) {
        pool.free_set([self.prob_tbl, self.segment_map]);
    }

    pub fn validate(&self, format: &FrameFormat, run: &Vp8dRun) -> VpuResult<()> {
        let hdr = &run.header;
        hdr.validate()?;

        if u32::from(hdr.width) > format.coded.width || u32::from(hdr.height) > format.coded.height
        {
            return Err(VpuError::UnsupportedParameter(format!(
                "frame of {}x{} in a {}x{} session",
                hdr.width, hdr.height, format.coded.width, format.coded.height
            )));
        }
        if hdr.first_part_size * 8 < hdr.header_size + 8 {
            return Err(VpuError::UnsupportedParameter(format!(
                "first partition of {} bytes holds no macroblock data",
                hdr.first_part_size
            )));
        }
        let coded_len = run.coded_len();
        if coded_len > run.src_len as u64 {
            return Err(VpuError::UnsupportedParameter(format!(
                "partitions span {} bytes of a {}-byte stream",
                coded_len, run.src_len
            )));
        }
        Ok(())
    }

    pub fn prepare(&mut self, _format: &FrameFormat, run: &Vp8dRun) -> VpuResult<()> {
        if run.header.key_frame {
            self.segment_map.clear();
        }
        pack_prob_table(&run.header, self.prob_tbl.cpu_mut())?;
        Ok(())
    }

    fn program_lf(regs: &RegisterBlock, hdr: &FrameHeader) {
        let seg = &hdr.segmentation;
        if !seg.segmentation_enabled {
            regs.write_field(vdpu::VP8_LF_LEVEL[0], hdr.loop_filter_level as u32);
        } else if !seg.segment_feature_mode {
            for (field, &delta) in vdpu::VP8_LF_LEVEL.iter().zip(&seg.lf_update_value) {
                let level = clip3(0, 63, hdr.loop_filter_level as i32 + delta as i32);
                regs.write_field(*field, level as u32);
            }
        } else {
            for (field, &level) in vdpu::VP8_LF_LEVEL.iter().zip(&seg.lf_update_value) {
                regs.write_field(*field, level as u32);
            }
        }

        let mut reg = vdpu::ref_pic_filt_sharpness(hdr.sharpness_level as u32);
        if hdr.filter_type {
            reg |= vdpu::REF_PIC_FILT_TYPE_E;
        }
        regs.write(vdpu::ref_pic(0), reg);

        let adj = &hdr.mb_lf_adjust;
        if adj.loop_filter_adj_enable {
            for i in 0..4 {
                regs.write_field_signed(vdpu::VP8_MB_ADJ[i], adj.mb_mode_delta[i] as i32);
                regs.write_field_signed(vdpu::VP8_REF_ADJ[i], adj.ref_frame_delta[i] as i32);
            }
        }
    }

    fn program_qp(regs: &RegisterBlock, hdr: &FrameHeader) {
        let seg = &hdr.segmentation;
        let q = &hdr.quant_indices;
        if !seg.segmentation_enabled {
            regs.write_field(vdpu::VP8_QUANT[0], q.y_ac_qi as u32);
        } else if !seg.segment_feature_mode {
            for (field, &delta) in vdpu::VP8_QUANT.iter().zip(&seg.quantizer_update_value) {
                let qi = clip3(0, 127, q.y_ac_qi as i32 + delta as i32);
                regs.write_field(*field, qi as u32);
            }
        } else {
            for (field, &qi) in vdpu::VP8_QUANT.iter().zip(&seg.quantizer_update_value) {
                regs.write_field(*field, qi as u32);
            }
        }

        let deltas = [
            q.y_dc_delta,
            q.y2_dc_delta,
            q.y2_ac_delta,
            q.uv_dc_delta,
            q.uv_ac_delta,
        ];
        for (field, delta) in vdpu::VP8_QUANT_DELTA.iter().zip(deltas) {
            regs.write_field_signed(*field, delta as i32);
        }
    }

    fn program_parts(regs: &RegisterBlock, run: &Vp8dRun) {
        let hdr = &run.header;
        let first_part_offset = hdr.first_part_offset();

        // Macroblock data of the first partition starts right after the frame header, one byte
        // past the header bits for the bool decoder's lookahead.
        let mb_offset_bits = first_part_offset * 8 + hdr.header_size + 8;
        let mb_offset_bytes = mb_offset_bits / 8;
        let mb_start_bits = mb_offset_bits - (mb_offset_bytes & !ALIGN_MASK) * 8;
        let mb_size = hdr.first_part_size - (mb_offset_bytes - first_part_offset)
            + (mb_offset_bytes & ALIGN_MASK);

        regs.write(
            vdpu::VP8_MB_DATA_BASE,
            run.src + (mb_offset_bytes & !ALIGN_MASK),
        );
        regs.write_field(vdpu::MB_START_BIT, mb_start_bits);
        regs.write_field(vdpu::MB_ALIGNED_DATA_LEN, mb_size);

        // All partitions but the last are preceded by a 3-byte size.
        let num_parts = hdr.num_dct_parts as usize;
        let size_bytes = (num_parts as u32 - 1) * 3;
        let dct_part_offset = first_part_offset + hdr.first_part_size;
        let total_len = hdr.dct_part_sizes[..num_parts].iter().sum::<u32>()
            + size_bytes
            + (dct_part_offset & ALIGN_MASK);

        regs.write_field(vdpu::NUM_DCT_PARTITIONS, num_parts as u32 - 1);
        regs.write_field(vdpu::STREAM_LEN, total_len);

        let mut count = 0;
        for i in 0..num_parts {
            let byte_offset = dct_part_offset + size_bytes + count;
            regs.write(vdpu::VP8_DCT_BASE[i], (run.src + byte_offset) & !ALIGN_MASK);
            regs.write_field(vdpu::VP8_DCT_START_BITS[i], (byte_offset & ALIGN_MASK) * 8);
            count += hdr.dct_part_sizes[i];
        }
    }

    fn program_taps(regs: &RegisterBlock, hdr: &FrameHeader) {
        // Bilinear and full-pixel streams do not use the six-tap filters.
        if hdr.version & 0x3 != 0 {
            return;
        }
        for (filter, taps) in vdpu::VP8_PRED_BC_TAP.iter().enumerate() {
            for (j, field) in taps.iter().enumerate() {
                if let Some(field) = field {
                    regs.write_field_signed(*field, MC_FILTER[filter][j + 1]);
                }
            }
        }
        for (filter, hi, lo) in vdpu::VP8_OUTER_TAPS {
            regs.write_field(hi, MC_FILTER[filter][0] as u32);
            regs.write_field(lo, MC_FILTER[filter][5] as u32);
        }
    }

    fn program_refs(regs: &RegisterBlock, run: &Vp8dRun) {
        let hdr = &run.header;
        regs.write(vdpu::addr_ref(0), run.last.unwrap_or(run.dst));

        let mut golden = run.golden.unwrap_or(run.dst);
        if hdr.sign_bias_golden {
            golden |= vdpu::ADDR_REF_TOPC_E;
        }
        regs.write(vdpu::addr_ref(4), golden);

        let mut alt = run.alt.unwrap_or(run.dst);
        if hdr.sign_bias_alternate {
            alt |= vdpu::ADDR_REF_TOPC_E;
        }
        regs.write(vdpu::addr_ref(5), alt);
    }

    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        _format: &FrameFormat,
        run: &Vp8dRun,
    ) -> Programmed {
        let hdr = &run.header;
        for reg in FIELD_REGS {
            regs.write(reg, 0);
        }

        regs.write(vdpu::CONFIG, vdpu::CONFIG_DEFAULT);

        let mut ctrl0 = vdpu::dec_ctrl0_dec_mode(vdpu::DEC_MODE_VP8);
        if !hdr.key_frame {
            ctrl0 |= vdpu::DEC_CTRL0_PIC_INTER_E;
        }
        if !hdr.mb_no_coeff_skip {
            ctrl0 |= vdpu::DEC_CTRL0_SKIP_MODE;
        }
        if hdr.loop_filter_level == 0 {
            ctrl0 |= vdpu::DEC_CTRL0_FILTERING_DIS;
        }
        regs.write(vdpu::DEC_CTRL0, ctrl0);

        let mb_width = (hdr.width as u32).div_ceil(16);
        let mb_height = (hdr.height as u32).div_ceil(16);
        regs.write_field(vdpu::MB_WIDTH, mb_width);
        regs.write_field(vdpu::MB_HEIGHT, mb_height);
        regs.write_field(vdpu::MB_WIDTH_EXT, mb_width >> 9);
        regs.write_field(vdpu::MB_HEIGHT_EXT, mb_height >> 8);

        regs.write_field(vdpu::BOOL_RANGE, hdr.bd_range as u32);
        regs.write_field(vdpu::BOOL_VALUE, hdr.bd_value as u32);

        let mut ctrl4 = 0;
        if hdr.version != 3 {
            ctrl4 |= vdpu::DEC_CTRL4_VC1_HEIGHT_EXT;
        }
        if hdr.version & 0x3 != 0 {
            ctrl4 |= vdpu::DEC_CTRL4_BILIN_MC_E;
        }
        regs.modify(vdpu::DEC_CTRL4, ctrl4, ctrl4);

        Self::program_lf(regs, hdr);
        Self::program_qp(regs, hdr);
        Self::program_parts(regs, run);
        Self::program_taps(regs, hdr);
        Self::program_refs(regs, run);

        regs.write(vdpu::ADDR_QTABLE, self.prob_tbl.dma());

        let mut seg = self.segment_map.dma();
        if hdr.segmentation.segmentation_enabled {
            seg |= vdpu::FWD_PIC_SEGMENT_E;
            if hdr.segmentation.update_mb_segmentation_map {
                seg |= vdpu::FWD_PIC_SEGMENT_UPD_E;
            }
        }
        regs.write(vdpu::fwd_pic(0), seg);
        regs.write(vdpu::ADDR_DST, run.dst);

        log::debug!(
            "vp8d run: {}x{} key_frame {} src {:#010x} len {} parts {}",
            hdr.width,
            hdr.height,
            hdr.key_frame,
            run.src,
            run.src_len,
            hdr.num_dct_parts
        );

        Programmed {
            start: StartWrite {
                offset: vdpu::INTERRUPT,
                value: vdpu::INTERRUPT_DEC_E,
            },
            dpb_fallbacks: 0,
        }
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
        let region = Arc::new(MemoryRegion::new(vdpu::WINDOW_SIZE));
        let regs = RegisterBlock::new("vdpu", region.clone());
        let pool = AuxBufferPool::new(Arc::new(HeapAllocator::new()));
        let format = FrameFormat::new(176, 144, PixelFormat::NV12);
        (region, regs, pool, format)
    }

    fn run() -> Vp8dRun {
        let mut header = FrameHeader {
            key_frame: true,
            width: 176,
            height: 144,
            num_dct_parts: 2,
            first_part_size: 100,
            header_size: 203,
            loop_filter_level: 20,
            sharpness_level: 3,
            bd_range: 0xfe,
            bd_value: 0x42,
            mb_no_coeff_skip: true,
            ..Default::default()
        };
        header.dct_part_sizes[0] = 300;
        header.dct_part_sizes[1] = 200;
        Vp8dRun {
            src: 0x1000_0000,
            src_len: 4096,
            dst: 0x2000_0000,
            last: None,
            golden: Some(0x3000_0000),
            alt: None,
            header: Box::new(header),
        }
    }

    #[test]
    fn test_program_partitions() {
        let (region, regs, pool, format) = setup();
        let mut ctx = Vp8dContext::init(&pool, &format).unwrap();
        let run = run();
        ctx.validate(&format, &run).unwrap();
        ctx.prepare(&format, &run).unwrap();
        let programmed = ctx.program(&regs, &format, &run);

        // 10 * 8 + 203 + 8 = 291 bits: byte 36, aligned down to 32.
        assert_eq!(regs.read(vdpu::VP8_MB_DATA_BASE), 0x1000_0000 + 32);
        assert_eq!(regs.read_field(vdpu::MB_START_BIT), 291 - 256);
        assert_eq!(regs.read_field(vdpu::MB_ALIGNED_DATA_LEN), 100 - 26 + 4);

        // Partitions start at 110 behind 3 size bytes.
        assert_eq!(regs.read_field(vdpu::NUM_DCT_PARTITIONS), 1);
        assert_eq!(regs.read_field(vdpu::STREAM_LEN), 500 + 3 + 6);
        assert_eq!(regs.read(vdpu::ADDR_STR), 0x1000_0000 + 112);
        assert_eq!(regs.read_field(vdpu::VP8_DCT_START_BITS[0]), 8);
        assert_eq!(regs.read(vdpu::VP8_DCT_BASE[1]), 0x1000_0000 + 408);
        assert_eq!(regs.read_field(vdpu::VP8_DCT_START_BITS[1]), 5 * 8);

        assert_eq!(regs.read_field(vdpu::MB_WIDTH), 11);
        assert_eq!(regs.read_field(vdpu::MB_HEIGHT), 9);
        assert_eq!(regs.read_field(vdpu::BOOL_RANGE), 0xfe);
        assert_eq!(regs.read_field(vdpu::BOOL_VALUE), 0x42);
        assert_eq!(regs.read_field(vdpu::VP8_LF_LEVEL[0]), 20);

        let ctrl0 = regs.read(vdpu::DEC_CTRL0);
        assert_eq!(ctrl0 >> 28, vdpu::DEC_MODE_VP8);
        assert_eq!(ctrl0 & vdpu::DEC_CTRL0_PIC_INTER_E, 0);
        assert_eq!(ctrl0 & vdpu::DEC_CTRL0_SKIP_MODE, 0);

        assert_eq!(regs.read(vdpu::addr_ref(0)), 0x2000_0000);
        assert_eq!(regs.read(vdpu::addr_ref(4)), 0x3000_0000);
        assert_eq!(regs.read(vdpu::ADDR_DST), 0x2000_0000);
        assert_eq!(regs.read(vdpu::fwd_pic(0)) & 0x3, 0);

        assert_eq!(programmed.start.offset, vdpu::INTERRUPT);
        assert_eq!(programmed.start.value, vdpu::INTERRUPT_DEC_E);
        assert!(region.write_log().iter().all(|w| !w.barriered));
        ctx.exit(&pool);
    }

    #[test]
    fn test_segment_deltas_clamped() {
        let (_region, regs, pool, format) = setup();
        let mut ctx = Vp8dContext::init(&pool, &format).unwrap();
        let mut run = run();
        run.header.key_frame = false;
        run.header.sign_bias_alternate = true;
        run.header.quant_indices.y_ac_qi = 120;
        run.header.quant_indices.y_dc_delta = -3;
        run.header.segmentation = crate::codec::vp8::params::Segmentation {
            segmentation_enabled: true,
            update_mb_segmentation_map: true,
            segment_feature_mode: false,
            quantizer_update_value: [10, -5, 0, -127],
            lf_update_value: [50, -30, 0, 1],
            segment_prob: [255; 3],
        };
        ctx.prepare(&format, &run).unwrap();
        ctx.program(&regs, &format, &run);

        let qs: Vec<u32> = vdpu::VP8_QUANT.iter().map(|f| regs.read_field(*f)).collect();
        assert_eq!(qs, [127, 115, 120, 0]);
        let lfs: Vec<u32> = vdpu::VP8_LF_LEVEL
            .iter()
            .map(|f| regs.read_field(*f))
            .collect();
        assert_eq!(lfs, [63, 0, 20, 21]);
        assert_eq!(regs.read_field(vdpu::VP8_QUANT_DELTA[0]), 0x1d);

        assert_eq!(regs.read(vdpu::fwd_pic(0)) & 0x3, 0x3);
        assert_eq!(regs.read(vdpu::addr_ref(5)), 0x2000_0001);
        assert_ne!(regs.read(vdpu::DEC_CTRL0) & vdpu::DEC_CTRL0_PIC_INTER_E, 0);
        ctx.exit(&pool);
    }

    #[test]
    fn test_taps() {
        let (_region, regs, pool, format) = setup();
        let mut ctx = Vp8dContext::init(&pool, &format).unwrap();
        let mut run = run();
        ctx.program(&regs, &format, &run);
        let tap = vdpu::VP8_PRED_BC_TAP[2][0].unwrap();
        assert_eq!(regs.read_field(tap), (MC_FILTER[2][1] as u32) & 0x3ff);
        let (_, hi, lo) = vdpu::VP8_OUTER_TAPS[0];
        assert_eq!(regs.read_field(hi), MC_FILTER[2][0] as u32);
        assert_eq!(regs.read_field(lo), MC_FILTER[2][5] as u32);
        assert_ne!(regs.read(vdpu::DEC_CTRL4) & vdpu::DEC_CTRL4_VC1_HEIGHT_EXT, 0);

        // Bilinear streams leave the filter registers cleared.
        run.header.version = 1;
        ctx.program(&regs, &format, &run);
        assert_eq!(regs.read_field(tap), 0);
        assert_ne!(regs.read(vdpu::DEC_CTRL4) & vdpu::DEC_CTRL4_BILIN_MC_E, 0);
        ctx.exit(&pool);
    }

    #[test]
    fn test_key_frame_clears_segment_map() {
        let (_region, _regs, pool, format) = setup();
        let mut ctx = Vp8dContext::init(&pool, &format).unwrap();
        let mut run = run();
        ctx.segment_map.cpu_mut().fill(0xaa);

        run.header.key_frame = false;
        ctx.prepare(&format, &run).unwrap();
        assert!(ctx.segment_map.cpu().iter().all(|&b| b == 0xaa));

        run.header.key_frame = true;
        ctx.prepare(&format, &run).unwrap();
        assert!(ctx.segment_map.cpu().iter().all(|&b| b == 0));
        ctx.exit(&pool);
    }

    #[test]
    fn test_validate() {
        let (_region, _regs, pool, format) = setup();
        let ctx = Vp8dContext::init(&pool, &format).unwrap();

        let mut run = run();
        run.src_len = 600;
        assert!(ctx.validate(&format, &run).is_err());

        let mut run = self::run();
        run.header.width = 352;
        assert!(ctx.validate(&format, &run).is_err());

        let mut run = self::run();
        run.header.header_size = 800;
        assert!(ctx.validate(&format, &run).is_err());
        ctx.exit(&pool);
    }
}
