// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register map of the RKVDEC H.264/VP9 decoder block.

pub const INTERRUPT: usize = 0x004;
pub const INTERRUPT_DEC_E: u32 = 1 << 0;
pub const CONFIG_DEC_CLK_GATE_E: u32 = 1 << 1;
pub const IRQ_DIS: u32 = 1 << 4;
pub const TIMEOUT_E: u32 = 1 << 5;
pub const BUF_EMPTY_E: u32 = 1 << 6;
pub const IRQ: u32 = 1 << 8;
pub const IRQ_RAW: u32 = 1 << 9;
pub const RDY_STA: u32 = 1 << 12;
pub const BUS_STA: u32 = 1 << 13;
pub const ERR_STA: u32 = 1 << 14;
pub const TIMEOUT_STA: u32 = 1 << 15;
pub const BUF_EMPTY_STA: u32 = 1 << 16;
pub const COLMV_REF_ERR_STA: u32 = 1 << 17;
pub const SOFTRST_EN_P: u32 = 1 << 20;
pub const FORCE_SOFTRESET_VALID: u32 = 1 << 21;
/// Status bits meaning the run ended without a decoded picture.
pub const ERROR_STA_MASK: u32 =
    BUS_STA | ERR_STA | TIMEOUT_STA | BUF_EMPTY_STA | COLMV_REF_ERR_STA;

pub const SYSCTRL: usize = 0x008;
pub const IN_ENDIAN: u32 = 1 << 0;
pub const IN_SWAP32_E: u32 = 1 << 1;
pub const IN_SWAP64_E: u32 = 1 << 2;
pub const STR_ENDIAN: u32 = 1 << 3;
pub const STR_SWAP32_E: u32 = 1 << 4;
pub const STR_SWAP64_E: u32 = 1 << 5;
pub const OUT_ENDIAN: u32 = 1 << 6;
pub const OUT_SWAP32_E: u32 = 1 << 7;
pub const OUT_CBCR_SWAP: u32 = 1 << 8;
pub const RLC_MODE_DIRECT_WRITE: u32 = 1 << 10;
pub const RLC_MODE: u32 = 1 << 11;
pub const fn strm_start_bit(x: u32) -> u32 {
    (x & 0x7f) << 12
}
pub const fn mode(x: u32) -> u32 {
    (x & 0x3) << 20
}
pub const MODE_H264: u32 = 1;
pub const MODE_VP9: u32 = 2;
pub const RPS_MODE: u32 = 1 << 24;
pub const STRM_MODE: u32 = 1 << 25;
pub const H264_FIRSTSLICE_FLAG: u32 = 1 << 26;
pub const H264_FRAME_ORSLICE: u32 = 1 << 27;
pub const BUSPR_SLOT_DIS: u32 = 1 << 28;

pub const PICPAR: usize = 0x00c;
pub const fn y_hor_virstride(x: u32) -> u32 {
    x & 0x1ff
}
pub const SLICE_NUM_HIGHBIT: u32 = 1 << 11;
pub const fn uv_hor_virstride(x: u32) -> u32 {
    (x & 0x1ff) << 12
}
pub const fn slice_num_lowbits(x: u32) -> u32 {
    (x & 0x7ff) << 21
}

pub const STRM_RLC_BASE: usize = 0x010;
pub const STRM_LEN: usize = 0x014;
pub const fn strm_len(x: u32) -> u32 {
    x & 0x7ffffff
}
pub const CABACTBL_PROB_BASE: usize = 0x018;
pub const DECOUT_BASE: usize = 0x01c;
pub const Y_VIRSTRIDE: usize = 0x020;
pub const fn y_virstride(x: u32) -> u32 {
    x & 0xfffff
}
pub const YUV_VIRSTRIDE: usize = 0x024;
pub const fn yuv_virstride(x: u32) -> u32 {
    x & 0x1fffff
}

/// H.264 reference base for DPB entry `i`, low bits carry the reference flags.
pub const fn h264_base_refer(i: usize) -> usize {
    if i < 15 {
        0x028 + i * 4
    } else {
        0x0c0
    }
}
pub const FIELD_REF: u32 = 1 << 0;
pub const TOPFIELD_USED_REF: u32 = 1 << 1;
pub const BOTFIELD_USED_REF: u32 = 1 << 2;
pub const COLMV_USED_FLAG_REF: u32 = 1 << 3;

/// Register holding POC value `i` of the 32 reference field POCs.
pub const fn h264_poc_refer(i: usize) -> usize {
    if i < 15 {
        0x064 + i * 4
    } else if i < 30 {
        0x0c4 + (i - 15) * 4
    } else {
        0x120 + (i - 30) * 4
    }
}
pub const CUR_POC0: usize = 0x0a0;
pub const RLCWRITE_BASE: usize = 0x0a4;
pub const PPS_BASE: usize = 0x0a8;
pub const RPS_BASE: usize = 0x0ac;
pub const STRMD_ERROR_EN: usize = 0x0b0;
pub const STRMD_ERROR_STATUS: usize = 0x0b4;
pub const STRMD_ERROR_CTU: usize = 0x0b8;
pub const SAO_CTU_POSITION: usize = 0x0bc;
pub const PERFORMANCE_CYCLE: usize = 0x100;
pub const AXI_DDR_RDATA: usize = 0x104;
pub const AXI_DDR_WDATA: usize = 0x108;
pub const CUR_POC1: usize = 0x128;

pub const PREF_LUMA_CACHE_COMMAND: usize = 0x410;
pub const PREF_CHROMA_CACHE_COMMAND: usize = 0x450;

// VP9 registers overlay the H.264 reference area.
pub const VP9_CPRHEADER_OFFSET: usize = 0x028;
pub const VP9_REFERLAST_BASE: usize = 0x02c;
pub const VP9_REFERGOLDEN_BASE: usize = 0x030;
pub const VP9_REFERALFTER_BASE: usize = 0x034;
pub const VP9COUNT_BASE: usize = 0x038;
pub const VP9COUNT_UPDATE_EN: u32 = 1 << 0;
pub const VP9_SEGIDLAST_BASE: usize = 0x03c;
pub const VP9_SEGIDCUR_BASE: usize = 0x040;
pub const fn vp9_frame_size(i: usize) -> usize {
    0x044 + i * 4
}
pub const fn vp9_framewidth(x: u32) -> u32 {
    x & 0xffff
}
pub const fn vp9_frameheight(x: u32) -> u32 {
    (x & 0xffff) << 16
}

pub const fn vp9_segid_grp(i: usize) -> usize {
    0x050 + i * 4
}
pub const SEGID_ABS_DELTA: u32 = 1 << 0;
pub const SEGID_FRAME_QP_DELTA_EN: u32 = 1 << 1;
pub const fn segid_frame_qp_delta(x: i32) -> u32 {
    ((x as u32) & 0x1ff) << 2
}
pub const SEGID_FRAME_LOOPFILTER_VALUE_EN: u32 = 1 << 11;
pub const fn segid_frame_loopfilter_value(x: i32) -> u32 {
    ((x as u32) & 0x7f) << 12
}
pub const SEGID_REFERINFO_EN: u32 = 1 << 19;
pub const fn segid_referinfo(x: u32) -> u32 {
    (x & 0x3) << 20
}
pub const SEGID_FRAME_SKIP_EN: u32 = 1 << 22;

pub const VP9_CPRHEADER_CONFIG: usize = 0x070;
pub const fn vp9_tx_mode(x: u32) -> u32 {
    x & 0x7
}
pub const fn vp9_frame_ref_mode(x: u32) -> u32 {
    (x & 0x3) << 3
}

pub const fn vp9_ref_scale(i: usize) -> usize {
    0x074 + i * 4
}
pub const fn vp9_ref_hor_scale(x: u32) -> u32 {
    x & 0xffff
}
pub const fn vp9_ref_ver_scale(x: u32) -> u32 {
    (x & 0xffff) << 16
}

pub const VP9_REF_DELTAS_LASTFRAME: usize = 0x080;
pub const fn vp9_ref_deltas_lastframe(pos: u32, val: i32) -> u32 {
    ((val as u32) & 0x7f) << (pos * 7)
}

pub const VP9_INFO_LASTFRAME: usize = 0x084;
pub const fn vp9_mode_deltas_lastframe(pos: u32, val: i32) -> u32 {
    ((val as u32) & 0x7f) << (pos * 7)
}
pub const SEG_EN_LASTFRAME: u32 = 1 << 16;
pub const LAST_SHOW_FRAME: u32 = 1 << 17;
pub const LAST_INTRA_ONLY: u32 = 1 << 18;
pub const LAST_WIDTHHEIGHT_EQCUR: u32 = 1 << 19;

pub const VP9_INTERCMD_BASE: usize = 0x088;
pub const VP9_INTERCMD_NUM: usize = 0x08c;
pub const VP9_LASTTILE_SIZE: usize = 0x090;
pub const fn vp9_hor_virstride(i: usize) -> usize {
    0x094 + i * 4
}
pub const fn vp9_hor_y_virstride(x: u32) -> u32 {
    x & 0x1ff
}
pub const fn vp9_hor_uv_virstride(x: u32) -> u32 {
    (x & 0x1ff) << 16
}
pub const VP9_LAST_YSTRIDE: usize = 0x0a0;
pub const VP9_GOLDEN_YSTRIDE: usize = 0x0a4;
pub const VP9_ALTREF_YSTRIDE: usize = 0x0a8;
pub const VP9_LAST_YUVSTRIDE: usize = 0x0ac;
pub const VP9_REF_COLMV_BASE: usize = 0x0b0;

/// Size of the RKVDEC register window.
pub const WINDOW_SIZE: usize = 0x480;

/// Value of the interrupt register that starts a decode.
pub const START: u32 = INTERRUPT_DEC_E | CONFIG_DEC_CLK_GATE_E | TIMEOUT_E | BUF_EMPTY_E;
