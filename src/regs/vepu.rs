// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register map of the VEPU (Hantro H1) encoder block.

use crate::regs::Field;

pub const INTERRUPT: usize = 0x004;
pub const INTERRUPT_BIT: u32 = 1 << 0;
pub const INTERRUPT_DIS_BIT: u32 = 1 << 1;
pub const INTERRUPT_FRAME_RDY: u32 = 1 << 2;
pub const INTERRUPT_BUF_FULL: u32 = 1 << 5;
pub const INTERRUPT_TIMEOUT: u32 = 1 << 6;

pub const AXI_CTRL: usize = 0x008;
pub const AXI_CTRL_OUTPUT_SWAP16: u32 = 1 << 15;
pub const AXI_CTRL_INPUT_SWAP16: u32 = 1 << 14;
pub const fn axi_ctrl_burst_len(x: u32) -> u32 {
    (x & 0x3f) << 8
}
pub const AXI_CTRL_GATE_BIT: u32 = 1 << 4;
pub const AXI_CTRL_OUTPUT_SWAP32: u32 = 1 << 3;
pub const AXI_CTRL_INPUT_SWAP32: u32 = 1 << 2;
pub const AXI_CTRL_OUTPUT_SWAP8: u32 = 1 << 1;
pub const AXI_CTRL_INPUT_SWAP8: u32 = 1 << 0;

pub const ADDR_OUTPUT_STREAM: usize = 0x014;
pub const ADDR_OUTPUT_CTRL: usize = 0x018;
pub const ADDR_REF_LUMA: usize = 0x01c;
pub const ADDR_REF_CHROMA: usize = 0x020;
pub const ADDR_REC_LUMA: usize = 0x024;
pub const ADDR_REC_CHROMA: usize = 0x028;
pub const ADDR_IN_PLANE_0: usize = 0x02c;
pub const ADDR_IN_PLANE_1: usize = 0x030;
pub const ADDR_IN_PLANE_2: usize = 0x034;

pub const ENC_CTRL: usize = 0x038;
pub const ENC_CTRL_TIMEOUT_EN: u32 = 1 << 31;
pub const ENC_CTRL_NAL_MODE_BIT: u32 = 1 << 29;
pub const fn enc_ctrl_width(w: u32) -> u32 {
    (w & 0x1ff) << 19
}
pub const fn enc_ctrl_height(h: u32) -> u32 {
    (h & 0x1ff) << 10
}
pub const ENC_PIC_INTER: u32 = 0 << 3;
pub const ENC_PIC_INTRA: u32 = 1 << 3;
pub const ENC_CTRL_ENC_MODE_H264: u32 = 3 << 1;
pub const ENC_CTRL_ENC_MODE_VP8: u32 = 1 << 1;
pub const ENC_CTRL_EN_BIT: u32 = 1 << 0;

pub const IN_IMG_CTRL: usize = 0x03c;
pub const fn in_img_chroma_offset(x: u32) -> u32 {
    (x & 0x7) << 29
}
pub const fn in_img_luma_offset(x: u32) -> u32 {
    (x & 0x7) << 26
}
pub const fn in_img_row_length(x: u32) -> u32 {
    (x & 0x3fff) << 12
}
pub const fn in_img_overfill_right(x: u32) -> u32 {
    (x & 0x3) << 10
}
pub const fn in_img_overfill_bottom(x: u32) -> u32 {
    (x & 0xf) << 6
}
pub const fn in_img_fmt(x: u32) -> u32 {
    (x & 0xf) << 2
}
pub const fn in_img_rotation(x: u32) -> u32 {
    x & 0x3
}

pub const ENC_CTRL0: usize = 0x040;
pub const ENC_CTRL1: usize = 0x044;
pub const ENC_CTRL2: usize = 0x048;
pub const ENC_CTRL3: usize = 0x04c;
pub const ENC_CTRL5: usize = 0x050;
pub const ENC_CTRL4: usize = 0x054;
pub const STR_HDR_REM_MSB: usize = 0x058;
pub const STR_HDR_REM_LSB: usize = 0x05c;
pub const STR_BUF_LIMIT: usize = 0x060;
pub const MAD_CTRL: usize = 0x064;
pub const ADDR_VP8_PROB_CNT: usize = 0x068;
pub const QP_VAL: usize = 0x06c;
/// VP8 quantizer registers overlay the H.264 rate control area.
pub const fn vp8_qp_val(i: usize) -> usize {
    0x06c + i * 4
}

pub const fn checkpoint(i: usize) -> usize {
    0x070 + i * 4
}
pub const fn chkpt_word_err(i: usize) -> usize {
    0x084 + i * 4
}
pub const VP8_BOOL_ENC: usize = 0x08c;
pub const CHKPT_DELTA_QP: usize = 0x090;
pub const VP8_CTRL0: usize = 0x090;
pub const RLC_CTRL: usize = 0x094;
/// Bit offset of the first bit the encoder writes after the software header.
pub const RLC_CTRL_STR_OFFS: Field = Field::new(23, 6);
pub const MB_CTRL: usize = 0x098;
pub const ADDR_NEXT_PIC: usize = 0x09c;
pub const STAB_CTRL: usize = 0x0a0;
pub const ADDR_CABAC_TBL: usize = 0x0cc;
pub const ADDR_MV_OUT: usize = 0x0d0;
pub const fn rgb_yuv_coeff(i: usize) -> usize {
    0x0d4 + i * 4
}
pub const RGB_MASK_MSB: usize = 0x0dc;
pub const INTRA_AREA_CTRL: usize = 0x0e0;
pub const CIR_INTRA_CTRL: usize = 0x0e4;
pub const fn addr_vp8_dct_part(i: usize) -> usize {
    0x0e8 + i * 4
}
pub const FIRST_ROI_AREA: usize = 0x0f0;
pub const SECOND_ROI_AREA: usize = 0x0f4;
pub const MVC_CTRL: usize = 0x0f8;
pub const fn vp8_intra_penalty(i: usize) -> usize {
    0x100 + i * 4
}
pub const ADDR_VP8_SEG_MAP: usize = 0x11c;
pub const fn vp8_seg_qp(i: usize) -> usize {
    0x120 + i * 4
}
pub const fn dmv_4p_1p_penalty(i: usize) -> usize {
    0x180 + i * 4
}
pub const fn dmv_qpel_penalty(i: usize) -> usize {
    0x200 + i * 4
}
pub const VP8_CTRL1: usize = 0x280;
pub const VP8_BIT_COST_GOLDEN: usize = 0x284;
pub const fn vp8_loop_flt_delta(i: usize) -> usize {
    0x288 + i * 4
}

/// Size of the encoder register window.
pub const WINDOW_SIZE: usize = 0x400;

/// AXI configuration written before every encode: byte swapping for the little endian input and
/// output, 16-beat bursts, clock gating.
pub const AXI_CTRL_DEFAULT: u32 = AXI_CTRL_OUTPUT_SWAP16
    | AXI_CTRL_INPUT_SWAP16
    | axi_ctrl_burst_len(16)
    | AXI_CTRL_GATE_BIT
    | AXI_CTRL_OUTPUT_SWAP32
    | AXI_CTRL_INPUT_SWAP32
    | AXI_CTRL_OUTPUT_SWAP8
    | AXI_CTRL_INPUT_SWAP8;
