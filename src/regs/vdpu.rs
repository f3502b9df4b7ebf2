// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register map of the VDPU (Hantro G1) decoder block.

use crate::regs::RegField;

pub const INTERRUPT: usize = 0x004;
pub const INTERRUPT_DEC_PIC_INF: u32 = 1 << 24;
pub const INTERRUPT_DEC_TIMEOUT: u32 = 1 << 18;
pub const INTERRUPT_DEC_SLICE_INT: u32 = 1 << 17;
pub const INTERRUPT_DEC_ERROR_INT: u32 = 1 << 16;
pub const INTERRUPT_DEC_ASO_INT: u32 = 1 << 15;
pub const INTERRUPT_DEC_BUFFER_INT: u32 = 1 << 14;
pub const INTERRUPT_DEC_BUS_INT: u32 = 1 << 13;
pub const INTERRUPT_DEC_RDY_INT: u32 = 1 << 12;
pub const INTERRUPT_DEC_IRQ: u32 = 1 << 8;
pub const INTERRUPT_DEC_IRQ_DIS: u32 = 1 << 4;
pub const INTERRUPT_DEC_E: u32 = 1 << 0;

pub const CONFIG: usize = 0x008;
pub const fn config_dec_axi_rd_id(x: u32) -> u32 {
    (x & 0xff) << 24
}
pub const CONFIG_DEC_TIMEOUT_E: u32 = 1 << 23;
pub const CONFIG_DEC_STRSWAP32_E: u32 = 1 << 22;
pub const CONFIG_DEC_STRENDIAN_E: u32 = 1 << 21;
pub const CONFIG_DEC_INSWAP32_E: u32 = 1 << 20;
pub const CONFIG_DEC_OUTSWAP32_E: u32 = 1 << 19;
pub const CONFIG_DEC_DATA_DISC_E: u32 = 1 << 18;
pub const CONFIG_DEC_CLK_GATE_E: u32 = 1 << 10;
pub const CONFIG_DEC_IN_ENDIAN: u32 = 1 << 9;
pub const CONFIG_DEC_OUT_ENDIAN: u32 = 1 << 8;
pub const fn config_dec_max_burst(x: u32) -> u32 {
    x & 0x1f
}

pub const DEC_CTRL0: usize = 0x00c;
pub const fn dec_ctrl0_dec_mode(x: u32) -> u32 {
    (x & 0xf) << 28
}
pub const DEC_CTRL0_SKIP_MODE: u32 = 1 << 26;
pub const DEC_CTRL0_PIC_INTER_E: u32 = 1 << 20;
pub const DEC_CTRL0_FILTERING_DIS: u32 = 1 << 14;
pub const DEC_MODE_VP8: u32 = 10;

pub const DEC_CTRL1: usize = 0x010;
pub const DEC_CTRL2: usize = 0x014;
pub const DEC_CTRL3: usize = 0x018;
pub const DEC_CTRL4: usize = 0x01c;
pub const DEC_CTRL4_VC1_HEIGHT_EXT: u32 = 1 << 13;
pub const DEC_CTRL4_BILIN_MC_E: u32 = 1 << 12;
pub const DEC_CTRL5: usize = 0x020;
pub const DEC_CTRL6: usize = 0x024;

pub const fn fwd_pic(i: usize) -> usize {
    0x028 + i * 4
}
pub const FWD_PIC_SEGMENT_UPD_E: u32 = 1 << 1;
pub const FWD_PIC_SEGMENT_E: u32 = 1 << 0;

pub const ADDR_STR: usize = 0x030;
pub const ADDR_DST: usize = 0x034;
pub const fn addr_ref(i: usize) -> usize {
    0x038 + i * 4
}
pub const ADDR_REF_TOPC_E: u32 = 1 << 0;

pub const fn ref_pic(i: usize) -> usize {
    0x078 + i * 4
}
pub const REF_PIC_FILT_TYPE_E: u32 = 1 << 31;
pub const fn ref_pic_filt_sharpness(x: u32) -> u32 {
    (x & 0x7) << 28
}

pub const LT_REF: usize = 0x098;
pub const VALID_REF: usize = 0x09c;
pub const ADDR_QTABLE: usize = 0x0a0;
pub const ADDR_DIR_MV: usize = 0x0a4;
pub const fn bd_ref_pic(i: usize) -> usize {
    0x0a8 + i * 4
}
pub const BD_P_REF_PIC: usize = 0x0bc;
pub const ERR_CONC: usize = 0x0c0;
pub const PRED_FLT: usize = 0x0c4;
pub const REF_BUF_CTRL: usize = 0x0cc;
pub const REF_BUF_CTRL2: usize = 0x0d0;
pub const DEC_CTRL7: usize = 0x0d8;

/// Size of the decoder register window.
pub const WINDOW_SIZE: usize = 0x400;

pub const MB_WIDTH: RegField = RegField::new(DEC_CTRL1, 23, 9);
pub const MB_HEIGHT: RegField = RegField::new(DEC_CTRL1, 11, 8);
pub const MB_WIDTH_EXT: RegField = RegField::new(DEC_CTRL1, 3, 3);
pub const MB_HEIGHT_EXT: RegField = RegField::new(DEC_CTRL1, 0, 3);

pub const BOOL_RANGE: RegField = RegField::new(DEC_CTRL2, 0, 8);
pub const BOOL_VALUE: RegField = RegField::new(DEC_CTRL2, 8, 8);
pub const MB_START_BIT: RegField = RegField::new(DEC_CTRL2, 18, 6);
pub const STREAM_LEN: RegField = RegField::new(DEC_CTRL3, 0, 24);
pub const MB_ALIGNED_DATA_LEN: RegField = RegField::new(DEC_CTRL6, 0, 22);
pub const NUM_DCT_PARTITIONS: RegField = RegField::new(DEC_CTRL6, 24, 4);

pub const VP8_LF_LEVEL: [RegField; 4] = [
    RegField::new(ref_pic(2), 18, 6),
    RegField::new(ref_pic(2), 12, 6),
    RegField::new(ref_pic(2), 6, 6),
    RegField::new(ref_pic(2), 0, 6),
];

pub const VP8_MB_ADJ: [RegField; 4] = [
    RegField::new(ref_pic(0), 21, 7),
    RegField::new(ref_pic(0), 14, 7),
    RegField::new(ref_pic(0), 7, 7),
    RegField::new(ref_pic(0), 0, 7),
];

pub const VP8_REF_ADJ: [RegField; 4] = [
    RegField::new(ref_pic(1), 21, 7),
    RegField::new(ref_pic(1), 14, 7),
    RegField::new(ref_pic(1), 7, 7),
    RegField::new(ref_pic(1), 0, 7),
];

pub const VP8_QUANT: [RegField; 4] = [
    RegField::new(ref_pic(3), 11, 11),
    RegField::new(ref_pic(3), 0, 11),
    RegField::new(bd_ref_pic(4), 11, 11),
    RegField::new(bd_ref_pic(4), 0, 11),
];

/// Y DC, Y2 DC, Y2 AC, UV DC and UV AC quantizer deltas.
pub const VP8_QUANT_DELTA: [RegField; 5] = [
    RegField::new(ref_pic(3), 27, 5),
    RegField::new(ref_pic(3), 22, 5),
    RegField::new(bd_ref_pic(4), 27, 5),
    RegField::new(bd_ref_pic(4), 22, 5),
    RegField::new(BD_P_REF_PIC, 27, 5),
];

pub const VP8_DCT_BASE: [usize; 8] = [
    ADDR_STR,
    addr_ref(8),
    addr_ref(9),
    addr_ref(10),
    addr_ref(11),
    addr_ref(12),
    addr_ref(14),
    addr_ref(15),
];

/// Base address of the first partition's macroblock data.
pub const VP8_MB_DATA_BASE: usize = addr_ref(13);

pub const VP8_DCT_START_BITS: [RegField; 8] = [
    RegField::new(DEC_CTRL2, 26, 6),
    RegField::new(DEC_CTRL4, 26, 6),
    RegField::new(DEC_CTRL4, 20, 6),
    RegField::new(DEC_CTRL7, 24, 6),
    RegField::new(DEC_CTRL7, 18, 6),
    RegField::new(DEC_CTRL7, 12, 6),
    RegField::new(DEC_CTRL7, 6, 6),
    RegField::new(DEC_CTRL7, 0, 6),
];

const fn tap(offset: usize, shift: u32) -> Option<RegField> {
    Some(RegField::new(offset, shift, 10))
}

/// Inner taps 1 to 4 of the eight six-tap filters. Filter 0 is a plain copy and has no register
/// for its first inner tap.
pub const VP8_PRED_BC_TAP: [[Option<RegField>; 4]; 8] = [
    [None, tap(PRED_FLT, 22), tap(PRED_FLT, 12), tap(PRED_FLT, 2)],
    [
        tap(ref_pic(4), 22),
        tap(ref_pic(4), 12),
        tap(ref_pic(4), 2),
        tap(ref_pic(5), 22),
    ],
    [
        tap(ref_pic(5), 12),
        tap(ref_pic(5), 2),
        tap(ref_pic(6), 22),
        tap(ref_pic(6), 12),
    ],
    [
        tap(ref_pic(6), 2),
        tap(ref_pic(7), 22),
        tap(ref_pic(7), 12),
        tap(ref_pic(7), 2),
    ],
    [
        tap(LT_REF, 22),
        tap(LT_REF, 12),
        tap(LT_REF, 2),
        tap(VALID_REF, 22),
    ],
    [
        tap(VALID_REF, 12),
        tap(VALID_REF, 2),
        tap(bd_ref_pic(0), 22),
        tap(bd_ref_pic(0), 12),
    ],
    [
        tap(bd_ref_pic(0), 2),
        tap(bd_ref_pic(1), 22),
        tap(bd_ref_pic(1), 12),
        tap(bd_ref_pic(1), 2),
    ],
    [
        tap(bd_ref_pic(2), 22),
        tap(bd_ref_pic(2), 12),
        tap(bd_ref_pic(2), 2),
        tap(bd_ref_pic(3), 22),
    ],
];

/// Outer taps of filters 2, 4 and 6 (the only ones with non-zero outer taps), two bits each.
pub const VP8_OUTER_TAPS: [(usize, RegField, RegField); 3] = [
    (
        2,
        RegField::new(bd_ref_pic(3), 10, 2),
        RegField::new(bd_ref_pic(3), 8, 2),
    ),
    (
        4,
        RegField::new(bd_ref_pic(3), 6, 2),
        RegField::new(bd_ref_pic(3), 4, 2),
    ),
    (
        6,
        RegField::new(bd_ref_pic(3), 2, 2),
        RegField::new(bd_ref_pic(3), 0, 2),
    ),
];

/// Bus configuration written before every decode.
pub const CONFIG_DEFAULT: u32 = CONFIG_DEC_TIMEOUT_E
    | CONFIG_DEC_STRENDIAN_E
    | CONFIG_DEC_INSWAP32_E
    | CONFIG_DEC_STRSWAP32_E
    | CONFIG_DEC_OUTSWAP32_E
    | CONFIG_DEC_CLK_GATE_E
    | CONFIG_DEC_IN_ENDIAN
    | CONFIG_DEC_OUT_ENDIAN
    | config_dec_max_burst(16);
