// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! H.264 decoding on the RKVDEC block.
//!
//! The hardware reads everything but the addresses from one private table: the CABAC context
//! initialization values, the scaling lists, the picture order counts, the reference picture set
//! record and a 256-entry array of SPS/PPS packets indexed by PPS id. [`H264dContext::prepare`]
//! packs the table, [`H264dContext::program`] writes the strides, the DPB addresses and the table
//! pointers.

use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::aux_buf::AuxBuffer;
use crate::aux_buf::AuxBufferPool;
use crate::backend::Programmed;
use crate::backend::StartWrite;
use crate::bitstream_utils::TableWriter;
use crate::bitstream_utils::TableWriterResult;
use crate::codec::h264::cabac::DEC_TABLE;
use crate::codec::h264::cabac::DEC_TABLE_SIZE;
use crate::codec::h264::params::DecodeParams;
use crate::codec::h264::params::RefListEntry;
use crate::codec::h264::params::FIELD_BOTTOM;
use crate::codec::h264::params::FIELD_TOP;
use crate::codec::h264::params::NUM_DPB_ENTRIES;
use crate::regs::rkvdec;
use crate::regs::RegisterBlock;
use crate::utils::align_up;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

pub const SCALING_LIST_SIZE: usize = 6 * 16 + 2 * 64;
/// Top and bottom POC of the 16 DPB entries, then of the current picture.
pub const NUM_POC: usize = 2 * NUM_DPB_ENTRIES + 2;
pub const RPS_SIZE: usize = 512;
pub const PARAM_SET_SIZE: usize = 32;
pub const NUM_PARAM_SETS: usize = 256;

/// Byte offsets of the sections of the private table.
pub const CABAC_OFFSET: usize = 0;
pub const SCALING_LIST_OFFSET: usize = CABAC_OFFSET + DEC_TABLE_SIZE;
pub const POC_OFFSET: usize = (SCALING_LIST_OFFSET + SCALING_LIST_SIZE).next_multiple_of(16);
pub const RPS_OFFSET: usize = (POC_OFFSET + NUM_POC * 4).next_multiple_of(16);
pub const PARAM_SET_OFFSET: usize = (RPS_OFFSET + RPS_SIZE).next_multiple_of(16);
pub const PRIV_TBL_SIZE: usize = PARAM_SET_OFFSET + NUM_PARAM_SETS * PARAM_SET_SIZE;

/// Bit position and width of a field inside a parameter set packet.
#[derive(Clone, Copy)]
struct PsField(usize, usize);

const SEQ_PARAMETER_SET_ID: PsField = PsField(0, 4);
const PROFILE_IDC: PsField = PsField(4, 8);
const CONSTRAINT_SET3_FLAG: PsField = PsField(12, 1);
const CHROMA_FORMAT_IDC: PsField = PsField(13, 2);
const BIT_DEPTH_LUMA: PsField = PsField(15, 3);
const BIT_DEPTH_CHROMA: PsField = PsField(18, 3);
const QPPRIME_Y_ZERO_TRANSFORM_BYPASS_FLAG: PsField = PsField(21, 1);
const LOG2_MAX_FRAME_NUM_MINUS4: PsField = PsField(22, 4);
const MAX_NUM_REF_FRAMES: PsField = PsField(26, 5);
const PIC_ORDER_CNT_TYPE: PsField = PsField(31, 2);
const LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4: PsField = PsField(33, 4);
const DELTA_PIC_ORDER_ALWAYS_ZERO_FLAG: PsField = PsField(37, 1);
const PIC_WIDTH_IN_MBS: PsField = PsField(38, 9);
const PIC_HEIGHT_IN_MBS: PsField = PsField(47, 9);
const FRAME_MBS_ONLY_FLAG: PsField = PsField(56, 1);
const MB_ADAPTIVE_FRAME_FIELD_FLAG: PsField = PsField(57, 1);
const DIRECT_8X8_INFERENCE_FLAG: PsField = PsField(58, 1);
const PIC_PARAMETER_SET_ID: PsField = PsField(128, 8);
const PPS_SEQ_PARAMETER_SET_ID: PsField = PsField(136, 5);
const ENTROPY_CODING_MODE_FLAG: PsField = PsField(141, 1);
const BOTTOM_FIELD_PIC_ORDER_IN_FRAME_PRESENT_FLAG: PsField = PsField(142, 1);
const NUM_REF_IDX_L0_DEFAULT_ACTIVE_MINUS1: PsField = PsField(143, 5);
const NUM_REF_IDX_L1_DEFAULT_ACTIVE_MINUS1: PsField = PsField(148, 5);
const WEIGHTED_PRED_FLAG: PsField = PsField(153, 1);
const WEIGHTED_BIPRED_IDC: PsField = PsField(154, 2);
const PIC_INIT_QP_MINUS26: PsField = PsField(156, 7);
const PIC_INIT_QS_MINUS26: PsField = PsField(163, 6);
const CHROMA_QP_INDEX_OFFSET: PsField = PsField(169, 5);
const DEBLOCKING_FILTER_CONTROL_PRESENT_FLAG: PsField = PsField(174, 1);
const CONSTRAINED_INTRA_PRED_FLAG: PsField = PsField(175, 1);
const REDUNDANT_PIC_CNT_PRESENT: PsField = PsField(176, 1);
const TRANSFORM_8X8_MODE_FLAG: PsField = PsField(177, 1);
const SECOND_CHROMA_QP_INDEX_OFFSET: PsField = PsField(178, 5);
const SCALING_LIST_ENABLE_FLAG: PsField = PsField(183, 1);
const SCALING_LIST_ADDRESS: PsField = PsField(184, 32);
const fn is_long_term(i: usize) -> PsField {
    PsField(216 + i, 1)
}

/// Frame number of DPB entry `i` in the RPS record.
const fn rps_frame_num(i: usize) -> PsField {
    PsField(i * 16, 16)
}
const fn rps_dpb_info(i: usize, list: usize) -> PsField {
    PsField(288 + list * 32 * 7 + i * 7, 5)
}
const fn rps_bottom_flag(i: usize, list: usize) -> PsField {
    PsField(288 + list * 32 * 7 + i * 7 + 5, 1)
}
const RPS_DPB_VALID: u32 = 1 << 4;
/// Frame number marking an unused DPB entry.
const RPS_INVALID_FRAME_NUM: u32 = 0xffff;

fn put(w: &mut TableWriter, field: PsField, value: u32) -> TableWriterResult<()> {
    w.write_at(field.0, field.1, value)
}

/// Two's complement of `value` truncated to the width of `field`.
fn put_signed(w: &mut TableWriter, field: PsField, value: i8) -> TableWriterResult<()> {
    let mask = (1u32 << field.1) - 1;
    w.write_at(field.0, field.1, (value as i32 as u32) & mask)
}

/// Rejects parameter set values that do not fit their field of the packet. Legal H.264 values
/// can still be too wide for the hardware, e.g. SPS ids above 15.
fn check_param_set(params: &DecodeParams) -> VpuResult<()> {
    let sps = &params.sps;
    let pps = &params.pps;

    let unsigned = [
        ("seq_parameter_set_id", SEQ_PARAMETER_SET_ID, sps.seq_parameter_set_id as u32),
        ("profile_idc", PROFILE_IDC, sps.profile_idc as u32),
        ("chroma_format_idc", CHROMA_FORMAT_IDC, sps.chroma_format_idc as u32),
        ("bit_depth_luma_minus8", BIT_DEPTH_LUMA, sps.bit_depth_luma_minus8 as u32),
        ("bit_depth_chroma_minus8", BIT_DEPTH_CHROMA, sps.bit_depth_chroma_minus8 as u32),
        (
            "log2_max_frame_num_minus4",
            LOG2_MAX_FRAME_NUM_MINUS4,
            sps.log2_max_frame_num_minus4 as u32,
        ),
        ("max_num_ref_frames", MAX_NUM_REF_FRAMES, sps.max_num_ref_frames as u32),
        ("pic_order_cnt_type", PIC_ORDER_CNT_TYPE, sps.pic_order_cnt_type as u32),
        (
            "log2_max_pic_order_cnt_lsb_minus4",
            LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4,
            sps.log2_max_pic_order_cnt_lsb_minus4 as u32,
        ),
        ("pic_width_in_mbs", PIC_WIDTH_IN_MBS, sps.width_in_mbs()),
        (
            "pic_height_in_map_units",
            PIC_HEIGHT_IN_MBS,
            sps.pic_height_in_map_units_minus1 as u32 + 1,
        ),
        ("pic_parameter_set_id", PIC_PARAMETER_SET_ID, pps.pic_parameter_set_id as u32),
        (
            "pps seq_parameter_set_id",
            PPS_SEQ_PARAMETER_SET_ID,
            pps.seq_parameter_set_id as u32,
        ),
        (
            "num_ref_idx_l0_default_active_minus1",
            NUM_REF_IDX_L0_DEFAULT_ACTIVE_MINUS1,
            pps.num_ref_idx_l0_default_active_minus1 as u32,
        ),
        (
            "num_ref_idx_l1_default_active_minus1",
            NUM_REF_IDX_L1_DEFAULT_ACTIVE_MINUS1,
            pps.num_ref_idx_l1_default_active_minus1 as u32,
        ),
        ("weighted_bipred_idc", WEIGHTED_BIPRED_IDC, pps.weighted_bipred_idc as u32),
    ];
    for (name, field, value) in unsigned {
        if value >> field.1 != 0 {
            return Err(VpuError::UnsupportedParameter(format!(
                "{} = {} does not fit in {} bits",
                name, value, field.1
            )));
        }
    }

    let signed = [
        ("pic_init_qp_minus26", PIC_INIT_QP_MINUS26, pps.pic_init_qp_minus26),
        ("pic_init_qs_minus26", PIC_INIT_QS_MINUS26, pps.pic_init_qs_minus26),
        ("chroma_qp_index_offset", CHROMA_QP_INDEX_OFFSET, pps.chroma_qp_index_offset),
        (
            "second_chroma_qp_index_offset",
            SECOND_CHROMA_QP_INDEX_OFFSET,
            pps.second_chroma_qp_index_offset,
        ),
    ];
    for (name, field, value) in signed {
        let half = 1i32 << (field.1 - 1);
        if !(-half..half).contains(&(value as i32)) {
            return Err(VpuError::UnsupportedParameter(format!(
                "{} = {} does not fit in {} signed bits",
                name, value, field.1
            )));
        }
    }
    Ok(())
}

/// Packs the SPS/PPS packet of one picture into `out`.
pub fn pack_param_set(
    params: &DecodeParams,
    scaling_list_addr: u32,
    out: &mut [u8],
) -> TableWriterResult<()> {
    let sps = &params.sps;
    let pps = &params.pps;
    out.fill(0);
    let mut w = TableWriter::new(out);

    put(&mut w, SEQ_PARAMETER_SET_ID, sps.seq_parameter_set_id as u32)?;
    put(&mut w, PROFILE_IDC, sps.profile_idc as u32)?;
    put(&mut w, CONSTRAINT_SET3_FLAG, sps.constraint_set3_flag as u32)?;
    put(&mut w, CHROMA_FORMAT_IDC, sps.chroma_format_idc as u32)?;
    put(&mut w, BIT_DEPTH_LUMA, sps.bit_depth_luma_minus8 as u32)?;
    put(&mut w, BIT_DEPTH_CHROMA, sps.bit_depth_chroma_minus8 as u32)?;
    put(
        &mut w,
        QPPRIME_Y_ZERO_TRANSFORM_BYPASS_FLAG,
        sps.qpprime_y_zero_transform_bypass_flag as u32,
    )?;
    put(
        &mut w,
        LOG2_MAX_FRAME_NUM_MINUS4,
        sps.log2_max_frame_num_minus4 as u32,
    )?;
    put(&mut w, MAX_NUM_REF_FRAMES, sps.max_num_ref_frames as u32)?;
    put(&mut w, PIC_ORDER_CNT_TYPE, sps.pic_order_cnt_type as u32)?;
    put(
        &mut w,
        LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4,
        sps.log2_max_pic_order_cnt_lsb_minus4 as u32,
    )?;
    put(
        &mut w,
        DELTA_PIC_ORDER_ALWAYS_ZERO_FLAG,
        sps.delta_pic_order_always_zero_flag as u32,
    )?;
    // The packet takes map units, like the SPS.
    put(&mut w, PIC_WIDTH_IN_MBS, sps.width_in_mbs())?;
    put(
        &mut w,
        PIC_HEIGHT_IN_MBS,
        sps.pic_height_in_map_units_minus1 as u32 + 1,
    )?;
    put(&mut w, FRAME_MBS_ONLY_FLAG, sps.frame_mbs_only_flag as u32)?;
    put(
        &mut w,
        MB_ADAPTIVE_FRAME_FIELD_FLAG,
        sps.mb_adaptive_frame_field_flag as u32,
    )?;
    put(
        &mut w,
        DIRECT_8X8_INFERENCE_FLAG,
        sps.direct_8x8_inference_flag as u32,
    )?;

    put(&mut w, PIC_PARAMETER_SET_ID, pps.pic_parameter_set_id as u32)?;
    put(
        &mut w,
        PPS_SEQ_PARAMETER_SET_ID,
        pps.seq_parameter_set_id as u32,
    )?;
    put(
        &mut w,
        ENTROPY_CODING_MODE_FLAG,
        pps.entropy_coding_mode_flag as u32,
    )?;
    put(
        &mut w,
        BOTTOM_FIELD_PIC_ORDER_IN_FRAME_PRESENT_FLAG,
        pps.bottom_field_pic_order_in_frame_present_flag as u32,
    )?;
    put(
        &mut w,
        NUM_REF_IDX_L0_DEFAULT_ACTIVE_MINUS1,
        pps.num_ref_idx_l0_default_active_minus1 as u32,
    )?;
    put(
        &mut w,
        NUM_REF_IDX_L1_DEFAULT_ACTIVE_MINUS1,
        pps.num_ref_idx_l1_default_active_minus1 as u32,
    )?;
    put(&mut w, WEIGHTED_PRED_FLAG, pps.weighted_pred_flag as u32)?;
    put(&mut w, WEIGHTED_BIPRED_IDC, pps.weighted_bipred_idc as u32)?;
    put_signed(&mut w, PIC_INIT_QP_MINUS26, pps.pic_init_qp_minus26)?;
    put_signed(&mut w, PIC_INIT_QS_MINUS26, pps.pic_init_qs_minus26)?;
    put_signed(&mut w, CHROMA_QP_INDEX_OFFSET, pps.chroma_qp_index_offset)?;
    put(
        &mut w,
        DEBLOCKING_FILTER_CONTROL_PRESENT_FLAG,
        pps.deblocking_filter_control_present_flag as u32,
    )?;
    put(
        &mut w,
        CONSTRAINED_INTRA_PRED_FLAG,
        pps.constrained_intra_pred_flag as u32,
    )?;
    put(
        &mut w,
        REDUNDANT_PIC_CNT_PRESENT,
        pps.redundant_pic_cnt_present_flag as u32,
    )?;
    put(
        &mut w,
        TRANSFORM_8X8_MODE_FLAG,
        pps.transform_8x8_mode_flag as u32,
    )?;
    put_signed(
        &mut w,
        SECOND_CHROMA_QP_INDEX_OFFSET,
        pps.second_chroma_qp_index_offset,
    )?;
    put(
        &mut w,
        SCALING_LIST_ENABLE_FLAG,
        pps.pic_scaling_matrix_present_flag as u32,
    )?;
    put(&mut w, SCALING_LIST_ADDRESS, scaling_list_addr)?;

    for (i, entry) in params.dpb.iter().enumerate() {
        put(&mut w, is_long_term(i), entry.long_term as u32)?;
    }
    Ok(())
}

/// Packs the reference picture set record: the frame number of each DPB entry and the three
/// initial reference lists (P, B0, B1).
pub fn pack_rps(params: &DecodeParams, out: &mut [u8]) -> TableWriterResult<()> {
    out.fill(0);
    let mut w = TableWriter::new(out);

    for (i, entry) in params.dpb.iter().enumerate() {
        let frame_num = if !entry.active {
            RPS_INVALID_FRAME_NUM
        } else if entry.long_term {
            entry.pic_num & 0xffff
        } else {
            entry.frame_num as u32
        };
        put(&mut w, rps_frame_num(i), frame_num)?;
    }

    let lists: [&[RefListEntry]; 3] = [
        &params.ref_pic_list_p0,
        &params.ref_pic_list_b0,
        &params.ref_pic_list_b1,
    ];
    for (list, entries) in lists.iter().enumerate() {
        for (i, entry) in entries.iter().enumerate() {
            let idx = entry.index as usize;
            let Some(dpb) = params.dpb.get(idx) else {
                continue;
            };
            let valid = if dpb.active { RPS_DPB_VALID } else { 0 };
            put(&mut w, rps_dpb_info(i, list), idx as u32 | valid)?;
            put(&mut w, rps_bottom_flag(i, list), entry.bottom_field as u32)?;
        }
    }
    Ok(())
}

/// Buffers and parameters of one H.264 decode.
#[derive(Clone, Debug)]
pub struct H264dRun {
    /// Bus address of the slice data of the picture.
    pub src: u32,
    pub src_len: u32,
    pub dst: u32,
    pub params: Box<DecodeParams>,
}

/// Line and plane strides of the decoded picture, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strides {
    pub hor: u32,
    pub ver: u32,
    pub y: u32,
    pub yuv: u32,
}

impl Strides {
    pub fn new(format: &FrameFormat, bit_depth: u32, chroma_format_idc: u8) -> Self {
        let hor = align_up(bit_depth * format.coded.width / 8, 256) | 256;
        let ver = align_up(format.coded.height, 16);
        let y = hor * ver;
        let yuv = match chroma_format_idc {
            0 => y,
            1 => y + y / 2,
            _ => 2 * y,
        };
        Self { hor, ver, y, yuv }
    }
}

pub struct H264dContext {
    priv_tbl: AuxBuffer,
}

impl H264dContext {
    pub fn init(pool: &AuxBufferPool, _format: &FrameFormat) -> VpuResult<Self> {
        let [priv_tbl] = pool.allocate_set([("h264d priv_tbl", PRIV_TBL_SIZE)])?;
        Ok(Self { priv_tbl })
    }

    pub fn exit(self, pool: &AuxBufferPool) {
        pool.free_set([self.priv_tbl]);
    }

    pub fn validate(&self, format: &FrameFormat, run: &H264dRun) -> VpuResult<()> {
        let params = &run.params;
        params.validate()?;
        check_param_set(params)?;

        let sps = &params.sps;
        if sps.width_in_mbs() > format.coded.mb_width()
            || sps.height_in_mbs() > format.coded.mb_height()
        {
            return Err(VpuError::UnsupportedParameter(format!(
                "picture of {}x{} macroblocks in a {}x{} session",
                sps.width_in_mbs(),
                sps.height_in_mbs(),
                format.coded.width,
                format.coded.height
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

    pub fn prepare(&mut self, _format: &FrameFormat, run: &H264dRun) -> VpuResult<()> {
        let params = &run.params;
        let scaling_list_addr = self.priv_tbl.dma() + SCALING_LIST_OFFSET as u32;
        let tbl = self.priv_tbl.cpu_mut();

        LittleEndian::write_u32_into(
            &DEC_TABLE,
            &mut tbl[CABAC_OFFSET..CABAC_OFFSET + DEC_TABLE.len() * 4],
        );

        let scaling = &mut tbl[SCALING_LIST_OFFSET..SCALING_LIST_OFFSET + SCALING_LIST_SIZE];
        let (list_4x4, list_8x8) = scaling.split_at_mut(6 * 16);
        for (dst, src) in list_4x4
            .chunks_exact_mut(16)
            .zip(&params.scaling_matrix.scaling_list_4x4)
        {
            dst.copy_from_slice(src);
        }
        for (dst, src) in list_8x8
            .chunks_exact_mut(64)
            .zip(&params.scaling_matrix.scaling_list_8x8)
        {
            dst.copy_from_slice(src);
        }

        let mut poc = [0i32; NUM_POC];
        for (i, entry) in params.dpb.iter().enumerate() {
            poc[2 * i] = entry.top_field_order_cnt;
            poc[2 * i + 1] = entry.bottom_field_order_cnt;
        }
        poc[NUM_POC - 2] = params.top_field_order_cnt;
        poc[NUM_POC - 1] = params.bottom_field_order_cnt;
        LittleEndian::write_i32_into(&poc, &mut tbl[POC_OFFSET..POC_OFFSET + NUM_POC * 4]);

        pack_rps(params, &mut tbl[RPS_OFFSET..RPS_OFFSET + RPS_SIZE])?;

        let packet = PARAM_SET_OFFSET + params.pps.pic_parameter_set_id as usize * PARAM_SET_SIZE;
        pack_param_set(
            params,
            scaling_list_addr,
            &mut tbl[packet..packet + PARAM_SET_SIZE],
        )?;
        Ok(())
    }

    /// Address of the picture held by DPB entry `i`, falling back to the destination when the
    /// entry is unused or its buffer index is out of range. The flag is set on a fallback for an
    /// active entry.
    fn dpb_addr(run: &H264dRun, i: usize, dst_buffers: &[u32]) -> (u32, bool) {
        let entry = &run.params.dpb[i];
        if !entry.active {
            return (run.dst, false);
        }
        match dst_buffers.get(entry.buf_index as usize) {
            Some(&addr) => (addr, false),
            None => {
                log::warn!(
                    "dpb[{}] refers to buffer {} of {}, using the destination",
                    i,
                    entry.buf_index,
                    dst_buffers.len()
                );
                (run.dst, true)
            }
        }
    }

    pub fn program(
        &mut self,
        regs: &RegisterBlock,
        format: &FrameFormat,
        run: &H264dRun,
        dst_buffers: &[u32],
    ) -> Programmed {
        let params = &run.params;
        let sps = &params.sps;
        let tbl = self.priv_tbl.dma();

        regs.write(rkvdec::SYSCTRL, rkvdec::mode(rkvdec::MODE_H264));

        let strides = Strides::new(format, sps.bit_depth_luma(), sps.chroma_format_idc);
        regs.write(
            rkvdec::PICPAR,
            rkvdec::y_hor_virstride(strides.hor / 16)
                | rkvdec::uv_hor_virstride(strides.hor / 16)
                | rkvdec::SLICE_NUM_HIGHBIT
                | rkvdec::slice_num_lowbits(0x7ff),
        );

        regs.write(rkvdec::STRM_RLC_BASE, run.src);
        regs.write(rkvdec::RLCWRITE_BASE, run.src);
        regs.write(rkvdec::STRM_LEN, rkvdec::strm_len(run.src_len));
        regs.write(rkvdec::CABACTBL_PROB_BASE, tbl + CABAC_OFFSET as u32);
        regs.write(rkvdec::DECOUT_BASE, run.dst);
        regs.write(rkvdec::Y_VIRSTRIDE, rkvdec::y_virstride(strides.y / 16));
        regs.write(rkvdec::YUV_VIRSTRIDE, rkvdec::yuv_virstride(strides.yuv / 16));

        let mut dpb_fallbacks = 0;
        for (i, entry) in params.dpb.iter().enumerate() {
            let (mut addr, fallback) = Self::dpb_addr(run, i, dst_buffers);
            dpb_fallbacks += fallback as u32;

            if entry.active {
                addr |= rkvdec::COLMV_USED_FLAG_REF;
            }
            if entry.field {
                addr |= rkvdec::FIELD_REF;
            }
            if entry.fields & FIELD_TOP != 0 {
                addr |= rkvdec::TOPFIELD_USED_REF;
            }
            if entry.fields & FIELD_BOTTOM != 0 {
                addr |= rkvdec::BOTFIELD_USED_REF;
            }
            regs.write(rkvdec::h264_base_refer(i), addr);
            regs.write(
                rkvdec::h264_poc_refer(2 * i),
                entry.top_field_order_cnt as u32,
            );
            regs.write(
                rkvdec::h264_poc_refer(2 * i + 1),
                entry.bottom_field_order_cnt as u32,
            );
        }
        regs.write(rkvdec::CUR_POC0, params.top_field_order_cnt as u32);
        regs.write(rkvdec::CUR_POC1, params.bottom_field_order_cnt as u32);

        regs.write(rkvdec::PPS_BASE, tbl + PARAM_SET_OFFSET as u32);
        regs.write(rkvdec::RPS_BASE, tbl + RPS_OFFSET as u32);
        regs.write(rkvdec::AXI_DDR_RDATA, 0);
        regs.write(rkvdec::AXI_DDR_WDATA, 0);
        regs.write(rkvdec::STRMD_ERROR_EN, 0);

        regs.write(rkvdec::PREF_LUMA_CACHE_COMMAND, 1);
        regs.write(rkvdec::PREF_CHROMA_CACHE_COMMAND, 1);

        log::debug!(
            "h264d run: {}x{} mbs, strides {:?}, src {:#010x} len {}",
            sps.width_in_mbs(),
            sps.height_in_mbs(),
            strides,
            run.src,
            run.src_len
        );

        Programmed {
            start: StartWrite {
                offset: rkvdec::INTERRUPT,
                value: rkvdec::START,
            },
            dpb_fallbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::aux_buf::HeapAllocator;
    use crate::codec::h264::params::DpbEntry;
    use crate::codec::h264::params::FIELD_FRAME;
    use crate::regs::MemoryRegion;
    use crate::PixelFormat;

    fn setup() -> (Arc<MemoryRegion>, RegisterBlock, AuxBufferPool, FrameFormat) {
        let region = Arc::new(MemoryRegion::new(rkvdec::WINDOW_SIZE));
        let regs = RegisterBlock::new("rkvdec", region.clone());
        let pool = AuxBufferPool::new(Arc::new(HeapAllocator::new()));
        let format = FrameFormat::new(1920, 1080, PixelFormat::NV12);
        (region, regs, pool, format)
    }

    fn run() -> H264dRun {
        let mut params = DecodeParams::default();
        params.sps.profile_idc = 100;
        params.sps.chroma_format_idc = 1;
        params.sps.pic_width_in_mbs_minus1 = 119;
        params.sps.pic_height_in_map_units_minus1 = 67;
        params.sps.frame_mbs_only_flag = true;
        params.pps.pic_parameter_set_id = 3;
        params.pps.pic_init_qp_minus26 = -3;
        params.top_field_order_cnt = 8;
        params.bottom_field_order_cnt = 9;
        params.dpb[0] = DpbEntry {
            buf_index: 1,
            frame_num: 5,
            top_field_order_cnt: 4,
            bottom_field_order_cnt: 5,
            active: true,
            fields: FIELD_FRAME,
            ..Default::default()
        };
        params.ref_pic_list_p0 = vec![RefListEntry {
            index: 0,
            bottom_field: false,
        }];
        H264dRun {
            src: 0x1000_0000,
            src_len: 0x8000,
            dst: 0x2000_0000,
            params: Box::new(params),
        }
    }

    #[test]
    fn test_strides_1080p() {
        let format = FrameFormat::new(1920, 1080, PixelFormat::NV12);
        let s = Strides::new(&format, 8, 1);
        assert_eq!(s.hor, 2304);
        assert_eq!(s.ver, 1088);
        assert_eq!(s.y, 2304 * 1088);
        assert_eq!(s.yuv, 2304 * 1088 * 3 / 2);

        assert_eq!(Strides::new(&format, 8, 0).yuv, s.y);
        assert_eq!(Strides::new(&format, 8, 2).yuv, 2 * s.y);
    }

    #[test]
    fn test_program_registers() {
        let (region, regs, pool, format) = setup();
        let mut ctx = H264dContext::init(&pool, &format).unwrap();
        let run = run();
        ctx.validate(&format, &run).unwrap();
        ctx.prepare(&format, &run).unwrap();
        let programmed = ctx.program(&regs, &format, &run, &[0x3000_0000, 0x3100_0000]);

        assert_eq!(programmed.dpb_fallbacks, 0);
        assert_eq!(programmed.start.offset, rkvdec::INTERRUPT);
        assert_eq!(programmed.start.value, rkvdec::START);
        assert!(region.write_log().iter().all(|w| !w.barriered));

        assert_eq!(regs.read(rkvdec::PICPAR) & 0x1ff, 2304 / 16);
        assert_eq!(regs.read(rkvdec::Y_VIRSTRIDE), 2304 * 1088 / 16);
        assert_eq!(regs.read(rkvdec::STRM_LEN), 0x8000);
        assert_eq!(regs.read(rkvdec::DECOUT_BASE), 0x2000_0000);

        let ref0 = regs.read(rkvdec::h264_base_refer(0));
        assert_eq!(ref0 & !0xf, 0x3100_0000);
        assert_ne!(ref0 & rkvdec::COLMV_USED_FLAG_REF, 0);
        assert_ne!(ref0 & rkvdec::TOPFIELD_USED_REF, 0);
        assert_ne!(ref0 & rkvdec::BOTFIELD_USED_REF, 0);
        assert_eq!(ref0 & rkvdec::FIELD_REF, 0);
        // Unused entries point at the destination without flags.
        assert_eq!(regs.read(rkvdec::h264_base_refer(15)), 0x2000_0000);

        assert_eq!(regs.read(rkvdec::h264_poc_refer(1)), 5);
        assert_eq!(regs.read(rkvdec::CUR_POC0), 8);
        assert_eq!(regs.read(rkvdec::CUR_POC1), 9);
        ctx.exit(&pool);
    }

    #[test]
    fn test_out_of_range_dpb_uses_destination() {
        let (_region, regs, pool, format) = setup();
        let mut ctx = H264dContext::init(&pool, &format).unwrap();
        let mut run = run();
        run.params.dpb[0].buf_index = 7;
        ctx.prepare(&format, &run).unwrap();
        let programmed = ctx.program(&regs, &format, &run, &[0x3000_0000, 0x3100_0000]);

        assert_eq!(programmed.dpb_fallbacks, 1);
        assert_eq!(regs.read(rkvdec::h264_base_refer(0)) & !0xf, 0x2000_0000);
        ctx.exit(&pool);
    }

    #[test]
    fn test_priv_table() {
        let (_region, _regs, pool, format) = setup();
        let mut ctx = H264dContext::init(&pool, &format).unwrap();
        let mut run = run();
        run.params.scaling_matrix.scaling_list_8x8[1][63] = 77;
        ctx.prepare(&format, &run).unwrap();
        let tbl = ctx.priv_tbl.cpu();

        assert_eq!(LittleEndian::read_u32(&tbl[..4]), DEC_TABLE[0]);
        assert_eq!(tbl[SCALING_LIST_OFFSET], 16);
        assert_eq!(tbl[SCALING_LIST_OFFSET + SCALING_LIST_SIZE - 1], 77);
        assert_eq!(LittleEndian::read_i32(&tbl[POC_OFFSET + 4..]), 5);
        assert_eq!(LittleEndian::read_i32(&tbl[POC_OFFSET + 33 * 4..]), 9);

        // DPB 0 holds frame 5, entry 1 is unused.
        let rps = &tbl[RPS_OFFSET..];
        assert_eq!(LittleEndian::read_u16(rps), 5);
        assert_eq!(LittleEndian::read_u16(&rps[2..]), 0xffff);
        // First P list entry: DPB 0, valid.
        assert_eq!(rps[36] & 0x1f, 0x10);

        let ps = &tbl[PARAM_SET_OFFSET + 3 * PARAM_SET_SIZE..][..PARAM_SET_SIZE];
        assert_eq!((LittleEndian::read_u32(ps) >> 4) & 0xff, 100);
        assert_eq!(ps[16], 3);
        // pic_init_qp_minus26 = -3 in 7 bits at bit 156.
        let qp = (LittleEndian::read_u32(&ps[16..]) >> 28) | ((ps[20] as u32 & 0x7) << 4);
        assert_eq!(qp, 0x7d);
        // The scaling list address starts at bit 184, byte 23.
        assert_eq!(
            LittleEndian::read_u32(&ps[23..]),
            ctx.priv_tbl.dma() + SCALING_LIST_OFFSET as u32
        );
        ctx.exit(&pool);
    }

    #[test]
    fn test_validate() {
        let (_region, _regs, pool, format) = setup();
        let ctx = H264dContext::init(&pool, &format).unwrap();
        let mut run = run();
        run.params.sps.pic_width_in_mbs_minus1 = 120;
        assert!(ctx.validate(&format, &run).is_err());

        let mut run = self::run();
        run.src_len = 1 << 27;
        assert!(ctx.validate(&format, &run).is_err());
        ctx.exit(&pool);
    }

    #[test]
    fn test_validate_rejects_fields_wider_than_packet() {
        let (_region, _regs, pool, format) = setup();
        let mut ctx = H264dContext::init(&pool, &format).unwrap();

        // SPS ids up to 31 are legal H.264, the packet holds 4 bits.
        let mut run = run();
        run.params.sps.seq_parameter_set_id = 15;
        ctx.validate(&format, &run).unwrap();
        run.params.sps.seq_parameter_set_id = 20;
        assert!(matches!(
            ctx.validate(&format, &run),
            Err(VpuError::UnsupportedParameter(_))
        ));
        // Without the check the overflow would only surface while packing the tables.
        assert!(matches!(
            ctx.prepare(&format, &run),
            Err(VpuError::Table(_))
        ));

        let mut run = self::run();
        run.params.pps.pic_init_qs_minus26 = -32;
        ctx.validate(&format, &run).unwrap();
        run.params.pps.pic_init_qs_minus26 = -33;
        assert!(matches!(
            ctx.validate(&format, &run),
            Err(VpuError::UnsupportedParameter(_))
        ));

        let mut run = self::run();
        run.params.pps.weighted_bipred_idc = 4;
        assert!(ctx.validate(&format, &run).is_err());

        let mut run = self::run();
        run.params.sps.log2_max_frame_num_minus4 = 16;
        assert!(ctx.validate(&format, &run).is_err());
        ctx.exit(&pool);
    }
}
