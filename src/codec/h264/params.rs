// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! H.264 parameters consumed by the encoder and decoder backends.

use enumn::N;

use crate::codec::h264::cabac::CabacInitIdc;
use crate::codec::h264::rate_tables::MAX_QP;
use crate::VpuError;
use crate::VpuResult;

/// Maximum number of reference pictures in the decoded picture buffer.
pub const NUM_DPB_ENTRIES: usize = 16;
/// Maximum length of a reference picture list.
pub const MAX_REF_LIST_LEN: usize = 32;
/// Number of rate control checkpoints of the encoder.
pub const NUM_CHECKPOINTS: usize = 10;

fn unsupported<T: std::fmt::Display>(what: &str, value: T) -> VpuError {
    VpuError::UnsupportedParameter(format!("{} = {}", what, value))
}

#[derive(N, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameCodingType {
    #[default]
    Inter = 0,
    Intra = 1,
}

/// Per-frame encoding parameters, as decided by the rate controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeParams {
    pub frame_coding_type: FrameCodingType,
    /// Frame QP, and the bounds the hardware rate control may move it within.
    pub qp: u8,
    pub qp_min: u8,
    pub qp_max: u8,
    pub pic_init_qp: u8,
    pub frame_num: u16,
    pub idr_pic_id: u16,
    pub pps_id: u8,
    pub slice_alpha_offset: i8,
    pub slice_beta_offset: i8,
    pub chroma_qp_index_offset: i8,
    /// 0: filter on, 1: filter off, 2: filter off on slice edges.
    pub filter_disable: u8,
    /// Number of macroblock rows per slice, 0 for a single slice.
    pub slice_size_mb_rows: u8,
    pub inter4x4_disabled: bool,
    pub enable_cabac: bool,
    pub transform8x8_mode: bool,
    pub cabac_init_idc: u8,
    pub mad_qp_delta: i8,
    pub mad_threshold: u8,
    /// Distance between rate control checkpoints, in macroblocks. 0 disables them.
    pub cp_distance_mbs: u16,
    /// Target stream size at each checkpoint, in units of 32 bytes.
    pub cp_target: [u16; NUM_CHECKPOINTS],
    pub target_error: [i16; 6],
    pub delta_qp: [i8; 7],
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            frame_coding_type: FrameCodingType::Intra,
            qp: 26,
            qp_min: 0,
            qp_max: MAX_QP,
            pic_init_qp: 26,
            frame_num: 0,
            idr_pic_id: 0,
            pps_id: 0,
            slice_alpha_offset: 0,
            slice_beta_offset: 0,
            chroma_qp_index_offset: 0,
            filter_disable: 0,
            slice_size_mb_rows: 0,
            inter4x4_disabled: false,
            enable_cabac: false,
            transform8x8_mode: false,
            cabac_init_idc: 0,
            mad_qp_delta: 0,
            mad_threshold: 0,
            cp_distance_mbs: 0,
            cp_target: [0; NUM_CHECKPOINTS],
            target_error: [0; 6],
            delta_qp: [0; 7],
        }
    }
}

impl EncodeParams {
    pub fn cabac_init_idc(&self) -> VpuResult<CabacInitIdc> {
        CabacInitIdc::n(self.cabac_init_idc)
            .ok_or_else(|| unsupported("cabac_init_idc", self.cabac_init_idc))
    }

    pub fn validate(&self) -> VpuResult<()> {
        for (name, qp) in [
            ("qp", self.qp),
            ("qp_min", self.qp_min),
            ("qp_max", self.qp_max),
            ("pic_init_qp", self.pic_init_qp),
        ] {
            if qp > MAX_QP {
                return Err(unsupported(name, qp));
            }
        }
        if self.qp_min > self.qp_max {
            return Err(VpuError::UnsupportedParameter(format!(
                "qp_min {} above qp_max {}",
                self.qp_min, self.qp_max
            )));
        }
        if !(-6..=6).contains(&self.slice_alpha_offset) {
            return Err(unsupported("slice_alpha_offset", self.slice_alpha_offset));
        }
        if !(-6..=6).contains(&self.slice_beta_offset) {
            return Err(unsupported("slice_beta_offset", self.slice_beta_offset));
        }
        if !(-12..=12).contains(&self.chroma_qp_index_offset) {
            return Err(unsupported(
                "chroma_qp_index_offset",
                self.chroma_qp_index_offset,
            ));
        }
        if self.filter_disable > 2 {
            return Err(unsupported("filter_disable", self.filter_disable));
        }
        if !(-8..=7).contains(&self.mad_qp_delta) {
            return Err(unsupported("mad_qp_delta", self.mad_qp_delta));
        }
        if let Some(d) = self.delta_qp.iter().find(|d| !(-8..=7).contains(*d)) {
            return Err(unsupported("delta_qp", d));
        }
        self.cabac_init_idc()?;
        Ok(())
    }
}

/// Sequence parameter set fields the decoder needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sps {
    pub seq_parameter_set_id: u8,
    /// Profile to which the coded video sequence conforms
    pub profile_idc: u8,
    pub constraint_set3_flag: bool,
    /// Chroma sampling relative to luma: 0 is monochrome, 1 is 4:2:0, 2 is 4:2:2.
    pub chroma_format_idc: u8,
    pub bit_depth_luma_minus8: u8,
    pub bit_depth_chroma_minus8: u8,
    pub qpprime_y_zero_transform_bypass_flag: bool,
    pub log2_max_frame_num_minus4: u8,
    pub max_num_ref_frames: u8,
    pub pic_order_cnt_type: u8,
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    pub delta_pic_order_always_zero_flag: bool,
    pub pic_width_in_mbs_minus1: u16,
    pub pic_height_in_map_units_minus1: u16,
    pub frame_mbs_only_flag: bool,
    pub mb_adaptive_frame_field_flag: bool,
    pub direct_8x8_inference_flag: bool,
}

impl Sps {
    pub fn bit_depth_luma(&self) -> u32 {
        self.bit_depth_luma_minus8 as u32 + 8
    }

    pub fn width_in_mbs(&self) -> u32 {
        self.pic_width_in_mbs_minus1 as u32 + 1
    }

    /// Height of the frame in macroblocks. Field coded streams count map units per field.
    pub fn height_in_mbs(&self) -> u32 {
        let map_units = self.pic_height_in_map_units_minus1 as u32 + 1;
        if self.frame_mbs_only_flag {
            map_units
        } else {
            map_units * 2
        }
    }
}

/// Picture parameter set fields the decoder needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pps {
    pub pic_parameter_set_id: u8,
    pub seq_parameter_set_id: u8,
    /// CABAC when set, CAVLC otherwise.
    pub entropy_coding_mode_flag: bool,
    pub bottom_field_pic_order_in_frame_present_flag: bool,
    pub num_ref_idx_l0_default_active_minus1: u8,
    pub num_ref_idx_l1_default_active_minus1: u8,
    pub weighted_pred_flag: bool,
    pub weighted_bipred_idc: u8,
    pub pic_init_qp_minus26: i8,
    pub pic_init_qs_minus26: i8,
    pub chroma_qp_index_offset: i8,
    pub deblocking_filter_control_present_flag: bool,
    pub constrained_intra_pred_flag: bool,
    pub redundant_pic_cnt_present_flag: bool,
    pub transform_8x8_mode_flag: bool,
    pub second_chroma_qp_index_offset: i8,
    /// Whether the scaling lists of [`ScalingMatrix`] apply to this picture.
    pub pic_scaling_matrix_present_flag: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScalingMatrix {
    pub scaling_list_4x4: [[u8; 16]; 6],
    pub scaling_list_8x8: [[u8; 64]; 2],
}

impl Default for ScalingMatrix {
    fn default() -> Self {
        Self {
            scaling_list_4x4: [[16; 16]; 6],
            scaling_list_8x8: [[16; 64]; 2],
        }
    }
}

/// Which fields of a reference frame are used for reference.
pub const FIELD_TOP: u8 = 1;
pub const FIELD_BOTTOM: u8 = 2;
pub const FIELD_FRAME: u8 = FIELD_TOP | FIELD_BOTTOM;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DpbEntry {
    /// Index of the destination buffer holding this picture.
    pub buf_index: u32,
    pub frame_num: u16,
    pub pic_num: u32,
    pub top_field_order_cnt: i32,
    pub bottom_field_order_cnt: i32,
    /// The entry holds a picture.
    pub active: bool,
    pub long_term: bool,
    /// The picture was coded as a field pair.
    pub field: bool,
    /// Combination of [`FIELD_TOP`] and [`FIELD_BOTTOM`].
    pub fields: u8,
}

/// One entry of a reference picture list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefListEntry {
    /// Index into the DPB.
    pub index: u8,
    pub bottom_field: bool,
}

/// Per-picture decoding parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeParams {
    pub sps: Sps,
    pub pps: Pps,
    pub scaling_matrix: ScalingMatrix,
    pub dpb: [DpbEntry; NUM_DPB_ENTRIES],
    pub top_field_order_cnt: i32,
    pub bottom_field_order_cnt: i32,
    pub idr_pic_flag: bool,
    /// Initial reference lists for P slices, and for the two lists of B slices.
    pub ref_pic_list_p0: Vec<RefListEntry>,
    pub ref_pic_list_b0: Vec<RefListEntry>,
    pub ref_pic_list_b1: Vec<RefListEntry>,
}

impl DecodeParams {
    pub fn validate(&self) -> VpuResult<()> {
        if self.sps.bit_depth_luma_minus8 > 2 {
            return Err(unsupported(
                "bit_depth_luma_minus8",
                self.sps.bit_depth_luma_minus8,
            ));
        }
        if self.sps.bit_depth_chroma_minus8 > 2 {
            return Err(unsupported(
                "bit_depth_chroma_minus8",
                self.sps.bit_depth_chroma_minus8,
            ));
        }
        if self.sps.chroma_format_idc > 2 {
            return Err(unsupported(
                "chroma_format_idc",
                self.sps.chroma_format_idc,
            ));
        }
        if self.sps.max_num_ref_frames as usize > NUM_DPB_ENTRIES {
            return Err(unsupported(
                "max_num_ref_frames",
                self.sps.max_num_ref_frames,
            ));
        }
        for list in [
            &self.ref_pic_list_p0,
            &self.ref_pic_list_b0,
            &self.ref_pic_list_b1,
        ] {
            if list.len() > MAX_REF_LIST_LEN {
                return Err(unsupported("reference list length", list.len()));
            }
            if let Some(e) = list.iter().find(|e| e.index as usize >= NUM_DPB_ENTRIES) {
                return Err(unsupported("reference list entry", e.index));
            }
        }
        Ok(())
    }
}
