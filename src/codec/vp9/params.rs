// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! VP9 frame parameters handed to the decoder backend.
//!
//! Everything here comes out of an upstream parser: the uncompressed header fields, the
//! probabilities after the compressed header deltas have been applied, and the reference frames.

use crate::VpuError;
use crate::VpuResult;

pub const NUM_REF_FRAMES: usize = 3;
pub const MAX_SEGMENTS: usize = 8;
pub const SEG_LVL_ALT_Q: usize = 0;
pub const SEG_LVL_ALT_L: usize = 1;
pub const SEG_LVL_REF_FRAME: usize = 2;
pub const SEG_LVL_SKIP: usize = 3;
pub const SEG_LVL_MAX: usize = 4;
pub const MAX_LOOP_FILTER: u8 = 63;

/// Largest transform mode, `TX_MODE_SELECT`.
pub const TX_MODE_SELECT: u8 = 4;
/// Largest reference mode, `REFERENCE_MODE_SELECT`.
pub const REFERENCE_MODE_SELECT: u8 = 2;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopFilter {
    pub level: u8,
    pub sharpness: u8,
    pub delta_enabled: bool,
    /// Contains the adjustment needed for the filter level based on the chosen reference frame.
    pub ref_deltas: [i8; 4],
    /// Contains the adjustment needed for the filter level based on the chosen mode.
    pub mode_deltas: [i8; 2],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Whether the segmentation map is used for this frame.
    pub enabled: bool,
    /// Whether the segmentation map is updated during the decoding of this frame.
    pub update_map: bool,
    /// Whether the segment map is coded relative to the previous one.
    pub temporal_update: bool,
    /// Whether new feature data is sent for this frame.
    pub update_data: bool,
    /// When set, feature data holds absolute values instead of deltas.
    pub abs_or_delta_update: bool,
    pub tree_probs: [u8; 7],
    pub pred_probs: [u8; 3],
    pub feature_enabled: [[bool; SEG_LVL_MAX]; MAX_SEGMENTS],
    pub feature_data: [[i16; SEG_LVL_MAX]; MAX_SEGMENTS],
}

impl Segmentation {
    pub fn feature_active(&self, segment: usize, feature: usize) -> bool {
        self.enabled && self.feature_enabled[segment][feature]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MvProbs {
    pub joint: [u8; 3],
    pub sign: [u8; 2],
    pub classes: [[u8; 10]; 2],
    pub class0_bit: [u8; 2],
    pub bits: [[u8; 10]; 2],
    pub class0_fr: [[[u8; 3]; 2]; 2],
    pub fr: [[u8; 3]; 2],
    pub class0_hp: [u8; 2],
    pub hp: [u8; 2],
}

/// Coefficient probabilities of one transform size, plane type and reference type, indexed by
/// band and context.
pub type CoeffPlane = [[[u8; 3]; 6]; 6];

/// Probabilities in effect for the frame, after the compressed header updates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameContext {
    pub tx8: [[u8; 1]; 2],
    pub tx16: [[u8; 2]; 2],
    pub tx32: [[u8; 3]; 2],
    /// Indexed by transform size, plane type and reference type.
    pub coef: [[[CoeffPlane; 2]; 2]; 4],
    pub skip: [u8; 3],
    pub inter_mode: [[u8; 3]; 7],
    pub interp_filter: [[u8; 2]; 4],
    pub is_inter: [u8; 4],
    pub comp_mode: [u8; 5],
    pub single_ref: [[u8; 2]; 5],
    pub comp_ref: [u8; 5],
    pub y_mode: [[u8; 9]; 4],
    pub uv_mode: [[u8; 9]; 10],
    pub partition: [[u8; 3]; 16],
    pub mv: MvProbs,
}

/// A reference frame as seen by the decoder: its buffer and the size it was decoded at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefFrame {
    pub addr: u32,
    pub width: u16,
    pub height: u16,
    pub bit_depth: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeParams {
    pub width: u16,
    pub height: u16,
    pub bit_depth: u8,
    pub key_frame: bool,
    pub intra_only: bool,
    pub error_resilient: bool,
    pub show_frame: bool,
    pub refresh_frame_context: bool,
    pub frame_parallel_decoding_mode: bool,
    pub interpolation_filter: u8,
    pub tx_mode: u8,
    pub reference_mode: u8,
    pub lf: LoopFilter,
    pub seg: Segmentation,
    pub probs: FrameContext,
    /// Last, golden and altref. `None` stands for the frame being decoded.
    pub refs: [Option<RefFrame>; NUM_REF_FRAMES],
    pub uncompressed_header_size: u32,
    pub compressed_header_size: u32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            bit_depth: 8,
            key_frame: false,
            intra_only: false,
            error_resilient: false,
            show_frame: true,
            refresh_frame_context: false,
            frame_parallel_decoding_mode: false,
            interpolation_filter: 0,
            tx_mode: 0,
            reference_mode: 0,
            lf: Default::default(),
            seg: Default::default(),
            probs: Default::default(),
            refs: [None; NUM_REF_FRAMES],
            uncompressed_header_size: 0,
            compressed_header_size: 0,
        }
    }
}

impl DecodeParams {
    /// Key frames and intra-only frames decode without references.
    pub fn is_intra_only(&self) -> bool {
        self.key_frame || self.intra_only
    }

    /// Whether the symbol counts of this frame feed probability adaptation.
    pub fn backward_adaptation(&self) -> bool {
        self.refresh_frame_context && !self.error_resilient && !self.frame_parallel_decoding_mode
    }

    pub fn validate(&self, stream_len: u32) -> VpuResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VpuError::UnsupportedParameter(format!(
                "frame size {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.bit_depth, 8 | 10) {
            return Err(VpuError::UnsupportedParameter(format!(
                "bit depth {}",
                self.bit_depth
            )));
        }
        if self.tx_mode > TX_MODE_SELECT || self.reference_mode > REFERENCE_MODE_SELECT {
            return Err(VpuError::UnsupportedParameter(format!(
                "tx_mode {} reference_mode {}",
                self.tx_mode, self.reference_mode
            )));
        }
        if self.lf.level > MAX_LOOP_FILTER || self.lf.sharpness > 7 {
            return Err(VpuError::UnsupportedParameter(format!(
                "loop filter level {} sharpness {}",
                self.lf.level, self.lf.sharpness
            )));
        }
        let headers = self.uncompressed_header_size as u64 + self.compressed_header_size as u64;
        if headers > stream_len as u64 {
            return Err(VpuError::UnsupportedParameter(format!(
                "headers of {} bytes in a {}-byte stream",
                headers, stream_len
            )));
        }
        if !self.is_intra_only() {
            for (i, r) in self.refs.iter().flatten().enumerate() {
                if r.width == 0 || r.height == 0 {
                    return Err(VpuError::UnsupportedParameter(format!(
                        "reference {} has no size",
                        i
                    )));
                }
            }
        }
        Ok(())
    }
}
