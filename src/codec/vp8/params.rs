// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Decoded VP8 frame header, as handed to the decoder backend.

use crate::VpuError;
use crate::VpuResult;

/// Dequantization indices as coded in the quant_indices() syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantIndices {
    /// The dequantization table index used for the luma AC coefficients (and
    /// other coefficient groups if no delta value is present).
    pub y_ac_qi: u8,
    /// Delta added to the baseline index to obtain the luma DC coefficient
    /// dequantization index.
    pub y_dc_delta: i8,
    /// Delta added to the baseline index to obtain the Y2 block DC coefficient
    /// dequantization index.
    pub y2_dc_delta: i8,
    /// Delta added to the baseline index to obtain the Y2 block AC coefficient
    /// dequantization index.
    pub y2_ac_delta: i8,
    /// Delta added to the baseline index to obtain the chroma DC coefficient
    /// dequantization index.
    pub uv_dc_delta: i8,
    /// Delta added to the baseline index to obtain the chroma AC coefficient
    /// dequantization index.
    pub uv_ac_delta: i8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MbLfAdjustments {
    /// Indicates if the MB-level loop filter adjustment (based on the used
    /// reference frame and coding mode) is on for the current frame.
    pub loop_filter_adj_enable: bool,
    /// Adjustment delta value corresponding to a certain used reference frame.
    pub ref_frame_delta: [i8; 4],
    /// Adjustment delta value corresponding to a certain MB prediction mode.
    pub mb_mode_delta: [i8; 4],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Enables the segmentation feature for the current frame.
    pub segmentation_enabled: bool,
    /// Determines if the MB segmentation map is updated in the current frame.
    pub update_mb_segmentation_map: bool,
    /// Feature data mode, false for deltas and true for absolute values.
    pub segment_feature_mode: bool,
    /// Quantizer value of each segment.
    pub quantizer_update_value: [i8; 4],
    /// Loop filter level of each segment.
    pub lf_update_value: [i8; 4],
    /// The branch probabilities of the segment id decoding tree.
    pub segment_prob: [u8; 3],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeProbs {
    /// Branch probabilities of the luma intra prediction mode decoding tree.
    pub intra_16x16_prob: [u8; 4],
    /// Branch probabilities of the chroma intra prediction mode decoding tree.
    pub intra_chroma_prob: [u8; 3],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameHeader {
    /// Indicates if the current frame is a key frame or not.
    pub key_frame: bool,
    /// Determines the bitstream version.
    pub version: u8,
    /// Size of the first partition (control partition) excluding the size of
    /// the uncompressed data chunk.
    pub first_part_size: u32,
    /// The frame's width, in pixels.
    pub width: u16,
    /// The frame's height, in pixels.
    pub height: u16,
    /// Simple loop filter when set, normal loop filter otherwise.
    pub filter_type: bool,
    pub loop_filter_level: u8,
    pub sharpness_level: u8,
    pub mb_lf_adjust: MbLfAdjustments,
    /// Number of DCT partitions: 1, 2, 4 or 8.
    pub num_dct_parts: u8,
    pub dct_part_sizes: [u32; 8],
    pub quant_indices: QuantIndices,
    pub segmentation: Segmentation,
    /// Controls the sign of motion vectors when the golden frame is referenced.
    pub sign_bias_golden: bool,
    /// Controls the sign of motion vectors when the alternate frame is
    /// referenced.
    pub sign_bias_alternate: bool,
    pub coeff_prob: [[[[u8; 11]; 3]; 8]; 4],
    pub mv_prob: [[u8; 19]; 2],
    /// Enables or disables the skipping of macroblocks containing no non-zero
    /// coefficients.
    pub mb_no_coeff_skip: bool,
    pub prob_skip_false: u8,
    pub prob_intra: u8,
    pub prob_last: u8,
    pub prob_golden: u8,
    pub mode_probs: ModeProbs,
    /// Boolean decoder state after the frame header.
    pub bd_range: u8,
    pub bd_value: u8,
    /// Size in bits of the frame header inside the first partition.
    pub header_size: u32,
}

impl FrameHeader {
    /// Size of the uncompressed data chunk preceding the first partition.
    pub fn first_part_offset(&self) -> u32 {
        if self.key_frame {
            10
        } else {
            3
        }
    }

    pub fn validate(&self) -> VpuResult<()> {
        if !matches!(self.num_dct_parts, 1 | 2 | 4 | 8) {
            return Err(VpuError::UnsupportedParameter(format!(
                "num_dct_parts = {}",
                self.num_dct_parts
            )));
        }
        if self.version > 3 {
            return Err(VpuError::UnsupportedParameter(format!(
                "version = {}",
                self.version
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(VpuError::UnsupportedParameter(format!(
                "frame size {}x{}",
                self.width, self.height
            )));
        }
        if self.loop_filter_level > 63 || self.sharpness_level > 7 {
            return Err(VpuError::UnsupportedParameter(format!(
                "loop filter level {} sharpness {}",
                self.loop_filter_level, self.sharpness_level
            )));
        }
        if self.quant_indices.y_ac_qi > 127 {
            return Err(VpuError::UnsupportedParameter(format!(
                "y_ac_qi = {}",
                self.quant_indices.y_ac_qi
            )));
        }
        if self.header_size > self.first_part_size * 8 {
            return Err(VpuError::UnsupportedParameter(format!(
                "header of {} bits in a {}-byte partition",
                self.header_size, self.first_part_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> FrameHeader {
        FrameHeader {
            key_frame: true,
            width: 176,
            height: 144,
            num_dct_parts: 1,
            first_part_size: 100,
            header_size: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(header().validate().is_ok());
        assert!(FrameHeader {
            num_dct_parts: 3,
            ..header()
        }
        .validate()
        .is_err());
        assert!(FrameHeader {
            header_size: 801,
            ..header()
        }
        .validate()
        .is_err());
        assert!(FrameHeader {
            sharpness_level: 8,
            ..header()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_first_part_offset() {
        assert_eq!(header().first_part_offset(), 10);
        assert_eq!(
            FrameHeader {
                key_frame: false,
                ..header()
            }
            .first_part_offset(),
            3
        );
    }
}
