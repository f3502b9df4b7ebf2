// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! QP-indexed motion estimation and mode decision weights of the H.264 encoder.

/// Largest QP value of H.264.
pub const MAX_QP: u8 = 51;

const NUM_QP: usize = MAX_QP as usize + 1;

pub const PREV_MODE_FAVOR: [u32; NUM_QP] = [
    7, 7, 8, 8, 9, 9, 10, 10, 11, 12, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 24, 25, 27, 29,
    30, 32, 34, 36, 38, 41, 43, 46, 49, 51, 55, 58, 61, 65, 69, 73, 78, 82, 87, 93, 98, 104, 110,
    117, 124, 132, 140,
];

pub const INTRA16_FAVOR: [u32; NUM_QP] = [
    24, 24, 24, 26, 27, 30, 32, 35, 39, 43, 48, 53, 58, 64, 71, 78, 85, 93, 102, 111, 121, 131,
    142, 154, 167, 180, 195, 211, 229, 248, 271, 296, 326, 361, 404, 457, 523, 607, 714, 852,
    1034, 1272, 1588, 2008, 2568, 3318, 4323, 5672, 7486, 9928, 13216, 17648,
];

pub const INTER_FAVOR: [u32; NUM_QP] = [
    40, 40, 41, 42, 43, 44, 45, 48, 51, 53, 55, 60, 62, 67, 69, 72, 78, 84, 90, 96, 110, 120, 135,
    152, 170, 189, 210, 235, 265, 297, 335, 376, 420, 470, 522, 572, 620, 670, 724, 770, 820, 867,
    915, 970, 1020, 1076, 1132, 1180, 1230, 1275, 1320, 1370,
];

/// Skip mode penalty in 1/256 units, `2550 / (qp - 1) - 50`.
pub const SKIP_SAD_PENALTY: [u32; NUM_QP] = [
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 233, 205, 182, 163, 146, 132, 120, 109, 100,
    92, 84, 78, 71, 66, 61, 56, 52, 48, 44, 41, 38, 35, 32, 30, 27, 25, 23, 21, 19, 17, 15, 14, 12,
    11, 9, 8, 7, 5, 4, 3, 2, 1,
];

/// `sqrt(2^((qp - 12) / 3)) * 8`
pub const DIFF_MV_PENALTY: [u32; NUM_QP] = [
    2, 2, 3, 3, 3, 4, 4, 4, 5, 6, 6, 7, 8, 9, 10, 11, 13, 14, 16, 18, 20, 23, 26, 29, 32, 36, 40,
    45, 51, 57, 64, 72, 81, 91, 102, 114, 128, 144, 161, 181, 203, 228, 256, 287, 323, 362, 406,
    456, 512, 575, 645, 724,
];

/// `31 * sqrt(2^((qp - 12) / 3)) / 4`
pub const DIFF_MV_PENALTY_4P: [u32; NUM_QP] = [
    2, 2, 2, 3, 3, 3, 4, 4, 5, 5, 6, 7, 8, 9, 10, 11, 12, 14, 16, 17, 20, 22, 25, 28, 31, 35, 39,
    44, 49, 55, 62, 70, 78, 88, 98, 110, 124, 139, 156, 175, 197, 221, 248, 278, 312, 351, 394,
    442, 496, 557, 625, 701,
];

/// Weights for one frame, looked up from its QP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QpWeights {
    pub prev_mode_favor: u32,
    pub intra16_favor: u32,
    pub inter_favor: u32,
    /// Skip penalty, scaled up for small frames and saturated to 8 bits.
    pub skip_penalty: u32,
    pub diff_mv_penalty_1p: u32,
    pub diff_mv_penalty_4p: u32,
}

impl QpWeights {
    /// Returns the weights for `qp` in a frame of `mbs_in_row` by `mbs_in_col` macroblocks, or
    /// `None` if `qp` is above [`MAX_QP`].
    pub fn new(qp: u8, mbs_in_row: u32, mbs_in_col: u32) -> Option<Self> {
        if qp > MAX_QP {
            return None;
        }
        let qp = qp as usize;

        let scaler = std::cmp::max(1, 200 / std::cmp::max(1, mbs_in_row + mbs_in_col));

        Some(Self {
            prev_mode_favor: PREV_MODE_FAVOR[qp],
            intra16_favor: INTRA16_FAVOR[qp],
            inter_favor: INTER_FAVOR[qp],
            skip_penalty: std::cmp::min(255, SKIP_SAD_PENALTY[qp] * scaler),
            diff_mv_penalty_1p: DIFF_MV_PENALTY[qp],
            diff_mv_penalty_4p: DIFF_MV_PENALTY_4P[qp],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        // 1280x720: 80 + 45 macroblocks, scaler 1.
        let w = QpWeights::new(26, 80, 45).unwrap();
        assert_eq!(w.prev_mode_favor, 32);
        assert_eq!(w.intra16_favor, 195);
        assert_eq!(w.inter_favor, 210);
        assert_eq!(w.skip_penalty, 52);
        assert_eq!(w.diff_mv_penalty_1p, 40);
        assert_eq!(w.diff_mv_penalty_4p, 39);

        let w = QpWeights::new(MAX_QP, 80, 45).unwrap();
        assert_eq!(w.intra16_favor, 17648);
    }

    #[test]
    fn test_small_frame_skip_penalty() {
        // 176x144: 11 + 9 macroblocks, scaler 10.
        assert_eq!(QpWeights::new(26, 11, 9).unwrap().skip_penalty, 255);
        assert_eq!(QpWeights::new(50, 11, 9).unwrap().skip_penalty, 20);
    }

    #[test]
    fn test_qp_out_of_range() {
        assert_eq!(QpWeights::new(52, 80, 45), None);
        assert_eq!(QpWeights::new(255, 80, 45), None);
    }
}
