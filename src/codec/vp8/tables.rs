// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Fixed tables and the packed probability table of the VP8 decoder.

use crate::bitstream_utils::TableWriter;
use crate::bitstream_utils::TableWriterResult;
use crate::codec::vp8::params::FrameHeader;
use crate::utils::align_up;
use crate::utils::mb_height;
use crate::utils::mb_width;

/// Six-tap sub-pixel interpolation filters, one per eighth-pel position.
pub const MC_FILTER: [[i32; 6]; 8] = [
    [0, 0, 128, 0, 0, 0],
    [0, -6, 123, 12, -1, 0],
    [2, -11, 108, 36, -8, 1],
    [0, -9, 93, 50, -6, 0],
    [3, -16, 77, 77, -16, 3],
    [0, -6, 50, 93, -9, 0],
    [1, -8, 36, 108, -11, 2],
    [0, -1, 12, 123, -6, 0],
];

/// Size of the packed probability table read by the decoder.
pub const PROB_TABLE_SIZE: usize = 1208;

/// Byte offset of the first four coefficient probabilities of each band and context.
const COEFF_HEADER_OFFSET: usize = 56;
/// Byte offset of the remaining seven coefficient probabilities.
const COEFF_FOOTER_OFFSET: usize = 440;

/// Index of the short tree probabilities inside a motion vector probability row.
const MV_SHORT_TREE: usize = 2;
/// Index of the long bit probabilities inside a motion vector probability row.
const MV_LONG_BITS: usize = 9;

/// Packs the frame probabilities into the layout the decoder expects. `out` must hold at least
/// [`PROB_TABLE_SIZE`] bytes.
pub fn pack_prob_table(hdr: &FrameHeader, out: &mut [u8]) -> TableWriterResult<()> {
    let mut w = TableWriter::new(out);
    let seg = &hdr.segmentation.segment_prob;

    w.write_bytes(&[
        hdr.prob_intra,
        hdr.prob_last,
        hdr.prob_golden,
        seg[0],
        seg[1],
        seg[2],
        hdr.prob_skip_false,
        0,
    ])?;

    let y = &hdr.mode_probs.intra_16x16_prob;
    let uv = &hdr.mode_probs.intra_chroma_prob;
    w.write_bytes(&[y[0], y[1], y[2], y[3], uv[0], uv[1], uv[2], 0])?;

    // is_short and sign first, then the two top long bits.
    let mv = &hdr.mv_prob;
    w.write_bytes(&[
        mv[0][0],
        mv[1][0],
        mv[0][1],
        mv[1][1],
        mv[0][MV_LONG_BITS + 8],
        mv[0][MV_LONG_BITS + 9],
        mv[1][MV_LONG_BITS + 8],
        mv[1][MV_LONG_BITS + 9],
    ])?;
    for row in mv {
        w.write_bytes(&row[MV_LONG_BITS..MV_LONG_BITS + 8])?;
    }
    for row in mv {
        w.write_bytes(&row[MV_SHORT_TREE..MV_SHORT_TREE + 7])?;
        w.write_f(8, 0u32)?;
    }
    w.checkpoint(COEFF_HEADER_OFFSET)?;

    for band in hdr.coeff_prob.iter().flatten().flatten() {
        w.write_bytes(&band[..4])?;
    }
    w.checkpoint(COEFF_FOOTER_OFFSET)?;

    for band in hdr.coeff_prob.iter().flatten().flatten() {
        w.write_bytes(&band[4..])?;
        w.write_f(8, 0u32)?;
    }
    w.checkpoint(PROB_TABLE_SIZE)
}

/// Size of the segmentation map of a `width` by `height` frame: two bits per macroblock,
/// padded to 64 bytes.
pub fn segment_map_size(width: u32, height: u32) -> usize {
    let mbs = (mb_width(width) * mb_height(height)) as usize;
    align_up(mbs.div_ceil(4), 64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> FrameHeader {
        let mut hdr = FrameHeader {
            prob_intra: 1,
            prob_last: 2,
            prob_golden: 3,
            prob_skip_false: 7,
            ..Default::default()
        };
        hdr.segmentation.segment_prob = [4, 5, 6];
        hdr.mode_probs.intra_16x16_prob = [10, 11, 12, 13];
        hdr.mode_probs.intra_chroma_prob = [14, 15, 16];
        for (i, row) in hdr.mv_prob.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = (100 * i + j) as u8;
            }
        }
        for (n, p) in hdr
            .coeff_prob
            .iter_mut()
            .flatten()
            .flatten()
            .flatten()
            .enumerate()
        {
            *p = (n % 251) as u8 + 1;
        }
        hdr
    }

    #[test]
    fn test_prob_table_layout() {
        let hdr = header();
        let mut table = vec![0xffu8; PROB_TABLE_SIZE];
        pack_prob_table(&hdr, &mut table).unwrap();

        assert_eq!(table[..8], [1u8, 2, 3, 4, 5, 6, 7, 0]);
        assert_eq!(table[8..16], [10u8, 11, 12, 13, 14, 15, 16, 0]);
        assert_eq!(table[16..24], [0u8, 100, 1, 101, 17, 18, 117, 118]);
        assert_eq!(table[24..32], [9u8, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(table[32..40], [109u8, 110, 111, 112, 113, 114, 115, 116]);
        assert_eq!(table[40..48], [2u8, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(table[48..56], [102u8, 103, 104, 105, 106, 107, 108, 0]);

        // Band 0 of plane 0, context 0, then the next context.
        assert_eq!(table[56..60], hdr.coeff_prob[0][0][0][..4]);
        assert_eq!(table[60..64], hdr.coeff_prob[0][0][1][..4]);
        assert_eq!(table[436..440], hdr.coeff_prob[3][7][2][..4]);

        assert_eq!(table[440..447], hdr.coeff_prob[0][0][0][4..]);
        assert_eq!(table[447], 0);
        assert_eq!(table[1200..1207], hdr.coeff_prob[3][7][2][4..]);
        assert_eq!(table[1207], 0);
    }

    #[test]
    fn test_prob_table_too_small() {
        let mut table = vec![0u8; PROB_TABLE_SIZE - 1];
        assert!(pack_prob_table(&header(), &mut table).is_err());
    }

    #[test]
    fn test_segment_map_size() {
        // 1920x1088: 120x68 macroblocks, 2040 bytes of map.
        assert_eq!(segment_map_size(1920, 1080), 2048);
        assert_eq!(segment_map_size(16, 16), 64);
        assert_eq!(segment_map_size(176, 144), 64);
    }

    #[test]
    fn test_mc_filters_sum_to_unity() {
        for f in MC_FILTER {
            assert_eq!(f.iter().sum::<i32>(), 128);
        }
    }
}
