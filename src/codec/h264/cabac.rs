// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! CABAC context initialization tables.
//!
//! The encoder consumes a table of initial context states for every QP, computed from the
//! (m, n) pairs of ITU-T H.264 clause 9.3.1.1. The decoder consumes a fixed table
//! with the same information in its own packed layout.

use enumn::N;

use crate::bitstream_utils::TableWriterError;
use crate::bitstream_utils::TableWriterResult;
use crate::utils::clip3;

/// Number of context variables with an initialization value.
pub const NUM_CTX: usize = 460;
/// Distance between the context blocks in the encoder table.
pub const CTX_STRIDE: usize = 464;
/// Number of QP values.
pub const NUM_QP: usize = 52;
/// Size in bytes of the encoder CABAC table: one intra and one inter block per QP.
pub const ENC_TABLE_SIZE: usize = NUM_QP * 2 * CTX_STRIDE;

#[derive(N, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CabacInitIdc {
    #[default]
    Idc0 = 0,
    Idc1 = 1,
    Idc2 = 2,
}

/// Initial state byte of one context: the state index in the upper seven bits and the MPS in the
/// lowest one.
pub fn init_state(m: i32, n: i32, qp: i32) -> u8 {
    let pre = clip3(1, 126, ((m * qp) >> 4) + n);
    if pre <= 63 {
        ((63 - pre) << 1) as u8
    } else {
        (((pre - 64) << 1) | 1) as u8
    }
}

/// Fills `table` with the encoder CABAC contexts: for each QP an intra block from the I-slice
/// pairs, then an inter block from the pairs selected by `idc`. Each block is [`CTX_STRIDE`]
/// bytes with the unused tail zeroed.
pub fn build_encoder_table(table: &mut [u8], idc: CabacInitIdc) -> TableWriterResult<()> {
    if table.len() < ENC_TABLE_SIZE {
        return Err(TableWriterError::OutOfSpace {
            bit_pos: ENC_TABLE_SIZE * 8,
            len: table.len(),
        });
    }

    for qp in 0..NUM_QP {
        for j in 0..2 {
            let pairs = if j == 0 {
                &CONTEXT_INIT_I
            } else {
                &CONTEXT_INIT_PB[idc as usize]
            };
            let block = &mut table[qp * 2 * CTX_STRIDE + j * CTX_STRIDE..][..CTX_STRIDE];
            for (i, &[m, n]) in pairs.iter().enumerate() {
                block[i] = init_state(m as i32, n as i32, qp as i32);
            }
            block[NUM_CTX..].fill(0);
        }
    }

    Ok(())
}

/// (m, n) pairs for I and SI slices.
pub const CONTEXT_INIT_I: [[i8; 2]; NUM_CTX] = [
    [20, -15], [2, 54], [3, 74], [20, -15], [2, 54], [3, 74], [-28, 127], [-23, 104], [-6, 53],
    [-1, 54], [7, 51], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0],
    [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0],
    [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0],
    [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0], [0, 0],
    [0, 0], [0, 0], [0, 0], [0, 0], [0, 41], [0, 63], [0, 63], [0, 63], [-9, 83], [4, 86], [0, 97],
    [-7, 72], [13, 41], [3, 62], [0, 11], [1, 55], [0, 69], [-17, 127], [-13, 102], [0, 82],
    [-7, 74], [-21, 107], [-27, 127], [-31, 127], [-24, 127], [-18, 95], [-27, 127], [-21, 114],
    [-30, 127], [-17, 123], [-12, 115], [-16, 122], [-11, 115], [-12, 63], [-2, 68], [-15, 84],
    [-13, 104], [-3, 70], [-8, 93], [-10, 90], [-30, 127], [-1, 74], [-6, 97], [-7, 91],
    [-20, 127], [-4, 56], [-5, 82], [-7, 76], [-22, 125], [-7, 93], [-11, 87], [-3, 77], [-5, 71],
    [-4, 63], [-4, 68], [-12, 84], [-7, 62], [-7, 65], [8, 61], [5, 56], [-2, 66], [1, 64],
    [0, 61], [-2, 78], [1, 50], [7, 52], [10, 35], [0, 44], [11, 38], [1, 45], [0, 46], [5, 44],
    [31, 17], [1, 51], [7, 50], [28, 19], [16, 33], [14, 62], [-13, 108], [-15, 100], [-13, 101],
    [-13, 91], [-12, 94], [-10, 88], [-16, 84], [-10, 86], [-7, 83], [-13, 87], [-19, 94], [1, 70],
    [0, 72], [-5, 74], [18, 59], [-8, 102], [-15, 100], [0, 95], [-4, 75], [2, 72], [-11, 75],
    [-3, 71], [15, 46], [-13, 69], [0, 62], [0, 65], [21, 37], [-15, 72], [9, 57], [16, 54],
    [0, 62], [12, 72], [24, 0], [15, 9], [8, 25], [13, 18], [15, 9], [13, 19], [10, 37], [12, 18],
    [6, 29], [20, 33], [15, 30], [4, 45], [1, 58], [0, 62], [7, 61], [12, 38], [11, 45], [15, 39],
    [11, 42], [13, 44], [16, 45], [12, 41], [10, 49], [30, 34], [18, 42], [10, 55], [17, 51],
    [17, 46], [0, 89], [26, -19], [22, -17], [26, -17], [30, -25], [28, -20], [33, -23], [37, -27],
    [33, -23], [40, -28], [38, -17], [33, -11], [40, -15], [41, -6], [38, 1], [41, 17], [30, -6],
    [27, 3], [26, 22], [37, -16], [35, -4], [38, -8], [38, -3], [37, 3], [38, 5], [42, 0],
    [35, 16], [39, 22], [14, 48], [27, 37], [21, 60], [12, 68], [2, 97], [-3, 71], [-6, 42],
    [-5, 50], [-3, 54], [-2, 62], [0, 58], [1, 63], [-2, 72], [-1, 74], [-9, 91], [-5, 67],
    [-5, 27], [-3, 39], [-2, 44], [0, 46], [-16, 64], [-8, 68], [-10, 78], [-6, 77], [-10, 86],
    [-12, 92], [-15, 55], [-10, 60], [-6, 62], [-4, 65], [-12, 73], [-8, 76], [-7, 80], [-9, 88],
    [-17, 110], [-11, 97], [-20, 84], [-11, 79], [-6, 73], [-4, 74], [-13, 86], [-13, 96],
    [-11, 97], [-19, 117], [-8, 78], [-5, 33], [-4, 48], [-2, 53], [-3, 62], [-13, 71], [-10, 79],
    [-12, 86], [-13, 90], [-14, 97], [0, 0], [-6, 93], [-6, 84], [-8, 79], [0, 66], [-1, 71],
    [0, 62], [-2, 60], [-2, 59], [-5, 75], [-3, 62], [-4, 58], [-9, 66], [-1, 79], [0, 71],
    [3, 68], [10, 44], [-7, 62], [15, 36], [14, 40], [16, 27], [12, 29], [1, 44], [20, 36],
    [18, 32], [5, 42], [1, 48], [10, 62], [17, 46], [9, 64], [-12, 104], [-11, 97], [-16, 96],
    [-7, 88], [-8, 85], [-7, 85], [-9, 85], [-13, 88], [4, 66], [-3, 77], [-3, 76], [-6, 76],
    [10, 58], [-1, 76], [-1, 83], [-7, 99], [-14, 95], [2, 95], [0, 76], [-5, 74], [0, 70],
    [-11, 75], [1, 68], [0, 65], [-14, 73], [3, 62], [4, 62], [-1, 68], [-13, 75], [11, 55],
    [5, 64], [12, 70], [15, 6], [6, 19], [7, 16], [12, 14], [18, 13], [13, 11], [13, 15], [15, 16],
    [12, 23], [13, 23], [15, 20], [14, 26], [14, 44], [17, 40], [17, 47], [24, 17], [21, 21],
    [25, 22], [31, 27], [22, 29], [19, 35], [14, 50], [10, 57], [7, 63], [-2, 77], [-4, 82],
    [-3, 94], [9, 69], [-12, 109], [36, -35], [36, -34], [32, -26], [37, -30], [44, -32],
    [34, -18], [34, -15], [40, -15], [33, -7], [35, -5], [33, 0], [38, 2], [33, 13], [23, 35],
    [13, 58], [29, -3], [26, 0], [22, 30], [31, -7], [35, -15], [34, -3], [34, 3], [36, -1],
    [34, 5], [32, 11], [35, 5], [34, 12], [39, 11], [30, 29], [34, 26], [29, 39], [19, 66],
    [31, 21], [31, 31], [25, 50], [-17, 120], [-20, 112], [-18, 114], [-11, 85], [-15, 92],
    [-14, 89], [-26, 71], [-15, 81], [-14, 80], [0, 68], [-14, 70], [-24, 56], [-23, 68],
    [-24, 50], [-11, 74], [23, -13], [26, -13], [40, -15], [49, -14], [44, 3], [45, 6], [44, 34],
    [33, 54], [19, 82], [-3, 75], [-1, 23], [1, 34], [1, 43], [0, 54], [-2, 55], [0, 61], [1, 64],
    [0, 68], [-9, 92], [-14, 106], [-13, 97], [-15, 90], [-12, 90], [-18, 88], [-10, 73], [-9, 79],
    [-14, 86], [-10, 73], [-10, 70], [-10, 69], [-5, 66], [-9, 64], [-5, 58], [2, 59], [21, -10],
    [24, -11], [28, -8], [28, -1], [29, 3], [29, 9], [35, 20], [29, 36], [14, 67],
];

/// (m, n) pairs for P and B slices, indexed by `cabac_init_idc`.
pub const CONTEXT_INIT_PB: [[[i8; 2]; NUM_CTX]; 3] = [
    [
        [20, -15], [2, 54], [3, 74], [20, -15], [2, 54], [3, 74], [-28, 127], [-23, 104], [-6, 53],
        [-1, 54], [7, 51], [23, 33], [23, 2], [21, 0], [1, 9], [0, 49], [-37, 118], [5, 57],
        [-13, 78], [-11, 65], [1, 62], [12, 49], [-4, 73], [17, 50], [18, 64], [9, 43], [29, 0],
        [26, 67], [16, 90], [9, 104], [-46, 127], [-20, 104], [1, 67], [-13, 78], [-11, 65],
        [1, 62], [-6, 86], [-17, 95], [-6, 61], [9, 45], [-3, 69], [-6, 81], [-11, 96], [6, 55],
        [7, 67], [-5, 86], [2, 88], [0, 58], [-3, 76], [-10, 94], [5, 54], [4, 69], [-3, 81],
        [0, 88], [-7, 67], [-5, 74], [-4, 74], [-5, 80], [-7, 72], [1, 58], [0, 41], [0, 63],
        [0, 63], [0, 63], [-9, 83], [4, 86], [0, 97], [-7, 72], [13, 41], [3, 62], [0, 45],
        [-4, 78], [-3, 96], [-27, 126], [-28, 98], [-25, 101], [-23, 67], [-28, 82], [-20, 94],
        [-16, 83], [-22, 110], [-21, 91], [-18, 102], [-13, 93], [-29, 127], [-7, 92], [-5, 89],
        [-7, 96], [-13, 108], [-3, 46], [-1, 65], [-1, 57], [-9, 93], [-3, 74], [-9, 92], [-8, 87],
        [-23, 126], [5, 54], [6, 60], [6, 59], [6, 69], [-1, 48], [0, 68], [-4, 69], [-8, 88],
        [-2, 85], [-6, 78], [-1, 75], [-7, 77], [2, 54], [5, 50], [-3, 68], [1, 50], [6, 42],
        [-4, 81], [1, 63], [-4, 70], [0, 67], [2, 57], [-2, 76], [11, 35], [4, 64], [1, 61],
        [11, 35], [18, 25], [12, 24], [13, 29], [13, 36], [-10, 93], [-7, 73], [-2, 73], [13, 46],
        [9, 49], [-7, 100], [9, 53], [2, 53], [5, 53], [-2, 61], [0, 56], [0, 56], [-13, 63],
        [-5, 60], [-1, 62], [4, 57], [-6, 69], [4, 57], [14, 39], [4, 51], [13, 68], [3, 64],
        [1, 61], [9, 63], [7, 50], [16, 39], [5, 44], [4, 52], [11, 48], [-5, 60], [-1, 59],
        [0, 59], [22, 33], [5, 44], [14, 43], [-1, 78], [0, 60], [9, 69], [11, 28], [2, 40],
        [3, 44], [0, 49], [0, 46], [2, 44], [2, 51], [0, 47], [4, 39], [2, 62], [6, 46], [0, 54],
        [3, 54], [2, 58], [4, 63], [6, 51], [6, 57], [7, 53], [6, 52], [6, 55], [11, 45], [14, 36],
        [8, 53], [-1, 82], [7, 55], [-3, 78], [15, 46], [22, 31], [-1, 84], [25, 7], [30, -7],
        [28, 3], [28, 4], [32, 0], [34, -1], [30, 6], [30, 6], [32, 9], [31, 19], [26, 27],
        [26, 30], [37, 20], [28, 34], [17, 70], [1, 67], [5, 59], [9, 67], [16, 30], [18, 32],
        [18, 35], [22, 29], [24, 31], [23, 38], [18, 43], [20, 41], [11, 63], [9, 59], [9, 64],
        [-1, 94], [-2, 89], [-9, 108], [-6, 76], [-2, 44], [0, 45], [0, 52], [-3, 64], [-2, 59],
        [-4, 70], [-4, 75], [-8, 82], [-17, 102], [-9, 77], [3, 24], [0, 42], [0, 48], [0, 55],
        [-6, 59], [-7, 71], [-12, 83], [-11, 87], [-30, 119], [1, 58], [-3, 29], [-1, 36], [1, 38],
        [2, 43], [-6, 55], [0, 58], [0, 64], [-3, 74], [-10, 90], [0, 70], [-4, 29], [5, 31],
        [7, 42], [1, 59], [-2, 58], [-3, 72], [-3, 81], [-11, 97], [0, 58], [8, 5], [10, 14],
        [14, 18], [13, 27], [2, 40], [0, 58], [-3, 70], [-6, 79], [-8, 85], [0, 0], [-13, 106],
        [-16, 106], [-10, 87], [-21, 114], [-18, 110], [-14, 98], [-22, 110], [-21, 106],
        [-18, 103], [-21, 107], [-23, 108], [-26, 112], [-10, 96], [-12, 95], [-5, 91], [-9, 93],
        [-22, 94], [-5, 86], [9, 67], [-4, 80], [-10, 85], [-1, 70], [7, 60], [9, 58], [5, 61],
        [12, 50], [15, 50], [18, 49], [17, 54], [10, 41], [7, 46], [-1, 51], [7, 49], [8, 52],
        [9, 41], [6, 47], [2, 55], [13, 41], [10, 44], [6, 50], [5, 53], [13, 49], [4, 63],
        [6, 64], [-2, 69], [-2, 59], [6, 70], [10, 44], [9, 31], [12, 43], [3, 53], [14, 34],
        [10, 38], [-3, 52], [13, 40], [17, 32], [7, 44], [7, 38], [13, 50], [10, 57], [26, 43],
        [14, 11], [11, 14], [9, 11], [18, 11], [21, 9], [23, -2], [32, -15], [32, -15], [34, -21],
        [39, -23], [42, -33], [41, -31], [46, -28], [38, -12], [21, 29], [45, -24], [53, -45],
        [48, -26], [65, -43], [43, -19], [39, -10], [30, 9], [18, 26], [20, 27], [0, 57],
        [-14, 82], [-5, 75], [-19, 97], [-35, 125], [27, 0], [28, 0], [31, -4], [27, 6], [34, 8],
        [30, 10], [24, 22], [33, 19], [22, 32], [26, 31], [21, 41], [26, 44], [23, 47], [16, 65],
        [14, 71], [8, 60], [6, 63], [17, 65], [21, 24], [23, 20], [26, 23], [27, 32], [28, 23],
        [28, 24], [23, 40], [24, 32], [28, 29], [23, 42], [19, 57], [22, 53], [22, 61], [11, 86],
        [12, 40], [11, 51], [14, 59], [-4, 79], [-7, 71], [-5, 69], [-9, 70], [-8, 66], [-10, 68],
        [-19, 73], [-12, 69], [-16, 70], [-15, 67], [-20, 62], [-19, 70], [-16, 66], [-22, 65],
        [-20, 63], [9, -2], [26, -9], [33, -9], [39, -7], [41, -2], [45, 3], [49, 9], [45, 27],
        [36, 59], [-6, 66], [-7, 35], [-7, 42], [-8, 45], [-5, 48], [-12, 56], [-6, 60], [-5, 62],
        [-8, 66], [-8, 76], [-5, 85], [-6, 81], [-10, 77], [-7, 81], [-17, 80], [-18, 73],
        [-4, 74], [-10, 83], [-9, 71], [-9, 67], [-1, 61], [-8, 66], [-14, 66], [0, 59], [2, 59],
        [21, -13], [33, -14], [39, -7], [46, -2], [51, 2], [60, 6], [61, 17], [55, 34], [42, 62],
    ],
    [
        [20, -15], [2, 54], [3, 74], [20, -15], [2, 54], [3, 74], [-28, 127], [-23, 104], [-6, 53],
        [-1, 54], [7, 51], [22, 25], [34, 0], [16, 0], [-2, 9], [4, 41], [-29, 118], [2, 65],
        [-6, 71], [-13, 79], [5, 52], [9, 50], [-3, 70], [10, 54], [26, 34], [19, 22], [40, 0],
        [57, 2], [41, 36], [26, 69], [-45, 127], [-15, 101], [-4, 76], [-6, 71], [-13, 79],
        [5, 52], [6, 69], [-13, 90], [0, 52], [8, 43], [-2, 69], [-5, 82], [-10, 96], [2, 59],
        [2, 75], [-3, 87], [-3, 100], [1, 56], [-3, 74], [-6, 85], [0, 59], [-3, 81], [-7, 86],
        [-5, 95], [-1, 66], [-1, 77], [1, 70], [-2, 86], [-5, 72], [0, 61], [0, 41], [0, 63],
        [0, 63], [0, 63], [-9, 83], [4, 86], [0, 97], [-7, 72], [13, 41], [3, 62], [13, 15],
        [7, 51], [2, 80], [-39, 127], [-18, 91], [-17, 96], [-26, 81], [-35, 98], [-24, 102],
        [-23, 97], [-27, 119], [-24, 99], [-21, 110], [-18, 102], [-36, 127], [0, 80], [-5, 89],
        [-7, 94], [-4, 92], [0, 39], [0, 65], [-15, 84], [-35, 127], [-2, 73], [-12, 104],
        [-9, 91], [-31, 127], [3, 55], [7, 56], [7, 55], [8, 61], [-3, 53], [0, 68], [-7, 74],
        [-9, 88], [-13, 103], [-13, 91], [-9, 89], [-14, 92], [-8, 76], [-12, 87], [-23, 110],
        [-24, 105], [-10, 78], [-20, 112], [-17, 99], [-78, 127], [-70, 127], [-50, 127],
        [-46, 127], [-4, 66], [-5, 78], [-4, 71], [-8, 72], [2, 59], [-1, 55], [-7, 70], [-6, 75],
        [-8, 89], [-34, 119], [-3, 75], [32, 20], [30, 22], [-44, 127], [0, 54], [-5, 61], [0, 58],
        [-1, 60], [-3, 61], [-8, 67], [-25, 84], [-14, 74], [-5, 65], [5, 52], [2, 57], [0, 61],
        [-9, 69], [-11, 70], [18, 55], [-4, 71], [0, 58], [7, 61], [9, 41], [18, 25], [9, 32],
        [5, 43], [9, 47], [0, 44], [0, 51], [2, 46], [19, 38], [-4, 66], [15, 38], [12, 42],
        [9, 34], [0, 89], [4, 45], [10, 28], [10, 31], [33, -11], [52, -43], [18, 15], [28, 0],
        [35, -22], [38, -25], [34, 0], [39, -18], [32, -12], [102, -94], [0, 0], [56, -15],
        [33, -4], [29, 10], [37, -5], [51, -29], [39, -9], [52, -34], [69, -58], [67, -63],
        [44, -5], [32, 7], [55, -29], [32, 1], [0, 0], [27, 36], [33, -25], [34, -30], [36, -28],
        [38, -28], [38, -27], [34, -18], [35, -16], [34, -14], [32, -8], [37, -6], [35, 0],
        [30, 10], [28, 18], [26, 25], [29, 41], [0, 75], [2, 72], [8, 77], [14, 35], [18, 31],
        [17, 35], [21, 30], [17, 45], [20, 42], [18, 45], [27, 26], [16, 54], [7, 66], [16, 56],
        [11, 73], [10, 67], [-10, 116], [-23, 112], [-15, 71], [-7, 61], [0, 53], [-5, 66],
        [-11, 77], [-9, 80], [-9, 84], [-10, 87], [-34, 127], [-21, 101], [-3, 39], [-5, 53],
        [-7, 61], [-11, 75], [-15, 77], [-17, 91], [-25, 107], [-25, 111], [-28, 122], [-11, 76],
        [-10, 44], [-10, 52], [-10, 57], [-9, 58], [-16, 72], [-7, 69], [-4, 69], [-5, 74],
        [-9, 86], [2, 66], [-9, 34], [1, 32], [11, 31], [5, 52], [-2, 55], [-2, 67], [0, 73],
        [-8, 89], [3, 52], [7, 4], [10, 8], [17, 8], [16, 19], [3, 37], [-1, 61], [-5, 73],
        [-1, 70], [-4, 78], [0, 0], [-21, 126], [-23, 124], [-20, 110], [-26, 126], [-25, 124],
        [-17, 105], [-27, 121], [-27, 117], [-17, 102], [-26, 117], [-27, 116], [-33, 122],
        [-10, 95], [-14, 100], [-8, 95], [-17, 111], [-28, 114], [-6, 89], [-2, 80], [-4, 82],
        [-9, 85], [-8, 81], [-1, 72], [5, 64], [1, 67], [9, 56], [0, 69], [1, 69], [7, 69],
        [-7, 69], [-6, 67], [-16, 77], [-2, 64], [2, 61], [-6, 67], [-3, 64], [2, 57], [-3, 65],
        [-3, 66], [0, 62], [9, 51], [-1, 66], [-2, 71], [-2, 75], [-1, 70], [-9, 72], [14, 60],
        [16, 37], [0, 47], [18, 35], [11, 37], [12, 41], [10, 41], [2, 48], [12, 41], [13, 41],
        [0, 59], [3, 50], [19, 40], [3, 66], [18, 50], [19, -6], [18, -6], [14, 0], [26, -12],
        [31, -16], [33, -25], [33, -22], [37, -28], [39, -30], [42, -30], [47, -42], [45, -36],
        [49, -34], [41, -17], [32, 9], [69, -71], [63, -63], [66, -64], [77, -74], [54, -39],
        [52, -35], [41, -10], [36, 0], [40, -1], [30, 14], [28, 26], [23, 37], [12, 55], [11, 65],
        [37, -33], [39, -36], [40, -37], [38, -30], [46, -33], [42, -30], [40, -24], [49, -29],
        [38, -12], [40, -10], [38, -3], [46, -5], [31, 20], [29, 30], [25, 44], [12, 48], [11, 49],
        [26, 45], [22, 22], [23, 22], [27, 21], [33, 20], [26, 28], [30, 24], [27, 34], [18, 42],
        [25, 39], [18, 50], [12, 70], [21, 54], [14, 71], [11, 83], [25, 32], [21, 49], [21, 54],
        [-5, 85], [-6, 81], [-10, 77], [-7, 81], [-17, 80], [-18, 73], [-4, 74], [-10, 83],
        [-9, 71], [-9, 67], [-1, 61], [-8, 66], [-14, 66], [0, 59], [2, 59], [17, -10], [32, -13],
        [42, -9], [49, -5], [53, 0], [64, 3], [68, 10], [66, 27], [47, 57], [-5, 71], [0, 24],
        [-1, 36], [-2, 42], [-2, 52], [-9, 57], [-6, 63], [-4, 65], [-4, 67], [-7, 82], [-3, 81],
        [-3, 76], [-7, 72], [-6, 78], [-12, 72], [-14, 68], [-3, 70], [-6, 76], [-5, 66], [-5, 62],
        [0, 57], [-4, 61], [-9, 60], [1, 54], [2, 58], [17, -10], [32, -13], [42, -9], [49, -5],
        [53, 0], [64, 3], [68, 10], [66, 27], [47, 57],
    ],
    [
        [20, -15], [2, 54], [3, 74], [20, -15], [2, 54], [3, 74], [-28, 127], [-23, 104], [-6, 53],
        [-1, 54], [7, 51], [29, 16], [25, 0], [14, 0], [-10, 51], [-3, 62], [-27, 99], [26, 16],
        [-4, 85], [-24, 102], [5, 57], [6, 57], [-17, 73], [14, 57], [20, 40], [20, 10], [29, 0],
        [54, 0], [37, 42], [12, 97], [-32, 127], [-22, 117], [-2, 74], [-4, 85], [-24, 102],
        [5, 57], [-6, 93], [-14, 88], [-6, 44], [4, 55], [-11, 89], [-15, 103], [-21, 116],
        [19, 57], [20, 58], [4, 84], [6, 96], [1, 63], [-5, 85], [-13, 106], [5, 63], [6, 75],
        [-3, 90], [-1, 101], [3, 55], [-4, 79], [-2, 75], [-12, 97], [-7, 50], [1, 60], [0, 41],
        [0, 63], [0, 63], [0, 63], [-9, 83], [4, 86], [0, 97], [-7, 72], [13, 41], [3, 62],
        [7, 34], [-9, 88], [-20, 127], [-36, 127], [-17, 91], [-14, 95], [-25, 84], [-25, 86],
        [-12, 89], [-17, 91], [-31, 127], [-14, 76], [-18, 103], [-13, 90], [-37, 127], [11, 80],
        [5, 76], [2, 84], [5, 78], [-6, 55], [4, 61], [-14, 83], [-37, 127], [-5, 79], [-11, 104],
        [-11, 91], [-30, 127], [0, 65], [-2, 79], [0, 72], [-4, 92], [-6, 56], [3, 68], [-8, 71],
        [-13, 98], [-4, 86], [-12, 88], [-5, 82], [-3, 72], [-4, 67], [-8, 72], [-16, 89],
        [-9, 69], [-1, 59], [5, 66], [4, 57], [-4, 71], [-2, 71], [2, 58], [-1, 74], [-4, 44],
        [-1, 69], [0, 62], [-7, 51], [-4, 47], [-6, 42], [-3, 41], [-6, 53], [8, 76], [-9, 78],
        [-11, 83], [9, 52], [0, 67], [-5, 90], [1, 67], [-15, 72], [-5, 75], [-8, 80], [-21, 83],
        [-21, 64], [-13, 31], [-25, 64], [-29, 94], [9, 75], [17, 63], [-8, 74], [-5, 35],
        [-2, 27], [13, 91], [3, 65], [-7, 69], [8, 77], [-10, 66], [3, 62], [-3, 68], [-20, 81],
        [0, 30], [1, 7], [-3, 23], [-21, 74], [16, 66], [-23, 124], [17, 37], [44, -18], [50, -34],
        [-22, 127], [4, 39], [0, 42], [7, 34], [11, 29], [8, 31], [6, 37], [7, 42], [3, 40],
        [8, 33], [13, 43], [13, 36], [4, 47], [3, 55], [2, 58], [6, 60], [8, 44], [11, 44],
        [14, 42], [7, 48], [4, 56], [4, 52], [13, 37], [9, 49], [19, 58], [10, 48], [12, 45],
        [0, 69], [20, 33], [8, 63], [35, -18], [33, -25], [28, -3], [24, 10], [27, 0], [34, -14],
        [52, -44], [39, -24], [19, 17], [31, 25], [36, 29], [24, 33], [34, 15], [30, 20], [22, 73],
        [20, 34], [19, 31], [27, 44], [19, 16], [15, 36], [15, 36], [21, 28], [25, 21], [30, 20],
        [31, 12], [27, 16], [24, 42], [0, 93], [14, 56], [15, 57], [26, 38], [-24, 127],
        [-24, 115], [-22, 82], [-9, 62], [0, 53], [0, 59], [-14, 85], [-13, 89], [-13, 94],
        [-11, 92], [-29, 127], [-21, 100], [-14, 57], [-12, 67], [-11, 71], [-10, 77], [-21, 85],
        [-16, 88], [-23, 104], [-15, 98], [-37, 127], [-10, 82], [-8, 48], [-8, 61], [-8, 66],
        [-7, 70], [-14, 75], [-10, 79], [-9, 83], [-12, 92], [-18, 108], [-4, 79], [-22, 69],
        [-16, 75], [-2, 58], [1, 58], [-13, 78], [-9, 83], [-4, 81], [-13, 99], [-13, 81],
        [-6, 38], [-13, 62], [-6, 58], [-2, 59], [-16, 73], [-10, 76], [-13, 86], [-9, 83],
        [-10, 87], [0, 0], [-22, 127], [-25, 127], [-25, 120], [-27, 127], [-19, 114], [-23, 117],
        [-25, 118], [-26, 117], [-24, 113], [-28, 118], [-31, 120], [-37, 124], [-10, 94],
        [-15, 102], [-10, 99], [-13, 106], [-50, 127], [-5, 92], [17, 57], [-5, 86], [-13, 94],
        [-12, 91], [-2, 77], [0, 71], [-1, 73], [4, 64], [-7, 81], [5, 64], [15, 57], [1, 67],
        [0, 68], [-10, 67], [1, 68], [0, 77], [2, 64], [0, 68], [-5, 78], [7, 55], [5, 59],
        [2, 65], [14, 54], [15, 44], [5, 60], [2, 70], [-2, 76], [-18, 86], [12, 70], [5, 64],
        [-12, 70], [11, 55], [5, 56], [0, 69], [2, 65], [-6, 74], [5, 54], [7, 54], [-6, 76],
        [-11, 82], [-2, 77], [-2, 77], [25, 42], [17, -13], [16, -9], [17, -12], [27, -21],
        [37, -30], [41, -40], [42, -41], [48, -47], [39, -32], [46, -40], [52, -51], [46, -41],
        [52, -39], [43, -19], [32, 11], [61, -55], [56, -46], [62, -50], [81, -67], [45, -20],
        [35, -2], [28, 15], [34, 1], [39, 1], [30, 17], [20, 38], [18, 45], [15, 54], [0, 79],
        [36, -16], [37, -14], [37, -17], [32, 1], [34, 15], [29, 15], [24, 25], [34, 22], [31, 16],
        [35, 18], [31, 28], [33, 41], [36, 28], [27, 47], [21, 62], [18, 31], [19, 26], [36, 24],
        [24, 23], [27, 16], [24, 30], [31, 29], [22, 41], [22, 42], [16, 60], [15, 52], [14, 60],
        [3, 78], [-16, 123], [21, 53], [22, 56], [25, 61], [21, 33], [19, 50], [17, 61], [-3, 78],
        [-8, 74], [-9, 72], [-10, 72], [-18, 75], [-12, 71], [-11, 63], [-5, 70], [-17, 75],
        [-14, 72], [-16, 67], [-8, 53], [-14, 59], [-9, 52], [-11, 68], [9, -2], [30, -10],
        [31, -4], [33, -1], [33, 7], [31, 12], [37, 23], [31, 38], [20, 64], [-9, 71], [-7, 37],
        [-8, 44], [-11, 49], [-10, 56], [-12, 59], [-8, 63], [-9, 67], [-6, 68], [-10, 79],
        [-3, 78], [-8, 74], [-9, 72], [-10, 72], [-18, 75], [-12, 71], [-11, 63], [-5, 70],
        [-17, 75], [-14, 72], [-16, 67], [-8, 53], [-14, 59], [-9, 52], [-11, 68], [9, -2],
        [30, -10], [31, -4], [33, -1], [33, 7], [31, 12], [37, 23], [31, 38], [20, 64],
    ],
];

/// Size in bytes of the decoder CABAC table section.
pub const DEC_TABLE_SIZE: usize = 3712;

/// Decoder CABAC table: the three P/B context sets followed by the I set, packed as
/// little-endian words.
pub const DEC_TABLE: [u32; 926] = [
    0x3602f114, 0xf1144a03, 0x4a033602, 0x68e97fe4, 0x36ff35fa, 0x21173307, 0x00150217, 0x31000901,
    0x390576db, 0x41f54ef3, 0x310c3e01, 0x321149fc, 0x2b094012, 0x431a001d, 0x68095a10, 0x68ec7fd2,
    0x4ef34301, 0x3e0141f5, 0x5fef56fa, 0x2d093dfa, 0x51fa45fd, 0x370660f5, 0x56fb4307, 0x3a005802,
    0x5ef64cfd, 0x45043605, 0x580051fd, 0x4afb43f9, 0x50fb4afc, 0x3a0148f9, 0x3f002900, 0x3f003f00,
    0x560453f7, 0x48f96100, 0x3e03290d, 0x4efc2d00, 0x7ee560fd, 0x65e762e4, 0x52e443e9, 0x53f05eec,
    0x5beb6eea, 0x5df366ee, 0x5cf97fe3, 0x60f959fb, 0x2efd6cf3, 0x39ff41ff, 0x4afd5df7, 0x57f85cf7,
    0x36057ee9, 0x3b063c06, 0x30ff4506, 0x45fc4400, 0x55fe58f8, 0x4bff4efa, 0x36024df9, 0x44fd3205,
    0x2a063201, 0x3f0151fc, 0x430046fc, 0x4cfe3902, 0x4004230b, 0x230b3d01, 0x180c1912, 0x240d1d0d,
    0x49f95df6, 0x2e0d49fe, 0x64f93109, 0x35023509, 0x3dfe3505, 0x38003800, 0x3cfb3ff3, 0x39043eff,
    0x390445fa, 0x3304270e, 0x4003440d, 0x3f093d01, 0x27103207, 0x34042c05, 0x3cfb300b, 0x3b003bff,
    0x2c052116, 0x4eff2b0e, 0x45093c00, 0x28021c0b, 0x31002c03, 0x2c022e00, 0x2f003302, 0x3e022704,
    0x36002e06, 0x3a023603, 0x33063f04, 0x35073906, 0x37063406, 0x240e2d0b, 0x52ff3508, 0x4efd3707,
    0x1f162e0f, 0x071954ff, 0x031cf91e, 0x0020041c, 0x061eff22, 0x0920061e, 0x1b1a131f, 0x14251e1a,
    0x4611221c, 0x3b054301, 0x1e104309, 0x23122012, 0x1f181d16, 0x2b122617, 0x3f0b2914, 0x40093b09,
    0x59fe5eff, 0x4cfa6cf7, 0x2d002cfe, 0x40fd3400, 0x46fc3bfe, 0x52f84bfc, 0x4df766ef, 0x2a001803,
    0x37003000, 0x47f93bfa, 0x57f553f4, 0x3a0177e2, 0x24ff1dfd, 0x2b022601, 0x3a0037fa, 0x4afd4000,
    0x46005af6, 0x1f051dfc, 0x3b012a07, 0x48fd3afe, 0x61f551fd, 0x05083a00, 0x120e0e0a, 0x28021b0d,
    0x46fd3a00, 0x55f84ffa, 0x6af30000, 0x57f66af0, 0x6eee72eb, 0x6eea62f2, 0x67ee6aeb, 0x6ce96beb,
    0x60f670e6, 0x5bfb5ff4, 0x5eea5df7, 0x430956fb, 0x55f650fc, 0x3c0746ff, 0x3d053a09, 0x320f320c,
    0x36113112, 0x2e07290a, 0x310733ff, 0x29093408, 0x37022f06, 0x2c0a290d, 0x35053206, 0x3f04310d,
    0x45fe4006, 0x46063bfe, 0x1f092c0a, 0x35032b0c, 0x260a220e, 0x280d34fd, 0x2c072011, 0x320d2607,
    0x2b1a390a, 0x0e0b0b0e, 0x0b120b09, 0xfe170915, 0xf120f120, 0xe927eb22, 0xe129df2a, 0xf426e42e,
    0xe82d1d15, 0xe630d335, 0xed2bd541, 0x091ef627, 0x1b141a12, 0x52f23900, 0x61ed4bfb, 0x001b7ddd,
    0xfc1f001c, 0x0822061b, 0x16180a1e, 0x20161321, 0x29151f1a, 0x2f172c1a, 0x470e4110, 0x3f063c08,
    0x18154111, 0x171a1417, 0x171c201b, 0x2817181c, 0x1d1c2018, 0x39132a17, 0x3d163516, 0x280c560b,
    0x3b0e330b, 0x47f94ffc, 0x46f745fb, 0x44f642f8, 0x45f449ed, 0x43f146f0, 0x46ed3eec, 0x41ea42f0,
    0xfe093fec, 0xf721f71a, 0xfe29f927, 0x0931032d, 0x3b241b2d, 0x23f942fa, 0x2df82af9, 0x38f430fb,
    0x3efb3cfa, 0x4cf842f8, 0x51fa55fb, 0x51f94df6, 0x49ee50ef, 0x53f64afc, 0x43f747f7, 0x42f83dff,
    0x3b0042f2, 0xf3153b02, 0xf927f221, 0x0233fe2e, 0x113d063c, 0x3e2a2237, 0x00000000, 0x00000000,
    0x3602f114, 0xf1144a03, 0x4a033602, 0x68e97fe4, 0x36ff35fa, 0x19163307, 0x00100022, 0x290409fe,
    0x410276e3, 0x4ff347fa, 0x32093405, 0x360a46fd, 0x1613221a, 0x02390028, 0x451a2429, 0x65f17fd3,
    0x47fa4cfc, 0x34054ff3, 0x5af34506, 0x2b083400, 0x52fb45fe, 0x3b0260f6, 0x57fd4b02, 0x380164fd,
    0x55fa4afd, 0x51fd3b00, 0x5ffb56f9, 0x4dff42ff, 0x56fe4601, 0x3d0048fb, 0x3f002900, 0x3f003f00,
    0x560453f7, 0x48f96100, 0x3e03290d, 0x33070f0d, 0x7fd95002, 0x60ef5bee, 0x62dd51e6, 0x61e966e8,
    0x63e877e5, 0x66ee6eeb, 0x50007fdc, 0x5ef959fb, 0x27005cfc, 0x54f14100, 0x49fe7fdd, 0x5bf768f4,
    0x37037fe1, 0x37073807, 0x35fd3d08, 0x4af94400, 0x67f358f7, 0x59f75bf3, 0x4cf85cf2, 0x6ee957f4,
    0x4ef669e8, 0x63ef70ec, 0x7fba7fb2, 0x7fd27fce, 0x4efb42fc, 0x48f847fc, 0x37ff3b02, 0x4bfa46f9,
    0x77de59f8, 0x14204bfd, 0x7fd4161e, 0x3dfb3600, 0x3cff3a00, 0x43f83dfd, 0x4af254e7, 0x340541fb,
    0x3d003902, 0x46f545f7, 0x47fc3712, 0x3d073a00, 0x19122909, 0x2b052009, 0x2c002f09, 0x2e023300,
    0x42fc2613, 0x2a0c260f, 0x59002209, 0x1c0a2d04, 0xf5211f0a, 0x0f12d534, 0xea23001c, 0x0022e726,
    0xf420ee27, 0x0000a266, 0xfc21f138, 0xfb250a1d, 0xf727e333, 0xc645de34, 0xfb2cc143, 0xe3370720,
    0x00000120, 0xe721241b, 0xe424e222, 0xe526e426, 0xf023ee22, 0xf820f222, 0x0023fa25, 0x121c0a1e,
    0x291d191a, 0x48024b00, 0x230e4d08, 0x23111f12, 0x2d111e15, 0x2d122a14, 0x36101a1b, 0x38104207,
    0x430a490b, 0x70e974f6, 0x3df947f1, 0x42fb3500, 0x50f74df5, 0x57f654f7, 0x65eb7fde, 0x35fb27fd,
    0x4bf53df9, 0x5bef4df1, 0x6fe76be7, 0x4cf57ae4, 0x34f62cf6, 0x3af739f6, 0x45f948f0, 0x4afb45fc,
    0x420256f7, 0x200122f7, 0x34051f0b, 0x43fe37fe, 0x59f84900, 0x04073403, 0x0811080a, 0x25031310,
    0x49fb3dff, 0x4efc46ff, 0x7eeb0000, 0x6eec7ce9, 0x7ce77ee6, 0x79e569ef, 0x66ef75e5, 0x74e575e6,
    0x5ff67adf, 0x5ff864f2, 0x72e46fef, 0x50fe59fa, 0x55f752fc, 0x48ff51f8, 0x43014005, 0x45003809,
    0x45074501, 0x43fa45f9, 0x40fe4df0, 0x43fa3d02, 0x390240fd, 0x42fd41fd, 0x33093e00, 0x47fe42ff,
    0x46ff4bfe, 0x3c0e48f7, 0x2f002510, 0x250b2312, 0x290a290c, 0x290c3002, 0x3b00290d, 0x28133203,
    0x32124203, 0xfa12fa13, 0xf41a000e, 0xe721f01f, 0xe425ea21, 0xe22ae227, 0xdc2dd62f, 0xef29de31,
    0xb9450920, 0xc042c13f, 0xd936b64d, 0xf629dd34, 0xff280024, 0x1a1c0e1e, 0x370c2517, 0xdf25410b,
    0xdb28dc27, 0xdf2ee226, 0xe828e22a, 0xf426e331, 0xfd26f628, 0x141ffb2e, 0x2c191e1d, 0x310b300c,
    0x16162d1a, 0x151b1617, 0x1c1a1421, 0x221b181e, 0x27192a12, 0x460c3212, 0x470e3615, 0x2019530b,
    0x36153115, 0x51fa55fb, 0x51f94df6, 0x49ee50ef, 0x53f64afc, 0x43f747f7, 0x42f83dff, 0x3b0042f2,
    0xf6113b02, 0xf72af320, 0x0035fb31, 0x0a440340, 0x392f1b42, 0x180047fb, 0x2afe24ff, 0x39f734fe,
    0x41fc3ffa, 0x52f943fc, 0x4cfd51fd, 0x4efa48f9, 0x44f248f4, 0x4cfa46fd, 0x3efb42fb, 0x3dfc3900,
    0x36013cf7, 0xf6113a02, 0xf72af320, 0x0035fb31, 0x0a440340, 0x392f1b42, 0x00000000, 0x00000000,
    0x3602f114, 0xf1144a03, 0x4a033602, 0x68e97fe4, 0x36ff35fa, 0x101d3307, 0x000e0019, 0x3efd33f6,
    0x101a63e5, 0x66e855fc, 0x39063905, 0x390e49ef, 0x0a142814, 0x0036001d, 0x610c2a25, 0x75ea7fe0,
    0x55fc4afe, 0x390566e8, 0x58f25dfa, 0x37042cfa, 0x67f159f5, 0x391374eb, 0x54043a14, 0x3f016006,
    0x6af355fb, 0x4b063f05, 0x65ff5afd, 0x4ffc3703, 0x61f44bfe, 0x3c0132f9, 0x3f002900, 0x3f003f00,
    0x560453f7, 0x48f96100, 0x3e03290d, 0x58f72207, 0x7fdc7fec, 0x5ff25bef, 0x56e754e7, 0x5bef59f4,
    0x4cf27fe1, 0x5af367ee, 0x500b7fdb, 0x54024c05, 0x37fa4e05, 0x53f23d04, 0x4ffb7fdb, 0x5bf568f5,
    0x41007fe2, 0x48004ffe, 0x38fa5cfc, 0x47f84403, 0x56fc62f3, 0x52fb58f4, 0x43fc48fd, 0x59f048f8,
    0x3bff45f7, 0x39044205, 0x47fe47fc, 0x4aff3a02, 0x45ff2cfc, 0x33f93e00, 0x2afa2ffc, 0x35fa29fd,
    0x4ef74c08, 0x340953f5, 0x5afb4300, 0x48f14301, 0x50f84bfb, 0x40eb53eb, 0x40e71ff3, 0x4b095ee3,
    0x4af83f11, 0x1bfe23fb, 0x41035b0d, 0x4d0845f9, 0x3e0342f6, 0x51ec44fd, 0x07011e00, 0x4aeb17fd,
    0x7ce94210, 0xee2c2511, 0x7feade32, 0x2a002704, 0x1d0b2207, 0x25061f08, 0x28032a07, 0x2b0d2108,
    0x2f04240d, 0x3a023703, 0x2c083c06, 0x2a0e2c0b, 0x38043007, 0x250d3404, 0x3a133109, 0x2d0c300a,
    0x21144500, 0xee233f08, 0xfd1ce721, 0x001b0a18, 0xd434f222, 0x1113e827, 0x1d24191f, 0x0f222118,
    0x4916141e, 0x1f132214, 0x10132c1b, 0x240f240f, 0x15191c15, 0x0c1f141e, 0x2a18101b, 0x380e5d00,
    0x261a390f, 0x73e87fe8, 0x3ef752ea, 0x3b003500, 0x59f355f2, 0x5cf55ef3, 0x64eb7fe3, 0x43f439f2,
    0x4df647f5, 0x58f055eb, 0x62f168e9, 0x52f67fdb, 0x3df830f8, 0x46f942f8, 0x4ff64bf2, 0x5cf453f7,
    0x4ffc6cee, 0x4bf045ea, 0x3a013afe, 0x53f74ef3, 0x63f351fc, 0x26fa51f3, 0x3afa3ef3, 0x49f03bfe,
    0x56f34cf6, 0x57f653f7, 0x7fea0000, 0x78e77fe7, 0x72ed7fe5, 0x76e775e9, 0x71e875e6, 0x78e176e4,
    0x5ef67cdb, 0x63f666f1, 0x7fce6af3, 0x39115cfb, 0x5ef356fb, 0x4dfe5bf4, 0x49ff4700, 0x51f94004,
    0x390f4005, 0x44004301, 0x440143f6, 0x40024d00, 0x4efb4400, 0x3b053707, 0x360e4102, 0x3c052c0f,
    0x4cfe4602, 0x460c56ee, 0x46f44005, 0x3805370b, 0x41024500, 0x36054afa, 0x4cfa3607, 0x4dfe52f5,
    0x2a194dfe, 0xf710f311, 0xeb1bf411, 0xd829e225, 0xd130d72a, 0xd82ee027, 0xd72ecd34, 0xed2bd934,
    0xc93d0b20, 0xce3ed238, 0xec2dbd51, 0x0f1cfe23, 0x01270122, 0x2614111e, 0x360f2d12, 0xf0244f00,
    0xef25f225, 0x0f220120, 0x19180f1d, 0x101f1622, 0x1c1f1223, 0x1c242921, 0x3e152f1b, 0x1a131f12,
    0x17181824, 0x1e18101b, 0x29161d1f, 0x3c102a16, 0x3c0e340f, 0x7bf04e03, 0x38163515, 0x21153d19,
    0x3d113213, 0x4af84efd, 0x48f648f7, 0x47f44bee, 0x46fb3ff5, 0x48f24bef, 0x35f843f0, 0x34f73bf2,
    0xfe0944f5, 0xfc1ff61e, 0x0721ff21, 0x17250c1f, 0x4014261f, 0x25f947f7, 0x31f52cf8, 0x3bf438f6,
    0x43f73ff8, 0x4ff644fa, 0x4af84efd, 0x48f648f7, 0x47f44bee, 0x46fb3ff5, 0x48f24bef, 0x35f843f0,
    0x34f73bf2, 0xfe0944f5, 0xfc1ff61e, 0x0721ff21, 0x17250c1f, 0x4014261f, 0x00000000, 0x00000000,
    0x3602f114, 0xf1144a03, 0x4a033602, 0x68e97fe4, 0x36ff35fa, 0x00003307, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x3f002900, 0x3f003f00,
    0x560453f7, 0x48f96100, 0x3e03290d, 0x37010b00, 0x7fef4500, 0x520066f3, 0x6beb4af9, 0x7fe17fe5,
    0x5fee7fe8, 0x72eb7fe5, 0x7bef7fe2, 0x7af073f4, 0x3ff473f5, 0x54f144fe, 0x46fd68f3, 0x5af65df8,
    0x4aff7fe2, 0x5bf961fa, 0x38fc7fec, 0x4cf952fb, 0x5df97dea, 0x4dfd57f5, 0x3ffc47fb, 0x54f444fc,
    0x41f93ef9, 0x38053d08, 0x400142fe, 0x4efe3d00, 0x34073201, 0x2c00230a, 0x2d01260b, 0x2c052e00,
    0x3301111f, 0x131c3207, 0x3e0e2110, 0x64f16cf3, 0x5bf365f3, 0x58f65ef4, 0x56f654f0, 0x57f353f9,
    0x46015eed, 0x4afb4800, 0x66f83b12, 0x5f0064f1, 0x48024bfc, 0x47fd4bf5, 0x45f32e0f, 0x41003e00,
    0x48f12515, 0x36103909, 0x480c3e00, 0x090f0018, 0x120d1908, 0x130d090f, 0x120c250a, 0x21141d06,
    0x2d041e0f, 0x3e003a01, 0x260c3d07, 0x270f2d0b, 0x2c0d2a0b, 0x290c2d10, 0x221e310a, 0x370a2a12,
    0x2e113311, 0xed1a5900, 0xef1aef16, 0xec1ce71e, 0xe525e921, 0xe428e921, 0xf521ef26, 0xfa29f128,
    0x11290126, 0x031bfa1e, 0xf025161a, 0xf826fc23, 0x0325fd26, 0x002a0526, 0x16271023, 0x251b300e,
    0x440c3c15, 0x47fd6102, 0x32fb2afa, 0x3efe36fd, 0x3f013a00, 0x4aff48fe, 0x43fb5bf7, 0x27fd1bfb,
    0x2e002cfe, 0x44f840f0, 0x4dfa4ef6, 0x5cf456f6, 0x3cf637f1, 0x41fc3efa, 0x4cf849f4, 0x58f750f9,
    0x61f56eef, 0x4ff554ec, 0x4afc49fa, 0x60f356f3, 0x75ed61f5, 0x21fb4ef8, 0x35fe30fc, 0x47f33efd,
    0x56f44ff6, 0x61f25af3, 0x5dfa0000, 0x4ff854fa, 0x47ff4200, 0x3cfe3e00, 0x4bfb3bfe, 0x3afc3efd,
    0x4fff42f7, 0x44034700, 0x3ef92c0a, 0x280e240f, 0x1d0c1b10, 0x24142c01, 0x2a052012, 0x3e0a3001,
    0x40092e11, 0x61f568f4, 0x58f960f0, 0x55f955f8, 0x58f355f7, 0x4dfd4204, 0x4cfa4cfd, 0x4cff3a0a,
    0x63f953ff, 0x5f025ff2, 0x4afb4c00, 0x4bf54600, 0x41004401, 0x3e0349f2, 0x44ff3e04, 0x370b4bf3,
    0x460c4005, 0x1306060f, 0x0e0c1007, 0x0b0d0d12, 0x100f0f0d, 0x170d170c, 0x1a0e140f, 0x28112c0e,
    0x11182f11, 0x16191515, 0x1d161b1f, 0x320e2313, 0x3f07390a, 0x52fc4dfe, 0x45095efd, 0xdd246df4,
    0xe620de24, 0xe02ce225, 0xf122ee22, 0xf921f128, 0x0021fb23, 0x0d210226, 0x3a0d2317, 0x001afd1d,
    0xf91f1e16, 0xfd22f123, 0xff240322, 0x0b200522, 0x0c220523, 0x1d1e0b27, 0x271d1a22, 0x151f4213,
    0x32191f1f, 0x70ec78ef, 0x55f572ee, 0x59f25cf1, 0x51f147e6, 0x440050f2, 0x38e846f2, 0x32e844e9,
    0xf3174af5, 0xf128f31a, 0x032cf231, 0x222c062d, 0x52133621, 0x17ff4bfd, 0x2b012201, 0x37fe3600,
    0x40013d00, 0x5cf74400, 0x61f36af2, 0x5af45af1, 0x49f658ee, 0x56f24ff7, 0x46f649f6, 0x42fb45f6,
    0x3afb40f7, 0xf6153b02, 0xf81cf518, 0x031dff1c, 0x1423091d, 0x430e241d,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_state() {
        // pre = clip(1, 126, ((20 * 26) >> 4) - 15) = 17
        assert_eq!(init_state(20, -15, 26), (63 - 17) << 1);
        // Clipped to 126.
        assert_eq!(init_state(0, 200, 0), ((126 - 64) << 1) | 1);
        // Clipped to 1.
        assert_eq!(init_state(-28, 0, 51), 62 << 1);
        assert_eq!(init_state(0, 64, 0), 1);
    }

    #[test]
    fn test_encoder_table_deterministic() {
        for idc in [CabacInitIdc::Idc0, CabacInitIdc::Idc1, CabacInitIdc::Idc2] {
            let mut a = vec![0xffu8; ENC_TABLE_SIZE];
            let mut b = vec![0x00u8; ENC_TABLE_SIZE];
            build_encoder_table(&mut a, idc).unwrap();
            build_encoder_table(&mut b, idc).unwrap();
            assert_eq!(a, b);

            for qp in 0..NUM_QP {
                let intra = &a[qp * 2 * CTX_STRIDE..][..CTX_STRIDE];
                let inter = &a[qp * 2 * CTX_STRIDE + CTX_STRIDE..][..CTX_STRIDE];
                for i in 0..NUM_CTX {
                    let [m, n] = CONTEXT_INIT_I[i];
                    assert_eq!(intra[i], init_state(m as i32, n as i32, qp as i32));
                    let [m, n] = CONTEXT_INIT_PB[idc as usize][i];
                    assert_eq!(inter[i], init_state(m as i32, n as i32, qp as i32));
                }
                assert!(intra[NUM_CTX..].iter().all(|&x| x == 0));
                assert!(inter[NUM_CTX..].iter().all(|&x| x == 0));
            }
        }
    }

    #[test]
    fn test_encoder_table_depends_on_idc() {
        let mut a = vec![0u8; ENC_TABLE_SIZE];
        let mut b = vec![0u8; ENC_TABLE_SIZE];
        build_encoder_table(&mut a, CabacInitIdc::Idc0).unwrap();
        build_encoder_table(&mut b, CabacInitIdc::Idc2).unwrap();
        // Intra blocks are shared, inter blocks differ.
        assert_eq!(a[..CTX_STRIDE], b[..CTX_STRIDE]);
        assert_ne!(a[CTX_STRIDE..2 * CTX_STRIDE], b[CTX_STRIDE..2 * CTX_STRIDE]);
    }

    #[test]
    fn test_short_table_rejected() {
        let mut t = vec![0u8; ENC_TABLE_SIZE - 1];
        assert!(build_encoder_table(&mut t, CabacInitIdc::Idc1).is_err());
    }

    #[test]
    fn test_decoder_table_fits_section() {
        assert!(DEC_TABLE.len() * 4 <= DEC_TABLE_SIZE);
        assert_eq!(DEC_TABLE[0], 0x3602f114);
    }
}
