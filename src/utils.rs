// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Utility functions used by several parts of this crate.
//!
//! This module is for anything that doesn't fit into the other top-level modules. Try not to add
//! new code here unless it really doesn't belong anywhere else.

use std::fmt::Debug;
use std::ops::Add;
use std::ops::Div;
use std::ops::Mul;
use std::ops::Sub;

/// Size of a macroblock side, in pixels.
pub const MB_DIM: u32 = 16;

/// Rounds `value` up to the next multiple of `alignment`.
pub fn align_up<T>(value: T, alignment: T) -> T
where
    T: Add<Output = T> + Sub<Output = T> + Div<Output = T> + Mul<Output = T> + From<u8> + Copy,
{
    ((value + alignment - T::from(1u8)) / alignment) * alignment
}

/// Number of macroblocks needed to cover `width` pixels.
pub fn mb_width(width: u32) -> u32 {
    width.div_ceil(MB_DIM)
}

/// Number of macroblocks needed to cover `height` pixels.
pub fn mb_height(height: u32) -> u32 {
    height.div_ceil(MB_DIM)
}

/// Clamps `value` into `[min, max]`.
pub fn clip3<T: PartialOrd + Debug>(min: T, max: T, value: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(1920u32, 256), 2048);
        assert_eq!(align_up(2048u32, 256), 2048);
        assert_eq!(align_up(1080u32, 16), 1088);
        assert_eq!(align_up(0usize, 64), 0);
    }

    #[test]
    fn test_mb_dimensions() {
        assert_eq!(mb_width(1920), 120);
        assert_eq!(mb_height(1080), 68);
        assert_eq!(mb_width(17), 2);
    }

    #[test]
    fn test_clip3() {
        assert_eq!(clip3(1, 126, 0), 1);
        assert_eq!(clip3(1, 126, 200), 126);
        assert_eq!(clip3(1, 126, 64), 64);
    }
}
