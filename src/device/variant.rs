// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Static descriptions of the supported VPU instances.

use std::time::Duration;

use crate::backend::Codec;
use crate::backend::CodecMode;
use crate::backend::Direction;
use crate::backend::HwBlock;
use crate::regs::rkvdec;
use crate::regs::vdpu;
use crate::regs::vepu;

/// Placement of one block's registers inside the device window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterWindow {
    pub block: HwBlock,
    pub offset: usize,
    pub len: usize,
}

/// One VPU instance: where its blocks live, what it can run and how it is clocked.
#[derive(Debug, PartialEq, Eq)]
pub struct VpuVariant {
    pub name: &'static str,
    pub windows: &'static [RegisterWindow],
    pub modes: &'static [CodecMode],
    /// Rate requested for the bus clock at device creation.
    pub aclk_rate: u64,
    /// Idle time after which runtime power management may suspend the device.
    pub autosuspend_delay: Duration,
}

const ACLK_RATE: u64 = 400_000_000;
const AUTOSUSPEND_DELAY: Duration = Duration::from_millis(100);

const VPU_WINDOWS: [RegisterWindow; 2] = [
    RegisterWindow {
        block: HwBlock::Vepu,
        offset: 0x0,
        len: vepu::WINDOW_SIZE,
    },
    RegisterWindow {
        block: HwBlock::Vdpu,
        offset: 0x400,
        len: vdpu::WINDOW_SIZE,
    },
];

pub static RK3288_VPU: VpuVariant = VpuVariant {
    name: "rk3288-vpu",
    windows: &VPU_WINDOWS,
    modes: &[
        CodecMode::Vp8Encode,
        CodecMode::Vp8Decode,
        CodecMode::H264Encode,
    ],
    aclk_rate: ACLK_RATE,
    autosuspend_delay: AUTOSUSPEND_DELAY,
};

pub static RK3228_VPU: VpuVariant = VpuVariant {
    name: "rk3228-vpu",
    windows: &VPU_WINDOWS,
    modes: &[CodecMode::Vp8Decode, CodecMode::H264Encode],
    aclk_rate: ACLK_RATE,
    autosuspend_delay: AUTOSUSPEND_DELAY,
};

pub static RKVDEC: VpuVariant = VpuVariant {
    name: "rkvdec",
    windows: &[RegisterWindow {
        block: HwBlock::Rkvdec,
        offset: 0x0,
        len: rkvdec::WINDOW_SIZE,
    }],
    modes: &[CodecMode::H264Decode, CodecMode::Vp9Decode],
    aclk_rate: ACLK_RATE,
    autosuspend_delay: AUTOSUSPEND_DELAY,
};

impl VpuVariant {
    pub fn supports(&self, mode: CodecMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Mode running `codec` in `direction` on this instance, if it has one.
    pub fn select_mode(&self, direction: Direction, codec: Codec) -> Option<CodecMode> {
        CodecMode::new(direction, codec).filter(|mode| self.supports(*mode))
    }

    pub fn window(&self, block: HwBlock) -> Option<&RegisterWindow> {
        self.windows.iter().find(|w| w.block == block)
    }

    /// Bytes of device window covering every block.
    pub fn region_size(&self) -> usize {
        self.windows
            .iter()
            .map(|w| w.offset + w.len)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_mode() {
        assert_eq!(
            RK3288_VPU.select_mode(Direction::Encode, Codec::Vp8),
            Some(CodecMode::Vp8Encode)
        );
        assert_eq!(RK3228_VPU.select_mode(Direction::Encode, Codec::Vp8), None);
        assert_eq!(RK3288_VPU.select_mode(Direction::Decode, Codec::H264), None);
        assert_eq!(
            RKVDEC.select_mode(Direction::Decode, Codec::Vp9),
            Some(CodecMode::Vp9Decode)
        );
        assert_eq!(RKVDEC.select_mode(Direction::Encode, Codec::H264), None);
    }

    #[test]
    fn test_windows() {
        assert_eq!(RK3288_VPU.region_size(), 0x800);
        assert_eq!(RK3288_VPU.window(HwBlock::Vdpu).map(|w| w.offset), Some(0x400));
        assert!(RK3288_VPU.window(HwBlock::Rkvdec).is_none());
        assert_eq!(RKVDEC.region_size(), 0x480);

        // Every mode runs on a block the variant maps.
        for variant in [&RK3288_VPU, &RK3228_VPU, &RKVDEC] {
            for mode in variant.modes {
                assert!(variant.window(mode.block()).is_some(), "{}", variant.name);
            }
            assert_eq!(variant.aclk_rate, 400_000_000);
        }
    }
}
