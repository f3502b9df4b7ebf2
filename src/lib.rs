// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register, table and run control for the Rockchip VPU codec blocks.
//!
//! A [`device::Device`] owns the register windows of one VPU instance and runs at most one job at
//! a time on it. Sessions are opened as [`context::CodecContext`]s bound to one codec mode; each
//! run programs the auxiliary tables and registers of that mode through its backend, starts the
//! hardware and completes through the interrupt handler or the watchdog.

pub mod aux_buf;
pub mod backend;
pub mod bitstream_utils;
pub mod codec;
pub mod context;
pub mod device;
pub mod regs;
pub mod utils;

use std::str::FromStr;

use thiserror::Error;

use crate::aux_buf::AllocError;
use crate::bitstream_utils::TableWriterError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width in macroblocks, rounded up.
    pub fn mb_width(&self) -> u32 {
        utils::mb_width(self.width)
    }

    /// Height in macroblocks, rounded up.
    pub fn mb_height(&self) -> u32 {
        utils::mb_height(self.height)
    }
}

/// Layout of the raw frames fed to the encoders.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    #[default]
    NV12,
    I420,
}

impl PixelFormat {
    /// Value of the encoder's input format field.
    pub fn encoder_input_format(&self) -> u32 {
        match self {
            PixelFormat::I420 => 0,
            PixelFormat::NV12 => 1,
        }
    }

    pub fn num_planes(&self) -> usize {
        match self {
            PixelFormat::NV12 => 2,
            PixelFormat::I420 => 3,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nv12" | "NV12" => Ok(PixelFormat::NV12),
            "i420" | "I420" => Ok(PixelFormat::I420),
            _ => Err("unrecognized pixel format. Valid values: nv12, i420"),
        }
    }
}

/// Format negotiated for a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameFormat {
    /// Coded size of the frames.
    pub coded: Resolution,
    /// Layout of the raw frames: encoder input or decoder output.
    pub pixel_format: PixelFormat,
}

impl FrameFormat {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            coded: Resolution::new(width, height),
            pixel_format,
        }
    }

    /// Size of a macroblock-aligned luma plane.
    pub fn mb_aligned_luma_size(&self) -> usize {
        (self.coded.mb_width() * self.coded.mb_height()) as usize
            * (utils::MB_DIM * utils::MB_DIM) as usize
    }
}

/// Error returned by the device, its contexts and the codec backends.
#[derive(Error, Debug)]
pub enum VpuError {
    #[error("auxiliary buffer allocation failed: {0}")]
    Allocation(#[from] AllocError),
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),
    #[error("a job is already running on the device")]
    Busy,
    #[error("powering on the device failed: {0}")]
    PowerOn(anyhow::Error),
    #[error("run parameters do not match the codec mode of the context")]
    ContextMismatch,
    #[error("table packing failed: {0}")]
    Table(#[from] TableWriterError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type VpuResult<T> = Result<T, VpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format() {
        let fmt = FrameFormat::new(1920, 1080, "i420".parse().unwrap());
        assert_eq!(fmt.pixel_format, PixelFormat::I420);
        assert_eq!(fmt.coded.mb_width(), 120);
        assert_eq!(fmt.coded.mb_height(), 68);
        assert_eq!(fmt.mb_aligned_luma_size(), 1920 * 1088);
        assert!("yuyv".parse::<PixelFormat>().is_err());
    }
}
