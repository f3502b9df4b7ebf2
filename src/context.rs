// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Codec sessions.

use std::sync::Arc;
use std::sync::Mutex;

use crate::backend::CodecMode;
use crate::backend::Feedback;
use crate::backend::FrameRunParameters;
use crate::backend::HwContext;
use crate::backend::RunResult;
use crate::device::lock;
use crate::device::DeviceInner;
use crate::FrameFormat;
use crate::VpuError;
use crate::VpuResult;

/// State of a session shared with the device while one of its jobs is in flight.
pub(crate) struct ContextState {
    /// `None` once the context is closed.
    pub(crate) hw: Option<HwContext>,
    pub(crate) format: FrameFormat,
    /// Device addresses of the destination buffers, indexed by the references of a run.
    pub(crate) dst_buffers: Vec<u32>,
}

/// One session bound to a codec mode on a device.
///
/// Every auxiliary buffer of the mode is allocated when the context is opened and freed, in
/// reverse order, when it is dropped. Dropping a context waits for its in-flight job to finish.
pub struct CodecContext {
    device: Arc<DeviceInner>,
    mode: CodecMode,
    state: Arc<Mutex<ContextState>>,
}

impl CodecContext {
    pub(crate) fn open(
        device: Arc<DeviceInner>,
        mode: CodecMode,
        format: FrameFormat,
    ) -> VpuResult<Self> {
        let variant = device.variant();
        if !variant.supports(mode) {
            return Err(VpuError::UnsupportedParameter(format!(
                "{:?} on {}",
                mode, variant.name
            )));
        }

        let hw = HwContext::init(mode, device.pool(), &format)?;
        log::debug!(
            "opened {:?} context for {}x{}",
            mode,
            format.coded.width,
            format.coded.height
        );

        Ok(Self {
            device,
            mode,
            state: Arc::new(Mutex::new(ContextState {
                hw: Some(hw),
                format,
                dst_buffers: Vec::new(),
            })),
        })
    }

    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    pub fn format(&self) -> FrameFormat {
        lock(&self.state).format
    }

    /// Registers the destination buffers that decoder references index into.
    pub fn set_dst_buffers(&self, addrs: Vec<u32>) {
        lock(&self.state).dst_buffers = addrs;
    }

    /// Starts one run. Returns once the hardware is started; `on_done` is called from the
    /// interrupt or watchdog path after the device is idle again. If this returns an error the
    /// run never started and `on_done` is dropped without being called.
    pub fn run<F>(&self, params: FrameRunParameters, on_done: F) -> VpuResult<()>
    where
        F: FnOnce(RunResult, Feedback) + Send + 'static,
    {
        self.device
            .run(&self.state, self.mode, params, Box::new(on_done))
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        self.device.wait_released(&self.state);
        if let Some(hw) = lock(&self.state).hw.take() {
            hw.exit(self.device.pool());
        }
        log::debug!("closed {:?} context", self.mode);
    }
}
