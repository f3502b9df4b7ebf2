// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-codec frame parameters and the tables derived from them.
//!
//! Nothing in here parses bitstreams: the parameters are produced upstream and handed to the
//! backends, which only pack them into the layouts the hardware consumes.

pub mod h264;
pub mod vp8;
pub mod vp9;
