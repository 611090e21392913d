// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared numeric helpers

pub mod math;

pub use math::{deg_to_rad, normalize, rotate_point, rotate_vector, try_normalize};
