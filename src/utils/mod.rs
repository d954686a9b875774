// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Utility modules
//!
//! Common utilities for the atlas CLI.

pub mod colors;

pub use colors::*;
