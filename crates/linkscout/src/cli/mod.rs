// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command surface: the interactive menu and terminal output helpers.

pub mod menu;
pub mod output;
