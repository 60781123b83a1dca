// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod arithmetic;
pub mod constant;
pub mod format;
pub mod pooled_scale;
pub mod pooled_sum;
pub mod recorder;

pub use arithmetic::*;
pub use constant::*;
pub use format::*;
pub use pooled_scale::*;
pub use pooled_sum::*;
pub use recorder::*;
