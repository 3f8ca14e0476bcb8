// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Package memory model and provenance identification.

mod memory;
mod meta;

pub use memory::{Package, PackageBuffer};
pub use meta::{package_hash, PackageMetaInfo};
