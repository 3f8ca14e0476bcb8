// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Package provenance and the dispatch hash.
//!
//! Every package is identified by the (source, instance, cycle) triple of
//! its producer plus the virtual address of the memory region it was taken
//! from. [`package_hash`] folds that into the u64 key all dispatch tables
//! are indexed by. A collision there silently misroutes data, so the hash
//! is built from a provably injective bit-field packing: the final mixing
//! stage spreads bits for table distribution but is a bijection on u64 and
//! cannot introduce collisions the packing did not already have.

/// Provenance of one package instance.
///
/// Immutable once attached to a package. `source_id` is 16 bit by domain
/// convention (recorder source ids); instance and cycle are small counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackageMetaInfo {
    pub source_id: u16,
    pub instance_number: u32,
    pub cycle_id: u32,
    pub virtual_address: u64,
}

/// Bit width reserved for `instance_number` in the packed key.
///
/// Instances beyond 2^16 alias into the cycle field and degrade uniqueness;
/// that is an accepted limitation, not an error.
const INSTANCE_BITS: u32 = 16;

/// splitmix64 finalizer. Bijective on u64 (every stage is invertible).
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash a package's meta info into its dispatch key.
///
/// Pure and infallible. For any two metas with equal `virtual_address` but
/// distinct (source_id, instance_number < 2^16, cycle_id) the result is
/// guaranteed distinct: source, instance and cycle occupy non-overlapping
/// bit fields of the packed word, the virtual address contributes through a
/// fixed XOR mask, and the final mix is bijective.
#[must_use]
pub fn package_hash(meta: &PackageMetaInfo) -> u64 {
    let packed = (u64::from(meta.source_id) << 48)
        | (u64::from(meta.instance_number & ((1 << INSTANCE_BITS) - 1)) << 32)
        | u64::from(meta.cycle_id);
    mix64(packed ^ mix64(meta.virtual_address))
}
