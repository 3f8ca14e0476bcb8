// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Randomized dispatch-hash properties beyond the exhaustive in-range grid.

use std::collections::HashSet;
use udex::{package_hash, PackageMetaInfo};

#[test]
fn random_metas_stay_collision_free_per_virtual_address() {
    fastrand::seed(0x5eed);
    let virtual_address = fastrand::u64(..);

    let mut seen = HashSet::new();
    let mut metas = HashSet::new();
    for _ in 0..50_000 {
        let meta = PackageMetaInfo {
            source_id: fastrand::u16(..),
            instance_number: u32::from(fastrand::u16(..)),
            cycle_id: fastrand::u32(..),
            virtual_address,
        };
        // only distinct metas may claim distinct hashes
        if metas.insert(meta) {
            assert!(seen.insert(package_hash(&meta)), "collision for {meta:?}");
        }
    }
}

#[test]
fn random_single_field_flips_change_the_hash() {
    fastrand::seed(0xfeed);
    for _ in 0..1_000 {
        let meta = PackageMetaInfo {
            source_id: fastrand::u16(..),
            instance_number: u32::from(fastrand::u16(..)),
            cycle_id: fastrand::u32(..),
            virtual_address: fastrand::u64(..),
        };
        let base = package_hash(&meta);

        let mut flipped = meta;
        flipped.source_id = flipped.source_id.wrapping_add(1);
        assert_ne!(package_hash(&flipped), base);

        let mut flipped = meta;
        flipped.cycle_id = flipped.cycle_id.wrapping_add(1);
        assert_ne!(package_hash(&flipped), base);

        let mut flipped = meta;
        flipped.virtual_address = flipped.virtual_address.wrapping_add(1);
        assert_ne!(package_hash(&flipped), base);
    }
}

#[test]
fn hash_is_deterministic_across_invocations() {
    let meta = PackageMetaInfo {
        source_id: 22,
        instance_number: 42,
        cycle_id: 207,
        virtual_address: 0x2035_0000,
    };
    let first = package_hash(&meta);
    for _ in 0..100 {
        assert_eq!(package_hash(&meta), first);
    }
}
