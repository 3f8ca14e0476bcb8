// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exclusive-owner package buffers.
//!
//! A [`PackageBuffer`] owns its heap bytes outright. It deliberately does
//! not implement `Clone`: handoff between threads is always an ownership
//! transfer, never shared mutable aliasing.

use crate::package::meta::{package_hash, PackageMetaInfo};

/// Move-only heap byte buffer backing one package.
#[derive(Debug, PartialEq, Eq)]
pub struct PackageBuffer {
    data: Box<[u8]>,
}

impl PackageBuffer {
    /// Allocate a zeroed buffer of `size` bytes.
    #[must_use]
    pub fn zeroed(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Take ownership of existing bytes.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Release the buffer back as a `Vec`.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec()
    }
}

impl From<Vec<u8>> for PackageBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

/// One addressed binary data unit: buffer, provenance and capture time.
///
/// Constructed by the publisher on the send path and by the transport
/// adapter on the receive path; destroyed when the holding component drops
/// it (after `process_package` returns, after dispatch completes).
#[derive(Debug)]
pub struct Package {
    meta: PackageMetaInfo,
    buffer: PackageBuffer,
    /// Capture timestamp in microseconds, taken from the recording clock.
    timestamp_us: u64,
}

impl Package {
    #[must_use]
    pub fn new(meta: PackageMetaInfo, buffer: PackageBuffer, timestamp_us: u64) -> Self {
        Self {
            meta,
            buffer,
            timestamp_us,
        }
    }

    #[must_use]
    #[inline]
    pub fn meta(&self) -> &PackageMetaInfo {
        &self.meta
    }

    #[must_use]
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    /// Dispatch key for this package's provenance.
    #[must_use]
    pub fn hash(&self) -> u64 {
        package_hash(&self.meta)
    }

    /// Replace the payload, keeping meta and timestamp.
    ///
    /// Used by package processors that rewrite data before publish.
    #[must_use]
    pub fn with_payload(self, buffer: PackageBuffer) -> Self {
        Self { buffer, ..self }
    }

    /// Split the package into its parts.
    #[must_use]
    pub fn into_parts(self) -> (PackageMetaInfo, PackageBuffer, u64) {
        (self.meta, self.buffer, self.timestamp_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_ownership_round_trip() {
        let buf = PackageBuffer::from_vec(vec![1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_empty());
        let v = buf.into_vec();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn zeroed_allocation() {
        let buf = PackageBuffer::zeroed(16);
        assert_eq!(buf.len(), 16);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn package_accessors() {
        let meta = PackageMetaInfo {
            source_id: 22,
            instance_number: 42,
            cycle_id: 207,
            virtual_address: 0x2035_0000,
        };
        let pkg = Package::new(meta, PackageBuffer::from_vec(vec![0xAB; 8]), 1000);
        assert_eq!(pkg.meta().source_id, 22);
        assert_eq!(pkg.size(), 8);
        assert_eq!(pkg.timestamp_us(), 1000);
        assert_eq!(pkg.hash(), package_hash(&meta));

        let pkg = pkg.with_payload(PackageBuffer::from_vec(vec![1]));
        assert_eq!(pkg.size(), 1);
        assert_eq!(pkg.meta().cycle_id, 207);
    }
}
