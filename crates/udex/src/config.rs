// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration.
//!
//! All tunables live in one context object handed to constructors. There is
//! no process-wide configuration state; two exchange stacks in the same
//! process can run with different settings.

use std::time::Duration;

/// Context object for the exchange stack.
#[derive(Debug, Clone)]
pub struct UdexConfig {
    /// Bound of the transport send queue, in packages.
    pub queue_capacity: usize,
    /// Publish timeout used when the caller does not pass one.
    pub default_publish_timeout: Duration,
    /// Map unsupported wire types to zero values instead of failing the
    /// cast. Off by default.
    pub lenient_casting: bool,
}

impl Default for UdexConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            default_publish_timeout: Duration::from_millis(100),
            lenient_casting: false,
        }
    }
}

impl UdexConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.default_publish_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_lenient_casting(mut self, lenient: bool) -> Self {
        self.lenient_casting = lenient;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = UdexConfig::default();
        assert_eq!(cfg.queue_capacity, 256);
        assert!(!cfg.lenient_casting);
        assert!(cfg.default_publish_timeout > Duration::ZERO);
    }

    #[test]
    fn builder_clamps_capacity() {
        let cfg = UdexConfig::new().with_queue_capacity(0);
        assert_eq!(cfg.queue_capacity, 1);
    }
}
