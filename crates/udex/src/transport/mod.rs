// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic transport boundary.
//!
//! The exchange core never talks to a concrete bus; it publishes and
//! subscribes through the [`Transport`] trait. The crate ships
//! [`IntraProcessTransport`] for same-process wiring and tests; a network
//! bus binding implements the same trait out of tree.

mod intra;

pub use intra::IntraProcessTransport;

use crate::package::Package;
use std::sync::Arc;
use std::time::Duration;

/// Inbound delivery callback, invoked on the transport dispatch thread.
pub type TransportCallback = Arc<dyn Fn(&Package) + Send + Sync>;

/// Opaque handle of one topic subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportHandle(pub(crate) u64);

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No send slot became free within the timeout.
    Timeout,
    /// The transport has shut down.
    Closed,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "timed out waiting for a send slot"),
            TransportError::Closed => write!(f, "transport is closed"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Topic-based pub/sub bus.
///
/// Implementations must preserve per-topic delivery order and invoke each
/// subscription callback exactly once per matching package. No ordering is
/// promised across topics or across subscriptions.
pub trait Transport: Send + Sync {
    /// Queue `package` for delivery on `topic`, waiting up to `timeout`
    /// for a send slot.
    ///
    /// # Errors
    ///
    /// `TransportError::Timeout` if no slot frees up in time,
    /// `TransportError::Closed` after shutdown.
    fn publish(
        &self,
        topic: &str,
        package: Package,
        timeout: Duration,
    ) -> Result<(), TransportError>;

    /// Register a delivery callback for `topic`.
    ///
    /// # Errors
    ///
    /// `TransportError::Closed` after shutdown.
    fn subscribe(
        &self,
        topic: &str,
        callback: TransportCallback,
    ) -> Result<TransportHandle, TransportError>;

    /// Remove a subscription. Unknown handles are ignored.
    fn unsubscribe(&self, handle: TransportHandle);

    /// Announce a live publisher on `topic`. Announcements nest: each call
    /// raises the count until the matching [`unregister_publisher`].
    ///
    /// [`unregister_publisher`]: Transport::unregister_publisher
    fn register_publisher(&self, topic: &str);

    /// Retract one publisher announcement on `topic`. Retracting a topic
    /// with no announcement is a no-op.
    fn unregister_publisher(&self, topic: &str);

    /// Number of publishers currently announced on `topic`.
    fn publisher_count(&self, topic: &str) -> usize;
}
