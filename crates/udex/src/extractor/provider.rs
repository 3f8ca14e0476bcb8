// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pluggable signal-information resolution.
//!
//! The extractor is polymorphic over where (offset, type, array-length)
//! information comes from. The default provider reads the explorer
//! registry; a custom provider can serve a format the registry does not
//! know, as long as it honors the same contract: absolute byte offsets
//! within the package buffer, wire types per element, element counts.

use crate::explorer::{ChildInfo, SignalExplorer};
use crate::types::SignalInfo;
use std::sync::Arc;

/// Resolution capability the addressing layer builds on.
pub trait SignalInfoProvider: Send + Sync {
    /// Addressing info for a full dotted URL, if resolvable.
    fn signal_info(&self, url: &str) -> Option<SignalInfo>;

    /// Immediate children of `url`.
    ///
    /// Providers without tree knowledge may return an empty list; such
    /// providers support scalar extraction but not subtree expansion.
    fn children(&self, _url: &str) -> Vec<ChildInfo> {
        Vec::new()
    }
}

/// Default provider backed by the loaded description registry.
pub struct ExplorerInfoProvider {
    explorer: Arc<SignalExplorer>,
}

impl ExplorerInfoProvider {
    #[must_use]
    pub fn new(explorer: Arc<SignalExplorer>) -> Self {
        Self { explorer }
    }
}

impl SignalInfoProvider for ExplorerInfoProvider {
    fn signal_info(&self, url: &str) -> Option<SignalInfo> {
        self.explorer.signal_info(url)
    }

    fn children(&self, url: &str) -> Vec<ChildInfo> {
        self.explorer.get_child_by_url(url)
    }
}
