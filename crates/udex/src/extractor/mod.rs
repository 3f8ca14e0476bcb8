// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed extraction from described binary blobs.
//!
//! A [`StructExtractor`] resolves a dotted URL subtree once into a flat
//! arena of descriptors (absolute offset, wire type, array length) indexed
//! by stable [`NodeHandle`]s. The arena is read-only after resolution and
//! freely shareable across threads; the per-message cost is a single
//! [`bind`] against the inbound buffer.
//!
//! Reading without a bound buffer is unrepresentable: only a
//! [`BoundExtractor`] has read methods, and it cannot exist without a
//! sample slice. A read whose offset plus width exceeds the bound size
//! fails with [`ExtractError::OutOfBounds`] instead of reading garbage.
//!
//! [`bind`]: StructExtractor::bind

mod provider;

pub use provider::{ExplorerInfoProvider, SignalInfoProvider};

use crate::casting::{self, CastError, FromWire};
use crate::types::{SignalInfo, SignalType, SignalValue};

/// Extraction failures. Local and recoverable; callers check and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// URL not resolvable in the loaded description set.
    UrlNotFound(String),
    /// Read of `need` bytes at `offset` exceeds the bound buffer.
    OutOfBounds {
        offset: usize,
        need: usize,
        available: usize,
    },
    /// Wire type not castable to the requested native type.
    Cast(CastError),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UrlNotFound(url) => write!(f, "url not found: {url}"),
            ExtractError::OutOfBounds {
                offset,
                need,
                available,
            } => write!(
                f,
                "read of {need} bytes at offset {offset} exceeds buffer of {available} bytes"
            ),
            ExtractError::Cast(e) => write!(f, "cast failed: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<CastError> for ExtractError {
    fn from(e: CastError) -> Self {
        ExtractError::Cast(e)
    }
}

/// Stable index of one resolved node in the extractor arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug, Clone)]
struct NodeDesc {
    /// URL relative to the extractor root; empty for the root itself.
    rel_url: String,
    info: SignalInfo,
    children: Vec<NodeHandle>,
    child_names: Vec<String>,
}

/// Resolved, reusable addressing view over one URL subtree.
#[derive(Debug)]
pub struct StructExtractor {
    url: String,
    nodes: Vec<NodeDesc>,
    lenient: bool,
}

impl StructExtractor {
    /// Resolve `url` and its whole subtree against the provider.
    ///
    /// # Errors
    ///
    /// `ExtractError::UrlNotFound` if the root URL is not resolvable.
    pub fn resolve(
        provider: &dyn SignalInfoProvider,
        url: &str,
    ) -> Result<Self, ExtractError> {
        let info = provider
            .signal_info(url)
            .ok_or_else(|| ExtractError::UrlNotFound(url.to_owned()))?;
        let mut extractor = Self {
            url: url.to_owned(),
            nodes: Vec::new(),
            lenient: false,
        };
        extractor.add_subtree(provider, url, String::new(), info);
        Ok(extractor)
    }

    /// [`resolve`](Self::resolve) honoring the configured cast mode.
    pub fn resolve_with_config(
        provider: &dyn SignalInfoProvider,
        url: &str,
        config: &crate::config::UdexConfig,
    ) -> Result<Self, ExtractError> {
        let mut extractor = Self::resolve(provider, url)?;
        extractor.lenient = config.lenient_casting;
        Ok(extractor)
    }

    /// Switch unsupported-cast handling to the lenient zero-value mode.
    #[must_use]
    pub fn with_lenient_casting(mut self) -> Self {
        self.lenient = true;
        self
    }

    fn add_subtree(
        &mut self,
        provider: &dyn SignalInfoProvider,
        full_url: &str,
        rel_url: String,
        info: SignalInfo,
    ) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(NodeDesc {
            rel_url,
            info,
            children: Vec::new(),
            child_names: Vec::new(),
        });

        let mut children = Vec::new();
        let mut child_names = Vec::new();
        for child in provider.children(full_url) {
            let child_full = format!("{full_url}.{}", child.name);
            // a child the provider cannot resolve is skipped, not fatal:
            // overlapping descriptions may expose partial trees
            if let Some(child_info) = provider.signal_info(&child_full) {
                let child_rel = match self.nodes[handle.0].rel_url.as_str() {
                    "" => child.name.clone(),
                    parent => format!("{parent}.{}", child.name),
                };
                let child_handle =
                    self.add_subtree(provider, &child_full, child_rel, child_info);
                children.push(child_handle);
                child_names.push(child.name);
            }
        }
        self.nodes[handle.0].children = children;
        self.nodes[handle.0].child_names = child_names;
        handle
    }

    /// The resolved root URL.
    #[must_use]
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handle of the subtree root.
    #[must_use]
    #[inline]
    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// Handle of a node by URL relative to the root (e.g.
    /// `Longitudinal.Velocity`); the empty string is the root.
    #[must_use]
    pub fn node(&self, rel_url: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .position(|n| n.rel_url == rel_url)
            .map(NodeHandle)
    }

    /// Addressing info of a resolved node.
    #[must_use]
    pub fn info(&self, handle: NodeHandle) -> SignalInfo {
        self.nodes[handle.0].info
    }

    /// Number of resolved nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bind the arena to a concrete sample buffer for reading.
    #[must_use]
    pub fn bind<'a>(&'a self, sample: &'a [u8]) -> BoundExtractor<'a> {
        BoundExtractor {
            extractor: self,
            sample,
        }
    }
}

/// An extractor bound to one sample buffer.
///
/// Cheap to construct per inbound package; borrows both the arena and the
/// buffer, so it cannot outlive either.
pub struct BoundExtractor<'a> {
    extractor: &'a StructExtractor,
    sample: &'a [u8],
}

impl BoundExtractor<'_> {
    fn checked_slice(&self, offset: usize, need: usize) -> Result<&[u8], ExtractError> {
        // checked_add: descriptions carry unvalidated offsets, and a sum
        // that wraps must read as out of bounds, not as a low address
        let end = offset
            .checked_add(need)
            .filter(|end| *end <= self.sample.len())
            .ok_or(ExtractError::OutOfBounds {
                offset,
                need,
                available: self.sample.len(),
            })?;
        Ok(&self.sample[offset..end])
    }

    fn cast_at<T: FromWire>(
        &self,
        wire: SignalType,
        offset: usize,
        width: usize,
    ) -> Result<T, ExtractError> {
        let bytes = self.checked_slice(offset, width)?;
        if self.extractor.lenient {
            Ok(casting::cast_value_lenient(wire, bytes))
        } else {
            casting::cast_value(wire, bytes).map_err(ExtractError::from)
        }
    }

    /// Read a native scalar from a leaf node (first element for arrays).
    pub fn get_as<T: FromWire>(&self, handle: NodeHandle) -> Result<T, ExtractError> {
        let info = self.extractor.info(handle);
        self.cast_at(info.signal_type, info.offset, info.signal_size)
    }

    /// Read the node as a dynamic value: scalar, fixed-length array or
    /// composite struct assembled from the children.
    pub fn get(&self, handle: NodeHandle) -> Result<SignalValue, ExtractError> {
        let desc = &self.extractor.nodes[handle.0];
        let info = desc.info;

        if info.signal_type == SignalType::Struct {
            // whole-struct bounds check up front so a truncated buffer is
            // one error, not a partial value
            self.checked_slice(info.offset, info.byte_span())?;
            let mut fields = Vec::with_capacity(desc.children.len());
            for (child, name) in desc.children.iter().zip(&desc.child_names) {
                fields.push((name.clone(), self.get(*child)?));
            }
            return Ok(SignalValue::Struct(fields));
        }

        if info.array_size > 1 {
            let mut elements = Vec::with_capacity(info.array_size);
            for i in 0..info.array_size {
                let elem_offset = i
                    .checked_mul(info.signal_size)
                    .and_then(|stride| info.offset.checked_add(stride))
                    .ok_or(ExtractError::OutOfBounds {
                        offset: info.offset,
                        need: info.signal_size,
                        available: self.sample.len(),
                    })?;
                elements.push(self.scalar_value(
                    info.signal_type,
                    elem_offset,
                    info.signal_size,
                )?);
            }
            return Ok(SignalValue::Array(elements));
        }

        self.scalar_value(info.signal_type, info.offset, info.signal_size)
    }

    fn scalar_value(
        &self,
        wire: SignalType,
        offset: usize,
        width: usize,
    ) -> Result<SignalValue, ExtractError> {
        let value = match wire {
            SignalType::Bool => SignalValue::Bool(self.cast_at(wire, offset, width)?),
            SignalType::Char => SignalValue::Char(self.cast_at(wire, offset, width)?),
            SignalType::U8 => SignalValue::U8(self.cast_at(wire, offset, width)?),
            SignalType::I8 => SignalValue::I8(self.cast_at(wire, offset, width)?),
            SignalType::U16 => SignalValue::U16(self.cast_at(wire, offset, width)?),
            SignalType::I16 => SignalValue::I16(self.cast_at(wire, offset, width)?),
            SignalType::U32 => SignalValue::U32(self.cast_at(wire, offset, width)?),
            SignalType::I32 => SignalValue::I32(self.cast_at(wire, offset, width)?),
            SignalType::U64 => SignalValue::U64(self.cast_at(wire, offset, width)?),
            SignalType::I64 => SignalValue::I64(self.cast_at(wire, offset, width)?),
            SignalType::F32 => SignalValue::F32(self.cast_at(wire, offset, width)?),
            SignalType::F64 => SignalValue::F64(self.cast_at(wire, offset, width)?),
            SignalType::Struct => return Err(CastError::UnsupportedType(wire).into()),
        };
        Ok(value)
    }

    /// Size of the bound sample.
    #[must_use]
    #[inline]
    pub fn sample_len(&self) -> usize {
        self.sample.len()
    }
}
