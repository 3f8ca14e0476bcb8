// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data description ingestion.
//!
//! A description maps dotted signal URLs to byte offsets and wire types
//! inside a package's binary blob. Four source formats are consumed: SDL
//! (XML layout files from the measurement toolchain), DBC (CAN databases),
//! FIBEX (XML network descriptions) and CDL (compact line-oriented CAN
//! layouts). Parsing is all-or-nothing: a description that fails anywhere
//! leaves nothing behind.
//!
//! The declared format must match the content. An SDL file registered as
//! FIBEX is rejected, not coerced: a wrong declaration almost always means
//! a wrong file, and a silently mis-parsed layout reads garbage forever.

pub mod cdl;
pub mod dbc;
pub mod fibex;
pub mod sdl;

use crate::types::{DescriptionFormat, SignalType};

/// Description-layer failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionError {
    /// Content is not parseable as the declared format.
    Parse(String),
    /// Declared format disagrees with the detected content format.
    FormatMismatch {
        declared: DescriptionFormat,
        found: Option<DescriptionFormat>,
    },
}

impl std::fmt::Display for DescriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptionError::Parse(msg) => write!(f, "description parse error: {msg}"),
            DescriptionError::FormatMismatch { declared, found } => match found {
                Some(found) => {
                    write!(f, "description declared as {declared} but content is {found}")
                }
                None => write!(f, "description declared as {declared} but content is unrecognized"),
            },
        }
    }
}

impl std::error::Error for DescriptionError {}

/// One node of a described structure.
///
/// `offset` is relative to the parent node; absolute offsets are computed
/// when an extractor resolves a URL. Leaf nodes carry a scalar wire type,
/// internal nodes are `SignalType::Struct`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalNode {
    pub name: String,
    pub offset: usize,
    pub signal_type: SignalType,
    /// Element count; 1 for plain scalars and structs.
    pub array_len: usize,
    /// Byte size of one element (struct size for internal nodes).
    pub elem_size: usize,
    pub children: Vec<SignalNode>,
}

impl SignalNode {
    #[must_use]
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Immediate child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&SignalNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Total byte span of this node (all array elements).
    #[must_use]
    #[inline]
    pub fn byte_span(&self) -> usize {
        self.elem_size * self.array_len
    }

    /// Walk the subtree depth-first, yielding dotted URLs relative to this
    /// node (excluding the node itself).
    pub fn collect_urls(&self, prefix: &str, out: &mut Vec<String>) {
        for child in &self.children {
            let url = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}.{}", child.name)
            };
            child.collect_urls(&url, out);
            out.push(url);
        }
    }
}

/// One top-level package parsed out of a description source.
///
/// The data source (device) name is not part of the file; the registering
/// publisher supplies it, and the full package URL becomes
/// `<device>.<relative_url>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPackage {
    /// Package URL relative to the data source, e.g. `AlgoVehCycle.VehDyn`.
    pub relative_url: String,
    pub cycle_id: u32,
    pub virtual_address: u64,
    pub size: usize,
    pub root: SignalNode,
}

/// Sniff the content format.
///
/// Cheap structural checks only; the real validation happens in the format
/// parser.
#[must_use]
pub fn detect_format(content: &str) -> Option<DescriptionFormat> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('<') {
        // XML family: decide by document element
        let doc = roxmltree::Document::parse(content).ok()?;
        let root = doc.root_element().tag_name().name();
        return match root {
            "SdlFile" => Some(DescriptionFormat::Sdl),
            "FIBEX" => Some(DescriptionFormat::Fibex),
            _ => None,
        };
    }
    if trimmed.starts_with("CDL;") {
        return Some(DescriptionFormat::Cdl);
    }
    if content.lines().any(|l| l.trim_start().starts_with("BO_ ")) {
        return Some(DescriptionFormat::Dbc);
    }
    None
}

/// Parse `content` as the declared format.
///
/// # Errors
///
/// `FormatMismatch` if the content is recognizably a different format,
/// `Parse` if it fails the format's grammar.
pub fn parse_description(
    content: &str,
    declared: DescriptionFormat,
) -> Result<Vec<ParsedPackage>, DescriptionError> {
    let found = detect_format(content);
    if found != Some(declared) {
        return Err(DescriptionError::FormatMismatch { declared, found });
    }
    match declared {
        DescriptionFormat::Sdl => sdl::parse(content),
        DescriptionFormat::Dbc => dbc::parse(content),
        DescriptionFormat::Fibex => fibex::parse(content),
        DescriptionFormat::Cdl => cdl::parse(content),
    }
}
