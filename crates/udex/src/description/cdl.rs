// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDL compact layout files.
//!
//! CDL is the line-oriented layout dump the rig tooling emits for CAN-side
//! channels where a full DBC is not available:
//!
//! ```text
//! CDL;1.0
//! MSG VehState 1A0 8 3
//! SIG Speed 0 ushort
//! SIG Flags 2 uchar 4
//! ```
//!
//! `MSG <name> <hex-id> <size> [<cycle-id>]` opens a message; each `SIG
//! <name> <offset> <type> [<array-len>]` adds a signal with a decimal byte
//! offset and an SDL type name. Blank lines and `#` comments are skipped.

use super::{DescriptionError, ParsedPackage, SignalNode};
use crate::types::SignalType;

/// Parse a CDL document into its messages.
pub fn parse(content: &str) -> Result<Vec<ParsedPackage>, DescriptionError> {
    let mut lines = content.lines();
    match lines.next().map(str::trim) {
        Some(header) if header.starts_with("CDL;") => {}
        _ => return Err(DescriptionError::Parse("missing CDL header line".into())),
    }

    let mut packages: Vec<ParsedPackage> = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        match keyword {
            "MSG" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| parse_err(lineno, "MSG without name"))?;
                let id_raw = tokens
                    .next()
                    .ok_or_else(|| parse_err(lineno, "MSG without id"))?;
                let id = u64::from_str_radix(id_raw, 16)
                    .map_err(|_| parse_err(lineno, "MSG id is not hex"))?;
                let size: usize = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| parse_err(lineno, "MSG without size"))?;
                let cycle_id: u32 = match tokens.next() {
                    Some(t) => t.parse().map_err(|_| parse_err(lineno, "bad cycle id"))?,
                    None => 0,
                };
                packages.push(ParsedPackage {
                    relative_url: name.to_owned(),
                    cycle_id,
                    virtual_address: id,
                    size,
                    root: SignalNode {
                        name: name.to_owned(),
                        offset: 0,
                        signal_type: SignalType::Struct,
                        array_len: 1,
                        elem_size: size,
                        children: Vec::new(),
                    },
                });
            }
            "SIG" => {
                let message = packages
                    .last_mut()
                    .ok_or_else(|| parse_err(lineno, "SIG before any MSG"))?;
                let name = tokens
                    .next()
                    .ok_or_else(|| parse_err(lineno, "SIG without name"))?;
                let offset: usize = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| parse_err(lineno, "SIG without offset"))?;
                let type_name = tokens
                    .next()
                    .ok_or_else(|| parse_err(lineno, "SIG without type"))?;
                let signal_type = SignalType::from_sdl_name(type_name)
                    .ok_or_else(|| parse_err(lineno, "unknown SIG type"))?;
                let array_len: usize = match tokens.next() {
                    Some(t) => t.parse().map_err(|_| parse_err(lineno, "bad array length"))?,
                    None => 1,
                };
                message.root.children.push(SignalNode {
                    name: name.to_owned(),
                    offset,
                    signal_type,
                    array_len: array_len.max(1),
                    elem_size: signal_type.size().unwrap_or(1),
                    children: Vec::new(),
                });
            }
            other => return Err(parse_err(lineno, &format!("unknown keyword {other}"))),
        }
    }

    if packages.is_empty() {
        return Err(DescriptionError::Parse("no MSG entries".into()));
    }
    Ok(packages)
}

fn parse_err(lineno: usize, msg: &str) -> DescriptionError {
    // +2: 1-based and the header line was consumed before enumeration
    DescriptionError::Parse(format!("line {}: {msg}", lineno + 2))
}
