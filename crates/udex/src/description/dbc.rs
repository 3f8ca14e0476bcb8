// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DBC CAN database files.
//!
//! Only the layout-bearing statements are consumed:
//!
//! ```text
//! BO_ 500 VehDyn: 8 ARS
//!  SG_ Velocity : 0|16@1+ (0.01,0) [0|655.35] "m/s" Vector__XXX
//! ```
//!
//! `BO_` opens a message (CAN id, name, DLC), each following `SG_` is one
//! signal with `<start_bit>|<bit_len>@<byte_order><sign>`. Signals map to
//! byte-granular offsets (`start_bit / 8`) and the smallest unsigned or
//! signed wire type covering `bit_len`; scaling factors are measurement
//! interpretation and intentionally not applied here. Only Intel byte
//! order (`@1`) is accepted; Motorola (`@0`) start bits count MSB-first
//! and are rejected rather than mis-addressed.
//!
//! The CAN id doubles as the package's virtual address; CAN has no cycle
//! grouping, so `cycle_id` is 0.

use super::{DescriptionError, ParsedPackage, SignalNode};
use crate::types::SignalType;

fn signal_type_for(bit_len: usize, signed: bool) -> Result<SignalType, DescriptionError> {
    let ty = match (bit_len, signed) {
        (1..=8, false) => SignalType::U8,
        (1..=8, true) => SignalType::I8,
        (9..=16, false) => SignalType::U16,
        (9..=16, true) => SignalType::I16,
        (17..=32, false) => SignalType::U32,
        (17..=32, true) => SignalType::I32,
        (33..=64, false) => SignalType::U64,
        (33..=64, true) => SignalType::I64,
        _ => {
            return Err(DescriptionError::Parse(format!(
                "signal bit length {bit_len} out of range"
            )))
        }
    };
    Ok(ty)
}

fn parse_signal(line: &str) -> Result<SignalNode, DescriptionError> {
    // SG_ <name> [mux] : <start>|<len>@<order><sign> (...) [...] "..." ...
    let rest = line.trim_start().trim_start_matches("SG_").trim_start();
    let (name_part, layout_part) = rest
        .split_once(':')
        .ok_or_else(|| DescriptionError::Parse(format!("malformed SG_ line: {line}")))?;
    let name = name_part
        .split_whitespace()
        .next()
        .ok_or_else(|| DescriptionError::Parse("SG_ line without signal name".into()))?;

    let layout = layout_part
        .split_whitespace()
        .next()
        .ok_or_else(|| DescriptionError::Parse(format!("SG_ {name} without layout")))?;
    // <start>|<len>@<order><sign>
    let (start_raw, rest) = layout
        .split_once('|')
        .ok_or_else(|| DescriptionError::Parse(format!("SG_ {name}: bad layout {layout}")))?;
    let (len_raw, order_sign) = rest
        .split_once('@')
        .ok_or_else(|| DescriptionError::Parse(format!("SG_ {name}: bad layout {layout}")))?;
    let start_bit: usize = start_raw
        .parse()
        .map_err(|_| DescriptionError::Parse(format!("SG_ {name}: bad start bit {start_raw}")))?;
    let bit_len: usize = len_raw
        .parse()
        .map_err(|_| DescriptionError::Parse(format!("SG_ {name}: bad bit length {len_raw}")))?;
    match order_sign.chars().next() {
        Some('1') => {}
        // Motorola start bits count MSB-first; byte-granular little-endian
        // addressing would silently misplace the signal
        Some('0') => {
            return Err(DescriptionError::Parse(format!(
                "SG_ {name}: Motorola (big-endian) byte order is not supported"
            )))
        }
        _ => {
            return Err(DescriptionError::Parse(format!(
                "SG_ {name}: bad byte order marker {order_sign}"
            )))
        }
    }
    let signed = order_sign.ends_with('-');

    let signal_type = signal_type_for(bit_len, signed)?;
    Ok(SignalNode {
        name: name.to_owned(),
        offset: start_bit / 8,
        signal_type,
        array_len: 1,
        elem_size: signal_type.size().unwrap_or(1),
        children: Vec::new(),
    })
}

/// Parse a DBC document into its messages.
pub fn parse(content: &str) -> Result<Vec<ParsedPackage>, DescriptionError> {
    let mut packages: Vec<ParsedPackage> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("BO_ ") {
            let mut tokens = trimmed.split_whitespace().skip(1);
            let id_raw = tokens
                .next()
                .ok_or_else(|| DescriptionError::Parse("BO_ without CAN id".into()))?;
            let can_id: u64 = id_raw
                .parse()
                .map_err(|_| DescriptionError::Parse(format!("bad CAN id {id_raw}")))?;
            let name = tokens
                .next()
                .ok_or_else(|| DescriptionError::Parse("BO_ without message name".into()))?
                .trim_end_matches(':');
            let dlc_raw = tokens
                .next()
                .ok_or_else(|| DescriptionError::Parse(format!("BO_ {name} without DLC")))?;
            let size: usize = dlc_raw
                .parse()
                .map_err(|_| DescriptionError::Parse(format!("BO_ {name}: bad DLC {dlc_raw}")))?;

            packages.push(ParsedPackage {
                relative_url: name.to_owned(),
                cycle_id: 0,
                virtual_address: can_id,
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
        } else if trimmed.starts_with("SG_ ") {
            let message = packages.last_mut().ok_or_else(|| {
                DescriptionError::Parse("SG_ before any BO_ message".into())
            })?;
            message.root.children.push(parse_signal(trimmed)?);
        }
    }

    if packages.is_empty() {
        return Err(DescriptionError::Parse("no BO_ messages".into()));
    }
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DBC: &str = r#"VERSION ""

BU_: ARS Gateway

BO_ 500 VehDyn: 8 ARS
 SG_ Velocity : 0|16@1+ (0.01,0) [0|655.35] "m/s" Gateway
 SG_ YawRate : 16|16@1- (0.0001,0) [-3.2768|3.2767] "rad/s" Gateway
 SG_ Flags : 32|8@1+ (1,0) [0|255] "" Gateway

BO_ 512 BrakeState: 4 ARS
 SG_ Pressure : 0|32@1+ (1,0) [0|0] "kPa" Gateway
"#;

    #[test]
    fn parses_messages_and_signals() {
        let packages = parse(DBC).unwrap();
        assert_eq!(packages.len(), 2);

        let vehdyn = &packages[0];
        assert_eq!(vehdyn.relative_url, "VehDyn");
        assert_eq!(vehdyn.virtual_address, 500);
        assert_eq!(vehdyn.size, 8);
        assert_eq!(vehdyn.root.children.len(), 3);

        let velocity = vehdyn.root.child("Velocity").unwrap();
        assert_eq!(velocity.offset, 0);
        assert_eq!(velocity.signal_type, SignalType::U16);

        let yaw = vehdyn.root.child("YawRate").unwrap();
        assert_eq!(yaw.offset, 2);
        assert_eq!(yaw.signal_type, SignalType::I16);

        let pressure = packages[1].root.child("Pressure").unwrap();
        assert_eq!(pressure.signal_type, SignalType::U32);
    }

    #[test]
    fn rejects_orphan_signal() {
        assert!(parse(" SG_ X : 0|8@1+ (1,0) [0|0] \"\" N\n").is_err());
    }

    #[test]
    fn rejects_oversized_signal() {
        let bad = "BO_ 1 M: 16 N\n SG_ X : 0|96@1+ (1,0) [0|0] \"\" N\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn rejects_motorola_byte_order() {
        // @0 counts start bits MSB-first; accepting it as-is would decode
        // the wrong bytes
        let bad = "BO_ 1 M: 8 N\n SG_ X : 7|16@0+ (1,0) [0|0] \"\" N\n";
        let err = parse(bad).unwrap_err();
        assert!(matches!(err, DescriptionError::Parse(msg) if msg.contains("Motorola")));
    }
}
