// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FIBEX network description files.
//!
//! FIBEX is a namespaced XML format; only the frame-layout subset matters
//! here: `FRAME` elements with a `SHORT-NAME`, a `BYTE-LENGTH` and
//! `SIGNAL-INSTANCE` children carrying a `BIT-POSITION` and a `SIGNAL-REF`.
//! Signal types come from the referenced `SIGNAL`'s coding
//! (`BASE-DATA-TYPE`, e.g. `A_UINT16`). Namespaces are ignored; only local
//! element names are matched.
//!
//! FIBEX frames carry no memory address, so the package's virtual address
//! is derived from a stable FNV-1a fold of the frame name.

use super::{DescriptionError, ParsedPackage, SignalNode};
use crate::types::SignalType;
use roxmltree::Node;
use std::collections::HashMap;

fn base_data_type(name: &str) -> Option<SignalType> {
    match name {
        "A_BOOL" => Some(SignalType::Bool),
        "A_UINT8" => Some(SignalType::U8),
        "A_INT8" => Some(SignalType::I8),
        "A_UINT16" => Some(SignalType::U16),
        "A_INT16" => Some(SignalType::I16),
        "A_UINT32" => Some(SignalType::U32),
        "A_INT32" => Some(SignalType::I32),
        "A_UINT64" => Some(SignalType::U64),
        "A_INT64" => Some(SignalType::I64),
        "A_FLOAT32" => Some(SignalType::F32),
        "A_FLOAT64" => Some(SignalType::F64),
        _ => None,
    }
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.tag_name().name() == name)
        .and_then(|c| c.text())
        .map(str::trim)
}

fn fnv1a(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Parse a FIBEX document into its frames.
pub fn parse(content: &str) -> Result<Vec<ParsedPackage>, DescriptionError> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| DescriptionError::Parse(format!("invalid XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "FIBEX" {
        return Err(DescriptionError::Parse(format!(
            "expected <FIBEX>, got <{}>",
            root.tag_name().name()
        )));
    }

    // coding id -> wire type
    let mut codings: HashMap<&str, SignalType> = HashMap::new();
    for coding in root.descendants().filter(|n| n.tag_name().name() == "CODING") {
        let Some(id) = coding.attribute("ID").or_else(|| coding.attribute("id")) else {
            continue;
        };
        let ty = coding
            .descendants()
            .find(|n| n.tag_name().name() == "CODED-TYPE")
            .and_then(|c| c.attributes().find(|a| a.name() == "BASE-DATA-TYPE"))
            .and_then(|a| base_data_type(a.value()));
        if let Some(ty) = ty {
            codings.insert(id, ty);
        }
    }

    // signal id -> (name, wire type)
    let mut signals: HashMap<&str, (&str, SignalType)> = HashMap::new();
    for signal in root.descendants().filter(|n| n.tag_name().name() == "SIGNAL") {
        let Some(id) = signal.attribute("ID").or_else(|| signal.attribute("id")) else {
            continue;
        };
        let name = child_text(signal, "SHORT-NAME")
            .ok_or_else(|| DescriptionError::Parse(format!("SIGNAL {id} without SHORT-NAME")))?;
        let ty = signal
            .children()
            .find(|c| c.tag_name().name() == "CODING-REF")
            .and_then(|r| r.attributes().find(|a| a.name() == "ID-REF"))
            .and_then(|a| codings.get(a.value()).copied())
            .unwrap_or(SignalType::U8);
        signals.insert(id, (name, ty));
    }

    let mut packages = Vec::new();
    for frame in root.descendants().filter(|n| n.tag_name().name() == "FRAME") {
        let name = child_text(frame, "SHORT-NAME")
            .ok_or_else(|| DescriptionError::Parse("FRAME without SHORT-NAME".into()))?;
        let size: usize = child_text(frame, "BYTE-LENGTH")
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| DescriptionError::Parse(format!("FRAME {name} without BYTE-LENGTH")))?;

        let mut children = Vec::new();
        for instance in frame
            .descendants()
            .filter(|n| n.tag_name().name() == "SIGNAL-INSTANCE")
        {
            let bit_position: usize = child_text(instance, "BIT-POSITION")
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| {
                    DescriptionError::Parse(format!("FRAME {name}: instance without BIT-POSITION"))
                })?;
            let signal_ref = instance
                .children()
                .find(|c| c.tag_name().name() == "SIGNAL-REF")
                .and_then(|r| r.attributes().find(|a| a.name() == "ID-REF"))
                .map(|a| a.value())
                .ok_or_else(|| {
                    DescriptionError::Parse(format!("FRAME {name}: instance without SIGNAL-REF"))
                })?;
            let (signal_name, signal_type) = signals.get(signal_ref).copied().ok_or_else(|| {
                DescriptionError::Parse(format!("FRAME {name}: unresolved signal {signal_ref}"))
            })?;
            children.push(SignalNode {
                name: signal_name.to_owned(),
                offset: bit_position / 8,
                signal_type,
                array_len: 1,
                elem_size: signal_type.size().unwrap_or(1),
                children: Vec::new(),
            });
        }

        packages.push(ParsedPackage {
            relative_url: name.to_owned(),
            cycle_id: 0,
            virtual_address: fnv1a(name),
            size,
            root: SignalNode {
                name: name.to_owned(),
                offset: 0,
                signal_type: SignalType::Struct,
                array_len: 1,
                elem_size: size,
                children,
            },
        });
    }

    if packages.is_empty() {
        return Err(DescriptionError::Parse("no FRAME entries".into()));
    }
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIBEX: &str = r#"
<fx:FIBEX xmlns:fx="http://www.asam.net/xml/fbx" xmlns:ho="http://www.asam.net/xml">
  <fx:PROCESSING-INFORMATION>
    <fx:CODINGS>
      <ho:CODING ID="c_u16">
        <ho:CODED-TYPE ho:BASE-DATA-TYPE="A_UINT16"/>
      </ho:CODING>
      <ho:CODING ID="c_f32">
        <ho:CODED-TYPE ho:BASE-DATA-TYPE="A_FLOAT32"/>
      </ho:CODING>
    </fx:CODINGS>
  </fx:PROCESSING-INFORMATION>
  <fx:SIGNALS>
    <fx:SIGNAL ID="sig_speed">
      <ho:SHORT-NAME>WheelSpeed</ho:SHORT-NAME>
      <fx:CODING-REF ID-REF="c_u16"/>
    </fx:SIGNAL>
    <fx:SIGNAL ID="sig_temp">
      <ho:SHORT-NAME>OilTemp</ho:SHORT-NAME>
      <fx:CODING-REF ID-REF="c_f32"/>
    </fx:SIGNAL>
  </fx:SIGNALS>
  <fx:FRAMES>
    <fx:FRAME ID="frame_1">
      <ho:SHORT-NAME>ChassisFrame</ho:SHORT-NAME>
      <fx:BYTE-LENGTH>8</fx:BYTE-LENGTH>
      <fx:SIGNAL-INSTANCES>
        <fx:SIGNAL-INSTANCE ID="i1">
          <fx:BIT-POSITION>0</fx:BIT-POSITION>
          <fx:SIGNAL-REF ID-REF="sig_speed"/>
        </fx:SIGNAL-INSTANCE>
        <fx:SIGNAL-INSTANCE ID="i2">
          <fx:BIT-POSITION>32</fx:BIT-POSITION>
          <fx:SIGNAL-REF ID-REF="sig_temp"/>
        </fx:SIGNAL-INSTANCE>
      </fx:SIGNAL-INSTANCES>
    </fx:FRAME>
  </fx:FRAMES>
</fx:FIBEX>"#;

    #[test]
    fn parses_frames_and_signal_refs() {
        let packages = parse(FIBEX).unwrap();
        assert_eq!(packages.len(), 1);
        let frame = &packages[0];
        assert_eq!(frame.relative_url, "ChassisFrame");
        assert_eq!(frame.size, 8);

        let speed = frame.root.child("WheelSpeed").unwrap();
        assert_eq!(speed.offset, 0);
        assert_eq!(speed.signal_type, SignalType::U16);

        let temp = frame.root.child("OilTemp").unwrap();
        assert_eq!(temp.offset, 4);
        assert_eq!(temp.signal_type, SignalType::F32);
    }

    #[test]
    fn frame_vaddr_is_stable() {
        let a = parse(FIBEX).unwrap();
        let b = parse(FIBEX).unwrap();
        assert_eq!(a[0].virtual_address, b[0].virtual_address);
        assert_ne!(a[0].virtual_address, 0);
    }

    #[test]
    fn rejects_unresolved_signal_ref() {
        let bad = r#"<FIBEX><FRAME ID="f"><SHORT-NAME>F</SHORT-NAME>
            <BYTE-LENGTH>4</BYTE-LENGTH>
            <SIGNAL-INSTANCE><BIT-POSITION>0</BIT-POSITION>
            <SIGNAL-REF ID-REF="nope"/></SIGNAL-INSTANCE></FRAME></FIBEX>"#;
        assert!(parse(bad).is_err());
    }
}
