// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDL layout files.
//!
//! SDL is the XML layout description emitted by the measurement toolchain:
//!
//! ```text
//! <SdlFile ByteAlignment="1" Version="2.0">
//!   <View Name="AlgoVehCycle" CycleID="207">
//!     <Group Name="VehDyn" Address="20350000" ArrayLen="1" Size="160">
//!       <Signal Name="uiVersionNumber" Offset="0" ArrayLen="1" Type="ulong" Size="4"/>
//!       <SubGroup Name="sSigHeader" Offset="4" ArrayLen="1" Size="12">...</SubGroup>
//!     </Group>
//!   </View>
//! </SdlFile>
//! ```
//!
//! `Offset` and `Address` attributes are hexadecimal without prefix (an
//! offset of 12 is written `C`); `CycleID`, `ArrayLen` and `Size` are
//! decimal. Offsets are relative to the enclosing group.
//!
//! Every group becomes one [`ParsedPackage`] with package URL
//! `<view>.<group>` and the group's `Address` as virtual address.

use super::{DescriptionError, ParsedPackage, SignalNode};
use crate::types::SignalType;
use roxmltree::Node;

fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, DescriptionError> {
    node.attribute(name).ok_or_else(|| {
        DescriptionError::Parse(format!(
            "<{}> missing attribute {name}",
            node.tag_name().name()
        ))
    })
}

fn attr_dec(node: Node, name: &str) -> Result<usize, DescriptionError> {
    let raw = attr(node, name)?;
    raw.parse()
        .map_err(|_| DescriptionError::Parse(format!("bad decimal {name}=\"{raw}\"")))
}

fn attr_hex(node: Node, name: &str) -> Result<u64, DescriptionError> {
    let raw = attr(node, name)?;
    u64::from_str_radix(raw, 16)
        .map_err(|_| DescriptionError::Parse(format!("bad hex {name}=\"{raw}\"")))
}

fn parse_signal(node: Node) -> Result<SignalNode, DescriptionError> {
    let type_name = attr(node, "Type")?;
    let signal_type = SignalType::from_sdl_name(type_name)
        .ok_or_else(|| DescriptionError::Parse(format!("unknown signal type \"{type_name}\"")))?;
    Ok(SignalNode {
        name: attr(node, "Name")?.to_owned(),
        offset: attr_hex(node, "Offset")? as usize,
        signal_type,
        array_len: attr_dec(node, "ArrayLen")?.max(1),
        elem_size: attr_dec(node, "Size")?,
        children: Vec::new(),
    })
}

fn parse_children(node: Node) -> Result<Vec<SignalNode>, DescriptionError> {
    let mut children = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Signal" => children.push(parse_signal(child)?),
            "SubGroup" => children.push(SignalNode {
                name: attr(child, "Name")?.to_owned(),
                offset: attr_hex(child, "Offset")? as usize,
                signal_type: SignalType::Struct,
                array_len: attr_dec(child, "ArrayLen")?.max(1),
                elem_size: attr_dec(child, "Size")?,
                children: parse_children(child)?,
            }),
            other => {
                return Err(DescriptionError::Parse(format!(
                    "unexpected element <{other}> inside <{}>",
                    node.tag_name().name()
                )))
            }
        }
    }
    Ok(children)
}

/// Parse an SDL document into its packages.
pub fn parse(content: &str) -> Result<Vec<ParsedPackage>, DescriptionError> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| DescriptionError::Parse(format!("invalid XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "SdlFile" {
        return Err(DescriptionError::Parse(format!(
            "expected <SdlFile>, got <{}>",
            root.tag_name().name()
        )));
    }

    let mut packages = Vec::new();
    for view in root.children().filter(|n| n.has_tag_name("View")) {
        let view_name = attr(view, "Name")?;
        let cycle_id = attr_dec(view, "CycleID")? as u32;
        for group in view.children().filter(|n| n.has_tag_name("Group")) {
            let group_name = attr(group, "Name")?;
            let size = attr_dec(group, "Size")?;
            packages.push(ParsedPackage {
                relative_url: format!("{view_name}.{group_name}"),
                cycle_id,
                virtual_address: attr_hex(group, "Address")?,
                size,
                root: SignalNode {
                    name: group_name.to_owned(),
                    offset: 0,
                    signal_type: SignalType::Struct,
                    array_len: attr_dec(group, "ArrayLen")?.max(1),
                    elem_size: size,
                    children: parse_children(group)?,
                },
            });
        }
    }
    if packages.is_empty() {
        return Err(DescriptionError::Parse("no <View>/<Group> entries".into()));
    }
    Ok(packages)
}

fn write_node(out: &mut String, node: &SignalNode, indent: usize) {
    let pad = "\t".repeat(indent);
    if node.is_leaf() {
        out.push_str(&format!(
            "{pad}<Signal Name=\"{}\" Offset=\"{:X}\" ArrayLen=\"{}\" Type=\"{}\" Size=\"{}\"/>\n",
            node.name,
            node.offset,
            node.array_len,
            node.signal_type.sdl_name(),
            node.elem_size
        ));
    } else {
        out.push_str(&format!(
            "{pad}<SubGroup Name=\"{}\" Offset=\"{:X}\" ArrayLen=\"{}\" Size=\"{}\">\n",
            node.name, node.offset, node.array_len, node.elem_size
        ));
        for child in &node.children {
            write_node(out, child, indent + 1);
        }
        out.push_str(&format!("{pad}</SubGroup>\n"));
    }
}

/// Reconstruct a minimal SDL document for one subtree.
///
/// The subtree is emitted as a single group under a single view so the
/// output re-parses with [`parse`]; used for interchange and debugging,
/// not a byte-faithful copy of the original file.
#[must_use]
pub fn generate(view_name: &str, cycle_id: u32, address: u64, node: &SignalNode) -> String {
    let mut out = String::new();
    out.push_str("<SdlFile ByteAlignment=\"1\" Version=\"2.0\">\n");
    out.push_str(&format!(
        "\t<View Name=\"{view_name}\" CycleID=\"{cycle_id}\">\n"
    ));
    out.push_str(&format!(
        "\t\t<Group Name=\"{}\" Address=\"{address:X}\" ArrayLen=\"{}\" Size=\"{}\">\n",
        node.name,
        node.array_len,
        node.byte_span()
    ));
    for child in &node.children {
        write_node(&mut out, child, 3);
    }
    // a leaf subtree still needs a signal entry inside the wrapping group
    if node.is_leaf() {
        let mut leaf = node.clone();
        leaf.offset = 0;
        write_node(&mut out, &leaf, 3);
    }
    out.push_str("\t\t</Group>\n\t</View>\n</SdlFile>\n");
    out
}
