// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Explorer queries against realistic on-disk descriptions.

use std::io::Write;
use std::sync::Arc;
use udex::explorer::DataSourceInfo;
use udex::{DescriptionFormat, SignalExplorer};

const SDL: &str = r#"
<SdlFile ByteAlignment="1" Version="2.0">
	<View Name="AlgoVehCycle" CycleID="207">
		<Group Name="VehDyn" Address="20350000" ArrayLen="1" Size="24">
			<Signal Name="uiVersionNumber" Offset="0" ArrayLen="1" Type="ulong" Size="4"/>
			<SubGroup Name="Longitudinal" Offset="4" ArrayLen="1" Size="8">
				<Signal Name="Velocity" Offset="0" ArrayLen="1" Type="float" Size="4"/>
				<Signal Name="Accel" Offset="4" ArrayLen="1" Type="float" Size="4"/>
			</SubGroup>
			<Signal Name="State" Offset="C" ArrayLen="4" Type="uchar" Size="1"/>
		</Group>
		<Group Name="VehSig" Address="20360000" ArrayLen="1" Size="8">
			<Signal Name="YawRate" Offset="0" ArrayLen="1" Type="float" Size="4"/>
			<Signal Name="Curvature" Offset="4" ArrayLen="1" Type="float" Size="4"/>
		</Group>
	</View>
</SdlFile>"#;

const CDL: &str = "CDL;1.0\nMSG Brake 1B0 4\nSIG Pressure 0 ulong\n";

fn source(name: &str, id: u16) -> DataSourceInfo {
    DataSourceInfo {
        name: name.into(),
        source_id: id,
        instance_number: 0,
    }
}

fn loaded() -> Arc<SignalExplorer> {
    let explorer = Arc::new(SignalExplorer::new());
    explorer
        .register_data_description(&source("ARS5xx", 22), SDL, DescriptionFormat::Sdl)
        .unwrap();
    explorer
        .register_data_description(&source("CanRig", 7), CDL, DescriptionFormat::Cdl)
        .unwrap();
    explorer
}

#[test]
fn registers_from_file_and_checks_the_extension() {
    let explorer = SignalExplorer::new();
    let dir = tempfile::tempdir().unwrap();

    let sdl_path = dir.path().join("vehicle.sdl");
    let mut file = std::fs::File::create(&sdl_path).unwrap();
    file.write_all(SDL.as_bytes()).unwrap();

    explorer
        .register_data_description_file(&source("ARS5xx", 22), &sdl_path, DescriptionFormat::Sdl)
        .unwrap();
    assert_eq!(explorer.package_count(), 2);

    // same content under a lying extension is refused
    let wrong_path = dir.path().join("vehicle.fibex");
    let mut file = std::fs::File::create(&wrong_path).unwrap();
    file.write_all(SDL.as_bytes()).unwrap();
    assert!(explorer
        .register_data_description_file(&source("X", 1), &wrong_path, DescriptionFormat::Sdl)
        .is_err());
    assert_eq!(explorer.package_count(), 2);
}

#[test]
fn format_mismatch_is_rejected_atomically() {
    let explorer = SignalExplorer::new();
    let err = explorer
        .register_data_description(&source("ARS5xx", 22), SDL, DescriptionFormat::Fibex)
        .unwrap_err();
    assert!(!err.to_string().is_empty());
    assert_eq!(explorer.package_count(), 0);
    assert!(explorer.get_child_by_url("").is_empty());
}

#[test]
fn child_listing_walks_the_tree() {
    let explorer = loaded();

    let devices = explorer.get_child_by_url("");
    let names: Vec<&str> = devices.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"ARS5xx"));
    assert!(names.contains(&"CanRig"));

    let groups = explorer.get_child_by_url("ARS5xx.AlgoVehCycle");
    assert_eq!(groups.len(), 2);

    let children = explorer.get_child_by_url("ARS5xx.AlgoVehCycle.VehDyn");
    let state = children.iter().find(|c| c.name == "State").unwrap();
    assert!(state.is_leaf);
    assert_eq!(state.array_len, 4);
    let sub = children.iter().find(|c| c.name == "Longitudinal").unwrap();
    assert!(!sub.is_leaf);
    assert_eq!(sub.child_count, 2);
}

#[test]
fn package_url_resolution_and_full_tree() {
    let explorer = loaded();

    assert_eq!(
        explorer.get_package_url("ARS5xx.AlgoVehCycle.VehDyn.Longitudinal.Velocity"),
        vec!["ARS5xx.AlgoVehCycle.VehDyn".to_owned()]
    );

    let tree = explorer.get_full_url_tree();
    assert_eq!(tree.len(), 3);
    let urls = &tree["ARS5xx.AlgoVehCycle.VehDyn"];
    assert!(urls.contains(&"ARS5xx.AlgoVehCycle.VehDyn.Longitudinal.Accel".to_owned()));
    assert!(tree["CanRig.Brake"].contains(&"CanRig.Brake.Pressure".to_owned()));
}

#[test]
fn keyword_search_spans_all_sources() {
    let explorer = loaded();

    let hits = explorer.search_signal_tree("Velocity");
    assert_eq!(
        hits,
        vec!["ARS5xx.AlgoVehCycle.VehDyn.Longitudinal.Velocity".to_owned()]
    );

    assert!(explorer.search_signal_tree("NoSuchSignal").is_empty());
    assert!(!explorer.search_signal_tree("Pressure").is_empty());
}

#[test]
fn device_lookup_by_format() {
    let explorer = loaded();
    assert_eq!(
        explorer.get_device_by_format(DescriptionFormat::Sdl),
        vec!["ARS5xx".to_owned()]
    );
    assert_eq!(
        explorer.get_device_by_format(DescriptionFormat::Cdl),
        vec!["CanRig".to_owned()]
    );
    assert!(explorer
        .get_device_by_format(DescriptionFormat::Dbc)
        .is_empty());
}

#[test]
fn generated_sdl_reparses_to_the_same_subtree() {
    let explorer = loaded();
    let sdl = explorer.generate_sdl("ARS5xx.AlgoVehCycle.VehDyn").unwrap();

    let round = SignalExplorer::new();
    round
        .register_data_description(&source("ARS5xx", 22), &sdl, DescriptionFormat::Sdl)
        .unwrap();

    let original = explorer.signal_info("ARS5xx.AlgoVehCycle.VehDyn.Longitudinal.Accel");
    let reparsed = round.signal_info("ARS5xx.AlgoVehCycle.VehDyn.Longitudinal.Accel");
    assert_eq!(original, reparsed);

    let original = explorer.signal_info("ARS5xx.AlgoVehCycle.VehDyn.State");
    let reparsed = round.signal_info("ARS5xx.AlgoVehCycle.VehDyn.State");
    assert_eq!(original, reparsed);
}
