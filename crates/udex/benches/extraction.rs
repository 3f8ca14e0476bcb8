// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hot-path benchmarks: per-sample bind + read, hash throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use udex::explorer::DataSourceInfo;
use udex::extractor::ExplorerInfoProvider;
use udex::{package_hash, DescriptionFormat, PackageMetaInfo, SignalExplorer, StructExtractor};

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
	</View>
</SdlFile>"#;

fn extractor() -> StructExtractor {
    let explorer = Arc::new(SignalExplorer::new());
    explorer
        .register_data_description(
            &DataSourceInfo {
                name: "ARS5xx".into(),
                source_id: 22,
                instance_number: 42,
            },
            SDL,
            DescriptionFormat::Sdl,
        )
        .unwrap();
    let provider = ExplorerInfoProvider::new(explorer);
    StructExtractor::resolve(&provider, "ARS5xx.AlgoVehCycle.VehDyn").unwrap()
}

fn bench_bind_and_read(c: &mut Criterion) {
    let extractor = extractor();
    let velocity = extractor.node("Longitudinal.Velocity").unwrap();
    let mut sample = vec![0u8; 24];
    sample[4..8].copy_from_slice(&13.5f32.to_le_bytes());

    c.bench_function("bind_and_read_f32", |b| {
        b.iter(|| {
            let bound = extractor.bind(black_box(&sample));
            bound.get_as::<f32>(velocity).unwrap()
        });
    });

    c.bench_function("bind_and_read_full_tree", |b| {
        b.iter(|| {
            let bound = extractor.bind(black_box(&sample));
            bound.get(extractor.root()).unwrap()
        });
    });
}

fn bench_package_hash(c: &mut Criterion) {
    let meta = PackageMetaInfo {
        source_id: 22,
        instance_number: 42,
        cycle_id: 207,
        virtual_address: 0x2035_0000,
    };
    c.bench_function("package_hash", |b| {
        b.iter(|| package_hash(black_box(&meta)));
    });
}

criterion_group!(benches, bench_bind_and_read, bench_package_hash);
criterion_main!(benches);
