// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! udexctl: inspect signal description files from the command line.
//!
//! Loads a description file into a fresh explorer under a synthetic data
//! source and dumps what the registry sees: packages, the full URL tree,
//! search hits or regenerated SDL.

#![allow(clippy::uninlined_format_args)] // CLI output readability over pedantic

use std::path::Path;
use std::process::ExitCode;
use udex::explorer::DataSourceInfo;
use udex::{package_hash, DescriptionFormat, SignalExplorer};

fn usage() {
    eprintln!("udexctl: signal description inspector");
    eprintln!();
    eprintln!("Usage: udexctl <description-file> [command]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  packages          list package URLs with meta info (default)");
    eprintln!("  tree              dump the full URL tree");
    eprintln!("  search <keyword>  list signal URLs matching a dotted fragment");
    eprintln!("  sdl <url>         regenerate SDL for a subtree");
    eprintln!();
    eprintln!("The format is inferred from the file extension (sdl/dbc/cdl, xml for FIBEX).");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
        return ExitCode::FAILURE;
    }

    let path = Path::new(&args[1]);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    // FIBEX ships as plain .xml; everything else matches its tag
    let format = match extension.as_str() {
        "xml" => Some(DescriptionFormat::Fibex),
        other => DescriptionFormat::from_tag(other),
    };
    let Some(format) = format else {
        eprintln!("unknown description extension '.{}'", extension);
        return ExitCode::FAILURE;
    };

    let source = DataSourceInfo {
        name: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Device")
            .to_owned(),
        source_id: 0,
        instance_number: 0,
    };

    let explorer = SignalExplorer::new();
    if let Err(e) = explorer.register_data_description_file(&source, path, format) {
        eprintln!("failed to load {}: {}", path.display(), e);
        return ExitCode::FAILURE;
    }

    match args.get(2).map(String::as_str) {
        None | Some("packages") => {
            println!("{} package(s) in {}:", explorer.package_count(), path.display());
            for (url, _) in explorer.get_full_url_tree() {
                let Some(pkg) = explorer.package_for_url(&url) else {
                    continue;
                };
                println!(
                    "  {:40} size={:<6} cycle={:<5} vaddr={:#010x} hash={:#018x}",
                    pkg.package_url,
                    pkg.size,
                    pkg.cycle_id,
                    pkg.virtual_address,
                    package_hash(&pkg.meta_info()),
                );
            }
        }
        Some("tree") => {
            for (package, urls) in explorer.get_full_url_tree() {
                println!("{}", package);
                for url in urls {
                    println!("  {}", url);
                }
            }
        }
        Some("search") => {
            let Some(keyword) = args.get(3) else {
                usage();
                return ExitCode::FAILURE;
            };
            let hits = explorer.search_signal_tree(keyword);
            if hits.is_empty() {
                println!("no signal matches '{}'", keyword);
            } else {
                for url in hits {
                    println!("{}", url);
                }
            }
        }
        Some("sdl") => {
            let Some(url) = args.get(3) else {
                usage();
                return ExitCode::FAILURE;
            };
            match explorer.generate_sdl(url) {
                Ok(sdl) => println!("{}", sdl),
                Err(e) => {
                    eprintln!("cannot generate SDL for '{}': {}", url, e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Some(other) => {
            eprintln!("unknown command '{}'", other);
            usage();
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
