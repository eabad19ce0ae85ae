// Copyright (c) 2025 knix
// All rights reserved.

use std::io::Write;

use clap::Parser;
use colored::Colorize;
use log::info;
use rtti::config::MkinitArgs;
use rtti::init::{self, GlueOptions, InitManifest};

fn generate(args: &MkinitArgs) -> anyhow::Result<String> {
    let manifest = InitManifest::read_files(&args.files, &args.init_file_dirs)?;
    let sources: Vec<_> =
        args.files.iter().map(|f| init::resolve_init_file(f, &args.init_file_dirs)).collect();
    Ok(init::render_glue(&manifest, &sources, &GlueOptions::from_args(args))?)
}

fn main() -> anyhow::Result<()> {
    let l = Box::leak(Box::new(
        env_logger::Builder::new().filter_level(log::LevelFilter::Debug).build(),
    ));
    log::set_logger(l).unwrap();
    log::set_max_level(log::LevelFilter::Warn);
    let args = MkinitArgs::parse();
    info!("{:#?}", args);
    if args.maxcalls == 0 {
        anyhow::bail!("-c must be at least 1");
    }

    let Some(output_path) = args.output_path() else {
        match generate(&args) {
            Ok(glue) => {
                std::io::stdout().write_all(glue.as_bytes())?;
                return Ok(());
            }
            Err(err) => {
                eprintln!("{}: {err}", "mkinit".red());
                std::process::exit(1);
            }
        }
    };

    // A half-written glue file must never be picked up by a later build step
    let cleanup = scopeguard::guard(output_path.clone(), |path| {
        let _ = std::fs::remove_file(path);
    });
    let mut file = std::fs::File::create(&output_path)?;
    match generate(&args) {
        Ok(glue) => {
            file.write_all(glue.as_bytes())?;
            scopeguard::ScopeGuard::into_inner(cleanup);
            info!("wrote {}", output_path.display());
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {err}", "mkinit".red());
            drop(file);
            drop(cleanup);
            std::process::exit(1);
        }
    }
}
