// Copyright (c) 2025 knix
// All rights reserved.

//! Init manifests and the glue that calls every module's init entry points.
//!
//! A manifest lists `<module> <entry-symbol>` pairs, one per line. For each
//! purpose the glue calls `<entry-symbol>_<suffix>` exactly once per module, in
//! manifest order, grouped into functions of at most `maxcalls` calls so the
//! generated code stays cheap to compile.


use std::fmt::Write;
use std::path::{Path, PathBuf};

use ahash::HashMapExt;
use fxhash::FxHashMap;
use itertools::Itertools;
use log::{debug, info};

use crate::error::{ErrorKind, RttiResult};
use crate::failf;

const SYS_PREFIX_1: &str = "sys_init";
const SYS_PREFIX_2: &str = "mercury_sys_init";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitPurpose {
    Init,
    TypeTables,
    Debugger,
    ProcStatics,
}

impl InitPurpose {
    pub const ALL: [InitPurpose; 4] =
        [InitPurpose::Init, InitPurpose::TypeTables, InitPurpose::Debugger, InitPurpose::ProcStatics];

    pub fn main_func_name(self) -> &'static str {
        match self {
            InitPurpose::Init => "init_modules",
            InitPurpose::TypeTables => "init_modules_type_tables",
            InitPurpose::Debugger => "init_modules_debugger",
            InitPurpose::ProcStatics => "write_out_proc_statics",
        }
    }

    pub fn module_suffix(self) -> &'static str {
        match self {
            InitPurpose::Init => "init",
            InitPurpose::TypeTables => "init_type_tables",
            InitPurpose::Debugger => "init_debugger",
            InitPurpose::ProcStatics => "write_out_proc_statics",
        }
    }

    fn arg_defn(self) -> &'static str {
        match self {
            InitPurpose::ProcStatics => "fp: *mut std::ffi::c_void",
            _ => "",
        }
    }

    fn arg(self) -> &'static str {
        match self {
            InitPurpose::ProcStatics => "fp",
            _ => "",
        }
    }

    /// Whether the generated functions for this purpose contain any calls
    fn enabled(self, options: &GlueOptions) -> bool {
        match self {
            InitPurpose::Init => options.need_initialization_code || options.need_tracing,
            InitPurpose::Debugger => options.need_tracing,
            InitPurpose::TypeTables | InitPurpose::ProcStatics => true,
        }
    }
}

/// Hand-written runtime modules have no module layout to register with the
/// debugger.
pub fn is_sys_init(symbol: &str) -> bool {
    symbol.starts_with(SYS_PREFIX_1) || symbol.starts_with(SYS_PREFIX_2)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitEntry {
    pub module: String,
    pub symbol: String,
    /// Manifest the entry came from, for diagnostics
    pub source: PathBuf,
    pub line: usize,
}

impl InitEntry {
    pub fn entry_point(&self, purpose: InitPurpose) -> String {
        format!("{}_{}", self.symbol, purpose.module_suffix())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitManifest {
    entries: Vec<InitEntry>,
    by_module: FxHashMap<String, usize>,
    by_symbol: FxHashMap<String, usize>,
}

impl InitManifest {
    pub fn new() -> InitManifest {
        InitManifest {
            entries: Vec::new(),
            by_module: FxHashMap::with_capacity(64),
            by_symbol: FxHashMap::with_capacity(64),
        }
    }

    pub fn entries(&self) -> &[InitEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: InitEntry) -> RttiResult<()> {
        if let Some(previous) = self.by_module.get(&entry.module) {
            let previous = &self.entries[*previous];
            return failf!(
                ErrorKind::Manifest,
                "{}:{}: module {} already listed at {}:{}",
                entry.source.display(),
                entry.line,
                entry.module,
                previous.source.display(),
                previous.line
            );
        }
        if !is_identifier(&entry.symbol) {
            return failf!(
                ErrorKind::Manifest,
                "{}:{}: {:?} is not a valid entry symbol",
                entry.source.display(),
                entry.line,
                entry.symbol
            );
        }
        // Each entry point is called exactly once per purpose
        if let Some(previous) = self.by_symbol.get(&entry.symbol) {
            let previous = &self.entries[*previous];
            return failf!(
                ErrorKind::Manifest,
                "{}:{}: entry symbol {} of module {} already used by module {} at {}:{}",
                entry.source.display(),
                entry.line,
                entry.symbol,
                entry.module,
                previous.module,
                previous.source.display(),
                previous.line
            );
        }
        self.by_module.insert(entry.module.clone(), self.entries.len());
        self.by_symbol.insert(entry.symbol.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Adds the entries of one manifest file's text. Blank lines and `#`
    /// comments are skipped.
    pub fn parse_into(&mut self, source: &Path, text: &str) -> RttiResult<()> {
        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let content = match raw_line.find('#') {
                Some(hash) => &raw_line[..hash],
                None => raw_line,
            };
            let mut words = content.split_whitespace();
            let Some(module) = words.next() else { continue };
            let (Some(symbol), None) = (words.next(), words.next()) else {
                return failf!(
                    ErrorKind::Manifest,
                    "{}:{line}: expected `<module> <entry-symbol>`, got {:?}",
                    source.display(),
                    raw_line.trim()
                );
            };
            self.add(InitEntry {
                module: module.to_string(),
                symbol: symbol.to_string(),
                source: source.to_path_buf(),
                line,
            })?;
        }
        debug!("{}: {} entries so far", source.display(), self.entries.len());
        Ok(())
    }

    pub fn parse(source: &Path, text: &str) -> RttiResult<InitManifest> {
        let mut manifest = InitManifest::new();
        manifest.parse_into(source, text)?;
        Ok(manifest)
    }

    /// Reads every manifest in order, after path search.
    pub fn read_files(files: &[PathBuf], search_dirs: &[PathBuf]) -> RttiResult<InitManifest> {
        let mut manifest = InitManifest::new();
        for file in files {
            let path = resolve_init_file(file, search_dirs);
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    return failf!(ErrorKind::Manifest, "error opening file `{}': {}", path.display(), e);
                }
            };
            manifest.parse_into(&path, &text)?;
        }
        info!("read {} modules from {} manifests", manifest.len(), files.len());
        Ok(manifest)
    }
}

/// Where to read `base_name` from: as given if it exists, otherwise the
/// first search directory containing it, otherwise as given.
pub fn resolve_init_file(base_name: &Path, search_dirs: &[PathBuf]) -> PathBuf {
    find_init_file(base_name, search_dirs).unwrap_or_else(|| base_name.to_path_buf())
}

/// `None` if the file is in the current directory or in no search directory.
pub fn find_init_file(base_name: &Path, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    if base_name.exists() {
        return None;
    }
    search_dirs.iter().map(|dir| dir.join(base_name)).find(|candidate| candidate.exists())
}

/// The calls for one purpose, split into bunches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitPlan {
    pub purpose: InitPurpose,
    pub bunches: Vec<Vec<String>>,
}

impl InitPlan {
    pub fn new(manifest: &InitManifest, purpose: InitPurpose, maxcalls: usize) -> InitPlan {
        let maxcalls = maxcalls.max(1);
        let calls: Vec<String> = manifest
            .entries()
            .iter()
            .filter(|e| !(purpose == InitPurpose::Debugger && is_sys_init(&e.symbol)))
            .map(|e| e.entry_point(purpose))
            .collect();
        let mut bunches: Vec<Vec<String>> = calls.chunks(maxcalls).map(|c| c.to_vec()).collect();
        // There is always a first bunch function, even if it is empty
        if bunches.is_empty() {
            bunches.push(Vec::new());
        }
        InitPlan { purpose, bunches }
    }

    pub fn num_calls(&self) -> usize {
        self.bunches.iter().map(|b| b.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct GlueOptions {
    pub maxcalls: usize,
    pub grade: String,
    pub entry_point: String,
    pub need_initialization_code: bool,
    pub need_tracing: bool,
    pub library: bool,
    pub runtime_flags: Vec<String>,
}

impl GlueOptions {
    pub fn from_args(args: &crate::config::MkinitArgs) -> GlueOptions {
        GlueOptions {
            maxcalls: args.maxcalls,
            grade: args.grade.clone(),
            entry_point: args.entry_point.clone(),
            need_initialization_code: args.init_code_needed(),
            need_tracing: args.need_tracing,
            library: args.library,
            runtime_flags: args.runtime_flags.clone(),
        }
    }
}

impl Default for GlueOptions {
    fn default() -> Self {
        GlueOptions {
            maxcalls: crate::config::DEFAULT_MAXCALLS,
            grade: String::new(),
            entry_point: crate::config::DEFAULT_ENTRY_POINT.to_string(),
            need_initialization_code: false,
            need_tracing: false,
            library: false,
            runtime_flags: Vec::new(),
        }
    }
}

fn write_plan(out: &mut String, plan: &InitPlan) -> std::fmt::Result {
    let purpose = plan.purpose;
    let name = purpose.main_func_name();
    let arg_defn = purpose.arg_defn();
    let arg = purpose.arg();

    for (index, bunch) in plan.bunches.iter().enumerate() {
        writeln!(out)?;
        if bunch.is_empty() {
            writeln!(out, "fn {name}_{index}({arg_defn}) {{}}")?;
            continue;
        }
        writeln!(out, "fn {name}_{index}({arg_defn}) {{")?;
        writeln!(out, "    unsafe {{")?;
        for call in bunch {
            writeln!(out, "        {call}({arg});")?;
        }
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
    }

    writeln!(out)?;
    writeln!(out, "pub fn {name}({arg_defn}) {{")?;
    for index in 0..plan.bunches.len() {
        writeln!(out, "    {name}_{index}({arg});")?;
    }
    writeln!(out, "}}")
}

/// Renders the glue as Rust source. The entry point is pasted into the
/// generated code, so it must be an identifier like every manifest symbol.
pub fn render_glue(manifest: &InitManifest, sources: &[PathBuf], options: &GlueOptions) -> RttiResult<String> {
    if !options.library && !is_identifier(&options.entry_point) {
        return failf!(ErrorKind::Config, "{:?} is not a valid entry point", options.entry_point);
    }
    let mut out = String::with_capacity(4096);
    write_glue(&mut out, manifest, sources, options).unwrap();
    Ok(out)
}

fn write_glue(
    out: &mut String,
    manifest: &InitManifest,
    sources: &[PathBuf],
    options: &GlueOptions,
) -> std::fmt::Result {
    writeln!(out, "// This code automatically generated by mkinit - do not edit.")?;
    writeln!(out, "//")?;
    writeln!(out, "// Grade: {}", options.grade)?;
    writeln!(out, "// Input files:")?;
    writeln!(out, "//")?;
    for source in sources {
        writeln!(out, "// {}", source.display())?;
    }
    writeln!(out)?;
    writeln!(out, "#![allow(non_snake_case, dead_code)]")?;
    writeln!(out)?;
    writeln!(out, "pub const RUNTIME_FLAGS: &str = {:?};", options.runtime_flags.iter().join(" "))?;

    let plans: Vec<InitPlan> = InitPurpose::ALL
        .iter()
        .map(|purpose| {
            if purpose.enabled(options) {
                InitPlan::new(manifest, *purpose, options.maxcalls)
            } else {
                InitPlan { purpose: *purpose, bunches: vec![Vec::new()] }
            }
        })
        .collect();

    writeln!(out)?;
    writeln!(out, "unsafe extern \"C\" {{")?;
    for plan in &plans {
        let decl_args = plan.purpose.arg_defn();
        for call in plan.bunches.iter().flatten() {
            writeln!(out, "    fn {call}({decl_args});")?;
        }
    }
    if !options.library {
        writeln!(out, "    fn {}();", options.entry_point)?;
    }
    writeln!(out, "}}")?;

    for plan in &plans {
        write_plan(out, plan)?;
    }

    if !options.library {
        writeln!(out)?;
        writeln!(out, "fn main() {{")?;
        writeln!(out, "    init_modules();")?;
        writeln!(out, "    init_modules_type_tables();")?;
        if options.need_tracing {
            writeln!(out, "    init_modules_debugger();")?;
        }
        writeln!(out, "    unsafe {{ {}() }}", options.entry_point)?;
        writeln!(out, "}}")?;
    }

    let total: usize = plans.iter().map(|p| p.num_calls()).sum();
    info!("generated {} calls for {} modules", total, manifest.len());
    Ok(())
}
