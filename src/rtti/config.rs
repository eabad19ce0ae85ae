// Copyright (c) 2025 knix
// All rights reserved.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{ErrorKind, RttiResult};
use crate::tags::{DEFAULT_TAG_BITS, TagBits};
use crate::{errf, failf};

pub const TAG_BITS_ENV_VAR: &str = "RTTI_TAG_BITS";

/// Default number of calls per generated init function
pub const DEFAULT_MAXCALLS: usize = 40;

pub const DEFAULT_ENTRY_POINT: &str = "mercury__main_2_0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub tag_bits: TagBits,
    /// Whether builtin types carry to-string and from-string operations
    pub extended_special_preds: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig { tag_bits: DEFAULT_TAG_BITS, extended_special_preds: true }
    }
}

impl RuntimeConfig {
    pub fn with_tag_bits(tag_bits: TagBits) -> RuntimeConfig {
        RuntimeConfig { tag_bits, ..RuntimeConfig::default() }
    }

    /// The default configuration, with the tag bit count taken from
    /// `RTTI_TAG_BITS` when it is set.
    pub fn from_env() -> RttiResult<RuntimeConfig> {
        match std::env::var(TAG_BITS_ENV_VAR) {
            Ok(value) => Self::from_tag_bits_str(&value),
            Err(std::env::VarError::NotPresent) => Ok(RuntimeConfig::default()),
            Err(std::env::VarError::NotUnicode(_)) => {
                failf!(ErrorKind::Config, "{TAG_BITS_ENV_VAR} is not valid unicode")
            }
        }
    }

    pub fn from_tag_bits_str(value: &str) -> RttiResult<RuntimeConfig> {
        let count: u32 = value.trim().parse().map_err(|_| {
            errf!(ErrorKind::Config, "{TAG_BITS_ENV_VAR}={value:?} is not a number")
        })?;
        Ok(RuntimeConfig::with_tag_bits(TagBits::try_from_count(count)?))
    }
}

/// Generates the glue that calls every module's init entry points.
#[derive(Parser, Debug, Clone)]
#[command(name = "mkinit", version, about, long_about = None)]
pub struct MkinitArgs {
    /// Maximum number of calls per generated function
    #[arg(short = 'c', default_value_t = DEFAULT_MAXCALLS)]
    pub maxcalls: usize,

    /// Output file; `-` writes to stdout
    #[arg(short = 'o')]
    pub output: Option<String>,

    /// Entry point called by the generated main
    #[arg(short = 'w', default_value = DEFAULT_ENTRY_POINT)]
    pub entry_point: String,

    /// Grade, recorded in the generated header
    #[arg(short = 'g', default_value = "")]
    pub grade: String,

    /// Emit initialization code even without tracing
    #[arg(short = 'i', default_value_t = false)]
    pub need_initialization_code: bool,

    /// Enable tracing; implies -i
    #[arg(short = 't', default_value_t = false)]
    pub need_tracing: bool,

    /// Library mode: do not emit a main function
    #[arg(short = 'l', default_value_t = false)]
    pub library: bool,

    /// Flag passed through to the runtime; repeatable
    #[arg(short = 'r', allow_hyphen_values = true)]
    pub runtime_flags: Vec<String>,

    /// Directory to search for manifests; repeatable
    #[arg(short = 'I')]
    pub init_file_dirs: Vec<PathBuf>,

    /// Manifest files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl MkinitArgs {
    pub fn output_path(&self) -> Option<PathBuf> {
        match self.output.as_deref() {
            None | Some("-") => None,
            Some(path) => Some(PathBuf::from(path)),
        }
    }

    pub fn init_code_needed(&self) -> bool {
        self.need_initialization_code || self.need_tracing
    }
}
