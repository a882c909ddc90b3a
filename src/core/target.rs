//! Cross-compilation target descriptions.
//!
//! A target is an architecture/OS/ABI triple. The native target is a
//! distinguished value derived from the host; equality is structural.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Aarch64,
    Riscv64,
    Arm,
    Wasm32,
}

impl Arch {
    /// Get the architecture name as used in triples.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Riscv64 => "riscv64",
            Arch::Arm => "arm",
            Arch::Wasm32 => "wasm32",
        }
    }
}

/// Target operating system.
///
/// `None` marks freestanding and WebAssembly-style targets that have no
/// native OS; those resolve to an alternate compiler rather than a
/// cross-prefixed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Windows,
    Macos,
    None,
}

impl Os {
    /// Get the OS name as used in triples.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::Macos => "macos",
            Os::None => "none",
        }
    }
}

/// Target ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Abi {
    Gnu,
    Musl,
    Msvc,
    Eabi,
    Unknown,
}

impl Abi {
    /// Get the ABI name as used in triples.
    pub fn as_str(&self) -> &'static str {
        match self {
            Abi::Gnu => "gnu",
            Abi::Musl => "musl",
            Abi::Msvc => "msvc",
            Abi::Eabi => "eabi",
            Abi::Unknown => "unknown",
        }
    }
}

/// A compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossTarget {
    pub arch: Arch,
    pub os: Os,
    pub abi: Abi,
}

impl CrossTarget {
    /// Create a target from its parts.
    pub fn new(arch: Arch, os: Os, abi: Abi) -> Self {
        CrossTarget { arch, os, abi }
    }

    /// The host's native target.
    pub fn native() -> Self {
        let arch = match std::env::consts::ARCH {
            "aarch64" => Arch::Aarch64,
            "riscv64" => Arch::Riscv64,
            "arm" => Arch::Arm,
            _ => Arch::X86_64,
        };
        let (os, abi) = match std::env::consts::OS {
            "windows" => (Os::Windows, Abi::Msvc),
            "macos" => (Os::Macos, Abi::Unknown),
            _ => (Os::Linux, Abi::Gnu),
        };
        CrossTarget { arch, os, abi }
    }

    /// Whether this target is the host's native target.
    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }

    /// Whether the target has a hosted operating system.
    ///
    /// Freestanding and wasm targets do not, and use the alternate compiler.
    pub fn has_native_os(&self) -> bool {
        self.os != Os::None && self.arch != Arch::Wasm32
    }

    /// Canonical `arch-os-abi` triple string.
    pub fn triple(&self) -> String {
        format!(
            "{}-{}-{}",
            self.arch.as_str(),
            self.os.as_str(),
            self.abi.as_str()
        )
    }

    /// Known cross targets, used for availability listings.
    pub fn well_known() -> Vec<CrossTarget> {
        vec![
            CrossTarget::new(Arch::X86_64, Os::Linux, Abi::Gnu),
            CrossTarget::new(Arch::X86_64, Os::Linux, Abi::Musl),
            CrossTarget::new(Arch::Aarch64, Os::Linux, Abi::Gnu),
            CrossTarget::new(Arch::Aarch64, Os::Linux, Abi::Musl),
            CrossTarget::new(Arch::Riscv64, Os::Linux, Abi::Gnu),
            CrossTarget::new(Arch::X86_64, Os::Windows, Abi::Gnu),
            CrossTarget::new(Arch::Arm, Os::None, Abi::Eabi),
            CrossTarget::new(Arch::Wasm32, Os::None, Abi::Unknown),
        ]
    }
}

impl fmt::Display for CrossTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple())
    }
}

impl FromStr for CrossTarget {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BuildError::ConfigInvalid {
            reason: format!("invalid target triple `{s}` (expected arch-os-abi)"),
        };

        let mut parts = s.split('-');
        let arch = match parts.next() {
            Some("x86_64") | Some("amd64") => Arch::X86_64,
            Some("aarch64") | Some("arm64") => Arch::Aarch64,
            Some("riscv64") => Arch::Riscv64,
            Some("arm") => Arch::Arm,
            Some("wasm32") => Arch::Wasm32,
            _ => return Err(invalid()),
        };
        let os = match parts.next() {
            Some("linux") => Os::Linux,
            Some("windows") => Os::Windows,
            Some("macos") | Some("darwin") => Os::Macos,
            Some("none") | Some("unknown") => Os::None,
            _ => return Err(invalid()),
        };
        let abi = match parts.next() {
            Some("gnu") => Abi::Gnu,
            Some("musl") => Abi::Musl,
            Some("msvc") => Abi::Msvc,
            Some("eabi") => Abi::Eabi,
            Some("unknown") | None => Abi::Unknown,
            _ => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(CrossTarget { arch, os, abi })
    }
}
