//! Cross-compilation toolchain resolution.
//!
//! Maps a [`CrossTarget`] to a validated, flag-equipped toolchain. Native
//! targets are probed from the host; non-native targets derive a
//! cross-prefixed compiler name from per-OS/ABI naming conventions, or fall
//! back to clang for targets without a native OS. Validation performs a real
//! trial compile into a private temporary directory. Descriptors are cached
//! per triple for the resolver's lifetime.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::core::target::{Abi, Arch, CrossTarget, Os};
use crate::error::BuildError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Timeout for trial-compile validation; full compiles get a longer budget.
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal translation unit used for trial compiles.
///
/// Compiled with `-c` only so it is valid for freestanding targets, which
/// have no runtime to link a `main` against.
const TRIAL_SOURCE: &str = "int polyforge_trial(int x) { return x + 1; }\n";

/// A resolved toolchain for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainDescriptor {
    /// The target this toolchain compiles for.
    pub target: CrossTarget,
    /// C compiler driver, also used as the linker driver.
    pub compiler: PathBuf,
    /// C++ compiler driver.
    pub cxx_compiler: PathBuf,
    /// Optional sysroot, taken from `SYSROOT` for cross builds.
    pub sysroot: Option<PathBuf>,
    /// Target-family compile flags.
    pub cflags: Vec<String>,
    /// Target-family link flags.
    pub ldflags: Vec<String>,
    /// Whether the toolchain passed validation.
    pub available: bool,
    /// Human-readable validation outcome.
    pub message: String,
}

impl ToolchainDescriptor {
    /// Convert an unavailable descriptor into the corresponding error.
    pub fn ensure_available(&self) -> Result<(), BuildError> {
        if self.available {
            Ok(())
        } else {
            Err(BuildError::ToolchainUnavailable {
                target: self.target.triple(),
                reason: self.message.clone(),
            })
        }
    }
}

/// Resolver with a per-triple descriptor cache.
///
/// The cache is populated before or between builds, never concurrently
/// during a layer's execution, so no locking is needed.
pub struct ToolchainResolver {
    cache: HashMap<String, ToolchainDescriptor>,
    /// Skip the trial compile; used by listings that only need derivation.
    probe_only: bool,
}

impl Default for ToolchainResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolchainResolver {
    /// Create a resolver that validates with trial compiles.
    pub fn new() -> Self {
        ToolchainResolver {
            cache: HashMap::new(),
            probe_only: false,
        }
    }

    /// Create a resolver that only checks the compiler exists.
    pub fn probe_only() -> Self {
        ToolchainResolver {
            cache: HashMap::new(),
            probe_only: true,
        }
    }

    /// Number of cached descriptors.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a target to a descriptor, reusing the cache when possible.
    ///
    /// An unusable toolchain is reported through the descriptor's
    /// availability flag, not as an error.
    pub fn resolve(&mut self, target: CrossTarget) -> ToolchainDescriptor {
        let key = target.triple();
        if let Some(descriptor) = self.cache.get(&key) {
            return descriptor.clone();
        }

        let descriptor = self.resolve_uncached(target);
        self.cache.insert(key, descriptor.clone());
        descriptor
    }

    fn resolve_uncached(&self, target: CrossTarget) -> ToolchainDescriptor {
        let (compiler, cxx_compiler) = if target.is_native() {
            match probe_native() {
                Ok(pair) => pair,
                Err(message) => return unavailable(target, message),
            }
        } else {
            derive_cross_commands(&target)
        };

        let Some(compiler_path) = find_executable(&compiler) else {
            return unavailable(
                target,
                format!("compiler `{compiler}` not found in PATH"),
            );
        };
        let cxx_path = find_executable(&cxx_compiler).unwrap_or_else(|| compiler_path.clone());

        let sysroot = if target.is_native() {
            None
        } else {
            std::env::var_os("SYSROOT").map(PathBuf::from)
        };

        let mut descriptor = ToolchainDescriptor {
            cflags: derive_cflags(&target, sysroot.as_deref()),
            ldflags: derive_ldflags(&target),
            target,
            compiler: compiler_path,
            cxx_compiler: cxx_path,
            sysroot,
            available: true,
            message: String::new(),
        };

        if self.probe_only {
            descriptor.message = format!("`{}` found (not validated)", descriptor.compiler.display());
            return descriptor;
        }

        match trial_compile(&descriptor) {
            Ok(()) => {
                descriptor.message =
                    format!("validated `{}`", descriptor.compiler.display());
                tracing::debug!("toolchain for {} validated", descriptor.target);
            }
            Err(reason) => {
                tracing::warn!("toolchain for {} failed validation: {}", target, reason);
                descriptor.available = false;
                descriptor.message = reason;
            }
        }

        descriptor
    }
}

fn unavailable(target: CrossTarget, message: String) -> ToolchainDescriptor {
    ToolchainDescriptor {
        target,
        compiler: PathBuf::new(),
        cxx_compiler: PathBuf::new(),
        sysroot: None,
        cflags: Vec::new(),
        ldflags: Vec::new(),
        available: false,
        message,
    }
}

/// Probe the host toolchain: `CC` override, then gcc, then clang.
fn probe_native() -> Result<(String, String), String> {
    if let Ok(cc) = std::env::var("CC") {
        if find_executable(&cc).is_some() {
            let cxx = std::env::var("CXX").unwrap_or_else(|_| infer_cxx(&cc));
            return Ok((cc, cxx));
        }
        return Err(format!("CC is set to `{cc}` but it is not in PATH"));
    }

    for cc in ["gcc", "clang"] {
        if find_executable(cc).is_some() {
            return Ok((cc.to_string(), infer_cxx(cc)));
        }
    }

    Err("no native C compiler found (tried gcc, clang); \
         install one or set CC"
        .to_string())
}

/// Infer the C++ driver name from a C driver name.
fn infer_cxx(cc: &str) -> String {
    if let Some(stem) = cc.strip_suffix("gcc") {
        return format!("{stem}g++");
    }
    if cc.ends_with("clang") {
        return format!("{cc}++");
    }
    format!("{cc}++")
}

/// Derive cross compiler command names from target naming conventions.
///
/// Hosted OS/ABI combinations use cross-prefixed gcc names; targets without
/// a native OS use clang, which carries the target in a flag instead of the
/// binary name.
fn derive_cross_commands(target: &CrossTarget) -> (String, String) {
    if !target.has_native_os() {
        return ("clang".to_string(), "clang++".to_string());
    }

    let prefix = match (target.os, target.abi) {
        (Os::Windows, _) => {
            let arch = match target.arch {
                Arch::Aarch64 => "aarch64",
                _ => "x86_64",
            };
            format!("{arch}-w64-mingw32")
        }
        (os, abi) => format!("{}-{}-{}", target.arch.as_str(), os.as_str(), abi.as_str()),
    };

    (format!("{prefix}-gcc"), format!("{prefix}-g++"))
}

/// Target-family compile flags.
fn derive_cflags(target: &CrossTarget, sysroot: Option<&std::path::Path>) -> Vec<String> {
    let mut flags = Vec::new();

    if !target.has_native_os() {
        // clang needs an explicit target; the gcc cross binaries carry it in
        // their name.
        flags.push(format!("--target={}", clang_target(target)));
        flags.push("-ffreestanding".to_string());
        flags.push("-fno-exceptions".to_string());
        flags.push("-fno-rtti".to_string());
    }

    if let Some(sysroot) = sysroot {
        flags.push(format!("--sysroot={}", sysroot.display()));
    }

    flags
}

/// Target-family link flags.
fn derive_ldflags(target: &CrossTarget) -> Vec<String> {
    let mut flags = Vec::new();

    if !target.has_native_os() {
        flags.push("-nostdlib".to_string());
        if target.arch == Arch::Wasm32 {
            // No entry point; export everything so extraction sees the full
            // surface.
            flags.push("-Wl,--no-entry".to_string());
            flags.push("-Wl,--export-all".to_string());
        }
    }

    if target.os == Os::Windows && target.abi == Abi::Gnu {
        flags.push("-static-libgcc".to_string());
        flags.push("-static-libstdc++".to_string());
    }

    flags
}

/// LLVM-style triple for clang's `--target` flag.
fn clang_target(target: &CrossTarget) -> String {
    match target.arch {
        Arch::Wasm32 => "wasm32-unknown-unknown".to_string(),
        Arch::Arm => "arm-none-eabi".to_string(),
        arch => format!("{}-unknown-none", arch.as_str()),
    }
}

/// Compile a minimal translation unit into a private temporary directory.
///
/// Success requires a clean exit code and the expected object file. The
/// directory is removed on all exit paths; removal failure is logged, never
/// escalated.
fn trial_compile(descriptor: &ToolchainDescriptor) -> Result<(), String> {
    let dir = tempfile::tempdir()
        .map_err(|e| format!("failed to create validation directory: {e}"))?;

    let source = dir.path().join("trial.c");
    let object = dir.path().join("trial.o");

    if let Err(e) = std::fs::write(&source, TRIAL_SOURCE) {
        return Err(format!("failed to write trial source: {e}"));
    }

    let result = ProcessBuilder::new(&descriptor.compiler)
        .args(&descriptor.cflags)
        .arg("-c")
        .arg(&source)
        .arg("-o")
        .arg(&object)
        .timeout(VALIDATION_TIMEOUT)
        .exec();

    let outcome = match result {
        Ok(output) if output.timed_out => Err(format!(
            "trial compile timed out after {VALIDATION_TIMEOUT:?}"
        )),
        Ok(output) if !output.success => Err(format!(
            "trial compile failed (exit {:?}): {}",
            output.code,
            output.stderr.trim()
        )),
        Ok(_) if !object.exists() => {
            Err("trial compile produced no output file".to_string())
        }
        Ok(_) => Ok(()),
        Err(e) => Err(format!("trial compile could not run: {e:#}")),
    };

    if let Err(e) = dir.close() {
        tracing::warn!("failed to remove validation directory: {}", e);
    }

    outcome
}
