//! Built-in plugin for D.
//!
//! D compilers emit a separate textual interface file (`.di`) alongside the
//! compiled library, so interface extraction scans declarations instead of
//! listing binary symbols.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::interface::InterfaceDescription;
use crate::core::module::BuildProfile;
use crate::core::target::CrossTarget;
use crate::error::BuildError;
use crate::extract;
use crate::plugin::{CompileRequest, CompileResult, LanguagePlugin};
use crate::toolchain::ToolchainDescriptor;
use crate::util::fs::{collect_sources, ensure_dir};
use crate::util::process::{find_executable, ProcessBuilder};

const COMPILE_TIMEOUT: Duration = Duration::from_secs(300);

/// Which D compiler was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DCompiler {
    Dmd,
    Ldc,
}

/// D language plugin, driving dmd or ldc2.
pub struct DlangPlugin;

impl DlangPlugin {
    pub fn new() -> Self {
        DlangPlugin
    }

    /// Probe for a D compiler: dmd preferred, ldc2 as fallback.
    ///
    /// Only ldc2 can cross-compile, so non-native targets skip dmd.
    fn find_compiler(&self, target: &CrossTarget) -> Option<(DCompiler, PathBuf)> {
        if target.is_native() {
            if let Some(path) = find_executable("dmd") {
                return Some((DCompiler::Dmd, path));
            }
        }
        find_executable("ldc2").map(|path| (DCompiler::Ldc, path))
    }
}

impl Default for DlangPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for DlangPlugin {
    fn language(&self) -> &str {
        "d"
    }

    fn validate_toolchain(&self, toolchain: &ToolchainDescriptor) -> (bool, String) {
        match self.find_compiler(&toolchain.target) {
            Some((_, path)) => (true, format!("found `{}`", path.display())),
            None if toolchain.target.is_native() => {
                (false, "no D compiler found (tried dmd, ldc2)".to_string())
            }
            None => (
                false,
                format!(
                    "cross-compiling D for {} requires ldc2",
                    toolchain.target.triple()
                ),
            ),
        }
    }

    fn compile(&self, request: &CompileRequest<'_>) -> CompileResult {
        let started = Instant::now();
        let module = request.module;
        let module_name = module.name.to_string();

        let Some((kind, compiler)) = self.find_compiler(&request.target) else {
            let (_, reason) = self.validate_toolchain(request.toolchain);
            return CompileResult::failure(
                BuildError::ToolchainUnavailable {
                    target: request.target.triple(),
                    reason,
                },
                Vec::new(),
                started.elapsed(),
            );
        };

        let sources = match collect_sources(&module.source_path, &["d"]) {
            Ok(sources) if !sources.is_empty() => sources,
            Ok(_) => {
                return CompileResult::failure(
                    BuildError::CompileFailed {
                        module: module_name,
                        detail: format!(
                            "no d sources under {}",
                            module.source_path.display()
                        ),
                    },
                    Vec::new(),
                    started.elapsed(),
                )
            }
            Err(e) => {
                return CompileResult::failure(
                    BuildError::CompileFailed {
                        module: module_name,
                        detail: format!("{e:#}"),
                    },
                    Vec::new(),
                    started.elapsed(),
                )
            }
        };

        let lib_dir = module.output_dir.join("lib");
        let di_dir = module.output_dir.join("interface");
        if let Err(e) = ensure_dir(&lib_dir).and_then(|_| ensure_dir(&di_dir)) {
            return CompileResult::failure(
                BuildError::CompileFailed {
                    module: module_name,
                    detail: format!("{e:#}"),
                },
                Vec::new(),
                started.elapsed(),
            );
        }

        let lib_path = lib_dir.join(crate::plugin::native::artifact_name(
            module.name.as_str(),
            &request.target,
        ));

        let mut cmd = ProcessBuilder::new(&compiler)
            .arg("-shared")
            .arg(format!("-of={}", lib_path.display()))
            .arg("-H")
            .arg(format!("-Hd={}", di_dir.display()));

        if request.profile == BuildProfile::Release {
            cmd = cmd.arg("-O");
        } else {
            cmd = cmd.arg("-g");
        }
        if kind == DCompiler::Ldc {
            cmd = cmd.arg("--relocation-model=pic");
            if !request.target.is_native() {
                cmd = cmd.arg(format!("-mtriple={}", request.target.triple()));
            }
        } else {
            cmd = cmd.arg("-fPIC");
        }

        cmd = cmd.args(&sources).timeout(COMPILE_TIMEOUT);

        tracing::debug!("compiling d module {} with {:?}", module.name, kind);

        match cmd.exec() {
            Ok(output) => {
                let logs = output.log_lines();
                if output.timed_out {
                    CompileResult::failure(
                        BuildError::CompileFailed {
                            module: module_name,
                            detail: "d compile timed out".to_string(),
                        },
                        logs,
                        started.elapsed(),
                    )
                } else if !output.success {
                    CompileResult::failure(
                        BuildError::CompileFailed {
                            module: module_name,
                            detail: output.stderr.trim().to_string(),
                        },
                        logs,
                        started.elapsed(),
                    )
                } else {
                    // Interface files are artifacts too; extraction scans them.
                    let mut artifacts = vec![lib_path];
                    if let Ok(interfaces) = collect_sources(&di_dir, &["di"]) {
                        artifacts.extend(interfaces);
                    }
                    CompileResult::success(artifacts, logs, started.elapsed())
                }
            }
            Err(e) => CompileResult::failure(
                BuildError::CompileFailed {
                    module: module_name,
                    detail: format!("{e:#}"),
                },
                Vec::new(),
                started.elapsed(),
            ),
        }
    }

    fn extract_interface(&self, artifact: &Path) -> Result<InterfaceDescription, BuildError> {
        if artifact.extension().is_some_and(|e| e == "di") {
            return extract::scan_declarations(artifact, "d");
        }

        // Given the library, look for interface files next to it.
        let di_dir = artifact
            .parent()
            .and_then(Path::parent)
            .map(|root| root.join("interface"));

        if let Some(di_dir) = di_dir {
            if let Ok(interfaces) = collect_sources(&di_dir, &["di"]) {
                if let Some(first) = interfaces.first() {
                    let mut merged = extract::scan_declarations(first, "d")?;
                    for extra in &interfaces[1..] {
                        let more = extract::scan_declarations(extra, "d")?;
                        merged.functions.extend(more.functions);
                    }
                    return Ok(merged);
                }
            }
        }

        // No declarations found: zero exports, not an error.
        Ok(InterfaceDescription::new(
            artifact
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            "d",
        ))
    }
}
