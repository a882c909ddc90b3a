//! Built-in plugin for native-object languages (C and C++).
//!
//! Compilation drives the toolchain resolved for the request's target:
//! each source is compiled to an object file, then the objects are linked
//! into a shared library. Interface extraction reads the linked artifact
//! with a platform symbol lister.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::core::interface::InterfaceDescription;
use crate::core::module::BuildProfile;
use crate::core::target::{Arch, CrossTarget, Os};
use crate::error::BuildError;
use crate::extract;
use crate::plugin::{CompileRequest, CompileResult, LanguagePlugin};
use crate::toolchain::ToolchainDescriptor;
use crate::util::fs::{collect_sources, ensure_dir};
use crate::util::process::ProcessBuilder;

/// Timeout for a single source compile.
const COMPILE_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for the link step.
const LINK_TIMEOUT: Duration = Duration::from_secs(300);

/// C/C++ plugin. The two languages share the driver-selection and link
/// logic and differ only in identifier and source extensions.
pub struct NativePlugin {
    language: &'static str,
    extensions: &'static [&'static str],
    use_cxx_driver: bool,
}

impl NativePlugin {
    /// The C plugin.
    pub fn c() -> Self {
        NativePlugin {
            language: "c",
            extensions: &["c"],
            use_cxx_driver: false,
        }
    }

    /// The C++ plugin.
    pub fn cpp() -> Self {
        NativePlugin {
            language: "cpp",
            extensions: &["cpp", "cc", "cxx"],
            use_cxx_driver: true,
        }
    }

    fn driver<'a>(&self, toolchain: &'a ToolchainDescriptor) -> &'a Path {
        if self.use_cxx_driver {
            &toolchain.cxx_compiler
        } else {
            &toolchain.compiler
        }
    }

    fn profile_flags(&self, profile: BuildProfile) -> Vec<String> {
        match profile {
            BuildProfile::Debug => vec!["-g".to_string(), "-O0".to_string()],
            BuildProfile::Release => vec!["-O2".to_string()],
        }
    }
}

/// Shared-library file name for a module on a target.
pub fn artifact_name(module: &str, target: &CrossTarget) -> String {
    if target.arch == Arch::Wasm32 {
        return format!("{module}.wasm");
    }
    match target.os {
        Os::Windows => format!("{module}.dll"),
        Os::Macos => format!("lib{module}.dylib"),
        _ => format!("lib{module}.so"),
    }
}

impl LanguagePlugin for NativePlugin {
    fn language(&self) -> &str {
        self.language
    }

    fn validate_toolchain(&self, toolchain: &ToolchainDescriptor) -> (bool, String) {
        (toolchain.available, toolchain.message.clone())
    }

    fn compile(&self, request: &CompileRequest<'_>) -> CompileResult {
        let started = Instant::now();
        let module = request.module;
        let module_name = module.name.to_string();
        let mut logs = Vec::new();

        let fail = |error: BuildError, logs: Vec<String>, started: Instant| {
            CompileResult::failure(error, logs, started.elapsed())
        };

        let sources = match collect_sources(&module.source_path, self.extensions) {
            Ok(sources) => sources,
            Err(e) => {
                return fail(
                    BuildError::CompileFailed {
                        module: module_name,
                        detail: format!("{e:#}"),
                    },
                    logs,
                    started,
                )
            }
        };
        if sources.is_empty() {
            return fail(
                BuildError::CompileFailed {
                    module: module_name,
                    detail: format!(
                        "no {} sources under {}",
                        self.language,
                        module.source_path.display()
                    ),
                },
                logs,
                started,
            );
        }

        let obj_dir = module.output_dir.join("obj").join(module.name.as_str());
        let lib_dir = module.output_dir.join("lib");
        if let Err(e) = ensure_dir(&obj_dir).and_then(|_| ensure_dir(&lib_dir)) {
            return fail(
                BuildError::CompileFailed {
                    module: module_name,
                    detail: format!("{e:#}"),
                },
                logs,
                started,
            );
        }

        let driver = self.driver(request.toolchain);
        let profile_flags = self.profile_flags(request.profile);

        // Compile each source to an object file.
        let mut objects = Vec::with_capacity(sources.len());
        for source in &sources {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "source".to_string());
            let object = obj_dir.join(format!("{stem}.o"));

            tracing::debug!(
                "compiling {} -> {}",
                source.display(),
                object.display()
            );

            let result = ProcessBuilder::new(driver)
                .args(&request.toolchain.cflags)
                .args(&profile_flags)
                .arg("-fPIC")
                .arg("-c")
                .arg(source)
                .arg("-o")
                .arg(&object)
                .timeout(COMPILE_TIMEOUT)
                .exec();

            match result {
                Ok(output) => {
                    logs.extend(output.log_lines());
                    if output.timed_out {
                        return fail(
                            BuildError::CompileFailed {
                                module: module_name,
                                detail: format!(
                                    "compile of {} timed out",
                                    source.display()
                                ),
                            },
                            logs,
                            started,
                        );
                    }
                    if !output.success {
                        return fail(
                            BuildError::CompileFailed {
                                module: module_name,
                                detail: output.stderr.trim().to_string(),
                            },
                            logs,
                            started,
                        );
                    }
                }
                Err(e) => {
                    return fail(
                        BuildError::CompileFailed {
                            module: module_name,
                            detail: format!("{e:#}"),
                        },
                        logs,
                        started,
                    )
                }
            }
            objects.push(object);
        }

        // Link the objects into a shared library.
        let lib_path = lib_dir.join(artifact_name(module.name.as_str(), &request.target));

        tracing::debug!("linking {}", lib_path.display());

        let result = ProcessBuilder::new(driver)
            .arg("-shared")
            .args(&objects)
            .arg("-o")
            .arg(&lib_path)
            .args(&request.toolchain.ldflags)
            .timeout(LINK_TIMEOUT)
            .exec();

        match result {
            Ok(output) => {
                logs.extend(output.log_lines());
                if !output.success {
                    let detail = if output.timed_out {
                        "link timed out".to_string()
                    } else {
                        output.stderr.trim().to_string()
                    };
                    return fail(
                        BuildError::LinkFailed {
                            module: module_name,
                            detail,
                        },
                        logs,
                        started,
                    );
                }
            }
            Err(e) => {
                return fail(
                    BuildError::LinkFailed {
                        module: module_name,
                        detail: format!("{e:#}"),
                    },
                    logs,
                    started,
                )
            }
        }

        CompileResult::success(vec![lib_path], logs, started.elapsed())
    }

    fn extract_interface(&self, artifact: &Path) -> Result<InterfaceDescription, BuildError> {
        extract::extract_native(artifact, self.language)
    }
}
