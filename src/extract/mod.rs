//! Interface extraction from compiled artifacts.
//!
//! Two strategies, both best-effort: native object/library files go through
//! a platform symbol lister and a configurable symbol filter; languages that
//! emit a textual declaration file get a line-oriented scan. Neither path
//! fails on unparseable input; the worst case is a description with zero
//! exports. An error is reserved for missing files and missing tools.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::core::interface::{ExportedFunction, InterfaceDescription, Parameter, PrimitiveType};
use crate::error::BuildError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Timeout for the symbol-listing call.
const LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filter for symbol names that are not part of a module's interface.
///
/// The heuristics are platform-specific and intentionally configurable: the
/// default set covers compiler-internal helpers, mangled C++/Rust names, and
/// system-reserved identifiers, and callers can extend or replace it.
pub struct SymbolFilter {
    patterns: Vec<Regex>,
}

impl SymbolFilter {
    /// The default platform filter set.
    pub fn platform_default() -> Self {
        let patterns = [
            r"^_Z",           // Itanium-mangled C++
            r"^\?",           // MSVC-mangled C++
            r"^_R[0-9A-Za-z]", // mangled Rust (v0)
            r"^__",           // system-reserved
            r"^_GLOBAL_",     // global ctor/dtor glue
            r"^\.L",          // local assembler labels
            r"^_init$|^_fini$",
            r"register_tm_clones|deregister_tm_clones",
            r"^frame_dummy$",
            r"^call_gmon_start$",
        ];
        SymbolFilter {
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("static pattern"))
                .collect(),
        }
    }

    /// A filter from custom patterns; invalid patterns are rejected.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let regex =
                Regex::new(pattern.as_ref()).map_err(|e| BuildError::ExtractionFailed {
                    reason: format!("bad symbol filter pattern: {e}"),
                })?;
            compiled.push(regex);
        }
        Ok(SymbolFilter { patterns: compiled })
    }

    /// Whether a symbol should be dropped from the interface.
    pub fn is_internal(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }
}

impl Default for SymbolFilter {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Extract exported functions from a native object or library file.
///
/// Symbol listing recovers names only, so signatures default to `void()`;
/// richer types come from declaration files or hand-written interface text.
/// Mangled C++/Rust exports appear under their demangled base name when the
/// symbol lister can demangle them.
pub fn extract_native(
    artifact: &Path,
    language: &str,
) -> Result<InterfaceDescription, BuildError> {
    extract_native_filtered(artifact, language, &SymbolFilter::platform_default())
}

/// [`extract_native`] with a caller-supplied symbol filter.
pub fn extract_native_filtered(
    artifact: &Path,
    language: &str,
    filter: &SymbolFilter,
) -> Result<InterfaceDescription, BuildError> {
    if !artifact.exists() {
        return Err(BuildError::ExtractionFailed {
            reason: format!("artifact not found: {}", artifact.display()),
        });
    }

    let lister = find_executable("nm")
        .or_else(|| find_executable("llvm-nm"))
        .ok_or_else(|| BuildError::ExtractionFailed {
            reason: "no symbol lister found (tried nm, llvm-nm)".to_string(),
        })?;

    let output = ProcessBuilder::new(&lister)
        .arg("--defined-only")
        .arg("-g")
        .arg(artifact)
        .timeout(LIST_TIMEOUT)
        .exec()
        .map_err(|e| BuildError::ExtractionFailed {
            reason: format!("{e:#}"),
        })?;

    let mut description = description_for(artifact, language);

    // A hostile or truncated artifact makes nm complain; that is still
    // "zero exports", not an error.
    if !output.success {
        tracing::debug!(
            "symbol lister failed on {}: {}",
            artifact.display(),
            output.stderr.trim()
        );
        return Ok(description);
    }

    // Second listing with demangling on; both runs print the same symbols
    // in the same order, so lines pair up by index. Best effort: if the
    // demangled run fails, mangled exports are simply dropped.
    let demangled_output = ProcessBuilder::new(&lister)
        .arg("--defined-only")
        .arg("-g")
        .arg("--demangle")
        .arg(artifact)
        .timeout(LIST_TIMEOUT)
        .exec()
        .ok()
        .filter(|o| o.success);
    let demangled_lines: Vec<Option<&str>> = match &demangled_output {
        Some(o) => o.stdout.lines().map(parse_demangled_line).collect(),
        None => Vec::new(),
    };

    for (i, line) in output.stdout.lines().enumerate() {
        let Some(raw) = parse_symbol_line(line) else {
            continue;
        };
        let raw = normalize_underscore(raw);
        let demangled = demangled_lines.get(i).copied().flatten();
        if let Some(name) = resolve_export_name(raw, demangled, filter) {
            description
                .functions
                .push(ExportedFunction::new(name, PrimitiveType::Void));
        }
    }

    Ok(description)
}

/// Decide the exported name for a raw symbol, if it belongs in the
/// interface at all.
///
/// Mangled symbols are kept under their demangled base name (the part
/// before the argument list); without a demangled form they are dropped.
/// Plain symbols pass through the filter unchanged.
fn resolve_export_name(
    raw: &str,
    demangled: Option<&str>,
    filter: &SymbolFilter,
) -> Option<String> {
    if is_mangled(raw) {
        let demangled = demangled?;
        if demangled == raw {
            return None;
        }
        let before_args = demangled.split('(').next().unwrap_or(demangled).trim();
        let base = before_args
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or(before_args);
        if base.is_empty() || is_mangled(base) {
            return None;
        }
        return Some(base.to_string());
    }
    if filter.is_internal(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Whether a symbol name carries a recognized mangling scheme (Itanium,
/// MSVC, or Rust v0).
fn is_mangled(name: &str) -> bool {
    name.starts_with("_Z")
        || name.starts_with('?')
        || name
            .strip_prefix("_R")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Parse one `nm` output line, keeping defined text and weak symbols.
fn parse_symbol_line(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    let _address = parts.next()?;
    let kind = parts.next()?;
    let name = parts.next()?;

    if parts.next().is_some() {
        return None;
    }
    match kind {
        "T" | "W" => Some(name),
        _ => None,
    }
}

/// Parse one demangled `nm` line. Demangled names contain spaces and
/// parentheses, so everything after the kind column is the name.
fn parse_demangled_line(line: &str) -> Option<&str> {
    let mut parts = line.splitn(3, char::is_whitespace);
    let _address = parts.next()?;
    let kind = parts.next()?;
    let name = parts.next()?.trim();

    match kind {
        "T" | "W" if !name.is_empty() => Some(name),
        _ => None,
    }
}

/// Normalize the leading-underscore convention (Mach-O prefixes C symbols
/// with `_`).
fn normalize_underscore(name: &str) -> &str {
    if cfg!(target_os = "macos") {
        name.strip_prefix('_').unwrap_or(name)
    } else {
        name
    }
}

/// Scan a textual declaration file for top-level exported functions.
///
/// This is a line-oriented scan, not a parse: declarations that cannot be
/// confidently recognized are omitted.
pub fn scan_declarations(
    path: &Path,
    language: &str,
) -> Result<InterfaceDescription, BuildError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| BuildError::ExtractionFailed {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;

    let mut description = description_for(path, language);
    description.functions = scan_declaration_text(&text);
    Ok(description)
}

static DECL_RE: OnceLock<Regex> = OnceLock::new();

/// Scan declaration text for `extern (C)`-style function declarations.
pub fn scan_declaration_text(text: &str) -> Vec<ExportedFunction> {
    // Matches `[extern (C)] <type> <name>(<params>);`, one per line.
    let re = DECL_RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:export\s+)?(?:extern\s*\(C\)\s*)?([A-Za-z_][A-Za-z0-9_*\s]*?)\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*;",
        )
        .expect("static pattern")
    });

    let mut functions = Vec::new();

    for line in text.lines() {
        let Some(cap) = re.captures(line) else {
            continue;
        };

        let Some(return_type) = map_declared_type(cap.get(1).map_or("", |m| m.as_str()))
        else {
            continue;
        };
        let name = cap.get(2).map_or("", |m| m.as_str());
        // Keywords caught by the loose type group.
        if matches!(name, "if" | "while" | "for" | "return") {
            continue;
        }

        let Some(parameters) = map_parameters(cap.get(3).map_or("", |m| m.as_str())) else {
            continue;
        };

        functions.push(ExportedFunction {
            name: name.to_string(),
            return_type,
            parameters,
        });
    }

    functions
}

/// Map a parameter list; `None` if any parameter is unrecognizable.
fn map_parameters(params: &str) -> Option<Vec<Parameter>> {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Some(Vec::new());
    }

    let mut mapped = Vec::new();
    for (i, param) in params.split(',').enumerate() {
        let param = param.trim();
        let (type_str, name) = match param.rsplit_once(|c: char| c.is_whitespace()) {
            Some((ty, name)) if name.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                (ty.trim(), name.to_string())
            }
            _ => (param, format!("arg{i}")),
        };
        mapped.push(Parameter::new(name, map_declared_type(type_str)?));
    }
    Some(mapped)
}

/// Map a declared type name to the primitive vocabulary.
///
/// Covers D's fixed-width names plus the common C spellings that show up in
/// declaration files. Anything else is unrecognized.
fn map_declared_type(ty: &str) -> Option<PrimitiveType> {
    let ty = ty.trim();
    if ty.ends_with('*') {
        return Some(PrimitiveType::Ptr);
    }

    Some(match ty {
        "void" => PrimitiveType::Void,
        "bool" => PrimitiveType::Bool,
        "byte" | "int8_t" => PrimitiveType::I8,
        "short" | "int16_t" => PrimitiveType::I16,
        "int" | "int32_t" => PrimitiveType::I32,
        "long" | "int64_t" => PrimitiveType::I64,
        "ubyte" | "uint8_t" => PrimitiveType::U8,
        "ushort" | "uint16_t" => PrimitiveType::U16,
        "uint" | "uint32_t" | "unsigned" => PrimitiveType::U32,
        "ulong" | "uint64_t" => PrimitiveType::U64,
        "float" => PrimitiveType::F32,
        "double" => PrimitiveType::F64,
        "ptrdiff_t" | "intptr_t" => PrimitiveType::ISize,
        "size_t" | "uintptr_t" => PrimitiveType::USize,
        _ => return None,
    })
}

fn description_for(path: &Path, language: &str) -> InterfaceDescription {
    let module = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .map(|s| s.strip_prefix("lib").map(str::to_string).unwrap_or(s))
        .unwrap_or_default();
    InterfaceDescription::new(module, language)
}
