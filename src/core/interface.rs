//! Language-agnostic interface descriptions.
//!
//! An [`InterfaceDescription`] records a compiled module's exported functions
//! over a small primitive type vocabulary. It serializes to a stable textual
//! schema so an interface can be extracted in one invocation and consumed by
//! glue generation in a later one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Version tag written at the head of serialized interface files.
const SCHEMA_VERSION: u32 = 1;

/// Primitive type vocabulary shared across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Pointer-sized signed integer.
    ISize,
    /// Pointer-sized unsigned integer.
    USize,
    /// Opaque pointer.
    Ptr,
}

impl PrimitiveType {
    /// Get the type name as used in the textual schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Bool => "bool",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::ISize => "isize",
            PrimitiveType::USize => "usize",
            PrimitiveType::Ptr => "ptr",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "void" => PrimitiveType::Void,
            "bool" => PrimitiveType::Bool,
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "isize" => PrimitiveType::ISize,
            "usize" => PrimitiveType::USize,
            "ptr" => PrimitiveType::Ptr,
            other => {
                return Err(BuildError::ConfigInvalid {
                    reason: format!("unknown primitive type `{other}`"),
                })
            }
        })
    }
}

/// A named function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: PrimitiveType,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, param_type: PrimitiveType) -> Self {
        Parameter {
            name: name.into(),
            param_type,
        }
    }
}

/// An exported function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFunction {
    pub name: String,
    pub return_type: PrimitiveType,
    pub parameters: Vec<Parameter>,
}

impl ExportedFunction {
    /// Create a function with no parameters.
    pub fn new(name: impl Into<String>, return_type: PrimitiveType) -> Self {
        ExportedFunction {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
        }
    }

    /// Add a parameter, builder-style.
    pub fn with_param(mut self, name: impl Into<String>, ty: PrimitiveType) -> Self {
        self.parameters.push(Parameter::new(name, ty));
        self
    }
}

/// Language-agnostic description of a compiled module's exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescription {
    /// Module name.
    pub module: String,
    /// Module version.
    pub version: String,
    /// Source language identifier.
    pub language: String,
    /// Calling-convention tag, normally `cdecl`.
    pub abi: String,
    /// Exported functions, in extraction order.
    pub functions: Vec<ExportedFunction>,
}

impl InterfaceDescription {
    /// Create an empty description.
    pub fn new(module: impl Into<String>, language: impl Into<String>) -> Self {
        InterfaceDescription {
            module: module.into(),
            version: "0.0.0".to_string(),
            language: language.into(),
            abi: "cdecl".to_string(),
            functions: Vec::new(),
        }
    }

    /// Serialize to the stable textual schema.
    ///
    /// The format is line-oriented:
    ///
    /// ```text
    /// polyforge-interface 1
    /// module <name> <version>
    /// language <id> abi <tag>
    /// fn <name> <return-type> (<param> <type>, ...)
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("polyforge-interface {SCHEMA_VERSION}\n"));
        out.push_str(&format!("module {} {}\n", self.module, self.version));
        out.push_str(&format!("language {} abi {}\n", self.language, self.abi));

        for func in &self.functions {
            let params: Vec<String> = func
                .parameters
                .iter()
                .map(|p| format!("{} {}", p.name, p.param_type))
                .collect();
            out.push_str(&format!(
                "fn {} {} ({})\n",
                func.name,
                func.return_type,
                params.join(", ")
            ));
        }

        out
    }

    /// Parse the stable textual schema produced by [`Self::to_text`].
    pub fn from_text(text: &str) -> Result<Self, BuildError> {
        let invalid = |reason: String| BuildError::ConfigInvalid { reason };

        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| invalid("empty interface file".to_string()))?;
        let version_tag = header
            .strip_prefix("polyforge-interface ")
            .ok_or_else(|| invalid(format!("bad interface header: `{header}`")))?;
        if version_tag.trim().parse::<u32>() != Ok(SCHEMA_VERSION) {
            return Err(invalid(format!(
                "unsupported interface schema version `{version_tag}`"
            )));
        }

        let module_line = lines
            .next()
            .and_then(|l| l.strip_prefix("module "))
            .ok_or_else(|| invalid("missing module line".to_string()))?;
        let mut module_parts = module_line.split_whitespace();
        let module = module_parts
            .next()
            .ok_or_else(|| invalid("missing module name".to_string()))?
            .to_string();
        let version = module_parts.next().unwrap_or("0.0.0").to_string();

        let lang_line = lines
            .next()
            .and_then(|l| l.strip_prefix("language "))
            .ok_or_else(|| invalid("missing language line".to_string()))?;
        let (language, abi) = match lang_line.split_once(" abi ") {
            Some((lang, abi)) => (lang.trim().to_string(), abi.trim().to_string()),
            None => (lang_line.trim().to_string(), "cdecl".to_string()),
        };

        let mut functions = Vec::new();
        for line in lines {
            let body = line
                .strip_prefix("fn ")
                .ok_or_else(|| invalid(format!("unrecognized interface line: `{line}`")))?;

            let open = body
                .find('(')
                .ok_or_else(|| invalid(format!("missing parameter list: `{line}`")))?;
            let close = body
                .rfind(')')
                .ok_or_else(|| invalid(format!("unterminated parameter list: `{line}`")))?;

            let mut sig = body[..open].split_whitespace();
            let name = sig
                .next()
                .ok_or_else(|| invalid(format!("missing function name: `{line}`")))?
                .to_string();
            let return_type: PrimitiveType = sig
                .next()
                .ok_or_else(|| invalid(format!("missing return type: `{line}`")))?
                .parse()?;

            let mut parameters = Vec::new();
            let param_str = body[open + 1..close].trim();
            if !param_str.is_empty() {
                for param in param_str.split(',') {
                    let mut parts = param.split_whitespace();
                    let pname = parts
                        .next()
                        .ok_or_else(|| invalid(format!("empty parameter: `{line}`")))?;
                    let ptype: PrimitiveType = parts
                        .next()
                        .ok_or_else(|| invalid(format!("parameter missing type: `{line}`")))?
                        .parse()?;
                    parameters.push(Parameter::new(pname, ptype));
                }
            }

            functions.push(ExportedFunction {
                name,
                return_type,
                parameters,
            });
        }

        Ok(InterfaceDescription {
            module,
            version,
            language,
            abi,
            functions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InterfaceDescription {
        let mut desc = InterfaceDescription::new("mathlib", "c");
        desc.version = "1.2.0".to_string();
        desc.functions.push(
            ExportedFunction::new("add", PrimitiveType::I32)
                .with_param("a", PrimitiveType::I32)
                .with_param("b", PrimitiveType::I32),
        );
        desc.functions
            .push(ExportedFunction::new("reset", PrimitiveType::Void));
        desc.functions.push(
            ExportedFunction::new("scale", PrimitiveType::F64)
                .with_param("value", PrimitiveType::F64)
                .with_param("buf", PrimitiveType::Ptr),
        );
        desc
    }

    #[test]
    fn test_text_round_trip_preserves_order() {
        let desc = sample();
        let text = desc.to_text();
        let parsed = InterfaceDescription::from_text(&text).unwrap();

        assert_eq!(parsed, desc);
        assert_eq!(
            parsed.functions.iter().map(|f| &f.name).collect::<Vec<_>>(),
            vec!["add", "reset", "scale"]
        );
    }

    #[test]
    fn test_zero_export_round_trip() {
        let desc = InterfaceDescription::new("empty", "c");
        let parsed = InterfaceDescription::from_text(&desc.to_text()).unwrap();

        assert!(parsed.functions.is_empty());
        assert_eq!(parsed.abi, "cdecl");
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(InterfaceDescription::from_text("not-an-interface\n").is_err());
        assert!(InterfaceDescription::from_text("polyforge-interface 99\nmodule m 1\nlanguage c abi cdecl\n").is_err());
        assert!(InterfaceDescription::from_text("").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let text = "polyforge-interface 1\nmodule m 1.0\nlanguage c abi cdecl\nfn f quux ()\n";
        assert!(InterfaceDescription::from_text(text).is_err());
    }

    #[test]
    fn test_primitive_type_names_round_trip() {
        for ty in [
            PrimitiveType::Void,
            PrimitiveType::Bool,
            PrimitiveType::I64,
            PrimitiveType::U8,
            PrimitiveType::F32,
            PrimitiveType::USize,
            PrimitiveType::Ptr,
        ] {
            assert_eq!(ty.as_str().parse::<PrimitiveType>().unwrap(), ty);
        }
    }
}
