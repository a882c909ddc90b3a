//! Foreign-binding ("glue") code generation.
//!
//! Each destination language maintains its own primitive-type mapping table
//! and declaration template over the native foreign-function mechanism for
//! that language, always preserving the C calling convention. Exported
//! identifiers are case-converted to the destination's idiom and escaped
//! with the destination's verbatim-identifier convention when they collide
//! with a reserved word.

pub mod csharp;
pub mod python;
pub mod rustlang;

use serde::Serialize;

use crate::core::interface::InterfaceDescription;
use crate::error::BuildError;

/// Generated binding source for one destination language.
#[derive(Debug, Clone, Serialize)]
pub struct GlueCodeResult {
    /// The generated source text.
    pub source: String,

    /// Suggested file name, in the destination's naming convention.
    pub file_name: String,

    /// Destination language tag.
    pub language: String,
}

/// Generate binding source for `target_language`.
///
/// Destination names are matched case-insensitively and accept the common
/// short forms (`cs`, `py`, `rs`). Unknown destinations yield
/// [`BuildError::GlueUnsupportedTarget`].
pub fn generate(
    interface: &InterfaceDescription,
    target_language: &str,
) -> Result<GlueCodeResult, BuildError> {
    match target_language.to_lowercase().as_str() {
        "csharp" | "c#" | "cs" => Ok(csharp::generate(interface)),
        "python" | "py" => Ok(python::generate(interface)),
        "rust" | "rs" => Ok(rustlang::generate(interface)),
        other => Err(BuildError::GlueUnsupportedTarget {
            language: other.to_string(),
        }),
    }
}

/// The destination languages [`generate`] accepts, canonical names only.
pub fn supported_targets() -> &'static [&'static str] {
    &["csharp", "python", "rust"]
}

/// Convert `snake_case` or `camelCase` to `PascalCase`.
pub(crate) fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '_' || c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert `camelCase` or `PascalCase` to `snake_case`; already-snake names
/// pass through unchanged.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interface::{ExportedFunction, PrimitiveType};

    fn sample() -> InterfaceDescription {
        let mut desc = InterfaceDescription::new("mathlib", "c");
        desc.functions.push(
            ExportedFunction::new("add", PrimitiveType::I32)
                .with_param("a", PrimitiveType::I32)
                .with_param("b", PrimitiveType::I32),
        );
        desc
    }

    #[test]
    fn test_unknown_destination_is_structured_failure() {
        let err = generate(&sample(), "cobol").unwrap_err();
        assert_eq!(err.code(), "glue-unsupported-target");
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_destination_names_are_case_insensitive() {
        assert!(generate(&sample(), "CSharp").is_ok());
        assert!(generate(&sample(), "PY").is_ok());
        assert!(generate(&sample(), "Rust").is_ok());
    }

    #[test]
    fn test_short_forms_resolve() {
        assert_eq!(generate(&sample(), "cs").unwrap().language, "csharp");
        assert_eq!(generate(&sample(), "py").unwrap().language, "python");
        assert_eq!(generate(&sample(), "rs").unwrap().language, "rust");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("matrix_multiply"), "MatrixMultiply");
        assert_eq!(pascal_case("add"), "Add");
        assert_eq!(pascal_case("alreadyCamel"), "AlreadyCamel");
        assert_eq!(pascal_case("__reserved"), "Reserved");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("MatrixMultiply"), "matrix_multiply");
        assert_eq!(snake_case("add"), "add");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }
}
