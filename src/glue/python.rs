//! Python ctypes binding generation.

use crate::core::interface::{InterfaceDescription, PrimitiveType};

use super::{snake_case, GlueCodeResult};

/// Python keywords plus the soft keywords worth avoiding in a module API.
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise",
    "return", "try", "while", "with", "yield",
];

/// Map a primitive to its ctypes type; `None` for `void` returns.
fn map_type(ty: PrimitiveType) -> Option<&'static str> {
    Some(match ty {
        PrimitiveType::Void => return None,
        PrimitiveType::Bool => "ctypes.c_bool",
        PrimitiveType::I8 => "ctypes.c_int8",
        PrimitiveType::I16 => "ctypes.c_int16",
        PrimitiveType::I32 => "ctypes.c_int32",
        PrimitiveType::I64 => "ctypes.c_int64",
        PrimitiveType::U8 => "ctypes.c_uint8",
        PrimitiveType::U16 => "ctypes.c_uint16",
        PrimitiveType::U32 => "ctypes.c_uint32",
        PrimitiveType::U64 => "ctypes.c_uint64",
        PrimitiveType::F32 => "ctypes.c_float",
        PrimitiveType::F64 => "ctypes.c_double",
        PrimitiveType::ISize => "ctypes.c_ssize_t",
        PrimitiveType::USize => "ctypes.c_size_t",
        PrimitiveType::Ptr => "ctypes.c_void_p",
    })
}

/// Escape reserved words with a trailing underscore, the PEP 8 convention.
fn escape(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

pub fn generate(interface: &InterfaceDescription) -> GlueCodeResult {
    let module = snake_case(&interface.module);
    let mut out = String::new();

    out.push_str(&format!(
        "\"\"\"ctypes bindings for the {} module (version {}).\"\"\"\n\n",
        interface.module, interface.version
    ));
    out.push_str("import ctypes\nimport ctypes.util\n\n");
    out.push_str(&format!(
        "_path = ctypes.util.find_library(\"{module}\") or \"./lib{module}.so\"\n"
    ));
    out.push_str("_lib = ctypes.CDLL(_path)\n");

    for func in &interface.functions {
        let py_name = escape(&snake_case(&func.name));
        let argtypes: Vec<&str> = func
            .parameters
            .iter()
            .filter_map(|p| map_type(p.param_type))
            .collect();
        let params: Vec<String> = func
            .parameters
            .iter()
            .map(|p| escape(&snake_case(&p.name)))
            .collect();
        let restype = map_type(func.return_type).unwrap_or("None");

        out.push('\n');
        // `_lib.lambda` is a SyntaxError, so keyword exports are bound once
        // through getattr and referenced via the binding.
        let handle = if RESERVED.contains(&func.name.as_str()) {
            let handle = format!("_{}", func.name);
            out.push_str(&format!(
                "{} = getattr(_lib, \"{}\")\n",
                handle, func.name
            ));
            handle
        } else {
            format!("_lib.{}", func.name)
        };
        out.push_str(&format!("{handle}.restype = {restype}\n"));
        out.push_str(&format!(
            "{handle}.argtypes = [{}]\n",
            argtypes.join(", ")
        ));
        out.push_str(&format!(
            "\n\ndef {}({}):\n    return {handle}({})\n",
            py_name,
            params.join(", "),
            params.join(", ")
        ));
    }

    GlueCodeResult {
        source: out,
        file_name: format!("{module}_bindings.py"),
        language: "python".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interface::ExportedFunction;

    #[test]
    fn test_generates_ctypes_wrappers() {
        let mut desc = InterfaceDescription::new("mathlib", "c");
        desc.functions.push(
            ExportedFunction::new("add", PrimitiveType::I32)
                .with_param("a", PrimitiveType::I32)
                .with_param("b", PrimitiveType::I32),
        );

        let result = generate(&desc);

        assert_eq!(result.file_name, "mathlib_bindings.py");
        assert!(result.source.contains("_lib.add.restype = ctypes.c_int32"));
        assert!(result
            .source
            .contains("_lib.add.argtypes = [ctypes.c_int32, ctypes.c_int32]"));
        assert!(result.source.contains("def add(a, b):"));
    }

    #[test]
    fn test_void_return_maps_to_none() {
        let mut desc = InterfaceDescription::new("m", "c");
        desc.functions
            .push(ExportedFunction::new("reset", PrimitiveType::Void));

        let result = generate(&desc);
        assert!(result.source.contains("_lib.reset.restype = None"));
    }

    #[test]
    fn test_reserved_word_gets_trailing_underscore() {
        let mut desc = InterfaceDescription::new("kw", "c");
        desc.functions.push(
            ExportedFunction::new("lambda", PrimitiveType::F64)
                .with_param("from", PrimitiveType::F64),
        );

        let result = generate(&desc);

        assert!(result.source.contains("def lambda_(from_):"));
        assert!(result
            .source
            .contains("_lambda = getattr(_lib, \"lambda\")"));
        assert!(result.source.contains("_lambda.restype = ctypes.c_double"));
        assert!(result.source.contains("return _lambda(from_)"));
        // `_lib.lambda` anywhere in the module would be a SyntaxError.
        assert!(!result.source.contains("_lib.lambda"));
    }
}
