//! C# P/Invoke binding generation.

use crate::core::interface::{InterfaceDescription, PrimitiveType};

use super::{pascal_case, GlueCodeResult};

/// C# reserved words that clash with plausible export names.
const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
    "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this",
    "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
    "using", "virtual", "void", "volatile", "while",
];

/// Map a primitive to its nearest C# native type.
fn map_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Void => "void",
        PrimitiveType::Bool => "bool",
        PrimitiveType::I8 => "sbyte",
        PrimitiveType::I16 => "short",
        PrimitiveType::I32 => "int",
        PrimitiveType::I64 => "long",
        PrimitiveType::U8 => "byte",
        PrimitiveType::U16 => "ushort",
        PrimitiveType::U32 => "uint",
        PrimitiveType::U64 => "ulong",
        PrimitiveType::F32 => "float",
        PrimitiveType::F64 => "double",
        PrimitiveType::ISize => "nint",
        PrimitiveType::USize => "nuint",
        PrimitiveType::Ptr => "IntPtr",
    }
}

/// Escape reserved words with the `@` verbatim-identifier prefix.
fn escape(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

pub fn generate(interface: &InterfaceDescription) -> GlueCodeResult {
    let class_name = pascal_case(&interface.module);
    let mut out = String::new();

    out.push_str("using System;\n");
    out.push_str("using System.Runtime.InteropServices;\n\n");
    out.push_str(&format!(
        "/// <summary>P/Invoke bindings for the {} module (version {}).</summary>\n",
        interface.module, interface.version
    ));
    out.push_str(&format!("public static class {class_name}\n{{\n"));
    out.push_str(&format!(
        "    private const string LibraryName = \"{}\";\n",
        interface.module
    ));

    for func in &interface.functions {
        let method = escape(&pascal_case(&func.name));
        let params: Vec<String> = func
            .parameters
            .iter()
            .map(|p| format!("{} {}", map_type(p.param_type), escape(&p.name)))
            .collect();

        out.push_str(&format!(
            "\n    [DllImport(LibraryName, EntryPoint = \"{}\", CallingConvention = CallingConvention.Cdecl)]\n",
            func.name
        ));
        out.push_str(&format!(
            "    public static extern {} {}({});\n",
            map_type(func.return_type),
            method,
            params.join(", ")
        ));
    }

    out.push_str("}\n");

    GlueCodeResult {
        source: out,
        file_name: format!("{class_name}Bindings.cs"),
        language: "csharp".to_string(),
    }
}
