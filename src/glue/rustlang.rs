//! Rust `extern "C"` binding generation.

use crate::core::interface::{InterfaceDescription, PrimitiveType};

use super::{snake_case, GlueCodeResult};

/// Keywords that a C export name can collide with.
const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];

/// Keywords that cannot be raw identifiers; these take a trailing underscore.
const NO_RAW: &[&str] = &["self", "Self", "super", "crate"];

fn map_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Void => "()",
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
        PrimitiveType::Ptr => "*mut core::ffi::c_void",
    }
}

/// Escape reserved words with the `r#` raw-identifier prefix.
fn escape(name: &str) -> String {
    if NO_RAW.contains(&name) {
        format!("{name}_")
    } else if RESERVED.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

pub fn generate(interface: &InterfaceDescription) -> GlueCodeResult {
    let module = snake_case(&interface.module);
    let mut out = String::new();

    out.push_str(&format!(
        "//! FFI bindings for the {} module (version {}).\n\n",
        interface.module, interface.version
    ));
    out.push_str(&format!("#[link(name = \"{module}\")]\n"));
    out.push_str("extern \"C\" {\n");

    for func in &interface.functions {
        let fn_name = escape(&func.name);
        let params: Vec<String> = func
            .parameters
            .iter()
            .map(|p| format!("{}: {}", escape(&p.name), map_type(p.param_type)))
            .collect();
        let ret = match func.return_type {
            PrimitiveType::Void => String::new(),
            other => format!(" -> {}", map_type(other)),
        };

        // Escaping changes the declared name; pin the real export symbol.
        if fn_name != func.name {
            out.push_str(&format!("    #[link_name = \"{}\"]\n", func.name));
        }
        out.push_str(&format!(
            "    pub fn {}({}){};\n",
            fn_name,
            params.join(", "),
            ret
        ));
    }

    out.push_str("}\n");

    GlueCodeResult {
        source: out,
        file_name: format!("{module}_bindings.rs"),
        language: "rust".to_string(),
    }
}
