//! Identifier casing and declared-type mapping for generated Rust.

use crate::model::Tool;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while", "yield",
];

/// `WorkingDirectory` -> `working_directory`, `APIKey` -> `api_key`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    let trimmed = out.trim_end_matches('_').to_string();
    match trimmed.chars().next() {
        None => "value".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{}", trimmed),
        Some(_) => trimmed,
    }
}

/// `no-net` -> `NoNet`, `quiet` -> `Quiet`, `1.0` -> `V10`.
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name.split(|c: char| !c.is_ascii_alphanumeric()).filter(|s| !s.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    match out.chars().next() {
        None => "Value".to_string(),
        Some(first) if first.is_ascii_digit() => format!("V{}", out),
        Some(_) => out,
    }
}

/// Escape identifiers that collide with Rust keywords.
pub fn raw_ident(ident: &str) -> String {
    match ident {
        // These cannot be raw identifiers.
        "self" | "super" | "crate" => format!("{}_", ident),
        _ if KEYWORDS.contains(&ident) => format!("r#{}", ident),
        _ => ident.to_string(),
    }
}

/// The storage shape of a declared property type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// `Option<T>` with `set_`/`reset_`.
    Scalar { rust: String, primitive: bool },
    /// `Option<bool>` with `enable_`/`disable_`/`toggle_`.
    Bool,
    /// `Vec<T>` with `add_`/`clear_`.
    List { item: String, primitive: bool },
    /// `BTreeMap<String, T>` with `add_`/`remove_`/`clear_`.
    Map { value: String, primitive: bool },
}

impl TypeShape {
    /// Whether values of this shape can be spliced into a command line.
    pub fn is_argument(&self) -> bool {
        match self {
            Self::Bool => true,
            Self::Scalar { primitive, .. } | Self::List { primitive, .. } | Self::Map { primitive, .. } => *primitive,
        }
    }
}

/// Map a declared type (`string`, `bool`, `List<int>`, an enumeration or
/// data-class name) onto its Rust storage shape.
pub fn type_shape(declared: &str, tool: &Tool) -> TypeShape {
    let declared = declared.trim();
    if let Some(inner) = generic_argument(declared, &["List", "IEnumerable", "IReadOnlyList"])
        .or_else(|| declared.strip_suffix("[]"))
    {
        let (item, primitive) = element_type(inner, tool);
        return TypeShape::List { item, primitive };
    }
    if let Some(inner) = generic_argument(declared, &["Dictionary", "IReadOnlyDictionary", "Map"]) {
        let value = inner.split_once(',').map_or(inner, |(_, v)| v);
        let (value, primitive) = element_type(value, tool);
        return TypeShape::Map { value, primitive };
    }
    if matches!(declared.to_ascii_lowercase().as_str(), "bool" | "boolean") {
        return TypeShape::Bool;
    }
    let (rust, primitive) = element_type(declared, tool);
    TypeShape::Scalar { rust, primitive }
}

fn generic_argument<'a>(declared: &'a str, wrappers: &[&str]) -> Option<&'a str> {
    wrappers.iter().find_map(|wrapper| {
        declared
            .strip_prefix(wrapper)
            .and_then(|rest| rest.strip_prefix('<'))
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::trim)
    })
}

/// Returns the Rust type and whether it renders as a command-line argument.
fn element_type(declared: &str, tool: &Tool) -> (String, bool) {
    let declared = declared.trim();
    let primitive = match declared.to_ascii_lowercase().as_str() {
        "string" => Some("String"),
        "bool" | "boolean" => Some("bool"),
        "int" | "long" => Some("i64"),
        "uint" | "ulong" => Some("u64"),
        "float" | "double" | "decimal" => Some("f64"),
        _ => None,
    };
    if let Some(rust) = primitive {
        return (rust.to_string(), true);
    }
    let is_enumeration = tool.enumeration(declared).is_some();
    (to_pascal_case(declared), is_enumeration)
}
