//! Rust wrapper renderer backed by Handlebars.
//!
//! The model is first projected onto plain view structs (identifiers, Rust
//! types, literal expressions); the templates only lay those out.

use std::collections::HashSet;

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

use super::Renderer;
use super::naming::{TypeShape, raw_ident, to_pascal_case, to_snake_case, type_shape};
use super::templates;
use crate::error::{Result, ToolgenError};
use crate::model::{Emit, Enumeration, Property, Tool};

#[derive(Debug, Serialize)]
struct HeaderView {
    repository_url: String,
    doc: Vec<String>,
    name_literal: String,
    constants: Vec<ConstView>,
    has_maps: bool,
}

#[derive(Debug, Serialize)]
struct ConstView {
    name: &'static str,
    literal: String,
}

#[derive(Debug, Serialize)]
struct EnumView {
    name: String,
    doc: Vec<String>,
    variants: Vec<VariantView>,
}

#[derive(Debug, Serialize)]
struct VariantView {
    ident: String,
    literal: String,
}

#[derive(Debug, Serialize)]
struct ClassView {
    name: String,
    doc: Vec<String>,
    fields: Vec<FieldView>,
    secrets: Vec<String>,
    is_settings: bool,
    definitive_argument: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct FieldView {
    field: String,
    getter: String,
    snake: String,
    doc: Vec<String>,
    storage: String,
    default_expr: String,
    getter_type: String,
    getter_body: String,
    param_type: String,
    item_type: String,
    into: bool,
    settable: bool,
    is_scalar: bool,
    is_bool: bool,
    is_list: bool,
    is_map: bool,
    is_flag: bool,
    is_valued: bool,
    argument: bool,
    format_literal: String,
}

#[derive(Debug, Serialize)]
struct TaskView {
    function: String,
    doc: Vec<String>,
    settings: String,
}

/// Renders a tool as a self-contained Rust module.
pub struct RustRenderer {
    handlebars: Handlebars<'static>,
}

impl RustRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        for (name, template) in [
            ("header", templates::HEADER),
            ("enumeration", templates::ENUMERATION),
            ("class", templates::CLASS),
            ("task", templates::TASK),
        ] {
            handlebars
                .register_template_string(name, template)
                .map_err(|e| ToolgenError::render(name, format!("invalid template: {}", e)))?;
        }
        Ok(Self { handlebars })
    }

    fn render_part<T: Serialize>(&self, tool: &Tool, name: &str, view: &T) -> Result<String> {
        self.handlebars
            .render(name, view)
            .map_err(|e| ToolgenError::render(tool.definition_file_name(), e))
    }
}

impl Renderer for RustRenderer {
    fn extension(&self) -> &str {
        "rs"
    }

    fn render(&self, tool: &Tool) -> Result<String> {
        let mut out = self.render_part(tool, "header", &header_view(tool))?;

        for enumeration in &tool.enumerations {
            out.push_str(&self.render_part(tool, "enumeration", &enum_view(enumeration))?);
        }
        for data_class in &tool.data_classes {
            let view = class_view(tool, &data_class.name, &data_class.help, &data_class.properties, None);
            out.push_str(&self.render_part(tool, "class", &view)?);
        }
        for task in &tool.tasks {
            let settings = task.settings_class.effective_name(tool);
            let view = class_view(
                tool,
                &settings,
                &task.settings_class.help,
                &task.settings_class.properties,
                Some(task.definitive_argument.as_deref().unwrap_or_default()),
            );
            out.push_str(&self.render_part(tool, "class", &view)?);

            let task_view = TaskView {
                function: to_snake_case(&format!("{}{}", tool.name, task.postfix())),
                doc: doc_lines(&task.help),
                settings,
            };
            out.push_str(&self.render_part(tool, "task", &task_view)?);
        }
        Ok(out)
    }
}

fn header_view(tool: &Tool) -> HeaderView {
    let mut doc = doc_lines(&tool.help);
    if let Some(url) = tool.official_url.as_deref().filter(|u| !u.is_empty()) {
        doc.push(format!("Official documentation: {}", url));
    }

    let constants = [
        ("OFFICIAL_URL", &tool.official_url),
        ("PACKAGE_ID", &tool.package_id),
        ("PACKAGE_EXECUTABLE", &tool.package_executable),
        ("ENVIRONMENT_EXECUTABLE", &tool.environment_executable),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_default())
    .filter_map(|(name, value)| value.as_deref().map(|v| ConstView { name, literal: literal(v) }))
    .collect();

    let has_maps = tool
        .tasks
        .iter()
        .flat_map(|t| &t.settings_class.properties)
        .chain(tool.data_classes.iter().flat_map(|d| &d.properties))
        .any(|p| matches!(type_shape(&p.type_name, tool), TypeShape::Map { .. }));

    HeaderView {
        repository_url: tool.repository_url().to_string(),
        doc,
        name_literal: literal(&tool.name),
        constants,
        has_maps,
    }
}

fn enum_view(enumeration: &Enumeration) -> EnumView {
    EnumView {
        name: to_pascal_case(&enumeration.name),
        doc: doc_lines(&enumeration.help),
        variants: variants(enumeration)
            .into_iter()
            .map(|(ident, value)| VariantView {
                ident,
                literal: literal(value),
            })
            .collect(),
    }
}

/// Variant identifiers paired with their values, made unique in order.
fn variants(enumeration: &Enumeration) -> Vec<(String, &str)> {
    let mut seen = HashSet::new();
    enumeration
        .values
        .iter()
        .map(|value| {
            let base = to_pascal_case(value);
            let mut ident = base.clone();
            let mut n = 2;
            while !seen.insert(ident.clone()) {
                ident = format!("{}{}", base, n);
                n += 1;
            }
            (ident, value.as_str())
        })
        .collect()
}

fn class_view(
    tool: &Tool,
    name: &str,
    help: &Option<String>,
    properties: &[Property],
    definitive_argument: Option<&str>,
) -> ClassView {
    ClassView {
        name: to_pascal_case(name),
        doc: doc_lines(help),
        fields: properties.iter().map(|p| field_view(tool, p)).collect(),
        secrets: properties.iter().filter(|p| p.secret).map(|p| literal(&p.name)).collect(),
        is_settings: definitive_argument.is_some(),
        definitive_argument: definitive_argument.filter(|a| !a.is_empty()).map(literal),
    }
}

fn field_view(tool: &Tool, property: &Property) -> FieldView {
    let snake = to_snake_case(&property.name);
    let shape = type_shape(&property.type_name, tool);
    let format = property.format.as_deref().filter(|f| !f.is_empty());

    let mut doc = doc_lines(&property.help);
    if property.secret {
        doc.push("Secret value; keep it out of logs.".to_string());
    }

    let mut view = FieldView {
        field: raw_ident(&snake),
        getter: getter_name(&snake),
        snake,
        doc,
        default_expr: default_expr(tool, &shape, &property.default),
        settable: property.settable,
        argument: format.is_some() && shape.is_argument(),
        format_literal: format.map(literal).unwrap_or_default(),
        ..Default::default()
    };

    match &shape {
        TypeShape::Scalar { rust, .. } => {
            view.storage = format!("Option<{}>", rust);
            view.getter_type = format!("Option<&{}>", rust);
            view.getter_body = format!("self.{}.as_ref()", view.field);
            (view.param_type, view.into) = param(rust);
            view.item_type = rust.clone();
            view.is_scalar = true;
            view.is_valued = true;
        }
        TypeShape::Bool => {
            view.storage = "Option<bool>".to_string();
            view.getter_type = "Option<bool>".to_string();
            view.getter_body = format!("self.{}", view.field);
            view.param_type = "bool".to_string();
            view.item_type = "bool".to_string();
            view.is_bool = true;
            let valued = format.is_some_and(|f| f.contains("{value}"));
            view.is_valued = valued;
            view.is_flag = !valued;
        }
        TypeShape::List { item, .. } => {
            view.storage = format!("Vec<{}>", item);
            view.getter_type = format!("&[{}]", item);
            view.getter_body = format!("&self.{}", view.field);
            (view.param_type, view.into) = param(item);
            view.item_type = item.clone();
            view.is_list = true;
        }
        TypeShape::Map { value, .. } => {
            view.storage = format!("BTreeMap<String, {}>", value);
            view.getter_type = format!("&BTreeMap<String, {}>", value);
            view.getter_body = format!("&self.{}", view.field);
            (view.param_type, view.into) = param(value);
            view.item_type = value.clone();
            view.is_map = true;
        }
    }
    view
}

/// Methods every generated class already has.
const RESERVED_METHODS: &[&str] = &["default", "arguments", "clone"];

fn getter_name(snake: &str) -> String {
    if RESERVED_METHODS.contains(&snake) {
        format!("{}_value", snake)
    } else {
        raw_ident(snake)
    }
}

fn param(rust: &str) -> (String, bool) {
    if rust == "String" {
        ("impl Into<String>".to_string(), true)
    } else {
        (rust.to_string(), false)
    }
}

/// Rust expression for a property's declared default.
fn default_expr(tool: &Tool, shape: &TypeShape, default: &Value) -> String {
    let empty = match shape {
        TypeShape::Scalar { .. } | TypeShape::Bool => "None",
        TypeShape::List { .. } => "Vec::new()",
        TypeShape::Map { .. } => "BTreeMap::new()",
    };
    if default.is_default() {
        return empty.to_string();
    }

    let expr = match (shape, default) {
        (TypeShape::Scalar { rust, .. }, value) => value_literal(tool, rust, value).map(|v| format!("Some({})", v)),
        (TypeShape::Bool, Value::Bool(b)) => Some(format!("Some({})", b)),
        (TypeShape::List { item, .. }, Value::Array(items)) => items
            .iter()
            .map(|v| value_literal(tool, item, v))
            .collect::<Option<Vec<_>>>()
            .map(|items| format!("vec![{}]", items.join(", "))),
        (TypeShape::Map { value: rust, .. }, Value::Object(map)) => map
            .iter()
            .map(|(k, v)| value_literal(tool, rust, v).map(|v| format!("({}.to_string(), {})", literal(k), v)))
            .collect::<Option<Vec<_>>>()
            .map(|entries| format!("BTreeMap::from([{}])", entries.join(", "))),
        _ => None,
    };
    expr.unwrap_or_else(|| empty.to_string())
}

fn value_literal(tool: &Tool, rust: &str, value: &Value) -> Option<String> {
    match (rust, value) {
        ("String", Value::String(s)) => Some(format!("{}.to_string()", literal(s))),
        ("String", Value::Number(n)) => Some(format!("{}.to_string()", literal(&n.to_string()))),
        ("bool", Value::Bool(b)) => Some(b.to_string()),
        ("i64", Value::Number(n)) => n.as_i64().map(|n| n.to_string()),
        ("u64", Value::Number(n)) => n.as_u64().map(|n| n.to_string()),
        ("f64", Value::Number(n)) => n.as_f64().map(|n| format!("{:?}", n)),
        (name, Value::String(s)) => {
            let enumeration = tool.enumerations.iter().find(|e| to_pascal_case(&e.name) == name)?;
            variants(enumeration)
                .into_iter()
                .find(|(_, v)| v == s)
                .map(|(ident, _)| format!("{}::{}", name, ident))
        }
        _ => None,
    }
}

/// A Rust string literal.
fn literal(value: &str) -> String {
    format!("{:?}", value)
}

fn doc_lines(help: &Option<String>) -> Vec<String> {
    help.as_deref()
        .map(|h| h.lines().map(|l| l.trim_end().to_string()).collect())
        .unwrap_or_default()
}
