//! Handlebars templates for generated Rust wrappers.

pub const HEADER: &str = r#"// Generated by toolgen from {{repository_url}}. Do not edit.
{{#each doc}}
// {{this}}
{{/each}}
{{#if has_maps}}

use std::collections::BTreeMap;
{{/if}}

pub const TOOL_NAME: &str = {{name_literal}};
{{#each constants}}
pub const {{name}}: &str = {{literal}};
{{/each}}

fn push_formatted(args: &mut Vec<String>, format: &str, key: &str, value: &str) {
    args.extend(
        format
            .split_whitespace()
            .map(|part| part.replace("{key}", key).replace("{value}", value)),
    );
}
"#;

pub const ENUMERATION: &str = r#"
{{#each doc}}
/// {{this}}
{{/each}}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum {{name}} {
{{#each variants}}
    {{ident}},
{{/each}}
}

impl {{name}} {
    pub const VALUES: &'static [&'static str] = &[{{#each variants}}{{literal}}, {{/each}}];

    pub fn as_str(&self) -> &'static str {
{{#if variants}}
        match self {
{{#each variants}}
            Self::{{ident}} => {{literal}},
{{/each}}
        }
{{else}}
        match *self {}
{{/if}}
    }
}

impl std::fmt::Display for {{name}} {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
"#;

pub const CLASS: &str = r#"
{{#each doc}}
/// {{this}}
{{/each}}
#[derive(Debug, Clone, PartialEq)]
pub struct {{name}} {
{{#each fields}}
    {{field}}: {{storage}},
{{/each}}
}

impl Default for {{name}} {
    fn default() -> Self {
        Self {
{{#each fields}}
            {{field}}: {{default_expr}},
{{/each}}
        }
    }
}

impl {{name}} {
    pub const SECRET_PROPERTIES: &'static [&'static str] = &[{{#each secrets}}{{this}}, {{/each}}];
{{#each fields}}

{{#each doc}}
    /// {{this}}
{{/each}}
    pub fn {{getter}}(&self) -> {{getter_type}} {
        {{getter_body}}
    }
{{#if settable}}
{{#if is_scalar}}

    pub fn set_{{snake}}(mut self, value: {{param_type}}) -> Self {
        self.{{field}} = Some(value{{#if into}}.into(){{/if}});
        self
    }

    pub fn reset_{{snake}}(mut self) -> Self {
        self.{{field}} = None;
        self
    }
{{/if}}
{{#if is_bool}}

    pub fn set_{{snake}}(mut self, value: bool) -> Self {
        self.{{field}} = Some(value);
        self
    }

    pub fn reset_{{snake}}(mut self) -> Self {
        self.{{field}} = None;
        self
    }

    pub fn enable_{{snake}}(mut self) -> Self {
        self.{{field}} = Some(true);
        self
    }

    pub fn disable_{{snake}}(mut self) -> Self {
        self.{{field}} = Some(false);
        self
    }

    pub fn toggle_{{snake}}(mut self) -> Self {
        self.{{field}} = Some(!self.{{field}}.unwrap_or(false));
        self
    }
{{/if}}
{{#if is_list}}

    pub fn set_{{snake}}(mut self, values: impl IntoIterator<Item = {{item_type}}>) -> Self {
        self.{{field}} = values.into_iter().collect();
        self
    }

    pub fn add_{{snake}}(mut self, value: {{param_type}}) -> Self {
        self.{{field}}.push(value{{#if into}}.into(){{/if}});
        self
    }

    pub fn clear_{{snake}}(mut self) -> Self {
        self.{{field}}.clear();
        self
    }
{{/if}}
{{#if is_map}}

    pub fn set_{{snake}}(mut self, values: BTreeMap<String, {{item_type}}>) -> Self {
        self.{{field}} = values;
        self
    }

    pub fn add_{{snake}}(mut self, key: impl Into<String>, value: {{param_type}}) -> Self {
        self.{{field}}.insert(key.into(), value{{#if into}}.into(){{/if}});
        self
    }

    pub fn remove_{{snake}}(mut self, key: &str) -> Self {
        self.{{field}}.remove(key);
        self
    }

    pub fn clear_{{snake}}(mut self) -> Self {
        self.{{field}}.clear();
        self
    }
{{/if}}
{{/if}}
{{/each}}
{{#if is_settings}}

    /// Command-line arguments in declaration order.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
{{#if definitive_argument}}
        push_formatted(&mut args, {{definitive_argument}}, "", "");
{{/if}}
{{#each fields}}
{{#if argument}}
{{#if is_flag}}
        if self.{{field}} == Some(true) {
            push_formatted(&mut args, {{format_literal}}, "", "true");
        }
{{/if}}
{{#if is_valued}}
        if let Some(value) = &self.{{field}} {
            push_formatted(&mut args, {{format_literal}}, "", &value.to_string());
        }
{{/if}}
{{#if is_list}}
        for value in &self.{{field}} {
            push_formatted(&mut args, {{format_literal}}, "", &value.to_string());
        }
{{/if}}
{{#if is_map}}
        for (key, value) in &self.{{field}} {
            push_formatted(&mut args, {{format_literal}}, key, &value.to_string());
        }
{{/if}}
{{/if}}
{{/each}}
        args
    }
{{/if}}
}
"#;

pub const TASK: &str = r#"
{{#each doc}}
/// {{this}}
{{/each}}
pub fn {{function}}(configure: impl FnOnce({{settings}}) -> {{settings}}) -> Vec<String> {
    configure({{settings}}::default()).arguments()
}
"#;
