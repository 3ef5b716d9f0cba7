//! In-document selectors for reference extraction.
//!
//! Selectors starting with `/` are read as a small XPath subset and turned
//! into CSS; anything else is handed to the CSS parser unchanged.
//!
//! Supported XPath: `/` and `//` steps, element names or `*`, and the
//! predicates `[@a]`, `[@a='v']`, `[contains(@a,'v')]`,
//! `[starts-with(@a,'v')]` and `[n]`. A trailing `/text()` is ignored.
//!
//! `[n]` directly on a name becomes `:nth-of-type(n)`, and on `*` it becomes
//! `:nth-child(n)`. After another predicate it counts only the siblings that
//! passed the filter, which CSS cannot say; that form is allowed on the last
//! step and resolved while matching.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ToolgenError};

/// A selector in CSS form plus an optional filtered-sibling position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compiled {
    css: String,
    /// 1-based rank among siblings matching `css`.
    position: Option<usize>,
}

/// Translate `selector` into CSS.
pub fn to_css(selector: &str) -> Result<String> {
    let compiled = compile(selector)?;
    match compiled.position {
        None => Ok(compiled.css),
        Some(_) => Err(ToolgenError::selector(
            selector,
            "position after a filter has no CSS equivalent",
        )),
    }
}

/// Text content of the first element in `html` matching `selector`.
pub fn extract_text(html: &str, selector: &str) -> Result<String> {
    let compiled = compile(selector)?;
    let parsed =
        Selector::parse(&compiled.css).map_err(|e| ToolgenError::selector(selector, format!("{:?}", e)))?;
    let document = Html::parse_document(html);
    document
        .select(&parsed)
        .find(|element| compiled.position.is_none_or(|n| sibling_rank(element, &parsed) == n))
        .map(|element| element.text().collect::<String>())
        .ok_or_else(|| ToolgenError::selector(selector, "no element matches"))
}

/// 1-based position of `element` among its siblings that match `selector`.
fn sibling_rank(element: &ElementRef<'_>, selector: &Selector) -> usize {
    element
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| selector.matches(sibling))
        .count()
        + 1
}

fn compile(selector: &str) -> Result<Compiled> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(ToolgenError::selector(selector, "empty selector"));
    }
    if !trimmed.starts_with('/') {
        return Ok(Compiled {
            css: trimmed.to_string(),
            position: None,
        });
    }
    xpath_to_css(trimmed).map_err(|reason| ToolgenError::selector(selector, reason))
}

fn xpath_to_css(path: &str) -> std::result::Result<Compiled, String> {
    let path = path.strip_suffix("/text()").unwrap_or(path);
    let mut css = String::new();
    let mut position = None;
    let mut rest = path;
    let mut first = true;

    while !rest.is_empty() {
        let (descendant, after) = match rest.strip_prefix("//") {
            Some(after) => (true, after),
            None => match rest.strip_prefix('/') {
                Some(after) => (false, after),
                None => return Err(format!("expected '/' before '{}'", rest)),
            },
        };
        let (step, remaining) = split_step(after)?;
        if position.is_some() {
            return Err("a position after a filter is only supported on the last step".to_string());
        }
        let (step_css, step_position) = step_to_css(step)?;
        position = step_position;

        if first {
            css.push_str(&step_css);
            if !descendant {
                css.push_str(":root");
            }
            first = false;
        } else {
            css.push_str(if descendant { " " } else { " > " });
            css.push_str(&step_css);
        }
        rest = remaining;
    }

    if css.is_empty() {
        return Err("selector has no steps".to_string());
    }
    Ok(Compiled { css, position })
}

/// Split off one location step, honouring brackets and quotes.
fn split_step(input: &str) -> std::result::Result<(&str, &str), String> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            (None, '/') if depth == 0 => {
                return if i == 0 {
                    Err("empty location step".to_string())
                } else {
                    Ok((&input[..i], &input[i..]))
                };
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err("unterminated predicate".to_string());
    }
    if input.is_empty() {
        return Err("empty location step".to_string());
    }
    Ok((input, ""))
}

/// CSS for one step, plus a position that must be applied after matching.
fn step_to_css(step: &str) -> std::result::Result<(String, Option<usize>), String> {
    let name_end = step.find('[').unwrap_or(step.len());
    let name = &step[..name_end];
    if name != "*" && !is_name(name) {
        return Err(format!("unsupported location step '{}'", step));
    }

    let mut css = name.to_string();
    let mut filtered = false;
    let mut position = None;
    let mut predicates = &step[name_end..];
    while !predicates.is_empty() {
        let body = predicates
            .strip_prefix('[')
            .ok_or_else(|| format!("unexpected '{}'", predicates))?;
        let close = closing_bracket(body).ok_or("unterminated predicate")?;
        let predicate = body[..close].trim();

        if position.is_some() {
            return Err(format!("unsupported predicate [{}] after a position", predicate));
        }
        match position_index(predicate)? {
            Some(n) if filtered => position = Some(n),
            Some(n) if name == "*" => css.push_str(&format!(":nth-child({})", n)),
            Some(n) => css.push_str(&format!(":nth-of-type({})", n)),
            None => css.push_str(&predicate_to_css(predicate)?),
        }
        filtered = true;
        predicates = &body[close + 1..];
    }
    Ok((css, position))
}

/// `Some(n)` for a numeric predicate; XPath positions start at 1.
fn position_index(predicate: &str) -> std::result::Result<Option<usize>, String> {
    if predicate.is_empty() || !predicate.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    match predicate.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(format!("position [{}] is out of range", predicate)),
    }
}

fn closing_bracket(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn predicate_to_css(predicate: &str) -> std::result::Result<String, String> {
    if let Some((attr, value)) = function_args(predicate, "contains") {
        return Ok(format!("[{}*={}]", attr, css_string(value)));
    }
    if let Some((attr, value)) = function_args(predicate, "starts-with") {
        return Ok(format!("[{}^={}]", attr, css_string(value)));
    }
    if let Some(attr) = predicate.strip_prefix('@') {
        return match attr.split_once('=') {
            Some((name, value)) if is_name(name.trim()) => {
                let value = unquote(value.trim()).ok_or_else(|| format!("unquoted value in [{}]", predicate))?;
                Ok(format!("[{}={}]", name.trim(), css_string(value)))
            }
            None if is_name(attr) => Ok(format!("[{}]", attr)),
            _ => Err(format!("unsupported attribute test [{}]", predicate)),
        };
    }
    Err(format!("unsupported predicate [{}]", predicate))
}

/// `name(@attr, 'value')` -> `(attr, value)`
fn function_args<'a>(predicate: &'a str, function: &str) -> Option<(&'a str, &'a str)> {
    let args = predicate
        .strip_prefix(function)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let (attr, value) = args.split_once(',')?;
    let attr = attr.trim().strip_prefix('@')?;
    if !is_name(attr) {
        return None;
    }
    Some((attr, unquote(value.trim())?))
}

fn unquote(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    value.strip_prefix(quote)?.strip_suffix(quote)
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
