//! Printf-style directive substitution and inspect-style value rendering.
//!
//! This is the generic formatter the write path hands its assembled line to:
//! `%s %d %i %f %j %o %O` directives consume trailing arguments left to
//! right, surplus arguments are appended space-separated, and structured
//! values are rendered honoring depth, compactness and color options.

use colored::Colorize;
use serde_json::Value;

/// Rendering options for structured values, carried per logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    /// Containers nested deeper than this render as `[Object]`/`[Array]`.
    pub depth: usize,
    /// Single-line rendering when set, indented multi-line otherwise.
    pub compact: bool,
    /// Colorize scalars with ANSI escapes.
    pub colors: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: 2,
            compact: true,
            colors: false,
        }
    }
}

/// Substitutes `%`-directives in `text` with `args`, then appends surplus
/// arguments space-separated. A directive without a matching argument is
/// left verbatim; `%%` always emits one literal `%`.
pub fn format_with_options(opts: &InspectOptions, text: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut args = args.iter();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(&d) if is_directive(d) => {
                if let Some(arg) = args.next() {
                    chars.next();
                    out.push_str(&apply_directive(d, arg, opts));
                } else {
                    // out of arguments, keep the directive as text
                    out.push('%');
                }
            }
            _ => out.push('%'),
        }
    }
    for arg in args {
        out.push(' ');
        out.push_str(&stringify(arg, opts));
    }
    out
}

pub(crate) fn is_directive(c: char) -> bool {
    matches!(c, 's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O')
}

fn apply_directive(directive: char, arg: &Value, opts: &InspectOptions) -> String {
    match directive {
        's' => stringify(arg, opts),
        'd' | 'i' => match arg.as_f64() {
            Some(n) => paint_number(&format!("{}", n.trunc() as i64), opts),
            None => "NaN".to_string(),
        },
        'f' => match arg.as_f64() {
            Some(n) => paint_number(&trim_float(n), opts),
            None => "NaN".to_string(),
        },
        'j' => serde_json::to_string(arg).unwrap_or_else(|_| "undefined".into()),
        // %o ignores the depth limit, %O honors it
        'o' => inspect_depth(arg, &InspectOptions { depth: usize::MAX, ..*opts }, 0),
        'O' => inspect_depth(arg, opts, 0),
        _ => unreachable!("unknown directive"),
    }
}

/// Top-level textual rendition: strings stay bare, everything else goes
/// through [`inspect`].
pub fn stringify(value: &Value, opts: &InspectOptions) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => inspect(other, opts),
    }
}

/// Plain, uncolored text for a value spliced into a templated message.
pub(crate) fn splice_text(value: &Value) -> String {
    stringify(
        value,
        &InspectOptions {
            colors: false,
            ..InspectOptions::default()
        },
    )
}

/// Renders a value tree the way a console inspector would.
pub fn inspect(value: &Value, opts: &InspectOptions) -> String {
    inspect_depth(value, opts, 0)
}

fn inspect_depth(value: &Value, opts: &InspectOptions, level: usize) -> String {
    match value {
        Value::Null => paint_keyword("null", opts),
        Value::Bool(b) => paint_keyword(if *b { "true" } else { "false" }, opts),
        Value::Number(n) => paint_number(&n.to_string(), opts),
        Value::String(s) => {
            let quoted = format!("'{}'", s.replace('\'', "\\'"));
            if opts.colors {
                quoted.green().to_string()
            } else {
                quoted
            }
        }
        Value::Array(items) => {
            if level > opts.depth {
                return "[Array]".to_string();
            }
            if items.is_empty() {
                return "[]".to_string();
            }
            let parts: Vec<String> = items
                .iter()
                .map(|v| inspect_depth(v, opts, level + 1))
                .collect();
            join_container("[", "]", &parts, opts, level)
        }
        Value::Object(map) => {
            if level > opts.depth {
                return "[Object]".to_string();
            }
            if map.is_empty() {
                return "{}".to_string();
            }
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_key(k), inspect_depth(v, opts, level + 1)))
                .collect();
            join_container("{", "}", &parts, opts, level)
        }
    }
}

fn join_container(
    open: &str,
    close: &str,
    parts: &[String],
    opts: &InspectOptions,
    level: usize,
) -> String {
    if opts.compact {
        format!("{open} {} {close}", parts.join(", "))
    } else {
        let pad = "  ".repeat(level + 1);
        let end_pad = "  ".repeat(level);
        let body = parts
            .iter()
            .map(|p| format!("{pad}{p}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{open}\n{body}\n{end_pad}{close}")
    }
}

fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if bare {
        key.to_string()
    } else {
        format!("'{key}'")
    }
}

fn paint_number(text: &str, opts: &InspectOptions) -> String {
    if opts.colors {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

fn paint_keyword(text: &str, opts: &InspectOptions) -> String {
    if opts.colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn trim_float(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}
