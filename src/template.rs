//! Context tagging and `%expr%` placeholder substitution.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{LogError, Result};
use crate::expr;
use crate::format::{is_directive, splice_text};

/// A placeholder span: `%` + one or more of (space, visible ASCII except
/// `%`, or a run of two-or-more `%` as literal escapes) + `%`. A bare `%%`
/// outside a span is a single literal percent. Alternation order matters:
/// `%%` wins when both could match.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%|%(?:[\x20-\x24\x26-\x7e]|%{2,})+%").unwrap());

/// A value tree tagged for template evaluation. The tag is what lets the
/// write path tell a context apart from a plain first argument; expressions
/// see the wrapped tree's fields and nothing else.
#[derive(Debug, Clone)]
pub struct Context(Value);

impl Context {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Context {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Tags `value` as a context for templated writes.
pub fn contextualize(value: Value) -> Context {
    Context::new(value)
}

/// Substitutes every placeholder in `message` against `context`, left to
/// right, single pass. Evaluation failure is an error for this call, never
/// a silent fallback to the raw placeholder text.
pub fn render(context: &Context, message: &str) -> Result<String> {
    let mut out = String::with_capacity(message.len());
    let mut last = 0;
    for m in PLACEHOLDER_RE.find_iter(message) {
        out.push_str(&message[last..m.start()]);
        last = m.end();
        let matched = m.as_str();
        if matched == "%%" {
            out.push('%');
            continue;
        }
        let interior = matched[1..matched.len() - 1].replace("%%", "%");
        let mut inner = interior.chars();
        if let (Some(c), None) = (inner.next(), inner.next())
            && is_directive(c)
        {
            // printf directive for the argument formatter, not an expression
            out.push('%');
            out.push(c);
            continue;
        }
        match expr::eval(&interior, context.value()) {
            Ok(value) => out.push_str(&splice_text(&value)),
            Err(reason) => {
                return Err(LogError::Template {
                    expr: interior,
                    reason,
                });
            }
        }
    }
    out.push_str(&message[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pedro() -> Context {
        contextualize(json!({
            "name": "Pedro",
            "age": 25,
            "info": { "casa": 1, "perro": 0 },
        }))
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        let msg = "plain text stays untouched";
        assert_eq!(render(&pedro(), msg).unwrap(), msg);
    }

    #[test]
    fn test_unpaired_percent_is_identity() {
        // a span needs a closing delimiter
        let msg = "50% off";
        assert_eq!(render(&pedro(), msg).unwrap(), msg);
    }

    #[test]
    fn test_double_percent_renders_one() {
        assert_eq!(render(&pedro(), "100%% done").unwrap(), "100% done");
    }

    #[test]
    fn test_field_and_path_substitution() {
        let out = render(&pedro(), "%name% tiene %info.casa% casa").unwrap();
        assert_eq!(out, "Pedro tiene 1 casa");
    }

    #[test]
    fn test_arithmetic_expression() {
        let out = render(&pedro(), "total: %age+info.casa%").unwrap();
        assert_eq!(out, "total: 26");
    }

    #[test]
    fn test_directive_spans_pass_through() {
        let out = render(&pedro(), "%name% y %d%€").unwrap();
        assert_eq!(out, "Pedro y %d€");
    }

    #[test]
    fn test_pedro_message() {
        let msg = "%name% tiene %age% años, casas: %info.casa%, perros:%info.perro% y %d%€";
        let out = render(&pedro(), msg).unwrap();
        assert_eq!(out, "Pedro tiene 25 años, casas: 1, perros:0 y %d€");
    }

    #[test]
    fn test_escaped_percent_inside_span() {
        let out = render(&pedro(), "%'50%%'% off").unwrap();
        assert_eq!(out, "50% off");
    }

    #[test]
    fn test_undefined_path_is_an_error() {
        let err = render(&pedro(), "%info.gato%").unwrap_err();
        assert!(matches!(err, LogError::Template { .. }), "{err}");
    }

    #[test]
    fn test_syntax_error_is_an_error() {
        assert!(render(&pedro(), "%age+%").is_err());
    }

    #[test]
    fn test_object_splice_uses_inspector() {
        let out = render(&pedro(), "%info%").unwrap();
        assert_eq!(out, "{ casa: 1, perro: 0 }");
    }
}
