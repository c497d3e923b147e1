//! Date templates: short two-letter codes compiled into a function that
//! formats the current time on every call.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Datelike, Local, Timelike};
use regex::Regex;

/// Maximal runs of two-or-more uppercase ASCII letters are placeholder
/// candidates; only exact two-letter table keys are replaced.
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("[A-Z]{2,}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Day,
    Month,
    Year,
    Hours,
    Minutes,
    Seconds,
    Millis,
}

impl DateField {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "DA" => Some(Self::Day),
            "MO" => Some(Self::Month),
            "YE" => Some(Self::Year),
            "HO" => Some(Self::Hours),
            "MI" => Some(Self::Minutes),
            "SE" => Some(Self::Seconds),
            "ML" => Some(Self::Millis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(DateField),
}

/// A compiled date template. Rendering captures the current local time, so
/// two calls at different instants produce different output; everything
/// that is not a recognized code is emitted verbatim.
#[derive(Debug, Clone)]
pub struct DateTemplate {
    pieces: Vec<Piece>,
}

impl DateTemplate {
    /// Compilation cannot fail: unknown codes stay literal text.
    pub fn compile(template: &str) -> Self {
        let mut pieces = Vec::new();
        let mut last = 0;
        for m in CODE_RE.find_iter(template) {
            if m.start() > last {
                pieces.push(Piece::Literal(template[last..m.start()].to_string()));
            }
            last = m.end();
            match DateField::from_code(m.as_str()) {
                Some(field) => pieces.push(Piece::Field(field)),
                None => pieces.push(Piece::Literal(m.as_str().to_string())),
            }
        }
        if last < template.len() {
            pieces.push(Piece::Literal(template[last..].to_string()));
        }
        Self { pieces }
    }

    pub fn render_now(&self) -> String {
        self.render_at(Local::now())
    }

    fn render_at(&self, now: DateTime<Local>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field(field) => {
                    let text = match field {
                        DateField::Day => format!("{:02}", now.day()),
                        DateField::Month => format!("{:02}", now.month()),
                        DateField::Year => format!("{:02}", now.year()),
                        DateField::Hours => format!("{:02}", now.hour()),
                        DateField::Minutes => format!("{:02}", now.minute()),
                        DateField::Seconds => format!("{:02}", now.second()),
                        DateField::Millis => format!("{:03}", now.timestamp_subsec_millis()),
                    };
                    out.push_str(&text);
                }
            }
        }
        out
    }
}

/// The timestamp source stored in a logger configuration: either a compiled
/// template or an arbitrary caller-supplied function.
#[derive(Clone)]
pub enum DateFn {
    Template(DateTemplate),
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

impl DateFn {
    pub fn render(&self) -> String {
        match self {
            DateFn::Template(t) => t.render_now(),
            DateFn::Custom(f) => f(),
        }
    }
}

impl fmt::Debug for DateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFn::Template(t) => f.debug_tuple("Template").field(t).finish(),
            DateFn::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 7, 4, 5, 6)
            .unwrap()
            .with_nanosecond(42_000_000)
            .unwrap()
    }

    #[test]
    fn test_all_codes_zero_padded() {
        let t = DateTemplate::compile("DA-MO-YE HO:MI:SE.ML");
        assert_eq!(t.render_at(fixed()), "07-03-2026 04:05:06.042");
    }

    #[test]
    fn test_separators_untouched() {
        let t = DateTemplate::compile("[HO|MI]");
        assert_eq!(t.render_at(fixed()), "[04|05]");
    }

    #[test]
    fn test_unknown_two_letter_run_passes_through() {
        let t = DateTemplate::compile("XX-DA");
        assert_eq!(t.render_at(fixed()), "XX-07");
    }

    #[test]
    fn test_longer_runs_are_not_codes() {
        // "DAMO" is one maximal run, not two codes
        let t = DateTemplate::compile("DAMO YEAR");
        assert_eq!(t.render_at(fixed()), "DAMO YEAR");
    }

    #[test]
    fn test_single_uppercase_letter_is_literal() {
        let t = DateTemplate::compile("T: HO");
        assert_eq!(t.render_at(fixed()), "T: 04");
    }

    #[test]
    fn test_lowercase_is_literal() {
        let t = DateTemplate::compile("da-DA");
        assert_eq!(t.render_at(fixed()), "da-07");
    }

    #[test]
    fn test_render_now_is_fresh_per_call() {
        let t = DateTemplate::compile("HO:MI:SE.ML");
        let a = t.render_now();
        let b = t.render_now();
        // stable shape whatever the instant
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), "00:00:00.000".len());
    }

    #[test]
    fn test_custom_fn_bypasses_compilation() {
        let f = DateFn::Custom(Arc::new(|| "frozen".to_string()));
        assert_eq!(f.render(), "frozen");
    }
}
