//! Restricted expression engine for `%expr%` placeholders.
//!
//! Expressions are evaluated against the context's value tree and nothing
//! else: no environment, filesystem or process access. Supported grammar:
//! number/string literals, `true`/`false`/`null`, identifiers with dotted
//! property paths, unary `-`, binary `+ - * /` and parentheses. `+`
//! concatenates as soon as either operand is a string.

use serde_json::Value;

use crate::format::splice_text;

/// Evaluates `source` against `context`. The error string is the reason
/// reported to the write caller via `LogError::Template`.
pub(crate) fn eval(source: &str, context: &Value) -> Result<Value, String> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => evaluate(&expr, context),
        Some(t) => Err(format!("unexpected `{t}` after expression")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Dot,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Dot => write!(f, "."),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => text.push(c),
                        None => return Err("unterminated string literal".into()),
                    }
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // a fractional part only if a digit follows the dot,
                // otherwise the dot stays a path separator
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('.')
                    && lookahead.peek().is_some_and(|c| c.is_ascii_digit())
                {
                    chars.next();
                    text.push('.');
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_digit() {
                            text.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                let n: f64 = text
                    .parse()
                    .map_err(|_| format!("invalid number `{text}`"))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

#[derive(Debug)]
enum Expr {
    Lit(Value),
    Path(Vec<String>),
    Neg(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.parse_factor()?))),
            Some(Token::Num(n)) => Ok(Expr::Lit(number_value(n)?)),
            Some(Token::Str(s)) => Ok(Expr::Lit(Value::String(s))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Lit(Value::Bool(true))),
                "false" => Ok(Expr::Lit(Value::Bool(false))),
                "null" => Ok(Expr::Lit(Value::Null)),
                _ => {
                    let mut path = vec![name];
                    while matches!(self.peek(), Some(Token::Dot)) {
                        self.pos += 1;
                        match self.next() {
                            Some(Token::Ident(seg)) => path.push(seg),
                            _ => return Err("expected property name after `.`".into()),
                        }
                    }
                    Ok(Expr::Path(path))
                }
            },
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing closing `)`".into()),
                }
            }
            Some(t) => Err(format!("unexpected `{t}`")),
            None => Err("unexpected end of expression".into()),
        }
    }
}

fn evaluate(expr: &Expr, context: &Value) -> Result<Value, String> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Path(path) => resolve_path(path, context),
        Expr::Neg(inner) => {
            let v = evaluate(inner, context)?;
            number_value(-as_number(&v, "-")?)
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = evaluate(lhs, context)?;
            let r = evaluate(rhs, context)?;
            if matches!(op, Op::Add) && (l.is_string() || r.is_string()) {
                return Ok(Value::String(format!("{}{}", splice_text(&l), splice_text(&r))));
            }
            let l = as_number(&l, op.symbol())?;
            let r = as_number(&r, op.symbol())?;
            let n = match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => l / r,
            };
            number_value(n)
        }
    }
}

fn resolve_path(path: &[String], context: &Value) -> Result<Value, String> {
    let mut current = context;
    for (i, segment) in path.iter().enumerate() {
        match current.get(segment) {
            Some(next) => current = next,
            None => {
                return Err(if i == 0 {
                    format!("`{segment}` is not defined")
                } else {
                    format!("undefined property `{}`", path[..=i].join("."))
                });
            }
        }
    }
    Ok(current.clone())
}

fn as_number(value: &Value, op: &str) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("`{n}` is not representable")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        other => Err(format!(
            "cannot apply `{op}` to {}",
            type_name(other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn number_value(n: f64) -> Result<Value, String> {
    if !n.is_finite() {
        return Err("arithmetic produced a non-finite value".into());
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Ok(Value::from(n as i64))
    } else {
        Ok(Value::from(n))
    }
}
