//! Arithmetic expression language used by formulas.
//!
//! A small lexer and recursive-descent parser produce an [`Expr`] tree which
//! is then evaluated against a caller-supplied identifier lookup. Nothing is
//! ever executed beyond the arithmetic below.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := mul (('+' | '-') mul)*
//! mul     := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | ident | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! `Math.` prefixes are accepted and ignored, so `Math.sqrt(x)` == `sqrt(x)`.

use super::ledger::ComputationError;
use std::f64::consts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

// --- Lexer ---

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn lex(src: &str) -> Result<Vec<Token>, ComputationError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).map_or(false, |d| d.is_ascii_digit())) {
            i = scan_number(&chars, i);
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| parse_error(start, format!("bad number '{}'", text)))?;
            tokens.push(Token { kind: TokenKind::Number(value), pos: start });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let mut name: String = chars[start..i].iter().collect();
            // Math.fn -> fn
            if name == "Math" && chars.get(i) == Some(&'.') {
                let fn_start = i + 1;
                let mut j = fn_start;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                if j == fn_start {
                    return Err(parse_error(i, "expected a name after 'Math.'"));
                }
                name = chars[fn_start..j].iter().collect();
                i = j;
            }
            tokens.push(Token { kind: TokenKind::Ident(name), pos: start });
            continue;
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                TokenKind::Caret
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            other => return Err(parse_error(start, format!("unexpected character '{}'", other))),
        };
        tokens.push(Token { kind, pos: start });
        i += 1;
    }
    Ok(tokens)
}

/// Digits, an optional fraction and an optional exponent. The exponent is
/// only consumed when digits follow it.
fn scan_number(chars: &[char], mut i: usize) -> usize {
    let digits = |chars: &[char], mut i: usize| {
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    i = digits(chars, i);
    if chars.get(i) == Some(&'.') {
        i = digits(chars, i + 1);
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).map_or(false, |d| d.is_ascii_digit()) {
            i = digits(chars, j);
        }
    }
    i
}

fn parse_error(position: usize, message: impl Into<String>) -> ComputationError {
    ComputationError::Parse { position, message: message.into() }
}

// --- Parser ---

/// Nesting limit for parentheses, signs and exponents. Formulas arrive from
/// an editor on every keystroke, so a pathological one must fail as a parse
/// error rather than exhaust the stack.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> { self.tokens.get(self.cursor).map(|t| &t.kind) }

    fn pos(&self) -> usize { self.tokens.get(self.cursor).map_or(self.end, |t| t.pos) }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.cursor).map(|t| t.kind.clone());
        self.cursor += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ComputationError> {
        if self.peek() == Some(&kind) {
            self.cursor += 1;
            Ok(())
        } else {
            Err(parse_error(self.pos(), format!("expected {}", what)))
        }
    }

    fn parse_add_sub(&mut self) -> Result<Expr, ComputationError> {
        let mut left = self.parse_mul_div()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.cursor += 1;
            // `a - b - c` groups as `(a - b) - c`
            let right = self.parse_mul_div()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, ComputationError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.cursor += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Every nesting level passes through here, so this is where depth is
    /// counted.
    fn parse_unary(&mut self) -> Result<Expr, ComputationError> {
        if self.depth >= MAX_DEPTH {
            return Err(parse_error(self.pos(), format!("formula nested deeper than {} levels", MAX_DEPTH)));
        }
        self.depth += 1;
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Expr, ComputationError> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.parse_power(),
        };
        self.cursor += 1;
        let inner = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(inner)))
    }

    /// Right-associative: `2^3^2` is `2^(3^2)`. The exponent may carry its
    /// own sign (`2^-1`).
    fn parse_power(&mut self) -> Result<Expr, ComputationError> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&TokenKind::Caret) {
            self.cursor += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ComputationError> {
        let pos = self.pos();
        match self.advance() {
            Some(TokenKind::Number(n)) => Ok(Expr::Number(n)),
            Some(TokenKind::Ident(name)) => {
                if self.peek() != Some(&TokenKind::LParen) {
                    return Ok(Expr::Ident(name));
                }
                self.cursor += 1;
                let mut args = Vec::new();
                if self.peek() != Some(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_add_sub()?);
                        if self.peek() == Some(&TokenKind::Comma) {
                            self.cursor += 1;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')' after arguments")?;
                Ok(Expr::Call(name, args))
            }
            Some(TokenKind::LParen) => {
                let inner = self.parse_add_sub()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(other) => Err(parse_error(pos, format!("unexpected token {:?}", other))),
            None => Err(parse_error(pos, "unexpected end of formula")),
        }
    }
}

/// Parses a formula into an expression tree.
pub fn parse(src: &str) -> Result<Expr, ComputationError> {
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Err(parse_error(0, "empty formula"));
    }
    let mut parser = Parser { tokens, cursor: 0, end: src.chars().count(), depth: 0 };
    let expr = parser.parse_add_sub()?;
    if parser.cursor < parser.tokens.len() {
        return Err(parse_error(parser.pos(), "unexpected trailing input"));
    }
    Ok(expr)
}

// --- Evaluation ---

impl Expr {
    /// Evaluates the tree. Identifiers go through `lookup` first, then the
    /// constants `pi` and `e`.
    pub fn eval<F>(&self, lookup: &F) -> Result<f64, ComputationError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ident(name) => lookup(name)
                .or_else(|| constant(name))
                .ok_or_else(|| ComputationError::UnknownIdentifier(name.clone())),
            Expr::Unary(op, inner) => {
                let v = inner.eval(lookup)?;
                Ok(match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Plus => v,
                })
            }
            Expr::Binary(op, l, r) => {
                let (a, b) = (l.eval(lookup)?, r.eval(lookup)?);
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem => a % b,
                    BinaryOp::Pow => a.powf(b),
                })
            }
            Expr::Call(name, args) => {
                let values = args.iter().map(|a| a.eval(lookup)).collect::<Result<Vec<_>, _>>()?;
                call(name, &values)
            }
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(consts::PI),
        "e" | "E" => Some(consts::E),
        _ => None,
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, ComputationError> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ComputationError::Arity { function: name.to_string(), expected, found: args.len() })
        }
    };

    match name {
        "max" | "min" => {
            if args.is_empty() {
                return Err(ComputationError::Arity { function: name.to_string(), expected: 1, found: 0 });
            }
            let fold = if name == "max" { f64::max } else { f64::min };
            Ok(args[1..].iter().copied().fold(args[0], fold))
        }
        "pow" => {
            arity(2)?;
            Ok(args[0].powf(args[1]))
        }
        _ => {
            let f: fn(f64) -> f64 = match name {
                "sin" => f64::sin,
                "cos" => f64::cos,
                "tan" => f64::tan,
                "log" => f64::ln,
                "exp" => f64::exp,
                "sqrt" => f64::sqrt,
                "abs" => f64::abs,
                // Halves round up, also for negatives: round(-2.5) == -2.
                "round" => |x: f64| (x + 0.5).floor(),
                "floor" => f64::floor,
                "ceil" => f64::ceil,
                _ => return Err(ComputationError::UnknownFunction(name.to_string())),
            };
            arity(1)?;
            Ok(f(args[0]))
        }
    }
}
