//! Arithmetic expression tool

use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::fmt;

/// Characters an expression may consist of
const EXPRESSION_PATTERN: &str = r"^[0-9+\-*/().\s]+$";

/// Tool evaluating `+ - * / // **` over integers and decimals
pub struct CalculateTool;

impl CalculateTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalculateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a safe math expression"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression using + - * / // ** and parentheses"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let expression: String = call.get_parameter("expression")?;

        let valid = Regex::new(EXPRESSION_PATTERN).map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: e.to_string(),
        })?;
        if !valid.is_match(&expression) {
            return Ok(ToolResult::failure(call.id.as_str(), "Invalid expression"));
        }

        match evaluate(&expression) {
            Ok(value) => Ok(ToolResult::success(call.id, format!("Result: {}", value))),
            Err(message) => Ok(ToolResult::error(call.id, message)),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Compound interest factor".to_string(),
            parameters: json!({"expression": "(1 + 0.05) ** 10"}),
            expected_result: "Result: 1.628894626777442".to_string(),
        }]
    }
}

impl_tool_factory!(
    CalculateToolFactory,
    CalculateTool,
    "calculate",
    "Evaluate a safe math expression"
);

/// A computed number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_nan() => f.write_str("nan"),
            Number::Float(x) if x.is_infinite() => {
                f.write_str(if x > 0.0 { "inf" } else { "-inf" })
            }
            Number::Float(x) if x != 0.0 && (x.abs() >= 1e16 || x.abs() < 1e-4) => {
                write_exponent(f, x)
            }
            Number::Float(x) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Shortest round-trip digits with a signed, two-digit exponent (`1.5e-05`, `1e+16`)
fn write_exponent(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let formatted = format!("{:e}", x);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    write!(f, "{}e{}{:02}", mantissa, sign, exponent.abs())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    DoubleStar,
    LParen,
    RParen,
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> std::result::Result<Number, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("invalid syntax".to_string());
    }
    Ok(value)
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&literal)?));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::DoubleStar
            }
            '*' => Token::Star,
            '/' if chars.get(i + 1) == Some(&'/') => {
                i += 1;
                Token::DoubleSlash
            }
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(format!("unexpected character '{}'", other)),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> std::result::Result<Number, String> {
    if literal.contains('.') {
        if literal == "." || literal.matches('.').count() > 1 {
            return Err("invalid syntax".to_string());
        }
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| "invalid syntax".to_string())
    } else {
        literal
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| "integer literal too large".to_string())
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> std::result::Result<Number, String> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = binary(op, value, rhs)?;
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '//') unary)*
    fn term(&mut self) -> std::result::Result<Number, String> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = binary(op, value, rhs)?;
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> std::result::Result<Number, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                match self.unary()? {
                    Number::Int(i) => i
                        .checked_neg()
                        .map(Number::Int)
                        .ok_or_else(|| "integer overflow".to_string()),
                    Number::Float(f) => Ok(Number::Float(-f)),
                }
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?   (right-associative, binds tighter than a leading sign)
    fn power(&mut self) -> std::result::Result<Number, String> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.unary()?;
            return binary(Token::DoubleStar, base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> std::result::Result<Number, String> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("'(' was never closed".to_string()),
                }
            }
            _ => Err("invalid syntax".to_string()),
        }
    }
}

fn binary(op: Token, lhs: Number, rhs: Number) -> std::result::Result<Number, String> {
    use Number::{Float, Int};

    let overflow = || "integer overflow".to_string();

    match op {
        Token::Plus => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or_else(overflow),
            _ => Ok(Float(lhs.as_f64() + rhs.as_f64())),
        },
        Token::Minus => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or_else(overflow),
            _ => Ok(Float(lhs.as_f64() - rhs.as_f64())),
        },
        Token::Star => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or_else(overflow),
            _ => Ok(Float(lhs.as_f64() * rhs.as_f64())),
        },
        Token::Slash => {
            if rhs.is_zero() {
                return Err("division by zero".to_string());
            }
            Ok(Float(lhs.as_f64() / rhs.as_f64()))
        }
        Token::DoubleSlash => {
            if rhs.is_zero() {
                return Err("integer division or modulo by zero".to_string());
            }
            match (lhs, rhs) {
                (Int(a), Int(b)) => {
                    let q = a.checked_div(b).ok_or_else(overflow)?;
                    // Round toward negative infinity
                    if (a % b != 0) && ((a < 0) != (b < 0)) {
                        Ok(Int(q - 1))
                    } else {
                        Ok(Int(q))
                    }
                }
                _ => Ok(Float((lhs.as_f64() / rhs.as_f64()).floor())),
            }
        }
        Token::DoubleStar => match (lhs, rhs) {
            (Int(a), Int(b)) if b >= 0 => {
                let exp = u32::try_from(b).map_err(|_| overflow())?;
                a.checked_pow(exp).map(Int).ok_or_else(overflow)
            }
            _ => {
                if lhs.is_zero() && rhs.as_f64() < 0.0 {
                    return Err("0.0 cannot be raised to a negative power".to_string());
                }
                let value = lhs.as_f64().powf(rhs.as_f64());
                if value.is_nan() {
                    return Err("math domain error".to_string());
                }
                Ok(Float(value))
            }
        },
        _ => Err("invalid syntax".to_string()),
    }
}
