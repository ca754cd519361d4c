//! Arithmetic price formulas with `{Item Name}` placeholders
//!
//! Grammar, with the usual precedence:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | atom
//! atom   := number | '{' name '}' | '(' expr ')'
//! ```

use crate::error::FormulaError;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Placeholder(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen(usize),
    RParen(usize),
}

/// Evaluate `expression`, resolving each placeholder through `resolve`
pub fn evaluate<R>(expression: &str, resolve: R) -> Result<f64, FormulaError>
where
    R: Fn(&str) -> Option<f64>,
{
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        resolve: &resolve,
    };
    let value = parser.expr()?;

    match parser.peek() {
        None => {}
        Some(Token::RParen(position)) => return Err(FormulaError::UnbalancedParen(*position)),
        Some(_) => return Err(FormulaError::TrailingInput),
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Names referenced by `{...}` placeholders, in order of appearance
pub fn placeholders(expression: &str) -> Vec<String> {
    tokenize(expression)
        .map(|tokens| {
            tokens
                .into_iter()
                .filter_map(|t| match t {
                    Token::Placeholder(name) => Some(name),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn tokenize(expression: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen(i));
                i += 1;
            }
            '{' => {
                let start = i;
                let close = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '}')
                    .ok_or(FormulaError::UnterminatedPlaceholder(start))?;
                let name: String = chars[i + 1..i + 1 + close].iter().collect();
                tokens.push(Token::Placeholder(name));
                i += close + 2;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(number));
            }
            other => {
                return Err(FormulaError::UnexpectedChar {
                    found: other,
                    position: i,
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a, R> {
    tokens: &'a [Token],
    pos: usize,
    resolve: &'a R,
}

impl<'a, R> Parser<'a, R>
where
    R: Fn(&str) -> Option<f64>,
{
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::Placeholder(name)) => (self.resolve)(name)
                .ok_or_else(|| FormulaError::UnresolvedPlaceholder(name.clone())),
            Some(Token::LParen(open)) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen(_)) => Ok(value),
                    _ => Err(FormulaError::UnbalancedParen(*open)),
                }
            }
            Some(Token::RParen(position)) => Err(FormulaError::UnbalancedParen(*position)),
            Some(_) | None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
