//! Formula parser
//!
//! Formula text is first cut into tokens, then parsed by precedence climbing.
//! Only single-sheet formulas are accepted; sheet-qualified references and
//! array constants are rejected as parse errors.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use underwrite_core::{CellAddress, CellError, CellRange};

/// Parse a formula string into an AST
///
/// The leading `=` is optional, since workbook XML stores formulas without it.
///
/// # Example
/// ```rust
/// use underwrite_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("SUM(F44:J44)/-$E$44").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    if formula.trim().is_empty() {
        return Err(FormulaError::Parse("Empty formula".into()));
    }

    let mut parser = FormulaParser {
        tokens: tokenize(formula)?,
        pos: 0,
    };
    let expr = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Function or defined name
    Identifier(String),
    /// `A1`, `$B$29`
    CellRef(String),
    /// `Sheet1!` or `'Rent Roll'!`
    SheetRef(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    LeftParen,
    RightParen,
    Eof,
}

/// Cut `input` into tokens, ending with [`Token::Eof`]
fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut chars = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let simple = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = simple {
            chars.next();
            tokens.push(token);
            continue;
        }

        let token = match c {
            '<' | '>' => {
                chars.next();
                comparison(c, &mut chars)
            }
            '"' => string_literal(&mut chars),
            '\'' => quoted_sheet(input, &mut chars)?,
            '#' => error_literal(input, &mut chars),
            c if c.is_ascii_digit() || c == '.' => number(input, &mut chars)?,
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => word(input, &mut chars),
            other => {
                return Err(FormulaError::Parse(format!(
                    "Unexpected character '{}' at {}",
                    other, start
                )))
            }
        };
        tokens.push(token);
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Consume characters while `keep` holds; returns the end offset
fn take_while(input: &str, chars: &mut Chars, keep: impl Fn(char) -> bool) -> usize {
    while let Some(&(_, c)) = chars.peek() {
        if !keep(c) {
            break;
        }
        chars.next();
    }
    chars.peek().map_or(input.len(), |&(idx, _)| idx)
}

fn next_is(chars: &mut Chars, expected: char) -> bool {
    chars.next_if(|&(_, c)| c == expected).is_some()
}

fn comparison(first: char, chars: &mut Chars) -> Token {
    match first {
        '<' if next_is(chars, '=') => Token::LessEqual,
        '<' if next_is(chars, '>') => Token::NotEqual,
        '<' => Token::LessThan,
        _ if next_is(chars, '=') => Token::GreaterEqual,
        _ => Token::GreaterThan,
    }
}

/// `"..."` with `""` standing for one quote; an unclosed string runs to the end
fn string_literal(chars: &mut Chars) -> Token {
    chars.next();
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        if c != '"' {
            text.push(c);
        } else if next_is(chars, '"') {
            text.push('"');
        } else {
            break;
        }
    }
    Token::String(text)
}

fn quoted_sheet(input: &str, chars: &mut Chars) -> FormulaResult<Token> {
    let start = chars.next().map_or(0, |(idx, _)| idx + 1);
    let end = take_while(input, chars, |c| c != '\'');
    if next_is(chars, '\'') && next_is(chars, '!') {
        Ok(Token::SheetRef(input[start..end].to_string()))
    } else {
        Err(FormulaError::Parse(format!(
            "Unterminated sheet name '{}'",
            &input[start..end]
        )))
    }
}

/// `#REF!`, `#DIV/0!`; anything else starting with `#` is an unknown name
fn error_literal(input: &str, chars: &mut Chars) -> Token {
    let start = chars.peek().map_or(0, |&(idx, _)| idx);
    chars.next();
    let end = take_while(input, chars, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '!' | '/' | '?')
    });
    let text = &input[start..end];
    match CellError::parse(text) {
        Some(err) => Token::Error(err),
        None => Token::Identifier(text.to_string()),
    }
}

fn number(input: &str, chars: &mut Chars) -> FormulaResult<Token> {
    let start = chars.peek().map_or(0, |&(idx, _)| idx);
    let mut end = take_while(input, chars, |c| c.is_ascii_digit() || c == '.');

    // Exponent, only when digits follow
    if let Some(&(_, 'e' | 'E')) = chars.peek() {
        let rest = &input[end + 1..];
        let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            chars.next();
            chars.next_if(|&(_, c)| c == '+' || c == '-');
            end = take_while(input, chars, |c| c.is_ascii_digit());
        }
    }

    let text = &input[start..end];
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| FormulaError::Parse(format!("Bad number '{}'", text)))
}

/// Identifier, cell reference, boolean or sheet prefix
fn word(input: &str, chars: &mut Chars) -> Token {
    let start = chars.peek().map_or(0, |&(idx, _)| idx);
    let end = take_while(input, chars, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.')
    });
    let text = &input[start..end];

    if next_is(chars, '!') {
        return Token::SheetRef(text.to_string());
    }

    // Followed by `(` it is a call: TRUE() and LOG10(100) are functions
    let is_call = matches!(chars.peek(), Some(&(_, '(')));
    if !is_call {
        if text.eq_ignore_ascii_case("TRUE") {
            return Token::Boolean(true);
        }
        if text.eq_ignore_ascii_case("FALSE") {
            return Token::Boolean(false);
        }
        if is_cell_reference(text) {
            return Token::CellRef(text.to_string());
        }
    }
    Token::Identifier(text.to_string())
}

/// `[$]letters[$]digits` and nothing else
fn is_cell_reference(text: &str) -> bool {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
    if letters == 0 {
        return false;
    }
    let rest = &rest[letters..];
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl FormulaParser {
    fn current_token(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    /// Infix operator at the current token, if any
    fn binary_operator(&self) -> Option<BinaryOperator> {
        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::LessThan => BinaryOperator::LessThan,
            Token::LessEqual => BinaryOperator::LessEqual,
            Token::GreaterThan => BinaryOperator::GreaterThan,
            Token::GreaterEqual => BinaryOperator::GreaterEqual,
            Token::Ampersand => BinaryOperator::Concat,
            Token::Plus => BinaryOperator::Add,
            Token::Minus => BinaryOperator::Subtract,
            Token::Star => BinaryOperator::Multiply,
            Token::Slash => BinaryOperator::Divide,
            Token::Caret => BinaryOperator::Power,
            _ => return None,
        };
        Some(op)
    }

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_binary(1)
    }

    /// Precedence climbing over operators binding at least `min_precedence`
    fn parse_binary(&mut self, min_precedence: u8) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.binary_operator() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.consume();
            let right = self.parse_binary(precedence + 1)?;
            left = FormulaExpr::binary(op, left, right);
        }

        Ok(left)
    }

    /// Prefix signs bind tighter than every infix operator (`-2^2` is 4)
    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(FormulaExpr::unary(UnaryOperator::Negate, operand));
        }
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        let mut expr = self.parse_range()?;
        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::unary(UnaryOperator::Percent, expr);
        }
        Ok(expr)
    }

    /// `A1:B2`; both ends must be plain cell references
    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.parse_primary()?;
        if *self.current_token() != Token::Colon {
            return Ok(start);
        }
        self.consume();

        match (start, self.parse_primary()?) {
            (FormulaExpr::CellRef(from), FormulaExpr::CellRef(to)) => {
                Ok(FormulaExpr::RangeRef(RangeReference {
                    range: CellRange::new(from.address, to.address),
                }))
            }
            _ => Err(FormulaError::Parse("':' needs a cell reference on each side".into())),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let expr = match self.consume() {
            Token::Number(n) => FormulaExpr::Number(n),
            Token::String(s) => FormulaExpr::String(s),
            Token::Boolean(b) => FormulaExpr::Boolean(b),
            Token::Error(e) => FormulaExpr::Error(e),
            Token::CellRef(text) => parse_cell_reference(&text)?,
            Token::LeftParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                inner
            }
            Token::Identifier(name) if *self.current_token() == Token::LeftParen => {
                self.parse_call(&name)?
            }
            Token::Identifier(name) => FormulaExpr::NameRef(name),
            Token::SheetRef(sheet) => {
                return Err(FormulaError::Parse(format!(
                    "reference into sheet '{}' is not supported",
                    sheet
                )))
            }
            other => return Err(FormulaError::Parse(format!("Unexpected {:?}", other))),
        };
        Ok(expr)
    }

    /// Argument list after a function name; the `_xlfn.` prefix newer Excel
    /// writes for late-added functions is dropped
    fn parse_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if *self.current_token() != Token::RightParen {
            loop {
                let arg = match self.current_token() {
                    Token::Comma | Token::RightParen => FormulaExpr::MissingArg,
                    _ => self.parse_expression()?,
                };
                args.push(arg);
                if *self.current_token() != Token::Comma {
                    break;
                }
                self.consume();
            }
        }
        self.expect(&Token::RightParen)?;

        let upper = name.to_ascii_uppercase();
        let name = upper.strip_prefix("_XLFN.").unwrap_or(&upper).to_string();
        Ok(FormulaExpr::Function { name, args })
    }
}

fn parse_cell_reference(ref_str: &str) -> FormulaResult<FormulaExpr> {
    let col_absolute = ref_str.starts_with('$');
    let row_absolute = ref_str[1..].contains('$');
    let address = CellAddress::parse(ref_str).map_err(|e| {
        FormulaError::InvalidReference(format!("'{}': {}", ref_str, e))
    })?;

    Ok(FormulaExpr::CellRef(CellReference {
        address,
        col_absolute,
        row_absolute,
    }))
}
