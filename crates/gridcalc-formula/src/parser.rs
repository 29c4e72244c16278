//! Formula parser
//!
//! A recursive descent parser for arithmetic formulas with proper operator
//! precedence. Input is the formula body without its leading `=`.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use gridcalc_core::Position;

/// Parse a formula body into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse_expression;
///
/// let ast = parse_expression("1+2").unwrap();
/// let ast = parse_expression("(A1 + B2) * 3").unwrap();
/// assert!(parse_expression("1+").is_err());
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let mut parser = FormulaParser::new(input)?;
    let (expr, _) = parser.parse_additive()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Deepest nesting of parentheses and unary operators accepted
pub const MAX_NESTING: usize = 256;

/// Tallest expression tree accepted; bounds the recursion of evaluation
/// and rendering
pub const MAX_HEIGHT: usize = 1024;

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    CellRef(Position),

    Plus,
    Minus,
    Star,
    Slash,

    LeftParen,
    RightParen,

    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            _ if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                return self.scan_number();
            }
            _ if c.is_ascii_alphabetic() => return self.scan_reference(),
            _ => return Err(FormulaError::UnexpectedChar(c)),
        };

        self.advance();
        Ok(token)
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str
            .parse()
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))?;
        if !num.is_finite() {
            return Err(FormulaError::Parse(format!("Number out of range '{}'", num_str)));
        }
        Ok(Token::Number(num))
    }

    fn scan_reference(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_alphanumeric()) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        Position::parse(text)
            .map(Token::CellRef)
            .map_err(|_| FormulaError::Parse(format!("Invalid cell reference '{}'", text)))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: +, -
    // 4. Primary: numbers, references, parentheses
    //
    // Each level returns the expression with the height of its tree.

    fn parse_additive(&mut self) -> FormulaResult<(Expr, usize)> {
        let (mut left, mut height) = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let (right, right_height) = self.parse_multiplicative()?;
            height = check_height(height.max(right_height) + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok((left, height))
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<(Expr, usize)> {
        let (mut left, mut height) = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            let (right, right_height) = self.parse_unary()?;
            height = check_height(height.max(right_height) + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok((left, height))
    }

    fn parse_unary(&mut self) -> FormulaResult<(Expr, usize)> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.consume()?;
        self.enter()?;
        let (operand, height) = self.parse_unary()?;
        self.leave();
        Ok((
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            check_height(height + 1)?,
        ))
    }

    fn parse_primary(&mut self) -> FormulaResult<(Expr, usize)> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok((Expr::Number(n), 1))
            }

            Token::CellRef(pos) => {
                self.consume()?;
                Ok((Expr::CellRef(pos), 1))
            }

            Token::LeftParen => {
                self.consume()?;
                self.enter()?;
                let parsed = self.parse_additive()?;
                self.leave();
                self.expect(&Token::RightParen)?;
                Ok(parsed)
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    /// Step into a parenthesis or unary operator
    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

fn check_height(height: usize) -> FormulaResult<usize> {
    if height > MAX_HEIGHT {
        Err(too_deep())
    } else {
        Ok(height)
    }
}

fn too_deep() -> FormulaError {
    FormulaError::Parse("formula nested too deeply".to_string())
}
