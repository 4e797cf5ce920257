//! Boolean expression parser for composite rules
//!
//! Grammar (precedence low to high):
//!   or  := and ("OR" and)*
//!   and := not ("AND" not)*
//!   not := "NOT" not | primary
//!   primary := IDENT | "(" or ")"

use super::evaluator::RuleEvalError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, RuleEvalError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            chars.next();
            continue;
        }
        if c == ')' {
            tokens.push(Token::RParen);
            chars.next();
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(match word.as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "NOT" => Token::Not,
                _ => Token::Ident(word),
            });
            continue;
        }
        return Err(RuleEvalError::ExpressionError(format!(
            "unknown character '{c}' in expression"
        )));
    }

    Ok(tokens)
}

/// Parses and evaluates a boolean expression, resolving each identifier via `resolve`
pub fn evaluate_expression(
    expr: &str,
    resolve: &mut dyn FnMut(&str) -> Result<(bool, String), RuleEvalError>,
) -> Result<(bool, String), RuleEvalError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        resolve,
    };
    let result = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(RuleEvalError::ExpressionError(format!(
            "stray trailing tokens after position {}",
            parser.pos
        )));
    }
    Ok(result)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    resolve: &'a mut dyn FnMut(&str) -> Result<(bool, String), RuleEvalError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_or(&mut self) -> Result<(bool, String), RuleEvalError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = (
                left.0 || right.0,
                format!("({}) OR ({})", left.1, right.1),
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<(bool, String), RuleEvalError> {
        let mut left = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_not()?;
            left = (
                left.0 && right.0,
                format!("({}) AND ({})", left.1, right.1),
            );
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<(bool, String), RuleEvalError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok((!inner.0, format!("NOT ({})", inner.1)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<(bool, String), RuleEvalError> {
        match self.advance() {
            Some(Token::Ident(name)) => (self.resolve)(&name),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(RuleEvalError::ExpressionError(
                        "unmatched parenthesis".to_string(),
                    )),
                }
            }
            Some(other) => Err(RuleEvalError::ExpressionError(format!(
                "unexpected token {other:?}"
            ))),
            None => Err(RuleEvalError::ExpressionError(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_true_false(name: &str) -> Result<(bool, String), RuleEvalError> {
        match name {
            "t1" => Ok((true, "amount 1500 > 1000".to_string())),
            "p1" => Ok((false, "1 tx in last 5 min".to_string())),
            "p2" => Ok((false, "0 tx in last 5 min".to_string())),
            other => Err(RuleEvalError::ExpressionError(format!(
                "unknown sub-rule '{other}'"
            ))),
        }
    }

    #[test]
    fn composite_expression_matches_expected_reason() {
        let mut resolve = resolve_true_false;
        let (fired, reason) =
            evaluate_expression("t1 AND (p1 OR NOT p2)", &mut resolve).unwrap();
        assert!(fired);
        assert_eq!(
            reason,
            "(amount 1500 > 1000) AND ((1 tx in last 5 min) OR (NOT (0 tx in last 5 min)))"
        );
    }

    #[test]
    fn not_not_is_identity() {
        let mut resolve = resolve_true_false;
        let (fired, _) = evaluate_expression("NOT NOT t1", &mut resolve).unwrap();
        assert!(fired);
    }

    #[test]
    fn and_is_commutative_in_result() {
        let mut resolve = resolve_true_false;
        let (a, _) = evaluate_expression("t1 AND p1", &mut resolve).unwrap();
        let (b, _) = evaluate_expression("p1 AND t1", &mut resolve).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let mut resolve = resolve_true_false;
        assert!(evaluate_expression("ghost", &mut resolve).is_err());
    }

    #[test]
    fn unmatched_parenthesis_is_an_error() {
        let mut resolve = resolve_true_false;
        assert!(evaluate_expression("(t1 AND p1", &mut resolve).is_err());
    }

    #[test]
    fn stray_trailing_tokens_is_an_error() {
        let mut resolve = resolve_true_false;
        assert!(evaluate_expression("t1 )", &mut resolve).is_err());
    }

    #[test]
    fn unknown_character_is_an_error() {
        let mut resolve = resolve_true_false;
        assert!(evaluate_expression("t1 & p1", &mut resolve).is_err());
    }
}
