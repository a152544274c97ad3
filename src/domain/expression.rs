//! Expression parser for indicator and condition specs in config files.
//!
//! ```text
//! indicators := indicator ("," indicator)*
//! indicator  := NAME "(" number ("," number)* ")"
//! conditions := condition ("," condition)*
//! condition  := "ALL" "(" name ("," name)* ")" | column OP (number | column)
//! OP         := "<=" | ">=" | "==" | "<" | ">"
//! ```
//!
//! `name` is any text up to the next top-level `,` or `)`, so earlier
//! condition names such as `SMA_2>2` or `CheckAllTrue=['a', 'b']` can be
//! referenced verbatim.

use crate::domain::condition::{Comparand, Condition, Operator};
use crate::domain::error::ParseError;
use crate::domain::indicator::{DEFAULT_RSI_DRIFT, DEFAULT_RSI_SCALAR, TechnicalIndicator};

const COLUMN_TERMINATORS: &[char] = &['<', '>', '=', ',', '(', ')'];

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn found(&self) -> String {
        self.peek()
            .map(|c| format!("'{}'", c))
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error(format!("expected '{}', found {}", expected, self.found()))),
        }
    }

    /// Consume `ch` if it is the next non-whitespace character.
    fn consume_char(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(self.error(format!("unexpected input: '{}'", self.remaining())));
        }
        Ok(())
    }

    fn parse_word(&mut self) -> Result<&'a str, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(format!("expected a name, found {}", self.found())));
        }
        Ok(&self.input[start..self.pos])
    }

    /// A column reference: everything up to whitespace or an operator character.
    fn parse_column(&mut self) -> Result<&'a str, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || COLUMN_TERMINATORS.contains(&ch) {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            return Err(self.error(format!("expected a column name, found {}", self.found())));
        }
        Ok(&self.input[start..self.pos])
    }

    /// Free-form name up to the next `,` or `)` outside brackets.
    fn parse_name(&mut self) -> Result<&'a str, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '(' | '[' => depth += 1,
                ')' | ']' if depth > 0 => depth -= 1,
                ',' | ')' if depth == 0 => break,
                _ => {}
            }
            self.advance();
        }
        let name = self.input[start..self.pos].trim_end();
        if name.is_empty() {
            self.pos = start;
            return Err(self.error(format!("expected a name, found {}", self.found())));
        }
        Ok(name)
    }

    fn parse_number(&mut self) -> Result<Comparand, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.input[start..self.pos];
        let invalid = || ParseError {
            message: format!("invalid number: {}", text),
            position: start,
        };
        if digits == 0 {
            return Err(invalid());
        }
        if has_dot {
            text.parse::<f64>().map(Comparand::Float).map_err(|_| invalid())
        } else {
            text.parse::<i64>().map(Comparand::Int).map_err(|_| invalid())
        }
    }

    fn parse_operator(&mut self) -> Result<Operator, ParseError> {
        self.skip_whitespace();
        for op in Operator::ALL {
            if self.consume_exact(op.symbol()) {
                return Ok(op);
            }
        }
        Err(self.error(format!(
            "expected one of <=, >=, ==, <, >, found {}",
            self.found()
        )))
    }

    fn starts_number(&self) -> bool {
        let mut chars = self.remaining().chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() || c == '.' => true,
            Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
            _ => false,
        }
    }

    fn parse_indicator(&mut self) -> Result<TechnicalIndicator, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let name = self.parse_word()?.to_uppercase();
        self.expect_char('(')?;
        let mut args = vec![self.parse_number()?];
        while self.consume_char(',') {
            args.push(self.parse_number()?);
        }
        self.expect_char(')')?;

        build_indicator(&name, &args).map_err(|message| ParseError {
            message,
            position: start,
        })
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        if self.consume_exact("ALL") {
            if self.consume_char('(') {
                let mut names = vec![self.parse_name()?.to_string()];
                while self.consume_char(',') {
                    names.push(self.parse_name()?.to_string());
                }
                self.expect_char(')')?;
                return Ok(Condition::check_all_true(names));
            }
            self.pos = start;
        }

        let left = self.parse_column()?.to_string();
        let operator = self.parse_operator()?;
        self.skip_whitespace();
        let right = if self.starts_number() {
            self.parse_number()?
        } else {
            Comparand::Column(self.parse_column()?.to_string())
        };
        Ok(Condition::check_relation(left, operator, right))
    }

    fn parse_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = vec![item(self)?];
        while self.consume_char(',') {
            items.push(item(self)?);
        }
        self.expect_end()?;
        Ok(items)
    }
}

fn build_indicator(name: &str, args: &[Comparand]) -> Result<TechnicalIndicator, String> {
    let int = |i: usize, what: &str| -> Result<usize, String> {
        match args.get(i) {
            Some(Comparand::Int(v)) if *v >= 0 => Ok(*v as usize),
            Some(other) => Err(format!("{} of {} must be a non-negative integer, got {}", what, name, other)),
            None => Err(format!("{} of {} is missing", what, name)),
        }
    };
    let float = |i: usize| -> Option<f64> {
        match args.get(i) {
            Some(Comparand::Int(v)) => Some(*v as f64),
            Some(Comparand::Float(v)) => Some(*v),
            _ => None,
        }
    };

    let result = match (name, args.len()) {
        ("SMA", 1) => TechnicalIndicator::sma(int(0, "length")?),
        ("SMA", 2) => TechnicalIndicator::sma_with_offset(int(0, "length")?, int(1, "offset")?),
        ("EMA", 1) => TechnicalIndicator::ema(int(0, "length")?),
        ("RSI", 1..=4) => TechnicalIndicator::rsi_with(
            int(0, "length")?,
            float(1).unwrap_or(DEFAULT_RSI_SCALAR),
            if args.len() > 2 { int(2, "drift")? } else { DEFAULT_RSI_DRIFT },
            if args.len() > 3 { int(3, "offset")? } else { 0 },
        ),
        ("SMA" | "EMA" | "RSI", n) => {
            return Err(format!("{} does not take {} arguments", name, n));
        }
        _ => return Err(format!("unknown indicator: {}", name)),
    };
    result.map_err(|e| e.to_string())
}

/// Parse a single indicator spec such as `SMA(5)` or `RSI(14, 100, 1, 0)`.
pub fn parse_indicator(input: &str) -> Result<TechnicalIndicator, ParseError> {
    let mut parser = Parser::new(input);
    let indicator = parser.parse_indicator()?;
    parser.expect_end()?;
    Ok(indicator)
}

pub fn parse_indicators(input: &str) -> Result<Vec<TechnicalIndicator>, ParseError> {
    Parser::new(input).parse_list(Parser::parse_indicator)
}

/// Parse a single condition spec such as `SMA_2>2` or `ALL(a, b)`.
pub fn parse_condition(input: &str) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(input);
    let condition = parser.parse_condition()?;
    parser.expect_end()?;
    Ok(condition)
}

pub fn parse_conditions(input: &str) -> Result<Vec<Condition>, ParseError> {
    Parser::new(input).parse_list(Parser::parse_condition)
}

/// Comma separated column names; commas inside brackets do not split.
pub fn parse_names(input: &str) -> Result<Vec<String>, ParseError> {
    Parser::new(input).parse_list(|p| p.parse_name().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_indicator_list() {
        let indicators = parse_indicators("SMA(2), RSI(14)").unwrap();
        assert_eq!(
            indicators,
            vec![
                TechnicalIndicator::sma(2).unwrap(),
                TechnicalIndicator::rsi(14).unwrap()
            ]
        );
    }

    #[test]
    fn parse_indicator_parameters() {
        assert_eq!(
            parse_indicator("rsi(14, 50, 2, 1)").unwrap(),
            TechnicalIndicator::rsi_with(14, 50.0, 2, 1).unwrap()
        );
        assert_eq!(
            parse_indicator("SMA(5, 3)").unwrap(),
            TechnicalIndicator::sma_with_offset(5, 3).unwrap()
        );
        assert_eq!(
            parse_indicator(" EMA( 9 ) ").unwrap(),
            TechnicalIndicator::ema(9).unwrap()
        );
    }

    #[test]
    fn parse_indicator_errors() {
        let err = parse_indicator("SMA(0)").unwrap_err();
        assert!(err.message.contains("length"), "{}", err.message);

        let err = parse_indicator("WMA(3)").unwrap_err();
        assert!(err.message.contains("unknown indicator"));

        assert!(parse_indicator("SMA(2.5)").is_err());
        assert!(parse_indicator("EMA(2, 1)").is_err());
        assert!(parse_indicator("SMA 2").is_err());
        assert!(parse_indicators("SMA(2),").is_err());
    }

    #[test]
    fn parse_numeric_relation() {
        let condition = parse_condition("SMA_2>2").unwrap();
        assert_eq!(condition.name(), "SMA_2>2");
        assert_eq!(
            condition,
            Condition::check_relation("SMA_2", Operator::Gt, 2)
        );

        let condition = parse_condition("CLOSE <= 2.5").unwrap();
        assert_eq!(condition.name(), "CLOSE<=2.5");

        let condition = parse_condition("a>-1").unwrap();
        assert_eq!(condition, Condition::check_relation("a", Operator::Gt, -1));
    }

    #[test]
    fn parse_column_relation() {
        let condition = parse_condition("CLOSE == SMA_2").unwrap();
        assert_eq!(condition.name(), "CLOSE==SMA_2");
        assert_eq!(condition.inputs(), vec!["CLOSE", "SMA_2"]);
    }

    #[test]
    fn parse_all_true() {
        let condition = parse_condition("ALL(SMA_2>2, CLOSE<SMA_2)").unwrap();
        assert_eq!(condition.name(), "CheckAllTrue=['SMA_2>2', 'CLOSE<SMA_2']");
    }

    #[test]
    fn column_named_like_keyword() {
        let condition = parse_condition("ALLOCATED>1").unwrap();
        assert_eq!(condition.inputs(), vec!["ALLOCATED"]);
    }

    #[test]
    fn parse_condition_list() {
        let conditions = parse_conditions("SMA_2>2, CLOSE<SMA_2, ALL(SMA_2>2, CLOSE<SMA_2)").unwrap();
        assert_eq!(conditions.len(), 3);
        assert!(matches!(conditions[2], Condition::AllTrue { .. }));
    }

    #[test]
    fn parse_condition_errors() {
        let err = parse_condition("SMA_2 ! 2").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(parse_condition("SMA_2>").is_err());
        assert!(parse_condition("").is_err());
        assert!(parse_condition("ALL()").is_err());
        assert!(parse_condition("a<1 b").is_err());
    }

    #[test]
    fn parse_name_list_keeps_bracketed_commas() {
        let names = parse_names("CheckAllTrue=['a', 'b'], SMA_2>2").unwrap();
        assert_eq!(names, vec!["CheckAllTrue=['a', 'b']", "SMA_2>2"]);
    }
}
