//! XPath-subset parser.
//!
//! Grammar:
//!
//! ```text
//! path      := ('/' | '//') step (('/' | '//') step)*
//! step      := ('*' | 'text()' | NAME) ('[' predicate ']')*
//! predicate := INTEGER | condition ('and' condition)*
//! condition := '@' NAME ('=' LITERAL)?
//!            | 'text()' ('=' LITERAL)?
//!            | NAME ('=' LITERAL)?
//! ```

use super::types::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("path must start with '/'")]
    ExpectedRoot,
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of path")]
    UnexpectedEnd,
    #[error("unclosed string literal")]
    UnclosedString,
    #[error("position predicates start at 1")]
    InvalidPosition,
    #[error("empty path")]
    Empty,
}

/// XPath-subset parser.
pub struct XPathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> XPathParser<'a> {
    /// Parse an absolute location path.
    pub fn parse(input: &'a str) -> Result<XPath, PathError> {
        let mut parser = Self { input, pos: 0 };
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<XPath, PathError> {
        self.skip_whitespace();
        if self.is_at_end() {
            return Err(PathError::Empty);
        }
        if self.peek() != Some('/') {
            return Err(PathError::ExpectedRoot);
        }

        let mut steps = Vec::new();
        while !self.is_at_end() {
            self.expect('/')?;
            let axis = if self.peek() == Some('/') {
                self.advance();
                Axis::Descendant
            } else {
                Axis::Child
            };
            steps.push(self.parse_step(axis)?);
            self.skip_whitespace();
        }
        Ok(XPath::new(steps))
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, PathError> {
        let test = if self.peek() == Some('*') {
            self.advance();
            NodeTest::AnyElement
        } else if self.eat_str("text()") {
            NodeTest::Text
        } else {
            NodeTest::Name(self.parse_name()?)
        };

        let mut step = Step::new(axis, test);
        while self.peek() == Some('[') {
            self.advance();
            self.skip_whitespace();
            step.predicates.push(self.parse_predicate()?);
            self.skip_whitespace();
            self.expect(']')?;
        }
        Ok(step)
    }

    fn parse_predicate(&mut self) -> Result<Predicate, PathError> {
        if matches!(self.peek(), Some('0'..='9')) {
            let start = self.pos;
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
            let n: usize = self.input[start..self.pos]
                .parse()
                .map_err(|_| PathError::InvalidPosition)?;
            if n == 0 {
                return Err(PathError::InvalidPosition);
            }
            return Ok(Predicate::Position(n));
        }

        let mut conditions = vec![self.parse_condition()?];
        loop {
            self.skip_whitespace();
            if self.eat_str("and") {
                self.skip_whitespace();
                conditions.push(self.parse_condition()?);
            } else {
                break;
            }
        }
        Ok(Predicate::Filter(conditions))
    }

    fn parse_condition(&mut self) -> Result<Condition, PathError> {
        if self.peek() == Some('@') {
            self.advance();
            let name = self.parse_name()?;
            let value = self.parse_optional_value()?;
            return Ok(Condition::Attribute { name, value });
        }
        if self.eat_str("text()") {
            let value = self.parse_optional_value()?;
            return Ok(Condition::Text { value });
        }
        let name = self.parse_name()?;
        let value = self.parse_optional_value()?;
        Ok(Condition::Child { name, value })
    }

    fn parse_optional_value(&mut self) -> Result<Option<String>, PathError> {
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok(None);
        }
        self.advance();
        self.skip_whitespace();
        self.parse_string().map(Some)
    }

    fn parse_string(&mut self) -> Result<String, PathError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(PathError::UnexpectedChar(c, self.pos)),
            None => return Err(PathError::UnexpectedEnd),
        };
        self.advance();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let value = self.input[start..self.pos].to_string();
                self.advance();
                return Ok(value);
            }
            self.advance();
        }
        Err(PathError::UnclosedString)
    }

    fn parse_name(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                self.advance();
            } else {
                break;
            }
        }
        if start == self.pos {
            return match self.peek() {
                Some(c) => Err(PathError::UnexpectedChar(c, self.pos)),
                None => Err(PathError::UnexpectedEnd),
            };
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Consumes `s` if the input continues with it.
    ///
    /// Keywords (`and`) must not run into a following name character.
    fn eat_str(&mut self, s: &str) -> bool {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(s) {
            return false;
        }
        if s.ends_with(|c: char| c.is_alphanumeric()) {
            let next = rest[s.len()..].chars().next();
            if next.is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-')) {
                return false;
            }
        }
        self.pos += s.len();
        true
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(PathError::UnexpectedChar(c, self.pos)),
            None => Err(PathError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_child_steps() {
        let path = XPathParser::parse("/Defs/ThingDef").unwrap();
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[0].axis, Axis::Child);
        assert_eq!(path.steps[1].test, NodeTest::Name("ThingDef".into()));
    }

    #[test]
    fn parse_descendant_and_wildcard() {
        let path = XPathParser::parse("//ThingDef/*").unwrap();
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(path.steps[1].test, NodeTest::AnyElement);
    }

    #[test]
    fn parse_text_step() {
        let path = XPathParser::parse("/Defs/ThingDef/label/text()").unwrap();
        assert_eq!(path.steps[3].test, NodeTest::Text);
    }

    #[test]
    fn parse_predicates() {
        let path = XPathParser::parse(r#"/Defs/ThingDef[defName="Wall" and @Abstract='True'][2]"#).unwrap();
        let step = &path.steps[1];
        assert_eq!(
            step.predicates[0],
            Predicate::Filter(vec![
                Condition::Child { name: "defName".into(), value: Some("Wall".into()) },
                Condition::Attribute { name: "Abstract".into(), value: Some("True".into()) },
            ])
        );
        assert_eq!(step.predicates[1], Predicate::Position(2));
    }

    #[test]
    fn parse_existence_predicates() {
        let path = XPathParser::parse("/Defs/ThingDef[@Name][comps][text()]").unwrap();
        assert_eq!(
            path.steps[1].predicates,
            vec![
                Predicate::Filter(vec![Condition::Attribute { name: "Name".into(), value: None }]),
                Predicate::Filter(vec![Condition::Child { name: "comps".into(), value: None }]),
                Predicate::Filter(vec![Condition::Text { value: None }]),
            ]
        );
    }

    #[test]
    fn name_starting_with_and_is_not_a_keyword() {
        let path = XPathParser::parse("/Defs/ThingDef[a and android]").unwrap();
        assert_eq!(
            path.steps[1].predicates[0],
            Predicate::Filter(vec![
                Condition::Child { name: "a".into(), value: None },
                Condition::Child { name: "android".into(), value: None },
            ])
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(XPathParser::parse(""), Err(PathError::Empty));
        assert_eq!(XPathParser::parse("Defs"), Err(PathError::ExpectedRoot));
        assert_eq!(XPathParser::parse("/Defs/"), Err(PathError::UnexpectedEnd));
        assert_eq!(XPathParser::parse("/Defs[0]"), Err(PathError::InvalidPosition));
        assert_eq!(XPathParser::parse("/Defs[@a='x"), Err(PathError::UnclosedString));
        assert!(XPathParser::parse("/Defs[@a").is_err());
        assert!(XPathParser::parse("/Defs/ThingDef?").is_err());
    }
}
