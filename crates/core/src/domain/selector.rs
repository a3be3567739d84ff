// Label Selectors
//
// Grammar accepted by `Selector::parse`:
//
//   selector    ::= requirement ("," requirement)*
//   requirement ::= ["!"] KEY [ ("in" | "notin") "(" VALUES ")"
//                             | ("=" | "==" | "!=" | ">" | "<") VALUE ]
//
// Whitespace between tokens is ignored. The empty string selects everything.

use super::error::{DomainError, Result};
use super::labels::{validate_label_key, validate_label_value, Labels};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Selection operator of a single requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    DoesNotExist,
    Equals,
    DoubleEquals,
    In,
    NotEquals,
    NotIn,
    Exists,
    GreaterThan,
    LessThan,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::DoesNotExist => "!",
            Operator::Equals => "=",
            Operator::DoubleEquals => "==",
            Operator::In => "in",
            Operator::NotEquals => "!=",
            Operator::NotIn => "notin",
            Operator::Exists => "exists",
            Operator::GreaterThan => "gt",
            Operator::LessThan => "lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `key <op> values` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    /// Create a validated requirement
    ///
    /// Arity rules:
    /// - `in`, `notin`: at least one value
    /// - `=`, `==`, `!=`: exactly one value
    /// - `exists`, `!`: no values
    /// - `gt`, `lt`: exactly one value that parses as an integer
    pub fn new<I, V>(key: impl Into<String>, operator: Operator, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();

        validate_label_key(&key)?;

        let invalid = |reason: &str| DomainError::InvalidRequirement {
            key: key.clone(),
            reason: reason.to_string(),
        };

        match operator {
            Operator::In | Operator::NotIn => {
                if values.is_empty() {
                    return Err(invalid(
                        "for 'in', 'notin' operators, values set can't be empty",
                    ));
                }
            }
            Operator::Equals | Operator::DoubleEquals | Operator::NotEquals => {
                if values.len() != 1 {
                    return Err(invalid(
                        "exact-match compatibility requires one single value",
                    ));
                }
            }
            Operator::Exists | Operator::DoesNotExist => {
                if !values.is_empty() {
                    return Err(invalid(
                        "values set must be empty for exists and does not exist",
                    ));
                }
            }
            Operator::GreaterThan | Operator::LessThan => {
                if values.len() != 1 {
                    return Err(invalid(
                        "for 'gt', 'lt' operators, exactly one value is required",
                    ));
                }
                if values.iter().any(|v| v.parse::<i64>().is_err()) {
                    return Err(invalid(
                        "for 'gt', 'lt' operators, the value must be an integer",
                    ));
                }
            }
        }

        for value in &values {
            validate_label_value(value)?;
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Check this requirement against a label set
    ///
    /// Negative operators (`!=`, `notin`) match when the key is absent.
    pub fn matches(&self, labels: &Labels) -> bool {
        match self.operator {
            Operator::In | Operator::Equals | Operator::DoubleEquals => labels
                .get(&self.key)
                .is_some_and(|value| self.values.contains(value)),
            Operator::NotIn | Operator::NotEquals => labels
                .get(&self.key)
                .map_or(true, |value| !self.values.contains(value)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
            Operator::GreaterThan | Operator::LessThan => {
                let Some(label) = labels.get(&self.key).and_then(|v| v.parse::<i64>().ok())
                else {
                    return false;
                };
                let Some(bound) = self.values.iter().next().and_then(|v| v.parse::<i64>().ok())
                else {
                    return false;
                };
                if self.operator == Operator::GreaterThan {
                    label > bound
                } else {
                    label < bound
                }
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::DoesNotExist => write!(f, "!{}", self.key),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::Equals => write!(f, "{}={}", self.key, joined()),
            Operator::DoubleEquals => write!(f, "{}=={}", self.key, joined()),
            Operator::NotEquals => write!(f, "{}!={}", self.key, joined()),
            Operator::GreaterThan => write!(f, "{}>{}", self.key, joined()),
            Operator::LessThan => write!(f, "{}<{}", self.key, joined()),
            Operator::In => write!(f, "{} in ({})", self.key, joined()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, joined()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Inner {
    Requirements(Vec<Requirement>),
    Nothing,
}

/// Predicate over a resource's labels
///
/// An empty selector matches everything; `Selector::nothing()` matches no
/// object at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    inner: Inner,
}

impl Default for Selector {
    fn default() -> Self {
        Self::everything()
    }
}

impl Selector {
    /// Selector that matches every label set
    pub fn everything() -> Self {
        Self {
            inner: Inner::Requirements(Vec::new()),
        }
    }

    /// Selector that matches no label set
    pub fn nothing() -> Self {
        Self {
            inner: Inner::Nothing,
        }
    }

    /// Equality selector built from a label set (`k1=v1,k2=v2`)
    pub fn from_set(labels: &Labels) -> Result<Self> {
        labels.iter().try_fold(Self::everything(), |selector, (k, v)| {
            Ok(selector.add(Requirement::new(k.as_str(), Operator::Equals, [v.as_str()])?))
        })
    }

    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Add a requirement, keeping requirements sorted by key
    pub fn add(mut self, requirement: Requirement) -> Self {
        if let Inner::Requirements(ref mut requirements) = self.inner {
            let pos = requirements.partition_point(|r| r.key <= requirement.key);
            requirements.insert(pos, requirement);
        }
        self
    }

    /// True when the selector places no restriction at all
    pub fn is_empty(&self) -> bool {
        matches!(&self.inner, Inner::Requirements(r) if r.is_empty())
    }

    pub fn requirements(&self) -> &[Requirement] {
        match &self.inner {
            Inner::Requirements(requirements) => requirements,
            Inner::Nothing => &[],
        }
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        match &self.inner {
            Inner::Requirements(requirements) => requirements.iter().all(|r| r.matches(labels)),
            Inner::Nothing => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.requirements().iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(","))
    }
}

impl FromStr for Selector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    Comma,
    Equals,
    DoubleEquals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    OpenParen,
    CloseParen,
    DoesNotExist,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "'{s}'"),
            Token::Comma => f.write_str("','"),
            Token::Equals => f.write_str("'='"),
            Token::DoubleEquals => f.write_str("'=='"),
            Token::NotEquals => f.write_str("'!='"),
            Token::In => f.write_str("'in'"),
            Token::NotIn => f.write_str("'notin'"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::LessThan => f.write_str("'<'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::DoesNotExist => f.write_str("'!'"),
            Token::End => f.write_str("end of string"),
        }
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '!' | '=' | '(' | ')' | ',' | '<' | '>')
}

fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if is_special(c) {
            chars.next();
            let following = chars.peek().copied();
            let token = match (c, following) {
                ('!', Some('=')) => {
                    chars.next();
                    Token::NotEquals
                }
                ('=', Some('=')) => {
                    chars.next();
                    Token::DoubleEquals
                }
                ('!', _) => Token::DoesNotExist,
                ('=', _) => Token::Equals,
                ('(', _) => Token::OpenParen,
                (')', _) => Token::CloseParen,
                (',', _) => Token::Comma,
                ('<', _) => Token::LessThan,
                _ => Token::GreaterThan,
            };
            tokens.push(token);
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || is_special(c) {
                break;
            }
            word.push(c);
            chars.next();
        }
        tokens.push(match word.as_str() {
            "in" => Token::In,
            "notin" => Token::NotIn,
            _ => Token::Identifier(word),
        });
    }

    tokens.push(Token::End);
    tokens
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: lex(input),
            pos: 0,
        }
    }

    // `lex` always terminates the stream with `Token::End` and `next` never
    // moves past it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, reason: String) -> DomainError {
        DomainError::InvalidSelector {
            input: self.input.to_string(),
            reason,
        }
    }

    fn parse(mut self) -> Result<Selector> {
        let mut selector = Selector::everything();

        loop {
            match self.peek() {
                Token::Identifier(_) | Token::DoesNotExist => {
                    let requirement = self.parse_requirement()?;
                    selector = selector.add(requirement);

                    match self.next() {
                        Token::End => return Ok(selector),
                        Token::Comma => {
                            if !matches!(self.peek(), Token::Identifier(_) | Token::DoesNotExist) {
                                return Err(self.error(format!(
                                    "found {}, expected: identifier after ','",
                                    self.peek()
                                )));
                            }
                        }
                        other => {
                            return Err(self.error(format!(
                                "found {other}, expected: ',' or 'end of string'"
                            )))
                        }
                    }
                }
                Token::End => return Ok(selector),
                other => {
                    return Err(self.error(format!(
                        "found {other}, expected: !, identifier, or 'end of string'"
                    )))
                }
            }
        }
    }

    fn parse_requirement(&mut self) -> Result<Requirement> {
        let negated = if self.peek() == &Token::DoesNotExist {
            self.next();
            true
        } else {
            false
        };

        let key = match self.next() {
            Token::Identifier(key) => key,
            other => return Err(self.error(format!("found {other}, expected: identifier"))),
        };

        if negated {
            return self.requirement(key, Operator::DoesNotExist, BTreeSet::new());
        }
        if matches!(self.peek(), Token::End | Token::Comma) {
            return self.requirement(key, Operator::Exists, BTreeSet::new());
        }

        let operator = match self.next() {
            Token::In => Operator::In,
            Token::NotIn => Operator::NotIn,
            Token::Equals => Operator::Equals,
            Token::DoubleEquals => Operator::DoubleEquals,
            Token::NotEquals => Operator::NotEquals,
            Token::GreaterThan => Operator::GreaterThan,
            Token::LessThan => Operator::LessThan,
            other => {
                return Err(self.error(format!(
                    "found {other}, expected: in, notin, =, ==, !=, gt, lt"
                )))
            }
        };

        let values = match operator {
            Operator::In | Operator::NotIn => self.parse_value_set()?,
            _ => BTreeSet::from([self.parse_exact_value()?]),
        };

        self.requirement(key, operator, values)
    }

    /// Build a requirement, reporting failures against the whole selector text
    fn requirement(
        &self,
        key: String,
        operator: Operator,
        values: BTreeSet<String>,
    ) -> Result<Requirement> {
        Requirement::new(key, operator, values).map_err(|e| self.error(e.to_string()))
    }

    fn parse_value_set(&mut self) -> Result<BTreeSet<String>> {
        match self.next() {
            Token::OpenParen => {}
            other => return Err(self.error(format!("found {other}, expected: '('"))),
        }

        let mut values = BTreeSet::new();
        let mut expect_value = true;
        let mut saw_comma = false;

        loop {
            match self.next() {
                Token::Identifier(value) if expect_value => {
                    values.insert(value);
                    expect_value = false;
                }
                Token::Comma => {
                    if expect_value {
                        values.insert(String::new());
                    }
                    expect_value = true;
                    saw_comma = true;
                }
                Token::CloseParen => {
                    if expect_value && saw_comma {
                        values.insert(String::new());
                    }
                    return Ok(values);
                }
                other => {
                    return Err(self.error(format!("found {other}, expected: ',' or ')'")))
                }
            }
        }
    }

    fn parse_exact_value(&mut self) -> Result<String> {
        match self.peek().clone() {
            Token::End | Token::Comma => Ok(String::new()),
            Token::Identifier(value) => {
                self.next();
                Ok(value)
            }
            other => Err(self.error(format!("found {other}, expected: identifier"))),
        }
    }
}
