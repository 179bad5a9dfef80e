//! Type signature parsing.
//!
//! Grammar:
//!   sig := name | 'array' '(' sig ')' | 'row' '(' sig (',' sig)* ')'
//!
//! Names are case- and whitespace-insensitive. `Display` prints the canonical
//! form (`row(bigint, array(varchar))`), which is also the type's identity.
//! Signatures arrive from the wire, so nesting is capped at `MAX_NESTING`.

use std::fmt;

use crate::error::{Error, Result};

/// Deepest parameter nesting a signature may have.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Base(String),
    Array(Box<TypeSignature>),
    Row(Vec<TypeSignature>),
}

impl TypeSignature {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
            depth: 0,
        };
        let sig = parser.signature()?;
        parser.skip_ws();
        if let Some((pos, c)) = parser.chars.next() {
            return Err(parser.error(format!("unexpected '{c}' at offset {pos}")));
        }
        Ok(sig)
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }

    pub fn parameters(&self) -> &[TypeSignature] {
        match self {
            TypeSignature::Base(_) => &[],
            TypeSignature::Array(elem) => std::slice::from_ref(elem.as_ref()),
            TypeSignature::Row(fields) => fields,
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Base(name) => f.write_str(name),
            TypeSignature::Array(elem) => write!(f, "array({elem})"),
            TypeSignature::Row(fields) => {
                f.write_str("row(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn signature(&mut self) -> Result<TypeSignature> {
        self.skip_ws();
        let name = self.name()?;
        self.skip_ws();
        let has_params = matches!(self.chars.peek(), Some((_, '(')));

        match (name.as_str(), has_params) {
            ("array", true) => {
                self.expect('(')?;
                let elem = self.parameter()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(TypeSignature::Array(Box::new(elem)))
            }
            ("row", true) => {
                self.expect('(')?;
                let mut fields = vec![self.parameter()?];
                loop {
                    self.skip_ws();
                    match self.chars.next() {
                        Some((_, ',')) => fields.push(self.parameter()?),
                        Some((_, ')')) => break,
                        Some((pos, c)) => {
                            return Err(self.error(format!("expected ',' or ')' at offset {pos}, found '{c}'")))
                        }
                        None => return Err(self.error("unterminated row(...)".into())),
                    }
                }
                Ok(TypeSignature::Row(fields))
            }
            ("array", false) | ("row", false) => {
                Err(self.error(format!("{name} requires parameters")))
            }
            (_, true) => Err(self.error(format!("type {name} takes no parameters"))),
            (_, false) => Ok(TypeSignature::Base(name.clone())),
        }
    }

    fn parameter(&mut self) -> Result<TypeSignature> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("nesting deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let sig = self.signature();
        self.depth -= 1;
        sig
    }

    fn name(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c.to_ascii_lowercase());
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a type name".into()));
        }
        Ok(name)
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.chars.next() {
            Some((_, c)) if c == want => Ok(()),
            Some((pos, c)) => Err(self.error(format!("expected '{want}' at offset {pos}, found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, reason: String) -> Error {
        const SHOWN: usize = 128;
        let signature = match self.input.char_indices().nth(SHOWN) {
            Some((cut, _)) => format!("{}…", &self.input[..cut]),
            None => self.input.to_string(),
        };
        Error::InvalidSignature { signature, reason }
    }
}
