// In: src/schema/parser.rs

//! A recursive-descent parser for schema text.
//!
//! ```text
//! type   := struct '<' [field (',' field)*] '>'
//!         | (array | list) '<' type '>'
//!         | map '<' type ',' type '>'
//!         | primitive [ '(' number [',' number] ')' ]
//! field  := name ':' type
//! name   := identifier | '`' any text, '``' for a literal backtick '`'
//! ```
//!
//! Type keywords are case-insensitive; field names keep their case. Whitespace
//! between tokens is ignored.

use std::fmt;

use super::{PrimitiveType, SchemaNode, DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE};
use crate::error::OrcError;

const MAX_DECIMAL_PRECISION: u32 = 38;

pub(super) fn parse_type_text(text: &str) -> Result<SchemaNode, OrcError> {
    let mut parser = Parser { text, pos: 0 };
    let node = parser.parse_type()?;
    parser.skip_whitespace();
    if parser.pos < text.len() {
        return Err(parser.error(&format!(
            "unexpected trailing input '{}'",
            &text[parser.pos..]
        )));
    }
    Ok(node)
}

/// Writes a field name, quoting it when it is not a plain identifier.
pub(super) fn write_field_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if !name.is_empty() && name.chars().all(is_ident_char) {
        write!(f, "{name}")
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> OrcError {
        OrcError::Schema(format!("{message} at offset {} in '{}'", self.pos, self.text))
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn expect(&mut self, expected: char) -> Result<(), OrcError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(&format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(&format!("expected '{expected}', found end of input"))),
        }
    }

    fn identifier(&mut self) -> Result<&'a str, OrcError> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn number(&mut self) -> Result<u32, OrcError> {
        let token = self.identifier()?;
        token
            .parse::<u32>()
            .map_err(|_| self.error(&format!("expected a number, found '{token}'")))
    }

    fn field_name(&mut self) -> Result<String, OrcError> {
        if self.peek() != Some('`') {
            return self.identifier().map(str::to_string);
        }
        self.pos += 1;
        let mut name = String::new();
        loop {
            let mut chars = self.rest().chars();
            match chars.next() {
                None => return Err(self.error("unterminated quoted name")),
                Some('`') => {
                    self.pos += 1;
                    if self.rest().starts_with('`') {
                        name.push('`');
                        self.pos += 1;
                    } else {
                        return Ok(name);
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn parse_type(&mut self) -> Result<SchemaNode, OrcError> {
        let keyword = self.identifier()?.to_ascii_lowercase();
        match keyword.as_str() {
            "struct" => self.parse_struct(),
            "array" | "list" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                Ok(SchemaNode::list_of(element))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                Ok(SchemaNode::map_of(key, value))
            }
            _ => self.parse_primitive(&keyword).map(SchemaNode::primitive),
        }
    }

    fn parse_struct(&mut self) -> Result<SchemaNode, OrcError> {
        self.expect('<')?;
        let mut fields: Vec<(String, SchemaNode)> = Vec::new();
        if self.peek() == Some('>') {
            self.pos += 1;
            return SchemaNode::struct_of(fields);
        }
        loop {
            let name = self.field_name()?;
            if fields.iter().any(|(n, _)| *n == name) {
                return Err(self.error(&format!("duplicate field name '{name}'")));
            }
            self.expect(':')?;
            let child = self.parse_type()?;
            fields.push((name, child));
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('>') => {
                    self.pos += 1;
                    return SchemaNode::struct_of(fields);
                }
                Some(c) => return Err(self.error(&format!("expected ',' or '>', found '{c}'"))),
                None => return Err(self.error("unbalanced '<' in struct")),
            }
        }
    }

    /// Parses `(a)` or `(a,b)` when present.
    fn parameters(&mut self) -> Result<Vec<u32>, OrcError> {
        if self.peek() != Some('(') {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut params = vec![self.number()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            params.push(self.number()?);
        }
        self.expect(')')?;
        Ok(params)
    }

    fn parse_primitive(&mut self, keyword: &str) -> Result<PrimitiveType, OrcError> {
        let primitive = match keyword {
            "boolean" => PrimitiveType::Boolean,
            "tinyint" => PrimitiveType::TinyInt,
            "smallint" => PrimitiveType::SmallInt,
            "int" => PrimitiveType::Int,
            "bigint" => PrimitiveType::BigInt,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            "string" => PrimitiveType::String,
            "binary" => PrimitiveType::Binary,
            "timestamp" => PrimitiveType::Timestamp,
            "date" => PrimitiveType::Date,
            "decimal" => {
                let params = self.parameters()?;
                let (precision, scale) = match params.as_slice() {
                    [] => (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE),
                    [p] => (*p, 0),
                    [p, s] => (*p, *s),
                    _ => return Err(self.error("decimal takes at most two parameters")),
                };
                if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
                    return Err(self.error(&format!(
                        "invalid decimal({precision},{scale})"
                    )));
                }
                return Ok(PrimitiveType::Decimal { precision, scale });
            }
            "char" | "varchar" => {
                let params = self.parameters()?;
                let [length] = params.as_slice() else {
                    return Err(self.error(&format!("{keyword} requires a length")));
                };
                if *length == 0 {
                    return Err(self.error(&format!("{keyword} length must be positive")));
                }
                return Ok(if keyword == "char" {
                    PrimitiveType::Char(*length)
                } else {
                    PrimitiveType::Varchar(*length)
                });
            }
            other => return Err(self.error(&format!("unknown type '{other}'"))),
        };
        Ok(primitive)
    }
}
