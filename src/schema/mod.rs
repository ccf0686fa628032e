// In: src/schema/mod.rs

//! The schema tree.
//!
//! A schema is parsed once from text (`struct<a:int,b:array<string>>`) into a
//! tree of `SchemaNode`s. Every node gets a stable pre-order id: the root is 0,
//! and a node's descendants occupy the ids `id + 1 ..= max_id`. These ids index
//! the writer's column accumulators and name the columns in the file footer, so
//! they are part of the file-format contract.

mod parser;

use std::fmt;

use crate::error::OrcError;
use crate::types::TypeKind;

//==================================================================================
// 1. Type Model
//==================================================================================

/// Leaf types, with their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    String,
    Binary,
    Timestamp,
    Date,
    Decimal { precision: u32, scale: u32 },
    Char(u32),
    Varchar(u32),
}

pub const DEFAULT_DECIMAL_PRECISION: u32 = 38;
pub const DEFAULT_DECIMAL_SCALE: u32 = 10;

impl PrimitiveType {
    pub fn type_kind(&self) -> TypeKind {
        match self {
            Self::Boolean => TypeKind::Boolean,
            Self::TinyInt => TypeKind::Byte,
            Self::SmallInt => TypeKind::Short,
            Self::Int => TypeKind::Int,
            Self::BigInt => TypeKind::Long,
            Self::Float => TypeKind::Float,
            Self::Double => TypeKind::Double,
            Self::String => TypeKind::String,
            Self::Binary => TypeKind::Binary,
            Self::Timestamp => TypeKind::Timestamp,
            Self::Date => TypeKind::Date,
            Self::Decimal { .. } => TypeKind::Decimal,
            Self::Char(_) => TypeKind::Char,
            Self::Varchar(_) => TypeKind::Varchar,
        }
    }

    /// Inclusive value range for the integer family.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::TinyInt => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::SmallInt => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::BigInt => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::Char(n) => write!(f, "char({n})"),
            Self::Varchar(n) => write!(f, "varchar({n})"),
            other => write!(f, "{}", other.type_kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Primitive(PrimitiveType),
    /// Fields in declaration order; each child carries its `field_name`.
    Struct(Vec<SchemaNode>),
    List(Box<SchemaNode>),
    Map(Box<SchemaNode>, Box<SchemaNode>),
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    id: usize,
    max_id: usize,
    field_name: Option<String>,
    kind: SchemaKind,
}

//==================================================================================
// 2. Construction
//==================================================================================

/// Parses schema text into a tree with pre-order ids.
pub fn parse(text: &str) -> Result<SchemaNode, OrcError> {
    let mut root = parser::parse_type_text(text)?;
    root.assign_ids(0);
    Ok(root)
}

impl SchemaNode {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::unnumbered(SchemaKind::Primitive(primitive))
    }

    /// Builds a struct node. Field names must be unique.
    pub fn struct_of<S: Into<String>>(fields: Vec<(S, SchemaNode)>) -> Result<Self, OrcError> {
        let mut children: Vec<SchemaNode> = Vec::with_capacity(fields.len());
        for (name, mut child) in fields {
            let name = name.into();
            if children.iter().any(|c| c.field_name.as_deref() == Some(name.as_str())) {
                return Err(OrcError::Schema(format!("duplicate field name '{name}'")));
            }
            child.field_name = Some(name);
            children.push(child);
        }
        Ok(Self::unnumbered(SchemaKind::Struct(children)))
    }

    pub fn list_of(element: SchemaNode) -> Self {
        Self::unnumbered(SchemaKind::List(Box::new(element)))
    }

    pub fn map_of(key: SchemaNode, value: SchemaNode) -> Self {
        Self::unnumbered(SchemaKind::Map(Box::new(key), Box::new(value)))
    }

    fn unnumbered(kind: SchemaKind) -> Self {
        let mut node = Self {
            id: 0,
            max_id: 0,
            field_name: None,
            kind,
        };
        node.assign_ids(0);
        node
    }

    /// Numbers this subtree in pre-order starting at `next`; returns `max_id`.
    fn assign_ids(&mut self, next: usize) -> usize {
        self.id = next;
        let mut last = next;
        match &mut self.kind {
            SchemaKind::Primitive(_) => {}
            SchemaKind::Struct(children) => {
                for child in children.iter_mut() {
                    last = child.assign_ids(last + 1);
                }
            }
            SchemaKind::List(element) => {
                last = element.assign_ids(last + 1);
            }
            SchemaKind::Map(key, value) => {
                last = key.assign_ids(last + 1);
                last = value.assign_ids(last + 1);
            }
        }
        self.max_id = last;
        last
    }
}

//==================================================================================
// 3. Accessors
//==================================================================================

impl SchemaNode {
    pub fn id(&self) -> usize {
        self.id
    }

    /// The largest id in this subtree.
    pub fn max_id(&self) -> usize {
        self.max_id
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn type_kind(&self) -> TypeKind {
        match &self.kind {
            SchemaKind::Primitive(p) => p.type_kind(),
            SchemaKind::Struct(_) => TypeKind::Struct,
            SchemaKind::List(_) => TypeKind::List,
            SchemaKind::Map(_, _) => TypeKind::Map,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, SchemaKind::Struct(_))
    }

    /// Direct children in id order.
    pub fn children(&self) -> Vec<&SchemaNode> {
        match &self.kind {
            SchemaKind::Primitive(_) => Vec::new(),
            SchemaKind::Struct(children) => children.iter().collect(),
            SchemaKind::List(element) => vec![element.as_ref()],
            SchemaKind::Map(key, value) => vec![key.as_ref(), value.as_ref()],
        }
    }

    /// Struct fields; empty for other kinds.
    pub fn fields(&self) -> &[SchemaNode] {
        match &self.kind {
            SchemaKind::Struct(children) => children.as_slice(),
            _ => &[],
        }
    }

    /// Number of nodes in this subtree (the column count for a root).
    pub fn column_count(&self) -> usize {
        self.max_id - self.id + 1
    }

    /// All nodes of this subtree in pre-order (which is id order).
    pub fn flatten(&self) -> Vec<&SchemaNode> {
        let mut out = Vec::with_capacity(self.column_count());
        self.collect_preorder(&mut out);
        out
    }

    fn collect_preorder<'a>(&'a self, out: &mut Vec<&'a SchemaNode>) {
        out.push(self);
        for child in self.children() {
            child.collect_preorder(out);
        }
    }

    /// Finds a node by id within this subtree.
    pub fn node(&self, id: usize) -> Option<&SchemaNode> {
        if id == self.id {
            return Some(self);
        }
        if id < self.id || id > self.max_id {
            return None;
        }
        self.children()
            .into_iter()
            .find(|c| c.id <= id && id <= c.max_id)
            .and_then(|c| c.node(id))
    }

    /// Resolves a dotted field path such as `"a.b"` through nested structs.
    pub fn find_column(&self, path: &str) -> Option<&SchemaNode> {
        let mut current = self;
        for part in path.split('.') {
            current = current
                .fields()
                .iter()
                .find(|f| f.field_name.as_deref() == Some(part))?;
        }
        Some(current)
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaKind::Primitive(p) => write!(f, "{p}"),
            SchemaKind::Struct(children) => {
                write!(f, "struct<")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    parser::write_field_name(f, child.field_name().unwrap_or_default())?;
                    write!(f, ":{child}")?;
                }
                write!(f, ">")
            }
            SchemaKind::List(element) => write!(f, "array<{element}>"),
            SchemaKind::Map(key, value) => write!(f, "map<{key},{value}>"),
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
