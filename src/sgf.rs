//! SGF text parsing, typed node properties and serialization.
//!
//! Parsing produces a plain property-bag tree ([`SgfNode`]); the game tree
//! then converts each bag into [`NodeData`], which gives the properties the
//! puzzle logic reads a fixed shape and keeps everything else in an ordered
//! fallback list so a load/save cycle loses nothing.

use crate::board::Sign;
use crate::coord::Vertex;
use crate::error::SgfError;
use crate::tree::{GameTree, NodeId};

// =============================================================================
// Typed properties
// =============================================================================

/// A single `B` or `W` move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub color: Sign,
    /// Raw SGF point, kept verbatim for round-tripping.
    pub point: String,
}

impl Move {
    pub fn new(color: Sign, vertex: Vertex) -> Self {
        Self {
            color,
            point: vertex.to_sgf(),
        }
    }

    pub fn vertex(&self) -> Result<Vertex, SgfError> {
        Vertex::from_sgf(&self.point)
    }

    pub fn property(&self) -> &'static str {
        move_property(self.color)
    }
}

/// `"B"` for Black, `"W"` otherwise.
pub fn move_property(color: Sign) -> &'static str {
    if color == Sign::Black { "B" } else { "W" }
}

/// Properties of one tree node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    /// `B` or `W`.
    pub mv: Option<Move>,
    /// `AB`
    pub add_black: Vec<String>,
    /// `AW`
    pub add_white: Vec<String>,
    /// First `C` value; any further values stay in `other`.
    pub comment: Option<String>,
    /// `LB`, each value `point:text`.
    pub labels: Vec<String>,
    /// `CR`
    pub circles: Vec<String>,
    /// `TR`
    pub triangles: Vec<String>,
    /// `SQ`
    pub squares: Vec<String>,
    /// `MA`
    pub crosses: Vec<String>,
    /// Everything else, in source order.
    pub other: Vec<(String, Vec<String>)>,
}

impl NodeData {
    pub fn with_move(color: Sign, vertex: Vertex) -> Self {
        Self {
            mv: Some(Move::new(color, vertex)),
            ..Self::default()
        }
    }

    pub fn from_properties(properties: Vec<(String, Vec<String>)>) -> Self {
        let mut data = Self::default();
        for (key, values) in properties {
            for value in values {
                data.push_value(&key, value);
            }
        }
        data
    }

    /// Append one value to property `key`.
    ///
    /// A second move value, or a move of the other color, cannot be
    /// represented as the node's move and is kept in [`NodeData::other`].
    pub fn push_value(&mut self, key: &str, value: String) {
        match key {
            "B" | "W" if self.mv.is_none() && !self.has_other(key) => {
                let color = if key == "B" { Sign::Black } else { Sign::White };
                self.mv = Some(Move { color, point: value });
            }
            "AB" => self.add_black.push(value),
            "AW" => self.add_white.push(value),
            "C" if self.comment.is_none() => self.comment = Some(value),
            "LB" => self.labels.push(value),
            "CR" => self.circles.push(value),
            "TR" => self.triangles.push(value),
            "SQ" => self.squares.push(value),
            "MA" => self.crosses.push(value),
            _ => match self.other.iter_mut().find(|(k, _)| k == key) {
                Some((_, values)) => values.push(value),
                None => self.other.push((key.to_string(), vec![value])),
            },
        }
    }

    fn has_other(&self, key: &str) -> bool {
        self.other.iter().any(|(k, _)| k == key)
    }

    /// Values of property `key`, typed or not.
    pub fn values(&self, key: &str) -> Vec<&str> {
        let list: &[String] = match key {
            "B" | "W" => {
                let typed = self
                    .mv
                    .as_ref()
                    .filter(|m| m.property() == key)
                    .map(|m| m.point.as_str());
                let mut out: Vec<&str> = typed.into_iter().collect();
                out.extend(self.other_values(key));
                return out;
            }
            "AB" => &self.add_black,
            "AW" => &self.add_white,
            "C" => return self.comment.as_deref().into_iter().chain(self.other_values(key)).collect(),
            "LB" => &self.labels,
            "CR" => &self.circles,
            "TR" => &self.triangles,
            "SQ" => &self.squares,
            "MA" => &self.crosses,
            _ => return self.other_values(key).collect(),
        };
        list.iter().map(String::as_str).collect()
    }

    fn other_values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> {
        self.other
            .iter()
            .filter(move |(k, _)| k == key)
            .flat_map(|(_, v)| v.iter().map(String::as_str))
    }

    pub fn has_setup(&self) -> bool {
        !self.add_black.is_empty() || !self.add_white.is_empty()
    }

    /// Point string of this node's move if it is `color`'s.
    pub fn move_point(&self, color: Sign) -> Option<&str> {
        self.mv
            .as_ref()
            .filter(|m| m.color == color)
            .map(|m| m.point.as_str())
    }

    /// Flatten back into `(key, values)` pairs in write order.
    pub fn to_properties(&self) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = Vec::new();
        if let Some(m) = &self.mv {
            out.push((m.property().to_string(), vec![m.point.clone()]));
        }
        out.extend(self.other.iter().filter(|(k, _)| k != "C").cloned());
        let typed: [(&str, &Vec<String>); 7] = [
            ("AB", &self.add_black),
            ("AW", &self.add_white),
            ("LB", &self.labels),
            ("CR", &self.circles),
            ("TR", &self.triangles),
            ("SQ", &self.squares),
            ("MA", &self.crosses),
        ];
        for (key, values) in typed {
            if !values.is_empty() {
                out.push((key.to_string(), values.clone()));
            }
        }
        let comments: Vec<String> = self.values("C").into_iter().map(str::to_string).collect();
        if !comments.is_empty() {
            out.push(("C".to_string(), comments));
        }
        out
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// A parsed node before conversion into a [`GameTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgfNode {
    pub properties: Vec<(String, Vec<String>)>,
    pub children: Vec<SgfNode>,
}

// A long main line is a deep chain of single children; unlink it level by
// level instead of recursing once per node.
impl Drop for SgfNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl SgfNode {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }
}

/// Parse an SGF collection into its game trees.
pub fn parse(text: &str) -> Result<Vec<SgfNode>, SgfError> {
    let mut parser = Parser { src: text, pos: 0 };
    let mut trees = Vec::new();
    parser.skip_ws();
    while let Some(c) = parser.peek() {
        if c != '(' {
            return Err(SgfError::Unexpected {
                offset: parser.pos,
                found: c,
            });
        }
        trees.push(parser.game_tree()?);
        parser.skip_ws();
    }
    if trees.is_empty() {
        return Err(SgfError::Empty);
    }
    Ok(trees)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// `"(" Sequence GameTree* ")"`
    fn game_tree(&mut self) -> Result<SgfNode, SgfError> {
        self.bump(); // '('
        self.skip_ws();
        let mut sequence = Vec::new();
        while self.peek() == Some(';') {
            self.bump();
            sequence.push(self.properties()?);
            self.skip_ws();
        }
        let Some(last) = sequence.pop() else {
            return match self.peek() {
                Some(c) => Err(SgfError::Unexpected { offset: self.pos, found: c }),
                None => Err(SgfError::UnbalancedParens),
            };
        };

        let mut variations = Vec::new();
        loop {
            match self.peek() {
                Some('(') => variations.push(self.game_tree()?),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(SgfError::Unexpected { offset: self.pos, found: c }),
                None => return Err(SgfError::UnbalancedParens),
            }
            self.skip_ws();
        }

        let mut node = SgfNode {
            properties: last,
            children: variations,
        };
        while let Some(properties) = sequence.pop() {
            node = SgfNode {
                properties,
                children: vec![node],
            };
        }
        Ok(node)
    }

    fn properties(&mut self) -> Result<Vec<(String, Vec<String>)>, SgfError> {
        let mut props: Vec<(String, Vec<String>)> = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(c) if c.is_ascii_alphabetic() => {
                    let mut raw = String::new();
                    while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
                        raw.push(c);
                        self.bump();
                    }
                    // FF[3] style lowercase letters carry no meaning, unless
                    // they are all there is
                    let mut ident: String = raw.chars().filter(char::is_ascii_uppercase).collect();
                    if ident.is_empty() {
                        ident = raw;
                    }
                    self.skip_ws();
                    if self.peek() != Some('[') {
                        return Err(SgfError::MissingValue(ident));
                    }
                    let mut values = Vec::new();
                    while self.peek() == Some('[') {
                        values.push(self.value()?);
                        self.skip_ws();
                    }
                    match props.iter_mut().find(|(k, _)| *k == ident) {
                        Some((_, existing)) => existing.extend(values),
                        None => props.push((ident, values)),
                    }
                }
                Some(';' | '(' | ')') | None => return Ok(props),
                Some(c) => return Err(SgfError::Unexpected { offset: self.pos, found: c }),
            }
        }
    }

    fn value(&mut self) -> Result<String, SgfError> {
        let start = self.pos;
        self.bump(); // '['
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    // soft line break
                    Some('\n') => {}
                    Some('\r') => {
                        if self.peek() == Some('\n') {
                            self.bump();
                        }
                    }
                    Some(c) => out.push(c),
                    None => return Err(SgfError::UnterminatedValue { offset: start }),
                },
                Some(']') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(SgfError::UnterminatedValue { offset: start }),
            }
        }
    }
}

// =============================================================================
// Serialization
// =============================================================================

/// Write `tree` back out as SGF text.
pub fn serialize(tree: &GameTree) -> String {
    let mut out = String::from("(");
    write_sequence(tree, tree.root_id(), &mut out);
    out.push(')');
    out
}

fn write_sequence(tree: &GameTree, start: NodeId, out: &mut String) {
    let mut id = start;
    loop {
        let Ok(node) = tree.get(id) else {
            return;
        };
        out.push(';');
        for (key, values) in node.data.to_properties() {
            out.push_str(&key);
            for value in values {
                out.push('[');
                out.push_str(&escape(&value));
                out.push(']');
            }
        }
        match node.children.as_slice() {
            [] => return,
            [only] => id = *only,
            many => {
                for child in many {
                    out.push('(');
                    write_sequence(tree, *child, out);
                    out.push(')');
                }
                return;
            }
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ']' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
