//! Edge-stream input and top-nodes output for node degree estimation.
//!
//! An edge stream has one edge per line, `<u> <v> [<timestamp> ...]`. Feeding
//! both endpoints of every edge to a sketch estimates node degrees.

use std::collections::HashSet;
use std::hash::Hash;
use std::io::Write;

use crate::error::{Error, Result};
use crate::sketch::Node;

/// Node identifier in edge streams.
pub type NodeId = u32;

/// Iterator over the edges of an in-memory edge stream.
///
/// Blank lines and lines starting with `#` or `%` are skipped. Fields after
/// the two node ids are ignored.
pub struct EdgeReader<'a> {
    lines: std::iter::Enumerate<std::slice::Split<'a, u8, fn(&u8) -> bool>>,
}

impl<'a> EdgeReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let newline: fn(&u8) -> bool = |b| *b == b'\n';
        Self {
            lines: data.split(newline).enumerate(),
        }
    }
}

impl Iterator for EdgeReader<'_> {
    type Item = Result<(NodeId, NodeId)>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(_) => return Some(Err(parse_error(idx + 1, "line is not valid UTF-8"))),
            };
            if is_skipped(line) {
                continue;
            }
            return Some(parse_edge(idx + 1, line));
        }
        None
    }
}

fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with('%')
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse { line, message: message.into() }
}

fn parse_node(line: usize, field: Option<&str>) -> Result<NodeId> {
    let field = field.ok_or_else(|| parse_error(line, "expected two node ids"))?;
    field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid node id {:?}", field)))
}

fn parse_edge(line: usize, text: &str) -> Result<(NodeId, NodeId)> {
    let mut fields = text.split_whitespace();
    let u = parse_node(line, fields.next())?;
    let v = parse_node(line, fields.next())?;
    Ok((u, v))
}

/// Reads a ground-truth degree file of `<node> <degree>` lines.
pub fn read_degrees(data: &[u8]) -> Result<Vec<Node<NodeId>>> {
    let text = std::str::from_utf8(data).map_err(|_| parse_error(0, "file is not valid UTF-8"))?;
    let mut nodes = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if is_skipped(line) {
            continue;
        }
        let mut fields = line.split_whitespace();
        let item = parse_node(idx + 1, fields.next())?;
        let count = fields
            .next()
            .ok_or_else(|| parse_error(idx + 1, "expected a degree after the node id"))?;
        let count = count
            .parse()
            .map_err(|_| parse_error(idx + 1, format!("invalid degree {:?}", count)))?;
        nodes.push(Node { item, count });
    }
    Ok(nodes)
}

/// Fraction of `truth` items that also appear in `estimate`. An empty truth
/// set has recall 1.
pub fn recall<T: Hash + Eq>(truth: &[Node<T>], estimate: &[Node<T>]) -> f64 {
    let truth: HashSet<&T> = truth.iter().map(|node| &node.item).collect();
    if truth.is_empty() {
        return 1.0;
    }
    let estimate: HashSet<&T> = estimate.iter().map(|node| &node.item).collect();
    truth.intersection(&estimate).count() as f64 / truth.len() as f64
}

/// Writes nodes as CSV with a `Node,Degree` header.
pub fn write_top_nodes<W: Write>(mut out: W, nodes: &[Node<NodeId>]) -> Result<()> {
    writeln!(out, "Node,Degree")?;
    for node in nodes {
        writeln!(out, "{},{}", node.item, node.count)?;
    }
    out.flush()?;
    Ok(())
}
