//! Delimited node/edge tables
//!
//! Headers follow the graph database bulk-import conventions (`curie:ID`,
//! `:START_ID`, `:TYPE`, `:END_ID`, typed property columns). Fields are quoted
//! only when they contain the delimiter, a double quote or a line break.

use std::io::{self, Write};

use crate::domain::{CooccurrenceEdge, EdgeType, HierarchyEdge, MentionEdge, NodeRecord};
use crate::error::{Error, Result};

pub const NODE_HEADER: &[&str] = &["curie:ID", "name:string", ":LABEL"];
pub const COOCCURRENCE_EDGE_HEADER: &[&str] = &[":START_ID", ":TYPE", ":END_ID", "count:int"];
pub const RELATION_EDGE_HEADER: &[&str] = &[":START_ID", ":TYPE", ":END_ID"];

/// A record that can be written as one table row
pub trait TableRow {
    /// Column header for tables of this record
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for NodeRecord {
    const HEADER: &'static [&'static str] = NODE_HEADER;

    fn cells(&self) -> Vec<String> {
        vec![
            self.curie.to_string(),
            self.name.clone(),
            self.label.as_str().to_string(),
        ]
    }
}

impl TableRow for CooccurrenceEdge {
    const HEADER: &'static [&'static str] = COOCCURRENCE_EDGE_HEADER;

    fn cells(&self) -> Vec<String> {
        vec![
            self.source.to_string(),
            EdgeType::OccursWith.as_str().to_string(),
            self.target.to_string(),
            self.count.to_string(),
        ]
    }
}

impl TableRow for HierarchyEdge {
    const HEADER: &'static [&'static str] = RELATION_EDGE_HEADER;

    fn cells(&self) -> Vec<String> {
        vec![
            self.child.to_string(),
            EdgeType::Isa.as_str().to_string(),
            self.parent.to_string(),
        ]
    }
}

impl TableRow for MentionEdge {
    const HEADER: &'static [&'static str] = RELATION_EDGE_HEADER;

    fn cells(&self) -> Vec<String> {
        vec![
            self.document.to_string(),
            EdgeType::Mentions.as_str().to_string(),
            self.concept.to_string(),
        ]
    }
}

/// Header plus fixed-arity rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from records, in the order given
    pub fn from_records<'r, R, I>(records: I) -> Self
    where
        R: TableRow + 'r,
        I: IntoIterator<Item = &'r R>,
    {
        let mut table = Self::new(R::HEADER);
        table.rows = records.into_iter().map(|record| record.cells()).collect();
        table
    }

    /// Append a row, rejecting rows whose arity differs from the header
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.header.len() {
            return Err(Error::InvalidInput(format!(
                "row has {} fields, table header has {}",
                row.len(),
                self.header.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows, header excluded
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort rows lexicographically by their cells
    pub fn sort_rows(&mut self) {
        self.rows.sort();
    }

    /// Write the header and every row
    pub fn write_to<W: Write>(&self, writer: &mut W, delimiter: char) -> io::Result<()> {
        write_record(writer, &self.header, delimiter)?;
        for row in &self.rows {
            write_record(writer, row, delimiter)?;
        }
        Ok(())
    }

    /// Render to bytes
    pub fn to_bytes(&self, delimiter: char) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, delimiter)?;
        Ok(buf)
    }
}

fn write_record<W: Write>(writer: &mut W, fields: &[String], delimiter: char) -> io::Result<()> {
    let mut separator = [0u8; 4];
    let separator = delimiter.encode_utf8(&mut separator).as_bytes();

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            writer.write_all(separator)?;
        }
        write_field(writer, field, delimiter)?;
    }
    writer.write_all(b"\n")
}

fn write_field<W: Write>(writer: &mut W, field: &str, delimiter: char) -> io::Result<()> {
    let needs_quotes = field.contains(delimiter) || field.contains(['"', '\n', '\r']);
    if !needs_quotes {
        return writer.write_all(field.as_bytes());
    }
    writer.write_all(b"\"")?;
    writer.write_all(field.replace('"', "\"\"").as_bytes())?;
    writer.write_all(b"\"")
}
