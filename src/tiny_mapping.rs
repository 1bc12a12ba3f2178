//! Tab separated Tiny v1 mappings (`yarn` namespace).
//!
//! ```text
//! v1	official	intermediary	named
//! CLASS	a	net/minecraft/class_1	net/minecraft/Foo
//! METHOD	a	(La;)V	b	method_1	bar
//! FIELD	a	I	c	field_1	count
//! ```
//!
//! Owners and descriptors are always written in the first namespace of the header, which
//! is the origin side. Classes must precede their members.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::warn;

use crate::error::{FormatError, MappingError, Result};
use crate::format::{MappingFormat, numbered_lines};
use crate::signature::{rewrite_descriptor_classes, simple_name};
use crate::symbol::{SymbolId, SymbolKind, SymbolPair, SymbolPairs, into_pair_map};

pub const DEFAULT_TARGET_NAMESPACE: &str = "named";

#[derive(Debug, Clone)]
pub struct TinyMapping {
    target_namespace: String,
}

impl Default for TinyMapping {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_NAMESPACE)
    }
}

impl TinyMapping {
    pub fn new(target_namespace: impl Into<String>) -> Self {
        Self {
            target_namespace: target_namespace.into(),
        }
    }

    /// Index of the target namespace among the header's namespace columns.
    fn target_column(&self, header: &str) -> Result<usize> {
        let mut columns = header.split('\t');
        match columns.next() {
            Some("v1") => {}
            _ => {
                return Err(MappingError::Format(FormatError::Line(format!(
                    "unsupported tiny header: {header}"
                ))));
            }
        }

        let namespaces: Vec<&str> = columns.collect();
        if namespaces.len() < 2 {
            return Err(MappingError::Format(FormatError::Line(format!(
                "tiny header needs at least two namespaces: {header}"
            ))));
        }

        Ok(namespaces
            .iter()
            .position(|ns| *ns == self.target_namespace)
            .unwrap_or(namespaces.len() - 1))
    }
}

impl MappingFormat for TinyMapping {
    fn read_raw_pairs(&self, reader: &mut dyn BufRead) -> Result<Vec<SymbolPair>> {
        let mut lines = numbered_lines(reader);
        let Some((_, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let target = self.target_column(&header?)?;

        let mut pairs = Vec::new();
        let mut classes: HashMap<String, String> = HashMap::new();

        for (line_no, line) in lines {
            let line = line?;
            let cols: Vec<&str> = line.split('\t').collect();

            let parsed = match cols[0] {
                "CLASS" => parse_class(&cols, target).inspect(|pair| {
                    classes.insert(pair.origin.name.clone(), pair.target.name.clone());
                }),
                "METHOD" => parse_member(&cols, target, &classes, SymbolKind::Method),
                "FIELD" => parse_member(&cols, target, &classes, SymbolKind::Field),
                _ => continue,
            };

            match parsed {
                Ok(pair) => pairs.push(pair),
                Err(e) => warn!(line = line_no, error = %e, "skipping tiny mapping line"),
            }
        }

        Ok(pairs)
    }

    fn rewrite_pairs(&self, raw: Vec<SymbolPair>) -> SymbolPairs {
        let rename: HashMap<String, String> = raw
            .iter()
            .filter(|p| p.origin.is_class())
            .map(|p| (p.origin.descriptor.clone(), p.target.descriptor.clone()))
            .collect();

        let rewritten: Vec<SymbolPair> = raw
            .into_par_iter()
            .map(|mut pair| {
                match pair.origin.kind {
                    SymbolKind::Class => {
                        pair.origin.name = simple_name(&pair.origin.name).to_string();
                        pair.target.name = simple_name(&pair.target.name).to_string();
                    }
                    SymbolKind::Method | SymbolKind::Field => {
                        pair.target.descriptor =
                            rewrite_descriptor_classes(&pair.origin.descriptor, &rename);
                    }
                }
                pair
            })
            .collect();

        into_pair_map(rewritten)
    }
}

fn column<'a>(cols: &[&'a str], idx: usize) -> Result<&'a str, FormatError> {
    cols.get(idx)
        .copied()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| FormatError::Line(cols.join("\t")))
}

fn parse_class(cols: &[&str], target: usize) -> Result<SymbolPair, FormatError> {
    let origin = column(cols, 1)?;
    let named = column(cols, 1 + target)?;
    Ok(SymbolPair::new(
        SymbolId::class(origin, format!("L{origin};")),
        SymbolId::class(named, format!("L{named};")),
    ))
}

fn parse_member(
    cols: &[&str],
    target: usize,
    classes: &HashMap<String, String>,
    kind: SymbolKind,
) -> Result<SymbolPair, FormatError> {
    let owner = column(cols, 1)?;
    let descriptor = column(cols, 2)?;
    let origin_name = column(cols, 3)?;
    let target_name = column(cols, 3 + target)?;
    let target_owner = classes
        .get(owner)
        .ok_or_else(|| FormatError::Line(format!("member of unknown class {owner}")))?;

    let origin = SymbolId {
        name: origin_name.to_string(),
        owner: owner.to_string(),
        descriptor: descriptor.to_string(),
        kind,
    };
    let target = SymbolId {
        name: target_name.to_string(),
        owner: target_owner.clone(),
        descriptor: String::new(),
        kind,
    };
    Ok(SymbolPair::new(origin, target))
}
