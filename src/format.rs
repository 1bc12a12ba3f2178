//! Mapping file formats.
//!
//! Every format parses in two explicit stages: [`MappingFormat::read_raw_pairs`] collects
//! pairs in file order with only one side's descriptors known, then
//! [`MappingFormat::rewrite_pairs`] runs once all class pairs exist and fills in the other
//! side through the class rename table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{MappingError, Result};
use crate::symbol::{SymbolPair, SymbolPairs};

pub trait MappingFormat: Send + Sync {
    fn read_raw_pairs(&self, reader: &mut dyn BufRead) -> Result<Vec<SymbolPair>>;

    fn rewrite_pairs(&self, raw: Vec<SymbolPair>) -> SymbolPairs;

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<SymbolPairs> {
        let raw = self.read_raw_pairs(reader)?;
        Ok(self.rewrite_pairs(raw))
    }

    fn parse_file(&self, path: &Path) -> Result<SymbolPairs> {
        let file = File::open(path).map_err(|e| MappingError::io(path, e))?;
        let mut reader = BufReader::new(file);
        self.read_raw_pairs(&mut reader)
            .map(|raw| self.rewrite_pairs(raw))
            .map_err(|e| match e {
                MappingError::Io { source, .. } => MappingError::io(path, source),
                other => other,
            })
    }
}

/// Iterates lines with 1-based numbers, surfacing read failures.
pub(crate) fn numbered_lines(
    reader: &mut dyn BufRead,
) -> impl Iterator<Item = (usize, Result<String>)> + '_ {
    reader.lines().enumerate().map(|(idx, line)| {
        let line = line
            .map(|l| l.trim_end_matches('\r').to_string())
            .map_err(|e| MappingError::io("<mapping input>", e));
        (idx + 1, line)
    })
}
