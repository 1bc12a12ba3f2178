//! ProGuard-style line mappings (`official` namespace).
//!
//! ```text
//! com.example.Foo -> a:
//!     int count -> b
//!     1:4:void bar(int,java.lang.String) -> a
//! ```
//!
//! Headers name the readable class first and the obfuscated one second, so only the
//! readable side of each member descriptor appears literally. The obfuscated descriptor is
//! recovered in [`MappingFormat::rewrite_pairs`].

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::warn;

use crate::error::{FormatError, Result};
use crate::format::{MappingFormat, numbered_lines};
use crate::signature::{
    class_name_to_descriptor, internal_name, method_to_descriptor, rewrite_descriptor_classes,
    simple_name,
};
use crate::symbol::{SymbolId, SymbolKind, SymbolPair, SymbolPairs, into_pair_map};

#[derive(Debug, Default, Clone, Copy)]
pub struct LineMapping;

struct ClassScope {
    origin: String,
    target: String,
}

impl MappingFormat for LineMapping {
    fn read_raw_pairs(&self, reader: &mut dyn BufRead) -> Result<Vec<SymbolPair>> {
        let mut pairs = Vec::new();
        let mut scope: Option<ClassScope> = None;

        for (line_no, line) in numbered_lines(reader) {
            let line = line?;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            match parse_line(&line, scope.as_ref()) {
                Ok(Parsed::Class(pair)) => {
                    scope = Some(ClassScope {
                        origin: pair.origin.name.clone(),
                        target: pair.target.name.clone(),
                    });
                    pairs.push(pair);
                }
                Ok(Parsed::Member(pair)) => pairs.push(pair),
                Err(e) => warn!(line = line_no, error = %e, "skipping mapping line"),
            }
        }

        Ok(pairs)
    }

    fn rewrite_pairs(&self, raw: Vec<SymbolPair>) -> SymbolPairs {
        let rename: HashMap<String, String> = raw
            .iter()
            .filter(|p| p.origin.is_class())
            .map(|p| (p.target.descriptor.clone(), p.origin.descriptor.clone()))
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
                        pair.origin.descriptor =
                            rewrite_descriptor_classes(&pair.target.descriptor, &rename);
                    }
                }
                pair
            })
            .collect();

        into_pair_map(rewritten)
    }
}

enum Parsed {
    Class(SymbolPair),
    Member(SymbolPair),
}

fn parse_line(line: &str, scope: Option<&ClassScope>) -> Result<Parsed, FormatError> {
    let (left, origin_name) = line
        .split_once(" -> ")
        .ok_or_else(|| FormatError::Line(line.to_string()))?;
    let origin_name = origin_name.trim();

    if !left.starts_with(char::is_whitespace) {
        let target = internal_name(left);
        let origin = internal_name(origin_name.trim_end_matches(':'));
        return Ok(Parsed::Class(SymbolPair::new(
            SymbolId::class(origin.clone(), class_name_to_descriptor(&origin)),
            SymbolId::class(target.clone(), class_name_to_descriptor(&target)),
        )));
    }

    let scope = scope.ok_or_else(|| FormatError::Line(format!("member outside class: {line}")))?;
    let member = left.trim();

    if member.contains(':') || member.contains('(') {
        let signature = strip_line_ranges(member);
        let (descriptor, name) = method_to_descriptor(signature, true)?;
        let name = name.ok_or_else(|| FormatError::MissingName(signature.to_string()))?;
        return Ok(Parsed::Member(SymbolPair::new(
            SymbolId::method(origin_name, scope.origin.as_str(), ""),
            SymbolId::method(name, scope.target.as_str(), descriptor),
        )));
    }

    let mut tokens = member.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(field_type), Some(name), None) => Ok(Parsed::Member(SymbolPair::new(
            SymbolId::field(origin_name, scope.origin.as_str(), ""),
            SymbolId::field(name, scope.target.as_str(), class_name_to_descriptor(field_type)),
        ))),
        _ => Err(FormatError::Line(line.to_string())),
    }
}

/// `1:4:void bar(int):10:12` to `void bar(int)`.
fn strip_line_ranges(member: &str) -> &str {
    let mut rest = member;
    while let Some((head, tail)) = rest.split_once(':') {
        if head.is_empty() || !head.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        rest = tail;
    }
    match rest.rfind(')') {
        Some(close) => &rest[..=close],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "# comment line
com.example.Foo -> a:
    # {\"fileName\":\"Foo.java\"}
    int x -> a
    com.example.Bar partner -> b
    1:4:void bar(int) -> b
    5:9:com.example.Bar make(com.example.Foo,long[]) -> a
    void idle() -> c
com.example.Bar -> b:
    java.lang.String label -> a
";

    fn raw(input: &str) -> Vec<SymbolPair> {
        LineMapping
            .read_raw_pairs(&mut Cursor::new(input.as_bytes()))
            .unwrap()
    }

    #[test]
    fn raw_stage_emits_target_descriptors_only() {
        let pairs = raw("Foo -> a:\n    int x -> a\n");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].origin, SymbolId::field("a", "a", ""));
        assert_eq!(pairs[1].target, SymbolId::field("x", "Foo", "I"));
    }

    #[test]
    fn raw_stage_reads_classes_methods_and_fields() {
        let pairs = raw(SAMPLE);
        assert_eq!(pairs.len(), 8);

        assert_eq!(pairs[0].origin, SymbolId::class("a", "La;"));
        assert_eq!(
            pairs[0].target,
            SymbolId::class("com/example/Foo", "Lcom/example/Foo;")
        );
        assert_eq!(
            pairs[3].target,
            SymbolId::method("bar", "com/example/Foo", "(I)V")
        );
        assert_eq!(
            pairs[4].target,
            SymbolId::method(
                "make",
                "com/example/Foo",
                "(Lcom/example/Foo;[J)Lcom/example/Bar;"
            )
        );
        assert_eq!(pairs[5].target, SymbolId::method("idle", "com/example/Foo", "()V"));
        assert_eq!(pairs[7].origin.owner, "b");
    }

    #[test]
    fn rewrite_stage_translates_descriptors_into_origin_classes() {
        let pairs = LineMapping.rewrite_pairs(raw(SAMPLE));
        assert_eq!(pairs.len(), 8);

        let foo = &pairs[&SymbolId::class("a", "La;")];
        assert_eq!(foo, &SymbolId::class("Foo", "Lcom/example/Foo;"));

        let make = SymbolId::method("a", "a", "(La;[J)Lb;");
        assert_eq!(pairs[&make].name, "make");

        let field = SymbolId::field("a", "a", "I");
        assert_eq!(pairs[&field], SymbolId::field("x", "com/example/Foo", "I"));

        let partner = SymbolId::field("b", "a", "Lb;");
        assert_eq!(pairs[&partner].descriptor, "Lcom/example/Bar;");

        let label = SymbolId::field("a", "b", "Ljava/lang/String;");
        assert_eq!(pairs[&label].name, "label");
    }

    #[test]
    fn obfuscated_overloads_stay_distinct() {
        let input = "Foo -> a:\n    1:1:void set(int) -> a\n    2:2:void set(long) -> a\n";
        let pairs = LineMapping.parse_reader(&mut Cursor::new(input.as_bytes())).unwrap();
        assert!(pairs.contains_key(&SymbolId::method("a", "a", "(I)V")));
        assert!(pairs.contains_key(&SymbolId::method("a", "a", "(J)V")));
    }

    #[test]
    fn round_trip_through_inverse_rename_table() {
        let raw_pairs = raw(SAMPLE);
        let forward: HashMap<String, String> = raw_pairs
            .iter()
            .filter(|p| p.origin.is_class())
            .map(|p| (p.origin.descriptor.clone(), p.target.descriptor.clone()))
            .collect();

        for (origin, target) in LineMapping.rewrite_pairs(raw_pairs) {
            if origin.is_class() {
                assert_eq!(forward.get(&origin.descriptor), Some(&target.descriptor));
            } else {
                assert_eq!(
                    rewrite_descriptor_classes(&origin.descriptor, &forward),
                    target.descriptor
                );
            }
        }
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = "Foo -> a:\n    1:1:void broken -> a\n    this is not a mapping\n    int ok -> b\n";
        let pairs = raw(input);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].target.name, "ok");
    }

    #[test]
    fn members_before_any_class_are_skipped() {
        assert!(raw("    int x -> a\n").is_empty());
    }

    #[test]
    fn strip_line_ranges_removes_prefix_and_inline_suffix() {
        assert_eq!(strip_line_ranges("1:4:void bar(int)"), "void bar(int)");
        assert_eq!(strip_line_ranges("12:34:int f():56:78"), "int f()");
        assert_eq!(strip_line_ranges("void g()"), "void g()");
    }
}
