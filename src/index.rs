//! Immutable bidirectional index over one parsed mapping, with ranked fuzzy search.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::symbol::{SymbolId, SymbolPair, SymbolPairs};

#[derive(Debug, Default)]
pub struct MappingIndex {
    forward: HashMap<SymbolId, SymbolId>,
    backward: HashMap<SymbolId, SymbolId>,
    origin_by_name: HashMap<String, Vec<SymbolId>>,
    target_by_name: HashMap<String, Vec<SymbolId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    Origin = 1,
    Target = 2,
}

#[derive(Debug)]
struct Candidate<'a> {
    origin: &'a SymbolId,
    target: &'a SymbolId,
    match_weight: u8,
    kind_weight: u8,
    side: Side,
}

impl MappingIndex {
    pub fn from_pairs(pairs: SymbolPairs) -> Self {
        let mut index = MappingIndex {
            forward: HashMap::with_capacity(pairs.len()),
            backward: HashMap::with_capacity(pairs.len()),
            ..Default::default()
        };

        for (origin, target) in pairs {
            index
                .origin_by_name
                .entry(origin.name.clone())
                .or_default()
                .push(origin.clone());
            index
                .target_by_name
                .entry(target.name.clone())
                .or_default()
                .push(target.clone());
            index.backward.insert(target.clone(), origin.clone());
            index.forward.insert(origin, target);
        }

        for ids in index
            .origin_by_name
            .values_mut()
            .chain(index.target_by_name.values_mut())
        {
            ids.sort();
        }

        index
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn target_of(&self, origin: &SymbolId) -> Option<&SymbolId> {
        self.forward.get(origin)
    }

    pub fn origin_of(&self, target: &SymbolId) -> Option<&SymbolId> {
        self.backward.get(target)
    }

    pub fn origins_named(&self, name: &str) -> &[SymbolId] {
        self.origin_by_name.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn targets_named(&self, name: &str) -> &[SymbolId] {
        self.target_by_name.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&SymbolId, &SymbolId)> {
        self.forward.iter()
    }

    /// Case-insensitive substring search over both namespaces' names.
    ///
    /// Ranked by match quality (exact > prefix > substring), then symbol kind
    /// (class > method > field), then side (target-name hit > origin-name hit), then origin
    /// name ascending. Each `(origin name, target name)` pair appears at most once.
    pub fn search(&self, keyword: &str, max_results: usize) -> Vec<SymbolPair> {
        if keyword.is_empty() || max_results == 0 {
            return Vec::new();
        }
        let keyword = keyword.to_lowercase();

        let mut candidates = Vec::new();
        self.collect_candidates(&keyword, Side::Origin, &mut candidates);
        self.collect_candidates(&keyword, Side::Target, &mut candidates);

        candidates.sort_by(|a, b| {
            (Reverse(a.match_weight), Reverse(a.kind_weight), Reverse(a.side))
                .cmp(&(Reverse(b.match_weight), Reverse(b.kind_weight), Reverse(b.side)))
                .then_with(|| a.origin.name.cmp(&b.origin.name))
                .then_with(|| a.origin.cmp(b.origin))
                .then_with(|| a.target.cmp(b.target))
        });

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        candidates
            .into_iter()
            .filter(|c| seen.insert((c.origin.name.as_str(), c.target.name.as_str())))
            .take(max_results)
            .map(|c| SymbolPair::new(c.origin.clone(), c.target.clone()))
            .collect()
    }

    fn collect_candidates<'a>(
        &'a self,
        keyword: &str,
        side: Side,
        out: &mut Vec<Candidate<'a>>,
    ) {
        let (by_name, counterpart) = match side {
            Side::Origin => (&self.origin_by_name, &self.forward),
            Side::Target => (&self.target_by_name, &self.backward),
        };

        for (name, ids) in by_name {
            let lowered = name.to_lowercase();
            if !lowered.contains(keyword) {
                continue;
            }
            let match_weight = match_weight(&lowered, keyword);

            for id in ids {
                let Some(other) = counterpart.get(id) else {
                    continue;
                };
                let (origin, target) = match side {
                    Side::Origin => (id, other),
                    Side::Target => (other, id),
                };
                out.push(Candidate {
                    origin,
                    target,
                    match_weight,
                    kind_weight: id.kind.weight(),
                    side,
                });
            }
        }
    }
}

fn match_weight(name: &str, keyword: &str) -> u8 {
    if name == keyword {
        3
    } else if name.starts_with(keyword) {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SymbolKind, into_pair_map};

    fn sample() -> MappingIndex {
        MappingIndex::from_pairs(into_pair_map([
            SymbolPair::new(
                SymbolId::class("a", "La;"),
                SymbolId::class("Foo", "Lcom/example/Foo;"),
            ),
            SymbolPair::new(
                SymbolId::method("b", "a", "(I)V"),
                SymbolId::method("bar", "com/example/Foo", "(I)V"),
            ),
        ]))
    }

    #[test]
    fn search_finds_method_by_target_name() {
        let results = sample().search("bar", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target.name, "bar");
        assert_eq!(results[0].target.kind, SymbolKind::Method);
        assert_eq!(results[0].origin.name, "b");
    }

    #[test]
    fn lookups_work_in_both_directions() {
        let index = sample();
        assert_eq!(index.len(), 2);
        for (origin, target) in index.pairs() {
            assert_eq!(index.target_of(origin), Some(target));
            assert_eq!(index.origin_of(target), Some(origin));
        }
        assert_eq!(index.origins_named("b").len(), 1);
        assert!(index.targets_named("missing").is_empty());
    }

    #[test]
    fn search_with_zero_limit_or_empty_keyword_is_empty() {
        let index = sample();
        assert!(index.search("bar", 0).is_empty());
        assert!(index.search("", 10).is_empty());
    }

    #[test]
    fn search_ranks_by_match_kind_and_side() {
        let index = MappingIndex::from_pairs(into_pair_map([
            SymbolPair::new(
                SymbolId::field("c", "a", "I"),
                SymbolId::field("render", "com/example/Foo", "I"),
            ),
            SymbolPair::new(
                SymbolId::method("d", "a", "()V"),
                SymbolId::method("preRender", "com/example/Foo", "()V"),
            ),
            SymbolPair::new(
                SymbolId::class("e", "Le;"),
                SymbolId::class("Renderer", "Lcom/example/Renderer;"),
            ),
            SymbolPair::new(
                SymbolId::method("render", "b", "()V"),
                SymbolId::method("draw", "com/example/Bar", "()V"),
            ),
        ]));

        let results = index.search("Render", 10);
        let order: Vec<&str> = results.iter().map(|p| p.target.name.as_str()).collect();
        assert_eq!(order, vec!["draw", "render", "Renderer", "preRender"]);
    }

    #[test]
    fn search_dedupes_name_pairs_and_truncates() {
        let index = MappingIndex::from_pairs(into_pair_map([
            SymbolPair::new(
                SymbolId::method("a", "x", "(I)V"),
                SymbolId::method("tick", "com/example/A", "(I)V"),
            ),
            SymbolPair::new(
                SymbolId::method("a", "x", "(J)V"),
                SymbolId::method("tick", "com/example/A", "(J)V"),
            ),
            SymbolPair::new(
                SymbolId::method("b", "y", "()V"),
                SymbolId::method("ticker", "com/example/B", "()V"),
            ),
        ]));

        let results = index.search("tick", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].target.name, "tick");
        assert_eq!(results[0].target.descriptor, "(I)V");
        assert_eq!(results[1].target.name, "ticker");

        assert_eq!(index.search("tick", 1).len(), 1);
    }

    #[test]
    fn search_is_deterministic() {
        let index = sample();
        let first = index.search("a", 10);
        for _ in 0..10 {
            assert_eq!(index.search("a", 10), first);
        }
    }
}
