// Property-based tests for the dependency graph.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use gridcalc::prelude::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// A small grid so that random formulas collide and form cycles often.
const GRID: i32 = 4;

#[derive(Debug, Clone)]
enum Op {
    Set(Position, String),
    Clear(Position),
}

fn arb_pos() -> impl Strategy<Value = Position> {
    (0..GRID, 0..GRID).prop_map(|(r, c)| Position::new(r, c))
}

/// Cell text: mostly formulas over the grid, sometimes numbers or text.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::collection::vec(arb_pos(), 1..4).prop_map(|refs| {
            let terms: Vec<String> = refs.iter().map(|p| p.to_string()).collect();
            format!("={}", terms.join("+"))
        }),
        1 => (0u32..100).prop_map(|n| n.to_string()),
        1 => Just("'text".to_string()),
        1 => Just(String::new()),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_pos(), arb_text()).prop_map(|(p, t)| Op::Set(p, t)),
        1 => arb_pos().prop_map(Op::Clear),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn edges(sheet: &Sheet) -> BTreeMap<Position, (Vec<Position>, Vec<Position>)> {
    sheet
        .positions()
        .map(|p| {
            let cell = sheet.get_cell(p).unwrap().unwrap();
            (p, (cell.referenced_cells(), cell.dependent_cells()))
        })
        .collect()
}

fn has_cycle(graph: &BTreeMap<Position, (Vec<Position>, Vec<Position>)>) -> bool {
    // Kahn's algorithm over forward edges
    let mut indegree: BTreeMap<Position, usize> = graph.keys().map(|p| (*p, 0)).collect();
    for (forward, _) in graph.values() {
        for target in forward {
            *indegree.entry(*target).or_default() += 1;
        }
    }
    let mut ready: Vec<Position> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(p, _)| *p)
        .collect();
    let mut seen = 0;
    while let Some(p) = ready.pop() {
        seen += 1;
        if let Some((forward, _)) = graph.get(&p) {
            for target in forward {
                let d = indegree.entry(*target).or_default();
                *d -= 1;
                if *d == 0 {
                    ready.push(*target);
                }
            }
        }
    }
    seen != indegree.len()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    /// Forward and backward edges mirror each other after any sequence of
    /// accepted and rejected mutations, and the graph never holds a cycle.
    #[test]
    fn edges_stay_symmetric_and_acyclic(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut sheet = Sheet::new();
        for op in &ops {
            let _ = match op {
                Op::Set(p, text) => sheet.set_cell(*p, text),
                Op::Clear(p) => sheet.clear_cell(*p),
            };
        }

        let graph = edges(&sheet);
        for (pos, (forward, backward)) in &graph {
            for target in forward {
                let (_, target_back) = graph.get(target).expect("referenced cell exists");
                prop_assert!(target_back.contains(pos), "{} -> {} missing back edge", pos, target);
            }
            for source in backward {
                let (source_fwd, _) = graph.get(source).expect("dependent cell exists");
                prop_assert!(source_fwd.contains(pos), "{} <- {} missing forward edge", pos, source);
            }
        }
        prop_assert!(!has_cycle(&graph));
    }

    /// A rejected mutation changes nothing observable.
    #[test]
    fn rejected_mutation_is_atomic(
        setup in prop::collection::vec(arb_op(), 1..30),
        pos in arb_pos(),
        text in arb_text(),
    ) {
        let mut sheet = Sheet::new();
        for op in &setup {
            let _ = match op {
                Op::Set(p, t) => sheet.set_cell(*p, t),
                Op::Clear(p) => sheet.clear_cell(*p),
            };
        }

        let before = edges(&sheet);
        let texts_before: BTreeMap<Position, String> = sheet
            .positions()
            .map(|p| (p, sheet.get_cell(p).unwrap().unwrap().text()))
            .collect();

        if sheet.set_cell(pos, &text).is_err() {
            prop_assert_eq!(edges(&sheet), before);
            let texts_after: BTreeMap<Position, String> = sheet
                .positions()
                .map(|p| (p, sheet.get_cell(p).unwrap().unwrap().text()))
                .collect();
            prop_assert_eq!(texts_after, texts_before);
        }
    }

    /// Memoized values always agree with a fresh, uncached sheet built from
    /// the same texts.
    #[test]
    fn cached_values_match_fresh_evaluation(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut sheet = Sheet::new();
        for (i, op) in ops.iter().enumerate() {
            let _ = match op {
                Op::Set(p, text) => sheet.set_cell(*p, text),
                Op::Clear(p) => sheet.clear_cell(*p),
            };
            // Read every few steps so caches are warm when later edits land
            if i % 3 == 0 {
                for p in sheet.positions().collect::<Vec<_>>() {
                    sheet.get_cell(p).unwrap().unwrap().value();
                }
            }
        }

        let mut fresh = Sheet::with_options(SheetOptions {
            cache_values: false,
            ..SheetOptions::default()
        });
        // Insert in dependency order: a cell's precedents exist first
        let mut pending: BTreeSet<Position> = sheet.positions().collect();
        while !pending.is_empty() {
            let before = pending.len();
            for p in pending.clone() {
                let text = sheet.get_cell(p).unwrap().unwrap().text();
                if fresh.set_cell(p, &text).is_ok() {
                    pending.remove(&p);
                }
            }
            prop_assert!(pending.len() < before, "no progress rebuilding sheet");
        }

        for p in sheet.positions() {
            let cached = sheet.get_cell(p).unwrap().unwrap().value();
            let uncached = fresh.get_cell(p).unwrap().unwrap().value();
            prop_assert_eq!(cached, uncached, "value mismatch at {}", p);
        }
    }
}
