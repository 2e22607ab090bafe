//! End-to-end report tests for the parse -> tile -> cost -> emit pipeline.

use munch::{analyze, run_source, CostCache, Report};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn report_for(expr: &str, cache: &mut CostCache) -> Report {
    analyze(expr, cache)
        .unwrap_or_else(|e| panic!("pipeline failed for '{expr}': {e}"))
        .expect("non-blank expression")
}

/// Helper to check that output contains the expected fragments.
fn check_output_contains(output: &str, patterns: &[&str]) {
    for pattern in patterns {
        assert!(
            output.contains(pattern),
            "output missing expected pattern: '{pattern}'\nFull output:\n{output}"
        );
    }
}

#[test]
fn test_store_scenario_report() {
    init_logs();
    let mut cache = CostCache::new();
    let report = report_for("MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )", &mut cache);

    // The frame-pointer leaf tiles alone without a pattern, the address
    // computation is absorbed all the way up into the store.
    assert_eq!(report.tiles, vec!["[FP]", "[TEMP]", "[MOVE, MEM, +, CONST]"]);
    assert_eq!(report.total_cost, 6);
    assert_eq!(
        report.instructions,
        vec!["1: TEMP r1", "2: STORE M[r3 + a] <- r1"]
    );

    let text = report.to_string();
    check_output_contains(
        &text,
        &[
            "MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )",
            "└── MOVE",
            "    ├── MEM",
            "    │   └── +",
            "    │       ├── FP",
            "    │       └── CONST (a)",
            "    └── TEMP (j)",
            "Custo Total = 6",
        ],
    );
}

#[test]
fn test_block_move_scenario_report() {
    init_logs();
    let mut cache = CostCache::new();
    let report = report_for(
        "MOVE ( MEM ( / ( CONST 6 , FP ) ) , MEM ( + ( FP , CONST x ) ) )",
        &mut cache,
    );

    // Both operands are memory: the move becomes a block move and the
    // absorbed address subtrees are re-tiled as their own roots.
    assert_eq!(
        report.tiles,
        vec!["[CONST]", "[FP]", "[/]", "[FP]", "[+, CONST]", "[MOVE, MEM, MEM]"]
    );
    assert_eq!(report.total_cost, 10);
    assert_eq!(
        report.instructions,
        vec![
            "1: ADDI r1 <- r0 + 6",
            "2: DIV r1 <- r1 / r2",
            "3: ADDI r3 <- r4 + x",
            "4: MOVEM M[r1] <- M[r3]",
        ]
    );
}

#[test]
fn test_single_leaf_report_text() {
    let mut cache = CostCache::new();
    let report = report_for("TEMP x", &mut cache);
    assert_eq!(
        report.to_string(),
        "TEMP x\n└── TEMP (x)\n[TEMP]\nCusto Total = 0\n1: TEMP r1\n"
    );
}

// The unresolved-Move shape is deliberately silent: the tile exists and is
// costed, but no instruction line is produced and no error is raised.
#[test]
fn test_unresolved_move_is_a_silent_no_op() {
    let mut cache = CostCache::new();
    let report = report_for("MOVE ( TEMP a , TEMP b )", &mut cache);
    assert_eq!(report.tiles, vec!["[TEMP]", "[TEMP]", "[MOVE]"]);
    assert_eq!(report.total_cost, 2);
    assert_eq!(report.instructions, vec!["1: TEMP r1", "2: TEMP r2"]);
}

#[test]
fn test_cache_is_shared_across_expressions() {
    let mut cache = CostCache::new();
    let mut out = String::new();
    run_source(
        "+ ( TEMP a , TEMP b )\n\n+ ( TEMP c , TEMP d )\n",
        &mut cache,
        &mut out,
    )
    .unwrap();

    // Two expressions, two distinct tile shapes in total: [TEMP] and [+].
    assert_eq!(cache.len(), 2);
    check_output_contains(&out, &["Custo Total = 1"]);

    // Re-running the same expression must not change its cost.
    let first = report_for("+ ( TEMP a , TEMP b )", &mut cache).total_cost;
    let second = report_for("+ ( TEMP a , TEMP b )", &mut cache).total_cost;
    assert_eq!(first, second);
}

#[test]
fn test_faulty_line_aborts_remaining_lines() {
    let mut cache = CostCache::new();
    let mut out = String::new();
    let result = run_source(
        "TEMP a\nMOVE ( TEMP x , TEMP y\nTEMP b\n",
        &mut cache,
        &mut out,
    );

    assert!(result.is_err());
    // The report produced before the fault survives; nothing after it runs.
    check_output_contains(&out, &["TEMP a", "1: TEMP r1"]);
    assert!(!out.contains("TEMP b"));
}

#[test]
fn test_blank_lines_produce_no_report() {
    let mut cache = CostCache::new();
    let mut out = String::new();
    run_source("\n   \n\t\n", &mut cache, &mut out).unwrap();
    assert!(out.is_empty());
}
