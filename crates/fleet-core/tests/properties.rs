use fleet_core::{classify, online_count, parse_snapshot, AgentStatus, RawGrid, SheetLayout};
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    "", " ", "Active", "Ready", "✅", "Idle", "⏸️", "Busy", "Offline", "❌", "Not Active",
    "ready", "42", "-7", "coder",
];

fn cell_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(VOCABULARY).prop_map(str::to_string),
        any::<String>(),
    ]
}

fn row_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(cell_strategy(), 0..9)
}

fn grid_strategy(rows: std::ops::Range<usize>) -> impl Strategy<Value = RawGrid> {
    prop::collection::vec(row_strategy(), rows).prop_map(RawGrid::new)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn classify_is_total(raw in any::<String>()) {
        let status = classify(&raw);
        prop_assert!(AgentStatus::ALL.contains(&status));
    }

    #[test]
    fn classify_ignores_surrounding_whitespace(raw in cell_strategy()) {
        let padded = format!("  {raw}\t");
        prop_assert_eq!(classify(&padded), classify(&raw));
    }

    #[test]
    fn online_count_never_exceeds_roster(grid in grid_strategy(0..40)) {
        let snapshot = parse_snapshot(&grid);
        prop_assert!(online_count(&snapshot) <= snapshot.agents.len());
    }

    #[test]
    fn short_grids_give_empty_snapshot(grid in grid_strategy(0..SheetLayout::FLEET_V1.min_rows)) {
        prop_assert!(parse_snapshot(&grid).is_empty());
    }

    #[test]
    fn only_full_rows_with_an_id_become_agents(grid in grid_strategy(11..40)) {
        let layout = SheetLayout::FLEET_V1;
        let expected: Vec<&Vec<String>> = grid
            .rows()
            .iter()
            .skip(layout.agent_first_row)
            .filter(|row| row.len() >= layout.agent_min_cells && !row[layout.agent.id].is_empty())
            .collect();

        let snapshot = parse_snapshot(&grid);
        prop_assert_eq!(snapshot.agents.len(), expected.len());
        for (agent, row) in snapshot.agents.iter().zip(expected) {
            prop_assert_eq!(&agent.id, &row[layout.agent.id]);
            prop_assert_eq!(&agent.raw_status, &row[layout.agent.status]);
        }
    }
}
