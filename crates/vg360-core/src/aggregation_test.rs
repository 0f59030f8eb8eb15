use chrono::NaiveDate;

use super::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn h1_2025() -> DateRange {
    DateRange::new(d(2025, 1, 1), d(2025, 6, 30))
}

fn leader(id: i64, name: &str) -> LeaderIdentity {
    LeaderIdentity {
        id,
        cedula: format!("20000{id}"),
        name: name.to_string(),
        email: format!("lider{id}@vg360.local"),
    }
}

fn negotiator(id: i64, leader_id: i64, name: &str) -> NegotiatorIdentity {
    NegotiatorIdentity {
        id,
        cedula: format!("30000{id}"),
        name: name.to_string(),
        leader_id,
    }
}

fn snap(negotiator_id: i64, date: NaiveDate, conv: f64, caidas: f64) -> IndicatorSnapshot {
    let mut s = IndicatorSnapshot::empty(negotiator_id, date);
    s.conversion_de_ventas = Some(conv);
    s.porcentaje_caidas_acuerdos = Some(caidas);
    s
}

fn averages(conv: Option<f64>, rec: Option<f64>, cc: Option<f64>, caidas: Option<f64>) -> FieldAverages {
    FieldAverages {
        avg_conversion: conv,
        avg_cump_recaudo: rec,
        avg_cump_conv: cc,
        avg_caidas: caidas,
        ..FieldAverages::default()
    }
}

// ---------------------------------------------------------------------------
// desempeño
// ---------------------------------------------------------------------------

#[test]
fn desempeno_inverts_deal_drop() {
    let a = averages(Some(60.0), Some(60.0), Some(60.0), Some(20.0));
    assert_eq!(desempeno(&a), Some(65.0));
}

#[test]
fn desempeno_uses_only_present_components() {
    let a = averages(Some(50.0), None, None, Some(10.0));
    assert_eq!(desempeno(&a), Some(70.0));
}

#[test]
fn desempeno_clamps_deal_drop_above_100() {
    let a = averages(None, None, None, Some(130.0));
    assert_eq!(desempeno(&a), Some(0.0));
}

#[test]
fn desempeno_without_components_is_none() {
    let a = FieldAverages {
        avg_recaudo: Some(1_000_000.0),
        avg_tiempo: Some(80.0),
        ..FieldAverages::default()
    };
    assert_eq!(desempeno(&a), None);
}

// ---------------------------------------------------------------------------
// compliance
// ---------------------------------------------------------------------------

#[test]
fn compliance_below_target() {
    let c = ComplianceMetrics::compute(3, 2, 70.0);
    assert_eq!(c.pending, 1);
    assert_eq!(c.completion_pct, Some(66.67));
    assert!(c.below_target);
}

#[test]
fn compliance_at_target_is_not_below() {
    let c = ComplianceMetrics::compute(10, 7, 70.0);
    assert_eq!(c.completion_pct, Some(70.0));
    assert!(!c.below_target);
}

#[test]
fn compliance_without_team_has_no_percentage() {
    let c = ComplianceMetrics::compute(0, 0, 70.0);
    assert_eq!(c.completion_pct, None);
    assert_eq!(c.pending, 0);
    assert!(!c.below_target);
}

// ---------------------------------------------------------------------------
// leader summary
// ---------------------------------------------------------------------------

#[test]
fn leader_counts_only_negotiators_with_data() {
    let leaders = vec![leader(1, "Ana Ruiz")];
    let team = vec![negotiator(10, 1, "A"), negotiator(11, 1, "B")];
    let snaps = vec![
        snap(10, d(2025, 2, 1), 40.0, 10.0),
        snap(10, d(2025, 3, 1), 60.0, 30.0),
    ];

    let rows = leader_summary(
        &leaders,
        &team,
        &snaps,
        &HashSet::new(),
        h1_2025(),
        &LeaderSummaryOptions::default(),
    );

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.negotiators_with_data, 1);
    assert_eq!(row.averages.avg_conversion, Some(50.0));
    assert_eq!(row.averages.avg_caidas, Some(20.0));
    assert_eq!(row.averages.avg_recaudo, None);
    // mean(50, 100 - 20) = 65
    assert_eq!(row.desempeno, Some(65.0));
    assert_eq!(row.compliance.assigned_negotiators, 2);
    assert_eq!(row.team_share_pct, Some(100.0));
}

#[test]
fn out_of_range_snapshots_are_ignored() {
    let leaders = vec![leader(1, "Ana"), leader(2, "Beto")];
    let team = vec![negotiator(10, 1, "A"), negotiator(20, 2, "B")];
    let snaps = vec![
        snap(10, d(2025, 2, 1), 40.0, 10.0),
        snap(20, d(2025, 7, 1), 90.0, 5.0),
    ];

    let rows = leader_summary(
        &leaders,
        &team,
        &snaps,
        &HashSet::new(),
        h1_2025(),
        &LeaderSummaryOptions::default(),
    );

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].leader.name, "Ana");
}

#[test]
fn include_without_data_adds_null_rows() {
    let leaders = vec![leader(2, "Beto"), leader(1, "Ana")];
    let team = vec![negotiator(10, 1, "A"), negotiator(20, 2, "B")];
    let snaps = vec![snap(10, d(2025, 2, 1), 40.0, 10.0)];
    let evaluated: HashSet<i64> = [20].into_iter().collect();
    let options = LeaderSummaryOptions {
        include_without_data: true,
        ..LeaderSummaryOptions::default()
    };

    let rows = leader_summary(&leaders, &team, &snaps, &evaluated, h1_2025(), &options);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].leader.name, "Ana");
    assert_eq!(rows[1].leader.name, "Beto");
    assert_eq!(rows[1].negotiators_with_data, 0);
    assert_eq!(rows[1].desempeno, None);
    assert_eq!(rows[1].averages, FieldAverages::default());
    assert_eq!(rows[1].compliance.evaluated, 1);
    assert_eq!(rows[1].compliance.completion_pct, Some(100.0));
    assert_eq!(rows[1].team_share_pct, Some(0.0));
}

#[test]
fn team_share_splits_across_leaders() {
    let leaders = vec![leader(1, "Ana"), leader(2, "Beto")];
    let team = vec![
        negotiator(10, 1, "A"),
        negotiator(11, 1, "B"),
        negotiator(12, 1, "C"),
        negotiator(20, 2, "D"),
    ];
    let snaps = vec![
        snap(10, d(2025, 1, 5), 50.0, 10.0),
        snap(11, d(2025, 1, 5), 50.0, 10.0),
        snap(12, d(2025, 1, 5), 50.0, 10.0),
        snap(20, d(2025, 1, 5), 50.0, 10.0),
    ];

    let rows = leader_summary(
        &leaders,
        &team,
        &snaps,
        &HashSet::new(),
        h1_2025(),
        &LeaderSummaryOptions::default(),
    );

    assert_eq!(rows[0].team_share_pct, Some(75.0));
    assert_eq!(rows[1].team_share_pct, Some(25.0));
}

#[test]
fn evaluated_only_counts_own_team() {
    let leaders = vec![leader(1, "Ana")];
    let team = vec![negotiator(10, 1, "A"), negotiator(20, 2, "Z")];
    let snaps = vec![snap(10, d(2025, 1, 5), 50.0, 10.0)];
    let evaluated: HashSet<i64> = [10, 20].into_iter().collect();

    let rows = leader_summary(
        &leaders,
        &team,
        &snaps,
        &evaluated,
        h1_2025(),
        &LeaderSummaryOptions::default(),
    );

    assert_eq!(rows[0].compliance.assigned_negotiators, 1);
    assert_eq!(rows[0].compliance.evaluated, 1);
    assert_eq!(rows[0].compliance.pending, 0);
}

// ---------------------------------------------------------------------------
// drill-down
// ---------------------------------------------------------------------------

#[test]
fn drilldown_lists_every_negotiator() {
    let team = vec![negotiator(11, 1, "Zoe"), negotiator(10, 1, "Abel")];
    let snaps = vec![
        snap(10, d(2025, 3, 1), 70.0, 10.0),
        snap(10, d(2025, 3, 2), 90.0, 30.0),
        snap(10, d(2024, 3, 2), 0.0, 100.0),
    ];
    let evaluated: HashSet<i64> = [11].into_iter().collect();

    let rows = negotiator_drilldown(&team, &snaps, &evaluated, h1_2025());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].negotiator.name, "Abel");
    assert_eq!(rows[0].snapshot_count, 2);
    assert_eq!(rows[0].averages.avg_conversion, Some(80.0));
    assert_eq!(rows[0].desempeno, Some(80.0));
    assert!(!rows[0].evaluated_in_range);

    assert_eq!(rows[1].negotiator.name, "Zoe");
    assert_eq!(rows[1].snapshot_count, 0);
    assert_eq!(rows[1].desempeno, None);
    assert!(rows[1].evaluated_in_range);
}

// ---------------------------------------------------------------------------
// sorting
// ---------------------------------------------------------------------------

fn row_with(name: &str, desempeno: Option<f64>) -> NegotiatorDrilldownRow {
    NegotiatorDrilldownRow {
        negotiator: negotiator(1, 1, name),
        snapshot_count: 0,
        averages: FieldAverages::default(),
        desempeno,
        evaluated_in_range: false,
    }
}

fn names(rows: &[NegotiatorDrilldownRow]) -> Vec<&str> {
    rows.iter().map(|r| r.negotiator.name.as_str()).collect()
}

#[test]
fn nulls_last_descending() {
    let mut rows = vec![
        row_with("a", None),
        row_with("b", Some(50.0)),
        row_with("c", Some(90.0)),
        row_with("d", None),
    ];
    sort_rows(&mut rows, SortField::Desempeno, SortDirection::Desc);
    assert_eq!(names(&rows), ["c", "b", "a", "d"]);
}

#[test]
fn nulls_last_ascending() {
    let mut rows = vec![
        row_with("a", None),
        row_with("b", Some(50.0)),
        row_with("c", Some(90.0)),
        row_with("d", None),
    ];
    sort_rows(&mut rows, SortField::Desempeno, SortDirection::Asc);
    assert_eq!(names(&rows), ["b", "c", "a", "d"]);
}

#[test]
fn ties_keep_input_order() {
    let mut rows = vec![
        row_with("first", Some(70.0)),
        row_with("second", Some(70.0)),
        row_with("third", Some(80.0)),
    ];
    sort_rows(&mut rows, SortField::Desempeno, SortDirection::Desc);
    assert_eq!(names(&rows), ["third", "first", "second"]);
}

#[test]
fn sort_by_indicator_average() {
    let mut low = row_with("low", Some(99.0));
    low.averages.avg_recaudo = Some(1_000.0);
    let mut high = row_with("high", Some(1.0));
    high.averages.avg_recaudo = Some(9_000.0);
    let mut rows = vec![low, high];
    sort_rows(&mut rows, SortField::Recaudo, SortDirection::Desc);
    assert_eq!(names(&rows), ["high", "low"]);
}

#[test]
fn sort_field_parsing_falls_back_to_desempeno() {
    assert_eq!(SortField::parse_lenient(Some("avg_caidas")), SortField::Caidas);
    assert_eq!(SortField::parse_lenient(Some("nombre")), SortField::Desempeno);
    assert_eq!(SortField::parse_lenient(None), SortField::Desempeno);
    assert_eq!(SortDirection::parse_lenient(Some("asc")), SortDirection::Asc);
    assert_eq!(SortDirection::parse_lenient(Some("up")), SortDirection::Desc);
}

#[test]
fn leader_row_serializes_flat_with_nulls() {
    let options = LeaderSummaryOptions {
        include_without_data: true,
        ..LeaderSummaryOptions::default()
    };
    let rows = leader_summary(
        &[leader(1, "Ana")],
        &[],
        &[],
        &HashSet::new(),
        h1_2025(),
        &options,
    );
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["cedula"], "200001");
    assert!(json["avg_conversion"].is_null());
    assert!(json["desempeno"].is_null());
    assert!(json["team_share_pct"].is_null());
    assert!(json["compliance"]["completion_pct"].is_null());
}
