//! Live integration tests for vg360-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/vg360-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. `DATABASE_URL` must point at a server the harness
//! may create databases on.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vg360_core::{
    DateRange, IndicatorSnapshot, KpiDefinition, KpiLine, KpiType, Role, SerRatings, Viewer,
};
use vg360_db::{
    create_evaluation, create_ser_evaluation, evaluation_stats_for_leader, get_last_evaluation,
    get_last_ser_evaluation, get_latest_snapshot, get_negotiator_by_cedula,
    get_negotiator_for_leader, get_user_by_cedula, list_evaluation_kpis, list_kpis, list_leaders,
    list_snapshots_in_range, load_drilldown_inputs, load_leader_summary_inputs, seed_demo,
    seed_kpis, upsert_indicator_snapshots, upsert_negotiator, upsert_user, DbError, NewEvaluation,
    NewUser,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_leader(pool: &sqlx::PgPool, cedula: &str, first_name: &str) -> i64 {
    let email = format!("{cedula}@vg360.test");
    upsert_user(
        pool,
        &NewUser {
            cedula,
            email: &email,
            first_name,
            last_name: "Equipo",
            role: Role::Leader,
            is_superuser: false,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("insert_leader failed for cedula '{cedula}': {e}"))
    .id
}

fn catalog() -> Vec<KpiDefinition> {
    vec![
        KpiDefinition {
            name: "Conversión de Ventas".to_string(),
            description: String::new(),
            kpi_type: KpiType::Percentage,
            min_value: 0.0,
            max_value: 100.0,
            unit: "%".to_string(),
        },
        KpiDefinition {
            name: "Porcentaje de Caídas de Acuerdos".to_string(),
            description: String::new(),
            kpi_type: KpiType::Percentage,
            min_value: 0.0,
            max_value: 100.0,
            unit: "%".to_string(),
        },
    ]
}

fn snapshot(negotiator_id: i64, date: NaiveDate, conversion: f64) -> IndicatorSnapshot {
    let mut snap = IndicatorSnapshot::empty(negotiator_id, date);
    snap.conversion_de_ventas = Some(conversion);
    snap.porcentaje_caidas_acuerdos = Some(10.0);
    snap
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// Users and negotiators
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_user_is_idempotent_by_cedula(pool: sqlx::PgPool) {
    let first = insert_leader(&pool, "200001", "Lider1").await;
    let second = insert_leader(&pool, "200001", "Lider1b").await;
    assert_eq!(first, second);

    let user = get_user_by_cedula(&pool, "200001")
        .await
        .expect("get_user_by_cedula failed")
        .expect("user should exist");
    assert_eq!(user.first_name, "Lider1b");
    assert!(matches!(user.viewer(), Ok(Viewer::Leader { .. })));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_user_rejects_malformed_cedula(pool: sqlx::PgPool) {
    let result = upsert_user(
        &pool,
        &NewUser {
            cedula: "12a",
            email: "bad@vg360.test",
            first_name: "Bad",
            last_name: "Input",
            role: Role::Leader,
            is_superuser: false,
        },
    )
    .await;
    assert!(matches!(result, Err(DbError::InvalidInput(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_leaders_excludes_administrators(pool: sqlx::PgPool) {
    insert_leader(&pool, "200002", "Beta").await;
    insert_leader(&pool, "200001", "Alfa").await;
    upsert_user(
        &pool,
        &NewUser {
            cedula: "900000",
            email: "admin@vg360.test",
            first_name: "Admin",
            last_name: "Principal",
            role: Role::Administrator,
            is_superuser: true,
        },
    )
    .await
    .expect("admin upsert failed");

    let leaders = list_leaders(&pool).await.expect("list_leaders failed");
    let names: Vec<&str> = leaders.iter().map(|l| l.first_name.as_str()).collect();
    assert_eq!(names, vec!["Alfa", "Beta"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn negotiator_lookup_is_scoped_to_leader(pool: sqlx::PgPool) {
    let owner = insert_leader(&pool, "200001", "Owner").await;
    let other = insert_leader(&pool, "200002", "Other").await;
    upsert_negotiator(&pool, "300001", "Negociador A", owner)
        .await
        .expect("upsert_negotiator failed");

    assert!(get_negotiator_for_leader(&pool, "300001", owner).await.is_ok());
    assert!(matches!(
        get_negotiator_for_leader(&pool, "300001", other).await,
        Err(DbError::NotFound)
    ));

    // Re-upserting reassigns the negotiator.
    upsert_negotiator(&pool, "300001", "Negociador A", other)
        .await
        .expect("reassign failed");
    let moved = get_negotiator_by_cedula(&pool, "300001")
        .await
        .expect("lookup failed")
        .expect("negotiator should exist");
    assert_eq!(moved.leader_id, other);
}

// ---------------------------------------------------------------------------
// Indicator snapshots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn snapshot_upsert_replaces_same_day(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let neg = upsert_negotiator(&pool, "300001", "Negociador A", leader)
        .await
        .expect("upsert_negotiator failed");

    upsert_indicator_snapshots(&pool, &[snapshot(neg.id, day(2025, 3, 1), 40.0)])
        .await
        .expect("first upsert failed");
    upsert_indicator_snapshots(&pool, &[snapshot(neg.id, day(2025, 3, 1), 55.0)])
        .await
        .expect("second upsert failed");

    let latest = get_latest_snapshot(&pool, neg.id)
        .await
        .expect("get_latest_snapshot failed")
        .expect("snapshot should exist");
    assert_eq!(latest.conversion_de_ventas, Some(55.0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn range_read_is_inclusive_and_filterable(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let a = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();
    let b = upsert_negotiator(&pool, "300002", "B", leader).await.unwrap();
    upsert_indicator_snapshots(
        &pool,
        &[
            snapshot(a.id, day(2025, 1, 1), 10.0),
            snapshot(a.id, day(2025, 6, 30), 20.0),
            snapshot(a.id, day(2025, 7, 1), 30.0),
            snapshot(b.id, day(2025, 2, 1), 40.0),
        ],
    )
    .await
    .unwrap();

    let range = DateRange::new(day(2025, 1, 1), day(2025, 6, 30));
    let all = list_snapshots_in_range(&pool, range, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let only_a = list_snapshots_in_range(&pool, range, Some(&[a.id]))
        .await
        .unwrap();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|s| s.negotiator_id == a.id));
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_evaluation_stores_lines_and_enforces_cooldown(pool: sqlx::PgPool) {
    seed_kpis(&pool, &catalog()).await.expect("seed_kpis failed");
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let neg = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();

    let new = NewEvaluation {
        negotiator_id: neg.id,
        evaluator_id: leader,
        overall_score: Some(62.5),
        feedback: "Buen avance".to_string(),
        kpi_lines: vec![
            KpiLine {
                kpi_name: "Conversión de Ventas".to_string(),
                score: 45.0,
                display: "45.0%".to_string(),
            },
            KpiLine {
                kpi_name: "Not in catalog".to_string(),
                score: 1.0,
                display: "1".to_string(),
            },
        ],
    };
    let created = create_evaluation(&pool, &new, 300)
        .await
        .expect("create_evaluation failed");

    let lines = list_evaluation_kpis(&pool, created.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].kpi_name, "Conversión de Ventas");

    let again = create_evaluation(&pool, &new, 300).await;
    assert!(matches!(
        again,
        Err(DbError::EvaluationCooldown {
            cooldown_secs: 300,
            ..
        })
    ));

    // A zero cooldown never blocks.
    create_evaluation(&pool, &new, 0)
        .await
        .expect("zero cooldown should allow a second evaluation");

    let last = get_last_evaluation(&pool, neg.id).await.unwrap().unwrap();
    assert_eq!(last.overall_score, Some(62.5));
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_kpi_line_rolls_back_the_evaluation(pool: sqlx::PgPool) {
    seed_kpis(&pool, &catalog()).await.expect("seed_kpis failed");
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let neg = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();

    sqlx::query(
        "ALTER TABLE evaluation_kpis ADD CONSTRAINT score_not_negative CHECK (score >= 0)",
    )
    .execute(&pool)
    .await
    .expect("add check constraint");

    let new = NewEvaluation {
        negotiator_id: neg.id,
        evaluator_id: leader,
        overall_score: Some(50.0),
        feedback: String::new(),
        kpi_lines: vec![
            KpiLine {
                kpi_name: "Conversión de Ventas".to_string(),
                score: 45.0,
                display: "45.0%".to_string(),
            },
            KpiLine {
                kpi_name: "Porcentaje de Caídas de Acuerdos".to_string(),
                score: -1.0,
                display: "-1.0%".to_string(),
            },
        ],
    };
    let result = create_evaluation(&pool, &new, 0).await;
    assert!(matches!(result, Err(DbError::Sqlx(_))), "{result:?}");

    let evaluations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evaluations")
        .fetch_one(&pool)
        .await
        .unwrap();
    let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evaluation_kpis")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(evaluations, 0);
    assert_eq!(lines, 0);
    assert!(get_last_evaluation(&pool, neg.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn evaluation_without_data_stores_null_score(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let neg = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();

    let new = NewEvaluation {
        negotiator_id: neg.id,
        evaluator_id: leader,
        overall_score: None,
        feedback: String::new(),
        kpi_lines: Vec::new(),
    };
    let created = create_evaluation(&pool, &new, 300).await.unwrap();
    assert!(created.overall_score.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_evaluation_for_unknown_negotiator_is_not_found(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let new = NewEvaluation {
        negotiator_id: 9_999,
        evaluator_id: leader,
        overall_score: None,
        feedback: String::new(),
        kpi_lines: Vec::new(),
    };
    assert!(matches!(
        create_evaluation(&pool, &new, 300).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn ser_evaluation_round_trip_and_cooldown(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let neg = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();
    let ratings = SerRatings::new(5, 4, 4, 3, 4).unwrap();

    create_ser_evaluation(&pool, neg.id, leader, &ratings, 300)
        .await
        .expect("create_ser_evaluation failed");
    let last = get_last_ser_evaluation(&pool, neg.id).await.unwrap().unwrap();
    assert!((last.average() - 4.0).abs() < f64::EPSILON);

    assert!(matches!(
        create_ser_evaluation(&pool, neg.id, leader, &ratings, 300).await,
        Err(DbError::EvaluationCooldown { .. })
    ));

    let bad = SerRatings {
        actitud: 6,
        ..ratings
    };
    assert!(matches!(
        create_ser_evaluation(&pool, neg.id, leader, &bad, 0).await,
        Err(DbError::InvalidInput(_))
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn evaluation_stats_include_never_evaluated(pool: sqlx::PgPool) {
    let leader = insert_leader(&pool, "200001", "Lider1").await;
    let a = upsert_negotiator(&pool, "300001", "A", leader).await.unwrap();
    let b = upsert_negotiator(&pool, "300002", "B", leader).await.unwrap();
    let new = NewEvaluation {
        negotiator_id: a.id,
        evaluator_id: leader,
        overall_score: Some(50.0),
        feedback: String::new(),
        kpi_lines: Vec::new(),
    };
    create_evaluation(&pool, &new, 0).await.unwrap();

    let stats = evaluation_stats_for_leader(&pool, leader).await.unwrap();
    assert_eq!(stats.len(), 2);
    let of_b = stats.iter().find(|s| s.negotiator_id == b.id).unwrap();
    assert_eq!(of_b.evaluation_count, 0);
    assert!(of_b.last_evaluation.is_none());
    let of_a = stats.iter().find(|s| s.negotiator_id == a.id).unwrap();
    assert_eq!(of_a.evaluation_count, 1);
}

// ---------------------------------------------------------------------------
// Dashboard loaders and seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_loaders_scope_by_leader(pool: sqlx::PgPool) {
    let today = Utc::now().date_naive();
    let one = insert_leader(&pool, "200001", "Uno").await;
    let two = insert_leader(&pool, "200002", "Dos").await;
    let a = upsert_negotiator(&pool, "300001", "A", one).await.unwrap();
    let b = upsert_negotiator(&pool, "300002", "B", two).await.unwrap();
    upsert_indicator_snapshots(
        &pool,
        &[snapshot(a.id, today, 50.0), snapshot(b.id, today, 60.0)],
    )
    .await
    .unwrap();
    for (neg, leader) in [(a.id, one), (b.id, two)] {
        let new = NewEvaluation {
            negotiator_id: neg,
            evaluator_id: leader,
            overall_score: None,
            feedback: String::new(),
            kpi_lines: Vec::new(),
        };
        create_evaluation(&pool, &new, 0).await.unwrap();
    }

    let range = DateRange::new(today - Duration::days(7), today);
    let summary = load_leader_summary_inputs(&pool, range).await.unwrap();
    assert_eq!(summary.leaders.len(), 2);
    assert_eq!(summary.snapshots.len(), 2);
    assert_eq!(summary.evaluated.len(), 2);

    let drill = load_drilldown_inputs(&pool, one, range).await.unwrap();
    assert_eq!(drill.team.len(), 1);
    assert_eq!(drill.snapshots.len(), 1);
    assert!(drill.evaluated.contains(&a.id));
    assert!(!drill.evaluated.contains(&b.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_kpis_upserts_by_name(pool: sqlx::PgPool) {
    let mut kpis = catalog();
    assert_eq!(seed_kpis(&pool, &kpis).await.unwrap(), 2);

    kpis[0].unit = "pct".to_string();
    seed_kpis(&pool, &kpis).await.unwrap();

    let rows = list_kpis(&pool).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].unit, "pct");
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_demo_builds_six_teams(pool: sqlx::PgPool) {
    seed_kpis(&pool, &catalog()).await.unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let today = Utc::now().date_naive();

    let summary = seed_demo(&pool, &mut rng, today).await.expect("seed_demo failed");
    assert_eq!(summary.users, 8);
    assert_eq!(summary.negotiators, 18);
    assert_eq!(summary.snapshots, 18 * 12);
    assert_eq!(summary.evaluations, 18);
    assert_eq!(summary.ser_evaluations, 18);

    let neg = get_negotiator_by_cedula(&pool, "300001").await.unwrap().unwrap();
    let last = get_last_evaluation(&pool, neg.id).await.unwrap().unwrap();
    assert!(last.overall_score.is_some());
    let lines = list_evaluation_kpis(&pool, last.id).await.unwrap();
    assert_eq!(lines.len(), 2);
}
