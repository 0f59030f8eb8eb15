//! Demo data: administrators, six leaders with three negotiators each, a
//! year of monthly indicator snapshots, and one Hacer plus one Ser
//! evaluation per negotiator.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use sqlx::PgPool;
use vg360_core::{
    build_kpi_lines, hacer_score_since, IndicatorSnapshot, KpiDefinition, Role, SerRatings,
    DEFAULT_HACER_PERIOD_DAYS,
};

use crate::evaluations::{create_evaluation, NewEvaluation};
use crate::indicators::upsert_indicator_snapshots;
use crate::kpis::list_kpis;
use crate::negotiators::upsert_negotiator;
use crate::ser_evaluations::create_ser_evaluation;
use crate::users::{upsert_user, NewUser};
use crate::DbError;

const LEADER_COUNT: u32 = 6;
const TEAM_SUFFIXES: [&str; 3] = ["A", "B", "C"];
const FIRST_NEGOTIATOR_CEDULA: u32 = 300_001;
const MONTHLY_SNAPSHOTS: i64 = 12;
const DEMO_FEEDBACK: &str = "Buen avance general. Seguir fortaleciendo conversión y recaudo.";

/// Counts of what [`seed_demo`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSeedSummary {
    pub users: usize,
    pub negotiators: usize,
    pub snapshots: usize,
    pub evaluations: usize,
    pub ser_evaluations: usize,
}

/// Random measurements for one negotiator, oldest snapshot first.
#[derive(Debug, Clone)]
struct DemoNegotiator {
    cedula: String,
    name: String,
    snapshots: Vec<IndicatorSnapshot>,
    ratings: SerRatings,
}

#[derive(Debug, Clone)]
struct DemoTeam {
    leader_index: u32,
    negotiators: Vec<DemoNegotiator>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn demo_snapshot<R: Rng>(rng: &mut R, date: NaiveDate) -> IndicatorSnapshot {
    let mut snap = IndicatorSnapshot::empty(0, date);
    snap.conversion_de_ventas = Some(round_to(rng.random_range(20.0..85.0), 2));
    snap.recaudacion_mensual = Some(f64::from(rng.random_range(800_000_u32..=8_000_000)));
    snap.tiempo_hablando = Some(round_to(rng.random_range(20.0..160.0), 1));
    snap.porcentajes_cumplimiento_recaudo = Some(round_to(rng.random_range(60.0..100.0), 2));
    snap.porcentaje_cumplimiento_conversion = Some(round_to(rng.random_range(60.0..100.0), 2));
    snap.porcentaje_caidas_acuerdos = Some(round_to(rng.random_range(5.0..25.0), 2));
    snap
}

fn demo_ratings<R: Rng>(rng: &mut R) -> SerRatings {
    let mut r = || rng.random_range(3_i16..=5);
    SerRatings {
        actitud: r(),
        trabajo_en_equipo: r(),
        sentido_pertenencia: r(),
        relacionamiento: r(),
        compromiso: r(),
    }
}

/// Generate every random value up front so the database writes stay
/// deterministic for a given `rng`.
fn demo_plan<R: Rng>(rng: &mut R, today: NaiveDate) -> Vec<DemoTeam> {
    let mut next_cedula = FIRST_NEGOTIATOR_CEDULA;
    (1..=LEADER_COUNT)
        .map(|leader_index| {
            let negotiators = TEAM_SUFFIXES
                .iter()
                .map(|suffix| {
                    let cedula = next_cedula.to_string();
                    next_cedula += 1;
                    let snapshots = (0..MONTHLY_SNAPSHOTS)
                        .rev()
                        .map(|i| demo_snapshot(rng, today - Duration::days(30 * i)))
                        .collect();
                    DemoNegotiator {
                        cedula,
                        name: format!("Negociador {suffix} de Lider{leader_index}"),
                        snapshots,
                        ratings: demo_ratings(rng),
                    }
                })
                .collect();
            DemoTeam {
                leader_index,
                negotiators,
            }
        })
        .collect()
}

/// Seed the demo dataset. Users and negotiators are upserted; snapshots are
/// upserted by date; one new Hacer and one new Ser evaluation is appended
/// per negotiator on every run.
///
/// # Errors
///
/// Returns [`DbError`] if any write fails.
pub async fn seed_demo<R: Rng>(
    pool: &PgPool,
    rng: &mut R,
    today: NaiveDate,
) -> Result<DemoSeedSummary, DbError> {
    let plan = demo_plan(rng, today);
    let catalog: Vec<KpiDefinition> = list_kpis(pool)
        .await?
        .iter()
        .filter_map(|row| row.to_definition().ok())
        .collect();
    let mut summary = DemoSeedSummary::default();

    for (cedula, email, first, last) in [
        ("900000", "admin@vg360.local", "Admin", "Principal"),
        ("100001", "administrativo@vg360.local", "Ana", "Admin"),
    ] {
        upsert_user(
            pool,
            &NewUser {
                cedula,
                email,
                first_name: first,
                last_name: last,
                role: Role::Administrator,
                is_superuser: cedula == "900000",
            },
        )
        .await?;
        summary.users += 1;
    }

    for team in plan {
        let cedula = format!("20000{}", team.leader_index);
        let email = format!("lider{}@vg360.local", team.leader_index);
        let first_name = format!("Lider{}", team.leader_index);
        let leader = upsert_user(
            pool,
            &NewUser {
                cedula: &cedula,
                email: &email,
                first_name: &first_name,
                last_name: "Equipo",
                role: Role::Leader,
                is_superuser: false,
            },
        )
        .await?;
        summary.users += 1;

        for member in team.negotiators {
            let negotiator =
                upsert_negotiator(pool, &member.cedula, &member.name, leader.id).await?;
            summary.negotiators += 1;

            let snapshots: Vec<IndicatorSnapshot> = member
                .snapshots
                .into_iter()
                .map(|mut s| {
                    s.negotiator_id = negotiator.id;
                    s
                })
                .collect();
            summary.snapshots += upsert_indicator_snapshots(pool, &snapshots).await?;

            let new = NewEvaluation {
                negotiator_id: negotiator.id,
                evaluator_id: leader.id,
                overall_score: hacer_score_since(&snapshots, today, DEFAULT_HACER_PERIOD_DAYS),
                feedback: DEMO_FEEDBACK.to_string(),
                kpi_lines: build_kpi_lines(&catalog, snapshots.last()),
            };
            create_evaluation(pool, &new, 0).await?;
            summary.evaluations += 1;

            create_ser_evaluation(pool, negotiator.id, leader.id, &member.ratings, 0).await?;
            summary.ser_evaluations += 1;
        }
    }

    tracing::info!(
        users = summary.users,
        negotiators = summary.negotiators,
        snapshots = summary.snapshots,
        "demo data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn plan_has_six_teams_of_three() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = demo_plan(&mut rng, today());

        assert_eq!(plan.len(), 6);
        assert!(plan.iter().all(|t| t.negotiators.len() == 3));
        assert_eq!(plan[0].negotiators[0].cedula, "300001");
        assert_eq!(plan[5].negotiators[2].cedula, "300018");
        assert_eq!(plan[1].negotiators[1].name, "Negociador B de Lider2");
    }

    #[test]
    fn plan_snapshots_are_monthly_and_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = demo_plan(&mut rng, today());
        let member = &plan[2].negotiators[0];

        assert_eq!(member.snapshots.len(), 12);
        assert_eq!(member.snapshots.last().map(|s| s.date), Some(today()));
        assert_eq!(
            member.snapshots.first().map(|s| s.date),
            Some(today() - Duration::days(330))
        );
        for s in &member.snapshots {
            let conv = s.conversion_de_ventas.unwrap();
            assert!((20.0..=85.0).contains(&conv));
            let caidas = s.porcentaje_caidas_acuerdos.unwrap();
            assert!((5.0..=25.0).contains(&caidas));
            let recaudo = s.recaudacion_mensual.unwrap();
            assert!((800_000.0..=8_000_000.0).contains(&recaudo));
        }
        assert!(member.ratings.validate().is_ok());
        assert!(member.ratings.actitud >= 3);
    }
}
