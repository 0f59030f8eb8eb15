use std::path::Path;

use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["vg360", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["vg360", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_commands() {
    let kpis = Cli::try_parse_from(["vg360", "db", "seed-kpis"]).expect("expected valid cli args");
    assert!(matches!(
        kpis.command,
        Some(Commands::Db {
            command: DbCommands::SeedKpis
        })
    ));

    let demo = Cli::try_parse_from(["vg360", "db", "seed-demo"]).expect("expected valid cli args");
    assert!(matches!(
        demo.command,
        Some(Commands::Db {
            command: DbCommands::SeedDemo
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["vg360"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn indicators_import_takes_path_and_dry_run() {
    let cli = Cli::try_parse_from(["vg360", "indicators", "import", "june.csv", "--dry-run"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Indicators {
            command: IndicatorCommands::Import { ref path, dry_run: true }
        }) if path.as_path() == Path::new("june.csv")
    ));
}

#[test]
fn indicators_import_requires_path() {
    assert!(Cli::try_parse_from(["vg360", "indicators", "import"]).is_err());
}

#[test]
fn report_leaders_defaults() {
    let cli = Cli::try_parse_from(["vg360", "report", "leaders"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommands::Leaders {
                sort: None,
                dir: None,
                include_empty: false,
                ..
            }
        })
    ));
}

#[test]
fn report_leaders_with_half_year_and_sort() {
    let cli = Cli::try_parse_from([
        "vg360",
        "report",
        "leaders",
        "--year",
        "2025",
        "--half",
        "2",
        "--sort",
        "avg_caidas",
        "--dir",
        "asc",
        "--include-empty",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommands::Leaders {
                ref range,
                sort: Some(ref s),
                dir: Some(ref d),
                include_empty: true,
            }
        }) if range.year.as_deref() == Some("2025")
            && range.half.as_deref() == Some("2")
            && s == "avg_caidas"
            && d == "asc"
    ));
}

#[test]
fn report_export_with_dates_and_out() {
    let cli = Cli::try_parse_from([
        "vg360",
        "report",
        "export",
        "--from",
        "2025-01-01",
        "--to",
        "2025-06-30",
        "--out",
        "resumen.csv",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommands::Export { ref range, out: Some(ref out) }
        }) if range.from.as_deref() == Some("2025-01-01")
            && range.to.as_deref() == Some("2025-06-30")
            && out.as_path() == Path::new("resumen.csv")
    ));
}

#[test]
fn report_evaluation_requires_negotiator() {
    assert!(Cli::try_parse_from(["vg360", "report", "evaluation"]).is_err());

    let cli =
        Cli::try_parse_from(["vg360", "report", "evaluation", "--negotiator", "300001"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommands::Evaluation { ref negotiator }
        }) if negotiator == "300001"
    ));
}

#[test]
fn score_parses_negotiator_and_days() {
    let cli =
        Cli::try_parse_from(["vg360", "score", "--negotiator", "300001", "--days", "60"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Score {
            ref negotiator,
            days: Some(60)
        }) if negotiator == "300001"
    ));
}

#[test]
fn score_rejects_non_numeric_days() {
    assert!(
        Cli::try_parse_from(["vg360", "score", "--negotiator", "300001", "--days", "abc"])
            .is_err()
    );
}
