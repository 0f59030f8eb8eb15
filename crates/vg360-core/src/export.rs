use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregation::LeaderSummaryRow;
use crate::scoring::{round2, ScoreBreakdown};

pub const LEADER_SUMMARY_HEADERS: [&str; 11] = [
    "Cédula Líder",
    "Nombre Líder",
    "Email",
    "Negociadores",
    "Conv. Ventas (%)",
    "Recaudo ($)",
    "Tiempo Hablando (h)",
    "Cumpl. Recaudo (%)",
    "Cumpl. Conversión (%)",
    "Caídas Acuerdos (%)",
    "Desempeño",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| round2(v).to_string()).unwrap_or_default()
}

/// Write one spreadsheet row per leader. Missing values become empty cells.
///
/// # Errors
///
/// Returns `csv::Error` if writing to `writer` fails.
pub fn write_leader_summary_csv<W: Write>(
    rows: &[LeaderSummaryRow],
    writer: W,
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(LEADER_SUMMARY_HEADERS)?;

    for row in rows {
        let a = &row.averages;
        out.write_record([
            row.leader.cedula.clone(),
            row.leader.name.clone(),
            row.leader.email.clone(),
            row.negotiators_with_data.to_string(),
            cell(a.avg_conversion),
            cell(a.avg_recaudo),
            cell(a.avg_tiempo),
            cell(a.avg_cump_recaudo),
            cell(a.avg_cump_conv),
            cell(a.avg_caidas),
            cell(row.desempeno),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// A KPI line as printed on an evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportKpi {
    pub name: String,
    pub value: f64,
}

/// Everything a renderer needs for the "final evaluation with feedback" document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub negotiator_name: String,
    pub negotiator_cedula: String,
    pub leader_name: String,
    pub leader_email: String,
    pub evaluated_at: DateTime<Utc>,
    pub kpis: Vec<ReportKpi>,
    pub scores: ScoreBreakdown,
    pub feedback: Option<String>,
}

impl EvaluationReport {
    /// Suggested download name, `evaluacion_<cedula>.pdf`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("evaluacion_{}.pdf", self.negotiator_cedula)
    }

    /// Fixed-width plain-text rendition, used by the CLI.
    #[must_use]
    pub fn to_text(&self) -> String {
        use std::fmt::Write as _;

        let score = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

        let mut s = String::new();
        let _ = writeln!(s, "Evaluación Final con Retroalimentación");
        let _ = writeln!(
            s,
            "Negociador: {} (Cédula: {})",
            self.negotiator_name, self.negotiator_cedula
        );
        let _ = writeln!(s, "Líder: {} ({})", self.leader_name, self.leader_email);
        let _ = writeln!(s, "Fecha: {}", self.evaluated_at.format("%d/%m/%Y %H:%M"));
        let _ = writeln!(s);
        let _ = writeln!(s, "{:<45} {:>10}", "Indicador", "Valor (%)");
        for kpi in &self.kpis {
            let _ = writeln!(s, "{:<45} {:>10.2}", kpi.name, kpi.value);
        }
        let _ = writeln!(s);
        let _ = writeln!(s, "{:<45} {:>10}", "Hacer (0-100)", score(self.scores.hacer));
        let _ = writeln!(s, "{:<45} {:>10}", "Ser (x20 → 0-100)", score(self.scores.ser));
        let _ = writeln!(s, "{:<45} {:>10}", "Total (70/30)", score(self.scores.total));
        if let Some(feedback) = self.feedback.as_deref().filter(|f| !f.trim().is_empty()) {
            let _ = writeln!(s);
            let _ = writeln!(s, "Retroalimentación");
            let _ = writeln!(s, "{feedback}");
        }
        s
    }
}
