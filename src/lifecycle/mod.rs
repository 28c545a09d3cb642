//! The sprint iteration lifecycle: one run, four phases.
//!
//! ```text
//! Connect → ScanRetention → SynthesizeAndAssign → Unassign → Done
//! ```
//!
//! The retention scan reads team assignments before anything is created, so iterations made
//! by this run are never candidates for removal. Phases are not transactional: a failure stops
//! the run where it is, and a re-run converges because every mutation is an upsert, an
//! assignment or an unassignment.

pub mod retention;
pub mod synthesize;
pub mod teams;

use std::fmt;

use chrono::NaiveDate;

use crate::client::{ClientError, WorkTracking};
use crate::config::IterationConfig;
use crate::models::{ClassificationNode, ConnectionData};

pub use retention::{scan, select_for_unassignment, RetentionPlan};
pub use synthesize::{ensure_year_iteration, SprintSynthesizer};
pub use teams::{assign_iterations, unassign_iterations};

/// Phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    ScanRetention,
    SynthesizeAndAssign,
    Unassign,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ScanRetention => "scan_retention",
            Self::SynthesizeAndAssign => "synthesize_and_assign",
            Self::Unassign => "unassign",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a run changed.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Names of the sprint iterations created, in creation order.
    pub created: Vec<String>,
    /// Missing sprints left alone because they already finished.
    pub skipped: Vec<String>,
    /// Assignment calls issued.
    pub assignments: usize,
    /// Unassignment calls issued.
    pub unassignments: usize,
    pub retention: RetentionPlan,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created {} sprint iteration(s)", self.created.len())?;
        for name in &self.created {
            writeln!(f, "  + {}", name)?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped {} past sprint iteration(s)", self.skipped.len())?;
        }
        writeln!(f, "Issued {} team assignment(s)", self.assignments)?;
        write!(f, "Unassigned {} past iteration(s)", self.unassignments)
    }
}

/// Today's local date, the reference point for "finished" iterations.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Runs every phase once against `client`.
///
/// `config` must already be validated. Any remote failure aborts the remaining phases and is
/// returned as is.
pub async fn run<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
    today: NaiveDate,
) -> Result<RunReport, ClientError> {
    connect(client).await?;

    let retention = scan(client, config, today).await?;

    let (created, skipped) = synthesize_and_assign(client, config, today).await?;

    let unassignments = unassign_iterations(client, config, &retention).await?;

    let report = RunReport {
        assignments: created.len() * config.teams.len(),
        created: created.into_iter().map(|node| node.name).collect(),
        skipped,
        unassignments,
        retention,
    };
    tracing::info!(
        phase = %Phase::Done,
        created = report.created.len(),
        assignments = report.assignments,
        unassigned = report.unassignments,
        "run complete"
    );
    Ok(report)
}

#[tracing::instrument(skip_all, fields(phase = %Phase::Connect))]
async fn connect<C: WorkTracking>(client: &C) -> Result<ConnectionData, ClientError> {
    tracing::info!("connecting");
    let connection = client.connect().await?;
    tracing::info!(user = %connection.authenticated_user.display_name(), "connected");
    Ok(connection)
}

#[tracing::instrument(skip_all, fields(phase = %Phase::SynthesizeAndAssign, year = config.year))]
async fn synthesize_and_assign<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
    today: NaiveDate,
) -> Result<(Vec<ClassificationNode>, Vec<String>), ClientError> {
    let mut synthesizer = SprintSynthesizer::prepare(client, config, today).await?;
    let created = assign_iterations(client, config, &mut synthesizer).await?;
    Ok((created, synthesizer.skipped().to_vec()))
}
