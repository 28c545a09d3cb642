//! Run configuration.
//!
//! The CLI layer builds an [`IterationConfig`] and the lifecycle only ever sees this struct,
//! already validated. Nothing here knows how the values were obtained.

use chrono::Weekday;
use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_ITERATIONS_TO_KEEP: usize = 10;
pub const DEFAULT_FIRST_DAY_OF_SPRINT: Weekday = Weekday::Mon;

/// Problems found before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("personal access token is empty")]
    MissingToken,

    #[error("account URI must use http or https: {0}")]
    UnsupportedScheme(String),

    #[error("year {0} is out of range (1..=9999)")]
    YearOutOfRange(i32),

    #[error("at least one team is required")]
    NoTeams,

    #[error("team names cannot be blank")]
    BlankTeam,

    #[error("project name is empty")]
    MissingProject,

    #[error("root iteration path is empty")]
    MissingRootPath,

    #[error("number of iterations to keep must be positive")]
    NothingToKeep,

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
}

/// Everything a run needs, supplied once at start and never mutated.
#[derive(Clone)]
pub struct IterationConfig {
    pub pat: String,
    pub account_uri: Url,
    pub year: i32,
    pub teams: Vec<String>,
    pub project: String,
    /// Root iteration path relative to the project's iteration root, e.g. `Release`.
    pub root_iteration_path: String,
    pub iterations_to_keep: usize,
    pub first_day_of_sprint: Weekday,
    pub only_create_if_future: bool,
}

impl IterationConfig {
    /// Configuration with defaults for the optional settings.
    pub fn new(
        pat: impl Into<String>,
        account_uri: Url,
        year: i32,
        teams: Vec<String>,
        project: impl Into<String>,
        root_iteration_path: impl Into<String>,
    ) -> Self {
        Self {
            pat: pat.into(),
            account_uri,
            year,
            teams,
            project: project.into(),
            root_iteration_path: root_iteration_path.into(),
            iterations_to_keep: DEFAULT_ITERATIONS_TO_KEEP,
            first_day_of_sprint: DEFAULT_FIRST_DAY_OF_SPRINT,
            only_create_if_future: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pat.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if !matches!(self.account_uri.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(self.account_uri.to_string()));
        }
        if !(1..=9999).contains(&self.year) {
            return Err(ConfigError::YearOutOfRange(self.year));
        }
        if self.teams.is_empty() {
            return Err(ConfigError::NoTeams);
        }
        if self.teams.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::BlankTeam);
        }
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingProject);
        }
        if crate::paths::segments(&self.root_iteration_path).next().is_none() {
            return Err(ConfigError::MissingRootPath);
        }
        if self.iterations_to_keep == 0 {
            return Err(ConfigError::NothingToKeep);
        }
        Ok(())
    }

    /// Year bucket name, e.g. `2024`.
    pub fn year_name(&self) -> String {
        self.year.to_string()
    }
}

// The token never reaches logs.
impl std::fmt::Debug for IterationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationConfig")
            .field("pat", &"***")
            .field("account_uri", &self.account_uri.as_str())
            .field("year", &self.year)
            .field("teams", &self.teams)
            .field("project", &self.project)
            .field("root_iteration_path", &self.root_iteration_path)
            .field("iterations_to_keep", &self.iterations_to_keep)
            .field("first_day_of_sprint", &self.first_day_of_sprint)
            .field("only_create_if_future", &self.only_create_if_future)
            .finish()
    }
}

/// Parses a weekday name: `Monday`, `monday` and `mon` are all accepted.
pub fn parse_weekday(s: &str) -> Result<Weekday, ConfigError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::UnknownWeekday(s.to_string()))
}
