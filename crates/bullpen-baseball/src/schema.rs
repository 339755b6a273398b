// Typed season dataset: one row per relief pitcher, validated once on entry.

use serde::{Serialize, Serializer};
use std::str::FromStr;

use crate::AnalysisError;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Numeric columns a cohort analysis can split on or compare.
///
/// Labels follow the Baseball-Reference table headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Salary,
    Age,
    /// G
    Games,
    /// GR
    GamesRelieved,
    /// GR% = GR / G
    ReliefFraction,
    /// SV%, save opportunities converted. Missing for pitchers without a save opportunity.
    SavePct,
    /// IS%, inherited runners scored. Missing for pitchers who never inherited a runner.
    InheritedScoredPct,
    Ra9,
    Raa,
    Rar,
    Waa,
    War,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Salary,
        Column::Age,
        Column::Games,
        Column::GamesRelieved,
        Column::ReliefFraction,
        Column::SavePct,
        Column::InheritedScoredPct,
        Column::Ra9,
        Column::Raa,
        Column::Rar,
        Column::Waa,
        Column::War,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::Salary => "Salary",
            Column::Age => "Age",
            Column::Games => "G",
            Column::GamesRelieved => "GR",
            Column::ReliefFraction => "GR%",
            Column::SavePct => "SV%",
            Column::InheritedScoredPct => "IS%",
            Column::Ra9 => "RA9",
            Column::Raa => "RAA",
            Column::Rar => "RAR",
            Column::Waa => "WAA",
            Column::War => "WAR",
        }
    }

    /// Whether a row may legitimately lack a value for this column.
    pub fn is_optional(self) -> bool {
        matches!(self, Column::SavePct | Column::InheritedScoredPct)
    }

    /// Percentage columns, stored as fractions in [0, 1].
    pub fn is_fraction(self) -> bool {
        matches!(self, Column::SavePct | Column::InheritedScoredPct)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Column {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown column '{wanted}'")))
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One relief pitcher's season line joined with the salary table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliefPitcher {
    pub name: String,
    pub team: String,
    pub age: u32,
    pub salary: f64,
    pub games: u32,
    pub games_relieved: u32,
    pub save_pct: Option<f64>,
    pub inherited_scored_pct: Option<f64>,
    pub ra9: f64,
    pub raa: f64,
    pub rar: f64,
    pub waa: f64,
    pub war: f64,
}

impl ReliefPitcher {
    /// Share of appearances made in relief.
    pub fn relief_fraction(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.games_relieved) / f64::from(self.games)
    }

    /// Typed accessor for any analyzable column.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Salary => Some(self.salary),
            Column::Age => Some(f64::from(self.age)),
            Column::Games => Some(f64::from(self.games)),
            Column::GamesRelieved => Some(f64::from(self.games_relieved)),
            Column::ReliefFraction => Some(self.relief_fraction()),
            Column::SavePct => self.save_pct,
            Column::InheritedScoredPct => self.inherited_scored_pct,
            Column::Ra9 => Some(self.ra9),
            Column::Raa => Some(self.raa),
            Column::Rar => Some(self.rar),
            Column::Waa => Some(self.waa),
            Column::War => Some(self.war),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.games == 0 {
            return Err("G must be greater than 0".into());
        }
        if self.games_relieved > self.games {
            return Err(format!(
                "GR ({}) exceeds G ({})",
                self.games_relieved, self.games
            ));
        }
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Err(format!("salary must be finite and non-negative, got {}", self.salary));
        }
        for column in Column::ALL {
            if let Some(v) = self.value(column) {
                if !v.is_finite() {
                    return Err(format!("{column} is not finite ({v})"));
                }
                if column.is_fraction() && !(0.0..=1.0).contains(&v) {
                    return Err(format!("{column} must be a fraction in [0, 1], got {v}"));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Season dataset
// ---------------------------------------------------------------------------

/// All qualifying relief pitchers for one season. Read-only once built.
#[derive(Debug, Clone)]
pub struct Season {
    year: u16,
    pitchers: Vec<ReliefPitcher>,
}

impl Season {
    /// Build a season, rejecting it if any row breaks the schema.
    pub fn new(year: u16, pitchers: Vec<ReliefPitcher>) -> Result<Self, AnalysisError> {
        if pitchers.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "season {year} has no pitchers"
            )));
        }
        for p in &pitchers {
            p.validate().map_err(|msg| {
                AnalysisError::InvalidInput(format!("season {year}, {} ({}): {msg}", p.name, p.team))
            })?;
        }
        Ok(Self { year, pitchers })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn pitchers(&self) -> &[ReliefPitcher] {
        &self.pitchers
    }

    pub fn len(&self) -> usize {
        self.pitchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitchers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
