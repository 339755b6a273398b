// Season loading and cleaning.
//
// Each season is stored as two Baseball-Reference CSV exports in the data
// directory: `{year}-reliever.csv` (relief usage) and `{year}-value.csv`
// (salary and run value). They are joined on (Name, Age, Tm) and filtered
// down to pitchers who mostly worked in relief.

use bullpen_core::config::{Config, FilterConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::schema::{ReliefPitcher, Season};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

// Cells are read as text because the exports repeat their header row inside
// the body and leave blanks where a stat does not apply. Extra columns are
// ignored.

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawReliever {
    Name: String,
    Age: String,
    Tm: String,
    G: String,
    GR: String,
    #[serde(rename = "SV%", default)]
    SvPct: String,
    #[serde(rename = "IS%", default)]
    IsPct: String,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawValue {
    Name: String,
    Age: String,
    Tm: String,
    #[serde(default)]
    Salary: String,
    RA9: String,
    RAA: String,
    RAR: String,
    WAA: String,
    WAR: String,
}

/// Relief usage for one (Name, Age, Tm).
#[derive(Debug, Clone, PartialEq)]
struct RelieverLine {
    name: String,
    age: u32,
    team: String,
    games: u32,
    games_relieved: u32,
    save_pct: Option<f64>,
    inherited_scored_pct: Option<f64>,
}

/// Salary and run value for one (Name, Age, Tm).
#[derive(Debug, Clone, PartialEq)]
struct ValueLine {
    name: String,
    age: u32,
    team: String,
    salary: f64,
    ra9: f64,
    raa: f64,
    rar: f64,
    waa: f64,
    war: f64,
}

type JoinKey = (String, u32, String);

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

fn is_header_repeat(name: &str) -> bool {
    name.trim() == "Name"
}

fn parse_count(field: &str, raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| format!("{field} '{}' is not a whole number", raw.trim()))
}

fn parse_number(field: &str, raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{field} '{}' is not a finite number", raw.trim())),
    }
}

/// `"$1,250,000"` -> 1250000. `None` for a blank cell.
fn parse_salary(raw: &str) -> Result<Option<f64>, String> {
    let digits: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(format!("Salary '{}' is not a dollar amount", raw.trim())),
    }
}

/// Percent cell to a fraction: `"85.7%"` and `"85.7"` both give 0.857.
/// Blank or unparseable cells are missing.
fn parse_pct(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let number = s.strip_suffix('%').unwrap_or(s).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v / 100.0)
}

fn reliever_line(raw: &RawReliever) -> Result<RelieverLine, String> {
    Ok(RelieverLine {
        name: raw.Name.trim().to_string(),
        age: parse_count("Age", &raw.Age)?,
        team: raw.Tm.trim().to_string(),
        games: parse_count("G", &raw.G)?,
        games_relieved: parse_count("GR", &raw.GR)?,
        save_pct: parse_pct(&raw.SvPct),
        inherited_scored_pct: parse_pct(&raw.IsPct),
    })
}

fn value_line(raw: &RawValue, salary: f64) -> Result<ValueLine, String> {
    Ok(ValueLine {
        name: raw.Name.trim().to_string(),
        age: parse_count("Age", &raw.Age)?,
        team: raw.Tm.trim().to_string(),
        salary,
        ra9: parse_number("RA9", &raw.RA9)?,
        raa: parse_number("RAA", &raw.RAA)?,
        rar: parse_number("RAR", &raw.RAR)?,
        waa: parse_number("WAA", &raw.WAA)?,
        war: parse_number("WAR", &raw.WAR)?,
    })
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn relievers_from_reader<R: Read>(rdr: R) -> Result<Vec<RelieverLine>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut lines = Vec::new();
    for result in reader.deserialize::<RawReliever>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed reliever row: {}", e);
                continue;
            }
        };
        if is_header_repeat(&raw.Name) {
            continue;
        }
        match reliever_line(&raw) {
            Ok(line) => lines.push(line),
            Err(msg) => warn!("skipping reliever '{}': {}", raw.Name.trim(), msg),
        }
    }
    Ok(lines)
}

fn values_from_reader<R: Read>(rdr: R) -> Result<Vec<ValueLine>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut lines = Vec::new();
    for result in reader.deserialize::<RawValue>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed value row: {}", e);
                continue;
            }
        };
        if is_header_repeat(&raw.Name) {
            continue;
        }
        let salary = match parse_salary(&raw.Salary) {
            Ok(Some(salary)) => salary,
            Ok(None) => {
                debug!("dropping '{}': no salary", raw.Name.trim());
                continue;
            }
            Err(msg) => {
                warn!("skipping value row '{}': {}", raw.Name.trim(), msg);
                continue;
            }
        };
        match value_line(&raw, salary) {
            Ok(line) => lines.push(line),
            Err(msg) => warn!("skipping value row '{}': {}", raw.Name.trim(), msg),
        }
    }
    Ok(lines)
}

// ---------------------------------------------------------------------------
// Join and filter
// ---------------------------------------------------------------------------

/// Inner join on (Name, Age, Tm), then keep pitchers with
/// `GR% > min_relief_fraction` and `GR > min_games_relieved`.
fn join_and_filter(
    relievers: Vec<RelieverLine>,
    values: Vec<ValueLine>,
    filter: &FilterConfig,
) -> Vec<ReliefPitcher> {
    let mut by_key: HashMap<JoinKey, ValueLine> = HashMap::with_capacity(values.len());
    for v in values {
        let key = (v.name.clone(), v.age, v.team.clone());
        if by_key.contains_key(&key) {
            warn!(
                "duplicate value row for '{}' (age {}, {}), keeping the first",
                v.name, v.age, v.team
            );
            continue;
        }
        by_key.insert(key, v);
    }

    let mut unmatched = 0usize;
    let mut pitchers = Vec::new();
    for r in relievers {
        let Some(v) = by_key.get(&(r.name.clone(), r.age, r.team.clone())) else {
            unmatched += 1;
            continue;
        };
        let pitcher = ReliefPitcher {
            name: r.name,
            team: r.team,
            age: r.age,
            salary: v.salary,
            games: r.games,
            games_relieved: r.games_relieved,
            save_pct: r.save_pct,
            inherited_scored_pct: r.inherited_scored_pct,
            ra9: v.ra9,
            raa: v.raa,
            rar: v.rar,
            waa: v.waa,
            war: v.war,
        };
        if pitcher.games == 0 || pitcher.games_relieved > pitcher.games {
            warn!(
                "skipping '{}': GR {} with G {}",
                pitcher.name, pitcher.games_relieved, pitcher.games
            );
            continue;
        }
        if pitcher.relief_fraction() > filter.min_relief_fraction
            && pitcher.games_relieved > filter.min_games_relieved
        {
            pitchers.push(pitcher);
        }
    }
    if unmatched > 0 {
        debug!(unmatched, "reliever rows without a salary match");
    }
    pitchers
}

fn build_season(
    year: u16,
    relievers: Vec<RelieverLine>,
    values: Vec<ValueLine>,
    filter: &FilterConfig,
) -> Result<Season, LoadError> {
    let pitchers = join_and_filter(relievers, values, filter);
    if pitchers.is_empty() {
        return Err(LoadError::Validation(format!(
            "season {year}: no relief pitchers left after joining and filtering"
        )));
    }
    Season::new(year, pitchers).map_err(|e| LoadError::Validation(e.to_string()))
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Paths of the reliever and value exports for `year` inside `dir`.
pub fn season_files(dir: &Path, year: u16) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{year}-reliever.csv")),
        dir.join(format!("{year}-value.csv")),
    )
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> LoadError + '_ {
    move |e| LoadError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load, join and filter one season from `dir`.
pub fn load_season(dir: &Path, year: u16, filter: &FilterConfig) -> Result<Season, LoadError> {
    let (reliever_path, value_path) = season_files(dir, year);
    let relievers = relievers_from_reader(open(&reliever_path)?).map_err(csv_error(&reliever_path))?;
    let values = values_from_reader(open(&value_path)?).map_err(csv_error(&value_path))?;
    debug!(
        year,
        relievers = relievers.len(),
        values = values.len(),
        "read season tables"
    );
    build_season(year, relievers, values, filter)
}

/// Load every season named in the config, in config order.
pub fn load_seasons(config: &Config) -> Result<Vec<Season>, LoadError> {
    let dir = Path::new(&config.data.dir);
    config
        .data
        .seasons
        .iter()
        .map(|&year| {
            let season = load_season(dir, year, &config.filter)?;
            info!(year, pitchers = season.len(), "loaded season");
            Ok(season)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FilterConfig {
        FilterConfig::default()
    }

    // -- Cell parsing --

    #[test]
    fn salary_strips_dollar_and_commas() {
        assert_eq!(parse_salary("$1,250,000"), Ok(Some(1_250_000.0)));
        assert_eq!(parse_salary(" 545000 "), Ok(Some(545_000.0)));
        assert_eq!(parse_salary(""), Ok(None));
        assert!(parse_salary("n/a").is_err());
        assert!(parse_salary("-$5").is_err());
    }

    #[test]
    fn pct_cells() {
        assert!((parse_pct("85.7%").unwrap() - 0.857).abs() < 1e-12);
        assert!((parse_pct("25").unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(parse_pct("25"), parse_pct("25%"));
        assert_eq!(parse_pct(" 40 % "), Some(0.4));
        assert_eq!(parse_pct(""), None);
        assert_eq!(parse_pct("  "), None);
        assert_eq!(parse_pct("--%"), None);
    }

    // -- Reliever table --

    #[test]
    fn reliever_rows_parsed() {
        let csv_data = "\
Rk,Name,Age,Tm,G,GR,SV%,IS%
1,Josh Hader,25,MIL,61,61,86%,25.0%
2,Kirby Yates,32,SDP,60,60,,";

        let lines = relievers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Josh Hader");
        assert_eq!(lines[0].team, "MIL");
        assert_eq!((lines[0].games, lines[0].games_relieved), (61, 61));
        assert!((lines[0].save_pct.unwrap() - 0.86).abs() < 1e-12);
        assert!((lines[0].inherited_scored_pct.unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(lines[1].save_pct, None);
        assert_eq!(lines[1].inherited_scored_pct, None);
    }

    #[test]
    fn repeated_header_rows_dropped() {
        let csv_data = "\
Name,Age,Tm,G,GR,SV%,IS%
Josh Hader,25,MIL,61,61,86%,25%
Name,Age,Tm,G,GR,SV%,IS%
Kirby Yates,32,SDP,60,60,92%,30%";

        let lines = relievers_from_reader(csv_data.as_bytes()).unwrap();
        let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Josh Hader", "Kirby Yates"]);
    }

    #[test]
    fn malformed_reliever_rows_skipped() {
        let csv_data = "\
Name,Age,Tm,G,GR,SV%,IS%
Josh Hader,25,MIL,sixty,61,86%,25%
Kirby Yates,32,SDP,60,60,92%,30%
Short Row,30";

        let lines = relievers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Kirby Yates");
    }

    // -- Value table --

    #[test]
    fn value_rows_parsed_and_blank_salary_dropped() {
        let csv_data = "\
Name,Age,Tm,G,Salary,RA9,RAA,RAR,WAA,WAR
Josh Hader,25,MIL,61,\"$687,600\",2.62,14,21,1.4,2.3
Minor Leaguer,24,MIL,5,,9.00,-3,-2,-0.3,-0.2
Name,Age,Tm,G,Salary,RA9,RAA,RAR,WAA,WAR";

        let lines = values_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].salary, 687_600.0);
        assert!((lines[0].war - 2.3).abs() < f64::EPSILON);
        assert!((lines[0].raa - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn value_row_with_bad_metric_skipped() {
        let csv_data = "\
Name,Age,Tm,Salary,RA9,RAA,RAR,WAA,WAR
Josh Hader,25,MIL,$687600,inf,14,21,1.4,2.3
Kirby Yates,32,SDP,$3062500,1.67,22,28,2.5,3.4";

        let lines = values_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Kirby Yates");
    }

    #[test]
    fn empty_csv_returns_empty_vec() {
        let csv_data = "Name,Age,Tm,G,GR,SV%,IS%\n";
        assert!(relievers_from_reader(csv_data.as_bytes()).unwrap().is_empty());
    }

    // -- Join and filter --

    fn reliever(name: &str, age: u32, team: &str, g: u32, gr: u32) -> RelieverLine {
        RelieverLine {
            name: name.into(),
            age,
            team: team.into(),
            games: g,
            games_relieved: gr,
            save_pct: None,
            inherited_scored_pct: None,
        }
    }

    fn value(name: &str, age: u32, team: &str, salary: f64) -> ValueLine {
        ValueLine {
            name: name.into(),
            age,
            team: team.into(),
            salary,
            ra9: 3.5,
            raa: 2.0,
            rar: 8.0,
            waa: 0.2,
            war: 0.8,
        }
    }

    #[test]
    fn join_matches_on_name_age_and_team() {
        let relievers = vec![
            reliever("A", 30, "NYY", 60, 60),
            reliever("A", 30, "BOS", 40, 40),
            reliever("B", 28, "NYY", 50, 50),
        ];
        let values = vec![value("A", 30, "NYY", 1.0e6), value("B", 29, "NYY", 2.0e6)];
        let joined = join_and_filter(relievers, values, &filter());
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].team, "NYY");
        assert_eq!(joined[0].salary, 1.0e6);
    }

    #[test]
    fn duplicate_value_key_keeps_first() {
        let relievers = vec![reliever("A", 30, "NYY", 60, 60)];
        let values = vec![value("A", 30, "NYY", 1.0e6), value("A", 30, "NYY", 9.0e6)];
        let joined = join_and_filter(relievers, values, &filter());
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].salary, 1.0e6);
    }

    #[test]
    fn relief_filter_is_strict() {
        let relievers = vec![
            reliever("Starter", 30, "NYY", 32, 2),
            reliever("Swingman", 30, "NYY", 20, 10),
            reliever("Cup of coffee", 30, "NYY", 5, 5),
            reliever("Six", 30, "NYY", 6, 6),
            reliever("Closer", 30, "NYY", 60, 60),
        ];
        let values = ["Starter", "Swingman", "Cup of coffee", "Six", "Closer"]
            .iter()
            .map(|n| value(n, 30, "NYY", 1.0e6))
            .collect();
        let joined = join_and_filter(relievers, values, &filter());
        let names: Vec<&str> = joined.iter().map(|p| p.name.as_str()).collect();
        // GR% of exactly 0.5 and GR of exactly 5 both fail.
        assert_eq!(names, vec!["Six", "Closer"]);
    }

    #[test]
    fn filter_thresholds_configurable() {
        let relievers = vec![reliever("Swingman", 30, "NYY", 20, 10)];
        let values = vec![value("Swingman", 30, "NYY", 1.0e6)];
        let loose = FilterConfig {
            min_games_relieved: 0,
            min_relief_fraction: 0.25,
        };
        assert_eq!(join_and_filter(relievers, values, &loose).len(), 1);
    }

    #[test]
    fn gr_exceeding_g_skipped() {
        let relievers = vec![reliever("Bad", 30, "NYY", 10, 20)];
        let values = vec![value("Bad", 30, "NYY", 1.0e6)];
        assert!(join_and_filter(relievers, values, &filter()).is_empty());
    }

    #[test]
    fn empty_season_is_validation_error() {
        let relievers = vec![reliever("Starter", 30, "NYY", 32, 0)];
        let values = vec![value("Starter", 30, "NYY", 1.0e6)];
        let err = build_season(2019, relievers, values, &filter()).unwrap_err();
        assert!(matches!(err, LoadError::Validation(msg) if msg.contains("2019")));
    }

    #[test]
    fn season_files_named_by_year() {
        let (r, v) = season_files(Path::new("data"), 2017);
        assert_eq!(r, Path::new("data/2017-reliever.csv"));
        assert_eq!(v, Path::new("data/2017-value.csv"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = std::env::temp_dir().join("bullpen-no-such-dir");
        let err = load_season(&dir, 2019, &filter()).unwrap_err();
        assert!(matches!(err, LoadError::Io { path, .. } if path.ends_with("2019-reliever.csv")));
    }
}
