// bullpen entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only the report)
// 2. Load config
// 3. Load and clean the configured seasons
// 4. Run per-season and pooled analyses
// 5. Print the report

use bullpen_app::{app, report};
use bullpen_baseball::{load_seasons, AggregateAnalyzer, CohortComparator, Column};
use bullpen_core::config;

use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("bullpen starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} seasons from {}, {}th percentile split",
        config.data.seasons.len(),
        config.data.dir,
        config.analysis.percentile
    );
    let metrics = app::parse_metrics(&config.analysis.metrics)
        .context("invalid metric in [analysis] metrics")?;

    // 3. Load seasons
    let seasons = load_seasons(&config).context("failed to load season data")?;
    let comparator = CohortComparator::new(Column::Salary, config.analysis.t_test);
    let analyzer =
        AggregateAnalyzer::new(seasons, comparator).context("failed to assemble seasons")?;
    info!("Loaded data: {}", analyzer.describe());

    // 4. Run analyses
    let mut rng = app::build_rng(config.bootstrap.seed);
    if config.bootstrap.seed.is_none() {
        info!("No bootstrap seed configured, intervals will vary between runs");
    }
    let report =
        app::run(&analyzer, &config, &metrics, &mut rng).context("analysis failed")?;

    // 5. Print the report
    let rendered =
        report::render(&report, config.output.format).context("failed to render report")?;
    println!("{rendered}");

    info!("bullpen finished");
    Ok(())
}

/// Initialize tracing to stderr, filtered by `RUST_LOG` when set.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bullpen=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
