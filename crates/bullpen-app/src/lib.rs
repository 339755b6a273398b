// Library root for the `bullpen` binary: the analysis run and report
// rendering, exposed so tests can drive them without the CLI.

pub mod app;
pub mod report;
