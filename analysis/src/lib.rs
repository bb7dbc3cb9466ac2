//! Turns the CSV files written by the transaction benchmarks into figures.
//!
//! Result files are discovered per policy ([`collector`]), their durations normalized to a
//! single unit ([`duration`]), concatenated ([`results`]) and drawn as facetted scatter plots
//! ([`render`]). [`pipeline`] ties this together for every figure of an [`config::AnalyzerConfig`].

pub mod collector;
pub mod config;
pub mod duration;
pub mod pipeline;
pub mod render;
pub mod results;

#[cfg(test)]
mod collector_test;
#[cfg(test)]
mod results_test;
