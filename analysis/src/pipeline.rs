use crate::{
    collector::{latest_csv, DiscoveryError},
    config::{AnalyzerConfig, FigureConfig, Source},
    render::{render_figure, RenderError},
    results::{load_mode_frame, load_policy_frame, LoadError, ResultFrame},
};
use itertools::Itertools;
use rayon::prelude::*;
use std::{
    error::Error as StdError,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to discover result files")]
    Discovery(#[from] DiscoveryError),
    #[error("Failed to load results")]
    Load(#[from] LoadError),
    #[error("Failed to render figure")]
    Render(#[from] RenderError),
    #[error("Failed to create figures directory")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub enum Outcome {
    Rendered(PathBuf),
    /// no results were found for the figure
    Skipped,
    Failed(PipelineError),
}

/// outcome of every figure, in config order
#[derive(Debug)]
pub struct Report {
    pub outcomes: Vec<(String, Outcome)>,
}

impl Report {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, Outcome::Failed(_)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Outcome)> {
        self.outcomes.iter()
    }

    pub fn rendered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Outcome::Rendered(_)))
            .count()
    }
}

/// `error` followed by all of its sources, separated by `: `
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// Load everything a figure shows, `None` if there is no result file for it at all
pub fn collect_frame(
    figure: &FigureConfig,
    results: &Path,
) -> Result<Option<ResultFrame>, PipelineError> {
    match figure.source() {
        Source::Policies(policies) => {
            let mut frames = Vec::new();

            for policy in policies {
                if let Some(path) = latest_csv(policy, results)? {
                    info!(policy = %policy, path = ?path, "Using result file");
                    frames.push(load_policy_frame(&path, figure.unit)?);
                }
            }

            if frames.is_empty() {
                warn!("no results found for {} policies", policies.iter().join(", "));

                return Ok(None);
            }

            Ok(Some(ResultFrame::concat(frames)))
        }
        Source::ExecutionModes(prefix) => match latest_csv(prefix, results)? {
            Some(path) => {
                info!(path = ?path, "Using execution mode result file");

                Ok(Some(load_mode_frame(&path, figure.unit)?))
            }
            None => {
                warn!("no results found for {prefix} execution modes");

                Ok(None)
            }
        },
    }
}

#[tracing::instrument(skip_all, fields(figure = %figure.name))]
pub fn run_figure(figure: &FigureConfig, results: &Path, figures: &Path) -> Outcome {
    let frame = match collect_frame(figure, results) {
        Ok(Some(frame)) if !frame.is_empty() => frame,
        Ok(Some(_)) => {
            warn!("Result files for {} contain no rows", figure.name);

            return Outcome::Skipped;
        }
        Ok(None) => return Outcome::Skipped,
        Err(error) => {
            error!(error = ?error, "Failed to collect results: {error}");

            return Outcome::Failed(error);
        }
    };

    let path = figures.join(&figure.output);

    match render_figure(&frame, figure, &path) {
        Ok(()) => {
            info!(path = ?path, samples = frame.len(), "Wrote figure");

            Outcome::Rendered(path)
        }
        Err(error) => {
            error!(error = ?error, path = ?path, "Failed to render: {error}");

            Outcome::Failed(error.into())
        }
    }
}

/// Render all figures of `config` from `results` into `figures`, figures are drawn in parallel
pub fn generate(
    config: &AnalyzerConfig,
    results: &Path,
    figures: &Path,
) -> Result<Report, PipelineError> {
    fs::create_dir_all(figures)?;

    let outcomes = config
        .figures
        .par_iter()
        .map(|figure| (figure.name.clone(), run_figure(figure, results, figures)))
        .collect();

    Ok(Report { outcomes })
}
