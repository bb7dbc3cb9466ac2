use crate::{duration::TimeUnit, render::OutputFormat};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

/// figure set used when no config file is given
pub const BUILTIN_FIGURES: &str = include_str!("../figures.yaml");

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config")]
    Parse(#[from] serde_yaml::Error),
    #[error("Figure {0} is not defined")]
    UnknownFigure(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub figures: Vec<FigureConfig>,
}

/// How samples are split into panels
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// one panel per facet value, stacked vertically
    Row,
    /// one panel per facet value, side by side
    #[default]
    Column,
    /// everything in a single panel
    #[serde(rename = "none")]
    Single,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FigureConfig {
    pub name: String,
    // file name relative to the figures directory, the extension selects the image format
    pub output: PathBuf,

    // policy prefixes, the latest result file of each is part of the figure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<String>,
    // prefix of the serial/ parallel execution results, exclusive with `policies`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_modes: Option<String>,

    #[serde(default = "default_unit")]
    pub unit: TimeUnit,
    #[serde(default)]
    pub facet: Facet,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    // fraction of the largest duration added on top of the y axis
    #[serde(default = "default_headroom")]
    pub headroom: f64,
}

/// Where the samples of a figure come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    Policies(&'a [String]),
    ExecutionModes(&'a str),
}

impl FigureConfig {
    pub fn source(&self) -> Source<'_> {
        match self.execution_modes.as_deref() {
            Some(prefix) => Source::ExecutionModes(prefix),
            None => Source::Policies(&self.policies),
        }
    }

    pub fn y_label(&self) -> String {
        self.y_label
            .clone()
            .unwrap_or_else(|| format!("Duration ({})", self.unit))
    }
}

impl AnalyzerConfig {
    /// the figures shipped with the analyzer
    pub fn builtin() -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(BUILTIN_FIGURES)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let file = File::open(path)?;

        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigErrors> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// only keep the named figures, in config order
    pub fn select(&mut self, names: &[String]) -> Result<(), ConfigErrors> {
        for name in names {
            if !self.figures.iter().any(|figure| &figure.name == name) {
                error!(
                    "Figure {name} is not defined, available: {}",
                    self.figures.iter().map(|figure| &figure.name).join(", ")
                );

                return Err(ConfigErrors::UnknownFigure(name.clone()));
            }
        }

        self.figures.retain(|figure| names.contains(&figure.name));

        Ok(())
    }

    /// Validate and normalize the config, returns true if an error was found.
    ///
    /// All problems are logged before returning to make fixing a config a single round trip.
    pub fn preflight_checks(&mut self) -> bool {
        let mut contains_error = false;

        if self.figures.is_empty() {
            error!("No figure was defined, nothing to render");
            contains_error = true;
        }

        let mut names = BTreeSet::new();
        let mut outputs = BTreeSet::new();

        for figure in self.figures.iter_mut() {
            let name = figure.name.clone();

            if !names.insert(name.clone()) {
                error!("Figure {name} is defined more than once");
                contains_error = true;
            }

            if !outputs.insert(figure.output.clone()) {
                error!(
                    "figures.{name}.output ({}) is already written by another figure",
                    figure.output.display()
                );
                contains_error = true;
            }

            if OutputFormat::from_path(&figure.output).is_none() {
                error!(
                    "figures.{name}.output ({}) must end in .png or .svg",
                    figure.output.display()
                );
                contains_error = true;
            }

            match (&figure.execution_modes, figure.policies.is_empty()) {
                (None, true) => {
                    error!("Figure {name} contains neither 'policies' nor 'execution_modes', a figure can't be empty");
                    contains_error = true;
                }
                (Some(_), false) => {
                    error!("Figure {name} contains both 'policies' and 'execution_modes', pick one");
                    contains_error = true;
                }
                _ => {}
            }

            let unique = figure.policies.iter().unique().cloned().collect_vec();
            if unique.len() != figure.policies.len() {
                warn!("Figure {name} lists some policies more than once. Duplicates are ignored");
                figure.policies = unique;
            }

            if figure.width == 0 || figure.height == 0 {
                error!(
                    "figures.{name} cannot be {}x{} pixels",
                    figure.width, figure.height
                );
                contains_error = true;
            }

            if !figure.headroom.is_finite() || figure.headroom < 0.0 {
                error!(
                    "figures.{name}.headroom ({}) must be a non-negative fraction",
                    figure.headroom
                );
                contains_error = true;
            }

            if figure.y_label.is_none() {
                figure.y_label = Some(figure.y_label());
            }
        }

        contains_error
    }
}

fn default_unit() -> TimeUnit {
    TimeUnit::Milliseconds
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    500
}

fn default_x_label() -> String {
    "Transaction Count".to_owned()
}

fn default_headroom() -> f64 {
    0.1
}
