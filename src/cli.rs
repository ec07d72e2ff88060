//! CLI subcommands
//!
//! Thin wrappers over the library so the engine can be driven without a
//! rendering layer: catalog inspection, scripted editing sessions and
//! document validation.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::{validate_document, CapabilityResolver, FieldErrors};
use crate::error::TargetingError;
use crate::form::{ConfigurationForm, Event, FormState, SetFieldOutcome};
use crate::settings::Settings;
use crate::submit::{commit_and_submit, SubmissionSink};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List publishers and their plans
    Publishers,

    /// Print a publisher's capability map
    Capabilities {
        /// Publisher id
        publisher: String,
    },

    /// Print the presets scoped to a publisher
    Presets {
        /// Publisher id
        publisher: String,
    },

    /// Replay a YAML event script against a fresh form and print the final state
    Run {
        /// Path to the script
        script: PathBuf,
    },

    /// Validate a YAML or JSON configuration document
    Validate {
        /// Path to the document
        file: PathBuf,
    },
}

/// One step of an editing script
///
/// Both variants read the same `action` tag, so a script mixes form events
/// and session actions freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Edit(Event),
    Session(SessionAction),
}

/// Baseline operations available to scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    Commit,
    Discard,
}

/// Outcome of a replayed script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub state: FormState,
    pub submitted: usize,
    pub rejected_edits: Vec<String>,
    pub failed_commits: Vec<FieldErrors>,
}

/// Run a subcommand, writing results to `out`
///
/// Returns `false` when the command completed but found problems (for
/// example an invalid document), so the caller can set a failing exit code.
pub fn handle_command(
    command: &Command,
    catalog: Arc<Catalog>,
    settings: &Settings,
    sink: &mut dyn SubmissionSink,
    out: &mut dyn Write,
) -> Result<bool> {
    match command {
        Command::Publishers => {
            for publisher in catalog.publishers() {
                writeln!(out, "{}\t{}\t{}", publisher.id, publisher.plan, publisher.name)?;
            }
            Ok(true)
        }
        Command::Capabilities { publisher } => {
            let capabilities = CapabilityResolver::new(&catalog).resolve(publisher)?;
            write_json(out, &capabilities)?;
            Ok(true)
        }
        Command::Presets { publisher } => {
            write_json(out, &catalog.presets(publisher))?;
            Ok(true)
        }
        Command::Run { script } => {
            let steps = load_script(script)?;
            let mut form = ConfigurationForm::initialize_with_policy(
                catalog,
                &settings.default_publisher,
                settings.preset_on_publisher_change,
            )?;
            let report = run_script(&mut form, &steps, sink)?;
            write_json(out, &report)?;
            Ok(true)
        }
        Command::Validate { file } => {
            let errors = validate_file(file)?;
            if errors.is_empty() {
                info!("{:?} is valid", file);
            }
            write_json(out, &errors)?;
            Ok(errors.is_empty())
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {:?}", path))?;
    serde_yaml::from_str(&yaml).with_context(|| format!("failed to parse script {:?}", path))
}

/// Validate a configuration document on disk
pub fn validate_file(path: &Path) -> Result<FieldErrors> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document {:?}", path))?;
    // YAML is a superset of JSON, so one parser covers both
    let document: serde_json::Value = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse document {:?}", path))?;
    Ok(validate_document(&document))
}

/// Replay steps in order
///
/// Rejected edits and failed commits are recorded and the script continues;
/// unknown publisher or preset ids abort it.
pub fn run_script(
    form: &mut ConfigurationForm,
    steps: &[ScriptStep],
    sink: &mut dyn SubmissionSink,
) -> Result<ScriptReport, TargetingError> {
    let mut submitted = 0;
    let mut rejected_edits = Vec::new();
    let mut failed_commits = Vec::new();

    for step in steps {
        match step {
            ScriptStep::Edit(event) => {
                if let SetFieldOutcome::Rejected(rejection) = form.dispatch(event)? {
                    rejected_edits.push(rejection.to_string());
                }
            }
            ScriptStep::Session(SessionAction::Commit) => match commit_and_submit(form, sink) {
                Ok(_) => submitted += 1,
                Err(TargetingError::Validation { fields }) => {
                    warn!("Script commit rejected with {} error(s)", fields.len());
                    failed_commits.push(fields);
                }
                Err(other) => return Err(other),
            },
            ScriptStep::Session(SessionAction::Discard) => form.discard(),
        }
    }

    Ok(ScriptReport {
        state: form.state(),
        submitted,
        rejected_edits,
        failed_commits,
    })
}
