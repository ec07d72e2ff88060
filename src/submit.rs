//! Submission of committed configurations
//!
//! The engine hands each committed bundle to a sink and moves on: it neither
//! awaits a response nor retries. Success and failure handling belong to the
//! sink's owner.

use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use crate::config::ValueBundle;
use crate::error::TargetingError;
use crate::form::ConfigurationForm;

/// Receiver of committed configurations
pub trait SubmissionSink {
    fn submit(&mut self, bundle: &ValueBundle);
}

/// Logs each submission through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SubmissionSink for TracingSink {
    fn submit(&mut self, bundle: &ValueBundle) {
        match serde_json::to_string(bundle) {
            Ok(json) => info!("Submitting... {}", json),
            Err(e) => warn!("Failed to encode submission: {}", e),
        }
    }
}

/// Writes each submission as one line of JSON
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SubmissionSink for JsonSink<W> {
    fn submit(&mut self, bundle: &ValueBundle) {
        if let Err(e) = write_json_line(&mut self.writer, bundle) {
            warn!("Failed to write submission: {}", e);
        }
    }
}

fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Collects submissions in memory
impl SubmissionSink for Vec<ValueBundle> {
    fn submit(&mut self, bundle: &ValueBundle) {
        self.push(bundle.clone());
    }
}

/// Commit the form and hand the frozen bundle to a sink
///
/// Nothing is submitted when validation rejects the commit.
pub fn commit_and_submit(
    form: &mut ConfigurationForm,
    sink: &mut dyn SubmissionSink,
) -> Result<ValueBundle, TargetingError> {
    let bundle = form.commit()?;
    sink.submit(&bundle);
    Ok(bundle)
}
