//! The sink: one comma-joined line per successfully processed user.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use crate::acquire::{BundleKind, SessionBundle};
use crate::config::{Settings, SinkMode};

#[derive(Debug, Error, Clone)]
pub enum RecordError {
    #[error("Sink I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The acquirer produced a bundle the sink's schema cannot hold.
    #[error("Bundle kind mismatch: sink records {expected:?}, got {got:?}")]
    BundleMismatch { expected: BundleKind, got: BundleKind },
}

/// Appends output records to the sink file in a fixed column order.
///
/// The column set is committed when the recorder is opened, from the bundle
/// kind the active strategy produces; the header (truncate mode only) lists
/// exactly those columns. Missing optional fields become empty columns so the
/// arity never drifts within a run.
pub struct Recorder {
    file: File,
    kind: BundleKind,
    path: PathBuf,
}

impl Recorder {
    pub fn open(settings: &Settings, kind: BundleKind) -> Result<Self, RecordError> {
        let io_err = |e: std::io::Error| RecordError::Io {
            path: settings.sink_path.display().to_string(),
            message: e.to_string(),
        };

        let file = match settings.sink_mode {
            SinkMode::Truncate => File::create(&settings.sink_path).map_err(io_err)?,
            SinkMode::Append => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.sink_path)
                .map_err(io_err)?,
        };

        let mut recorder = Self {
            file,
            kind,
            path: settings.sink_path.clone(),
        };

        if settings.sink_mode == SinkMode::Truncate {
            let header = recorder.header_fields(settings).join(",");
            recorder.write_line(&header)?;
        }

        Ok(recorder)
    }

    fn header_fields(&self, settings: &Settings) -> Vec<String> {
        let mut fields = vec!["username".to_string(), "password".to_string()];
        match self.kind {
            BundleKind::Cookies => {
                let names = &settings.cookie_names;
                fields.push(names.session.clone());
                fields.push(names.http_info.clone());
                fields.push(names.session_expiry.clone());
            }
            BundleKind::Tokens => {
                fields.push("access_token".to_string());
                fields.push("refresh_token".to_string());
                fields.push("id_token".to_string());
            }
        }
        fields
    }

    /// Append one row for `username`. A bundle of the wrong kind is refused
    /// rather than written with a shifted schema.
    pub fn record(
        &mut self,
        username: &str,
        password: &str,
        bundle: &SessionBundle,
    ) -> Result<(), RecordError> {
        let row = match (self.kind, bundle) {
            (BundleKind::Cookies, SessionBundle::Cookies(cookies)) => [
                username,
                password,
                cookies.session.as_deref().unwrap_or(""),
                cookies.http_info.as_deref().unwrap_or(""),
                cookies.session_expiry.as_deref().unwrap_or(""),
            ]
            .join(","),
            (BundleKind::Tokens, SessionBundle::Tokens(tokens)) => [
                username,
                password,
                tokens.access_token.as_str(),
                tokens.refresh_token.as_str(),
                tokens.id_token.as_str(),
            ]
            .join(","),
            (expected, bundle) => {
                return Err(RecordError::BundleMismatch {
                    expected,
                    got: bundle.kind(),
                });
            }
        };

        self.write_line(&row)?;
        tracing::debug!(username, "record written");
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), RecordError> {
        let io_err = |e: std::io::Error| RecordError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };
        writeln!(self.file, "{line}").map_err(io_err)?;
        // Each row lands on disk as soon as it is complete; an aborted run
        // keeps everything recorded so far.
        self.file.flush().map_err(io_err)
    }
}
