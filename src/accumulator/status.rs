use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::TrailError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    Ok,
    Warn,
    Error,
}

/// Observable health of the accumulator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub level: StatusLevel,
    pub message: String,
    pub messages_received: u64,
    pub samples_retained: u64,
    pub samples_decimated: u64,
    pub malformed_samples: u64,
    pub glyph_faults: u64,
    pub transform_failures: u64,
    pub last_fault: Option<String>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self {
            level: StatusLevel::Warn,
            message: "No messages received".to_string(),
            messages_received: 0,
            samples_retained: 0,
            samples_decimated: 0,
            malformed_samples: 0,
            glyph_faults: 0,
            transform_failures: 0,
            last_fault: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn record_received(&mut self) {
        self.messages_received += 1;
        self.level = StatusLevel::Ok;
        self.message = format!("{} messages received", self.messages_received);
    }

    pub(crate) fn record_malformed(&mut self, err: &TrailError) {
        self.messages_received += 1;
        self.malformed_samples += 1;
        self.level = StatusLevel::Error;
        self.message = "Message contained invalid floating point values (nans or infs)".to_string();
        self.last_fault = Some(err.to_string());
    }

    pub(crate) fn record_glyph_fault(&mut self, err: &TrailError) {
        self.glyph_faults += 1;
        if self.level != StatusLevel::Error {
            self.level = StatusLevel::Warn;
            self.message = err.to_string();
        }
        self.last_fault = Some(err.to_string());
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::new()
    }
}
