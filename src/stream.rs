//! JSON-lines transport
//!
//! A reader thread decodes one record per line and hands records over a
//! bounded channel, one at a time, to a driver loop that owns the
//! accumulator calls.
//!
//! ```text
//! {"type":"odometry","timestamp":0.0,"frame_id":"odom","position":[0,0,0],"orientation":[0,0,0,1],"covariance":[...36 values...]}
//! {"type":"config","config":{"shape":"axes","keep":50}}
//! {"type":"reset"}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::accumulator::{SampleOutcome, SharedAccumulator};
use crate::backend::RenderBackend;
use crate::config::DisplayConfig;
use crate::error::{TrailError, TrailResult};
use crate::types::OdometryMessage;

pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    Odometry(OdometryMessage),
    /// Stream discontinuity
    Reset,
    Enable,
    Disable,
    Config { config: DisplayConfig },
}

/// Counts gathered by [`drive`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DriveSummary {
    pub records: u64,
    pub retained: u64,
    pub decimated: u64,
    pub rejected: u64,
    pub resets: u64,
    pub config_updates: u64,
    pub decode_errors: u64,
}

/// Open a log file, transparently decompressing `.gz`
pub fn open_log(path: &Path) -> TrailResult<Box<dyn BufRead + Send>> {
    let file = File::open(path)
        .map_err(|e| TrailError::Stream(format!("{}: {}", path.display(), e)))?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Decode one line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> TrailResult<Option<LogRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| TrailError::Stream(e.to_string()))
}

/// Start the reader thread
///
/// Decode failures are forwarded and reading continues; an I/O failure is
/// forwarded and ends the stream. The thread exits early if the receiver is
/// dropped.
pub fn spawn_reader<R>(
    reader: R,
    capacity: usize,
) -> (Receiver<TrailResult<LogRecord>>, JoinHandle<()>)
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = bounded(capacity);
    let handle = thread::spawn(move || {
        for (n, line) in reader.lines().enumerate() {
            let item = match line {
                Ok(line) => match parse_line(&line) {
                    Ok(Some(record)) => Ok(record),
                    Ok(None) => continue,
                    Err(e) => Err(TrailError::Stream(format!("line {}: {}", n + 1, e))),
                },
                Err(e) => {
                    let _ = tx.send(Err(TrailError::Stream(e.to_string())));
                    break;
                }
            };
            if tx.send(item).is_err() {
                debug!("record receiver dropped, stopping reader");
                break;
            }
        }
    });
    (rx, handle)
}

/// Deliver one record to the accumulator
pub fn apply<B: RenderBackend>(
    accumulator: &SharedAccumulator<B>,
    record: LogRecord,
    summary: &mut DriveSummary,
) -> TrailResult<()> {
    summary.records += 1;
    match record {
        LogRecord::Odometry(message) => match accumulator.on_message(&message)? {
            SampleOutcome::Retained(_) | SampleOutcome::RetainedWithoutGlyph(_) => {
                summary.retained += 1
            }
            SampleOutcome::Decimated => summary.decimated += 1,
            SampleOutcome::Rejected => summary.rejected += 1,
        },
        LogRecord::Reset => {
            summary.resets += 1;
            accumulator.on_reset()?;
        }
        LogRecord::Enable => accumulator.on_enable()?,
        LogRecord::Disable => accumulator.on_disable()?,
        LogRecord::Config { config } => {
            summary.config_updates += 1;
            let changes = accumulator.replace_config(config)?;
            info!("Configuration updated: {:?}", changes);
        }
    }
    Ok(())
}

/// Consume records until the channel closes
pub fn drive<B: RenderBackend>(
    records: &Receiver<TrailResult<LogRecord>>,
    accumulator: &SharedAccumulator<B>,
) -> TrailResult<DriveSummary> {
    let mut summary = DriveSummary::default();
    for item in records.iter() {
        match item {
            Ok(record) => apply(accumulator, record, &mut summary)?,
            Err(e) => {
                warn!("{}", e);
                summary.decode_errors += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::OdometryAccumulator;
    use crate::backend::{NodeKind, RecordingBackend};
    use crate::config::ShapeKind;
    use std::io::{Cursor, Write};

    fn odometry_line(t: f64, x: f64) -> String {
        let message = OdometryMessage {
            timestamp: t,
            frame_id: "odom".to_string(),
            position: [x, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            covariance: vec![0.0; 36],
        };
        serde_json::to_string(&LogRecord::Odometry(message)).unwrap()
    }

    fn shared() -> SharedAccumulator<RecordingBackend> {
        SharedAccumulator::new(OdometryAccumulator::new(
            RecordingBackend::new(),
            DisplayConfig::default(),
        ))
    }

    #[test]
    fn test_parse_record_kinds() {
        assert!(matches!(
            parse_line(r#"{"type":"reset"}"#),
            Ok(Some(LogRecord::Reset))
        ));
        assert!(matches!(parse_line("   "), Ok(None)));
        assert!(matches!(parse_line("# comment"), Ok(None)));

        let record = parse_line(r#"{"type":"config","config":{"shape":"axes","keep":7}}"#)
            .unwrap()
            .unwrap();
        match record {
            LogRecord::Config { config } => {
                assert_eq!(config.shape, ShapeKind::Axes);
                assert_eq!(config.keep, 7);
                assert_eq!(config.position_tolerance, 0.1);
            }
            other => panic!("unexpected record {:?}", other),
        }

        assert!(matches!(
            parse_line(r#"{"type":"teleport"}"#),
            Err(TrailError::Stream(_))
        ));
    }

    #[test]
    fn test_drive_feeds_accumulator() {
        let mut log = String::new();
        for (i, x) in [0.0, 0.05, 1.0, 2.0].iter().enumerate() {
            log.push_str(&odometry_line(i as f64, *x));
            log.push('\n');
        }
        log.push_str("not json\n");
        log.push_str(r#"{"type":"config","config":{"shape":"axes"}}"#);
        log.push('\n');

        let (rx, reader) = spawn_reader(Cursor::new(log.into_bytes()), 2);
        let acc = shared();
        let summary = drive(&rx, &acc).unwrap();
        reader.join().unwrap();

        assert_eq!(summary.records, 5);
        assert_eq!(summary.retained, 3);
        assert_eq!(summary.decimated, 1);
        assert_eq!(summary.decode_errors, 1);
        assert_eq!(summary.config_updates, 1);
        assert_eq!(
            acc.with(|a| a.backend().live(NodeKind::Axes)).unwrap(),
            3
        );
    }

    #[test]
    fn test_reset_record_clears_history() {
        let log = format!("{}\n{{\"type\":\"reset\"}}\n", odometry_line(0.0, 0.0));
        let (rx, reader) = spawn_reader(Cursor::new(log.into_bytes()), CHANNEL_CAPACITY);
        let acc = shared();
        let summary = drive(&rx, &acc).unwrap();
        reader.join().unwrap();

        assert_eq!(summary.resets, 1);
        assert_eq!(acc.with(|a| a.history().len()).unwrap(), 0);
    }

    #[test]
    fn test_open_gzip_log() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let path = std::env::temp_dir().join(format!("odometry_trail_{}.jsonl.gz", std::process::id()));
        {
            let file = File::create(&path).unwrap();
            let mut gz = GzEncoder::new(file, Compression::default());
            writeln!(gz, "{}", odometry_line(0.0, 0.0)).unwrap();
            gz.finish().unwrap();
        }

        let reader = open_log(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        std::fs::remove_file(&path).ok();
        assert_eq!(lines.len(), 1);
        assert!(matches!(parse_line(&lines[0]), Ok(Some(LogRecord::Odometry(_)))));

        assert!(open_log(Path::new("/nonexistent/odometry.jsonl")).is_err());
    }
}
