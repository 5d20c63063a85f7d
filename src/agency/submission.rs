//! Submission coordinator
//!
//! Opens the agency file and one long-lived session, then repeats
//! read batch → serialize → send framed → await confirmation until the file
//! is exhausted.
//!
//! A confirmed batch is considered submitted; nothing is rolled back when a
//! later batch fails. Any reader or transport error stops the loop.

use std::io::{Read, Seek};

use super::errors::{ClientError, ClientResult};
use crate::config::ClientConfig;
use crate::lifecycle::Lifecycle;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::transport::{send_framed, Session};
use crate::wager::{serialize_batch, RecordBatchReader};

/// What a finished submission sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Frames acknowledged by the service
    pub batches_sent: u64,
    /// Records inside those frames
    pub records_sent: u64,
}

/// Drives one agency file through one session.
pub struct Submission<'a> {
    config: &'a ClientConfig,
    lifecycle: &'a Lifecycle,
    logger: &'a Logger,
}

impl<'a> Submission<'a> {
    pub fn new(config: &'a ClientConfig, lifecycle: &'a Lifecycle, logger: &'a Logger) -> Self {
        Self {
            config,
            lifecycle,
            logger,
        }
    }

    /// Submits the agency's input file.
    pub fn run(&self) -> ClientResult<SubmissionReport> {
        let mut reader = RecordBatchReader::open(
            &self.config.input_path(),
            self.config.agency_id.as_str(),
            self.config.batch_window(),
            self.logger.clone(),
        )?;
        self.run_with(&mut reader)
    }

    /// Submits every batch `reader` yields.
    pub fn run_with<R: Read + Seek>(
        &self,
        reader: &mut RecordBatchReader<R>,
    ) -> ClientResult<SubmissionReport> {
        if self.lifecycle.is_shutdown() {
            return Err(ClientError::Cancelled);
        }

        let mut session = Session::establish(&self.config.server_address, self.logger)?;
        self.lifecycle.register(&mut session)?;

        let result = self.submit_all(reader, &mut session);

        self.lifecycle.clear(session.id());
        session.close();

        match result {
            // A shutdown closing the socket surfaces as an I/O failure
            Err(_) if self.lifecycle.is_shutdown() => Err(ClientError::Cancelled),
            other => other,
        }
    }

    fn submit_all<R: Read + Seek>(
        &self,
        reader: &mut RecordBatchReader<R>,
        session: &mut Session,
    ) -> ClientResult<SubmissionReport> {
        let mut report = SubmissionReport::default();

        loop {
            if self.lifecycle.is_shutdown() {
                return Err(ClientError::Cancelled);
            }

            let batch = match reader.next_batch()? {
                Some(batch) => batch,
                None => {
                    log_event(
                        self.logger,
                        Severity::Info,
                        Event::EndOfInput,
                        &[("offset", &reader.offset().to_string()), ("result", "success")],
                    );
                    return Ok(report);
                }
            };

            // Every line of this window was malformed
            if batch.is_empty() {
                continue;
            }

            let payload = serialize_batch(&batch);
            send_framed(session, &payload)?;

            report.batches_sent += 1;
            report.records_sent += batch.len() as u64;
            log_event(
                self.logger,
                Severity::Info,
                Event::BatchSent,
                &[
                    ("batch", &report.batches_sent.to_string()),
                    ("bytes", &payload.len().to_string()),
                    ("records", &batch.len().to_string()),
                    ("result", "success"),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use crate::transport::{receive_exact, TransportError};
    use std::io::{Cursor, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Accepts one connection, acknowledges `acks` frames, returns payloads
    fn ack_server(acks: usize) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut payloads = Vec::new();
            while payloads.len() < acks {
                let prefix = match receive_exact(&mut conn, 4) {
                    Ok(prefix) => prefix,
                    Err(_) => break,
                };
                let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
                let payload = receive_exact(&mut conn, len as usize).unwrap();
                payloads.push(String::from_utf8(payload).unwrap());
                conn.write_all(b"ack").unwrap();
            }
            payloads
        });
        (address, server)
    }

    fn config(address: &str, window: u64) -> ClientConfig {
        ClientConfig {
            agency_id: "2".to_string(),
            server_address: address.to_string(),
            batch_byte_size: window,
            ..ClientConfig::default()
        }
    }

    fn reader(input: &str, window: usize) -> RecordBatchReader<Cursor<Vec<u8>>> {
        RecordBatchReader::from_source(
            Cursor::new(input.as_bytes().to_vec()),
            "2",
            window,
            Logger::disabled(),
        )
        .unwrap()
    }

    const INPUT: &str = "Ana,Diaz,100,1990-01-01,11\n\
                         Bruno,Paz,200,1991-02-02,22\n\
                         Carla,Sosa,300,1992-03-03,33\n";

    #[test]
    fn test_one_frame_per_batch() {
        let (address, server) = ack_server(usize::MAX);
        let config = config(&address, 60);
        let sink = MemorySink::new();
        let logger = Logger::to_writer(sink.clone(), Severity::Trace);
        let lifecycle = Lifecycle::new(logger.clone());

        let report = Submission::new(&config, &lifecycle, &logger)
            .run_with(&mut reader(INPUT, 60))
            .unwrap();

        let payloads = server.join().unwrap();
        assert_eq!(
            payloads,
            vec![
                "2|Ana|Diaz|100|1990-01-01|11;2|Bruno|Paz|200|1991-02-02|22".to_string(),
                "2|Carla|Sosa|300|1992-03-03|33".to_string(),
            ]
        );
        assert_eq!(
            report,
            SubmissionReport {
                batches_sent: 2,
                records_sent: 3
            }
        );
        assert_eq!(lifecycle.active_session(), None);

        let events: Vec<String> = sink
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].to_string())
            .collect();
        assert_eq!(
            events,
            vec!["\"connect\"", "\"batch_sent\"", "\"batch_sent\"", "\"end_of_input\""]
        );
    }

    #[test]
    fn test_all_malformed_window_is_not_sent() {
        let (address, server) = ack_server(usize::MAX);
        let config = config(&address, 4096);
        let logger = Logger::disabled();
        let lifecycle = Lifecycle::new(logger.clone());

        let report = Submission::new(&config, &lifecycle, &logger)
            .run_with(&mut reader("a,b\nc,d,e\n", 4096))
            .unwrap();

        assert_eq!(report, SubmissionReport::default());
        assert!(server.join().unwrap().is_empty());
    }

    #[test]
    fn test_missing_confirmation_aborts() {
        // Server takes the first frame and hangs up without acknowledging
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let _ = receive_exact(&mut conn, 4);
        });

        let config = config(&address, 30);
        let logger = Logger::disabled();
        let lifecycle = Lifecycle::new(logger.clone());

        let err = Submission::new(&config, &lifecycle, &logger)
            .run_with(&mut reader(INPUT, 30))
            .unwrap_err();
        server.join().unwrap();

        match err {
            ClientError::Transport(e) => assert!(e.is_protocol_failure() || matches!(e, TransportError::Io { .. })),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let config = config("127.0.0.1:1", 30);
        let logger = Logger::disabled();
        let lifecycle = Lifecycle::new(logger.clone());
        lifecycle.shutdown();

        let err = Submission::new(&config, &lifecycle, &logger)
            .run_with(&mut reader(INPUT, 30))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_largest_window_submits_whole_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("agency-2.csv"), INPUT).unwrap();
        let (address, server) = ack_server(usize::MAX);
        let mut config = config(&address, crate::wager::MAX_WINDOW as u64);
        config.dataset_dir = dir.path().to_path_buf();
        let logger = Logger::disabled();
        let lifecycle = Lifecycle::new(logger.clone());

        let report = Submission::new(&config, &lifecycle, &logger).run().unwrap();

        assert_eq!(
            report,
            SubmissionReport {
                batches_sent: 1,
                records_sent: 3
            }
        );
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config("127.0.0.1:1", 30);
        config.dataset_dir = dir.path().to_path_buf();
        let logger = Logger::disabled();
        let lifecycle = Lifecycle::new(logger.clone());

        let err = Submission::new(&config, &lifecycle, &logger).run().unwrap_err();
        assert_eq!(err.code(), "CLIENT_INPUT_OPEN_FAILED");
    }
}
