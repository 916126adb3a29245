use crate::operation::Operation;
use crate::record::TransactionRecord;
use crate::transport::Transport;
use log::{debug, warn};
use std::time::{Duration, Instant};

/// One attempted call and, when it succeeded and the body decoded, what it captured.
#[derive(Debug)]
pub struct Attempt<T> {
    pub record: TransactionRecord,
    pub output: Option<T>,
}

/// Performs a single transaction. The clock runs only around the network
/// call; serialising the request and decoding the reply are not timed.
///
/// Never fails: a transport error becomes a record with no status code.
pub fn execute<O: Operation>(op: &O, transport: &dyn Transport, input: &O::Input) -> Attempt<O::Output> {
    let path = op.path(input);
    let expected = op.expected_status();

    let body = match op.request_body(input) {
        Ok(body) => body,
        Err(e) => {
            warn!("[{}] Could not encode request for {}: {}", op.stage(), path, e);
            return Attempt {
                record: TransactionRecord::new(None, Duration::ZERO, expected),
                output: None,
            };
        }
    };

    let start = Instant::now();
    let result = transport.post_json(&path, body);
    let elapsed = start.elapsed();

    match result {
        Ok(reply) => {
            let record = TransactionRecord::new(Some(reply.status), elapsed, expected);
            debug!("[{}] {} -> {} in {:?}", op.stage(), path, reply.status, elapsed);

            let output = if record.success {
                match op.capture(input, &reply.body) {
                    Ok(output) => Some(output),
                    Err(e) => {
                        warn!("[{}] {} answered {} with an undecodable body: {}", op.stage(), path, reply.status, e);
                        None
                    }
                }
            } else {
                None
            };
            Attempt { record, output }
        }
        Err(e) => {
            debug!("[{}] {} failed after {:?}: {}", op.stage(), path, elapsed, e);
            Attempt {
                record: TransactionRecord::new(None, elapsed, expected),
                output: None,
            }
        }
    }
}
