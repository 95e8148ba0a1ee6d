use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Pops the front element of the first of `keys` that has data, blocking
/// until an element is pushed or the timeout elapses. The reply is a
/// two-element array of the key and the value, or a null array on timeout.
///
/// The timeout is a whole number of seconds and is always finite: `0` is a
/// valid, immediately-expiring wait, not "block forever" as in Redis proper.
///
/// Ref: <https://redis.io/docs/latest/commands/blpop/>
#[derive(Debug, PartialEq)]
pub struct Blpop {
    pub keys: Vec<String>,
    pub timeout: Duration,
}

impl Executable for Blpop {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let (waiter, mut rx) = mpsc::channel(1);

        // Single atomic step: either pop from the first key holding data, or
        // leave one delivery slot registered under every candidate key.
        if let Some((key, value)) = store.lpop_any_or_register(&self.keys, waiter) {
            return Ok(reply(key, value));
        }

        match timeout(self.timeout, rx.recv()).await {
            Ok(Some((key, value))) => Ok(reply(key, value)),
            // `None` means the store dropped our senders, which it never
            // does before delivering; treat it like a timeout. The timed-out
            // slots stay registered until a later push detects and discards
            // them.
            Ok(None) | Err(_) => Ok(Frame::NullArray),
        }
    }
}

fn reply(key: String, value: Bytes) -> Frame {
    Frame::Array(vec![Frame::Bulk(Bytes::from(key)), Frame::Bulk(value)])
}

impl TryFrom<&mut CommandParser> for Blpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut args = vec![];
        loop {
            match parser.next_string() {
                Ok(arg) => args.push(arg),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        // The trailing argument is the timeout; at least one key must
        // precede it.
        let seconds = match args.pop() {
            Some(raw) if !args.is_empty() => raw
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger)?,
            _ => return Err(CommandParserError::wrong_arity("blpop").into()),
        };

        // A negative timeout expires immediately, like zero.
        let timeout = Duration::from_secs(seconds.max(0) as u64);

        Ok(Self {
            keys: args,
            timeout,
        })
    }
}
