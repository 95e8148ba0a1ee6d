use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Prepends the given values to the list stored at `key`; the last value
/// ends up frontmost. Elements handed straight to blocked waiters do not
/// count toward the replied length.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let length = store.lpush(&self.key, self.values);

        Ok(Frame::Integer(length as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("lpush")?;

        let mut values = vec![];
        loop {
            match parser.next_bytes() {
                Ok(value) => values.push(value),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if values.is_empty() {
            return Err(CommandParserError::wrong_arity("lpush").into());
        }

        Ok(Self { key, values })
    }
}
