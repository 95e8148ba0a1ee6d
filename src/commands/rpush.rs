use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Appends the given values to the tail of the list stored at `key`, in the
/// order given. Unlike LPUSH, blocked waiters are not woken.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let length = store.rpush(&self.key, self.values);

        Ok(Frame::Integer(length as i64))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("rpush")?;

        let mut values = vec![];
        loop {
            match parser.next_bytes() {
                Ok(value) => values.push(value),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if values.is_empty() {
            return Err(CommandParserError::wrong_arity("rpush").into());
        }

        Ok(Self { key, values })
    }
}
