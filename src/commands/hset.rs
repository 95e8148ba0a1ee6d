use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Upserts the given field-value pairs into the hash stored at `key`,
/// creating the hash if it does not exist. Last write wins per field.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: String,
    pub fields: Vec<(String, Bytes)>,
}

impl Executable for Hset {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        store.hset(self.key, self.fields);

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Hset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("hset")?;

        let mut fields = vec![];
        loop {
            let field = match parser.next_string() {
                Ok(field) => field,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };
            // A field with no value means the argument count was odd.
            let value = parser.required_bytes("hset")?;
            fields.push((field, value));
        }

        if fields.is_empty() {
            return Err(CommandParserError::wrong_arity("hset").into());
        }

        Ok(Self { key, fields })
    }
}
