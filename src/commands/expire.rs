use tokio::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Attaches an expiry deadline of now + `seconds` to an existing string key.
/// Replies `:1` when the deadline was set and `:0` when the key does not
/// exist. Negative or non-integer seconds are rejected before reaching the
/// store.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: u64,
}

impl Executable for Expire {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let applied = store.expire(&self.key, Duration::from_secs(self.seconds));

        Ok(Frame::Integer(i64::from(applied)))
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("expire")?;
        let seconds = parser.required_integer("expire")?;
        parser.expect_end("expire")?;

        if seconds < 0 {
            return Err(CommandParserError::NotAnInteger.into());
        }

        Ok(Self {
            key,
            seconds: seconds as u64,
        })
    }
}
