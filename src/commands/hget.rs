use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the value of `field` in the hash stored at `key`, or nil when
/// either the key or the field is absent.
///
/// Ref: <https://redis.io/docs/latest/commands/hget/>
#[derive(Debug, PartialEq)]
pub struct Hget {
    pub key: String,
    pub field: String,
}

impl Executable for Hget {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.hget(&self.key, &self.field) {
            Some(value) => Ok(Frame::Bulk(value)),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Hget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("hget")?;
        let field = parser.required_string("hget")?;
        parser.expect_end("hget")?;

        Ok(Self { key, field })
    }
}
