use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the string value of `key`. Replies `:1` if the key existed and
/// `:0` otherwise.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub key: String,
}

impl Executable for Del {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let deleted = store.del(&self.key);

        Ok(Frame::Integer(i64::from(deleted)))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("del")?;
        parser.expect_end("del")?;
        Ok(Self { key })
    }
}
