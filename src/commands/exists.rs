use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Replies `:1` if `key` holds a string value and `:0` otherwise. Only the
/// string namespace is consulted.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub key: String,
}

impl Executable for Exists {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let exists = store.exists(&self.key);

        Ok(Frame::Integer(i64::from(exists)))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("exists")?;
        parser.expect_end("exists")?;
        Ok(Self { key })
    }
}
