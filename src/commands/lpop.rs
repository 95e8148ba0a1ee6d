use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes and returns the front element of the list stored at `key`, or nil
/// when the list is absent or empty.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
}

impl Executable for Lpop {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.lpop(&self.key) {
            Some(value) => Ok(Frame::Bulk(value)),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("lpop")?;
        parser.expect_end("lpop")?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    #[tokio::test]
    async fn pops_front_until_empty() {
        let store = Store::new();
        store.rpush("l", vec![Bytes::from("a"), Bytes::from("b")]);

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPOP")),
            Frame::Bulk(Bytes::from("l")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let res = cmd.exec(store.clone()).await.unwrap();
        assert_eq!(res, Frame::Bulk(Bytes::from("a")));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPOP")),
            Frame::Bulk(Bytes::from("l")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let res = cmd.exec(store.clone()).await.unwrap();
        assert_eq!(res, Frame::Bulk(Bytes::from("b")));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPOP")),
            Frame::Bulk(Bytes::from("l")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let res = cmd.exec(store.clone()).await.unwrap();
        assert_eq!(res, Frame::Null);
    }
}
