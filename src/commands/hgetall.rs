use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns every field and value of the hash stored at `key` as a flat
/// array of alternating field, value bulks, or a null array when the key
/// holds no fields.
///
/// Ref: <https://redis.io/docs/latest/commands/hgetall/>
#[derive(Debug, PartialEq)]
pub struct Hgetall {
    pub key: String,
}

impl Executable for Hgetall {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let hash = match store.hgetall(&self.key) {
            Some(hash) => hash,
            None => return Ok(Frame::NullArray),
        };

        let mut frames = Vec::with_capacity(hash.len() * 2);
        for (field, value) in hash {
            frames.push(Frame::Bulk(field.into()));
            frames.push(Frame::Bulk(value));
        }

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Hgetall {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.required_string("hgetall")?;
        parser.expect_end("hgetall")?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    #[tokio::test]
    async fn existing_hash() {
        let store = Store::new();
        store.hset("h".to_string(), vec![("f1".to_string(), Bytes::from("v1"))]);

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("HGETALL")),
            Frame::Bulk(Bytes::from("h")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Hgetall(Hgetall {
                key: "h".to_string()
            })
        );

        let res = cmd.exec(store.clone()).await.unwrap();

        assert_eq!(
            res,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("f1")),
                Frame::Bulk(Bytes::from("v1")),
            ])
        );
    }

    #[tokio::test]
    async fn missing_hash() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("HGETALL")),
            Frame::Bulk(Bytes::from("nope")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        let res = cmd.exec(Store::new()).await.unwrap();

        assert_eq!(res, Frame::NullArray);
    }
}
