use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets the given keys to their respective values, replacing existing
/// values. A trailing key without a value (an odd argument count) is a
/// wrong-arity error.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Mset {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        for (key, value) in self.pairs {
            store.set(key, value);
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut pairs = vec![];

        loop {
            let key = match parser.next_string() {
                Ok(key) => key,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };
            // A key with no value means the argument count was odd.
            let value = parser.required_bytes("mset")?;
            pairs.push((key, value));
        }

        if pairs.is_empty() {
            return Err(CommandParserError::wrong_arity("mset").into());
        }

        Ok(Self { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[tokio::test]
    async fn insert_many() {
        let store = Store::new();

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("MSET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("value1")),
            Frame::Bulk(Bytes::from("key2")),
            Frame::Bulk(Bytes::from("value2")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Mset(Mset {
                pairs: vec![
                    (String::from("key1"), Bytes::from("value1")),
                    (String::from("key2"), Bytes::from("value2")),
                ]
            })
        );

        let res = cmd.exec(store.clone()).await.unwrap();

        assert_eq!(res, Frame::Simple("OK".to_string()));
        assert_eq!(store.get("key1"), Some(Bytes::from("value1")));
        assert_eq!(store.get("key2"), Some(Bytes::from("value2")));
    }

    #[test]
    fn odd_argument_count() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("MSET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("value1")),
            Frame::Bulk(Bytes::from("dangling")),
        ]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::WrongNumberOfArguments {
                command: "mset".to_string()
            }
        );
    }

    #[test]
    fn no_pairs() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("MSET"))]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::WrongNumberOfArguments {
                command: "mset".to_string()
            }
        );
    }
}
