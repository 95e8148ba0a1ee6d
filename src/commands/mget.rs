use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the values of all specified keys, with a null for every key that
/// does not hold a string value.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Executable for Mget {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        let values = self
            .keys
            .iter()
            .map(|key| match store.get(key) {
                Some(value) => Frame::Bulk(value),
                None => Frame::Null,
            })
            .collect::<Vec<_>>();

        Ok(Frame::Array(values))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut keys = vec![];

        loop {
            match parser.next_string() {
                Ok(key) => keys.push(key),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if keys.is_empty() {
            return Err(CommandParserError::wrong_arity("mget").into());
        }

        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    #[tokio::test]
    async fn mixed_keys() {
        let store = Store::new();
        store.set(String::from("key1"), Bytes::from("1"));
        store.set(String::from("key3"), Bytes::from("3"));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("MGET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("key2")),
            Frame::Bulk(Bytes::from("key3")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Mget(Mget {
                keys: vec![
                    String::from("key1"),
                    String::from("key2"),
                    String::from("key3")
                ]
            })
        );

        let res = cmd.exec(store.clone()).await.unwrap();

        assert_eq!(
            res,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("1")),
                Frame::Null,
                Frame::Bulk(Bytes::from("3"))
            ])
        );
    }

    #[test]
    fn no_keys() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("MGET"))]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::WrongNumberOfArguments {
                command: "mget".to_string()
            }
        );
    }
}
