pub mod blpop;
pub mod del;
pub mod executable;
pub mod exists;
pub mod expire;
pub mod get;
pub mod hget;
pub mod hgetall;
pub mod hset;
pub mod lpop;
pub mod lpush;
pub mod mget;
pub mod mset;
pub mod ping;
pub mod rpop;
pub mod rpush;
pub mod set;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use blpop::Blpop;
use del::Del;
use exists::Exists;
use expire::Expire;
use get::Get;
use hget::Hget;
use hgetall::Hgetall;
use hset::Hset;
use lpop::Lpop;
use lpush::Lpush;
use mget::Mget;
use mset::Mset;
use ping::Ping;
use rpop::Rpop;
use rpush::Rpush;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Blpop(Blpop),
    Del(Del),
    Exists(Exists),
    Expire(Expire),
    Get(Get),
    Hget(Hget),
    Hgetall(Hgetall),
    Hset(Hset),
    Lpop(Lpop),
    Lpush(Lpush),
    Mget(Mget),
    Mset(Mset),
    Ping(Ping),
    Rpop(Rpop),
    Rpush(Rpush),
    Set(Set),
}

impl Executable for Command {
    async fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Blpop(cmd) => cmd.exec(store).await,
            Command::Del(cmd) => cmd.exec(store).await,
            Command::Exists(cmd) => cmd.exec(store).await,
            Command::Expire(cmd) => cmd.exec(store).await,
            Command::Get(cmd) => cmd.exec(store).await,
            Command::Hget(cmd) => cmd.exec(store).await,
            Command::Hgetall(cmd) => cmd.exec(store).await,
            Command::Hset(cmd) => cmd.exec(store).await,
            Command::Lpop(cmd) => cmd.exec(store).await,
            Command::Lpush(cmd) => cmd.exec(store).await,
            Command::Mget(cmd) => cmd.exec(store).await,
            Command::Mset(cmd) => cmd.exec(store).await,
            Command::Ping(cmd) => cmd.exec(store).await,
            Command::Rpop(cmd) => cmd.exec(store).await,
            Command::Rpush(cmd) => cmd.exec(store).await,
            Command::Set(cmd) => cmd.exec(store).await,
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "blpop" => Blpop::try_from(parser).map(Command::Blpop),
            "del" => Del::try_from(parser).map(Command::Del),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "expire" => Expire::try_from(parser).map(Command::Expire),
            "get" => Get::try_from(parser).map(Command::Get),
            "hget" => Hget::try_from(parser).map(Command::Hget),
            "hgetall" => Hgetall::try_from(parser).map(Command::Hgetall),
            "hset" => Hset::try_from(parser).map(Command::Hset),
            "lpop" => Lpop::try_from(parser).map(Command::Lpop),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "mget" => Mget::try_from(parser).map(Command::Mget),
            "mset" => Mset::try_from(parser).map(Command::Mset),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "rpop" => Rpop::try_from(parser).map(Command::Rpop),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "set" => Set::try_from(parser).map(Command::Set),
            _ => Err(CommandParserError::UnknownCommand {
                command: command_name,
            }
            .into()),
        }
    }
}

pub(crate) struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings
            // are parsed to UTF-8. While errors are stored as strings, they
            // are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Like `next_string`, but running out of arguments is a wrong-arity
    /// error attributed to `command` rather than a bare end-of-stream.
    fn required_string(&mut self, command: &str) -> Result<String, CommandParserError> {
        self.next_string().map_err(|err| match err {
            CommandParserError::EndOfStream => CommandParserError::wrong_arity(command),
            err => err,
        })
    }

    fn required_bytes(&mut self, command: &str) -> Result<Bytes, CommandParserError> {
        self.next_bytes().map_err(|err| match err {
            CommandParserError::EndOfStream => CommandParserError::wrong_arity(command),
            err => err,
        })
    }

    fn required_integer(&mut self, command: &str) -> Result<i64, CommandParserError> {
        self.next_integer().map_err(|err| match err {
            CommandParserError::EndOfStream => CommandParserError::wrong_arity(command),
            err => err,
        })
    }

    /// Rejects trailing arguments for commands with a fixed arity.
    fn expect_end(&mut self, command: &str) -> Result<(), CommandParserError> {
        match self.parts.next() {
            None => Ok(()),
            Some(_) => Err(CommandParserError::wrong_arity(command)),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("ERR protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongNumberOfArguments { command: String },
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR protocol error; command frame fully consumed")]
    EndOfStream,
}

impl CommandParserError {
    fn wrong_arity(command: &str) -> CommandParserError {
        CommandParserError::WrongNumberOfArguments {
            command: command.to_string(),
        }
    }
}
