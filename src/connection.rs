use std::net::SocketAddr;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Result;

/// One accepted socket: a framed reader over its input stream, a buffered
/// writer for replies, and an identity used for diagnostics.
pub struct Connection {
    pub id: Uuid,
    pub client_address: SocketAddr,
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Connection {
    pub fn new(stream: TcpStream, client_address: SocketAddr) -> Connection {
        let (read_half, write_half) = stream.into_split();

        Connection {
            id: Uuid::new_v4(),
            client_address,
            reader: FramedRead::new(read_half, FrameCodec),
            writer: BufWriter::new(write_half),
        }
    }

    /// Reads the next frame from the socket. Returns `None` once the client
    /// closes the connection cleanly; a connection closed mid-frame or a
    /// malformed frame surfaces as an error, which is fatal for the
    /// connection because the stream cannot be resynchronized.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.reader.next().await.transpose()
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write_all(&frame.serialize()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
