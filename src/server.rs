use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::{Command, CommandParserError};
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// How often the background sweep scans for expired keys.
const SWEEP_PERIOD: Duration = Duration::from_secs(1);

pub async fn run(port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let store = Store::new();
    store.start_sweeper(SWEEP_PERIOD);

    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!(e);
            }
        });
    }
}

/// Owns one socket's read loop: decode a request, execute it against the
/// store, write the reply back to this connection, repeat. A malformed frame
/// is fatal for the connection only; a bad command (wrong arity, unknown
/// verb, bad numeric argument) becomes an error reply and the loop
/// continues.
#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, client_address);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    loop {
        let frame = match conn.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                // The stream cannot be resynchronized after a framing
                // error; report it to the client and drop the connection.
                let reply = Frame::Error(format!("ERR protocol error; {}", err));
                let _ = conn.write_frame(&reply).await;
                return Err(err);
            }
        };

        debug!("Received frame from client: {:?}", frame);

        let reply = match Command::try_from(frame) {
            Ok(cmd) => cmd.exec(store.clone()).await?,
            Err(err) => match err.downcast::<CommandParserError>() {
                Ok(err) => Frame::Error(err.to_string()),
                Err(err) => return Err(err),
            },
        };

        debug!("Sending reply to client: {:?}", reply);
        conn.write_frame(&reply).await?;
    }

    info!("Connection closed");
    Ok(())
}
