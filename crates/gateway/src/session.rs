use opend_core::AdapterError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::protocol::{frame_message, GatewayRequest, GatewayResponse};

/// Upper bound on a single gateway frame. A snapshot for 400 codes fits
/// comfortably; anything larger indicates a corrupt length prefix.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// One TCP connection to the gateway daemon, speaking length-prefixed JSON.
/// Quote and trade connections are both `GatewaySession`s; they differ only
/// in which requests the daemon accepts on them.
pub struct GatewaySession {
    stream: TcpStream,
}

impl GatewaySession {
    /// Connect and consume the daemon's `connected` handshake.
    pub async fn connect(host: &str, port: u16) -> Result<(Self, String), AdapterError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| AdapterError::ConnectionFailed(format!("{addr}: {e}")))?;

        let mut session = Self { stream };
        match session.recv().await? {
            GatewayResponse::Connected { version } => {
                debug!(addr = %addr, version = %version, "gateway session established");
                Ok((session, version))
            }
            GatewayResponse::Error { message } => Err(AdapterError::ConnectionFailed(message)),
            other => Err(AdapterError::Protocol(format!(
                "unexpected handshake message: {other:?}"
            ))),
        }
    }

    /// Send one request and wait for its response.
    pub async fn call(&mut self, req: &GatewayRequest) -> Result<GatewayResponse, AdapterError> {
        self.send(req).await?;
        self.recv().await
    }

    async fn send(&mut self, req: &GatewayRequest) -> Result<(), AdapterError> {
        let json = serde_json::to_vec(req)
            .map_err(|e| AdapterError::Protocol(format!("encode: {e}")))?;
        self.stream
            .write_all(&frame_message(&json))
            .await
            .map_err(|e| AdapterError::ConnectionFailed(format!("write: {e}")))?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<GatewayResponse, AdapterError> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| AdapterError::ConnectionFailed(format!("read: {e}")))?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_LEN {
            return Err(AdapterError::Protocol(format!(
                "frame length {len} exceeds limit"
            )));
        }

        let mut body = vec![0u8; len];
        self.stream
            .read_exact(&mut body)
            .await
            .map_err(|e| AdapterError::ConnectionFailed(format!("read: {e}")))?;

        serde_json::from_slice(&body).map_err(|e| AdapterError::Protocol(format!("decode: {e}")))
    }

    /// Shut the socket down. Errors are ignored; the peer may already be gone.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
