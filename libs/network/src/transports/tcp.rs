//! TCP connection used for the TXT retransmission dialog (§4.5.2). One
//! connection is opened per gap; the reference implementation tears it
//! down and reconnects for every new `RequestGap` rather than keeping it
//! warm, and this wrapper mirrors that.

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use codec::txt::header::next_frame;
use codec::DecodeError;

use crate::error::{NetworkError, Result};

pub struct TxtRecoveryConnection {
    stream: TcpStream,
    buf: BytesMut,
    scanned: usize,
}

impl TxtRecoveryConnection {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(NetworkError::Io)?;
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(64 * 1024),
            scanned: 0,
        })
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.stream.write_all(payload).await.map_err(NetworkError::Io)
    }

    /// Reads until one full `STX`...`ETX` record is available, returning
    /// its bytes with the framing stripped. Buffers across partial TCP
    /// reads; a record split across two `read` calls is still delivered
    /// whole.
    pub async fn read_record(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some((record, next)) = next_frame(&self.buf, self.scanned)
                .map_err(|e: DecodeError| NetworkError::Decode(e))?
            {
                let record = record.to_vec();
                let _ = self.buf.split_to(next);
                self.scanned = 0;
                return Ok(record);
            }
            self.scanned = self.buf.len().saturating_sub(1).max(self.scanned);

            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await.map_err(NetworkError::Io)?;
            if n == 0 {
                return Err(NetworkError::connection("TXT recovery peer closed connection"));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
