//! TCP output sink.
//!
//! Delivers a formatted UID to a peer that acknowledges with a single `OK`
//! line. Every attempt uses a fresh connection:
//!
//! ```text
//! sink ──connect──> peer
//!      ──"<uid>\n"─>
//!      <──"OK\n"────
//!      ──shutdown──>
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use nfcuid_core::TcpConfig;
//! use nfcuid_network::TcpSink;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = TcpSink::new(&TcpConfig::new("192.168.0.100", 3000));
//! let attempts = sink.send("04ABCDEF").await?;
//! println!("Delivered after {attempts} attempt(s)");
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Policy
//!
//! - Up to four attempts in total
//! - An attempt fails on connect error, I/O error, timeout or any reply
//!   other than `OK` (surrounding whitespace ignored)
//! - No delay between attempts
//! - The connection is shut down after every attempt, successful or not
//!
//! # Timeout Handling
//!
//! Without a configured timeout every operation waits as long as the peer
//! does. With one, connect, write and read are each bounded and a timeout
//! fails the attempt.

use nfcuid_core::TcpConfig;
use nfcuid_core::constants::{TCP_ACK_REPLY, TCP_SEND_ATTEMPTS};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Errors that can occur while delivering to a TCP peer
#[derive(Debug, Error)]
pub enum TcpSinkError {
    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Peer closed the connection before replying
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Peer replied with something other than `OK`
    #[error("Peer rejected message: {reply:?}")]
    Rejected { reply: String },

    /// Every attempt failed
    #[error("Could not send message to socket after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Line-oriented TCP sink with bounded retry.
#[derive(Debug, Clone)]
pub struct TcpSink {
    address: String,
    port: u16,
    timeout: Option<Duration>,
    attempts: u32,
}

impl TcpSink {
    /// Create a sink for the configured peer.
    ///
    /// No connection is made until [`send`](Self::send).
    ///
    /// # Example
    ///
    /// ```
    /// use nfcuid_core::TcpConfig;
    /// use nfcuid_network::TcpSink;
    ///
    /// let sink = TcpSink::new(&TcpConfig::new("127.0.0.1", 3000));
    /// assert_eq!(sink.peer(), "127.0.0.1:3000");
    /// ```
    pub fn new(config: &TcpConfig) -> Self {
        debug!("Creating TCP sink for {}:{}", config.address, config.port);

        Self {
            address: config.address.clone(),
            port: config.port,
            timeout: config.timeout,
            attempts: TCP_SEND_ATTEMPTS,
        }
    }

    /// `address:port` of the peer.
    pub fn peer(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Deliver `message` and return how many attempts it took.
    ///
    /// # Errors
    ///
    /// Returns `TcpSinkError::Exhausted` once every attempt has failed. The
    /// individual failures are logged, not returned.
    pub async fn send(&self, message: &str) -> Result<u32, TcpSinkError> {
        for attempt in 1..=self.attempts {
            match self.attempt(message).await {
                Ok(()) => {
                    info!(attempt, "Message acknowledged, TCP socket closing");
                    return Ok(attempt);
                }
                Err(e) => {
                    warn!(attempt, peer = %self.peer(), "TCP delivery attempt failed: {}", e);
                }
            }
        }

        warn!(peer = %self.peer(), "Could not send message to socket");
        Err(TcpSinkError::Exhausted {
            attempts: self.attempts,
        })
    }

    /// One connect-write-read-close cycle.
    async fn attempt(&self, message: &str) -> Result<(), TcpSinkError> {
        trace!("Connecting to {}", self.peer());
        let mut stream = self
            .timed(
                TcpStream::connect((self.address.as_str(), self.port)),
                TcpSinkError::ConnectionTimeout,
            )
            .await?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        let result = self.exchange(&mut stream, message).await;
        close(stream).await;
        result
    }

    async fn exchange(&self, stream: &mut TcpStream, message: &str) -> Result<(), TcpSinkError> {
        let (reader, mut writer) = stream.split();

        let line = format!("{message}\n");
        self.timed(writer.write_all(line.as_bytes()), TcpSinkError::WriteTimeout)
            .await?;
        self.timed(writer.flush(), TcpSinkError::WriteTimeout).await?;

        let mut reader = BufReader::new(reader);
        let mut reply = String::new();
        let read = self
            .timed(reader.read_line(&mut reply), TcpSinkError::ReadTimeout)
            .await?;
        if read == 0 {
            return Err(TcpSinkError::ConnectionLost(
                "Peer closed connection without reply".to_string(),
            ));
        }

        let reply = reply.trim();
        trace!(reply, "Received reply");
        if reply == TCP_ACK_REPLY {
            Ok(())
        } else {
            Err(TcpSinkError::Rejected {
                reply: reply.to_string(),
            })
        }
    }

    /// Apply the configured timeout, if any, to one I/O operation.
    async fn timed<T, F>(&self, operation: F, on_timeout: fn(u64) -> TcpSinkError) -> Result<T, TcpSinkError>
    where
        F: Future<Output = std::io::Result<T>>,
    {
        match self.timeout {
            None => Ok(operation.await?),
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(on_timeout(limit.as_millis() as u64)),
            },
        }
    }
}

/// Shut the connection down, bounded so a dead peer cannot stall the sink.
async fn close(mut stream: TcpStream) {
    let shutdown_timeout = Duration::from_millis(500);
    match tokio::time::timeout(shutdown_timeout, stream.shutdown()).await {
        Ok(Ok(())) => {
            trace!("Shutdown completed successfully");
        }
        Ok(Err(e)) => {
            debug!("Error during shutdown: {}", e);
        }
        Err(_) => {
            debug!(
                "Shutdown timeout during close ({}ms)",
                shutdown_timeout.as_millis()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_creation() {
        let sink = TcpSink::new(&TcpConfig::new("127.0.0.1", 3000));
        assert_eq!(sink.peer(), "127.0.0.1:3000");
        assert_eq!(sink.attempts, 4);
        assert_eq!(sink.timeout, None);
    }

    #[test]
    fn test_sink_keeps_timeout() {
        let config = TcpConfig::new("127.0.0.1", 3000).with_timeout(Duration::from_millis(250));
        let sink = TcpSink::new(&config);
        assert_eq!(sink.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_exhausted_display() {
        let err = TcpSinkError::Exhausted { attempts: 4 };
        assert_eq!(
            err.to_string(),
            "Could not send message to socket after 4 attempts"
        );
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // Use a non-routable IP address (RFC 5737 TEST-NET-1)
        let config = TcpConfig::new("192.0.2.1", 9999).with_timeout(Duration::from_millis(50));
        let sink = TcpSink::new(&config);

        let result = sink.attempt("04ABCDEF").await;
        assert!(matches!(
            result,
            Err(TcpSinkError::ConnectionTimeout(50)) | Err(TcpSinkError::Io(_))
        ));
    }
}
