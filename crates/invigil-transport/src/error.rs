use std::io;

/// Errors raised while listening for or talking to a player's socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Taking the next TCP connection off the listener failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The peer connected but never completed the WebSocket upgrade.
    #[error("handshake failed: {0}")]
    Handshake(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// A client frame exceeded [`MAX_FRAME_BYTES`](crate::MAX_FRAME_BYTES).
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
}

impl TransportError {
    /// True when the failure belongs to one connection rather than the
    /// listener, so the accept loop should keep going.
    pub fn is_per_connection(&self) -> bool {
        !matches!(self, Self::Bind { .. })
    }
}
