//! Length-prefixed framing over any byte stream
//!
//! ```text
//! +--------------------+
//! | Payload Length     | (u32 LE)
//! +--------------------+
//! | Payload            | (length bytes)
//! +--------------------+
//! ```
//!
//! A submission frame is answered by a fixed-size confirmation token.
//! Short writes and short reads are completed here and never surface.

use std::io::{self, Read, Write};

use super::errors::{TransportError, TransportResult};

/// Size of the length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Size of the confirmation token
pub const CONFIRMATION_LEN: usize = 3;

/// Token the client writes to acknowledge a received frame
pub const CONFIRMATION_TOKEN: &[u8; CONFIRMATION_LEN] = b"ack";

/// Largest frame the client accepts from the peer
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Writes all of `bytes`, looping over partial writes.
///
/// A write that accepts zero bytes is reported as `WriteZero`.
pub fn write_full<W: Write + ?Sized>(stream: &mut W, bytes: &[u8]) -> TransportResult<()> {
    let mut written = 0;
    while written < bytes.len() {
        match stream.write(&bytes[written..]) {
            Ok(0) => {
                return Err(TransportError::io(
                    "write",
                    io::Error::new(io::ErrorKind::WriteZero, "stream accepted zero bytes"),
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::io("write", e)),
        }
    }
    stream.flush().map_err(|e| TransportError::io("flush", e))
}

/// Reads exactly `n` bytes.
///
/// A zero-byte read before `n` bytes are collected means the peer closed the
/// connection and is reported as `ConnectionClosedByPeer`.
pub fn receive_exact<R: Read + ?Sized>(stream: &mut R, n: usize) -> TransportResult<Vec<u8>> {
    let mut buffer = vec![0u8; n];
    let mut received = 0;
    while received < n {
        match stream.read(&mut buffer[received..]) {
            Ok(0) => {
                return Err(TransportError::ConnectionClosedByPeer {
                    expected: n,
                    received,
                })
            }
            Ok(count) => received += count,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::io("read", e)),
        }
    }
    Ok(buffer)
}

/// Writes one frame without waiting for a confirmation.
pub fn send_frame<W: Write + ?Sized>(stream: &mut W, payload: &[u8]) -> TransportResult<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| TransportError::PayloadTooLarge(payload.len()))?;
    write_full(stream, &len.to_le_bytes())?;
    write_full(stream, payload)
}

/// Writes one frame and blocks until the peer confirms it.
///
/// Either the whole frame was sent and acknowledged, or an error is
/// returned; there is no partial resume.
pub fn send_framed<S: Read + Write + ?Sized>(stream: &mut S, payload: &[u8]) -> TransportResult<()> {
    send_frame(stream, payload)?;
    receive_exact(stream, CONFIRMATION_LEN).map_err(|e| match e {
        TransportError::Io { source, .. } => {
            TransportError::Protocol(format!("confirmation read failed: {}", source))
        }
        other => other,
    })?;
    Ok(())
}

/// Reads one frame sent by the peer.
pub fn receive_frame<R: Read + ?Sized>(stream: &mut R) -> TransportResult<Vec<u8>> {
    let prefix = receive_exact(stream, LENGTH_PREFIX_LEN)?;
    let mut len_buf = [0u8; LENGTH_PREFIX_LEN];
    len_buf.copy_from_slice(&prefix);
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(TransportError::Protocol(format!(
            "frame length {} exceeds maximum {}",
            len, MAX_FRAME_LEN
        )));
    }
    receive_exact(stream, len)
}

/// Acknowledges a frame received from the peer.
pub fn send_confirmation<W: Write + ?Sized>(stream: &mut W) -> TransportResult<()> {
    write_full(stream, CONFIRMATION_TOKEN)
}
