//! Transport to the aggregation service
//!
//! - [`Session`]: one TCP connection, closed exactly once
//! - framing: `u32` LE length prefix + payload, full-write and full-read loops
//! - confirmation handshake: every submission frame is answered by a
//!   fixed-size token
//!
//! Nothing here retries. Connect failures, protocol failures and peer closes
//! are returned to the owning loop.

mod errors;
mod framing;
mod session;

pub use errors::{TransportError, TransportResult};
pub use framing::{
    receive_exact, receive_frame, send_confirmation, send_frame, send_framed, write_full,
    CONFIRMATION_LEN, CONFIRMATION_TOKEN, LENGTH_PREFIX_LEN, MAX_FRAME_LEN,
};
pub use session::{Session, SessionHandle};
