#![cfg_attr(docsrs, feature(doc_cfg))]
//! # concord_lib
//!
//! This crate speaks the serial automation protocol of GE/Interlogix Concord
//! family alarm panels (Concord, Concord Express, Advent).
//!
//! It decodes the hex framed messages sent by the panel into typed records,
//! builds the requests the panel accepts and runs a message loop that
//! acknowledges frames and dispatches them to registered handlers.
//!
//! ## Features
//!
//! - `default`: Enables `bin-dependencies`, which is intended for compiling the `concord` command-line tool and pulls in `serialport` and `serde`.
//!
//! ### Transport Features
//! - `serialport`: Enables [`transport::SerialTransport`] using the `serialport` crate.
//!
//! ### Utility Features
//! - `serde`: Enables `serde` serialization of decoded messages and panel state.
//! - `bin-dependencies`: Enables all features required by the `concord` binary executable.

/// Static code to label lookups.
pub mod alarm_codes;
/// Contains error types for the library.
mod error;
/// Hex framing, checksums and the incremental frame reader.
pub mod framing;
/// The message loop and handler registry.
pub mod panel;
/// Command identities and message decoders.
pub mod protocol;
/// Requests sent to the panel.
pub mod request;
/// Zone and partition records accumulated from messages.
pub mod state;
pub mod tables;
/// Display text tokens.
pub mod tokens;
/// Byte transports for the message loop.
pub mod transport;

pub use error::{Error, Result};
pub use panel::{AlarmPanel, LinkState, PanelConfig, PanelHandle};
pub use protocol::{decode_message, CommandId, DecodedMessage, Identity};
