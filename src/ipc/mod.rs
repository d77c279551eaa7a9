//! IPC listener that accepts events over a Unix socket.
//!
//! Key-bind helpers, the layout editor and scripts connect to the socket
//! and send newline-delimited JSON [`Event`](crate::event::Event)s.

pub mod listener;
