//! Wire types shared between the game server and anything that talks to it.
//!
//! `models` holds the game vocabulary (configs, moves, snapshots); `protocol`
//! holds the request/response envelopes used by the REST gateway.

pub mod models;
pub mod protocol;
