//! Client side of the Modulr node's REST API.
//!
//! The wallet talks to a node through the [`NodeApi`] trait so that tests can
//! substitute a scripted node. [`HttpNodeClient`] is the production
//! implementation over `reqwest`.
//!
//! Every call is a single request bounded by the client's timeout. There is
//! no retry; the caller decides what to do with a failure.

pub mod api;
pub mod error;
pub mod http;

pub use api::{AccountState, NodeApi, TxLookup, TxReceipt};
pub use error::NodeError;
pub use http::{parse_node_url, HttpNodeClient};
