//! Test doubles for the wallet's outside world.
//!
//! The wallet reaches time, storage and the node only through traits
//! (`Clock`, `KeyValueStore`/`SessionStore`, `NodeApi`). The types here
//! implement those traits in memory and can be steered from a test: move the
//! clock, fail writes, script node replies or make the node unreachable.
//! Nothing here touches the filesystem or the network.

pub mod clock;
pub mod node;
pub mod store;

pub use clock::NullClock;
pub use node::NullNode;
pub use store::NullStore;
