//! File System Implementations
//!
//! Local disk operations and a remote shell over ssh.

mod local;
mod remote;

pub use local::{expand_home, resolve_against, LocalFs};
pub use remote::{quote, RemoteShell};
