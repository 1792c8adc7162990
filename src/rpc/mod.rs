/// JSON-RPC interface
///
/// This module handles the line-delimited JSON-RPC communication with a
/// client, translating requests into application intents.

pub mod protocol;
pub mod server;

// Re-export main types
pub use server::RpcServer;
