//! Language server front end for mapped edits.
//!
//! The server tracks open documents, mirrors them to an extension host and
//! answers the custom `mappedEdits/provide` request by selecting one of the
//! providers the extension host registered.

pub mod config;
pub mod error;
pub mod ext_host;
pub mod main_thread;
pub mod server;
pub mod service;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use config::MappedEditsConfig;
pub use server::Backend;
pub use service::MappedEditsService;
