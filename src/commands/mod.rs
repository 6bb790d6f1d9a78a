//! Commands
//!
//! The request/response boundary the UI calls into. Every command takes the
//! shared [`AppState`](crate::state::AppState) and returns a
//! [`CommandResponse`](crate::models::response::CommandResponse) (or a plain
//! value for simple queries), independent of the transport that carries it.

pub mod analysis;
pub mod credentials;
pub mod environment;
pub mod external;
pub mod health;
pub mod init;
pub mod settings;

pub use analysis::*;
pub use credentials::*;
pub use environment::*;
pub use external::*;
pub use health::*;
pub use init::*;
pub use settings::*;
