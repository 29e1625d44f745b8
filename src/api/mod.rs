pub mod error;
pub mod extract;
pub mod server;
pub mod users;
