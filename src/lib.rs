pub mod api_router;
pub mod config;
pub mod directory;
pub mod identity;
pub mod notify;
pub mod shared;
pub mod tickets;
