pub mod errors;
pub mod middleware;
pub mod schema;
pub mod state;
pub mod utils;
