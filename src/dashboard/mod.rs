pub mod handlers;
pub mod server;
pub mod sse;
pub mod state;

pub use server::{DashboardConfig, DashboardServer};
pub use state::DashboardState;
