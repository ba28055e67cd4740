pub mod error;
pub mod events;
pub mod messages;
pub mod middleware;
pub mod moderation;
pub mod payments;
pub mod profiles;
pub mod routes;
pub mod state;
pub mod sweeps;
pub mod triggers;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner, CheckoutConfig};
