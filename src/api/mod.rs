//! External interface facade: HTTP/RPC surface over the engine. Kept
//! deliberately thin — none of the simulation's algorithmic work lives
//! here.

mod server;
mod view;

pub use server::{router, serve, SharedEngine};
pub use view::{status_view, BlockView, PendingVoteView, StatusView, ValidatorView};
