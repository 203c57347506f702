pub mod bounded;
pub mod queue_error;
pub mod state;

pub use bounded::{DEFAULT_ITEM_SIZE, SharedQueue};
pub use queue_error::QueueError;
pub use state::QueueState;
