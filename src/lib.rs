pub mod codec;
pub mod queue;
pub mod segment;
