pub mod shm;

pub use shm::Segment;
