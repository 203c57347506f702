pub mod codec_error;
pub mod fixed;

pub use codec_error::CodecError;
