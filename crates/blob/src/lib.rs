pub mod error;
pub mod store;
pub mod stream;
pub mod testing;

pub use error::BlobError;
pub use store::ContentStore;
pub use stream::{ByteStream, collect_stream, stream_from_bytes};
