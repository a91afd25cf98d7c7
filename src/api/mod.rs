pub mod client;
pub mod mock_client;
pub mod record;
pub mod stream;

pub use client::{Backend, BackendClient, ByteStream};
pub use mock_client::{MockBackend, MockChat};
pub use record::{interpret, StreamRecord};
pub use stream::LineFramer;
