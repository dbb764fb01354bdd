mod memory;
mod record;

pub use memory::{CallKind, InMemoryResource, RecordedCall};
pub use record::Record;
