pub mod memory;
pub mod recorder;

pub use memory::InMemoryTransactionStore;
pub use recorder::{TransactionRecorder, TransactionRequest};
