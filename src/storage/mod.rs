pub mod memory;
pub mod traits;

pub use memory::InMemoryDataStore;
pub use traits::DataStore;
