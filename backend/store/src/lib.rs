pub mod pool;
pub mod sqlite_store;
pub mod store;

pub use pool::{ConnectionPool, PooledConnection};
pub use sqlite_store::SqliteMessageStore;
pub use store::{validate_append, InMemoryMessageStore, MessageStore, NewMessage};
