// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod postgrest;
pub mod session;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use postgrest::PostgrestClient;
pub use session::{Claims, SessionError, SessionVerifier};
pub use store::{DataStore, Direction, Filter, Predicate, Record, StoreError, StoreResult, Table};
