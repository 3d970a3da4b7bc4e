pub mod memory;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use pagination::{Page, PageQuery};
pub use postgres::PgStore;
pub use store::{ContainerStore, ItemStore, LocationStore, Store, StoreError, StoreResult, UserStore};
