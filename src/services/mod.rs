pub mod bulk_delete;

pub use bulk_delete::{bulk_delete, retrieve_items, BulkDeleteError, BulkRetrieval};
