pub mod database;
pub mod error;
pub mod model;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod supabase;

pub use database::Database;
pub use error::StoreError;
pub use model::{BoardObject, NewConnector, NewObject, ObjectKind, ObjectPatch};
pub use sqlite::SqliteBoardStore;
pub use store::BoardStore;
pub use supabase::SupabaseBoardStore;
