pub mod connection;
pub mod schema;

pub use connection::{make_pool, make_pool_with_size};
pub use schema::{
    count_names, delete_name, ensure_schema, fetch_all_names, get_name_by_name, insert_name,
    load_store, update_name,
};
