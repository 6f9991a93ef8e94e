pub mod csv_import;

pub use csv_import::{load_csv, seed_store};
