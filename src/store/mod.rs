pub mod csv_export;
pub mod json_store;

pub use csv_export::save_tabular;
pub use json_store::{load_structured, save_structured};
