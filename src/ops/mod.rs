pub mod backup_ops;
pub mod remap;
pub mod restore_ops;
pub mod sanitize;

pub use remap::GroupRemap;
pub use sanitize::sanitize;
