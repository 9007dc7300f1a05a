pub mod environment;
pub mod format;
pub mod paths;
pub mod terminal;

pub use environment::{config_path, default_mod_dirs, log_dir, resolve_root_dir};
pub use format::{format_filesize, format_timestamp};
pub use paths::{format_path_with_tilde, resolve_against};
pub use terminal::strip_control_sequences;
