pub mod toml_loader;

pub use toml_loader::{list_toml_files, load_all_toml_files, load_toml_document, save_toml_document};
