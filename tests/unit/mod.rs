#[path = "../fixtures/mod.rs"]
mod fixtures;

mod merge_properties_test;
mod registry_test;
mod toml_format_test;
