#[path = "../fixtures/mod.rs"]
mod fixtures;

mod entries_test;
