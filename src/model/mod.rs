pub mod activity;
pub mod disk;
pub mod file;
pub mod path;
pub mod tree;
