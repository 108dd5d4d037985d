//! Session persistence backends.

mod fs;

pub use fs::FsSessionRepository;
