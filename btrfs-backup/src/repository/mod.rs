//! Restic repository access: credential files and the environment they
//! produce for the restic process.

pub mod credentials;

pub use credentials::{load_repository_env, parse_repository_env, RepositoryEnv};
