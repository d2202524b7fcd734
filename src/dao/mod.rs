/// Persisted entity definitions.
pub mod models;
/// Round persistence abstraction and its backends.
pub mod round_store;
/// Storage errors shared by every backend.
pub mod storage;
