//! Módulo de hashing y canonicalización JSON.
//!
//! Los fingerprints se registran en el log de cada corrida para identificar
//! qué builds archivados y qué entradas de portal produjo.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_dir, hash_str, hash_value};
