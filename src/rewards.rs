//! Reward strings released by the proof-of-access endpoints
//!
//! These live only in the binary. They are never read from the environment or
//! a config file, so reading `/proc/self/environ` through the file viewer does
//! not reveal them. The layer 3 database flag is not here: it is read live from
//! the `flags` table.

pub const LAYER2_FLAG: &str = "CTF{ESCAPED_DOCKER_CONTAINER_LAYER2}";
pub const LAYER3_FLAG: &str = "CTF{BREACHED_REDIS_AND_DATABASE_LAYER3}";

/// Layer whose flag row is fetched from the database
pub const DATABASE_FLAG_LAYER: i32 = 3;
