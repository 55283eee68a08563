pub mod dedup_cache;

pub use dedup_cache::DedupCache;
