pub mod identity_provider;
pub mod page_cache;
