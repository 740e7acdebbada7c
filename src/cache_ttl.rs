//! Centralized TTL constants for caching
//!
//! This module provides consistent cache time-to-live values
//! across the application with environment variable overrides.

use std::env;

// Default TTL constants (in seconds)
pub const TTL_FILTERED_INVOICES: u64 = 600; // 10 minutes
pub const TTL_DEFAULT: u64 = 300; // 5 minutes

/// Get TTL with environment variable override
pub fn ttl_with_env(env_key: &str, default_ttl: u64) -> u64 {
    env::var(env_key)
        .map(|val| val.parse::<u64>().unwrap_or(default_ttl))
        .unwrap_or(default_ttl)
}

/// Get filtered invoices TTL from environment or default
pub fn get_filtered_invoices_ttl() -> u64 {
    ttl_with_env("TTL_FILTERED_INVOICES_SECONDS", TTL_FILTERED_INVOICES)
}
