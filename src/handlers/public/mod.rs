// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, password recovery and zoning reference lookups.

pub mod auth;
pub mod zoning;
