// handlers/protected/mod.rs - Protected handlers (session JWT required)
//
// Property records, their dependent rows, and uploaded rule documents.
// Routes are wrapped in `jwt_auth_middleware` by the router.

pub mod dependents;
pub mod files;
pub mod property;
