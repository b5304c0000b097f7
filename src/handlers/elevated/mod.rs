// handlers/elevated/mod.rs - Elevated handlers (Admin role required)
//
// Routes are wrapped in `jwt_auth_middleware` and `validate_admin_middleware`.

pub mod users;
