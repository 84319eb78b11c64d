//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Header carrying the organization id forwarded by the gateway
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Header carrying the user id forwarded by the gateway
pub const USER_HEADER: &str = "x-user-id";
