// Caller identity, as forwarded by the authenticating front end

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "Student" => Some(Role::Student),
            "Alumni" => Some(Role::Alumni),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller. Rejects with 403 when either header is missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: u64,
    pub role: Role,
}

impl Identity {
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        };

        let user_id = header(USER_ID_HEADER)
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or(ApiError::Unauthorized)?;
        let role = header(USER_ROLE_HEADER)
            .and_then(Role::parse)
            .ok_or(ApiError::Unauthorized)?;

        Ok(Identity { user_id, role })
    }
}
