use crate::constants::{ORGANIZATION_HEADER, USER_HEADER};
use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pulse_core::constants::DEFAULT_ORGANIZATION_ID;
use pulse_core::AppError;
use uuid::Uuid;

/// Organization context forwarded by the upstream gateway, which has already
/// authenticated the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgContext {
    pub organization_id: Uuid,
    pub user_id: Option<Uuid>,
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::InvalidInput(format!("Header {} must be a UUID", name)))
}

// Extracted from request parts directly so it composes with Multipart
impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id =
            header_uuid(parts, ORGANIZATION_HEADER)?.unwrap_or(DEFAULT_ORGANIZATION_ID);
        let user_id = header_uuid(parts, USER_HEADER)?;

        Ok(OrgContext {
            organization_id,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<OrgContext, HttpAppError> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        OrgContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn absent_headers_use_default_organization() {
        let ctx = extract(&[]).await.unwrap();
        assert_eq!(ctx.organization_id, DEFAULT_ORGANIZATION_ID);
        assert_eq!(ctx.user_id, None);
    }

    #[tokio::test]
    async fn forwarded_headers_are_read() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let (org_header, user_header) = (org.to_string(), user.to_string());
        let ctx = extract(&[
            ("X-Organization-Id", org_header.as_str()),
            ("X-User-Id", user_header.as_str()),
        ])
        .await
        .unwrap();
        assert_eq!(ctx.organization_id, org);
        assert_eq!(ctx.user_id, Some(user));
    }

    #[tokio::test]
    async fn malformed_header_is_rejected() {
        let err = extract(&[("X-Organization-Id", "not-a-uuid")])
            .await
            .unwrap_err();
        assert!(matches!(err.0, AppError::InvalidInput(_)));
    }
}
