use axum::{
    http,
    response::{IntoResponse, Response},
};

/// Everything that can go wrong while handling one proxy request. Each
/// variant maps to a fixed HTTP status and plain-text body; nothing
/// propagates past the request boundary.
#[derive(Debug)]
pub(crate) enum ProxyError {
    MissingParameter,
    MalformedUrl,
    HostNotAllowed,
    /// All fetch attempts exhausted; carries the last observed error.
    UpstreamUnavailable(String),
    Internal(anyhow::Error),
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::MissingParameter => write!(f, "Missing url"),
            ProxyError::MalformedUrl => write!(f, "Invalid url"),
            ProxyError::HostNotAllowed => write!(f, "Host not allowed"),
            ProxyError::UpstreamUnavailable(message) => write!(f, "{message}"),
            ProxyError::Internal(error) => write!(f, "{error}"),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MissingParameter | ProxyError::MalformedUrl => {
                http::StatusCode::BAD_REQUEST
            }
            ProxyError::HostNotAllowed => http::StatusCode::FORBIDDEN,
            ProxyError::UpstreamUnavailable(_) => http::StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

impl<E> From<E> for ProxyError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    async fn status_and_body(error: ProxyError) -> Result<(u16, String)> {
        let response = error.into_response();
        let status = response.status().as_u16();
        let body =
            axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, String::from_utf8(body.to_vec())?))
    }

    #[tokio::test]
    async fn error_variants_map_to_fixed_responses() -> Result<()> {
        assert_eq!(
            status_and_body(ProxyError::MissingParameter).await?,
            (400, "Missing url".to_string())
        );
        assert_eq!(
            status_and_body(ProxyError::MalformedUrl).await?,
            (400, "Invalid url".to_string())
        );
        assert_eq!(
            status_and_body(ProxyError::HostNotAllowed).await?,
            (403, "Host not allowed".to_string())
        );
        assert_eq!(
            status_and_body(ProxyError::UpstreamUnavailable(
                "Upstream 404".to_string()
            ))
            .await?,
            (502, "Upstream 404".to_string())
        );
        let (status, body) =
            status_and_body(anyhow::Error::msg("boom").into()).await?;
        assert_eq!(status, 500);
        assert_eq!(body, "boom");
        Ok(())
    }
}
