use serde::Deserialize;
use sitepin_core::ApiError;
use std::error::Error as _;

/// Error body returned by the node on failed commands.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RemoteError {
    pub message: String,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
}

impl RemoteError {
    pub fn is_error(&self) -> bool {
        self.kind.as_deref() == Some("error")
    }
}

/// Phrases the node uses when the thing asked about does not exist.
const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "could not resolve",
    "does not exist",
    "no link named",
];

/// Flattens a reqwest error and its causes into one line.
pub(crate) fn transport(err: reqwest::Error) -> ApiError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ApiError::Transport(message)
}

pub(crate) fn local(err: std::io::Error, what: impl std::fmt::Display) -> ApiError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ApiError::NotFound(format!("{what}: {err}"))
    } else {
        ApiError::Local(format!("{what}: {err}"))
    }
}

/// Maps a non-success HTTP status and its body to an [`ApiError`].
pub(crate) fn from_status(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<RemoteError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_owned());
    classify(status, message)
}

pub(crate) fn classify(status: u16, message: String) -> ApiError {
    let lower = message.to_lowercase();
    match status {
        401 | 403 => ApiError::PermissionDenied(message),
        404 => ApiError::NotFound(message),
        _ if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) => ApiError::NotFound(message),
        _ => ApiError::Remote { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_message_is_extracted() {
        let err = from_status(500, r#"{"Message":"pin: context canceled","Code":0,"Type":"error"}"#);
        assert_eq!(
            err,
            ApiError::Remote {
                status: 500,
                message: "pin: context canceled".into()
            }
        );
    }

    #[test]
    fn unresolvable_name_is_not_found() {
        let err = from_status(
            500,
            r#"{"Message":"could not resolve name","Code":0,"Type":"error"}"#,
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn plain_body_is_kept() {
        let err = from_status(502, "bad gateway\n");
        assert_eq!(
            err,
            ApiError::Remote {
                status: 502,
                message: "bad gateway".into()
            }
        );
    }

    #[test]
    fn auth_statuses_are_permission_denied() {
        assert!(matches!(from_status(401, ""), ApiError::PermissionDenied(_)));
        assert!(matches!(from_status(403, ""), ApiError::PermissionDenied(_)));
    }
}
