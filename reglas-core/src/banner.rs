//! Alert banners shown above forms and tables.

use crate::ApiError;

/// Shown whenever the server cannot be reached.
pub const SERVER_UNREACHABLE: &str = "No se pudo contactar al servidor. Verifica la API.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    /// Client-side validation problems.
    Warning,
    /// Server rejections and transport failures.
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Danger, message)
    }

    pub fn unreachable() -> Self {
        Self::danger(SERVER_UNREACHABLE)
    }
}

/// Best human-readable text for a failed call.
///
/// Prefers the server `detail`, then the raw body, then the reason phrase.
/// Transport failures map to [`SERVER_UNREACHABLE`].
pub fn describe_error(err: &ApiError) -> String {
    match err {
        ApiError::Api { .. } => err
            .detail()
            .or_else(|| err.body().filter(|b| !b.trim().is_empty()))
            .or_else(|| err.reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", err.status().unwrap_or_default())),
        ApiError::Network(_) => SERVER_UNREACHABLE.to_string(),
        other => other.to_string(),
    }
}
