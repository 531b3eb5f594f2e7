use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RecordStatus {
    Pending => "pending",
    UnderReview => "under_review",
    Reviewed => "reviewed",
    ActionRequired => "action_required",
});

impl RecordStatus {
    /// Wire-tolerant classification: a missing or unrecognized status
    /// reads as `Pending`.
    pub fn classify(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(Self::Pending)
    }

    /// Human-readable label ("under_review" → "under review").
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Pending
    }
}

str_enum!(Sender {
    Patient => "patient",
    Gp => "gp",
});

/// Coarse media classification for preview rendering, by content-type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn classify(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("image/") => Self::Image,
            Some(ct) if ct.starts_with("video/") => Self::Video,
            _ => Self::Other,
        }
    }
}
