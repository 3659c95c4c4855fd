//! Typed submission payload
//!
//! A submission carries a full snapshot of the proposed song state, not a
//! diff. The snapshot is stored as a JSON document tagged by the submission
//! kind and validated structurally before any durable write.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Crew roles accepted by the platform. Anything else is rejected as an
/// invalid payload before the submission is persisted.
pub const KNOWN_ROLES: &[&str] = &[
    "vocalist",
    "composer",
    "arranger",
    "lyricist",
    "mixing",
    "mastering",
    "tuning",
    "illustrator",
    "video",
];

/// Maximum reviewer comment length in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

/// How the song relates to pre-existing material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationKind {
    Original,
    Remix,
    Cover,
}

impl CreationKind {
    pub fn as_i64(self) -> i64 {
        match self {
            CreationKind::Original => 0,
            CreationKind::Remix => 1,
            CreationKind::Cover => 2,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self> {
        match v {
            0 => Ok(CreationKind::Original),
            1 => Ok(CreationKind::Remix),
            2 => Ok(CreationKind::Cover),
            other => Err(Error::Internal(format!("unknown creation kind {}", other))),
        }
    }
}

/// One production crew member. Either a platform user id, a free-form
/// name, or both (the name then overrides the display name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub role: String,
    pub user_id: Option<i64>,
    pub name: Option<String>,
}

/// Link to the song on an external platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLink {
    pub platform: String,
    pub url: String,
}

/// Reference to the material a remix or cover derives from. Either an
/// in-catalog display id or a free-form title must be present, and the
/// record is tagged with the kind of derivation it represents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginRef {
    pub origin_kind: CreationKind,
    pub display_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub url: Option<String>,
}

/// Full proposed song state, applied wholesale on approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongDraft {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    pub lyrics: String,
    pub audio_url: String,
    pub cover_url: String,
    pub duration_seconds: i64,
    pub crew: Vec<CrewMember>,
    #[serde(default)]
    pub links: Vec<ExternalLink>,
    pub creation: CreationKind,
    pub origin: Option<OriginRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub explicit: bool,
}

/// Submission snapshot tagged by submission kind, so the workflow engine
/// can validate structurally before touching the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionPayload {
    Create(SongDraft),
    Modify(SongDraft),
}

impl SubmissionPayload {
    pub fn draft(&self) -> &SongDraft {
        match self {
            SubmissionPayload::Create(d) | SubmissionPayload::Modify(d) => d,
        }
    }
}

impl SongDraft {
    /// Structural validation, applied before any durable mutation.
    ///
    /// Checks required fields, the crew role vocabulary, and origin
    /// cardinality for remix/cover drafts.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidPayload("title must not be empty".into()));
        }
        if self.lyrics.trim().is_empty() {
            return Err(Error::InvalidPayload("lyrics must not be empty".into()));
        }
        if self.crew.is_empty() {
            return Err(Error::InvalidPayload(
                "production crew must not be empty".into(),
            ));
        }
        for member in &self.crew {
            if !KNOWN_ROLES.contains(&member.role.as_str()) {
                return Err(Error::InvalidPayload(format!(
                    "unknown crew role: {}",
                    member.role
                )));
            }
            if member.user_id.is_none() && member.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                return Err(Error::InvalidPayload(
                    "crew member needs a user id or a name".into(),
                ));
            }
        }
        match self.creation {
            CreationKind::Original => {
                if self.origin.is_some() {
                    return Err(Error::InvalidPayload(
                        "original works must not carry an origin record".into(),
                    ));
                }
            }
            CreationKind::Remix | CreationKind::Cover => {
                let origin = self.origin.as_ref().ok_or_else(|| {
                    Error::InvalidPayload("remix/cover requires an origin record".into())
                })?;
                if origin.origin_kind == CreationKind::Original {
                    return Err(Error::InvalidPayload(
                        "origin record cannot be tagged original".into(),
                    ));
                }
                if origin.display_id.is_none()
                    && origin.title.as_deref().map_or(true, |t| t.trim().is_empty())
                {
                    return Err(Error::InvalidPayload(
                        "origin record needs a display id or a title".into(),
                    ));
                }
            }
        }
        for link in &self.links {
            if link.platform.trim().is_empty() || link.url.trim().is_empty() {
                return Err(Error::InvalidPayload(
                    "external link needs platform and url".into(),
                ));
            }
        }
        Ok(())
    }

    /// Display name for the song, joined from the crew. The platform
    /// derives the artist column instead of accepting it as input.
    pub fn artist(&self) -> String {
        self.crew
            .iter()
            .map(|m| m.name.clone().unwrap_or_else(|| format!("user:{}", m.user_id.unwrap_or(0))))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
