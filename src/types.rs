//! Core types for draft-sync

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a draft
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct DraftId(pub Uuid);

impl DraftId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for DraftId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Draft upload status
///
/// `Uploaded` is terminal. `Failed -> Uploading` (via retry and the next sync
/// pass) is the only cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    /// Composed locally, waiting for a sync pass
    Draft,
    /// Owned by the sync coordinator while the publish call is in flight
    Uploading,
    /// Last attempt failed; see `error_message`
    Failed,
    /// Published successfully
    Uploaded,
}

impl DraftStatus {
    /// Whether a draft in this status belongs to the pending set
    pub fn is_pending(&self) -> bool {
        matches!(self, DraftStatus::Draft | DraftStatus::Failed)
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Uploading => "uploading",
            DraftStatus::Failed => "failed",
            DraftStatus::Uploaded => "uploaded",
        }
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of media attached to a draft
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image (re-encoded bitmap)
    Image,
    /// Video (transcoded)
    Video,
}

impl MediaKind {
    /// Classify a MIME type, e.g. `image/png` or `video/mp4`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top_level = mime.split('/').next()?.trim().to_ascii_lowercase();
        match top_level.as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// File extension used for compressed payloads of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    /// MIME type of compressed payloads of this kind
    pub fn output_mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a compressed media payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftMedia {
    /// Location of the compressed payload (path inside the media directory)
    pub reference: String,
    /// Image or video
    pub kind: MediaKind,
    /// Size of the compressed payload in bytes
    #[serde(default)]
    pub size_bytes: u64,
}

/// A locally composed post and its upload state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    /// Unique, immutable identifier
    pub id: DraftId,
    /// Text body (may be empty if media-only)
    #[serde(default)]
    pub content: String,
    /// Compressed media payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<DraftMedia>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Preset tag chosen from the composer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_tag: Option<String>,
    /// Location attachment (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub location: Option<serde_json::Value>,
    /// Poll attachment (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub poll: Option<serde_json::Value>,
    /// GIF URL attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
    /// Reference to a quoted post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_reference: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Upload status
    pub status: DraftStatus,
    /// Failure reason, only present while `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Number of upload attempts made
    #[serde(default)]
    pub retry_count: u32,
    /// Timestamp of the most recent attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Identifier assigned by the publish service once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

impl DraftRecord {
    /// Build a fresh record in `draft` status
    pub fn new(draft: NewDraft) -> Self {
        Self {
            id: DraftId::generate(),
            content: draft.content,
            media: draft.media,
            tags: draft.tags,
            preset_tag: draft.preset_tag,
            location: draft.location,
            poll: draft.poll,
            gif_url: draft.gif_url,
            quoted_reference: draft.quoted_reference,
            created_at: Utc::now(),
            status: DraftStatus::Draft,
            error_message: None,
            retry_count: 0,
            last_attempt_at: None,
            remote_id: None,
        }
    }

    /// Apply a partial update; fields left as `None` are unchanged
    pub fn apply(&mut self, update: DraftUpdate) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(media) = update.media {
            self.media = media;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(preset_tag) = update.preset_tag {
            self.preset_tag = preset_tag;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(poll) = update.poll {
            self.poll = poll;
        }
        if let Some(gif_url) = update.gif_url {
            self.gif_url = gif_url;
        }
        if let Some(quoted_reference) = update.quoted_reference {
            self.quoted_reference = quoted_reference;
        }
    }
}

/// Content for a new draft
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDraft {
    /// Text body
    #[serde(default)]
    pub content: String,
    /// Already-compressed media payload
    #[serde(default)]
    pub media: Option<DraftMedia>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Preset tag
    #[serde(default)]
    pub preset_tag: Option<String>,
    /// Location attachment (opaque)
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub location: Option<serde_json::Value>,
    /// Poll attachment (opaque)
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub poll: Option<serde_json::Value>,
    /// GIF URL attachment
    #[serde(default)]
    pub gif_url: Option<String>,
    /// Reference to a quoted post
    #[serde(default)]
    pub quoted_reference: Option<String>,
}

impl NewDraft {
    /// Text-only draft
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a draft
///
/// Outer `None` leaves a field unchanged. For clearable fields, `Some(None)`
/// (JSON `null`) clears it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftUpdate {
    /// New text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Replace or clear the media payload
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<DraftMedia>)]
    pub media: Option<Option<DraftMedia>>,
    /// Replace the tag list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Replace or clear the preset tag
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<String>)]
    pub preset_tag: Option<Option<String>>,
    /// Replace or clear the location
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<Object>)]
    pub location: Option<Option<serde_json::Value>>,
    /// Replace or clear the poll
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<Object>)]
    pub poll: Option<Option<serde_json::Value>>,
    /// Replace or clear the GIF URL
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<String>)]
    pub gif_url: Option<Option<String>>,
    /// Replace or clear the quoted reference
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    #[schema(value_type = Option<String>)]
    pub quoted_reference: Option<Option<String>>,
}

// Distinguishes an absent field (outer None, via `default`) from an explicit null
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Process-wide sync session state (not persisted)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncState {
    /// Whether a sync pass is running
    pub is_syncing: bool,
    /// Progress of the current or last pass (0-100)
    pub progress: u8,
    /// When the last pass started
    pub last_sync_attempt_at: Option<DateTime<Utc>>,
}

/// Summary of one sync pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncReport {
    /// Drafts the pass attempted to publish
    pub attempted: usize,
    /// Drafts that ended `uploaded`
    pub uploaded: usize,
    /// Drafts that ended `failed`
    pub failed: usize,
}

/// Result of a `sync_drafts` call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// A pass ran to completion over its snapshot
    Completed {
        /// Pass summary
        report: SyncReport,
    },
    /// Another pass was already active; nothing was done
    AlreadyRunning,
}

/// Draft counts by status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DraftStats {
    /// Total drafts held
    pub total: usize,
    /// Drafts in `draft` status
    pub draft: usize,
    /// Drafts in `uploading` status
    pub uploading: usize,
    /// Drafts in `failed` status
    pub failed: usize,
    /// Drafts in `uploaded` status
    pub uploaded: usize,
    /// Drafts eligible for the next sync pass (`draft` + `failed`)
    pub pending: usize,
}

/// Connection type hint (display only, never used for control flow)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Wi-Fi
    Wifi,
    /// Mobile data
    Cellular,
    /// Wired
    Ethernet,
    /// Not known
    #[default]
    Unknown,
}

/// Current connectivity as reported by the observer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectivityStatus {
    /// Whether the network is reachable
    pub online: bool,
    /// Optional connection type hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
}

/// Event emitted by the engine
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Draft created
    DraftAdded {
        /// Draft ID
        id: DraftId,
    },

    /// Draft content changed
    DraftUpdated {
        /// Draft ID
        id: DraftId,
    },

    /// Draft removed
    DraftRemoved {
        /// Draft ID
        id: DraftId,
    },

    /// Failed draft handed back to the pending set
    DraftRetried {
        /// Draft ID
        id: DraftId,
    },

    /// Uploaded drafts were cleared
    UploadedCleared {
        /// Number of drafts removed
        count: usize,
    },

    /// Sync pass started
    SyncStarted {
        /// Number of drafts in the pass snapshot
        pending: usize,
    },

    /// Draft is being published
    DraftUploading {
        /// Draft ID
        id: DraftId,
        /// Attempt number (the draft's new retry count)
        attempt: u32,
    },

    /// Draft published successfully
    DraftUploaded {
        /// Draft ID
        id: DraftId,
        /// Identifier assigned by the publish service
        #[serde(skip_serializing_if = "Option::is_none")]
        remote_id: Option<String>,
    },

    /// Draft failed to publish
    DraftFailed {
        /// Draft ID
        id: DraftId,
        /// Error message stored on the draft
        error: String,
    },

    /// Aggregate sync progress
    SyncProgress {
        /// Progress percentage (0-100)
        percent: u8,
        /// Drafts processed so far
        completed: usize,
        /// Drafts in the pass snapshot
        total: usize,
    },

    /// Sync pass finished
    SyncCompleted {
        /// Pass summary
        report: SyncReport,
    },

    /// Connectivity changed
    ConnectivityChanged {
        /// New status
        status: ConnectivityStatus,
    },

    /// Engine is shutting down
    Shutdown,
}
