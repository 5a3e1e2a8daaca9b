//! Presence snapshot model.
//!
//! A [`PresenceSnapshot`] is always a complete replacement for the previous
//! one: transports deliver full states and the session never patches a
//! snapshot in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::PresenceData;

/// Activity type code for "Listening to ...".
pub const ACTIVITY_LISTENING: u8 = 2;
/// Activity type code for a custom status line.
pub const ACTIVITY_CUSTOM_STATUS: u8 = 4;
/// Name some clients use for a custom status regardless of type code.
pub const CUSTOM_STATUS_NAME: &str = "Custom Status";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Authoritative presence state for one subject at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub subject_id: String,
    pub status: PresenceStatus,
    pub active_surfaces: ActiveSurfaces,
    /// Activities in the order the service delivered them.
    pub activities: Vec<Activity>,
    pub music: Option<MusicSession>,
    pub profile: Profile,
    /// Free-form key/value store attached to the subject.
    pub kv: BTreeMap<String, String>,
}

impl From<PresenceData> for PresenceSnapshot {
    fn from(data: PresenceData) -> Self {
        Self {
            subject_id: data.discord_user.id.clone(),
            status: data.discord_status,
            active_surfaces: ActiveSurfaces {
                desktop: data.active_on_discord_desktop,
                mobile: data.active_on_discord_mobile,
            },
            activities: data.activities,
            music: data.spotify,
            profile: data.discord_user,
            kv: data.kv,
        }
    }
}

impl PresenceSnapshot {
    /// Activities meant for display: listening and custom-status entries
    /// are kept in `activities` but skipped here.
    pub fn visible_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| !a.is_hidden())
    }
}

/// Online status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    #[serde(other)]
    Offline,
}

impl PresenceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Idle => "idle",
            PresenceStatus::Dnd => "do not disturb",
            PresenceStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Platforms the subject is currently active on. Not mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSurfaces {
    pub desktop: bool,
    pub mobile: bool,
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// One running application, game or media session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<ActivityTimestamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<ActivityAssets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Activity {
    pub fn is_listening(&self) -> bool {
        self.kind == ACTIVITY_LISTENING
    }

    pub fn is_custom_status(&self) -> bool {
        self.kind == ACTIVITY_CUSTOM_STATUS || self.name == CUSTOM_STATUS_NAME
    }

    /// Whether the activity is left out of the presented list.
    pub fn is_hidden(&self) -> bool {
        self.is_listening() || self.is_custom_status()
    }

    /// Start timestamp in epoch milliseconds, if any.
    pub fn started_at(&self) -> Option<i64> {
        self.timestamps.as_ref().and_then(|t| t.start)
    }
}

/// Epoch-millisecond bounds of an activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

/// Image references attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Music
// ---------------------------------------------------------------------------

/// Currently playing track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSession {
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(rename = "song", default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub album_art_url: Option<String>,
    pub timestamps: TrackTimestamps,
}

/// Start and end of a track in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTimestamps {
    pub start: i64,
    pub end: i64,
}

impl TrackTimestamps {
    /// Total track length in milliseconds; zero when the bounds are inverted.
    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).max(0)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Identity attributes of the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Handle.
    #[serde(default)]
    pub username: String,
    /// Display name, when set.
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub banner_color: Option<String>,
    #[serde(default)]
    pub public_flags: u64,
    #[serde(default)]
    pub clan: Option<ClanTag>,
    #[serde(default)]
    pub avatar_decoration_data: Option<AvatarDecoration>,
}

impl Profile {
    /// Display name, falling back to the handle.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Server identity tag shown next to the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClanTag {
    #[serde(default)]
    pub identity_enabled: bool,
    #[serde(default)]
    pub identity_guild_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

/// Decorative overlay drawn around the avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarDecoration {
    pub asset: String,
    #[serde(default)]
    pub sku_id: Option<String>,
}
