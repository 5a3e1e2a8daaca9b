//! Derived display values.
//!
//! Everything here is a pure function of a snapshot and the current time.
//! Nothing is cached on the session: renderers call [`DisplayView::project`]
//! on every tick so elapsed times and playback progress never drift.

use std::time::Duration;

use serde::Serialize;

use crate::snapshot::{Activity, MusicSession, PresenceSnapshot, Profile};

const CDN: &str = "https://cdn.discordapp.com";
const MEDIA_PROXY_PREFIX: &str = "mp:external/";
const APP_ICON_FALLBACK: &str = "https://dcdn.dstn.to/app-icons";
const LANYARD_ORIGIN: &str = "https://api.lanyard.rest";

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Gif,
    Webp,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Jpg => "jpg",
        }
    }
}

/// Which device indicator to show next to the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mobile,
    Desktop,
}

// ---------------------------------------------------------------------------
// Time projections
// ---------------------------------------------------------------------------

/// Time since the activity started, or `None` without a start timestamp.
pub fn elapsed(activity: &Activity, now_ms: i64) -> Option<Duration> {
    let start = activity.started_at()?;
    Some(Duration::from_millis((now_ms - start).max(0) as u64))
}

/// Raw playback progress: `(now - start) / (end - start) * 100`.
///
/// `None` when the track has no positive length. Not clamped.
pub fn progress_percent(music: &MusicSession, now_ms: i64) -> Option<f64> {
    let total = music.timestamps.duration_ms();
    if total <= 0 {
        return None;
    }
    let current = now_ms - music.timestamps.start;
    Some(current as f64 / total as f64 * 100.0)
}

/// `HH:MM:SS elapsed`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02} elapsed",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// `m:ss`, used for track position and length.
pub fn format_track_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn platform(snapshot: &PresenceSnapshot) -> Option<Platform> {
    if snapshot.active_surfaces.mobile {
        Some(Platform::Mobile)
    } else if snapshot.active_surfaces.desktop {
        Some(Platform::Desktop)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Asset URLs
// ---------------------------------------------------------------------------

/// Avatar URL. Animated hashes (`a_` prefix) default to GIF.
pub fn avatar_url(profile: &Profile, format: Option<ImageFormat>) -> String {
    match profile.avatar.as_deref() {
        Some(hash) if !hash.is_empty() => {
            let format = format.unwrap_or(if hash.starts_with("a_") {
                ImageFormat::Gif
            } else {
                ImageFormat::Png
            });
            format!("{CDN}/avatars/{}/{hash}.{}", profile.id, format.extension())
        }
        _ => default_avatar_url(profile),
    }
}

/// Built-in avatar used when the subject has none.
pub fn default_avatar_url(profile: &Profile) -> String {
    let index = profile
        .discriminator
        .as_deref()
        .and_then(|d| d.parse::<u64>().ok())
        .unwrap_or(0)
        % 5;
    format!("{CDN}/embed/avatars/{index}.png")
}

pub fn banner_url(profile: &Profile, format: ImageFormat) -> Option<String> {
    let hash = profile.banner.as_deref().filter(|h| !h.is_empty())?;
    Some(format!(
        "{CDN}/banners/{}/{hash}.{}",
        profile.id,
        format.extension()
    ))
}

pub fn decoration_url(profile: &Profile) -> Option<String> {
    let decoration = profile.avatar_decoration_data.as_ref()?;
    Some(format!(
        "{CDN}/avatar-decoration-presets/{}.png",
        decoration.asset
    ))
}

pub fn clan_badge_url(profile: &Profile) -> Option<String> {
    let clan = profile.clan.as_ref()?;
    let guild = clan.identity_guild_id.as_deref()?;
    let badge = clan.badge.as_deref()?;
    Some(format!("{CDN}/clan-badges/{guild}/{badge}.png"))
}

pub fn profile_page_url(profile: &Profile) -> String {
    format!("https://discord.com/users/{}", profile.id)
}

/// Avatar served by the presence service itself.
pub fn lanyard_avatar_url(subject_id: &str, format: ImageFormat) -> String {
    format!("{LANYARD_ORIGIN}/{subject_id}.{}", format.extension())
}

/// Large image of an activity, falling back to the application icon.
pub fn activity_large_image_url(activity: &Activity) -> Option<String> {
    let large = activity
        .assets
        .as_ref()
        .and_then(|a| a.large_image.as_deref())
        .filter(|s| !s.is_empty());

    match large {
        Some(reference) => resolve_asset(reference, activity.application_id.as_deref()),
        None => activity
            .application_id
            .as_deref()
            .map(|app| format!("{APP_ICON_FALLBACK}/{app}?size=1024")),
    }
}

pub fn activity_small_image_url(activity: &Activity) -> Option<String> {
    let small = activity
        .assets
        .as_ref()
        .and_then(|a| a.small_image.as_deref())
        .filter(|s| !s.is_empty())?;
    resolve_asset(small, activity.application_id.as_deref())
}

/// Turn an asset reference into a URL.
///
/// `mp:external/<hash>/https/host/path` references point at media-proxied
/// external images; anything else is an application asset hash.
fn resolve_asset(reference: &str, application_id: Option<&str>) -> Option<String> {
    if reference.starts_with(MEDIA_PROXY_PREFIX) {
        let rest = reference.split('/').skip(2).collect::<Vec<_>>().join("/");
        return Some(match rest.strip_prefix("https/") {
            Some(url) => format!("https://{url}"),
            None => rest,
        });
    }
    let app = application_id?;
    Some(format!("{CDN}/app-assets/{app}/{reference}.png"))
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayView {
    pub display_name: String,
    pub username: String,
    pub status: &'static str,
    pub platform: Option<Platform>,
    pub avatar_url: String,
    pub banner_url: Option<String>,
    pub decoration_url: Option<String>,
    pub clan: Option<ClanView>,
    pub activities: Vec<ActivityView>,
    pub music: Option<MusicView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClanView {
    pub tag: String,
    pub badge_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityView {
    pub name: String,
    pub details: Option<String>,
    pub state: Option<String>,
    pub elapsed: Option<String>,
    pub large_image_url: Option<String>,
    pub small_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicView {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_art_url: Option<String>,
    pub position: String,
    pub length: String,
    /// Progress clamped to `[0, 100]`.
    pub percent: f64,
}

impl DisplayView {
    /// Project a snapshot at `now_ms`. When `include_hidden` is false,
    /// listening and custom-status activities are left out.
    pub fn project(snapshot: &PresenceSnapshot, now_ms: i64, include_hidden: bool) -> Self {
        let profile = &snapshot.profile;

        let activities = snapshot
            .activities
            .iter()
            .filter(|a| include_hidden || !a.is_hidden())
            .map(|activity| ActivityView {
                name: activity.name.clone(),
                details: activity.details.clone(),
                state: activity.state.clone(),
                elapsed: elapsed(activity, now_ms).map(format_elapsed),
                large_image_url: activity_large_image_url(activity),
                small_image_url: activity_small_image_url(activity),
            })
            .collect();

        let music = snapshot.music.as_ref().map(|music| {
            let length = Duration::from_millis(music.timestamps.duration_ms() as u64);
            let position = Duration::from_millis((now_ms - music.timestamps.start).max(0) as u64)
                .min(length);
            MusicView {
                title: music.title.clone(),
                artist: music.artist.clone(),
                album: music.album.clone(),
                album_art_url: music.album_art_url.clone(),
                position: format_track_time(position),
                length: format_track_time(length),
                percent: progress_percent(music, now_ms)
                    .unwrap_or(0.0)
                    .clamp(0.0, 100.0),
            }
        });

        let clan = profile
            .clan
            .as_ref()
            .filter(|c| c.identity_enabled)
            .and_then(|c| {
                c.tag.clone().map(|tag| ClanView {
                    tag,
                    badge_url: clan_badge_url(profile),
                })
            });

        Self {
            display_name: profile.display_name().to_string(),
            username: profile.username.clone(),
            status: snapshot.status.label(),
            platform: platform(snapshot),
            avatar_url: avatar_url(profile, None),
            banner_url: banner_url(profile, ImageFormat::Png),
            decoration_url: decoration_url(profile),
            clan,
            activities,
            music,
        }
    }
}
