use serde::{Deserialize, Serialize};

/// Media source category carried in signaling payloads: camera/microphone
/// capture or a screen share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    User,
    Screen,
}

/// Track kind, mirroring the SDP media-line kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// One value per `(stream type, kind)` pair: user audio/video plus screen
/// audio/video. A participant holds at most one live entry per slot;
/// setting an occupied slot replaces it.
pub struct MediaSlots<T> {
    user_audio: Option<T>,
    user_video: Option<T>,
    screen_audio: Option<T>,
    screen_video: Option<T>,
}

impl<T> Default for MediaSlots<T> {
    fn default() -> Self {
        Self {
            user_audio: None,
            user_video: None,
            screen_audio: None,
            screen_video: None,
        }
    }
}

impl<T> MediaSlots<T> {
    fn slot(&self, stream_type: StreamType, kind: MediaKind) -> &Option<T> {
        match (stream_type, kind) {
            (StreamType::User, MediaKind::Audio) => &self.user_audio,
            (StreamType::User, MediaKind::Video) => &self.user_video,
            (StreamType::Screen, MediaKind::Audio) => &self.screen_audio,
            (StreamType::Screen, MediaKind::Video) => &self.screen_video,
        }
    }

    fn slot_mut(&mut self, stream_type: StreamType, kind: MediaKind) -> &mut Option<T> {
        match (stream_type, kind) {
            (StreamType::User, MediaKind::Audio) => &mut self.user_audio,
            (StreamType::User, MediaKind::Video) => &mut self.user_video,
            (StreamType::Screen, MediaKind::Audio) => &mut self.screen_audio,
            (StreamType::Screen, MediaKind::Video) => &mut self.screen_video,
        }
    }

    pub fn get(&self, stream_type: StreamType, kind: MediaKind) -> Option<&T> {
        self.slot(stream_type, kind).as_ref()
    }

    /// Occupy a slot, returning the value it replaced.
    pub fn set(&mut self, stream_type: StreamType, kind: MediaKind, value: T) -> Option<T> {
        self.slot_mut(stream_type, kind).replace(value)
    }

    pub fn take(&mut self, stream_type: StreamType, kind: MediaKind) -> Option<T> {
        self.slot_mut(stream_type, kind).take()
    }

    /// Occupied slots, in fixed slot order.
    pub fn iter(&self) -> impl Iterator<Item = (StreamType, MediaKind, &T)> {
        [
            (StreamType::User, MediaKind::Audio, self.user_audio.as_ref()),
            (StreamType::User, MediaKind::Video, self.user_video.as_ref()),
            (StreamType::Screen, MediaKind::Audio, self.screen_audio.as_ref()),
            (StreamType::Screen, MediaKind::Video, self.screen_video.as_ref()),
        ]
        .into_iter()
        .filter_map(|(s, k, v)| v.map(|v| (s, k, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (StreamType, MediaKind, &mut T)> {
        [
            (StreamType::User, MediaKind::Audio, self.user_audio.as_mut()),
            (StreamType::User, MediaKind::Video, self.user_video.as_mut()),
            (StreamType::Screen, MediaKind::Audio, self.screen_audio.as_mut()),
            (StreamType::Screen, MediaKind::Video, self.screen_video.as_mut()),
        ]
        .into_iter()
        .filter_map(|(s, k, v)| v.map(|v| (s, k, v)))
    }
}
