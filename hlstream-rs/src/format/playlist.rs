use crate::format::MediaSegment;

/// Playlist type declared by the EXT-X-PLAYLIST-TYPE directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    Vod,
    Event,
}

impl PlaylistType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VOD" => Some(Self::Vod),
            "EVENT" => Some(Self::Event),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MediaPlaylist {
    /// Version of the playlist format
    pub version: Option<u32>,
    /// Playlist type, when one of VOD/EVENT was declared
    pub playlist_type: Option<PlaylistType>,
    /// Whether EXT-X-INDEPENDENT-SEGMENTS was declared
    pub independent_segments: bool,
    /// Upper bound of segment durations, in seconds
    pub target_duration: u64,
    /// Sequence number the next parsed segment will take
    pub media_sequence: u64,
    /// Segments of this playlist, in playback order
    pub segments: Vec<MediaSegment>,
}
