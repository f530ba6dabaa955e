use std::{path::PathBuf, sync::Arc};

use smol_str::SmolStr;
use url::Url;

use crate::format::Key;

/// A media segment declared by an EXTINF directive.
///
/// `https://tools.ietf.org/html/draft-pantos-hls-rfc8216bis-08#page-22`
#[derive(Debug, Clone)]
pub struct MediaSegment {
    /// Sequence number, contiguous and ascending across the playlist
    pub sequence: u64,
    /// Duration in seconds
    pub duration: u64,
    /// Title following the duration, if any
    pub title: Option<SmolStr>,
    /// Carried for EXT-X-DISCONTINUITY; no directive populates it yet
    pub discontinuity: bool,
    /// Resolved absolute location
    pub url: Url,
    /// Snapshot of the key in effect when the segment was declared
    pub key: Option<Arc<Key>>,
    /// Where the downloaded bytes are stored, once a download succeeded
    pub local_path: Option<PathBuf>,
}
