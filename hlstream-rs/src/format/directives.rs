/// Directives of a playlist, one variant per tag the parser can meet.
///
/// `https://tools.ietf.org/html/draft-pantos-hls-rfc8216bis-08`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    // basic tags
    ExtM3u,
    Version,

    // media or master playlist tags
    IndependentSegments,
    Start,
    Define,

    // media playlist tags
    TargetDuration,
    MediaSequence,
    DiscontinuitySequence,
    EndList,
    PlaylistType,
    IFramesOnly,
    PartInf,
    ServerControl,

    // media segment tags
    ExtInf,
    ByteRange,
    Discontinuity,
    Key,
    Map,
    ProgramDateTime,
    Gap,
}

impl Directive {
    const ALL: [Directive; 20] = [
        Directive::ExtM3u,
        Directive::Version,
        Directive::IndependentSegments,
        Directive::Start,
        Directive::Define,
        Directive::TargetDuration,
        Directive::MediaSequence,
        Directive::DiscontinuitySequence,
        Directive::EndList,
        Directive::PlaylistType,
        Directive::IFramesOnly,
        Directive::PartInf,
        Directive::ServerControl,
        Directive::ExtInf,
        Directive::ByteRange,
        Directive::Discontinuity,
        Directive::Key,
        Directive::Map,
        Directive::ProgramDateTime,
        Directive::Gap,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Directive::ExtM3u => "#EXTM3U",
            Directive::Version => "#EXT-X-VERSION",
            Directive::IndependentSegments => "#EXT-X-INDEPENDENT-SEGMENTS",
            Directive::Start => "#EXT-X-START",
            Directive::Define => "#EXT-X-DEFINE",
            Directive::TargetDuration => "#EXT-X-TARGETDURATION",
            Directive::MediaSequence => "#EXT-X-MEDIA-SEQUENCE",
            Directive::DiscontinuitySequence => "#EXT-X-DISCONTINUITY-SEQUENCE",
            Directive::EndList => "#EXT-X-ENDLIST",
            Directive::PlaylistType => "#EXT-X-PLAYLIST-TYPE",
            Directive::IFramesOnly => "#EXT-X-I-FRAMES-ONLY",
            Directive::PartInf => "#EXT-X-PART-INF",
            Directive::ServerControl => "#EXT-X-SERVER-CONTROL",
            Directive::ExtInf => "#EXTINF",
            Directive::ByteRange => "#EXT-X-BYTERANGE",
            Directive::Discontinuity => "#EXT-X-DISCONTINUITY",
            Directive::Key => "#EXT-X-KEY",
            Directive::Map => "#EXT-X-MAP",
            Directive::ProgramDateTime => "#EXT-X-PROGRAM-DATE-TIME",
            Directive::Gap => "#EXT-X-GAP",
        }
    }

    /// Recognize the directive of a line by its exact tag name, and return
    /// it together with the value following the `:` (empty when absent).
    pub fn recognize(line: &str) -> Option<(Directive, &str)> {
        if !line.starts_with('#') {
            return None;
        }

        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value),
            None => (line, ""),
        };

        Self::ALL
            .into_iter()
            .find(|directive| directive.tag() == name)
            .map(|directive| (directive, value))
    }
}
