use std::{
    error::Error,
    fmt::Display,
    io::{self, BufRead},
    mem::swap,
    sync::Arc,
};

use lazy_static::lazy_static;
use regex::Regex;
use smol_str::SmolStr;
use url::Url;

use crate::format::{Directive, Key, KeyMethod, MediaPlaylist, MediaSegment, PlaylistType};

pub struct Parser(Box<dyn ParserImplTrait>);

impl Parser {
    pub fn new<T: BufRead + 'static>(reader: T, base: Url) -> Self {
        Self(Box::new(ParserImpl::new(reader, base)))
    }

    pub fn parse(&mut self) -> Result<(), ParseError> {
        self.0.parse()
    }

    pub fn get_result(&mut self) -> MediaPlaylist {
        self.0.get_result()
    }
}

#[derive(Debug)]
pub enum ParseError {
    IoError(io::Error),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::IoError(e) => e.fmt(f),
        }
    }
}
impl Error for ParseError {}
impl From<io::Error> for ParseError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value)
    }
}

/// Resolve a segment location against the playlist address. Absolute
/// locations pass through as-is, everything else is joined onto the base.
pub fn resolve_uri(base: &Url, location: &str) -> Result<Url, url::ParseError> {
    match Url::parse(location) {
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(location),
        result => result,
    }
}

trait ParserImplTrait {
    fn parse(&mut self) -> Result<(), ParseError>;
    fn get_result(&mut self) -> MediaPlaylist;
}

lazy_static! {
    static ref KEY_ATTRIBUTE_REGEX: Regex =
        Regex::new(r#"(METHOD|URI|IV|KEYFORMAT|KEYFORMATVERSIONS)="?([^,"]+)"?"#)
            .expect("Regular expression error");
    static ref EXTINF_REGEX: Regex = Regex::new(r"^(\d+),?(.+)?$").expect("Regular expression error");
}

fn parse_iv(value: &str) -> Option<u128> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u128::from_str_radix(hex, 16).ok()
}

struct ParserImpl<T: BufRead + 'static> {
    reader: T,
    buffer: String,
    base: Url,
    playlist: MediaPlaylist,
    current_key: Option<Arc<Key>>,
}

impl<T: BufRead + 'static> ParserImpl<T> {
    pub fn new(reader: T, base: Url) -> Self {
        Self {
            reader,
            buffer: String::new(),
            base,
            playlist: MediaPlaylist::default(),
            current_key: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, io::Error> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(e),
            }

            if self.buffer.trim().len() != 0 {
                return Ok(Some(self.buffer.trim().to_owned()));
            }
        }
    }

    fn parse_version(&mut self, value: &str) {
        if let Ok(version) = value.trim().parse() {
            self.playlist.version = Some(version);
        }
    }

    fn parse_playlist_type(&mut self, value: &str) {
        if let Some(playlist_type) = PlaylistType::from_name(value.trim()) {
            self.playlist.playlist_type = Some(playlist_type);
        }
    }

    fn parse_target_duration(&mut self, value: &str) {
        if let Ok(duration) = value.trim().parse() {
            self.playlist.target_duration = duration;
        }
    }

    fn parse_media_sequence(&mut self, value: &str) {
        if let Ok(sequence) = value.trim().parse() {
            self.playlist.media_sequence = sequence;
        }
    }

    fn parse_key(&mut self, value: &str) {
        let mut key = Key::default();
        let mut matched = false;

        for captures in KEY_ATTRIBUTE_REGEX.captures_iter(value) {
            matched = true;
            let attribute_value = &captures[2];
            match &captures[1] {
                "METHOD" => key.method = KeyMethod::from_name(attribute_value),
                "URI" => key.uri = Some(attribute_value.into()),
                "IV" => key.iv = parse_iv(attribute_value),
                "KEYFORMAT" => key.format = Some(attribute_value.into()),
                "KEYFORMATVERSIONS" => key.format_version = Some(attribute_value.into()),
                _ => {}
            }
        }

        // whole replacement; segments keep the snapshot they already captured
        if matched {
            self.current_key = Some(Arc::new(key));
        }
    }

    fn parse_media_segment(&mut self, value: &str, location: &str) {
        let Some(captures) = EXTINF_REGEX.captures(value) else {
            return;
        };

        let Ok(url) = resolve_uri(&self.base, location) else {
            // unresolvable location: drop this segment, numbering stays contiguous
            return;
        };

        let segment = MediaSegment {
            sequence: self.playlist.media_sequence,
            duration: captures[1].parse().unwrap_or(0),
            title: captures.get(2).map(|x| SmolStr::new(x.as_str())),
            discontinuity: false,
            url,
            key: self.current_key.clone(),
            local_path: None,
        };

        self.playlist.segments.push(segment);
        self.playlist.media_sequence += 1;
    }
}

impl<T: BufRead + 'static> ParserImplTrait for ParserImpl<T> {
    fn parse(&mut self) -> Result<(), ParseError> {
        while let Some(line) = self.next_line()? {
            let Some((directive, value)) = Directive::recognize(&line) else {
                continue;
            };

            match directive {
                Directive::Version => self.parse_version(value),
                Directive::PlaylistType => self.parse_playlist_type(value),
                Directive::TargetDuration => self.parse_target_duration(value),
                Directive::MediaSequence => self.parse_media_sequence(value),
                Directive::IndependentSegments => self.playlist.independent_segments = true,
                Directive::Key => self.parse_key(value),
                Directive::ExtInf => {
                    // the segment location is the line right after EXTINF
                    let Some(location) = self.next_line()? else {
                        break;
                    };
                    self.parse_media_segment(value, &location);
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn get_result(&mut self) -> MediaPlaylist {
        let mut result = MediaPlaylist::default();
        swap(&mut self.playlist, &mut result);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use url::Url;

    use crate::{
        Parser,
        format::{KeyMethod, MediaPlaylist, PlaylistType},
        parser::{parse_iv, resolve_uri},
    };

    fn parse(data: &'static str) -> MediaPlaylist {
        let base = Url::parse("http://host/path/index.m3u8").unwrap();
        let mut parser = Parser::new(Cursor::new(data), base);
        parser.parse().unwrap();
        parser.get_result()
    }

    #[test]
    fn test_parse_stream() {
        let result = parse(
            r"
#EXTM3U
#EXT-X-VERSION:6
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-MEDIA-SEQUENCE:8885
#EXT-X-TARGETDURATION:6
#EXT-X-INDEPENDENT-SEGMENTS
#EXTINF:6,
21-35-08882.ts
#EXTINF:6,
21-35-08883.ts
#EXTINF:5,ending
21-35-08884.ts
#EXT-X-ENDLIST",
        );

        assert_eq!(result.version, Some(6));
        assert_eq!(result.playlist_type, Some(PlaylistType::Vod));
        assert_eq!(result.target_duration, 6);
        assert!(result.independent_segments);
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.segments[0].sequence, 8885);
        assert_eq!(result.segments[2].sequence, 8887);
        assert_eq!(result.segments[2].duration, 5);
        assert_eq!(result.segments[2].title.as_deref(), Some("ending"));
        assert_eq!(
            result.segments[0].url.as_str(),
            "http://host/path/21-35-08882.ts"
        );
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let result = parse(
            r"
#EXT-X-VERSION:six
#EXT-X-PLAYLIST-TYPE:LIVE
#EXTINF:abc,
bad0.ts
#EXTINF:4,
good0.ts
just a stray line
#EXTINF:4,
good1.ts",
        );

        assert_eq!(result.version, None);
        assert_eq!(result.playlist_type, None);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].url.as_str(), "http://host/path/good0.ts");
        assert_eq!(result.segments[1].url.as_str(), "http://host/path/good1.ts");
        assert_eq!(result.segments[0].sequence, 0);
        assert_eq!(result.segments[1].sequence, 1);
    }

    #[test]
    fn test_key_snapshot_per_segment() {
        let result = parse(
            r#"
#EXT-X-KEY:METHOD=NONE
#EXTINF:10,
a.ts
#EXT-X-KEY:METHOD=AES-128,URI="k",IV=1a
#EXTINF:10,
b.ts"#,
        );

        assert_eq!(result.segments.len(), 2);

        // the later KEY directive replaced the tracker, not segment a's snapshot
        let key_a = result.segments[0].key.as_ref().unwrap();
        assert_eq!(key_a.method, KeyMethod::None);
        assert_eq!(key_a.uri, None);

        let key_b = result.segments[1].key.as_ref().unwrap();
        assert_eq!(key_b.method, KeyMethod::Aes128);
        assert_eq!(key_b.uri.as_deref(), Some("k"));
        assert_eq!(key_b.iv, Some(0x1a));
    }

    #[test]
    fn test_segments_share_one_key_snapshot() {
        let result = parse(
            r#"
#EXT-X-KEY:METHOD=AES-128,URI="k"
#EXTINF:10,
a.ts
#EXTINF:10,
b.ts"#,
        );

        let key_a = result.segments[0].key.as_ref().unwrap();
        let key_b = result.segments[1].key.as_ref().unwrap();
        assert!(std::sync::Arc::ptr_eq(key_a, key_b));
    }

    #[test]
    fn test_sequence_contiguous_across_key_directives() {
        let result = parse(
            r#"
#EXT-X-MEDIA-SEQUENCE:100
#EXT-X-KEY:METHOD=NONE
#EXTINF:10,
a.ts
#EXT-X-KEY:METHOD=AES-128,URI="k1"
#EXT-X-KEY:METHOD=AES-128,URI="k2"
#EXTINF:10,
b.ts
#EXTINF:10,
c.ts"#,
        );

        let sequences = result
            .segments
            .iter()
            .map(|x| x.sequence)
            .collect::<Vec<_>>();
        assert_eq!(sequences, vec![100, 101, 102]);
    }

    #[test]
    fn test_extinf_at_eof() {
        let result = parse(
            r"
#EXTINF:4,
a.ts
#EXTINF:4,",
        );

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.media_sequence, 1);
    }

    #[test]
    fn test_unresolvable_location_skipped() {
        let result = parse(
            r"
#EXTINF:4,
http://[
#EXTINF:4,
good.ts",
        );

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].url.as_str(), "http://host/path/good.ts");
        assert_eq!(result.segments[0].sequence, 0);
    }

    #[test]
    fn test_key_with_bad_iv() {
        let result = parse(
            r#"
#EXT-X-KEY:METHOD=AES-128,URI="k",IV=zz,KEYFORMAT=identity
#EXTINF:10,
a.ts"#,
        );

        let key = result.segments[0].key.as_ref().unwrap();
        assert_eq!(key.method, KeyMethod::Aes128);
        assert_eq!(key.iv, None);
        assert_eq!(key.format.as_deref(), Some("identity"));
    }

    #[test]
    fn test_parse_iv() {
        assert_eq!(parse_iv("1a"), Some(0x1a));
        assert_eq!(
            parse_iv("0X99b74007b6254e4bd1c6e03631cad15b"),
            Some(0x99b74007b6254e4bd1c6e03631cad15b)
        );
        assert_eq!(parse_iv("0xff"), Some(0xff));
        assert_eq!(parse_iv("not-hex"), None);
        assert_eq!(parse_iv(""), None);
    }

    #[test]
    fn test_resolve_uri() {
        let base = Url::parse("http://host/path/index.m3u8").unwrap();

        assert_eq!(
            resolve_uri(&base, "seg1.ts").unwrap().as_str(),
            "http://host/path/seg1.ts"
        );
        assert_eq!(
            resolve_uri(&base, "http://other/seg2.ts").unwrap().as_str(),
            "http://other/seg2.ts"
        );
        assert_eq!(
            resolve_uri(&base, "/seg3.ts").unwrap().as_str(),
            "http://host/seg3.ts"
        );
        assert_eq!(
            resolve_uri(&base, "?token=1").unwrap().as_str(),
            "http://host/path/index.m3u8?token=1"
        );
        assert!(resolve_uri(&base, "http://[").is_err());
    }
}
