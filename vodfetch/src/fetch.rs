use std::{error::Error, fmt::Display, io::BufRead};

use hlstream_rs::{ParseError, format::MediaPlaylist};
use tokio::task::JoinError;
use url::Url;

#[derive(Debug)]
pub enum ParseManifestError {
    ParseError(ParseError),
    JoinError(JoinError),
}

impl Display for ParseManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JoinError(e) => e.fmt(f),
            Self::ParseError(e) => e.fmt(f),
        }
    }
}

impl Error for ParseManifestError {}

impl From<JoinError> for ParseManifestError {
    fn from(value: JoinError) -> Self {
        Self::JoinError(value)
    }
}

impl From<ParseError> for ParseManifestError {
    fn from(value: ParseError) -> Self {
        Self::ParseError(value)
    }
}

pub async fn parse_manifest_async(
    stream: impl BufRead + Send + 'static,
    base: Url,
) -> Result<MediaPlaylist, ParseManifestError> {
    Ok(tokio::task::spawn_blocking(move || {
        let mut parser = hlstream_rs::Parser::new(stream, base);
        if let Err(e) = parser.parse() {
            return Err(e);
        }
        Ok(parser.get_result())
    })
    .await??)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use url::Url;

    use super::parse_manifest_async;

    #[tokio::test]
    async fn test_parse_manifest_async() {
        let base = Url::parse("http://host/live/index.m3u8").unwrap();
        let playlist = parse_manifest_async(
            Cursor::new("#EXTM3U\n#EXTINF:4,\na.ts\n#EXTINF:4,\nb.ts"),
            base,
        )
        .await
        .unwrap();

        assert_eq!(playlist.segments.len(), 2);
        assert_eq!(playlist.segments[1].url.as_str(), "http://host/live/b.ts");
    }
}
