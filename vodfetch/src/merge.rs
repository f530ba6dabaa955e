use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use hlstream_rs::format::MediaSegment;
use log::{debug, warn};

/// Outcome of a merge pass.
#[derive(Debug)]
pub struct MergeReport {
    pub output_path: PathBuf,
    pub merged: usize,
    /// Segments contributing no bytes: never downloaded, or unreadable
    pub skipped: usize,
}

/// Pick `<base>.mp4`, or the first free suffixed variant when the
/// canonical name is already taken.
fn unique_output_path(output_base: &str) -> PathBuf {
    let candidate = PathBuf::from(format!("{}.mp4", output_base));
    if !candidate.exists() {
        return candidate;
    }

    let mut attempt = 1;
    loop {
        let candidate = PathBuf::from(format!("{}_{}.mp4", output_base, attempt));
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

/// Concatenate the downloaded segments into one file, strictly in list
/// order, whatever order their downloads finished in. Segments without
/// local bytes are skipped; only a failure to create the output is fatal.
pub fn merge_segments(segments: &[MediaSegment], output_base: &str) -> io::Result<MergeReport> {
    let output_path = unique_output_path(output_base);
    let mut output_file = File::create(&output_path)?;

    let mut report = MergeReport {
        output_path,
        merged: 0,
        skipped: 0,
    };

    for segment in segments {
        let Some(local_path) = &segment.local_path else {
            report.skipped += 1;
            continue;
        };

        if let Err(e) = copy_segment(local_path, &mut output_file) {
            warn!("Failed to merge segment {}: {}", segment.sequence, e);
            report.skipped += 1;
            continue;
        }

        debug!("Merged segment {}", segment.sequence);
        report.merged += 1;
    }

    Ok(report)
}

fn copy_segment(local_path: &Path, output_file: &mut File) -> io::Result<()> {
    let mut segment_file = File::open(local_path)?;
    io::copy(&mut segment_file, output_file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use hlstream_rs::format::MediaSegment;
    use url::Url;

    use super::merge_segments;

    fn segment(sequence: u64, local_path: Option<&Path>) -> MediaSegment {
        MediaSegment {
            sequence,
            duration: 4,
            title: None,
            discontinuity: false,
            url: Url::parse("http://host/x.ts").unwrap(),
            key: None,
            local_path: local_path.map(|x| x.to_path_buf()),
        }
    }

    #[test]
    fn test_merge_follows_sequence_order() {
        let dir = tempfile::tempdir().unwrap();

        // segment files written in reverse, as if the last download won
        for sequence in (0..4u64).rev() {
            fs::write(
                dir.path().join(format!("{}.ts", sequence)),
                format!("part{};", sequence),
            )
            .unwrap();
        }

        let paths = (0..4u64)
            .map(|x| dir.path().join(format!("{}.ts", x)))
            .collect::<Vec<_>>();
        let segments = paths
            .iter()
            .enumerate()
            .map(|(i, path)| segment(i as u64, Some(path)))
            .collect::<Vec<_>>();

        let output_base = dir.path().join("output");
        let report = merge_segments(&segments, output_base.to_str().unwrap()).unwrap();

        assert_eq!(report.merged, 4);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            fs::read_to_string(&report.output_path).unwrap(),
            "part0;part1;part2;part3;"
        );
    }

    #[test]
    fn test_missing_segments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();

        let present = dir.path().join("0.ts");
        fs::write(&present, "zero;").unwrap();
        let vanished = dir.path().join("2.ts");

        let segments = vec![
            segment(0, Some(&present)),
            segment(1, None),
            segment(2, Some(&vanished)),
        ];

        let output_base = dir.path().join("output");
        let report = merge_segments(&segments, output_base.to_str().unwrap()).unwrap();

        assert_eq!(report.merged, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(fs::read_to_string(&report.output_path).unwrap(), "zero;");
    }

    #[test]
    fn test_existing_output_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();

        let source = dir.path().join("0.ts");
        fs::write(&source, "fresh").unwrap();
        let segments = vec![segment(0, Some(&source))];

        let output_base = dir.path().join("output");
        fs::write(dir.path().join("output.mp4"), "already here").unwrap();

        let report = merge_segments(&segments, output_base.to_str().unwrap()).unwrap();

        assert_eq!(report.output_path, dir.path().join("output_1.mp4"));
        assert_eq!(fs::read_to_string(&report.output_path).unwrap(), "fresh");
        assert_eq!(
            fs::read_to_string(dir.path().join("output.mp4")).unwrap(),
            "already here"
        );
    }
}
