//! Capture packager: rebuilds self-describing capture files from the
//! segment files a [`CaptureWriter`] left in its root directory.

use crate::core::file_info::CaptureFileInfo;
use crate::error::{Error, Result};
use crate::storage::naming::{sibling_file_name, SegmentKind, SegmentName};
use crate::storage::writer::CaptureWriter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// DATA file of a segment and the HEADER file that pairs with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPair {
    pub index: u64,
    pub data_path: PathBuf,
    pub header_path: PathBuf,
}

/// One merged output file produced by [`CapturePackager::package`]
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedSegment {
    pub index: u64,
    pub info: CaptureFileInfo,
    pub output_path: PathBuf,
}

/// Reassembles the segments of one capture id into merged files
#[derive(Debug, Clone)]
pub struct CapturePackager {
    root_dir: PathBuf,
    capture_id: Uuid,
}

impl CapturePackager {
    pub fn new<P: AsRef<Path>>(root_dir: P, capture_id: Uuid) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            capture_id,
        }
    }

    /// Package whatever the given writer has written so far
    pub fn from_writer(writer: &CaptureWriter) -> Self {
        Self::new(writer.root_dir(), writer.capture_id())
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn capture_id(&self) -> Uuid {
        self.capture_id
    }

    /// List this capture's DATA segments in index order, each with its HEADER.
    ///
    /// A DATA file without a HEADER file fails the whole listing.
    pub fn discover(&self) -> Result<Vec<SegmentPair>> {
        let mut data_files = Vec::new();
        let entries = fs::read_dir(&self.root_dir).map_err(Error::file(&self.root_dir))?;
        for entry in entries {
            let entry = entry.map_err(Error::file(&self.root_dir))?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(name) = SegmentName::parse(&file_name) else {
                continue;
            };
            if name.capture_id != self.capture_id {
                continue;
            }
            match name.kind {
                SegmentKind::Data => data_files.push((name, file_name)),
                SegmentKind::Header => {
                    let has_data = sibling_file_name(&file_name, SegmentKind::Data)
                        .is_some_and(|data| self.root_dir.join(data).is_file());
                    if !has_data {
                        debug!(header = %file_name, "ignoring header without data file");
                    }
                }
            }
        }

        // Numeric index order, so segment 10 follows segment 2.
        data_files.sort_by(|(a, a_file), (b, b_file)| {
            a.index.cmp(&b.index).then_with(|| a_file.cmp(b_file))
        });

        data_files
            .into_iter()
            .map(|(name, file_name)| {
                // The header shares the data file's spelling of the capture id.
                let header_name = sibling_file_name(&file_name, SegmentKind::Header)
                    .unwrap_or_else(|| name.with_kind(SegmentKind::Header).to_string());
                let header_path = self.root_dir.join(header_name);
                let data_path = self.root_dir.join(file_name);
                if !header_path.is_file() {
                    return Err(Error::MissingHeader {
                        header: header_path,
                        data: data_path,
                    });
                }
                Ok(SegmentPair {
                    index: name.index,
                    data_path,
                    header_path,
                })
            })
            .collect()
    }

    /// Write one merged file per segment: header text followed by the data lines.
    ///
    /// Every segment is read and validated before anything is written, so a
    /// failure leaves no output files behind.
    pub fn package(&self) -> Result<Vec<PackagedSegment>> {
        info!(root_dir = %self.root_dir.display(), capture_id = %self.capture_id, "packaging capture");

        let pairs = self.discover()?;
        let mut staged = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            let (info, contents) = self.read_segment(pair)?;
            let output_path = self.root_dir.join(info.filename());
            staged.push((
                PackagedSegment {
                    index: pair.index,
                    info,
                    output_path,
                },
                contents,
            ));
        }

        let mut packaged = Vec::with_capacity(staged.len());
        for (segment, contents) in staged {
            fs::write(&segment.output_path, contents).map_err(Error::file(&segment.output_path))?;
            info!(output = %segment.output_path.display(), segment = segment.index, "wrote capture file");
            packaged.push(segment);
        }
        Ok(packaged)
    }

    /// Parse a segment's header and build its merged file contents
    fn read_segment(&self, pair: &SegmentPair) -> Result<(CaptureFileInfo, String)> {
        let header = fs::read_to_string(&pair.header_path).map_err(Error::file(&pair.header_path))?;
        let info = CaptureFileInfo::parse_metadata(&header).map_err(|e| match e {
            Error::Parse(msg) => Error::Parse(format!("{}: {msg}", pair.header_path.display())),
            other => other,
        })?;
        if info.capture_id() != self.capture_id {
            return Err(Error::Parse(format!(
                "{}: header names capture {} but file belongs to capture {}",
                pair.header_path.display(),
                info.capture_id(),
                self.capture_id
            )));
        }

        let data = fs::read_to_string(&pair.data_path).map_err(Error::file(&pair.data_path))?;
        Ok((info, merge(&header, &data)))
    }
}

/// Join header and data with exactly one line break between them
fn merge(header: &str, data: &str) -> String {
    let header = header.trim_end_matches(['\r', '\n']);
    let data = data.trim_end_matches(['\r', '\n']);
    let mut merged = String::with_capacity(header.len() + data.len() + 2);
    merged.push_str(header);
    merged.push('\n');
    if !data.is_empty() {
        merged.push_str(data);
        merged.push('\n');
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::CaptureLine;
    use crate::core::temporal::Timestamp;
    use tempfile::TempDir;

    fn line(secs: i64) -> CaptureLine {
        CaptureLine::new(Timestamp::from_secs(secs), vec![512, 512, 512]).unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CaptureWriter::new(temp_dir.path(), 20000.0, None, "ET0001").unwrap();
        writer.open().unwrap();
        for secs in [100, 101, 102] {
            writer.append(&line(secs)).unwrap();
        }
        writer.close().unwrap();
        let capture_id = writer.capture_id();

        let data_name = SegmentName::data(capture_id, 0).to_string();
        let header_name = SegmentName::header(capture_id, 0).to_string();
        assert_eq!(file_names(temp_dir.path()), {
            let mut expected = vec![data_name.clone(), header_name.clone()];
            expected.sort();
            expected
        });

        let data = fs::read_to_string(temp_dir.path().join(&data_name)).unwrap();
        assert_eq!(data.lines().count(), 3);
        let header = fs::read_to_string(temp_dir.path().join(&header_name)).unwrap();
        let parsed = CaptureFileInfo::parse_metadata(&header).unwrap();
        assert_eq!(parsed.start(), Timestamp::from_secs(100));
        assert_eq!(parsed.end(), Timestamp::from_secs(102));

        let packaged = CapturePackager::from_writer(&writer).package().unwrap();
        assert_eq!(packaged.len(), 1);

        let expected = CaptureFileInfo::new(
            Timestamp::from_secs(100),
            Timestamp::from_secs(102),
            capture_id,
            "ET0001",
            20000.0,
        )
        .unwrap();
        assert_eq!(packaged[0].info, expected);
        assert_eq!(
            packaged[0].output_path,
            temp_dir.path().join(expected.filename())
        );

        let merged = fs::read_to_string(&packaged[0].output_path).unwrap();
        assert_eq!(
            merged,
            format!(
                "{}\n100.000000,512,512,512\n101.000000,512,512,512\n102.000000,512,512,512\n",
                expected.generate_header().unwrap()
            )
        );
    }

    #[test]
    fn test_missing_header_aborts_without_output() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        writer.open().unwrap();
        writer.append(&line(1)).unwrap();
        writer.roll_segment().unwrap();
        writer.append(&line(2)).unwrap();
        writer.close().unwrap();

        let capture_id = writer.capture_id();
        let missing = temp_dir.path().join(SegmentName::header(capture_id, 1).to_string());
        fs::remove_file(&missing).unwrap();
        let before = file_names(temp_dir.path());

        let err = CapturePackager::new(temp_dir.path(), capture_id)
            .package()
            .unwrap_err();
        match err {
            Error::MissingHeader { header, data } => {
                assert_eq!(header, missing);
                assert_eq!(
                    data,
                    temp_dir.path().join(SegmentName::data(capture_id, 1).to_string())
                );
            }
            other => panic!("expected MissingHeader, got {other:?}"),
        }
        assert_eq!(file_names(temp_dir.path()), before);
    }

    #[test]
    fn test_numeric_segment_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        writer.open().unwrap();
        for secs in 0..12 {
            writer.append(&line(secs)).unwrap();
            writer.roll_segment().unwrap();
        }
        writer.close().unwrap();

        let packager = CapturePackager::from_writer(&writer);
        let indexes: Vec<u64> = packager.discover().unwrap().iter().map(|p| p.index).collect();
        assert_eq!(indexes, (0..12).collect::<Vec<_>>());

        let packaged = packager.package().unwrap();
        assert_eq!(packaged.len(), 12);
        for (segment, secs) in packaged.iter().zip(0..) {
            assert_eq!(segment.info.start(), Timestamp::from_secs(secs));
            assert!(segment.output_path.is_file());
        }
    }

    #[test]
    fn test_ignores_other_captures_and_strays() {
        let temp_dir = TempDir::new().unwrap();
        let mut ours = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        ours.with_session(|w| w.append(&line(1))).unwrap();
        let mut theirs = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        theirs.open().unwrap();
        theirs.append(&line(2)).unwrap();
        // `theirs` stays open: a DATA file without HEADER, but not ours.

        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(
            temp_dir
                .path()
                .join(SegmentName::header(ours.capture_id(), 7).to_string()),
            "orphan",
        )
        .unwrap();

        let packaged = CapturePackager::from_writer(&ours).package().unwrap();
        assert_eq!(packaged.len(), 1);
        assert_eq!(packaged[0].info.capture_id(), ours.capture_id());

        theirs.close().unwrap();
    }

    #[test]
    fn test_header_for_wrong_capture_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        writer.with_session(|w| w.append(&line(1))).unwrap();

        let impostor = Uuid::new_v4();
        for kind in [SegmentKind::Data, SegmentKind::Header] {
            let from = SegmentName::data(writer.capture_id(), 0).with_kind(kind);
            let to = SegmentName::data(impostor, 0).with_kind(kind);
            fs::rename(
                temp_dir.path().join(from.to_string()),
                temp_dir.path().join(to.to_string()),
            )
            .unwrap();
        }

        let err = CapturePackager::new(temp_dir.path(), impostor)
            .package()
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_uppercase_capture_id_pairs() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CaptureWriter::new(temp_dir.path(), 1.0, None, "n").unwrap();
        writer.with_session(|w| w.append(&line(1))).unwrap();

        let upper = writer.capture_id().hyphenated().to_string().to_uppercase();
        for kind in [SegmentKind::Data, SegmentKind::Header] {
            let from = SegmentName::data(writer.capture_id(), 0).with_kind(kind);
            fs::rename(
                temp_dir.path().join(from.to_string()),
                temp_dir.path().join(format!("capture_{upper}_{}_0", kind.tag())),
            )
            .unwrap();
        }

        let packager = CapturePackager::from_writer(&writer);
        let pairs = packager.discover().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs[0].header_path,
            temp_dir.path().join(format!("capture_{upper}_HEADER_0"))
        );

        let packaged = packager.package().unwrap();
        assert_eq!(packaged.len(), 1);
        assert_eq!(packaged[0].info.capture_id(), writer.capture_id());
        assert!(packaged[0].output_path.is_file());
    }

    #[test]
    fn test_missing_root_dir() {
        let temp_dir = TempDir::new().unwrap();
        let packager = CapturePackager::new(temp_dir.path().join("absent"), Uuid::new_v4());
        assert!(matches!(packager.package(), Err(Error::File { .. })));
    }

    #[test]
    fn test_merge() {
        assert_eq!(merge("h\n", "a\nb\n"), "h\na\nb\n");
        assert_eq!(merge("h\n\n", "a\r\n"), "h\na\n");
        assert_eq!(merge("h", ""), "h\n");
    }
}
