//! Segment file naming: `capture_{capture_id}_{DATA|HEADER}_{index}`

use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, value, verify},
    sequence::tuple,
    IResult,
};
use std::fmt;
use uuid::Uuid;

/// Prefix shared by every segment file
pub const SEGMENT_PREFIX: &str = "capture_";

/// Length of a hyphenated UUID
const UUID_LEN: usize = 36;

/// Which half of a segment a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Data,
    Header,
}

impl SegmentKind {
    /// Type tag embedded in the file name
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Header => "HEADER",
        }
    }
}

/// Parsed form of a segment file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentName {
    pub capture_id: Uuid,
    pub kind: SegmentKind,
    pub index: u64,
}

impl SegmentName {
    pub fn data(capture_id: Uuid, index: u64) -> Self {
        Self {
            capture_id,
            kind: SegmentKind::Data,
            index,
        }
    }

    pub fn header(capture_id: Uuid, index: u64) -> Self {
        Self {
            capture_id,
            kind: SegmentKind::Header,
            index,
        }
    }

    /// The other file of the same segment is found by swapping the type tag.
    pub fn with_kind(self, kind: SegmentKind) -> Self {
        Self { kind, ..self }
    }

    /// Parse a file name. Names that are not segment files give `None`.
    pub fn parse(name: &str) -> Option<Self> {
        all_consuming(segment_name)(name)
            .ok()
            .map(|(_, parsed)| parsed)
    }
}

/// Name of the other file of the segment `file_name` belongs to.
///
/// The capture id keeps the spelling used in `file_name`, so a pair written
/// with an uppercase id is still found as a pair.
pub fn sibling_file_name(file_name: &str, kind: SegmentKind) -> Option<String> {
    let name = SegmentName::parse(file_name)?;
    let id_text = file_name.get(SEGMENT_PREFIX.len()..SEGMENT_PREFIX.len() + UUID_LEN)?;
    Some(format!(
        "{SEGMENT_PREFIX}{id_text}_{}_{}",
        kind.tag(),
        name.index
    ))
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}_{}",
            SEGMENT_PREFIX,
            self.capture_id.hyphenated(),
            self.kind.tag(),
            self.index
        )
    }
}

fn capture_id(input: &str) -> IResult<&str, Uuid> {
    // Only the hyphenated form is exactly 36 characters long.
    map_res(take(UUID_LEN), Uuid::try_parse)(input)
}

fn kind(input: &str) -> IResult<&str, SegmentKind> {
    alt((
        value(SegmentKind::Data, tag(SegmentKind::Data.tag())),
        value(SegmentKind::Header, tag(SegmentKind::Header.tag())),
    ))(input)
}

fn index(input: &str) -> IResult<&str, u64> {
    map_res(
        verify(digit1, |digits: &str| digits == "0" || !digits.starts_with('0')),
        str::parse::<u64>,
    )(input)
}

fn segment_name(input: &str) -> IResult<&str, SegmentName> {
    map(
        tuple((tag(SEGMENT_PREFIX), capture_id, char('_'), kind, char('_'), index)),
        |(_, capture_id, _, kind, _, index)| SegmentName {
            capture_id,
            kind,
            index,
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b";

    #[test]
    fn test_format() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(
            SegmentName::data(id, 0).to_string(),
            format!("capture_{ID}_DATA_0")
        );
        assert_eq!(
            SegmentName::header(id, 12).to_string(),
            format!("capture_{ID}_HEADER_12")
        );
    }

    #[test]
    fn test_parse() {
        let parsed = SegmentName::parse(&format!("capture_{ID}_DATA_10")).unwrap();
        assert_eq!(parsed.capture_id, Uuid::parse_str(ID).unwrap());
        assert_eq!(parsed.kind, SegmentKind::Data);
        assert_eq!(parsed.index, 10);

        let header = parsed.with_kind(SegmentKind::Header);
        assert_eq!(header.to_string(), format!("capture_{ID}_HEADER_10"));
        assert_eq!(SegmentName::parse(&header.to_string()), Some(header));
    }

    #[test]
    fn test_parse_uppercase_uuid() {
        let upper = ID.to_uppercase();
        let parsed = SegmentName::parse(&format!("capture_{upper}_HEADER_3")).unwrap();
        assert_eq!(parsed.capture_id, Uuid::parse_str(ID).unwrap());
    }

    #[test]
    fn test_sibling_keeps_id_spelling() {
        let upper = ID.to_uppercase();
        assert_eq!(
            sibling_file_name(&format!("capture_{upper}_DATA_4"), SegmentKind::Header),
            Some(format!("capture_{upper}_HEADER_4"))
        );
        assert_eq!(
            sibling_file_name(&format!("capture_{ID}_HEADER_0"), SegmentKind::Data),
            Some(format!("capture_{ID}_DATA_0"))
        );
        assert_eq!(sibling_file_name("notes.txt", SegmentKind::Header), None);
    }

    #[test]
    fn test_non_matching_names() {
        let names = [
            String::new(),
            "notes.txt".to_string(),
            format!("capture_{ID}_DATA_"),
            format!("capture_{ID}_DATA_01"),
            format!("capture_{ID}_DATA_-1"),
            format!("capture_{ID}_data_1"),
            format!("capture_{ID}_INDEX_1"),
            format!("capture_{ID}_DATA_1.bak"),
            format!("hbcapture_{ID}_DATA_1"),
            "capture_6f1c2a3b4d5e4f608a7b9c0d1e2f3a4b_DATA_1".to_string(),
            format!("capture_{ID}_DATA_99999999999999999999999"),
        ];
        for name in names {
            assert_eq!(SegmentName::parse(&name), None, "{name:?} should not match");
        }
    }
}
