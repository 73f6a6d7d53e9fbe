//! JPEG container layout.
//!
//! A JPEG file is modeled as the SOI marker, an ordered list of
//! length-prefixed marker segments, and the tail starting at the first SOS
//! marker (scan header plus entropy-coded data), which is kept as raw bytes.

use crate::error::CodecError;

const MARKER: u8 = 0xff;
const SOI: u8 = 0xd8;
const EOI: u8 = 0xd9;
const SOS: u8 = 0xda;
pub(crate) const APP0: u8 = 0xe0;
pub(crate) const APP1: u8 = 0xe1;

/// Prefix of the APP1 payload that carries EXIF data
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";
const JFIF_HEADER: &[u8] = b"JFIF\0";

/// Largest payload a length-prefixed segment can carry
pub const MAX_SEGMENT_PAYLOAD: usize = 0xffff - 2;

/// One marker segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub marker: u8,
    /// Segment data without the marker and length bytes
    pub payload: Vec<u8>,
}

impl Segment {
    fn is_exif(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(EXIF_HEADER)
    }

    fn is_jfif(&self) -> bool {
        self.marker == APP0 && self.payload.starts_with(JFIF_HEADER)
    }
}

/// Markers that stand alone without a length field
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xd0..=0xd7)
}

/// Parsed JPEG container
#[derive(Debug, Clone)]
pub struct JpegLayout {
    pub segments: Vec<Segment>,
    /// Everything from the first SOS (or EOI) marker on
    pub scan: Vec<u8>,
}

impl JpegLayout {
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < 4 || bytes[0] != MARKER || bytes[1] != SOI {
            return Err(malformed("missing SOI marker"));
        }

        let mut segments = Vec::new();
        let mut pos = 2;
        loop {
            if pos >= bytes.len() {
                // truncated before any scan data
                return Ok(Self {
                    segments,
                    scan: Vec::new(),
                });
            }
            if bytes[pos] != MARKER {
                return Err(malformed(format!("expected marker at offset {}", pos)));
            }
            // skip fill bytes
            while pos + 1 < bytes.len() && bytes[pos + 1] == MARKER {
                pos += 1;
            }
            let Some(&marker) = bytes.get(pos + 1) else {
                return Err(malformed("truncated marker"));
            };

            if marker == SOS || marker == EOI {
                return Ok(Self {
                    segments,
                    scan: bytes[pos..].to_vec(),
                });
            }
            if is_standalone(marker) {
                segments.push(Segment {
                    marker,
                    payload: Vec::new(),
                });
                pos += 2;
                continue;
            }

            let len = match bytes.get(pos + 2..pos + 4) {
                Some(b) => usize::from(u16::from_be_bytes([b[0], b[1]])),
                None => return Err(malformed("truncated segment length")),
            };
            if len < 2 {
                return Err(malformed(format!("segment length {} at offset {}", len, pos)));
            }
            let end = pos + 2 + len;
            let payload = bytes
                .get(pos + 4..end)
                .ok_or_else(|| malformed(format!("segment at offset {} overruns file", pos)))?;
            segments.push(Segment {
                marker,
                payload: payload.to_vec(),
            });
            pos = end;
        }
    }

    /// TIFF data of the first EXIF segment
    pub fn exif(&self) -> Option<&[u8]> {
        self.segments
            .iter()
            .find(|s| s.is_exif())
            .map(|s| &s.payload[EXIF_HEADER.len()..])
    }

    /// Replace the EXIF segment with `blob`.
    ///
    /// The new segment takes the place of the old one; without an old one it
    /// goes right after SOI, or after a leading JFIF header that is kept.
    /// With `drop_jfif` the JFIF header is removed first.
    pub fn set_exif(&mut self, blob: &[u8], drop_jfif: bool) -> Result<(), CodecError> {
        let len = EXIF_HEADER.len() + blob.len();
        if len > MAX_SEGMENT_PAYLOAD {
            return Err(CodecError::SegmentTooLarge { len });
        }
        if drop_jfif {
            self.segments.retain(|s| !s.is_jfif());
        }

        let old = self.segments.iter().position(Segment::is_exif);
        self.segments.retain(|s| !s.is_exif());
        let at = old.unwrap_or_else(|| match self.segments.first() {
            Some(first) if first.is_jfif() => 1,
            _ => 0,
        });

        let mut payload = Vec::with_capacity(len);
        payload.extend_from_slice(EXIF_HEADER);
        payload.extend_from_slice(blob);
        self.segments.insert(
            at,
            Segment {
                marker: APP1,
                payload,
            },
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self
            .segments
            .iter()
            .map(|s| s.payload.len() + 4)
            .sum::<usize>();
        let mut out = Vec::with_capacity(2 + size + self.scan.len());
        out.extend_from_slice(&[MARKER, SOI]);
        for segment in &self.segments {
            out.extend_from_slice(&[MARKER, segment.marker]);
            if !is_standalone(segment.marker) {
                // set_exif and parse keep payloads within MAX_SEGMENT_PAYLOAD
                let len = (segment.payload.len() + 2) as u16;
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(&segment.payload);
            }
        }
        out.extend_from_slice(&self.scan);
        out
    }
}

fn malformed(reason: impl Into<String>) -> CodecError {
    CodecError::MalformedContainer {
        reason: reason.into(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal JPEG: SOI, JFIF APP0, a DQT stub, then SOS + data + EOI
    pub(crate) fn sample_jpeg() -> Vec<u8> {
        let mut bytes = vec![0xff, 0xd8];
        bytes.extend_from_slice(&[0xff, 0xe0, 0x00, 0x07]);
        bytes.extend_from_slice(b"JFIF\0");
        bytes.extend_from_slice(&[0xff, 0xdb, 0x00, 0x04, 0x01, 0x02]);
        bytes.extend_from_slice(&[0xff, 0xda, 0x00, 0x02, 0x12, 0x34, 0xff, 0xd9]);
        bytes
    }

    #[test]
    fn parse_then_serialize_is_identity() {
        let bytes = sample_jpeg();
        let layout = JpegLayout::parse(&bytes).unwrap();
        assert_eq!(layout.segments.len(), 2);
        assert_eq!(layout.segments[0].marker, APP0);
        assert_eq!(layout.scan[..2], [0xff, 0xda]);
        assert_eq!(layout.to_bytes(), bytes);
    }

    #[test]
    fn set_exif_after_jfif_when_kept() {
        let mut layout = JpegLayout::parse(&sample_jpeg()).unwrap();
        layout.set_exif(b"II*\0", false).unwrap();
        assert_eq!(layout.segments[0].marker, APP0);
        assert_eq!(layout.segments[1].marker, APP1);
        assert_eq!(layout.exif(), Some(&b"II*\0"[..]));
    }

    #[test]
    fn set_exif_directly_after_soi_when_jfif_dropped() {
        let mut layout = JpegLayout::parse(&sample_jpeg()).unwrap();
        layout.set_exif(b"MM\0*", true).unwrap();
        let bytes = layout.to_bytes();
        assert_eq!(bytes[..4], [0xff, 0xd8, 0xff, 0xe1]);
        assert_eq!(&bytes[6..12], EXIF_HEADER);
    }

    #[test]
    fn set_exif_replaces_in_place() {
        let mut layout = JpegLayout::parse(&sample_jpeg()).unwrap();
        layout.set_exif(b"first", false).unwrap();
        layout.set_exif(b"second", false).unwrap();
        let exif_segments = layout.segments.iter().filter(|s| s.is_exif()).count();
        assert_eq!(exif_segments, 1);
        assert_eq!(layout.exif(), Some(&b"second"[..]));
        assert_eq!(layout.segments[1].marker, APP1);
    }

    #[test]
    fn oversized_exif_is_rejected() {
        let mut layout = JpegLayout::parse(&sample_jpeg()).unwrap();
        let blob = vec![0u8; MAX_SEGMENT_PAYLOAD];
        assert!(matches!(
            layout.set_exif(&blob, false),
            Err(CodecError::SegmentTooLarge { .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(JpegLayout::parse(b"not a jpeg").is_err());
        let mut bytes = sample_jpeg();
        bytes.truncate(8);
        assert!(JpegLayout::parse(&bytes).is_err());
    }
}
