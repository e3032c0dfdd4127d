// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Forward-only reading and writing of JPEG marker segments.

use std::io::{self, BufReader, ErrorKind, Read, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::{marker::Marker, Error, Result};

/// Largest value a JPEG length field can hold. The field counts itself.
pub const MAX_SEGMENT_LENGTH: usize = u16::MAX as usize;

/// Marker and length field of a segment, as read from or written to a stream.
///
/// Standalone markers such as `EOI` have no length field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentHeader {
    pub marker: Marker,
    pub length: Option<u16>,
}

impl SegmentHeader {
    pub fn new(marker: Marker, length: u16) -> Self {
        SegmentHeader {
            marker,
            length: Some(length),
        }
    }

    /// Number of payload bytes following the length field.
    pub fn payload_len(&self) -> Result<usize> {
        match self.length {
            Some(length) if length < 2 => Err(Error::InvalidAsset(format!(
                "{} segment length field {length} is smaller than 2",
                self.marker
            ))),
            Some(length) => Ok(length as usize - 2),
            None => Ok(0),
        }
    }

    /// Size of the whole segment in the stream: marker, length field and payload.
    pub fn total_len(&self) -> usize {
        2 + self.length.map_or(0, usize::from)
    }
}

/// Encode the length field for a segment with `payload_len` bytes of payload.
///
/// Totals below 256 are written with a zero high byte, larger totals as a
/// big-endian `u16`. Anything above [`MAX_SEGMENT_LENGTH`] is rejected.
pub fn encode_length(payload_len: usize) -> Result<[u8; 2]> {
    let total = payload_len
        .checked_add(2)
        .ok_or(Error::UnsupportedLength(payload_len))?;

    if total < 256 {
        return Ok([0x00, total as u8]);
    }

    let total = u16::try_from(total).map_err(|_| Error::UnsupportedLength(total))?;
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, total);
    Ok(bytes)
}

/// Reads marker, length and payload triples from a stream without seeking.
///
/// The cursor tracks how many bytes it has consumed so callers can report
/// offsets into the original stream.
pub struct SegmentCursor<R> {
    reader: R,
    position: u64,
}

impl<R: Read> SegmentCursor<R> {
    pub fn new(reader: R) -> Self {
        SegmentCursor {
            reader,
            position: 0,
        }
    }

    /// Bytes consumed from the underlying reader so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    // read as much of buf as the stream allows
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(Error::IoError(e)),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let available = self.fill(buf)?;
        if available < buf.len() {
            return Err(Error::TruncatedStream {
                needed: buf.len(),
                available,
            });
        }
        Ok(())
    }

    pub fn read_marker(&mut self) -> Result<Marker> {
        let mut bytes = [0u8; 2];
        self.fill_exact(&mut bytes)?;
        Ok(Marker::from_bytes(bytes))
    }

    /// Read a big-endian length field.
    pub fn read_length(&mut self) -> Result<u16> {
        let mut bytes = [0u8; 2];
        self.fill_exact(&mut bytes)?;
        Ok(BigEndian::read_u16(&bytes))
    }

    /// Read the next marker and, unless it is standalone, its length field.
    ///
    /// Returns `None` when the stream ends cleanly on a segment boundary.
    pub fn read_header(&mut self) -> Result<Option<SegmentHeader>> {
        let mut bytes = [0u8; 2];
        match self.fill(&mut bytes)? {
            0 => return Ok(None),
            1 => {
                return Err(Error::TruncatedStream {
                    needed: 2,
                    available: 1,
                })
            }
            _ => (),
        }

        let marker = Marker::from_bytes(bytes);
        let length = if marker.is_standalone() {
            None
        } else {
            Some(self.read_length()?)
        };

        Ok(Some(SegmentHeader { marker, length }))
    }

    pub fn read_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut payload = vec![0u8; len];
        self.fill_exact(&mut payload)?;
        Ok(payload)
    }

    /// Discard `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped < len {
            return Err(Error::TruncatedStream {
                needed: len as usize,
                available: skipped as usize,
            });
        }
        Ok(())
    }
}

impl<R: Read> Read for SegmentCursor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

/// Writes markers, computed length fields and payloads to an output sink.
pub struct SegmentWriter<W> {
    writer: W,
    position: u64,
}

impl<W: Write> SegmentWriter<W> {
    pub fn new(writer: W) -> Self {
        SegmentWriter {
            writer,
            position: 0,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_marker(&mut self, marker: Marker) -> Result<()> {
        self.write_raw(&marker.to_bytes())
    }

    /// Write a header exactly as it was read.
    pub fn write_header(&mut self, header: &SegmentHeader) -> Result<()> {
        self.write_marker(header.marker)?;
        if let Some(length) = header.length {
            self.writer.write_u16::<BigEndian>(length)?;
            self.position += 2;
        }
        Ok(())
    }

    /// Write a complete segment, computing its length field from the payload.
    ///
    /// Nothing is written when the payload is too large for a length field.
    /// Returns the number of bytes written.
    pub fn write_segment(&mut self, marker: Marker, payload: &[u8]) -> Result<usize> {
        let length = encode_length(payload.len())?;
        self.write_marker(marker)?;
        self.write_raw(&length)?;
        self.write_raw(payload)?;
        Ok(2 + length.len() + payload.len())
    }

    /// Copy everything left in `reader` through a buffer of `buf_size` bytes.
    pub fn copy_remainder<R: Read>(&mut self, reader: R, buf_size: usize) -> Result<u64> {
        let mut reader = BufReader::with_capacity(buf_size.max(1), reader);
        let copied = io::copy(&mut reader, &mut self.writer)?;
        self.position += copied;
        Ok(copied)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::IoError)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_encode_length() {
        assert_eq!(encode_length(1).unwrap(), [0x00, 0x03]);
        assert_eq!(encode_length(253).unwrap(), [0x00, 0xFF]);
        // 258 + 2 = 0x104, padded to 0x0104
        assert_eq!(encode_length(258).unwrap(), [0x01, 0x04]);
        assert_eq!(encode_length(0xFFF9).unwrap(), [0xFF, 0xFB]);
        assert_eq!(encode_length(MAX_SEGMENT_LENGTH - 2).unwrap(), [0xFF, 0xFF]);

        match encode_length(MAX_SEGMENT_LENGTH - 1) {
            Err(Error::UnsupportedLength(len)) => assert_eq!(len, 0x10000),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_read_header() {
        let data = [0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];
        let mut cursor = SegmentCursor::new(Cursor::new(&data[..]));

        let app0 = cursor.read_header().unwrap().unwrap();
        assert_eq!(app0, SegmentHeader::new(Marker::APP0, 16));
        assert_eq!(app0.payload_len().unwrap(), 14);
        assert_eq!(app0.total_len(), 18);

        let eoi = cursor.read_header().unwrap().unwrap();
        assert_eq!(eoi.marker, Marker::EOI);
        assert_eq!(eoi.length, None);
        assert_eq!(eoi.total_len(), 2);

        assert!(cursor.read_header().unwrap().is_none());
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_truncated_reads() {
        let mut cursor = SegmentCursor::new(Cursor::new(vec![0xFF]));
        assert!(matches!(
            cursor.read_header(),
            Err(Error::TruncatedStream {
                needed: 2,
                available: 1
            })
        ));

        let mut cursor = SegmentCursor::new(Cursor::new(vec![0xFF, 0xE1, 0x00]));
        assert!(matches!(
            cursor.read_header(),
            Err(Error::TruncatedStream { .. })
        ));

        let mut cursor = SegmentCursor::new(Cursor::new(vec![1, 2, 3]));
        assert!(matches!(
            cursor.read_payload(5),
            Err(Error::TruncatedStream {
                needed: 5,
                available: 3
            })
        ));

        let mut cursor = SegmentCursor::new(Cursor::new(vec![1, 2, 3]));
        assert!(matches!(
            cursor.skip(4),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_skip_is_forward_only() {
        let mut cursor = SegmentCursor::new(Cursor::new(vec![0, 1, 2, 0xFF, 0xE1]));
        cursor.skip(3).unwrap();
        assert_eq!(cursor.read_marker().unwrap(), Marker::APP1);
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_bad_length_field() {
        let header = SegmentHeader::new(Marker::APP1, 1);
        assert!(matches!(header.payload_len(), Err(Error::InvalidAsset(_))));
    }

    #[test]
    fn test_writer() {
        let mut writer = SegmentWriter::new(Vec::new());
        writer.write_marker(Marker::SOI).unwrap();
        let written = writer.write_segment(Marker::APP11, b"X").unwrap();
        assert_eq!(written, 5);
        writer
            .write_header(&SegmentHeader::new(Marker::DQT, 0x0043))
            .unwrap();
        writer
            .copy_remainder(Cursor::new(vec![9, 9, 9]), 2)
            .unwrap();
        assert_eq!(writer.position(), 14);
        assert_eq!(
            writer.into_inner(),
            vec![0xFF, 0xD8, 0xFF, 0xEB, 0x00, 0x03, b'X', 0xFF, 0xDB, 0x00, 0x43, 9, 9, 9]
        );
    }

    #[test]
    fn test_oversize_segment_writes_nothing() {
        let mut writer = SegmentWriter::new(Vec::new());
        let payload = vec![0u8; MAX_SEGMENT_LENGTH];
        assert!(matches!(
            writer.write_segment(Marker::APP11, &payload),
            Err(Error::UnsupportedLength(_))
        ));
        assert_eq!(writer.position(), 0);
        assert!(writer.into_inner().is_empty());
    }
}
