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

use std::{
    borrow::Cow,
    io::{Read, Write},
};

use log::{debug, trace};

use crate::{
    error::{Error, Result},
    marker::{Marker, MarkerContent},
    segment_io::{SegmentCursor, SegmentHeader, SegmentWriter},
    settings::WriterSettings,
    thumbnail_segment::{ThumbnailSegment, ThumbnailSource},
};

const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/";

/// Returns true if the segment is an APP1 segment whose payload begins with
/// the XMP namespace signature.
pub fn is_xmp_segment(marker: Marker, payload: &[u8]) -> bool {
    marker == Marker::APP1 && payload.starts_with(XMP_SIGNATURE)
}

// Receives each original segment the walker passes over.
trait SegmentSink {
    fn keep(&mut self, header: &SegmentHeader, payload: &[u8]) -> Result<()>;

    fn strip(&mut self, header: &SegmentHeader, payload: &[u8]) -> Result<()>;
}

// Single forward pass over the leading application segments. The rewriter
// and the insertion point calculator both drive this, only their sinks differ.
struct SegmentWalker<R> {
    cursor: SegmentCursor<R>,
    // next original segment not yet handed to a sink
    current: Option<SegmentHeader>,
    strip_xmp: bool,
}

impl<R: Read> SegmentWalker<R> {
    fn start(reader: R, strip_xmp: bool) -> Result<Self> {
        let mut cursor = SegmentCursor::new(reader);

        let soi = cursor.read_marker()?;
        if soi != Marker::SOI {
            return Err(Error::InvalidAsset(format!(
                "expected SOI marker, found {soi}"
            )));
        }

        let current = cursor.read_header()?;

        Ok(SegmentWalker {
            cursor,
            current,
            strip_xmp,
        })
    }

    /// Hand every APPn segment with a code below `limit` to `sink`.
    fn advance_below(&mut self, limit: Marker, sink: &mut impl SegmentSink) -> Result<()> {
        while let Some(header) = self.current {
            if !header.marker.is_app() || header.marker.code() >= limit.code() {
                break;
            }

            let payload = self.cursor.read_payload(header.payload_len()?)?;
            if self.strip_xmp && is_xmp_segment(header.marker, &payload) {
                sink.strip(&header, &payload)?;
            } else {
                sink.keep(&header, &payload)?;
            }

            self.current = self.cursor.read_header()?;
        }
        Ok(())
    }

    fn finish(self) -> (Option<SegmentHeader>, SegmentCursor<R>) {
        (self.current, self.cursor)
    }
}

struct CopySink<'a, W> {
    output: &'a mut SegmentWriter<W>,
    stripped: usize,
}

impl<W: Write> SegmentSink for CopySink<'_, W> {
    fn keep(&mut self, header: &SegmentHeader, payload: &[u8]) -> Result<()> {
        trace!("copying {} segment ({} bytes)", header.marker, header.total_len());
        self.output.write_header(header)?;
        self.output.write_raw(payload)
    }

    fn strip(&mut self, header: &SegmentHeader, _payload: &[u8]) -> Result<()> {
        debug!("removing existing XMP segment ({} bytes)", header.total_len());
        self.stripped += header.total_len();
        Ok(())
    }
}

struct ScanSink {
    // offset in the original stream
    original_offset: u64,
    segments: Vec<SegmentInfo>,
}

impl SegmentSink for ScanSink {
    fn keep(&mut self, header: &SegmentHeader, _payload: &[u8]) -> Result<()> {
        self.record(header, false);
        Ok(())
    }

    fn strip(&mut self, header: &SegmentHeader, _payload: &[u8]) -> Result<()> {
        self.record(header, true);
        Ok(())
    }
}

impl ScanSink {
    fn new() -> Self {
        ScanSink {
            original_offset: 2,
            segments: Vec::new(),
        }
    }

    fn record(&mut self, header: &SegmentHeader, stripped: bool) {
        self.segments.push(SegmentInfo {
            marker: header.marker,
            offset: self.original_offset,
            total_len: header.total_len(),
            stripped,
        });
        self.original_offset += header.total_len() as u64;
    }
}

/// An application segment found ahead of the manifest insertion point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentInfo {
    pub marker: Marker,
    /// Offset of the marker in the original stream.
    pub offset: u64,
    /// Marker, length field and payload.
    pub total_len: usize,
    /// True if a rewrite would drop this segment.
    pub stripped: bool,
}

/// One segment written by [`AppNWriter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertedSegment {
    pub marker: Marker,
    /// Offset of the marker in the output.
    pub offset: u64,
    /// Marker, length field and payload, thumbnail bytes included.
    pub total_len: usize,
    /// Thumbnail bytes spliced into the payload.
    pub thumbnail_len: usize,
}

/// Summary of a completed rewrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertionReport {
    pub bytes_written: u64,
    /// Total size of XMP segments removed from the original.
    pub stripped_xmp_bytes: usize,
    /// Inserted segments in the order they were written.
    pub inserted: Vec<InsertedSegment>,
}

/// Writer for APPn contents within a JPEG.
///
/// The original stream is read once, front to back, and copied to an
/// independent destination. New segments are placed in front of the first
/// original segment whose marker is not an application marker lower than
/// their own, which keeps application segments in ascending marker order.
/// An existing XMP segment met on the way is dropped.
///
/// Both streams are taken by value and dropped, closing them, whether the
/// rewrite succeeds or fails. Pass `&mut` references to keep ownership.
#[derive(Clone, Debug, Default)]
pub struct AppNWriter {
    settings: WriterSettings,
}

impl AppNWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: WriterSettings) -> Self {
        AppNWriter { settings }
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Copy `original` to `destination`, inserting `content` in order.
    pub fn insert_appn_content<R: Read, W: Write>(
        &self,
        original: R,
        destination: W,
        content: &[MarkerContent],
    ) -> Result<InsertionReport> {
        self.insert_appn_content_with_thumbnail(original, destination, content, &[], &[])
    }

    /// Copy `original` to `destination`, inserting `content` in order and
    /// splicing `thumbnail_jpeg` into the manifest segments named by
    /// `thumbnail_segments`.
    ///
    /// The first entry of `content` is the XMP replacement and never receives
    /// thumbnail bytes; a [`ThumbnailSegment`] with `index` i targets
    /// `content[i + 1]`. Thumbnail bytes are consumed front to back in the
    /// order the targeted entries appear in `content`.
    ///
    /// On error the destination holds a partial, invalid file.
    pub fn insert_appn_content_with_thumbnail<R: Read, W: Write>(
        &self,
        original: R,
        destination: W,
        content: &[MarkerContent],
        thumbnail_jpeg: &[u8],
        thumbnail_segments: &[ThumbnailSegment],
    ) -> Result<InsertionReport> {
        validate_content(content)?;

        let mut walker = SegmentWalker::start(original, self.settings.strip_xmp)?;
        let mut output = SegmentWriter::new(destination);
        output.write_marker(Marker::SOI)?;

        let mut thumbnail = ThumbnailSource::new(thumbnail_jpeg);
        let mut report = InsertionReport::default();

        for (position, entry) in content.iter().enumerate() {
            let mut sink = CopySink {
                output: &mut output,
                stripped: 0,
            };
            walker.advance_below(entry.marker, &mut sink)?;
            report.stripped_xmp_bytes += sink.stripped;

            let (payload, thumbnail_len) = match splice_target(position, thumbnail_segments) {
                Some(segment) => (
                    Cow::Owned(thumbnail.splice(&entry.content, segment)?),
                    segment.length,
                ),
                None => (Cow::Borrowed(entry.content.as_slice()), 0),
            };

            let offset = output.position();
            let total_len = output.write_segment(entry.marker, &payload)?;
            debug!(
                "inserted {} segment of {total_len} bytes at offset {offset}",
                entry.marker
            );

            report.inserted.push(InsertedSegment {
                marker: entry.marker,
                offset,
                total_len,
                thumbnail_len,
            });
        }

        // the segment the last scan stopped on has been read but not written
        let (current, cursor) = walker.finish();
        if let Some(header) = current {
            output.write_header(&header)?;
        }
        output.copy_remainder(cursor, self.settings.copy_buffer_size)?;
        output.flush()?;

        report.bytes_written = output.position();
        Ok(report)
    }
}

fn validate_content(content: &[MarkerContent]) -> Result<()> {
    match content.iter().find(|entry| !entry.marker.is_app()) {
        Some(entry) => Err(Error::BadParam(format!(
            "{} is not an application segment marker",
            entry.marker
        ))),
        None => Ok(()),
    }
}

// entry 0 is the XMP replacement, thumbnail indexes count from entry 1
fn splice_target(position: usize, segments: &[ThumbnailSegment]) -> Option<&ThumbnailSegment> {
    let index = position.checked_sub(1)?;
    segments.iter().find(|segment| segment.index == index)
}

/// Computes where manifest segments will be inserted, without writing.
///
/// Uses the same scan as [`AppNWriter`], so for equal settings the offset
/// returned here is where the rewrite places a manifest segment when no
/// other entries precede it.
#[derive(Clone, Debug)]
pub struct InsertionPointCalculator {
    manifest_marker: Marker,
    strip_xmp: bool,
}

impl Default for InsertionPointCalculator {
    fn default() -> Self {
        InsertionPointCalculator {
            manifest_marker: Marker::APP11,
            strip_xmp: true,
        }
    }
}

impl InsertionPointCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &WriterSettings) -> Self {
        InsertionPointCalculator {
            strip_xmp: settings.strip_xmp,
            ..Default::default()
        }
    }

    /// Compute the insertion point for segments with this marker instead of APP11.
    pub fn manifest_marker(mut self, marker: Marker) -> Self {
        self.manifest_marker = marker;
        self
    }

    /// Byte offset, counted in the original stream with XMP removed, at
    /// which the manifest segments will be inserted.
    pub fn insertion_point<R: Read>(&self, stream: R) -> Result<u64> {
        let offset = 2 + self
            .scan(stream)?
            .iter()
            .filter(|segment| !segment.stripped)
            .map(|segment| segment.total_len as u64)
            .sum::<u64>();

        debug!("{} insertion point: {offset}", self.manifest_marker);
        Ok(offset)
    }

    /// List the application segments ahead of the insertion point.
    pub fn scan<R: Read>(&self, stream: R) -> Result<Vec<SegmentInfo>> {
        let mut walker = SegmentWalker::start(stream, self.strip_xmp)?;
        let mut sink = ScanSink::new();
        walker.advance_below(self.manifest_marker, &mut sink)?;
        Ok(sink.segments)
    }
}

/// Byte offset at which JUMBF (APP11) segments will be inserted, using
/// default settings.
pub fn get_jumbf_insertion_point<R: Read>(stream: R) -> Result<u64> {
    InsertionPointCalculator::new().insertion_point(stream)
}
