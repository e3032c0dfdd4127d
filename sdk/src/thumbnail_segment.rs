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

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a slice of thumbnail bytes goes inside one of the manifest segments.
///
/// `index` counts manifest segments only; the leading XMP entry of a
/// marker content list is never a splice target.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ThumbnailSegment {
    /// Manifest segment receiving the bytes.
    pub index: usize,
    /// Offset within that segment's payload.
    pub start: usize,
    /// Number of thumbnail bytes to insert.
    pub length: usize,
}

impl ThumbnailSegment {
    pub fn new(index: usize, start: usize, length: usize) -> Self {
        ThumbnailSegment {
            index,
            start,
            length,
        }
    }
}

/// Insert `thumbnail[cursor..cursor + segment.length]` into `original` at
/// `segment.start`.
///
/// Bytes of `original` from `start` onward are kept and shifted right.
pub fn augment(
    original: &[u8],
    segment: &ThumbnailSegment,
    thumbnail: &[u8],
    cursor: usize,
) -> Result<Vec<u8>> {
    if segment.start > original.len() {
        return Err(Error::OutOfRange(format!(
            "splice start {} is past the end of a {} byte payload",
            segment.start,
            original.len()
        )));
    }

    let end = cursor
        .checked_add(segment.length)
        .filter(|end| *end <= thumbnail.len())
        .ok_or_else(|| {
            Error::OutOfRange(format!(
                "thumbnail bytes {cursor}..{cursor}+{} exceed a {} byte thumbnail",
                segment.length,
                thumbnail.len()
            ))
        })?;

    let mut augmented = Vec::with_capacity(original.len() + segment.length);
    augmented.extend_from_slice(&original[..segment.start]);
    augmented.extend_from_slice(&thumbnail[cursor..end]);
    augmented.extend_from_slice(&original[segment.start..]);
    Ok(augmented)
}

/// A thumbnail buffer shared by several splices.
///
/// Each splice takes the next `length` bytes, so the buffer is handed out
/// in the order splices are made rather than by segment index.
#[derive(Debug)]
pub struct ThumbnailSource<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ThumbnailSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ThumbnailSource { bytes, cursor: 0 }
    }

    /// Offset of the next byte to hand out.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Splice the next `segment.length` bytes into `original` and advance.
    pub fn splice(&mut self, original: &[u8], segment: &ThumbnailSegment) -> Result<Vec<u8>> {
        let augmented = augment(original, segment, self.bytes, self.cursor)?;
        trace!(
            "spliced thumbnail bytes {}..{} into segment {} at {}",
            self.cursor,
            self.cursor + segment.length,
            segment.index,
            segment.start
        );
        self.cursor += segment.length;
        Ok(augmented)
    }
}
