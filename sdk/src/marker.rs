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

use std::{cmp::Ordering, fmt};

use crate::{Error, Result};

const APP_FIRST: u8 = 0xE0;
const APP_LAST: u8 = 0xEF;

/// A two byte JPEG marker, `0xFF` followed by the marker code.
///
/// Markers read from a stream start with `0xFF`, so ordering follows the
/// code byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Marker([u8; 2]);

impl Marker {
    /// Start of image.
    pub const SOI: Marker = Marker::new(0xD8);
    /// End of image.
    pub const EOI: Marker = Marker::new(0xD9);
    /// Start of scan.
    pub const SOS: Marker = Marker::new(0xDA);
    /// Define quantization table(s).
    pub const DQT: Marker = Marker::new(0xDB);
    /// JFIF application segment, mandatory first segment of most files.
    pub const APP0: Marker = Marker::new(0xE0);
    /// EXIF and XMP application segment.
    pub const APP1: Marker = Marker::new(0xE1);
    /// JPEG XT / JUMBF application segment carrying C2PA manifests.
    pub const APP11: Marker = Marker::new(0xEB);
    pub const APP15: Marker = Marker::new(0xEF);

    pub const fn new(code: u8) -> Self {
        Marker([0xFF, code])
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Marker(bytes)
    }

    /// Returns the `APPn` marker for `n` in `0..=15`.
    pub fn app(n: u8) -> Result<Self> {
        if n > APP_LAST - APP_FIRST {
            return Err(Error::BadParam(format!("APP{n} is not a JPEG marker")));
        }
        Ok(Marker::new(APP_FIRST + n))
    }

    /// The second byte of the marker.
    pub const fn code(&self) -> u8 {
        self.0[1]
    }

    pub const fn to_bytes(&self) -> [u8; 2] {
        self.0
    }

    /// True for application segment markers `APP0..=APP15`.
    pub const fn is_app(&self) -> bool {
        self.0[0] == 0xFF && self.0[1] >= APP_FIRST && self.0[1] <= APP_LAST
    }

    /// True for markers that are not followed by a length field.
    pub const fn is_standalone(&self) -> bool {
        matches!(self.0[1], 0x01 | 0xD0..=0xD9)
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0[1] {
            0xD8 => write!(f, "SOI"),
            0xD9 => write!(f, "EOI"),
            0xDA => write!(f, "SOS"),
            0xDB => write!(f, "DQT"),
            code @ APP_FIRST..=APP_LAST => write!(f, "APP{}", code - APP_FIRST),
            _ => write!(f, "{:02X}{:02X}", self.0[0], self.0[1]),
        }
    }
}

/// A new segment to insert: a marker and the payload that follows its
/// length field.
///
/// Lists of `MarkerContent` are ordered; that order is kept in the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerContent {
    pub marker: Marker,
    pub content: Vec<u8>,
}

impl MarkerContent {
    pub fn new(marker: Marker, content: impl Into<Vec<u8>>) -> Self {
        MarkerContent {
            marker,
            content: content.into(),
        }
    }

    /// An APP1 segment holding an XMP packet.
    pub fn xmp(content: impl Into<Vec<u8>>) -> Self {
        Self::new(Marker::APP1, content)
    }

    /// An APP11 segment holding a JUMBF manifest block.
    pub fn jumbf(content: impl Into<Vec<u8>>) -> Self {
        Self::new(Marker::APP11, content)
    }
}
