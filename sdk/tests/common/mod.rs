// Copyright 2024 Adobe. All rights reserved.
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

#[allow(unused_macros)]
macro_rules! assert_err {
    ($expression:expr, $($pattern:tt)+) => {
        match $expression {
            $($pattern)+ => (),
            ref e => panic!("expected `{}` but got `{:?}`", stringify!($($pattern)+), e),
        }
    }
}
#[allow(unused_imports)]
pub(super) use assert_err;

pub const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/";

/// A marker segment with a computed length field.
pub fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFF, code];
    bytes.extend(((payload.len() + 2) as u16).to_be_bytes());
    bytes.extend(payload);
    bytes
}

/// An APP1 XMP segment exactly `total` bytes long.
pub fn xmp_segment(total: usize) -> Vec<u8> {
    let mut payload = XMP_SIGNATURE.to_vec();
    payload.push(0);
    payload.extend_from_slice(b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>");
    payload.resize(total - 4, b' ');
    segment(0xE1, &payload)
}

/// Builds structurally valid JPEG files without any image codec.
#[derive(Default)]
pub struct JpegBuilder {
    app_segments: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl JpegBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jfif(self) -> Self {
        self.app(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0")
    }

    pub fn exif(self) -> Self {
        self.app(0xE1, b"Exif\0\0II*\0\x08\0\0\0\0\0")
    }

    pub fn xmp(mut self, total: usize) -> Self {
        self.app_segments.push(xmp_segment(total));
        self
    }

    pub fn app(mut self, code: u8, payload: &[u8]) -> Self {
        self.app_segments.push(segment(code, payload));
        self
    }

    /// Length of the application segments, SOI included.
    pub fn header_len(&self) -> usize {
        2 + self.app_segments.iter().map(Vec::len).sum::<usize>()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        for seg in &self.app_segments {
            bytes.extend(seg);
        }
        bytes.extend(segment(0xDB, &[1u8; 65]));
        bytes.extend(segment(0xC0, &[8, 0, 8, 0, 8, 1, 1, 0x11, 0]));
        bytes.extend(segment(0xDA, &[1, 1, 0, 0, 0x3F, 0]));
        bytes.extend([0x12, 0x34, 0xFF, 0x00, 0x56, 0x78]);
        bytes.extend([0xFF, 0xD9]);
        bytes
    }
}

/// Markers of the segments img-parts finds in `bytes`.
#[allow(dead_code)]
pub fn parsed_markers(bytes: &[u8]) -> Vec<u8> {
    let jpeg = img_parts::jpeg::Jpeg::from_bytes(img_parts::Bytes::copy_from_slice(bytes))
        .unwrap_or_else(|e| panic!("output is not a parseable JPEG: {e:?}"));
    jpeg.segments().iter().map(|seg| seg.marker()).collect()
}
