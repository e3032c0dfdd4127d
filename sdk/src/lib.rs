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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! This library embeds C2PA provenance data, an XMP packet and one or more
//! JUMBF manifest segments, into JPEG images as APPn marker segments.
//!
//! The original image is streamed once into a new destination; image data
//! is never decoded. Segments are placed in ascending marker order among
//! the existing application segments, and an existing XMP segment is
//! replaced.
//!
//! # Example: Inserting a manifest segment
//!
//! ```
//! # use c2pa_appn::Result;
//! use c2pa_appn::{get_jumbf_insertion_point, AppNWriter, MarkerContent};
//!
//! # fn main() -> Result<()> {
//! // SOI, a 4 byte APP0 segment, EOI
//! let original: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, b'h', b'i', 0xFF, 0xD9];
//!
//! let point = get_jumbf_insertion_point(original)?;
//! assert_eq!(point, 8);
//!
//! let mut output = Vec::new();
//! let report =
//!     AppNWriter::new().insert_appn_content(original, &mut output, &[MarkerContent::jumbf(*b"X")])?;
//!
//! assert_eq!(report.inserted[0].offset, point);
//! assert_eq!(&output[8..13], &[0xFF, 0xEB, 0x00, 0x03, b'X']);
//! # Ok(())
//! # }
//! ```

pub mod asset_handlers;
pub use asset_handlers::jpeg_io::{
    get_jumbf_insertion_point, is_xmp_segment, AppNWriter, InsertedSegment, InsertionPointCalculator,
    InsertionReport, SegmentInfo,
};

pub mod creation_info;
pub use creation_info::{AssetInfo, CreationInfo, CreationInfoV2};

mod error;
pub use error::{Error, Result};

#[cfg(feature = "file_io")]
pub mod file_helper;
#[cfg(feature = "file_io")]
pub use file_helper::C2paFileHelper;

pub mod marker;
pub use marker::{Marker, MarkerContent};

pub mod segment_io;

pub mod settings;
pub use settings::Settings;

pub mod thumbnail_segment;
pub use thumbnail_segment::{ThumbnailSegment, ThumbnailSource};

pub mod utils;
#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
pub use utils::thumbnail::ReproducibleThumbnailer;
pub use utils::{hash_utils::hash_of_bytes, thumbnail::ThumbnailGenerator};
