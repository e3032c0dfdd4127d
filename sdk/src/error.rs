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

use thiserror::Error;

/// `Error` enumerates errors returned by APPn segment operations.
///
/// None of these are retried internally. Once a rewrite fails the output
/// written so far must be discarded by the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // --- container errors ---
    /// The input ended before the number of bytes a marker, length field
    /// or segment payload declared.
    #[error("stream truncated: needed {needed} bytes, {available} available")]
    TruncatedStream { needed: usize, available: usize },

    /// A thumbnail splice points outside the target payload or the
    /// thumbnail buffer.
    #[error("thumbnail splice out of range: {0}")]
    OutOfRange(String),

    /// The computed segment length does not fit the 16 bit length field.
    #[error("segment length {0} cannot be represented in a JPEG length field")]
    UnsupportedLength(usize),

    #[error("asset could not be parsed: {0}")]
    InvalidAsset(String),

    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("type is unsupported")]
    UnsupportedType,

    // --- third-party errors ---
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Base64Error(#[from] base64::DecodeError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    #[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
    ImageError(#[from] image::ImageError),

    #[error(transparent)]
    OtherError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// A specialized `Result` type for APPn segment operations.
pub type Result<T> = std::result::Result<T, Error>;
