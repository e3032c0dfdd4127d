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

//! Wire types exchanged with the manifest signing service.

use serde::{Deserialize, Serialize};

use crate::{marker::MarkerContent, thumbnail_segment::ThumbnailSegment, utils::base64, Result};

/// Segments to embed when the service has already placed the thumbnail.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreationInfo {
    /// Base64 APP11 payloads, in output order.
    pub jumbfs: Vec<String>,
    /// Base64 APP1 XMP payload.
    pub xmp: String,
}

impl CreationInfo {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode into insertion order: the XMP segment, then every JUMBF segment.
    pub fn marker_contents(&self) -> Result<Vec<MarkerContent>> {
        marker_contents(&self.xmp, &self.jumbfs)
    }
}

/// Segments to embed along with where the locally generated thumbnail goes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreationInfoV2 {
    pub jumbfs: Vec<String>,
    pub xmp: String,
    /// Splice points into `jumbfs`, indexed from the first JUMBF.
    pub thumbnail_segments: Vec<ThumbnailSegment>,
}

impl CreationInfoV2 {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn marker_contents(&self) -> Result<Vec<MarkerContent>> {
        marker_contents(&self.xmp, &self.jumbfs)
    }

    /// Total thumbnail bytes the splices will consume.
    pub fn thumbnail_len(&self) -> usize {
        self.thumbnail_segments
            .iter()
            .map(|segment| segment.length)
            .sum()
    }
}

impl From<CreationInfoV2> for CreationInfo {
    fn from(info: CreationInfoV2) -> Self {
        CreationInfo {
            jumbfs: info.jumbfs,
            xmp: info.xmp,
        }
    }
}

fn marker_contents(xmp: &str, jumbfs: &[String]) -> Result<Vec<MarkerContent>> {
    let mut contents = Vec::with_capacity(jumbfs.len() + 1);
    contents.push(MarkerContent::xmp(base64::decode(xmp)?));
    contents.extend(
        base64::decode_all(jumbfs)?
            .into_iter()
            .map(MarkerContent::jumbf),
    );
    Ok(contents)
}

/// Values a signing service needs before it can build the manifest for an asset.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Base64 SHA-256 of the original asset.
    pub asset_hash: String,
    /// Base64 SHA-256 of the reproducible thumbnail.
    pub thumbnail_hash: String,
    /// Thumbnail size in bytes.
    pub thumbnail_assertion_length: usize,
    /// Where the JUMBF segments will be inserted in the original.
    pub jumbf_insertion_point: u64,
    /// XMP always goes directly after SOI.
    #[serde(default = "default_xmp_insertion_point")]
    pub xmp_insertion_point: u64,
}

fn default_xmp_insertion_point() -> u64 {
    2
}

impl AssetInfo {
    pub fn new(
        asset_hash: String,
        thumbnail_hash: String,
        thumbnail_assertion_length: usize,
        jumbf_insertion_point: u64,
    ) -> Self {
        AssetInfo {
            asset_hash,
            thumbnail_hash,
            thumbnail_assertion_length,
            jumbf_insertion_point,
            xmp_insertion_point: default_xmp_insertion_point(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
