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

//! File based helpers for embedding service-provided segments.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use log::{debug, warn};

use crate::{
    asset_handlers::jpeg_io::{AppNWriter, InsertionPointCalculator, InsertionReport},
    creation_info::{AssetInfo, CreationInfo, CreationInfoV2},
    marker::MarkerContent,
    settings::Settings,
    thumbnail_segment::ThumbnailSegment,
    utils::{hash_utils, thumbnail::ThumbnailGenerator},
    Error, Result,
};

/// Reads originals from and writes C2PA compliant copies to the file system.
///
/// The original is opened once for hashing and thumbnailing and again for
/// the rewrite; it is never modified.
#[derive(Clone, Debug, Default)]
pub struct C2paFileHelper {
    settings: Settings,
}

impl C2paFileHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        C2paFileHelper { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Write `original` plus the segments in `info` to `output`.
    ///
    /// Thumbnail bytes, if any, must already be inside the JUMBF payloads.
    pub fn create_c2pa_compliant_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        original: P,
        output: Q,
        info: &CreationInfo,
    ) -> Result<InsertionReport> {
        let contents = info.marker_contents()?;
        self.rewrite(original.as_ref(), output.as_ref(), &contents, &[], &[])
    }

    /// Generate a thumbnail for `original` and write it, together with the
    /// segments in `info`, to `output`.
    pub fn create_c2pa_compliant_file_with_thumbnail<P, Q, G>(
        &self,
        original: P,
        output: Q,
        info: &CreationInfoV2,
        generator: &G,
    ) -> Result<InsertionReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        G: ThumbnailGenerator + ?Sized,
    {
        let original = original.as_ref();
        let thumbnail = generator.generate(&fs::read(original)?)?;
        self.create_c2pa_compliant_file_with_thumbnail_bytes(original, output, info, &thumbnail)
    }

    /// As [`Self::create_c2pa_compliant_file_with_thumbnail`], with a
    /// thumbnail produced elsewhere.
    pub fn create_c2pa_compliant_file_with_thumbnail_bytes<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        original: P,
        output: Q,
        info: &CreationInfoV2,
        thumbnail: &[u8],
    ) -> Result<InsertionReport> {
        if info.thumbnail_len() > thumbnail.len() {
            return Err(Error::OutOfRange(format!(
                "splices need {} thumbnail bytes, thumbnail has {}",
                info.thumbnail_len(),
                thumbnail.len()
            )));
        }

        let contents = info.marker_contents()?;
        self.rewrite(
            original.as_ref(),
            output.as_ref(),
            &contents,
            thumbnail,
            &info.thumbnail_segments,
        )
    }

    /// Offset at which JUMBF segments will be inserted into the file at `path`.
    pub fn jumbf_insertion_point<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let reader = BufReader::new(File::open(path)?);
        InsertionPointCalculator::with_settings(&self.settings.writer).insertion_point(reader)
    }

    /// Hashes and insertion point for an in-memory asset and its thumbnail.
    pub fn asset_info_from_bytes(&self, asset: &[u8], thumbnail: &[u8]) -> Result<AssetInfo> {
        let jumbf_insertion_point =
            InsertionPointCalculator::with_settings(&self.settings.writer).insertion_point(asset)?;

        Ok(AssetInfo::new(
            hash_utils::hash_of_bytes(asset),
            hash_utils::hash_of_bytes(thumbnail),
            thumbnail.len(),
            jumbf_insertion_point,
        ))
    }

    /// Hashes and insertion point for the file at `path`, generating its
    /// thumbnail with `generator`.
    pub fn asset_info_for_file<P, G>(&self, path: P, generator: &G) -> Result<AssetInfo>
    where
        P: AsRef<Path>,
        G: ThumbnailGenerator + ?Sized,
    {
        let asset = fs::read(path)?;
        let thumbnail = generator.generate(&asset)?;
        self.asset_info_from_bytes(&asset, &thumbnail)
    }

    fn rewrite(
        &self,
        original: &Path,
        output: &Path,
        contents: &[MarkerContent],
        thumbnail: &[u8],
        thumbnail_segments: &[ThumbnailSegment],
    ) -> Result<InsertionReport> {
        if same_file(original, output)? {
            return Err(Error::BadParam(format!(
                "output {} must differ from the original",
                output.display()
            )));
        }

        let reader = BufReader::new(File::open(original)?);
        let writer = BufWriter::new(File::create(output)?);

        let result = AppNWriter::with_settings(self.settings.writer.clone())
            .insert_appn_content_with_thumbnail(
                reader,
                writer,
                contents,
                thumbnail,
                thumbnail_segments,
            );

        match result {
            Ok(report) => {
                debug!(
                    "wrote {} bytes to {}",
                    report.bytes_written,
                    output.display()
                );
                Ok(report)
            }
            Err(err) => {
                // a partial rewrite is never a valid JPEG
                if let Err(remove_err) = fs::remove_file(output) {
                    warn!(
                        "could not remove partial output {}: {remove_err}",
                        output.display()
                    );
                }
                Err(err)
            }
        }
    }
}

fn same_file(original: &Path, output: &Path) -> Result<bool> {
    if !output.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(original)? == fs::canonicalize(output)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::utils::base64;

    fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xFF, code];
        bytes.extend(((payload.len() + 2) as u16).to_be_bytes());
        bytes.extend(payload);
        bytes
    }

    fn small_jpeg() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend(segment(0xE0, b"JFIF\0\x01\x02"));
        bytes.extend(segment(0xDB, &[0u8; 65]));
        bytes.extend([0xFF, 0xD9]);
        bytes
    }

    #[test]
    fn test_create_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        let output = temp_dir.path().join("output.jpg");
        fs::write(&original, small_jpeg()).unwrap();

        let info = CreationInfo {
            jumbfs: vec![base64::encode(b"manifest")],
            xmp: base64::encode(b"xmp"),
        };
        let report = C2paFileHelper::new()
            .create_c2pa_compliant_file(&original, &output, &info)
            .unwrap();

        let written = fs::read(&output).unwrap();
        assert_eq!(written.len() as u64, report.bytes_written);
        assert_eq!(written.len(), small_jpeg().len() + 7 + 12);
        assert_eq!(fs::read(&original).unwrap(), small_jpeg());
    }

    #[test]
    fn test_same_path_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        fs::write(&original, small_jpeg()).unwrap();

        let info = CreationInfo {
            jumbfs: vec![],
            xmp: String::new(),
        };
        assert!(matches!(
            C2paFileHelper::new().create_c2pa_compliant_file(&original, &original, &info),
            Err(Error::BadParam(_))
        ));
        assert_eq!(fs::read(&original).unwrap(), small_jpeg());
    }

    #[test]
    fn test_failed_rewrite_removes_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        let output = temp_dir.path().join("output.jpg");
        fs::write(&original, b"not a jpeg").unwrap();

        let info = CreationInfo {
            jumbfs: vec![],
            xmp: String::new(),
        };
        assert!(matches!(
            C2paFileHelper::new().create_c2pa_compliant_file(&original, &output, &info),
            Err(Error::InvalidAsset(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_thumbnail_generator_is_used() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        let output = temp_dir.path().join("output.jpg");
        fs::write(&original, small_jpeg()).unwrap();

        let info = CreationInfoV2 {
            jumbfs: vec![base64::encode(b"[]")],
            xmp: base64::encode(b"x"),
            thumbnail_segments: vec![ThumbnailSegment::new(0, 1, 4)],
        };
        let generator = |_: &[u8]| -> Result<Vec<u8>> { Ok(b"THUMB".to_vec()) };

        let report = C2paFileHelper::new()
            .create_c2pa_compliant_file_with_thumbnail(&original, &output, &info, &generator)
            .unwrap();

        let written = fs::read(&output).unwrap();
        let at = report.inserted[1].offset as usize;
        assert_eq!(&written[at + 4..at + 10], b"[THUM]");
    }

    #[test]
    fn test_short_thumbnail_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        let output = temp_dir.path().join("output.jpg");
        fs::write(&original, small_jpeg()).unwrap();

        let info = CreationInfoV2 {
            jumbfs: vec![base64::encode(b"[]")],
            xmp: base64::encode(b"x"),
            thumbnail_segments: vec![ThumbnailSegment::new(0, 1, 40)],
        };
        assert!(matches!(
            C2paFileHelper::new()
                .create_c2pa_compliant_file_with_thumbnail_bytes(&original, &output, &info, b"short"),
            Err(Error::OutOfRange(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_asset_info() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = temp_dir.path().join("original.jpg");
        fs::write(&original, small_jpeg()).unwrap();

        let helper = C2paFileHelper::new();
        let generator = |_: &[u8]| -> Result<Vec<u8>> { Ok(vec![7u8; 10]) };
        let info = helper.asset_info_for_file(&original, &generator).unwrap();

        assert_eq!(info.asset_hash, hash_utils::hash_of_bytes(&small_jpeg()));
        assert_eq!(info.thumbnail_hash, hash_utils::hash_of_bytes(&[7u8; 10]));
        assert_eq!(info.thumbnail_assertion_length, 10);
        // SOI + APP0 (4 + 7)
        assert_eq!(info.jumbf_insertion_point, 13);
        assert_eq!(info.xmp_insertion_point, 2);
        assert_eq!(helper.jumbf_insertion_point(&original).unwrap(), 13);
    }
}
