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

#[cfg(feature = "file_io")]
use std::path::Path;

use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const VERSION: u32 = 1;

// trait used to validate user input to make sure user supplied configurations are valid
pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings for the segment rewriter and the insertion point calculator.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WriterSettings {
    /// Whether to drop an existing XMP (APP1) segment while copying.
    ///
    /// The default value is true. Both the rewriter and the insertion point
    /// calculator honor this value, so they always agree.
    pub strip_xmp: bool,
    /// Size in bytes of the buffer used to copy the image data that follows
    /// the application segments.
    ///
    /// The default value is 32768.
    pub copy_buffer_size: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        WriterSettings {
            strip_xmp: true,
            copy_buffer_size: 32 * 1024,
        }
    }
}

impl SettingsValidate for WriterSettings {
    fn validate(&self) -> Result<()> {
        if self.copy_buffer_size == 0 {
            return Err(Error::BadParam(
                "writer.copy_buffer_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for reproducible thumbnail generation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ThumbnailSettings {
    /// Upper bound for the longest edge of the thumbnail in pixels.
    ///
    /// The default value is 1024.
    pub long_edge: u32,
    /// JPEG quality of the encoded thumbnail, 1 to 100.
    ///
    /// The default value is 80.
    pub jpeg_quality: u8,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        ThumbnailSettings {
            long_edge: 1024,
            jpeg_quality: 80,
        }
    }
}

impl SettingsValidate for ThumbnailSettings {
    fn validate(&self) -> Result<()> {
        if self.long_edge == 0 {
            return Err(Error::BadParam(
                "thumbnail.long_edge must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::BadParam(format!(
                "thumbnail.jpeg_quality {} is not in 1..=100",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Settings for configuring all aspects of c2pa-appn.
///
/// Partial documents may be loaded; any field they leave out keeps its
/// current value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    /// Version of the configuration.
    pub version: u32,
    pub writer: WriterSettings,
    pub thumbnail: ThumbnailSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: VERSION,
            writer: WriterSettings::default(),
            thumbnail: ThumbnailSettings::default(),
        }
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        if self.version > VERSION {
            return Err(Error::BadParam(format!(
                "settings version {} is newer than supported version {VERSION}",
                self.version
            )));
        }
        self.writer.validate()?;
        self.thumbnail.validate()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a string in the given format (`json` or `toml`),
    /// starting from the defaults.
    pub fn from_string(settings_str: &str, format: &str) -> Result<Self> {
        let mut settings = Settings::default();
        settings.update_from_str(settings_str, format)?;
        Ok(settings)
    }

    /// Load settings from a file. The format is taken from the extension.
    #[cfg(feature = "file_io")]
    pub fn from_file<P: AsRef<Path>>(settings_path: P) -> Result<Self> {
        let path = settings_path.as_ref();
        let ext = path
            .extension()
            .ok_or(Error::BadParam(
                "settings file must have json or toml extension".into(),
            ))?
            .to_str()
            .ok_or(Error::BadParam("invalid settings file name".into()))?;

        let setting_buf = std::fs::read(path).map_err(Error::IoError)?;
        Settings::from_string(&String::from_utf8_lossy(&setting_buf), ext)
    }

    /// Overlay a configuration string on top of these settings.
    ///
    /// The result is validated before it replaces the current values, so on
    /// error `self` is unchanged.
    pub fn update_from_str(&mut self, settings_str: &str, format: &str) -> Result<()> {
        let file_format = match format.to_lowercase().as_str() {
            "json" => FileFormat::Json,
            "toml" => FileFormat::Toml,
            _ => return Err(Error::UnsupportedType),
        };

        let current_config = Config::try_from(&*self)
            .map_err(|e| Error::BadParam(format!("could not convert settings: {e}")))?;

        let merged_config = Config::builder()
            .add_source(current_config)
            .add_source(config::File::from_str(settings_str, file_format))
            .build()
            .map_err(|e| Error::BadParam(format!("could not merge configuration: {e}")))?;

        let updated_settings = merged_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadParam(e.to_string()))?;

        updated_settings.validate()?;

        *self = updated_settings;
        Ok(())
    }

    /// Serialize these settings as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::JsonError)
    }
}
