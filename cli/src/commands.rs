// Copyright 2023 Adobe. All rights reserved.
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
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use c2pa_appn::{
    AssetInfo, C2paFileHelper, CreationInfo, CreationInfoV2, InsertionPointCalculator,
    InsertionReport, ReproducibleThumbnailer, Settings, ThumbnailGenerator,
};
use clap::{Args, Parser, Subcommand};
use log::{debug, warn};

/// Tool for embedding C2PA provenance segments into JPEG images.
#[derive(Debug, Parser)]
#[command(author, version, about, rename_all = "kebab-case")]
pub struct CliArgs {
    /// Path to a JSON or TOML settings file.
    #[clap(long, env = "APPNTOOL_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab-case")]
pub enum Commands {
    /// Write a copy of an image with the segments from a signing service response.
    Insert {
        /// Path to the original JPEG.
        input: PathBuf,

        /// Path to the output file.
        #[clap(short, long)]
        output: PathBuf,

        /// Path to the creation info JSON returned by the signing service.
        #[clap(short, long)]
        info: PathBuf,

        #[clap(flatten)]
        thumbnail: ThumbnailArgs,

        /// Force overwrite of output if it already exists.
        #[clap(short, long)]
        force: bool,
    },
    /// Print the offset at which JUMBF segments will be inserted.
    InsertionPoint {
        /// Path to the original JPEG.
        input: PathBuf,
    },
    /// Print the asset info JSON a signing service needs.
    AssetInfo {
        /// Path to the original JPEG.
        input: PathBuf,

        #[clap(flatten)]
        thumbnail: ThumbnailArgs,
    },
    /// List the application segments ahead of the insertion point.
    Segments {
        /// Path to the original JPEG.
        input: PathBuf,
    },
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct ThumbnailArgs {
    /// Path to a thumbnail JPEG to use instead of generating one.
    #[clap(short, long)]
    pub thumbnail: Option<PathBuf>,

    /// Generate a reproducible thumbnail from the input. This is the default.
    #[clap(long)]
    pub generate_thumbnail: bool,
}

impl ThumbnailArgs {
    fn thumbnail_bytes(&self, input: &[u8], settings: &Settings) -> Result<Vec<u8>> {
        match &self.thumbnail {
            Some(path) => fs::read(path)
                .with_context(|| format!("reading thumbnail {}", path.display())),
            None => {
                debug!("generating thumbnail");
                Ok(ReproducibleThumbnailer::new(settings.thumbnail.clone()).generate(input)?)
            }
        }
    }
}

// Service responses carry `thumbnailSegments` only when the thumbnail is
// spliced on this side.
enum Info {
    V1(CreationInfo),
    V2(CreationInfoV2),
}

fn load_info(path: &Path) -> Result<Info> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading creation info {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&json).context("creation info is not valid JSON")?;

    let info = if value.get("thumbnailSegments").is_some() {
        Info::V2(serde_json::from_value(value)?)
    } else {
        Info::V1(serde_json::from_value(value)?)
    };
    Ok(info)
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings {}", path.display())),
        None => Ok(Settings::default()),
    }
}

impl Commands {
    pub fn execute(&self, settings: Settings) -> Result<()> {
        let helper = C2paFileHelper::with_settings(settings);

        match self {
            Commands::Insert {
                input,
                output,
                info,
                thumbnail,
                force,
            } => {
                if output.exists() && !force {
                    bail!("Output already exists; use -f/--force to force write");
                }

                let report = match load_info(info)? {
                    Info::V1(info) => {
                        if thumbnail.thumbnail.is_some() || thumbnail.generate_thumbnail {
                            warn!("creation info has no thumbnail segments, thumbnail ignored");
                        }
                        helper.create_c2pa_compliant_file(input, output, &info)?
                    }
                    Info::V2(info) => {
                        let original = fs::read(input)
                            .with_context(|| format!("reading {}", input.display()))?;
                        let thumb = thumbnail.thumbnail_bytes(&original, helper.settings())?;
                        helper.create_c2pa_compliant_file_with_thumbnail_bytes(
                            input, output, &info, &thumb,
                        )?
                    }
                };

                print_report(&report, output);
            }
            Commands::InsertionPoint { input } => {
                println!("{}", helper.jumbf_insertion_point(input)?);
            }
            Commands::AssetInfo { input, thumbnail } => {
                let original =
                    fs::read(input).with_context(|| format!("reading {}", input.display()))?;
                let thumb = thumbnail.thumbnail_bytes(&original, helper.settings())?;
                let asset_info: AssetInfo = helper.asset_info_from_bytes(&original, &thumb)?;
                println!("{}", asset_info.to_json()?);
            }
            Commands::Segments { input } => {
                let file = fs::File::open(input)
                    .with_context(|| format!("opening {}", input.display()))?;
                let segments = InsertionPointCalculator::with_settings(&helper.settings().writer)
                    .scan(std::io::BufReader::new(file))?;

                for segment in segments {
                    let note = if segment.stripped { " (xmp, replaced)" } else { "" };
                    println!(
                        "{} {} {}{note}",
                        segment.marker, segment.offset, segment.total_len
                    );
                }
            }
        }
        Ok(())
    }
}

fn print_report(report: &InsertionReport, output: &Path) {
    for segment in &report.inserted {
        println!(
            "{} {} {}",
            segment.marker, segment.offset, segment.total_len
        );
    }
    if report.stripped_xmp_bytes > 0 {
        println!("Replaced {} bytes of XMP", report.stripped_xmp_bytes);
    }
    println!(
        "Wrote {} bytes to {}",
        report.bytes_written,
        output.display()
    );
}
