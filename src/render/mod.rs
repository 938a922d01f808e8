//! Diagram rendering boundary.
//!
//! Writes DOT text next to the rendered image and hands the file to an
//! external renderer. Raster formats come with a client-side image map.

mod graphviz;

pub use graphviz::GraphvizDot;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

static MAP_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<map.*name="([\w\s]+).*"#).unwrap());

/// Image format requested from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Gif,
    Svg,
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "gif" => Ok(ImageFormat::Gif),
            "svg" => Ok(ImageFormat::Svg),
            _ => Err(format!(
                "Unknown image format: {}. Valid options: png, gif, svg",
                s
            )),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Svg => "svg",
        }
    }

    /// Vector output is embedded directly and carries its own links
    pub fn is_embed(&self) -> bool {
        matches!(self, ImageFormat::Svg)
    }
}

/// Failure producing one diagram artifact
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("failed to write {artifact}: {source}")]
    WriteDot {
        artifact: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' failed for {artifact}: {reason}")]
    Render {
        artifact: String,
        command: String,
        reason: String,
    },
}

impl DiagramError {
    pub fn artifact(&self) -> &str {
        match self {
            DiagramError::WriteDot { artifact, .. } | DiagramError::Render { artifact, .. } => {
                artifact
            }
        }
    }
}

/// Turns a DOT file into an image
pub trait DiagramProducer: Send + Sync {
    /// Renderer description for logs
    fn implementation_details(&self) -> String;

    fn format(&self) -> ImageFormat;

    /// Render `dot_file` into `diagram_file`, returning the image map when
    /// the format has one.
    fn generate(
        &self,
        artifact: &str,
        dot_file: &Path,
        diagram_file: &Path,
    ) -> Result<Option<String>, DiagramError>;
}

/// Files produced for one diagram
#[derive(Debug, Clone, Serialize)]
pub struct DiagramResult {
    pub dot_file: PathBuf,
    pub diagram_file: Option<PathBuf>,
    pub format: Option<ImageFormat>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub map_name: String,
    #[serde(skip)]
    pub map: String,
}

impl DiagramResult {
    fn new(dot_file: PathBuf, diagram_file: Option<PathBuf>, format: Option<ImageFormat>, map: Option<String>) -> Self {
        let (map_name, map) = match map {
            Some(map) => (map_name(&map).unwrap_or_default(), map.trim().to_string()),
            None => (String::new(), String::new()),
        };
        Self {
            dot_file,
            diagram_file,
            format,
            map_name,
            map,
        }
    }
}

/// Name of the first `<map>` element in a client-side image map
pub fn map_name(map: &str) -> Option<String> {
    MAP_NAME_RE
        .captures(map)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Write `dot` to `<dir>/<stem>.dot` and render it when a producer is given
pub fn write_diagram(
    dir: &Path,
    stem: &str,
    dot: &str,
    producer: Option<&dyn DiagramProducer>,
) -> Result<DiagramResult, DiagramError> {
    let dot_file = dir.join(format!("{}.dot", stem));
    let artifact = dot_file.display().to_string();

    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&dot_file, dot))
        .map_err(|source| DiagramError::WriteDot {
            artifact: artifact.clone(),
            source,
        })?;

    let Some(producer) = producer else {
        return Ok(DiagramResult::new(dot_file, None, None, None));
    };

    let format = producer.format();
    let diagram_file = dir.join(format!("{}.{}", stem, format.extension()));
    let map = producer.generate(&artifact, &dot_file, &diagram_file)?;
    Ok(DiagramResult::new(dot_file, Some(diagram_file), Some(format), map))
}
