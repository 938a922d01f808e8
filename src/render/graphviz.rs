//! Graphviz `dot` as a diagram producer.

use super::{DiagramError, DiagramProducer, ImageFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+\.[0-9]+(\.[0-9]+)?").unwrap());

pub struct GraphvizDot {
    exe: PathBuf,
    format: ImageFormat,
}

impl GraphvizDot {
    /// Use `dot` from `dir` when given, otherwise from `PATH`
    pub fn new(dir: Option<&Path>, format: ImageFormat) -> Self {
        let exe = match dir {
            Some(dir) => dir.join("dot"),
            None => PathBuf::from("dot"),
        };
        Self { exe, format }
    }

    /// Version reported by `dot -V`, if it runs
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.exe).arg("-V").output().ok()?;
        // dot prints its version on stderr
        let text = String::from_utf8_lossy(&output.stderr);
        VERSION_RE.find(&text).map(|m| m.as_str().to_string())
    }

    pub fn exists(&self) -> bool {
        self.version().is_some()
    }

    fn args(&self, dot_file: &Path, diagram_file: &Path) -> Vec<String> {
        let mut args = vec![
            format!("-T{}", self.format.extension()),
            dot_file.display().to_string(),
            format!("-o{}", diagram_file.display()),
        ];
        if !self.format.is_embed() {
            args.push("-Tcmapx".to_string());
        }
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.exe.display().to_string()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}

impl DiagramProducer for GraphvizDot {
    fn implementation_details(&self) -> String {
        match self.version() {
            Some(version) => format!("Graphviz dot {}", version),
            None => "Graphviz dot (not found)".to_string(),
        }
    }

    fn format(&self) -> ImageFormat {
        self.format
    }

    fn generate(
        &self,
        artifact: &str,
        dot_file: &Path,
        diagram_file: &Path,
    ) -> Result<Option<String>, DiagramError> {
        let args = self.args(dot_file, diagram_file);
        let command = self.command_line(&args);
        log::debug!("{}", command);

        let fail = |reason: String| {
            let _ = fs::remove_file(diagram_file);
            DiagramError::Render {
                artifact: artifact.to_string(),
                command: command.clone(),
                reason,
            }
        };

        let output = Command::new(&self.exe).args(&args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                fail("Graphviz 'dot' command not found. Install Graphviz or use --no-render".to_string())
            } else {
                fail(e.to_string())
            }
        })?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            // port warnings are expected for collapsed columns
            if !line.contains("unrecognized") && !line.contains("port") {
                log::warn!("{}: {}", command, line);
            }
        }

        if !output.status.success() {
            return Err(fail(format!("exit status {}", output.status)));
        }
        if !diagram_file.exists() {
            return Err(fail("no output file was created".to_string()));
        }

        if self.format.is_embed() {
            return Ok(None);
        }
        // cmapx is XHTML, pages want plain HTML
        Ok(Some(String::from_utf8_lossy(&output.stdout).replace("/>", ">")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_arguments_for_raster_format() {
        let dot = GraphvizDot::new(None, ImageFormat::Png);
        let args = dot.args(Path::new("a.dot"), Path::new("a.png"));
        assert_eq!(args, ["-Tpng", "a.dot", "-oa.png", "-Tcmapx"]);
        assert_eq!(dot.command_line(&args), "dot -Tpng a.dot -oa.png -Tcmapx");
    }

    #[test]
    fn test_svg_has_no_map() {
        let dot = GraphvizDot::new(Some(Path::new("/opt/graphviz/bin")), ImageFormat::Svg);
        let args = dot.args(Path::new("a.dot"), Path::new("a.svg"));
        assert_eq!(args, ["-Tsvg", "a.dot", "-oa.svg"]);
        assert!(dot.command_line(&args).starts_with("/opt/graphviz/bin/dot "));
    }

    #[test]
    fn test_missing_executable_is_a_render_error() {
        let dir = TempDir::new().unwrap();
        let dot = GraphvizDot::new(Some(dir.path()), ImageFormat::Png);
        let dot_file = dir.path().join("a.dot");
        fs::write(&dot_file, "digraph \"a\" {\n\n\n}").unwrap();

        let err = dot
            .generate("a.dot", &dot_file, &dir.path().join("a.png"))
            .unwrap_err();
        assert!(matches!(err, DiagramError::Render { .. }));
        assert!(!dot.exists());
    }
}
