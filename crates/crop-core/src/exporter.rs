//! Keyframe track export.
//!
//! The export is a direct, order-preserving JSON dump of the track; no
//! filtering or compaction happens here.

use std::path::{Path, PathBuf};

use reframe_common::config::ExportSettings;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_crop_model::keyframe::KeyframeTrack;

/// File name suggested to sinks when none is configured.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "videoData.json";

/// Destination for serialized exports.
pub trait ExportSink {
    /// Accept the serialized track under a suggested file name.
    fn accept(&mut self, file_name: &str, bytes: &[u8]) -> ReframeResult<()>;
}

/// Serializes keyframe tracks.
#[derive(Debug, Clone)]
pub struct SessionExporter {
    file_name: String,
    pretty: bool,
}

impl Default for SessionExporter {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            pretty: true,
        }
    }
}

impl SessionExporter {
    pub fn new(file_name: impl Into<String>, pretty: bool) -> Self {
        Self {
            file_name: file_name.into(),
            pretty,
        }
    }

    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self::new(settings.file_name.clone(), settings.pretty)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Serialize the track as a JSON array.
    pub fn export(&self, track: &KeyframeTrack) -> ReframeResult<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(track)?
        } else {
            serde_json::to_vec(track)?
        };
        Ok(bytes)
    }

    /// Serialize the track and hand it to `sink`. Returns the byte count.
    pub fn download_json(
        &self,
        track: &KeyframeTrack,
        sink: &mut dyn ExportSink,
    ) -> ReframeResult<usize> {
        let bytes = self.export(track)?;
        sink.accept(&self.file_name, &bytes)?;
        tracing::info!(
            file_name = %self.file_name,
            keyframes = track.len(),
            bytes = bytes.len(),
            "Keyframe track exported"
        );
        Ok(bytes.len())
    }
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent export.
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl ExportSink for FileExportSink {
    fn accept(&mut self, file_name: &str, bytes: &[u8]) -> ReframeResult<()> {
        let name = Path::new(file_name);
        if name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true) {
            return Err(ReframeError::export(format!(
                "export file name must be a bare file name, got {file_name:?}"
            )));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)
            .map_err(|e| ReframeError::export(format!("Failed to write {}: {e}", path.display())))?;
        self.last_written = Some(path);
        Ok(())
    }
}

/// Keeps exports in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryExportSink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl ExportSink for MemoryExportSink {
    fn accept(&mut self, file_name: &str, bytes: &[u8]) -> ReframeResult<()> {
        self.files.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
