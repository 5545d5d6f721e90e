use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{FrameSink, Result, VisualState};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_path: PathBuf,
    /// Frame rate the recorded states were produced at.
    pub fps: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("visual-states.json"),
            fps: 60,
        }
    }
}

/// On-disk layout of a recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub fps: u32,
    pub frames: Vec<VisualState>,
}

/// Collects published frames and writes them out as one JSON document.
#[derive(Debug)]
pub struct Recorder {
    settings: RecordingSettings,
    recording: Recording,
    is_recording: bool,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            recording: Recording {
                fps: settings.fps,
                frames: Vec::new(),
            },
            settings,
            is_recording: false,
        }
    }

    pub fn start(&mut self) {
        self.recording.frames.clear();
        self.is_recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames(&self) -> &[VisualState] {
        &self.recording.frames
    }

    /// Stops recording and writes everything captured so far to the
    /// configured output path. Returns the number of frames written.
    pub fn finish(&mut self) -> Result<usize> {
        self.is_recording = false;
        let file = File::create(&self.settings.output_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.recording)?;
        writer.flush()?;

        let written = self.recording.frames.len();
        tracing::info!(
            frames = written,
            path = %self.settings.output_path.display(),
            "recording written"
        );
        Ok(written)
    }
}

impl FrameSink for Recorder {
    /// Frames presented while the recorder is stopped are ignored.
    fn present(&mut self, state: &VisualState) -> Result<()> {
        if self.is_recording {
            self.recording.frames.push(state.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BarHeights;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("radial-visualiser-{}-{name}", std::process::id()))
    }

    #[test]
    fn ignores_frames_until_started() {
        let mut recorder = Recorder::new(RecordingSettings::default());
        recorder.present(&VisualState::default()).unwrap();
        assert!(recorder.frames().is_empty());

        recorder.start();
        recorder.present(&VisualState::default()).unwrap();
        assert_eq!(recorder.frames().len(), 1);
        assert!(recorder.is_recording());
    }

    #[test]
    fn writes_json_document() {
        let path = temp_path("recording.json");
        let mut recorder = Recorder::new(RecordingSettings {
            output_path: path.clone(),
            fps: 30,
        });

        recorder.start();
        for frame_index in 0..3 {
            recorder
                .present(&VisualState {
                    frame_index,
                    bar_heights: BarHeights::new(vec![0.0, 1.0]),
                    ..Default::default()
                })
                .unwrap();
        }
        assert_eq!(recorder.finish().unwrap(), 3);
        assert!(!recorder.is_recording());

        let text = std::fs::read_to_string(&path).unwrap();
        let recording: Recording = serde_json::from_str(&text).unwrap();
        assert_eq!(recording.fps, 30);
        assert_eq!(recording.frames.len(), 3);
        assert_eq!(recording.frames[2].frame_index, 2);

        std::fs::remove_file(path).ok();
    }
}
