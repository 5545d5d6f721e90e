//! Core library for the Radial Visualiser.
//!
//! Turns a decoded PCM stream into per-frame spectrum bars and drives a
//! bounded particle simulation from them. Each module owns one stage of the
//! pipeline; [`FrameOrchestrator`] ties them together once per rendered
//! frame and publishes a [`VisualState`] for whatever renderer sits on top.
//! Windowing, GPU work, playback and decoding live outside this crate.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod mapping;
pub mod particles;
pub mod record;
pub mod render;
pub mod scene;
pub mod timeline;

pub use analysis::{PlaybackCursor, SpectrumAnalyzer, SpectrumFrame};
pub use audio::SampleBuffer;
pub use config::{
    AnalysisConfig, AppConfig, BarConfig, EmissionConfig, ParticleConfig, Range, WindowFunction,
    MAX_WINDOW_SIZE,
};
pub use error::{Result, VisualiserError};
pub use mapping::{BarHeights, BarMapper};
pub use particles::{Emitter, Particle, ParticleSystem};
pub use record::{Recorder, Recording, RecordingSettings};
pub use render::{FrameSink, ParticleSnapshot, RadialBar, VisualState};
pub use scene::{EmissionPolicy, FrameOrchestrator};
pub use timeline::FrameClock;
