use fundsp::prelude::*;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::warn;

const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Point,
    LevelUp,
    Crash,
}

#[derive(Clone, Copy)]
enum Shape {
    Sine,
    Saw,
}

/// Appends one note with a linear fade-out.
fn tone(shape: Shape, freq: f32, secs: f32, gain: f32, out: &mut Vec<f32>) {
    let mut unit: Box<dyn AudioUnit> = match shape {
        Shape::Sine => Box::new(sine_hz::<f32>(freq)),
        Shape::Saw => Box::new(saw_hz(freq)),
    };
    let n = (secs * SAMPLE_RATE as f32) as usize;
    for i in 0..n {
        let env = 1.0 - i as f32 / n as f32;
        out.push(unit.get_mono() as f32 * gain * env);
    }
}

/// Mono samples at 44.1 kHz for `cue`.
pub fn render_cue(cue: Cue) -> Vec<f32> {
    let mut out = Vec::new();
    match cue {
        Cue::Point => {
            tone(Shape::Sine, 880.0, 0.06, 0.12, &mut out);
            tone(Shape::Sine, 1320.0, 0.08, 0.12, &mut out);
        }
        Cue::LevelUp => {
            for f in [523.0, 659.0, 784.0, 1047.0] {
                tone(Shape::Sine, f, 0.09, 0.12, &mut out);
            }
        }
        Cue::Crash => {
            // Falling saw, 400 Hz down to 80 Hz.
            for (i, f) in [400.0, 300.0, 200.0, 120.0, 80.0].into_iter().enumerate() {
                let gain = 0.15 * (1.0 - i as f32 / 5.0);
                tone(Shape::Saw, f, 0.08, gain, &mut out);
            }
        }
    }
    out
}

/// Output device handle. Dropping it silences everything still playing.
pub struct Audio {
    stream: OutputStream,
}

impl Audio {
    pub fn open() -> anyhow::Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        Ok(Self { stream })
    }

    /// Opens the default device, or runs silent when there is none.
    pub fn open_or_silent(enabled: bool) -> Option<Self> {
        if !enabled {
            return None;
        }
        match Self::open() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("no audio output, running silent: {e:#}");
                None
            }
        }
    }

    pub fn play(&self, cue: Cue) {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, render_cue(cue)));
        sink.detach(); // Play in background
    }
}
