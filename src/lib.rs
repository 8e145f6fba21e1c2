//! # Carillon: Embedded Modular Sound Synthesis
//!
//! `carillon` is a Rust library for building small modular synthesizers:
//! a graph of signal-processing modules (oscillators, envelope, filters, a
//! mixer, a reverb, noise generators) wired together by named input slots
//! and pulled buffer-by-buffer to feed an audio output device in real time.
//!
//! ## Architecture
//!
//! The library is organized in three layers:
//!
//! - **Samples & fixed point** ([`sample`]) — the 16-bit word convention
//!   and the sign-aware multiply shared by every render kernel
//! - **Module interface** ([`module`]) — the type-erased capability trait
//!   and per-cycle input view
//! - **Graph & engine** ([`graph`]) — the module arena, named wiring, and
//!   the pull-based evaluation engine with per-cycle memoization
//!
//! Rendering is single-threaded and allocation-free once the graph is
//! built; one [`Synth::get_buffer`](graph::Synth::get_buffer) call must
//! complete within `buffer_size / sample_rate` seconds to keep the audio
//! transport fed.
//!
//! ## Quick Start
//!
//! ```rust
//! use carillon::prelude::*;
//!
//! // 8 kHz, 8-word buffers, table amplitude 255
//! let config = AudioConfig::new(8000, 8, 255).unwrap();
//! let mut synth = Synth::new(config);
//!
//! // Wire a constant 440 into a sine oscillator, into the output
//! let frequency = synth.add_module(Input::new(&config));
//! let sine = synth.add_module(Sine::new(&config));
//! synth.module_as_mut::<Input>(frequency).unwrap().set_value(440);
//! synth.set_input(sine, "frequency", frequency).unwrap();
//! synth.set_input(synth.output(), "input", sine).unwrap();
//!
//! // Pull one rendered cycle
//! let buffer = synth.get_buffer().unwrap();
//! assert_eq!(buffer.len(), 8);
//! ```

pub mod config;
pub mod graph;
pub mod module;
pub mod modules;
pub mod rng;
pub mod sample;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::AudioConfig;

    pub use crate::graph::{ModuleId, Synth, SynthError};

    pub use crate::module::{Inputs, ModuleInfo, SynthModule};

    pub use crate::modules::{
        Envelope, HighPassFilter, Input, LowPassFilter, Mixer, Noise, NoiseType, Output,
        PitchShifter, Reverb, Sawtooth, Sine, Square, Triangle,
    };

    pub use crate::rng::Rng;

    pub use crate::sample::Sample;
}

// Re-export key types at crate root for convenience
pub use prelude::*;
