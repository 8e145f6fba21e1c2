//! The DSP modules.
//!
//! Every module here computes in the 16-bit word domain described in
//! [`crate::sample`]: oscillators and noise play precomputed lookup tables
//! through Q16 phase accumulators, the envelope and filters scale through
//! Q8 coefficients, and the reverb network runs in Q15. Table and
//! coefficient generation is ordinary floating-point math (via `libm`),
//! done once at construction or when a setter changes the parameter; the
//! per-sample render kernels are pure integer arithmetic.

use std::any::Any;
use std::f64::consts::TAU;

use crate::config::AudioConfig;
use crate::graph::SynthError;
use crate::module::{Inputs, SynthModule};
use crate::rng::Rng;
use crate::sample::{self, q8_from_fraction, q15_from_fraction, scale, Sample};

/// Entries in every waveform lookup table.
const TABLE_SIZE: usize = 1024;
const TABLE_MASK: u32 = TABLE_SIZE as u32 - 1;

/// Shared wavetable playback state: a signed 16-bit table and a 32-bit
/// phase accumulator whose high word indexes the table.
///
/// The per-sample phase increment is `floor(TABLE_SIZE · 2^16 /
/// sample_rate)`, scaled by the frequency word read per sample (for
/// oscillators) or by a fixed factor (noise, pitch shifter). Reading the
/// frequency per sample is what makes audio-rate frequency modulation work.
struct Wavetable {
    table: [i16; TABLE_SIZE],
    phase: u32,
    increment: u32,
}

impl Wavetable {
    fn new(config: &AudioConfig) -> Self {
        Self {
            table: [0; TABLE_SIZE],
            phase: 0,
            increment: ((TABLE_SIZE as u32) << 16) / config.sample_rate,
        }
    }

    /// Play the table with a per-sample frequency word.
    fn fill_fm(&mut self, frequency: &[Sample], out: &mut [Sample]) {
        for (slot, &freq) in out.iter_mut().zip(frequency) {
            *slot = self.table[((self.phase >> 16) & TABLE_MASK) as usize] as Sample;
            self.phase = self
                .phase
                .wrapping_add(self.increment.wrapping_mul(freq as u32));
        }
    }

    /// Play the table at a fixed phase step.
    fn fill_fixed(&mut self, step: u32, out: &mut [Sample]) {
        for slot in out.iter_mut() {
            *slot = self.table[((self.phase >> 16) & TABLE_MASK) as usize] as Sample;
            self.phase = self.phase.wrapping_add(step);
        }
    }
}

// ---------------------------------------------------------------------------
// Signal sources
// ---------------------------------------------------------------------------

/// Constant source: broadcasts one integer value into every sample.
///
/// Used for control values (oscillator frequencies, mixer volumes) fed from
/// the hardware input path.
pub struct Input {
    value: i16,
}

impl Input {
    pub fn new(_config: &AudioConfig) -> Self {
        Self { value: 0 }
    }

    pub fn set_value(&mut self, value: i16) {
        self.value = value;
    }

    pub fn value(&self) -> i16 {
        self.value
    }
}

impl SynthModule for Input {
    fn type_name(&self) -> &'static str {
        "input"
    }

    fn options(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        Vec::new()
    }

    fn update(&mut self, _inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        out.fill(self.value as Sample);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Sine oscillator.
pub struct Sine {
    table: Wavetable,
}

impl Sine {
    pub fn new(config: &AudioConfig) -> Self {
        let mut table = Wavetable::new(config);
        let max = config.max_amplitude as f64;
        for (i, slot) in table.table.iter_mut().enumerate() {
            *slot = (max * libm::sin(TAU * i as f64 / TABLE_SIZE as f64)) as i16;
        }
        Self { table }
    }
}

impl SynthModule for Sine {
    fn type_name(&self) -> &'static str {
        "sine"
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["frequency".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let frequency = inputs.require("frequency")?;
        self.table.fill_fm(frequency, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Square oscillator with a settable duty cycle.
///
/// The table is regenerated whenever the duty cycle changes; playback
/// state is untouched, so a running tone glitches no worse than one table
/// period.
pub struct Square {
    table: Wavetable,
    duty_cycle: f64,
    max_amplitude: i32,
}

impl Square {
    pub fn new(config: &AudioConfig) -> Self {
        let mut square = Self {
            table: Wavetable::new(config),
            duty_cycle: 0.5,
            max_amplitude: config.max_amplitude,
        };
        square.regenerate();
        square
    }

    /// Fraction of the period spent high, `0.0..=1.0`.
    pub fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), SynthError> {
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(SynthError::invalid_parameter(
                "square",
                "duty cycle must be between 0 and 1",
            ));
        }
        self.duty_cycle = duty_cycle;
        self.regenerate();
        Ok(())
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    fn regenerate(&mut self) {
        let high = TABLE_SIZE as f64 * self.duty_cycle;
        for (i, slot) in self.table.table.iter_mut().enumerate() {
            *slot = if (i as f64) < high {
                self.max_amplitude as i16
            } else {
                -(self.max_amplitude as i16)
            };
        }
    }
}

impl SynthModule for Square {
    fn type_name(&self) -> &'static str {
        "square"
    }

    fn options(&self) -> &'static [&'static str] {
        &["duty_cycle"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["frequency".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let frequency = inputs.require("frequency")?;
        self.table.fill_fm(frequency, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Triangle oscillator.
pub struct Triangle {
    table: Wavetable,
}

impl Triangle {
    pub fn new(config: &AudioConfig) -> Self {
        let mut table = Wavetable::new(config);
        let max = config.max_amplitude as f64;
        for (i, slot) in table.table.iter_mut().enumerate() {
            let position = i as f64 / TABLE_SIZE as f64;
            *slot = if i < TABLE_SIZE / 2 {
                (max * (2.0 * position - 1.0)) as i16
            } else {
                (max * (1.0 - 2.0 * position)) as i16
            };
        }
        Self { table }
    }
}

impl SynthModule for Triangle {
    fn type_name(&self) -> &'static str {
        "triangle"
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["frequency".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let frequency = inputs.require("frequency")?;
        self.table.fill_fm(frequency, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Sawtooth oscillator.
pub struct Sawtooth {
    table: Wavetable,
}

impl Sawtooth {
    pub fn new(config: &AudioConfig) -> Self {
        let mut table = Wavetable::new(config);
        let max = config.max_amplitude as f64;
        for (i, slot) in table.table.iter_mut().enumerate() {
            let mut value = (max * (2.0 * i as f64 / TABLE_SIZE as f64 - 1.0)) as i16;
            if i >= TABLE_SIZE / 2 {
                value = -value;
            }
            *slot = value;
        }
        Self { table }
    }
}

impl SynthModule for Sawtooth {
    fn type_name(&self) -> &'static str {
        "sawtooth"
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["frequency".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let frequency = inputs.require("frequency")?;
        self.table.fill_fm(frequency, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Noise colors supported by [`Noise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseType {
    White,
    Pink,
    Red,
    Violet,
    Blue,
    Gray,
    Black,
}

/// Colored-noise generator.
///
/// A 1024-entry table is filled according to the selected color and looped
/// at a fixed phase increment (noise is not frequency-modulated). Because
/// the table is finite and looped, long-range spectral shaping is only an
/// approximation within one table period. The pink color is a multi-row
/// running-sum approximation, red a running average of random steps, violet
/// and blue weight random values by a linear frequency-position factor,
/// gray applies banded perceptual weights, and black is a feedback-weighted
/// running average with an inverse-frequency weight.
pub struct Noise {
    table: Wavetable,
    noise_type: NoiseType,
    max_amplitude: i32,
    rng: Rng,
}

/// Perceptual band weights for gray noise, low band first.
const GRAY_WEIGHTS: [f64; 8] = [1.0, 0.8, 0.6, 0.4, 0.3, 0.2, 0.15, 0.1];

impl Noise {
    pub fn new(config: &AudioConfig) -> Self {
        Self::with_rng(config, Rng::default())
    }

    /// Construct with a fixed seed for reproducible tables.
    pub fn with_seed(config: &AudioConfig, seed: u64) -> Self {
        Self::with_rng(config, Rng::from_seed(seed))
    }

    fn with_rng(config: &AudioConfig, rng: Rng) -> Self {
        let mut noise = Self {
            table: Wavetable::new(config),
            noise_type: NoiseType::White,
            max_amplitude: config.max_amplitude,
            rng,
        };
        noise.regenerate();
        noise
    }

    /// Switch the noise color, regenerating the table when it changes.
    pub fn set_type(&mut self, noise_type: NoiseType) {
        if noise_type != self.noise_type {
            self.noise_type = noise_type;
            self.regenerate();
        }
    }

    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    fn regenerate(&mut self) {
        let max = self.max_amplitude;
        let table = &mut self.table.table;
        match self.noise_type {
            NoiseType::White => {
                for slot in table.iter_mut() {
                    *slot = self.rng.next_i32_inclusive(-max, max) as i16;
                }
            }
            NoiseType::Pink => {
                let mut rows = [0i32; 16];
                for row in rows.iter_mut() {
                    *row = self.rng.next_i32_inclusive(0, max);
                }
                for slot in table.iter_mut() {
                    let sum: i32 = rows.iter().sum();
                    *slot = (sum / rows.len() as i32) as i16;
                    let row = self.rng.next_i32_inclusive(0, rows.len() as i32 - 1) as usize;
                    rows[row] = self.rng.next_i32_inclusive(-max, max);
                }
            }
            NoiseType::Red => {
                let mut previous = 0i32;
                for (i, slot) in table.iter_mut().enumerate() {
                    let value = if i == 0 {
                        self.rng.next_i32_inclusive(-max, max)
                    } else {
                        (previous + self.rng.next_i32_inclusive(-max, max)) / 2
                    };
                    *slot = value as i16;
                    previous = value;
                }
            }
            NoiseType::Violet => {
                for (i, slot) in table.iter_mut().enumerate() {
                    let weight = i as f64 / TABLE_SIZE as f64;
                    *slot = (max as f64 * weight * weight * self.rng.next_f64_bipolar()) as i16;
                }
            }
            NoiseType::Blue => {
                for (i, slot) in table.iter_mut().enumerate() {
                    let weight = i as f64 / TABLE_SIZE as f64;
                    *slot = (max as f64 * weight * self.rng.next_f64_bipolar()) as i16;
                }
            }
            NoiseType::Gray => {
                for (i, slot) in table.iter_mut().enumerate() {
                    let band = (i * GRAY_WEIGHTS.len() / TABLE_SIZE).min(GRAY_WEIGHTS.len() - 1);
                    *slot =
                        (max as f64 * GRAY_WEIGHTS[band] * self.rng.next_f64_bipolar()) as i16;
                }
            }
            NoiseType::Black => {
                let mut previous = 0f64;
                for (i, slot) in table.iter_mut().enumerate() {
                    let value = if i == 0 {
                        self.rng.next_i32_inclusive(-max, max) as f64
                    } else {
                        let weight = 1.0 / (i as f64 / TABLE_SIZE as f64 + 0.01);
                        previous * 0.7
                            + self.rng.next_i32_inclusive(-max, max) as f64 * weight * 0.3
                    };
                    *slot = value as i16;
                    previous = *slot as f64;
                }
            }
        }
    }
}

impl SynthModule for Noise {
    fn type_name(&self) -> &'static str {
        "noise"
    }

    fn options(&self) -> &'static [&'static str] {
        &["type"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        Vec::new()
    }

    fn update(&mut self, _inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let step = self.table.increment;
        self.table.fill_fixed(step, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Table-driven ADSR amplitude envelope.
///
/// Attack, decay, and release are precomputed Q8 ramp tables; per sample
/// the envelope takes the next entry from whichever table still has
/// entries left (attack, then decay, then release) and otherwise holds the
/// last decay value (sustain). Position pointers persist across buffers.
/// `trigger_attack` restarts only from the attack table's end, so
/// re-triggering mid-attack is a no-op; `trigger_release` likewise arms
/// release only from idle. When the release table runs out the envelope
/// goes inactive and outputs silence until the next attack.
///
/// Setters regenerate the ramp tables immediately, which also re-idles the
/// envelope (all pointers at their table ends, inactive).
pub struct Envelope {
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    sample_rate: f64,
    active: bool,
    attack_i: usize,
    decay_i: usize,
    release_i: usize,
    attack_table: Vec<u16>,
    decay_table: Vec<u16>,
    release_table: Vec<u16>,
}

impl Envelope {
    pub fn new(config: &AudioConfig) -> Self {
        // defaults: 100 ms attack/decay, half-level sustain, 100 ms release
        let mut envelope = Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 0.5,
            release: 0.1,
            sample_rate: config.sample_rate as f64,
            active: false,
            attack_i: 0,
            decay_i: 0,
            release_i: 0,
            attack_table: Vec::new(),
            decay_table: Vec::new(),
            release_table: Vec::new(),
        };
        envelope.regenerate();
        envelope
    }

    /// Construct with explicit parameters (seconds, seconds, level in
    /// `0.0..=1.0`, seconds).
    pub fn with_params(
        config: &AudioConfig,
        attack: f64,
        decay: f64,
        sustain: f64,
        release: f64,
    ) -> Result<Self, SynthError> {
        let mut envelope = Self::new(config);
        envelope.set_attack(attack)?;
        envelope.set_decay(decay)?;
        envelope.set_sustain(sustain)?;
        envelope.set_release(release)?;
        Ok(envelope)
    }

    pub fn set_attack(&mut self, seconds: f64) -> Result<(), SynthError> {
        Self::check_time("attack", seconds)?;
        self.attack = seconds;
        self.regenerate();
        Ok(())
    }

    pub fn set_decay(&mut self, seconds: f64) -> Result<(), SynthError> {
        Self::check_time("decay", seconds)?;
        self.decay = seconds;
        self.regenerate();
        Ok(())
    }

    pub fn set_sustain(&mut self, level: f64) -> Result<(), SynthError> {
        if !level.is_finite() || !(0.0..=1.0).contains(&level) {
            return Err(SynthError::invalid_parameter(
                "envelope",
                "sustain level must be between 0 and 1",
            ));
        }
        self.sustain = level;
        self.regenerate();
        Ok(())
    }

    pub fn set_release(&mut self, seconds: f64) -> Result<(), SynthError> {
        Self::check_time("release", seconds)?;
        self.release = seconds;
        self.regenerate();
        Ok(())
    }

    fn check_time(name: &str, seconds: f64) -> Result<(), SynthError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SynthError::invalid_parameter(
                "envelope",
                format!("{} time must be a non-negative number of seconds", name),
            ));
        }
        Ok(())
    }

    /// Begin the attack ramp. No-op while an attack or decay is already
    /// running.
    pub fn trigger_attack(&mut self) {
        if self.attack_i == self.attack_table.len() {
            self.attack_i = 0;
            self.decay_i = 0;
            self.active = true;
        }
    }

    /// Arm the release ramp. No-op while a release is already running.
    pub fn trigger_release(&mut self) {
        if self.release_i == self.release_table.len() {
            self.release_i = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True only while the envelope holds at the sustain level: all three
    /// ramps exhausted and the envelope still active.
    pub fn is_sustaining(&self) -> bool {
        self.attack_i == self.attack_table.len()
            && self.decay_i == self.decay_table.len()
            && self.release_i == self.release_table.len()
            && self.active
    }

    fn regenerate(&mut self) {
        let mut attack = Vec::new();
        let mut decay = Vec::new();
        let mut release = Vec::new();
        let mut value = 0.0f64;
        let mut stage = 0u8;
        while stage != 3 {
            match stage {
                0 => {
                    value += 1.0 / (self.attack * self.sample_rate);
                    if value >= 1.0 {
                        value = 1.0;
                        stage = 1;
                    }
                    attack.push(q8_from_fraction(value) as u16);
                }
                1 => {
                    value -= (1.0 - self.sustain) / (self.decay * self.sample_rate);
                    if value <= self.sustain {
                        value = self.sustain;
                        stage = 2;
                    }
                    decay.push(q8_from_fraction(value) as u16);
                }
                _ => {
                    value -= self.sustain / (self.release * self.sample_rate);
                    if value <= 0.0 {
                        value = 0.0;
                        stage = 3;
                    }
                    release.push(q8_from_fraction(value) as u16);
                }
            }
        }
        self.attack_table = attack;
        self.decay_table = decay;
        self.release_table = release;
        self.attack_i = self.attack_table.len();
        self.decay_i = self.decay_table.len();
        self.release_i = self.release_table.len();
        self.active = false;
    }
}

impl SynthModule for Envelope {
    fn type_name(&self) -> &'static str {
        "envelope"
    }

    fn options(&self) -> &'static [&'static str] {
        &["attack", "decay", "sustain", "release"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        if !self.active {
            out.fill(0);
            return Ok(());
        }
        let input = inputs.require("input")?;
        let was_active = self.active;
        let sustain_hold = self.decay_table.last().copied().unwrap_or(0);
        for (slot, &word) in out.iter_mut().zip(input) {
            let fraction = if self.attack_i < self.attack_table.len() {
                let v = self.attack_table[self.attack_i];
                self.attack_i += 1;
                v
            } else if self.decay_i < self.decay_table.len() {
                let v = self.decay_table[self.decay_i];
                self.decay_i += 1;
                v
            } else if self.release_i < self.release_table.len() {
                let v = self.release_table[self.release_i];
                self.release_i += 1;
                if self.release_i == self.release_table.len() {
                    self.active = false;
                }
                v
            } else if was_active {
                sustain_hold
            } else {
                0
            };
            *slot = scale(word as i64, fraction as i64, 8) as Sample;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn alpha_q8(cutoff: f64, sample_rate: f64) -> i64 {
    let rc = 1.0 / (TAU * cutoff);
    q8_from_fraction(rc / (rc + 1.0 / sample_rate))
}

fn check_cutoff(module: &'static str, cutoff: f64, nyquist: f64) -> Result<(), SynthError> {
    if !cutoff.is_finite() || cutoff <= 0.0 || cutoff > nyquist {
        return Err(SynthError::invalid_parameter(
            module,
            "cutoff must be between 0 and the Nyquist frequency",
        ));
    }
    Ok(())
}

/// One-pole low-pass filter, leaky-integrator form:
/// `y[i] = alpha · (y[i-1] + x[i] − x[i-1])`.
///
/// `prev_input`/`prev_output` persist across buffers; they are DSP state,
/// not part of the per-cycle cache.
pub struct LowPassFilter {
    cutoff: f64,
    nyquist: f64,
    sample_rate: f64,
    alpha: i64,
    prev_input: i64,
    prev_output: i64,
}

impl LowPassFilter {
    pub fn new(config: &AudioConfig) -> Self {
        let sample_rate = config.sample_rate as f64;
        let cutoff = 1000.0;
        Self {
            cutoff,
            nyquist: config.nyquist(),
            sample_rate,
            alpha: alpha_q8(cutoff, sample_rate),
            prev_input: 0,
            prev_output: 0,
        }
    }

    pub fn set_cutoff(&mut self, cutoff: f64) -> Result<(), SynthError> {
        check_cutoff("lowpass", cutoff, self.nyquist)?;
        self.cutoff = cutoff;
        self.alpha = alpha_q8(cutoff, self.sample_rate);
        Ok(())
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl SynthModule for LowPassFilter {
    fn type_name(&self) -> &'static str {
        "lowpass"
    }

    fn options(&self) -> &'static [&'static str] {
        &["cutoff"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let input = inputs.require("input")?;
        for (slot, &word) in out.iter_mut().zip(input) {
            let x = word as i64;
            let sum = self.prev_output + x - self.prev_input;
            let y = scale(sum, self.alpha, 8);
            *slot = y as Sample;
            self.prev_input = x;
            self.prev_output = y;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One-pole high-pass filter: `y[i] = x[i] − x[i-1] + alpha · y[i-1]`.
pub struct HighPassFilter {
    cutoff: f64,
    nyquist: f64,
    sample_rate: f64,
    alpha: i64,
    prev_input: i64,
    prev_output: i64,
}

impl HighPassFilter {
    pub fn new(config: &AudioConfig) -> Self {
        let sample_rate = config.sample_rate as f64;
        let cutoff = 1000.0;
        Self {
            cutoff,
            nyquist: config.nyquist(),
            sample_rate,
            alpha: alpha_q8(cutoff, sample_rate),
            prev_input: 0,
            prev_output: 0,
        }
    }

    pub fn set_cutoff(&mut self, cutoff: f64) -> Result<(), SynthError> {
        check_cutoff("highpass", cutoff, self.nyquist)?;
        self.cutoff = cutoff;
        self.alpha = alpha_q8(cutoff, self.sample_rate);
        Ok(())
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl SynthModule for HighPassFilter {
    fn type_name(&self) -> &'static str {
        "highpass"
    }

    fn options(&self) -> &'static [&'static str] {
        &["cutoff"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let input = inputs.require("input")?;
        for (slot, &word) in out.iter_mut().zip(input) {
            let x = word as i64;
            let y = x - self.prev_input + scale(self.prev_output, self.alpha, 8);
            *slot = y as Sample;
            self.prev_input = x;
            self.prev_output = y;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Reverb
// ---------------------------------------------------------------------------

const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
/// Q17 gain (~0.24) applied to the comb sum before the allpass chain.
const COMB_SUM_GAIN: i64 = 31457;

/// Schroeder-style reverb: 8 parallel damped comb filters into 4 series
/// allpass stages, all in Q15 fixed point.
///
/// Each comb line has its own circular delay buffer and a one-pole damping
/// filter in its feedback path; the feedback written back into the line is
/// the previous damping-filter state scaled by the room size. The allpass
/// stages use a fixed 0.5 feedback implemented as a right shift. `mix`
/// crossfades the dry input against the diffuse tail. Delay buffers and
/// damping state persist across buffers.
pub struct Reverb {
    roomsize: f64,
    damp: f64,
    mix: f64,
    roomsize_q15: i64,
    damp1: i64,
    damp2: i64,
    mix_dry: i64,
    mix_wet: i64,
    comb_buffers: [Vec<Sample>; 8],
    comb_indexes: [usize; 8],
    comb_filters: [i64; 8],
    allpass_buffers: [Vec<Sample>; 4],
    allpass_indexes: [usize; 4],
}

impl Reverb {
    pub fn new(_config: &AudioConfig) -> Self {
        let mut reverb = Self {
            roomsize: 0.5,
            damp: 0.5,
            mix: 0.5,
            roomsize_q15: 0,
            damp1: 0,
            damp2: 0,
            mix_dry: 0,
            mix_wet: 0,
            comb_buffers: std::array::from_fn(|i| vec![0; COMB_TUNINGS[i]]),
            comb_indexes: [0; 8],
            comb_filters: [0; 8],
            allpass_buffers: std::array::from_fn(|i| vec![0; ALLPASS_TUNINGS[i]]),
            allpass_indexes: [0; 4],
        };
        reverb.refresh_coefficients();
        reverb
    }

    pub fn set_roomsize(&mut self, roomsize: f64) -> Result<(), SynthError> {
        Self::check_fraction("roomsize", roomsize)?;
        self.roomsize = roomsize;
        self.refresh_coefficients();
        Ok(())
    }

    pub fn set_damp(&mut self, damp: f64) -> Result<(), SynthError> {
        Self::check_fraction("damp", damp)?;
        self.damp = damp;
        self.refresh_coefficients();
        Ok(())
    }

    pub fn set_mix(&mut self, mix: f64) -> Result<(), SynthError> {
        Self::check_fraction("mix", mix)?;
        self.mix = mix;
        self.refresh_coefficients();
        Ok(())
    }

    pub fn roomsize(&self) -> f64 {
        self.roomsize
    }

    pub fn damp(&self) -> f64 {
        self.damp
    }

    pub fn mix(&self) -> f64 {
        self.mix
    }

    fn check_fraction(name: &'static str, value: f64) -> Result<(), SynthError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(SynthError::invalid_parameter(
                "reverb",
                format!("{} must be between 0 and 1", name),
            ));
        }
        Ok(())
    }

    fn refresh_coefficients(&mut self) {
        self.roomsize_q15 = q15_from_fraction(self.roomsize);
        self.damp1 = q15_from_fraction(self.damp);
        self.damp2 = 32767 - self.damp1;
        self.mix_dry = q15_from_fraction(1.0 - self.mix);
        self.mix_wet = q15_from_fraction(self.mix);
    }
}

impl SynthModule for Reverb {
    fn type_name(&self) -> &'static str {
        "reverb"
    }

    fn options(&self) -> &'static [&'static str] {
        &["roomsize", "damp", "mix"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let input = inputs.require("input")?;
        for (slot, &word) in out.iter_mut().zip(input) {
            let dry = word as i64;

            let mut comb_sum: i64 = 1;
            for line in 0..COMB_TUNINGS.len() {
                let index = self.comb_indexes[line];
                let delayed = self.comb_buffers[line][index] as i64;
                comb_sum += delayed;

                let filtered = self.comb_filters[line];
                self.comb_filters[line] =
                    scale(delayed, self.damp2, 15) + scale(filtered, self.damp1, 15);
                let feedback = scale(filtered, self.roomsize_q15, 15);
                self.comb_buffers[line][index] = (dry + feedback) as Sample;
                self.comb_indexes[line] = (index + 1) % COMB_TUNINGS[line];
            }

            let mut wet = scale(comb_sum, COMB_SUM_GAIN, 17);
            for stage in 0..ALLPASS_TUNINGS.len() {
                let index = self.allpass_indexes[stage];
                let delayed = self.allpass_buffers[stage][index] as i64;
                self.allpass_buffers[stage][index] = (wet + (delayed >> 1)) as Sample;
                wet = delayed - wet;
                self.allpass_indexes[stage] = (index + 1) % ALLPASS_TUNINGS[stage];
            }

            *slot = (scale(dry, self.mix_dry, 15) + scale(wet, self.mix_wet, 15)) as Sample;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Mixer & Output
// ---------------------------------------------------------------------------

const VOLUME_SUFFIX: &str = "_volume";

/// Summing mixer with optional per-channel volume modulation.
///
/// Every wired slot whose name does not end in `_volume` is a channel. A
/// channel slot `X` may be paired with a slot `X_volume`; when present,
/// each channel sample is scaled by the paired buffer's sample normalized
/// by `max_amplitude` before summation. Without a volume slot the channel
/// passes at unity gain. Summation happens in the signed domain and wraps
/// on store.
pub struct Mixer {
    max_amplitude: i64,
    scratch: Vec<i64>,
}

impl Mixer {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            max_amplitude: config.max_amplitude as i64,
            scratch: vec![0; config.buffer_size],
        }
    }
}

impl SynthModule for Mixer {
    fn type_name(&self) -> &'static str {
        "mixer"
    }

    fn input_names(&self, wired: &[&str]) -> Vec<String> {
        // one spare channel beyond what is already wired, volume slots last
        let channels = wired
            .iter()
            .filter(|name| !name.ends_with(VOLUME_SUFFIX))
            .count()
            + 1;
        let mut names: Vec<String> = (0..channels).map(|i| format!("input{}", i)).collect();
        names.extend((0..channels).map(|i| format!("input{}{}", i, VOLUME_SUFFIX)));
        names
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        for slot in self.scratch.iter_mut() {
            *slot = 0;
        }
        for (name, buffer) in inputs.iter() {
            if name.ends_with(VOLUME_SUFFIX) {
                continue;
            }
            match inputs.get(&format!("{}{}", name, VOLUME_SUFFIX)) {
                Some(volume) => {
                    for ((acc, &word), &vol) in
                        self.scratch.iter_mut().zip(buffer).zip(volume)
                    {
                        *acc += sample::to_signed(word) as i64 * sample::to_signed(vol) as i64
                            / self.max_amplitude;
                    }
                }
                None => {
                    for (acc, &word) in self.scratch.iter_mut().zip(buffer) {
                        *acc += sample::to_signed(word) as i64;
                    }
                }
            }
        }
        for (slot, &acc) in out.iter_mut().zip(&self.scratch) {
            *slot = acc as Sample;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Word value used as the positive saturation code by [`Output`].
const MAX_AMPLITUDE_CODE: i64 = 32768;

/// Final output stage: integer amplitude scaling and positive-side
/// clipping.
///
/// The clamp is asymmetric on purpose: positive overflow saturates at the
/// amplitude code, negative values wrap. Callers that need symmetric
/// clipping put a gain stage before the output.
pub struct Output {
    amplitude: u16,
}

impl Output {
    pub fn new(_config: &AudioConfig) -> Self {
        Self { amplitude: 1 }
    }

    pub fn set_amplitude(&mut self, amplitude: u16) {
        self.amplitude = amplitude;
    }

    pub fn amplitude(&self) -> u16 {
        self.amplitude
    }
}

impl SynthModule for Output {
    fn type_name(&self) -> &'static str {
        "output"
    }

    fn options(&self) -> &'static [&'static str] {
        &["amplitude"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let input = inputs.require("input")?;
        for (slot, &word) in out.iter_mut().zip(input) {
            let scaled = sample::to_signed(word) as i64 * self.amplitude as i64;
            *slot = if scaled > MAX_AMPLITUDE_CODE {
                MAX_AMPLITUDE_CODE as Sample
            } else {
                scaled as Sample
            };
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// PitchShifter
// ---------------------------------------------------------------------------

/// Pitch-controlled tone generator.
///
/// Owns a sine table and phase accumulator like an oscillator, but
/// advances phase by a fixed internal increment scaled by the integer part
/// of its `pitch` parameter instead of reading its declared `input` slot.
/// It therefore behaves as an independent oscillator, not a shifter of its
/// input signal; the wired `input`, if any, is accepted and ignored.
pub struct PitchShifter {
    table: Wavetable,
    pitch: f64,
}

impl PitchShifter {
    pub fn new(config: &AudioConfig) -> Self {
        let mut table = Wavetable::new(config);
        let max = config.max_amplitude as f64;
        for (i, slot) in table.table.iter_mut().enumerate() {
            *slot = (max * libm::sin(TAU * i as f64 / TABLE_SIZE as f64)) as i16;
        }
        Self { table, pitch: 1.0 }
    }

    /// Pitch factor in `(0.0, 2.0]`.
    pub fn set_pitch(&mut self, pitch: f64) -> Result<(), SynthError> {
        if !pitch.is_finite() || pitch <= 0.0 || pitch > 2.0 {
            return Err(SynthError::invalid_parameter(
                "pitchshifter",
                "pitch must be between 0 and 2",
            ));
        }
        self.pitch = pitch;
        Ok(())
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }
}

impl SynthModule for PitchShifter {
    fn type_name(&self) -> &'static str {
        "pitchshifter"
    }

    fn options(&self) -> &'static [&'static str] {
        &["pitch"]
    }

    fn input_names(&self, _wired: &[&str]) -> Vec<String> {
        vec!["input".to_string()]
    }

    fn update(&mut self, _inputs: &Inputs<'_>, out: &mut [Sample]) -> Result<(), SynthError> {
        let step = self.table.increment.wrapping_mul(self.pitch as u32);
        self.table.fill_fixed(step, out);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
