//! First Patch Example
//!
//! Builds the classic small-keyboard patch: a bank of oscillators sharing
//! one frequency source, a second oscillator pair providing slow amplitude
//! modulation through the mixer's volume slot, and an ADSR envelope in
//! front of the output.
//!
//! Run with: cargo run --example first_patch

use carillon::prelude::*;

/// Major pentatonic degrees above a root frequency.
fn pentatonic(root: f64) -> [i16; 5] {
    let semitones = [0, 2, 4, 7, 9];
    semitones.map(|s| (root * libm::pow(2.0, s as f64 / 12.0)) as i16)
}

fn main() {
    let config = AudioConfig::default();
    let mut synth = Synth::new(config);

    // control sources
    let note = synth.add_module(Input::new(&config));
    let base_note = synth.add_module(Input::new(&config));
    let tremolo_rate = synth.add_module(Input::new(&config));

    // voices
    let voice = synth.add_module(Sine::new(&config));
    let bass = synth.add_module(Sine::new(&config));
    let tremolo = synth.add_module(Sine::new(&config));

    let mixer = synth.add_module(Mixer::new(&config));
    let envelope = synth.add_module(Envelope::new(&config));

    synth.module_as_mut::<Input>(note).unwrap().set_value(440);
    synth.module_as_mut::<Input>(base_note).unwrap().set_value(110);
    synth.module_as_mut::<Input>(tremolo_rate).unwrap().set_value(1);

    synth.set_input(voice, "frequency", note).unwrap();
    synth.set_input(bass, "frequency", base_note).unwrap();
    synth.set_input(tremolo, "frequency", tremolo_rate).unwrap();

    // main voice at unity, bass amplitude-modulated by the slow sine
    synth.set_input(mixer, "input0", voice).unwrap();
    synth.set_input(mixer, "input1", bass).unwrap();
    synth.set_input(mixer, "input1_volume", tremolo).unwrap();

    synth.set_input(envelope, "input", mixer).unwrap();
    synth.set_input(synth.output(), "input", envelope).unwrap();
    synth
        .module_as_mut::<Output>(synth.output())
        .unwrap()
        .set_amplitude(1);

    println!(
        "patch: {} modules, draw order {:?}",
        synth.module_count(),
        synth
            .sort_modules()
            .unwrap()
            .iter()
            .map(|&id| synth.module(id).unwrap().type_name())
            .collect::<Vec<_>>()
    );

    // play one pentatonic phrase: attack, hold, release per note
    let scale = pentatonic(440.0);
    let cycles_per_second = (config.sample_rate as usize / config.buffer_size).max(1);
    for frequency in scale {
        synth
            .module_as_mut::<Input>(note)
            .unwrap()
            .set_value(frequency);
        synth
            .module_as_mut::<Envelope>(envelope)
            .unwrap()
            .trigger_attack();

        let mut peak = 0i32;
        for _ in 0..cycles_per_second / 4 {
            let buffer = synth.get_buffer().unwrap();
            for &word in &buffer {
                peak = peak.max((word as i16 as i32).abs());
            }
        }
        synth
            .module_as_mut::<Envelope>(envelope)
            .unwrap()
            .trigger_release();
        for _ in 0..cycles_per_second / 8 {
            synth.get_buffer().unwrap();
        }
        println!("note {:>4} Hz  peak {:>5}", frequency, peak);
    }
}
