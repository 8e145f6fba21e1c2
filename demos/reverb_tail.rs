//! Reverb Tail Example
//!
//! Sends a single impulse through the comb/allpass network and prints the
//! first echoes as they fall out of the delay lines.
//!
//! Run with: cargo run --example reverb_tail

use carillon::prelude::*;

fn main() {
    let config = AudioConfig::new(8000, 200, 255).unwrap();
    let mut synth = Synth::new(config);

    let source = synth.add_module(Input::new(&config));
    let reverb = synth.add_module(Reverb::new(&config));
    synth.set_input(reverb, "input", source).unwrap();
    synth.set_input(synth.output(), "input", reverb).unwrap();

    let verb = synth.module_as_mut::<Reverb>(reverb).unwrap();
    verb.set_roomsize(0.7).unwrap();
    verb.set_damp(0.3).unwrap();
    verb.set_mix(1.0).unwrap();

    // one buffer of impulse, then silence
    synth.module_as_mut::<Input>(source).unwrap().set_value(10000);
    let mut sample_index = 0usize;
    for cycle in 0..16 {
        if cycle == 1 {
            synth.module_as_mut::<Input>(source).unwrap().set_value(0);
        }
        let buffer = synth.get_buffer().unwrap();
        for &word in &buffer {
            let signed = word as i16 as i32;
            if signed.abs() > 500 {
                println!("echo at sample {:>5}: {:>6}", sample_index, signed);
            }
            sample_index += 1;
        }
    }
    println!("rendered {} samples of tail", sample_index);
}
