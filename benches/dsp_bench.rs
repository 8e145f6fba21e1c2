//! Render-Path Benchmarks
//!
//! Validates that a full graph pull stays within the real-time budget of
//! `buffer_size / sample_rate` seconds per cycle:
//!
//! | Sample Rate | Buffer 64 | Buffer 200 | Buffer 512 |
//! |-------------|-----------|------------|------------|
//! | 8 kHz       | 8.00 ms   | 25.00 ms   | 64.00 ms   |
//! | 44.1 kHz    | 1.45 ms   | 4.54 ms    | 11.61 ms   |
//!
//! The voice patch below exercises every per-sample kernel: wavetable
//! lookup, envelope scaling, one-pole filtering, and the comb/allpass
//! reverb network.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use carillon::prelude::*;

const BUFFER_SIZES: [usize; 3] = [64, 200, 512];

fn create_voice_patch(config: AudioConfig) -> Synth {
    let mut synth = Synth::new(config);

    let frequency = synth.add_module(Input::new(&config));
    let sine = synth.add_module(Sine::new(&config));
    let saw = synth.add_module(Sawtooth::new(&config));
    let volume = synth.add_module(Input::new(&config));
    let mixer = synth.add_module(Mixer::new(&config));
    let envelope = synth.add_module(Envelope::new(&config));
    let lowpass = synth.add_module(LowPassFilter::new(&config));
    let reverb = synth.add_module(Reverb::new(&config));

    synth.module_as_mut::<Input>(frequency).unwrap().set_value(440);
    synth.module_as_mut::<Input>(volume).unwrap().set_value(128);

    synth.set_input(sine, "frequency", frequency).unwrap();
    synth.set_input(saw, "frequency", frequency).unwrap();
    synth.set_input(mixer, "input0", sine).unwrap();
    synth.set_input(mixer, "input1", saw).unwrap();
    synth.set_input(mixer, "input1_volume", volume).unwrap();
    synth.set_input(envelope, "input", mixer).unwrap();
    synth.set_input(lowpass, "input", envelope).unwrap();
    synth.set_input(reverb, "input", lowpass).unwrap();
    synth.set_input(synth.output(), "input", reverb).unwrap();

    synth
        .module_as_mut::<Envelope>(envelope)
        .unwrap()
        .trigger_attack();
    synth
}

fn bench_render_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_cycle");
    for buffer_size in BUFFER_SIZES {
        let config = AudioConfig::new(8000, buffer_size, 255).unwrap();
        let mut synth = create_voice_patch(config);
        let mut out = vec![0u16; buffer_size];

        group.throughput(Throughput::Elements(buffer_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &buffer_size,
            |b, _| {
                b.iter(|| {
                    synth.render_into(black_box(&mut out)).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_sort_modules(c: &mut Criterion) {
    let config = AudioConfig::new(8000, 200, 255).unwrap();
    let synth = create_voice_patch(config);
    c.bench_function("sort_modules", |b| {
        b.iter(|| black_box(synth.sort_modules().unwrap()));
    });
}

criterion_group!(benches, bench_render_cycle, bench_sort_modules);
criterion_main!(benches);
