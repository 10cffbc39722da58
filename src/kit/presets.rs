//! Factory kit: sixteen one-shot pads on a 4×4 keyboard block plus four
//! genre loops.
//!
//! ```text
//!   1 Kick      2 Snare     3 Closed Hat  4 Open Hat      5 Boom Bap Loop
//!   q Clap      w 808 Bass  e Reese Bass  r Sub Kick      t House Loop
//!   a Pluck C   s Pluck E   d Pluck G     f Rim           g Trap Loop
//!   z Gunshot   x Tape Stop c Scratch     v Noise Riser   b Lo-Fi Loop
//! ```

use super::{Kit, PadSpec, SoundType, Waveform};

fn specs() -> Vec<PadSpec> {
    use SoundType::*;

    vec![
        PadSpec::new(0, '1', "Kick", Kick)
            .color("red")
            .frequency(60.0)
            .decays(0.12, 0.45)
            .distorted(),
        PadSpec::new(1, '2', "Snare", Snare)
            .color("orange")
            .frequency(200.0)
            .decays(0.05, 0.2)
            .waveform(Waveform::Triangle)
            .noise(),
        PadSpec::new(2, '3', "Closed Hat", HiHat)
            .color("yellow")
            .frequency(8_000.0)
            .decays(0.01, 0.05),
        PadSpec::new(3, '4', "Open Hat", HiHat)
            .color("yellow")
            .frequency(8_000.0)
            .decays(0.01, 0.3),
        PadSpec::new(4, 'q', "Clap", Snare)
            .color("magenta")
            .frequency(180.0)
            .decays(0.03, 0.25),
        PadSpec::new(5, 'w', "808 Bass", Bass)
            .color("purple")
            .frequency(45.0)
            .decays(0.3, 0.9)
            .distorted(),
        PadSpec::new(6, 'e', "Reese Bass", Bass)
            .color("purple")
            .frequency(55.0)
            .decays(0.2, 0.6)
            .waveform(Waveform::Sawtooth),
        PadSpec::new(7, 'r', "Sub Kick", Kick)
            .color("red")
            .frequency(45.0)
            .decays(0.2, 0.6),
        PadSpec::new(8, 'a', "Pluck C", Synth)
            .color("blue")
            .frequency(261.63)
            .decays(0.3, 0.4)
            .waveform(Waveform::Sawtooth),
        PadSpec::new(9, 's', "Pluck E", Synth)
            .color("blue")
            .frequency(329.63)
            .decays(0.3, 0.4)
            .waveform(Waveform::Sawtooth),
        PadSpec::new(10, 'd', "Pluck G", Synth)
            .color("blue")
            .frequency(392.0)
            .decays(0.3, 0.4)
            .waveform(Waveform::Sawtooth),
        PadSpec::new(11, 'f', "Rim", Snare)
            .color("orange")
            .frequency(400.0)
            .decays(0.02, 0.06)
            .waveform(Waveform::Triangle),
        PadSpec::new(12, 'z', "Gunshot", Fx)
            .color("gray")
            .frequency(80.0)
            .decays(0.3, 0.8),
        PadSpec::new(13, 'x', "Tape Stop", Fx)
            .color("gray")
            .frequency(220.0)
            .decays(1.0, 1.0)
            .waveform(Waveform::Sawtooth),
        PadSpec::new(14, 'c', "Scratch", Fx)
            .color("gray")
            .frequency(1_000.0)
            .decays(0.25, 0.3),
        PadSpec::new(15, 'v', "Noise Riser", Fx)
            .color("gray")
            .frequency(1_000.0)
            .decays(1.5, 1.5),
        PadSpec::new(16, '5', "Boom Bap Loop", Kick)
            .color("green")
            .frequency(220.0)
            .decays(1.0, 1.0),
        PadSpec::new(17, 't', "House Loop", Kick)
            .color("green")
            .frequency(261.63)
            .decays(1.0, 1.0),
        PadSpec::new(18, 'g', "Trap Loop", Kick)
            .color("green")
            .frequency(196.0)
            .decays(1.0, 1.0),
        PadSpec::new(19, 'b', "Lo-Fi Loop", Kick)
            .color("green")
            .frequency(174.61)
            .decays(1.0, 1.0),
    ]
}

/// The built-in kit every session starts with.
pub fn factory_kit() -> Kit {
    Kit {
        name: "Factory".to_string(),
        pads: specs()
            .into_iter()
            .filter_map(|spec| spec.build().ok())
            .collect(),
    }
}
