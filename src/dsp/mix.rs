//! Summing, dry/wet blending and crossfades.

/*
Mixing Signals
==============

Mixing is addition. Everything on the master bus is built from three forms:

  sum           voices are added at equal level. Nothing stops the result
                exceeding ±1.0, which is why the bus has a compressor.

  dry/wet       an effect's output (wet) blended with its input (dry):

                    out = dry × (1 - mix) + wet × mix

                The two weights always add up to 1.0, so a full-scale dry
                signal and a full-scale wet signal never sum past full scale.

  crossfade     the same formula with `mix` moving from 0.0 to 1.0 over a
                block. Used when an old reverb impulse is replaced by a new
                one, so the tail changes character without a click.

    weight
      1.0 ──────╲            ╱────── new
                 ╲          ╱
                  ╲        ╱
                   ╲      ╱
      0.0 ──────────╲────╱────────── old
                fade start   fade end

The crossfade is linear. Two uncorrelated reverb tails at 50% each dip a
little in loudness mid-fade, but over 50 ms nobody hears it.
*/

/// Add `b` into `a`.
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}

/// Blend `b` into `a` in place: `a = a × (1-balance) + b × balance`.
#[inline]
pub fn mix_in_place(a: &mut [f32], b: &[f32], balance: f32) {
    debug_assert_eq!(a.len(), b.len());

    let balance = balance.clamp(0.0, 1.0);
    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa = blend_dry_wet(*sa, sb, balance);
    }
}

/// Single-sample dry/wet blend.
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Blend the unprocessed `dry` buffer back into `wet`, in place.
#[inline]
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], mix: f32) {
    debug_assert_eq!(dry.len(), wet.len());

    if mix >= 1.0 {
        return;
    }

    for (wet_sample, &dry_sample) in wet.iter_mut().zip(dry.iter()) {
        *wet_sample = blend_dry_wet(dry_sample, *wet_sample, mix);
    }
}

/// Linear crossfade position after `elapsed` of `length` samples.
#[inline]
pub fn crossfade_position(elapsed: usize, length: usize) -> f32 {
    if length == 0 {
        1.0
    } else {
        (elapsed as f32 / length as f32).min(1.0)
    }
}
