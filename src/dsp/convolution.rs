//! Convolution reverb: a generated impulse response applied with a
//! uniformly-partitioned FFT convolver.
//!
//! # Impulse Response
//!
//! A reverb tail is approximated by two channels of decaying white noise:
//!
//! ```text
//! ir[n] = rand(-1, 1) * (1 - t / T) ^ decay        t = n / sample_rate
//! ```
//!
//! `T` is the tail length and `decay` the curve exponent: 1 is a straight
//! fade, larger values collapse faster and sound like a smaller room. The two
//! channels use independent noise, which is what makes the tail wide.
//!
//! # Partitioned Convolution
//!
//! Convolving directly with a two-second impulse costs ~96k multiplies per
//! output sample. Instead the impulse is cut into partitions of `P` samples,
//! each pre-transformed once:
//!
//! ```text
//!   impulse  [ h0 | h1 | h2 | ... | hK-1 ]        K = ceil(len / P)
//!
//!   every P input samples:
//!     X  = FFT(block zero-padded to 2P)
//!     Y  = X·H0 + X[-1]·H1 + X[-2]·H2 + ...      (frequency-domain history)
//!     y  = IFFT(Y)
//!     out = y[0..P] + overlap;  overlap = y[P..2P]
//! ```
//!
//! The zero padding makes each block product a linear (not circular)
//! convolution, and the second half of every result overlaps the next block.
//! Output lags the input by exactly `P` samples; at 48 kHz that is ~10 ms,
//! inaudible on a reverb send.
//!
//! All buffers are allocated when the convolver is built. `process` never
//! allocates, so a convolver can be built on the control thread and handed to
//! the render path.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Samples per partition (and the convolver's latency).
pub const PARTITION: usize = 512;

/// Stereo impulse response.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ImpulseResponse {
    /// Exponentially decaying white noise, `seconds` long.
    pub fn generate(sample_rate: f32, seconds: f32, decay: f32, seed: u64) -> Self {
        let len = ((seconds.max(0.01) * sample_rate) as usize).max(1);
        let decay = decay.max(0.01);
        let mut rng = fastrand::Rng::with_seed(seed);

        let mut channel = || -> Vec<f32> {
            (0..len)
                .map(|n| {
                    let remaining = 1.0 - n as f32 / len as f32;
                    (rng.f32() * 2.0 - 1.0) * remaining.powf(decay)
                })
                .collect()
        };

        let left = channel();
        let right = channel();
        Self { left, right }
    }

    /// Scale both channels to unit energy, so white noise through the
    /// reverb comes out at roughly the level it went in.
    pub fn normalized(mut self) -> Self {
        let energy = self
            .left
            .iter()
            .chain(self.right.iter())
            .map(|s| s * s)
            .sum::<f32>()
            / 2.0;
        if energy > 0.0 {
            let gain = energy.sqrt().recip();
            for s in self.left.iter_mut().chain(self.right.iter_mut()) {
                *s *= gain;
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Mono uniformly-partitioned overlap-add convolver.
pub struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,

    /// Spectrum of each impulse partition
    partitions: Vec<Vec<Complex<f32>>>,
    /// Spectra of the most recent input blocks, newest at `history_pos`
    history: Vec<Vec<Complex<f32>>>,
    history_pos: usize,

    work: Vec<Complex<f32>>,
    accumulator: Vec<Complex<f32>>,
    input: Vec<f32>,
    output: Vec<f32>,
    overlap: Vec<f32>,
    fill: usize,
}

impl Convolver {
    pub fn new(impulse: &[f32]) -> Self {
        let fft_size = PARTITION * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let partitions: Vec<Vec<Complex<f32>>> = impulse
            .chunks(PARTITION)
            .map(|chunk| {
                let mut spectrum = vec![Complex::default(); fft_size];
                for (bin, &h) in spectrum.iter_mut().zip(chunk) {
                    bin.re = h;
                }
                fft.process_with_scratch(&mut spectrum, &mut scratch);
                spectrum
            })
            .collect();
        let count = partitions.len().max(1);

        Self {
            fft,
            ifft,
            scratch,
            partitions,
            history: vec![vec![Complex::default(); fft_size]; count],
            history_pos: 0,
            work: vec![Complex::default(); fft_size],
            accumulator: vec![Complex::default(); fft_size],
            input: vec![0.0; PARTITION],
            output: vec![0.0; PARTITION],
            overlap: vec![0.0; PARTITION],
            fill: 0,
        }
    }

    /// Processing delay in samples.
    pub fn latency(&self) -> usize {
        PARTITION
    }

    /// Push one input sample, get one (delayed) output sample.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let out = self.output[self.fill];
        self.input[self.fill] = sample;
        self.fill += 1;
        if self.fill == PARTITION {
            self.fill = 0;
            self.process_partition();
        }
        out
    }

    fn process_partition(&mut self) {
        let count = self.history.len();

        for (bin, &x) in self.work.iter_mut().zip(self.input.iter()) {
            *bin = Complex::new(x, 0.0);
        }
        for bin in self.work[PARTITION..].iter_mut() {
            *bin = Complex::default();
        }
        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);

        self.history_pos = (self.history_pos + count - 1) % count;
        self.history[self.history_pos].copy_from_slice(&self.work);

        for bin in self.accumulator.iter_mut() {
            *bin = Complex::default();
        }
        for (k, partition) in self.partitions.iter().enumerate() {
            let spectrum = &self.history[(self.history_pos + k) % count];
            for ((acc, &x), &h) in self
                .accumulator
                .iter_mut()
                .zip(spectrum.iter())
                .zip(partition.iter())
            {
                *acc += x * h;
            }
        }

        self.ifft
            .process_with_scratch(&mut self.accumulator, &mut self.scratch);
        let scale = 1.0 / (PARTITION * 2) as f32;

        for i in 0..PARTITION {
            self.output[i] = self.accumulator[i].re * scale + self.overlap[i];
            self.overlap[i] = self.accumulator[PARTITION + i].re * scale;
        }
    }

    pub fn reset(&mut self) {
        for spectrum in self.history.iter_mut() {
            spectrum.fill(Complex::default());
        }
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.overlap.fill(0.0);
        self.fill = 0;
    }
}

/// Two convolvers fed from one mono send.
pub struct StereoConvolver {
    left: Convolver,
    right: Convolver,
}

impl StereoConvolver {
    pub fn new(impulse: &ImpulseResponse) -> Self {
        Self {
            left: Convolver::new(&impulse.left),
            right: Convolver::new(&impulse.right),
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> (f32, f32) {
        (self.left.process(sample), self.right.process(sample))
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
