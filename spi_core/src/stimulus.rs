use miette::Diagnostic;
use thiserror::Error;

use crate::frame::SpiTransaction;
use crate::types::{SpiPins, FRAME_BITS};
use crate::COMMIT_LATENCY;

// bus timing in system clock ticks
// defaults: 10 MHz system clock, 10 kHz sclk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    // sclk spends this long low, then this long high, per bit
    pub half_period_ticks: usize,
    pub idle_ticks: usize,
    pub setup_ticks: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            half_period_ticks: 50,
            idle_ticks: 600,
            setup_ticks: 1,
        }
    }
}

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum StimulusError {
    #[error("half period must be at least one tick")]
    #[diagnostic(help(
        "the synchronizer needs every SCLK level to last at least one tick to see it"
    ))]
    ZeroHalfPeriod,

    #[error("a partial frame of {0} bits is not shorter than a full frame")]
    PartialTooLong(u32),
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), StimulusError> {
        if self.half_period_ticks == 0 {
            return Err(StimulusError::ZeroHalfPeriod);
        }
        Ok(())
    }
}

// tick-by-tick pin levels of a host bit-banging spi mode 0:
// mosi changes while sclk is low and holds across the rising edge
#[derive(Debug, Clone)]
pub struct Stimulus {
    timing: TimingConfig,
    pins: Vec<SpiPins>,
    // tick index at which each chip-select release starts
    releases: Vec<usize>,
}

impl Stimulus {
    pub fn new(timing: TimingConfig) -> Result<Self, StimulusError> {
        timing.validate()?;
        Ok(Self {
            timing,
            pins: Vec::new(),
            releases: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn releases(&self) -> &[usize] {
        &self.releases
    }

    // ticks after each release by which its commit is visible on the outputs
    pub fn commit_ticks(&self) -> Vec<usize> {
        self.releases.iter().map(|r| r + COMMIT_LATENCY).collect()
    }

    pub fn idle(mut self, ticks: usize) -> Self {
        self.hold(SpiPins::idle(), ticks);
        self
    }

    pub fn transaction(self, tx: &SpiTransaction) -> Self {
        self.clocked_frame(tx.frame(), FRAME_BITS)
    }

    pub fn transactions<'a>(self, txs: impl IntoIterator<Item = &'a SpiTransaction>) -> Self {
        txs.into_iter().fold(self, |stim, tx| stim.transaction(tx))
    }

    // truncated: only the first `bits` bits are clocked
    pub fn partial_frame(self, frame: u16, bits: u32) -> Result<Self, StimulusError> {
        if bits >= FRAME_BITS {
            return Err(StimulusError::PartialTooLong(bits));
        }
        Ok(self.clocked_frame(frame, bits))
    }

    // `frame` then `extra` more zero bits
    pub fn overlong_frame(self, frame: u16, extra: u32) -> Self {
        let mut stim = self.select();
        for i in 0..FRAME_BITS {
            stim.bit(frame_bit(frame, i));
        }
        for _ in 0..extra {
            stim.bit(false);
        }
        stim.release()
    }

    // idle long enough for the last commit and handshake to settle
    pub fn drain(self) -> Self {
        self.idle(COMMIT_LATENCY + 2)
    }

    pub fn build(self) -> Vec<SpiPins> {
        self.pins
    }

    fn clocked_frame(self, frame: u16, bits: u32) -> Self {
        let mut stim = self.select();
        for i in 0..bits {
            stim.bit(frame_bit(frame, i));
        }
        stim.release()
    }

    fn select(mut self) -> Self {
        let setup = self.timing.setup_ticks;
        self.hold(
            SpiPins {
                cs_n: false,
                sclk: false,
                mosi: false,
            },
            setup,
        );
        self
    }

    fn release(mut self) -> Self {
        let idle = self.timing.idle_ticks;
        self.releases.push(self.pins.len());
        self.hold(SpiPins::idle(), idle.max(1));
        self
    }

    fn bit(&mut self, mosi: bool) {
        let half = self.timing.half_period_ticks;
        self.hold(
            SpiPins {
                cs_n: false,
                sclk: false,
                mosi,
            },
            half,
        );
        self.hold(
            SpiPins {
                cs_n: false,
                sclk: true,
                mosi,
            },
            half,
        );
    }

    fn hold(&mut self, pins: SpiPins, ticks: usize) {
        self.pins.extend(std::iter::repeat(pins).take(ticks));
    }
}

// i-th bit in transmission order (msb first)
fn frame_bit(frame: u16, i: u32) -> bool {
    (frame >> (FRAME_BITS - 1 - i)) & 1 == 1
}
