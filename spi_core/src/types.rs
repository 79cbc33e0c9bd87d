use rhdl::prelude::*;

// bits in one transaction: 1 write flag + 7 address + 8 data
pub const FRAME_BITS: u32 = 16;

// addressable output registers (addresses 0..=4)
pub const REGISTER_COUNT: usize = 5;

pub type RegisterBank = [b8; REGISTER_COUNT];

// the three pins as seen by the peripheral
// cs_n is active low, so the idle level is high
#[derive(PartialEq, Debug, Digital, Default)]
pub struct SpiPins {
    pub cs_n: bool,
    pub sclk: bool,
    pub mosi: bool,
}

impl SpiPins {
    // bus idle: chip-select released, clock low, data low
    pub const fn idle() -> Self {
        Self {
            cs_n: true,
            sclk: false,
            mosi: false,
        }
    }
}

// one-tick pulses produced by the edge detector
#[derive(PartialEq, Debug, Digital, Default)]
pub struct Edges {
    pub cs_rise: bool,
    pub sclk_rise: bool,
}

// shift register contents plus number of bits clocked in since cs went low
#[derive(PartialEq, Debug, Digital, Default)]
pub struct FrameState {
    pub frame: b16,
    pub count: b5,
}

// decoded view of a 16 bit frame
#[derive(PartialEq, Debug, Digital, Default)]
pub struct FrameFields {
    pub write: bool,
    pub address: b7,
    pub data: b8,
}

#[derive(PartialEq, Debug, Digital, Default)]
pub struct RegisterFileOutput {
    pub registers: RegisterBank,
    pub processed: bool,
}

// top level outputs
// ready/processed are exported so a test bench can watch the handshake
#[derive(PartialEq, Debug, Digital, Default)]
pub struct SpiOutput {
    pub registers: RegisterBank,
    pub ready: bool,
    pub processed: bool,
}

// plain byte view of the register bank for host-side code
pub fn register_values(bank: RegisterBank) -> [u8; REGISTER_COUNT] {
    bank.map(|reg| reg.raw() as u8)
}
