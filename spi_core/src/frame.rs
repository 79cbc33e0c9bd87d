use miette::Diagnostic;
use rhdl::prelude::*;
use thiserror::Error;

use crate::types::*;

// largest address that fits the 7 bit field of a frame
pub const MAX_WIRE_ADDRESS: u8 = 0x7f;

// wire layout, msb first: [15] write, [14:8] address, [7:0] data
#[kernel]
pub fn decode_frame(frame: b16) -> FrameFields {
    let write = (frame >> 15) != bits(0);
    let address: b7 = (frame >> 8).resize();
    let data: b8 = frame.resize();

    FrameFields {
        write,
        address,
        data,
    }
}

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum FrameError {
    #[error("address {0:#04x} does not fit the 7 bit address field")]
    #[diagnostic(help("addresses must be in 0x00..=0x7f"))]
    AddressOutOfRange(u16),

    #[error("data {0:#x} does not fit the 8 bit data field")]
    DataOutOfRange(u16),
}

// host side transaction; reads and addresses above 4 are legal on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiTransaction {
    pub write: bool,
    pub address: u8,
    pub data: u8,
}

impl SpiTransaction {
    // u16 so csv values wider than the field get an error, not truncation
    pub fn new(write: bool, address: u16, data: u16) -> Result<Self, FrameError> {
        if address > MAX_WIRE_ADDRESS as u16 {
            return Err(FrameError::AddressOutOfRange(address));
        }
        if data > u8::MAX as u16 {
            return Err(FrameError::DataOutOfRange(data));
        }
        Ok(Self {
            write,
            address: address as u8,
            data: data as u8,
        })
    }

    pub fn write(address: u16, data: u16) -> Result<Self, FrameError> {
        Self::new(true, address, data)
    }

    pub fn read(address: u16, data: u16) -> Result<Self, FrameError> {
        Self::new(false, address, data)
    }

    // bit 15 goes out first
    pub fn frame(&self) -> u16 {
        ((self.write as u16) << 15) | ((self.address as u16 & 0x7f) << 8) | self.data as u16
    }

    pub fn target_register(&self) -> Option<usize> {
        let address = self.address as usize;
        (self.write && address < REGISTER_COUNT).then_some(address)
    }
}
