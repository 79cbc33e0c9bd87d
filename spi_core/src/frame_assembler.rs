use rhdl::prelude::*;
use rhdl_fpga::core::dff::DFF;

use crate::types::{Edges, FrameState, SpiPins};

// shift in mosi on every sclk rise while cs is low, msb first
// no cap at 16: a wrong count at release just never gets accepted
// count saturates at 31 so it can't wrap back to 16
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct FrameAssembler {
    frame: DFF<b16>,
    count: DFF<b5>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self {
            frame: DFF::new(b16::default()),
            count: DFF::new(b5::default()),
        }
    }
}

pub type AssemblerIn = (SpiPins, Edges); // (stable pins, edges)

impl SynchronousIO for FrameAssembler {
    type I = AssemblerIn;
    type O = FrameState;
    type Kernel = assembler_kernel;
}

#[kernel]
pub fn assembler_kernel(_cr: ClockReset, input: AssemblerIn, q: Q) -> (FrameState, D) {
    let (stable, edges) = input;

    let mut next_frame = q.frame;
    let mut next_count = q.count;

    if stable.cs_n {
        next_count = bits(0);
    } else if edges.sclk_rise {
        let mosi_bit = if stable.mosi { bits(1) } else { bits(0) };
        next_frame = (q.frame << 1) | mosi_bit;
        if q.count != bits(31) {
            next_count = q.count + bits(1);
        }
    }

    let state = FrameState {
        frame: q.frame,
        count: q.count,
    };

    (
        state,
        D {
            frame: next_frame,
            count: next_count,
        },
    )
}
