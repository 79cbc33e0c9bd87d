use rhdl::prelude::*;
use rhdl_fpga::core::dff::DFF;

use crate::types::FrameState;

// producer side of the ready/processed handshake
//
//   (ready, processed)
//   (0, 0) idle
//   (1, 0) frame complete, waiting for the register file
//   (1, 1) committed, ready drops next tick
//
// processed belongs to the register file and is only read here
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct TransactionHandshake {
    ready: DFF<bool>,
}

impl Default for TransactionHandshake {
    fn default() -> Self {
        Self {
            ready: DFF::new(false),
        }
    }
}

pub type HandshakeIn = (bool, FrameState, bool); // (cs rising edge, frame state, processed)

impl SynchronousIO for TransactionHandshake {
    type I = HandshakeIn;
    type O = bool; // ready
    type Kernel = handshake_kernel;
}

#[kernel]
pub fn handshake_kernel(_cr: ClockReset, input: HandshakeIn, q: Q) -> (bool, D) {
    let (cs_rise, state, processed) = input;

    // only an exact 16 bit transaction counts, anything else is dropped
    let complete = cs_rise & (state.count == bits(16));

    let next_ready = if complete {
        true
    } else if processed {
        false
    } else {
        q.ready
    };

    (q.ready, D { ready: next_ready })
}
