use rhdl::prelude::*;
use rhdl_fpga::core::dff::DFF;

use crate::types::{Edges, SpiPins};

// remembers last tick's stable cs/sclk and flags 0 -> 1 transitions
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct EdgeDetector {
    prev_cs_n: DFF<bool>,
    prev_sclk: DFF<bool>,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        // reset values match the idle bus so the first tick is quiet
        Self {
            prev_cs_n: DFF::new(true),
            prev_sclk: DFF::new(false),
        }
    }
}

impl SynchronousIO for EdgeDetector {
    type I = SpiPins; // stable pins
    type O = Edges;
    type Kernel = edge_kernel;
}

#[kernel]
pub fn edge_kernel(_cr: ClockReset, stable: SpiPins, q: Q) -> (Edges, D) {
    let edges = Edges {
        cs_rise: !q.prev_cs_n & stable.cs_n,
        sclk_rise: !q.prev_sclk & stable.sclk,
    };

    // tracked every tick, whatever cs is doing
    (
        edges,
        D {
            prev_cs_n: stable.cs_n,
            prev_sclk: stable.sclk,
        },
    )
}
