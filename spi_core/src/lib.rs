use rhdl::prelude::*;

pub mod types;
pub mod frame;
pub mod synchronizer;
pub mod edge_detector;
pub mod frame_assembler;
pub mod handshake;
pub mod register_file;
pub mod stimulus;

pub use types::*;
pub use frame::{decode_frame, FrameError, SpiTransaction, MAX_WIRE_ADDRESS};
pub use synchronizer::{Synchronizer, SYNC_DEPTH};
pub use edge_detector::EdgeDetector;
pub use frame_assembler::FrameAssembler;
pub use handshake::TransactionHandshake;
pub use register_file::RegisterFile;
pub use stimulus::{Stimulus, StimulusError, TimingConfig};

// ticks from raw cs release until the register bank shows the commit:
// synchronizer, then one tick to raise ready, one tick to commit
pub const COMMIT_LATENCY: usize = SYNC_DEPTH + 2;

// renders rhdl errors (which carry source spans) as a readable report
pub fn miette_report(err: RHDLError) -> String {
    let handler =
        miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor());
    let mut msg = String::new();
    if handler.render_report(&mut msg, &err).is_err() {
        msg = err.to_string();
    }
    msg
}

// write-only spi slave with five 8 bit registers, pins are asynchronous
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct SpiPeripheral {
    sync: Synchronizer,
    edges: EdgeDetector,
    assembler: FrameAssembler,
    handshake: TransactionHandshake,
    registers: RegisterFile,
}

impl Default for SpiPeripheral {
    fn default() -> Self {
        Self {
            sync: Synchronizer::default(),
            edges: EdgeDetector::default(),
            assembler: FrameAssembler::default(),
            handshake: TransactionHandshake::default(),
            registers: RegisterFile::default(),
        }
    }
}

impl SynchronousIO for SpiPeripheral {
    type I = SpiPins;
    type O = SpiOutput;
    type Kernel = peripheral_kernel;
}

// pure wiring, all state lives in the children
// data only flows down the chain, except processed going back to the handshake
// which comes straight out of a flip-flop
#[kernel]
pub fn peripheral_kernel(_cr: ClockReset, pins: SpiPins, q: Q) -> (SpiOutput, D) {
    let mut d = D::dont_care();

    d.sync = pins;
    d.edges = q.sync;
    d.assembler = (q.sync, q.edges);
    d.handshake = (q.edges.cs_rise, q.assembler, q.registers.processed);
    d.registers = (q.handshake, q.assembler.frame);

    let output = SpiOutput {
        registers: q.registers.registers,
        ready: q.handshake,
        processed: q.registers.processed,
    };

    (output, d)
}
