use rhdl::prelude::*;
use spi_core::{
    miette_report, register_values, SpiPeripheral, SpiPins, SpiTransaction, Stimulus,
    TimingConfig,
};

// register 2 <- 0xA5, an unmapped write, a read, and a truncated frame
// only the first one may change anything
fn demo_stimulus() -> miette::Result<Vec<SpiPins>> {
    // short bus timing so the waveform stays readable
    let timing = TimingConfig {
        half_period_ticks: 4,
        idle_ticks: 16,
        setup_ticks: 1,
    };

    let scenario = [
        SpiTransaction::write(0x02, 0xA5)?,
        SpiTransaction::write(0x07, 0xFF)?,
        SpiTransaction::read(0x02, 0x3C)?,
    ];

    for tx in &scenario {
        println!(
            "{} addr={:#04x} data={:#04x} frame={:#06x}",
            if tx.write { "write" } else { "read " },
            tx.address,
            tx.data,
            tx.frame()
        );
    }

    let pins = Stimulus::new(timing)?
        .idle(5)
        .transactions(&scenario)
        .partial_frame(0x8111, 10)?
        .drain()
        .build();
    Ok(pins)
}

fn run_simulation(pins: Vec<SpiPins>) -> Result<(), RHDLError> {
    let uut = SpiPeripheral::default();

    println!("Stimulus: {} ticks", pins.len());

    let stream = pins.clone().with_reset(1).clock_pos_edge(100);
    let vcd = uut.run(stream)?.collect::<Vcd>();

    let filename = "spi_peripheral.vcd";
    println!("Writing '{}'...", filename);
    vcd.dump_to_file(filename)?;

    let stream = pins.with_reset(1).clock_pos_edge(100);
    if let Some(last) = uut.run(stream)?.synchronous_sample().last() {
        let regs = register_values(last.value.2.registers);
        println!("Final registers: {:02x?}", regs);
    }

    println!("Expected: register 2 = 0xa5, all others 0x00.");
    Ok(())
}

fn main() {
    println!("--- SPI register peripheral simulation ---");

    let pins = match demo_stimulus() {
        Ok(pins) => pins,
        Err(e) => {
            println!("{e:?}");
            return;
        }
    };

    if let Err(e) = run_simulation(pins) {
        println!("{}", miette_report(e));
    }
}
