//! Traces a few synthetic signals (clock dividers, a sine wave and a memory bus) into a VCD file.

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use time::{Duration, OffsetDateTime};
use vcdtrace::prelude::*;

const MEMORY_WORDS: usize = 8192;
const WAVE_FREQ_HZ: f64 = 1e6;
const WAVE_AMPL_V: f64 = 4.5;
const WAVE_BIAS_V: f64 = 5.0;

#[derive(clap::Parser)]
struct Args {
    /// Output VCD file
    #[arg(long, short, default_value = "signals.vcd")]
    output: PathBuf,

    /// Number of 1ns cycles to simulate
    #[arg(long, default_value_t = 10_000)]
    cycles: u32,

    /// Unit written to the header, one of ns, us, ms or s
    #[arg(long, default_value = "ns")]
    timescale: Timescale,

    /// Annotate the trace with merge diagnostics
    #[arg(long)]
    debug_comments: bool,
}

struct Digital {
    clk: Value<bool>,
    bus: Bus,
}

struct Bus {
    clk: Value<bool>,
    addr: Value<u16>,
    data: Value<u32>,
    burst: Value<u8>,
    wr_strb: Value<bool>,
}

struct Analog {
    wave: Value<f64>,
}

impl TraceScope for Digital {
    fn build(scope: &mut ScopeBuilderState<'_>) -> Result<Self, BuilderError> {
        Ok(Self {
            clk: scope.add_value("clk", Value::builder())?,
            bus: scope.add_child("bus")?,
        })
    }
}

impl TraceScope for Bus {
    fn build(scope: &mut ScopeBuilderState<'_>) -> Result<Self, BuilderError> {
        Ok(Self {
            clk: scope.add_value("clk", Value::builder())?,
            addr: scope.add_value("addr", Value::builder())?,
            data: scope.add_value("data", Value::builder())?,
            burst: scope.add_value("burst", Value::builder().width(4))?,
            wr_strb: scope.add_value("wr_strb", Value::builder())?,
        })
    }
}

impl TraceScope for Analog {
    fn build(scope: &mut ScopeBuilderState<'_>) -> Result<Self, BuilderError> {
        Ok(Self {
            wave: scope.add_value("wave", Value::builder())?,
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = Config::default()
        .with_timescale(args.timescale)
        .with_debug_comments(args.debug_comments);
    let mut builder = TraceBuilder::with_config("root", config);
    let root = builder.root();
    let mut digital: Digital = builder
        .add_child("digital", root)
        .context("Error elaborating digital scope")?;
    let mut analog: Analog = builder
        .add_child("analog", root)
        .context("Error elaborating analog scope")?;

    let file = File::create(&args.output)
        .with_context(|| format!("Error creating {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    let mut tracer = builder.finalize_header(&mut out, OffsetDateTime::UNIX_EPOCH)?;

    let mut memory = vec![0u32; MEMORY_WORDS];
    let mut mem_addr = 0usize;
    digital.bus.burst.set(1);

    for i in 0..args.cycles {
        // div2 and div4
        digital.clk.set(i & 0x1 == 1);
        digital.bus.clk.set((i >> 1) & 0x1 == 1);

        let seconds = f64::from(i) * 1e-9;
        analog.wave.set(
            WAVE_BIAS_V + WAVE_AMPL_V * (seconds * WAVE_FREQ_HZ * 2.0 * std::f64::consts::PI).sin(),
        );

        match i % 100 {
            20 => {
                digital.bus.wr_strb.set(true);
                mem_addr = i as usize % MEMORY_WORDS;
                memory[mem_addr] = i.wrapping_mul(0x9876_4321).wrapping_add(0x3344_2677);
            }
            21 => digital.bus.wr_strb.set(false),
            _ => {}
        }
        digital.bus.addr.set(mem_addr as u16);
        digital.bus.data.set(memory[mem_addr]);

        tracer.advance_to(&mut out, Duration::nanoseconds(i64::from(i)))?;
    }
    let end = tracer.finalize_trace(&mut out)?;

    tracing::info!(
        end,
        values = tracer.registry().len(),
        output = %args.output.display(),
        "Wrote trace."
    );
    Ok(())
}
