use time::Duration;
use vcdtrace_core::{IdentifierGenerator, VarDescriptor};

use super::*;
use crate::{Binding, SequenceCounter, TraceData, Traceable, Value};

/// Registers values directly, the way the scope builder does during elaboration.
#[derive(Default)]
struct Harness {
    identifiers: IdentifierGenerator,
    registry: Registry,
}

impl Harness {
    fn bind<T: TraceData>(&mut self, value: &mut Value<T>, name: &str) {
        let identifier = self.identifiers.allocate().unwrap();
        let descriptor = VarDescriptor {
            name: name.to_owned(),
            path: format!("root.{name}"),
            width: value.width(),
            kind: value.kind(),
            identifier: identifier.clone(),
        };
        let key = self.registry.insert(descriptor, value.renderer());
        value.attach(Binding { key, identifier });
    }

    fn start(self, config: Config) -> (Tracer, String) {
        let mut tracer = Tracer::new(self.registry, config);
        let mut out = Vec::new();
        tracer.start(&mut out).unwrap();
        (tracer, String::from_utf8(out).unwrap())
    }
}

fn advance(tracer: &mut Tracer, update: TimeUpdate) -> String {
    let mut out = Vec::new();
    tracer.advance(&mut out, update).unwrap();
    String::from_utf8(out).unwrap()
}

fn buffered<T: TraceData>(width: u32, depth: usize, counter: &SequenceCounter) -> Value<T> {
    Value::builder()
        .width(width)
        .depth(depth)
        .sequence(counter)
        .build()
        .unwrap()
}

#[test_log::test]
fn test_start_dumps_power_up_state() {
    let mut harness = Harness::default();
    let mut flag = Value::<bool>::new();
    let mut level = Value::with_initial(0.5f64);
    harness.bind(&mut flag, "flag");
    harness.bind(&mut level, "level");

    let (tracer, out) = harness.start(Config::default());
    assert_eq!(out, "#0\nx!\nr0.5 \"\n");
    assert_eq!(tracer.tracepoint(), 0);
    assert_eq!(tracer.identifier_of("root.level").unwrap().as_str(), "\"");
    assert!(tracer.identifier_of("root.missing").is_none());
}

#[test_log::test]
fn test_single_value_change_then_advance() {
    let mut harness = Harness::default();
    let mut flag = Value::<bool>::new();
    harness.bind(&mut flag, "flag");
    let (mut tracer, _) = harness.start(Config::default());

    flag.set(true);
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(1)));
    assert_eq!(out, "1!\n#1\n");

    // Nothing changed, only the marker is written.
    let out = advance(&mut tracer, TimeUpdate::Relative(Duration::nanoseconds(4)));
    assert_eq!(out, "#5\n");
    assert_eq!(tracer.timestamp(), 5);
}

#[test_log::test]
fn test_buffered_merge_order() {
    let counter = SequenceCounter::new(42);
    let mut harness = Harness::default();
    let mut var_1 = buffered::<i32>(9, 10, &counter);
    let mut var_2 = buffered::<i32>(11, 12, &counter);
    harness.bind(&mut var_1, "ka");
    harness.bind(&mut var_2, "ki");
    let (mut tracer, out) = harness.start(Config::default());
    assert_eq!(out, "#0\n");

    var_1.set(0x11);
    counter.increment();
    var_1.set(0x12);
    counter.increment();
    var_2.set(0x21);
    counter.increment();
    var_2.set(0x22);
    counter.increment();
    var_1.set(0x13);
    counter.increment();
    var_1.set(0x14);
    counter.increment();
    var_2.set(0x23);

    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(10)));
    assert_eq!(
        out,
        "b010001 !\n#1\nb010010 !\n#2\nb0100001 \"\n#3\nb0100010 \"\n#4\nb010011 !\n#5\nb010100 !\n#6\nb0100011 \"\n#10\n"
    );
    assert_eq!(var_1.pending(), 0);
    assert_eq!(var_2.pending(), 0);
}

#[test_log::test]
fn test_shared_sequence_shares_marker() {
    let counter = SequenceCounter::new(0);
    let mut harness = Harness::default();
    let mut a = buffered::<u8>(8, 4, &counter);
    let mut b = buffered::<u8>(8, 4, &counter);
    let mut flag = Value::<bool>::with_initial(false);
    harness.bind(&mut a, "a");
    harness.bind(&mut b, "b");
    harness.bind(&mut flag, "flag");
    let (mut tracer, _) = harness.start(Config::default());

    tracer.advance_to(&mut Vec::new(), Duration::nanoseconds(100)).unwrap();

    b.set(1);
    a.set(1);
    flag.set(true);
    counter.increment();
    a.set(2);
    b.set(2);

    let out = advance(&mut tracer, TimeUpdate::Relative(Duration::nanoseconds(50)));
    // Registration order breaks ties, single-sample values are written before the merge.
    assert_eq!(out, "1#\nb01 !\nb01 \"\n#101\nb010 !\nb010 \"\n#150\n");
}

#[test_log::test]
fn test_backward_time_is_clamped() {
    let mut harness = Harness::default();
    let mut count = Value::<u8>::new();
    harness.bind(&mut count, "count");
    let (mut tracer, _) = harness.start(Config::default());

    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(20)));
    assert_eq!(out, "#20\n");

    count.set(3);
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(5)));
    assert_eq!(out, "b011 !\n");
    assert_eq!(tracer.tracepoint(), 20);
    assert_eq!(tracer.timestamp(), 20);

    let out = advance(&mut tracer, TimeUpdate::Relative(Duration::nanoseconds(-7)));
    assert_eq!(out, "");
    assert_eq!(tracer.timestamp(), 20);
}

#[test_log::test]
fn test_merge_overrun_pushes_target() {
    let counter = SequenceCounter::new(0);
    let mut harness = Harness::default();
    let mut value = buffered::<u8>(8, 8, &counter);
    harness.bind(&mut value, "value");
    let (mut tracer, _) = harness.start(Config::default());

    for i in 1..=4 {
        value.set(i);
        counter.increment();
    }
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(2)));
    assert_eq!(out, "b01 !\n#1\nb010 !\n#2\nb011 !\n#3\nb0100 !\n");
    assert_eq!(tracer.tracepoint(), 3);
    assert_eq!(tracer.timestamp(), 3);
}

#[test_log::test]
fn test_dropped_value_is_detached() {
    let mut harness = Harness::default();
    let mut kept = Value::<bool>::new();
    let mut dropped = Value::<bool>::new();
    harness.bind(&mut kept, "kept");
    harness.bind(&mut dropped, "dropped");
    let (mut tracer, _) = harness.start(Config::default());

    dropped.set(true);
    drop(dropped);
    kept.set(false);

    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(1)));
    assert_eq!(out, "0!\n#1\n");
    assert_eq!(tracer.registry().len(), 2);
}

#[test_log::test]
fn test_timescale_conversion() {
    let mut harness = Harness::default();
    let mut flag = Value::<bool>::with_initial(true);
    harness.bind(&mut flag, "flag");
    let config = Config::default().with_timescale(Timescale::Microseconds);
    let (mut tracer, _) = harness.start(config);

    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::milliseconds(3)));
    assert_eq!(out, "#3000\n");
    let out = advance(&mut tracer, TimeUpdate::Relative(Duration::nanoseconds(999)));
    assert_eq!(out, "");
}

#[test_log::test]
fn test_finalize_trace() {
    let counter = SequenceCounter::new(0);
    let mut harness = Harness::default();
    let mut value = buffered::<u16>(16, 4, &counter);
    harness.bind(&mut value, "value");
    let (mut tracer, _) = harness.start(Config::default());

    value.set(0x8000);
    let mut out = Vec::new();
    let end = tracer.finalize_trace(&mut out).unwrap();
    assert_eq!(end, 1001);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "b1000000000000000 !\n#1\n#1001\n"
    );
}

#[test_log::test]
fn test_finalize_trace_coarse_timescales() {
    for (timescale, start, expected, end) in [
        (Timescale::Milliseconds, "#5000\n", "1!\n#5001\n#6001\n", 6001),
        (Timescale::Seconds, "#5\n", "1!\n#6\n#1006\n", 1006),
    ] {
        let mut harness = Harness::default();
        let mut flag = Value::<bool>::new();
        harness.bind(&mut flag, "flag");
        let (mut tracer, _) = harness.start(Config::default().with_timescale(timescale));

        let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::seconds(5)));
        assert_eq!(out, start, "{timescale}");

        flag.set(true);
        let mut out = Vec::new();
        let last = tracer.tracepoint();
        assert_eq!(tracer.finalize_trace(&mut out).unwrap(), end, "{timescale}");
        assert!(tracer.tracepoint() > last);
        assert_eq!(String::from_utf8(out).unwrap(), expected, "{timescale}");
    }
}

#[test_log::test]
fn test_buffered_repeat_after_drain_is_written() {
    let counter = SequenceCounter::new(0);
    let mut harness = Harness::default();
    let mut value = buffered::<u8>(8, 4, &counter);
    harness.bind(&mut value, "value");
    let (mut tracer, _) = harness.start(Config::default());

    value.set(5);
    value.set(5);
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(10)));
    assert_eq!(out, "b0101 !\n#10\n");

    value.set(5);
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(20)));
    assert_eq!(out, "b0101 !\n#20\n");
}

#[test_log::test]
fn test_narrow_integer_is_a_vector() {
    let mut harness = Harness::default();
    let mut bit = Value::<u8>::builder().width(1).build().unwrap();
    harness.bind(&mut bit, "bit");
    let (mut tracer, out) = harness.start(Config::default());
    assert_eq!(out, "#0\nbx !\n");

    bit.set(1);
    let out = advance(&mut tracer, TimeUpdate::Absolute(Duration::nanoseconds(1)));
    assert_eq!(out, "b1 !\n#1\n");
}

#[test_log::test]
fn test_debug_comments() {
    let mut harness = Harness::default();
    let mut flag = Value::<bool>::new();
    harness.bind(&mut flag, "flag");
    let (mut tracer, out) = harness.start(Config::default().with_debug_comments(true));
    assert_eq!(
        out,
        "#0\n$comment LOG TIME start $end\n$comment first pass $end\nx!\n"
    );

    let out = advance(&mut tracer, TimeUpdate::Relative(Duration::nanoseconds(2)));
    assert_eq!(
        out,
        "$comment delta 2ns $end\n$comment first pass $end\n#2\n$comment LOG TIME advance $end\n"
    );
}
