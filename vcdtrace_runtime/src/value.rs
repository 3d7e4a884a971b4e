use std::{
    cell::RefCell,
    io::{self, Write},
    rc::{Rc, Weak},
};

use vcdtrace_core::{Identifier, VarKind};

use crate::{
    wire::Encoding, DumpStatus, History, Renderable, RuntimeError, SampleState, SequenceCounter,
    TraceData, ValueKey,
};

/// Where an elaborated value lives in the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: ValueKey,
    pub identifier: Identifier,
}

#[derive(Debug)]
pub struct ValueCell<T: TraceData> {
    encoding: Encoding,
    width: u32,
    depth: usize,
    history: History<T>,
    binding: Option<Binding>,
}

/// A traced value of element type `T`.
///
/// Mutations record into the value's history; nothing is written until the owning
/// [`crate::Tracer`] flushes. Dropping the value detaches it from the trace.
#[derive(Debug)]
pub struct Value<T: TraceData> {
    cell: Rc<RefCell<ValueCell<T>>>,
}

impl<T: TraceData> Default for Value<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TraceData> Value<T> {
    /// An unbound single-sample value of natural width, starting unknown.
    pub fn new() -> Self {
        Self::from_parts(T::NATURAL_WIDTH, 1, History::single(SampleState::Unknown))
    }

    /// An unbound single-sample value of natural width, starting at `initial`.
    pub fn with_initial(initial: T) -> Self {
        Self::from_parts(
            T::NATURAL_WIDTH,
            1,
            History::single(SampleState::Known(initial)),
        )
    }

    pub fn builder() -> ValueBuilder<T> {
        ValueBuilder::default()
    }

    fn from_parts(width: u32, depth: usize, history: History<T>) -> Self {
        Self {
            cell: Rc::new(RefCell::new(ValueCell {
                encoding: Encoding::for_data::<T>(width),
                width,
                depth,
                history,
                binding: None,
            })),
        }
    }

    pub fn set(&mut self, value: T) {
        self.record(SampleState::Known(value));
    }

    /// Mark the value as unknown (`x`).
    pub fn set_unknown(&mut self) {
        self.record(SampleState::Unknown);
    }

    /// Mark the value as undriven (`z`).
    pub fn set_undriven(&mut self) {
        self.record(SampleState::Undriven);
    }

    fn record(&mut self, state: SampleState<T>) {
        self.cell.borrow_mut().history.record(state);
    }

    /// The most recently recorded state.
    pub fn current(&self) -> SampleState<T> {
        self.cell.borrow().history.current()
    }

    /// The most recently recorded value, if it is known.
    pub fn get(&self) -> Option<T> {
        self.current().known().copied()
    }

    pub fn depth(&self) -> usize {
        self.cell.borrow().depth
    }

    pub fn encoding(&self) -> Encoding {
        self.cell.borrow().encoding
    }

    /// Number of samples waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.cell.borrow().history.pending()
    }

    pub fn identifier(&self) -> Option<Identifier> {
        self.binding().map(|binding| binding.identifier)
    }
}

/// Type-erased view of a [`Value`] used during elaboration.
pub trait Traceable {
    fn kind(&self) -> VarKind;
    fn width(&self) -> u32;
    fn binding(&self) -> Option<Binding>;

    fn is_bound(&self) -> bool {
        self.binding().is_some()
    }

    /// A renderer that refers to this value without keeping it alive.
    fn renderer(&self) -> Box<dyn Renderable>;

    /// Record where the value was registered.
    fn attach(&mut self, binding: Binding);
}

impl<T: TraceData> Traceable for Value<T> {
    fn kind(&self) -> VarKind {
        T::KIND
    }

    fn width(&self) -> u32 {
        self.cell.borrow().width
    }

    fn binding(&self) -> Option<Binding> {
        self.cell.borrow().binding.clone()
    }

    fn renderer(&self) -> Box<dyn Renderable> {
        Box::new(CellRenderer {
            cell: Rc::downgrade(&self.cell),
        })
    }

    fn attach(&mut self, binding: Binding) {
        self.cell.borrow_mut().binding = Some(binding);
    }
}

/// Registry-side handle of a [`Value`].
#[derive(Debug)]
pub struct CellRenderer<T: TraceData> {
    cell: Weak<RefCell<ValueCell<T>>>,
}

impl<T: TraceData> Renderable for CellRenderer<T> {
    fn render(
        &mut self,
        out: &mut dyn Write,
        identifier: &Identifier,
        start: bool,
    ) -> io::Result<DumpStatus> {
        match self.cell.upgrade() {
            Some(cell) => {
                let mut cell = cell.borrow_mut();
                let encoding = cell.encoding;
                cell.history.render(out, encoding, identifier, start)
            }
            None => Ok(DumpStatus::END),
        }
    }

    fn is_dropped(&self) -> bool {
        self.cell.strong_count() == 0
    }
}

/// Builder for values with an explicit width, history depth or initial value.
#[derive(Debug)]
pub struct ValueBuilder<T: TraceData> {
    width: u32,
    depth: usize,
    counter: Option<SequenceCounter>,
    initial: Option<T>,
}

impl<T: TraceData> Default for ValueBuilder<T> {
    fn default() -> Self {
        Self {
            width: T::NATURAL_WIDTH,
            depth: 1,
            counter: None,
            initial: None,
        }
    }
}

impl<T: TraceData> ValueBuilder<T> {
    /// Number of bits written to the trace, at most the natural width of `T`.
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Number of changes buffered between flushes.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Counter that stamps buffered samples. Required for a depth above 1.
    pub fn sequence(mut self, counter: &SequenceCounter) -> Self {
        self.counter = Some(counter.clone());
        self
    }

    pub fn initial(mut self, value: T) -> Self {
        self.initial = Some(value);
        self
    }

    pub fn build(self) -> Result<Value<T>, RuntimeError> {
        if self.width == 0 || self.width > T::NATURAL_WIDTH {
            return Err(RuntimeError::InvalidWidth {
                width: self.width,
                natural: T::NATURAL_WIDTH,
            });
        }

        let history = match self.depth {
            0 => return Err(RuntimeError::ZeroDepth),
            1 => History::single(self.initial.map_or(SampleState::Unknown, SampleState::Known)),
            depth => {
                let counter = self
                    .counter
                    .ok_or(RuntimeError::MissingSequenceCounter { depth })?;
                History::buffered(counter, depth, self.initial)
            }
        };

        Ok(Value::from_parts(self.width, self.depth, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> Identifier {
        vcdtrace_core::IdentifierGenerator::new().allocate().unwrap()
    }

    fn render_all(renderer: &mut dyn Renderable, start: bool) -> String {
        let mut out = Vec::new();
        renderer.render(&mut out, &identifier(), start).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            Value::<u8>::builder().width(9).build(),
            Err(RuntimeError::InvalidWidth {
                width: 9,
                natural: 8
            })
        ));
        assert!(matches!(
            Value::<u32>::builder().width(0).build(),
            Err(RuntimeError::InvalidWidth { width: 0, .. })
        ));
        assert!(matches!(
            Value::<u32>::builder().depth(0).build(),
            Err(RuntimeError::ZeroDepth)
        ));
        assert!(matches!(
            Value::<u32>::builder().depth(4).build(),
            Err(RuntimeError::MissingSequenceCounter { depth: 4 })
        ));

        let counter = SequenceCounter::new(0);
        let value = Value::<u16>::builder()
            .width(11)
            .depth(12)
            .sequence(&counter)
            .build()
            .unwrap();
        assert_eq!(value.width(), 11);
        assert_eq!(value.depth(), 12);
        assert_eq!(value.encoding(), Encoding::Vector { width: 11 });
        assert_eq!(value.pending(), 0);
    }

    #[test]
    fn test_encoding_by_type() {
        assert_eq!(Value::<bool>::new().encoding(), Encoding::Scalar);
        assert_eq!(Value::<f32>::new().encoding(), Encoding::Real);
        assert_eq!(Value::<f64>::new().width(), 64);
        assert_eq!(Value::<i32>::new().kind(), VarKind::Wire);
        let narrow = Value::<u8>::builder().width(1).build().unwrap();
        assert_eq!(narrow.encoding(), Encoding::Vector { width: 1 });
    }

    #[test]
    fn test_initial_state() {
        let value = Value::<bool>::new();
        assert_eq!(value.current(), SampleState::Unknown);
        assert_eq!(value.get(), None);
        assert_eq!(render_all(&mut *value.renderer(), true), "x!\n");

        let value = Value::with_initial(0x155u16);
        assert_eq!(value.get(), Some(0x155));
        let mut renderer = value.renderer();
        assert_eq!(render_all(&mut *renderer, true), "b101010101 !\n");
        assert_eq!(render_all(&mut *renderer, true), "");
    }

    #[test]
    fn test_buffered_initial_value_is_staged() {
        let counter = SequenceCounter::new(5);
        let value = Value::<u8>::builder()
            .depth(3)
            .sequence(&counter)
            .initial(2)
            .build()
            .unwrap();
        assert_eq!(value.pending(), 1);
        let mut renderer = value.renderer();
        let mut out = Vec::new();
        let status = renderer.render(&mut out, &identifier(), true).unwrap();
        assert_eq!(status.next, Some(5));
    }

    #[test]
    fn test_set_and_states() {
        let mut value = Value::<u8>::builder().width(4).build().unwrap();
        let mut renderer = value.renderer();
        assert_eq!(render_all(&mut *renderer, true), "bx !\n");

        value.set(0b1010);
        assert_eq!(render_all(&mut *renderer, true), "b1010 !\n");
        value.set_undriven();
        assert_eq!(render_all(&mut *renderer, true), "bz !\n");
        value.set_undriven();
        assert_eq!(render_all(&mut *renderer, true), "");
        value.set_unknown();
        assert_eq!(value.current(), SampleState::Unknown);
        assert_eq!(render_all(&mut *renderer, true), "bx !\n");
    }

    #[test]
    fn test_real_values() {
        let mut value = Value::<f32>::new();
        let mut renderer = value.renderer();
        value.set(0.001);
        assert_eq!(render_all(&mut *renderer, true), "r0.001000000047497451 !\n");
        value.set(10000000000000000.0);
        assert_eq!(render_all(&mut *renderer, true), "r1.000000027256422e+16 !\n");
    }

    #[test]
    fn test_dropped_value_renders_nothing() {
        let mut value = Value::<bool>::new();
        let mut renderer = value.renderer();
        value.set(true);
        assert!(!renderer.is_dropped());
        drop(value);
        assert!(renderer.is_dropped());
        assert_eq!(render_all(&mut *renderer, true), "");
    }

    #[test]
    fn test_unbound_value_is_usable() {
        let mut value = Value::<u32>::new();
        assert!(!value.is_bound());
        assert_eq!(value.identifier(), None);
        value.set(7);
        value.set(8);
        assert_eq!(value.get(), Some(8));
    }
}
