//! Debug tracing for bus traffic
//!
//! The driver reports every register select, read and write to a [`Trace`] sink
//! while debugging is enabled. The default sink is `()`, which discards everything.

/// A single event reported to a [`Trace`] sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TraceEvent<'a> {
    /// Note about the operation in progress
    Message(&'static str),
    /// Command byte sent to select a register
    Command(u8),
    /// Bytes returned by a read
    Read(&'a [u8]),
    /// Bytes about to be written
    Write(&'a [u8]),
}

/// Receiver for driver diagnostics
pub trait Trace {
    /// Handle one event
    fn trace(&mut self, event: TraceEvent<'_>);
}

impl Trace for () {
    #[inline]
    fn trace(&mut self, _event: TraceEvent<'_>) {}
}

impl<T: Trace + ?Sized> Trace for &mut T {
    fn trace(&mut self, event: TraceEvent<'_>) {
        (**self).trace(event)
    }
}
