//! Domain types for EventLab

pub mod bar;
pub mod event;

pub use bar::{Bar, BarField};
pub use event::{
    Direction, Event, EventKind, FillEvent, MarketEvent, OrderEvent, OrderType, SignalEvent,
    SignalType,
};

/// Symbol type alias
pub type Symbol = String;
