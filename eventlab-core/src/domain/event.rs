//! Event model: the closed set of messages flowing through the event queue.
//!
//! One bar step produces exactly one `Market` event. Everything downstream of
//! it (signals, orders, fills) is a consequence of that event and is resolved
//! before the next bar is revealed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional intent carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Long,
    Exit,
}

/// Side of an order or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            Direction::Buy => 1,
            Direction::Sell => -1,
        }
    }
}

/// How an order is to be priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Fill at the current bar's close.
    Market,
    /// Fill at the limit price or better, or not at all.
    Limit { price: f64 },
}

/// "A new synchronized bar is available." Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketEvent;

/// Strategy output: a directional view on one symbol at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub signal_type: SignalType,
    /// Conviction in [0, 1].
    pub strength: f64,
}

impl SignalEvent {
    /// Build a signal, clamping `strength` into [0, 1] (NaN becomes 0).
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        signal_type: SignalType,
        strength: f64,
    ) -> Self {
        let strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        Self {
            symbol: symbol.into(),
            timestamp,
            signal_type,
            strength,
        }
    }
}

/// Portfolio output: a sized request sent to the execution handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: String,
    pub order_type: OrderType,
    pub quantity: u64,
    pub direction: Direction,
}

impl OrderEvent {
    pub fn market(symbol: impl Into<String>, quantity: u64, direction: Direction) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            quantity,
            direction,
        }
    }

    pub fn limit(
        symbol: impl Into<String>,
        quantity: u64,
        direction: Direction,
        price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Limit { price },
            quantity,
            direction,
        }
    }
}

/// Execution output: the realized result of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub venue: String,
    pub quantity: u64,
    pub direction: Direction,
    /// Unsigned notional: fill price × quantity.
    pub fill_cost: f64,
    pub commission: f64,
}

impl FillEvent {
    /// Per-share fill price.
    pub fn price(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        self.fill_cost / self.quantity as f64
    }

    /// Notional signed by direction: positive for buys (cash out), negative for sells.
    pub fn signed_cost(&self) -> f64 {
        self.direction.sign() as f64 * self.fill_cost
    }

    /// Position change in shares.
    pub fn signed_quantity(&self) -> i64 {
        self.direction.sign() * self.quantity as i64
    }
}

/// The tagged union dispatched by the backtest loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market(_) => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(e: MarketEvent) -> Self {
        Event::Market(e)
    }
}

impl From<SignalEvent> for Event {
    fn from(e: SignalEvent) -> Self {
        Event::Signal(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<FillEvent> for Event {
    fn from(e: FillEvent) -> Self {
        Event::Fill(e)
    }
}

/// Payload-free tag of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Market => "MARKET",
            EventKind::Signal => "SIGNAL",
            EventKind::Order => "ORDER",
            EventKind::Fill => "FILL",
        };
        f.write_str(s)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalType::Long => "LONG",
            SignalType::Exit => "EXIT",
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        })
    }
}
