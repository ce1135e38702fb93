//! # Event Bus Module
//!
//! Publish/subscribe channel between the console components. The motion
//! controller, the script interpreter and the serial link publish typed
//! events; front ends subscribe with a filter or poll a broadcast receiver.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use torchkit_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter, MotionEvent};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Motion]),
//!     |event| {
//!         if let AppEvent::Motion(MotionEvent::SequenceFinished) = event {
//!             println!("Sequence finished");
//!         }
//!     },
//! );
//!
//! bus.publish(AppEvent::Motion(MotionEvent::SequenceFinished)).ok();
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
