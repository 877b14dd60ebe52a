// markdown-pdf-converter/src/pubsub/mod.rs

mod handler;

pub use handler::{Delivery, EventDispatcher};
