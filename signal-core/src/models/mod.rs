pub mod booking;
pub mod chat;
pub mod log;
pub mod order;
pub mod vitals;

pub use booking::{BookingCreate, BookingRecord};
pub use chat::{ChatRequest, ChatResponse};
pub use log::{BehavioralLogEntry, VitalsSnapshot};
pub use order::OrderCreate;
pub use vitals::ChatVitals;
