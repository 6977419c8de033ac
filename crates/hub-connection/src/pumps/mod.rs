//! Background tasks that run for the lifetime of one WebSocket link.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;
