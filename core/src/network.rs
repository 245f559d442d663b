pub mod channel;
pub mod tcp;
pub mod transport;
