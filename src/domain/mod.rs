//! Domain layer: the batch variable bag, transaction rows, phase policies and
//! the ports through which the application reaches external collaborators.

pub mod batch;
pub mod callback;
pub mod phase;
pub mod ports;
pub mod threshold;
pub mod transaction;
