//! Device lifecycle orchestration

pub mod coordinator;
pub mod group;

pub use self::coordinator::DeviceCoordinator;
