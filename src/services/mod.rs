pub mod host;
pub mod launcher;
pub mod port_allocator;
pub mod store;
pub mod toolchain;

pub use launcher::Launcher;
pub use store::ConfigStore;
