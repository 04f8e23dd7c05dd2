#[cfg(not(target_pointer_width = "64"))]
compile_error!("vmarena supports only 64-bit targets.");

pub(crate) mod sync;
pub(crate) mod term;

// public module: contains implementation details (hidden via pub(crate))
// and TEST_MUTEX (public for tests)
pub mod memory;

pub mod random;

// arena core
pub use memory::arena::{Arena, ArenaConfig, ArenaError, ArenaMark};
pub use memory::session::ArenaSession;

// tracked general-heap allocation
pub use memory::array::Array;
pub use memory::ledger::{LeakRecord, Ledger};

// arena-backed text
pub use memory::strbuf::StringBuilder;

// process-wide diagnostic gauges
pub use memory::stats::{snapshot as memory_stats, MemoryStats};

// errors
pub use memory::vm::VmError;

pub use random::Xorshift64;

#[cfg(test)]
crate::sync::static_rwlock! {
    pub static TEST_MUTEX: crate::sync::RwLock<()> = crate::sync::RwLock::new(());
}
