mod file;
#[cfg(test)]
mod memory;

pub use file::FileStorage;
#[cfg(test)]
pub use memory::MemoryStorage;
