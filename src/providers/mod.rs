pub mod hs;

pub use hs::HsProvider;
