//! Host bindings: where principals and access rules come from.

pub mod accounts;
#[cfg(unix)]
pub mod mode;
pub mod overlay;
pub mod principal;

pub use accounts::AccountDb;
#[cfg(unix)]
pub use mode::ModeDescriptorSource;
pub use overlay::OverlaySource;
pub use principal::UnixPrincipal;
