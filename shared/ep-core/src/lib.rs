//! Effective permission resolution.
//!
//! Given a flattened list of access rules for a file-system object and a
//! principal able to answer membership questions, computes the rights the
//! principal effectively holds:
//!
//! 1. [`classify`] splits rules into applicable and irrelevant ones
//! 2. [`aggregate`] unions applicable allows and subtracts applicable denies
//!
//! [`resolve`] runs both against a host [`DescriptorSource`] and captures any
//! failure in the returned [`ResolutionResult`].
//!
//! ```
//! use std::path::Path;
//! use ep_core::{resolve, AccessRule, FileSystemRights, RoleSet, StaticSource};
//!
//! let source = StaticSource::new().with_rules(
//!     "/share/plan.txt",
//!     vec![
//!         AccessRule::allow("Users", FileSystemRights::READ | FileSystemRights::WRITE),
//!         AccessRule::deny("Contractors", FileSystemRights::WRITE),
//!     ],
//! );
//! let alice = RoleSet::new("alice").with_role("Users").with_role("Contractors");
//!
//! let result = resolve(Path::new("/share/plan.txt"), &alice, &source);
//! assert_eq!(result.rights(), FileSystemRights::READ);
//! ```

pub mod aggregator;
pub mod classifier;
pub mod entry;
pub mod error;
pub mod principal;
pub mod report;
pub mod resolver;
pub mod rights;
pub mod sid;
pub mod source;

pub use aggregator::aggregate;
pub use classifier::{applies_to, classify, Classification};
pub use entry::{AccessControlType, AccessRule};
pub use error::{QueryError, ResolveError, RightsParseError};
pub use principal::{Principal, RoleSet};
pub use resolver::{resolve, ResolutionResult};
pub use rights::FileSystemRights;
pub use sid::{SecurityIdentifier, SidParseError};
pub use source::{DescriptorSource, StaticSource};
