//! Human-readable rendering of a [`ResolutionResult`].
//!
//! ```text
//! Path  : /srv/share/report.docx
//! Rights: Read
//!   [ ] Guests
//!   [x] Users                                    +Write, Read
//!   [x] Contractors                              -Write
//! ```
//!
//! Irrelevant rules come first, then applicable allows, then applicable denies.
//! Every line ends with a newline.

use std::fmt;

use crate::entry::AccessRule;
use crate::resolver::ResolutionResult;

/// Width the identity column is padded to for selected rules.
const IDENTITY_WIDTH: usize = 40;

fn write_selected(f: &mut fmt::Formatter<'_>, rule: &AccessRule) -> fmt::Result {
    writeln!(
        f,
        "  [x] {:<width$} {}{}",
        rule.identity,
        rule.kind.sign(),
        rule.rights,
        width = IDENTITY_WIDTH
    )
}

impl fmt::Display for ResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path  : {}", self.target().display())?;

        if let Some(err) = self.failure() {
            return writeln!(f, "{err}");
        }

        writeln!(f, "Rights: {}", self.rights())?;
        for rule in self.irrelevant_rules() {
            writeln!(f, "  [ ] {}", rule.identity)?;
        }
        for rule in self.applicable_allow_rules() {
            write_selected(f, rule)?;
        }
        for rule in self.applicable_deny_rules() {
            write_selected(f, rule)?;
        }
        Ok(())
    }
}
