//! Door button access control.
//!
//! Every door button (integrated or a separate panel) carries an
//! [`AccessLevel`]. A character's [`Clearance`] decides whether they may
//! press it. During a lockdown only security and officers may operate
//! anything; the captain is never refused.
//!
//! | Level | Who may press |
//! |-------|---------------|
//! | `Public` | Everyone |
//! | `CrewOnly` | Any crew member |
//! | `Department(d)` | Crew of department `d`, security, officers |
//! | `Officer` | Rank ≥ officer |
//! | `Captain` | Captain only |
//!
//! ```
//! use subcrew_logic::access::{AccessLevel, Clearance, Department};
//!
//! let mechanic = Clearance::crew(Department::Engineering, 1);
//! assert!(mechanic.can_operate(AccessLevel::Department(Department::Engineering), false).is_ok());
//! assert!(mechanic.can_operate(AccessLevel::Officer, false).is_err());
//! ```

use serde::{Deserialize, Serialize};

/// Minimum rank for officer-level buttons.
pub const OFFICER_RANK: u8 = 4;
/// Captain rank.
pub const CAPTAIN_RANK: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Command,
    Engineering,
    Medical,
    Security,
    Operations,
}

/// Who a button answers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    #[default]
    Public,
    CrewOnly,
    Department(Department),
    Officer,
    Captain,
}

/// What a character is cleared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clearance {
    /// Crew (as opposed to passengers, prisoners, intruders).
    pub is_crew: bool,
    pub department: Option<Department>,
    /// 0 (recruit) to [`CAPTAIN_RANK`].
    pub rank: u8,
}

impl Default for Clearance {
    fn default() -> Self {
        Self::outsider()
    }
}

/// Why a button refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    NotCrew,
    WrongDepartment,
    InsufficientRank,
    CaptainOnly,
    Lockdown,
}

/// A successful check, noting whether seniority overrode the normal rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub is_override: bool,
}

impl Clearance {
    pub fn crew(department: Department, rank: u8) -> Self {
        Self {
            is_crew: true,
            department: Some(department),
            rank,
        }
    }

    /// No crew rights at all.
    pub fn outsider() -> Self {
        Self {
            is_crew: false,
            department: None,
            rank: 0,
        }
    }

    pub fn is_security(&self) -> bool {
        self.is_crew && self.department == Some(Department::Security)
    }

    pub fn is_officer(&self) -> bool {
        self.is_crew && self.rank >= OFFICER_RANK
    }

    pub fn is_captain(&self) -> bool {
        self.is_crew && self.rank >= CAPTAIN_RANK
    }

    /// Check whether this character may press a button of the given level.
    pub fn can_operate(
        &self,
        level: AccessLevel,
        lockdown: bool,
    ) -> Result<AccessGrant, DenialReason> {
        if self.is_captain() {
            return Ok(AccessGrant {
                is_override: level != AccessLevel::Public || lockdown,
            });
        }

        if lockdown && !(self.is_security() || self.is_officer()) {
            return Err(DenialReason::Lockdown);
        }

        match level {
            AccessLevel::Public => Ok(AccessGrant { is_override: false }),
            AccessLevel::CrewOnly if self.is_crew => Ok(AccessGrant { is_override: false }),
            AccessLevel::CrewOnly => Err(DenialReason::NotCrew),
            AccessLevel::Department(_) if !self.is_crew => Err(DenialReason::NotCrew),
            AccessLevel::Department(dept) => {
                if self.department == Some(dept) {
                    Ok(AccessGrant { is_override: false })
                } else if self.is_officer() || self.is_security() {
                    Ok(AccessGrant { is_override: true })
                } else {
                    Err(DenialReason::WrongDepartment)
                }
            }
            AccessLevel::Officer if self.is_officer() => Ok(AccessGrant { is_override: false }),
            AccessLevel::Officer => Err(DenialReason::InsufficientRank),
            AccessLevel::Captain => Err(DenialReason::CaptainOnly),
        }
    }
}
