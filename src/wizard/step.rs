//! Wizard steps: which fields each page requires.

use serde::{Deserialize, Serialize};

use crate::form::Field;

/// The five pages of the applicant form.
///
/// Progresses linearly: Personal → Contact → Employment → Documents → Banking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Personal,
    Contact,
    Employment,
    Documents,
    Banking,
}

/// Required fields per step, indexed by `number() - 1`.
const REQUIRED: [&[Field]; 5] = [
    &[
        Field::LastName,
        Field::FirstName,
        Field::MothersMaidenName,
        Field::Address1,
    ],
    &[Field::Email, Field::PositionApplied, Field::Ssn],
    &[
        Field::StartDate,
        Field::Telephone,
        Field::W2Form,
        Field::IdCardFront,
    ],
    &[Field::IdCardBack, Field::UtilityBill],
    &[Field::Bank, Field::AccountNumber, Field::RoutingNumber],
];

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Personal,
        Step::Contact,
        Step::Employment,
        Step::Documents,
        Step::Banking,
    ];

    /// 1-based position.
    pub fn number(self) -> u8 {
        match self {
            Self::Personal => 1,
            Self::Contact => 2,
            Self::Employment => 3,
            Self::Documents => 4,
            Self::Banking => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Step> {
        Self::ALL.into_iter().find(|s| s.number() == number)
    }

    pub fn required_fields(self) -> &'static [Field] {
        REQUIRED[usize::from(self.number() - 1)]
    }

    pub fn next(self) -> Option<Step> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Step> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    /// Submission happens from here.
    pub fn is_final(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Personal => "personal",
            Self::Contact => "contact",
            Self::Employment => "employment",
            Self::Documents => "documents",
            Self::Banking => "banking",
        };
        write!(f, "{s}")
    }
}
