//! Field catalogue shared by the wizard and the relay.
//!
//! Every form field has a wire name (the multipart part name), a label
//! used in error messages and the review notification, and a kind that
//! decides how emptiness is judged.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Whether a field carries text or a single uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    File,
}

/// Every field the applicant form collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    LastName,
    FirstName,
    MothersMaidenName,
    Address1,
    Email,
    PositionApplied,
    Ssn,
    StartDate,
    Telephone,
    W2Form,
    IdCardFront,
    IdCardBack,
    UtilityBill,
    Bank,
    AccountNumber,
    RoutingNumber,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 16] = [
        Field::LastName,
        Field::FirstName,
        Field::MothersMaidenName,
        Field::Address1,
        Field::Email,
        Field::PositionApplied,
        Field::Ssn,
        Field::StartDate,
        Field::Telephone,
        Field::W2Form,
        Field::IdCardFront,
        Field::IdCardBack,
        Field::UtilityBill,
        Field::Bank,
        Field::AccountNumber,
        Field::RoutingNumber,
    ];

    /// The four document uploads, in dispatch order.
    pub const FILES: [Field; 4] = [
        Field::W2Form,
        Field::IdCardFront,
        Field::IdCardBack,
        Field::UtilityBill,
    ];

    /// Multipart part name on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::LastName => "lastName",
            Self::FirstName => "firstName",
            Self::MothersMaidenName => "mothersMaidenName",
            Self::Address1 => "address1",
            Self::Email => "email",
            Self::PositionApplied => "positionApplied",
            Self::Ssn => "ssn",
            Self::StartDate => "startDate",
            Self::Telephone => "telephone",
            Self::W2Form => "w2Form",
            Self::IdCardFront => "idCardFront",
            Self::IdCardBack => "idCardBack",
            Self::UtilityBill => "utilityBill",
            Self::Bank => "bank",
            Self::AccountNumber => "accountNumber",
            Self::RoutingNumber => "routingNumber",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::LastName => "Last Name",
            Self::FirstName => "First Name",
            Self::MothersMaidenName => "Mother's Maiden Name",
            Self::Address1 => "Address Line 1",
            Self::Email => "Email",
            Self::PositionApplied => "Position Applied",
            Self::Ssn => "SSN",
            Self::StartDate => "Start Date",
            Self::Telephone => "Telephone",
            Self::W2Form => "W2 Form",
            Self::IdCardFront => "ID Card Front",
            Self::IdCardBack => "ID Card Back",
            Self::UtilityBill => "Utility Bill",
            Self::Bank => "Bank Name",
            Self::AccountNumber => "Account Number",
            Self::RoutingNumber => "Routing Number",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::W2Form | Self::IdCardFront | Self::IdCardBack | Self::UtilityBill => {
                FieldKind::File
            }
            _ => FieldKind::Text,
        }
    }

    pub fn is_file(self) -> bool {
        self.kind() == FieldKind::File
    }

    /// Look a field up by its wire name. Matching is exact.
    pub fn from_wire_name(name: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.wire_name() == name)
    }

    /// Message shown when a required field is empty.
    pub fn required_message(self) -> String {
        format!("{} is required", self.label())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Text fields the relay refuses to forward without.
pub const RELAY_REQUIRED: [Field; 4] = [
    Field::LastName,
    Field::FirstName,
    Field::Email,
    Field::PositionApplied,
];

/// Text fields listed in the review notification, in display order.
pub const NOTIFICATION_FIELDS: [Field; 12] = [
    Field::LastName,
    Field::FirstName,
    Field::MothersMaidenName,
    Field::Address1,
    Field::Email,
    Field::PositionApplied,
    Field::Ssn,
    Field::StartDate,
    Field::Telephone,
    Field::Bank,
    Field::AccountNumber,
    Field::RoutingNumber,
];

pub const EMAIL_INVALID_MESSAGE: &str = "Email is invalid";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Something, an @, something, a dot, something.
    Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles")
});

/// Loose address check: a local part, `@`, and a dotted domain.
pub fn is_plausible_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}
