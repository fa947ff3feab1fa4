//! Form wizard: the five-step applicant form as a state machine.
//!
//! Moving forward is guarded by the current step's required fields; moving
//! back never is. Values accumulate in one [`SubmissionDraft`] across all
//! steps and are sent together from the last step.

pub mod client;
pub mod draft;
pub mod step;

pub use client::{RelayClient, RelayReply};
pub use draft::{Attachment, FieldValue, SubmissionDraft};
pub use step::Step;

use std::collections::BTreeMap;

use crate::error::{SubmitError, WizardError};
use crate::form::Field;

/// Result of [`Wizard::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved forward to this step.
    Moved(Step),
    /// Required fields missing; see [`Wizard::errors`].
    Blocked,
    /// The final step is complete; call [`Wizard::submit`].
    ReadyToSubmit,
}

/// Multi-step applicant form.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    draft: SubmissionDraft,
    step: Step,
    errors: BTreeMap<Field, String>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// 1-based step number.
    pub fn current_step(&self) -> u8 {
        self.step.number()
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    /// Messages from the most recent validation, keyed by field.
    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    /// Set a field shown on the current step. Other steps' fields are read-only here.
    pub fn set_field(&mut self, field: Field, value: FieldValue) -> Result<(), WizardError> {
        if !self.step.required_fields().contains(&field) {
            return Err(WizardError::NotOnStep {
                field,
                current: self.current_step(),
            });
        }
        self.draft.set(field, value)
    }

    pub fn set_text(&mut self, field: Field, value: impl Into<String>) -> Result<(), WizardError> {
        self.set_field(field, FieldValue::Text(value.into()))
    }

    pub fn set_file(
        &mut self,
        field: Field,
        attachment: Option<Attachment>,
    ) -> Result<(), WizardError> {
        self.set_field(field, FieldValue::File(attachment))
    }

    /// Recompute `errors` for the current step. True when it is complete.
    pub fn validate_step(&mut self) -> bool {
        self.errors = self
            .step
            .required_fields()
            .iter()
            .filter_map(|field| self.draft.field_error(*field).map(|msg| (*field, msg)))
            .collect();
        self.errors.is_empty()
    }

    pub fn advance(&mut self) -> Advance {
        if !self.validate_step() {
            return Advance::Blocked;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Advance::Moved(next)
            }
            None => Advance::ReadyToSubmit,
        }
    }

    /// Go back one step without validating. False on the first step.
    pub fn retreat(&mut self) -> bool {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                true
            }
            None => false,
        }
    }

    /// Validate the final step and send the whole draft in one request.
    ///
    /// On success the wizard is reset to an empty draft on step 1. On any
    /// failure the draft is kept so the applicant can retry.
    pub async fn submit(&mut self, client: &RelayClient) -> Result<String, SubmitError> {
        if !self.step.is_final() {
            return Err(WizardError::NotAtFinalStep {
                current: self.current_step(),
            }
            .into());
        }
        if !self.validate_step() {
            return Err(WizardError::Incomplete(self.errors.len()).into());
        }

        match client.submit(&self.draft).await {
            Ok(message) => {
                tracing::info!("Submission accepted");
                self.reset();
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed; draft kept");
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str) -> Option<Attachment> {
        Some(Attachment::new(name, b"content".to_vec()))
    }

    fn fill_personal(w: &mut Wizard) {
        w.set_text(Field::LastName, "Doe").unwrap();
        w.set_text(Field::FirstName, "Jane").unwrap();
        w.set_text(Field::MothersMaidenName, "Smith").unwrap();
        w.set_text(Field::Address1, "1 Main St").unwrap();
    }

    fn fill_contact(w: &mut Wizard) {
        w.set_text(Field::Email, "jane@example.com").unwrap();
        w.set_text(Field::PositionApplied, "Analyst").unwrap();
        w.set_text(Field::Ssn, "123-45-6789").unwrap();
    }

    #[test]
    fn starts_on_step_one_with_no_errors() {
        let w = Wizard::new();
        assert_eq!(w.current_step(), 1);
        assert!(w.errors().is_empty());
        assert!(w.draft().is_blank());
    }

    #[test]
    fn blocked_advance_reports_exactly_the_missing_fields() {
        let mut w = Wizard::new();
        w.set_text(Field::LastName, "Doe").unwrap();
        w.set_text(Field::Address1, "1 Main St").unwrap();

        assert_eq!(w.advance(), Advance::Blocked);
        assert_eq!(w.current_step(), 1);
        let missing: Vec<Field> = w.errors().keys().copied().collect();
        assert_eq!(missing, vec![Field::FirstName, Field::MothersMaidenName]);
        assert_eq!(w.errors()[&Field::FirstName], "First Name is required");
    }

    #[test]
    fn invalid_email_blocks_step_two() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        assert_eq!(w.advance(), Advance::Moved(Step::Contact));

        fill_contact(&mut w);
        w.set_text(Field::Email, "not-an-email").unwrap();

        assert_eq!(w.advance(), Advance::Blocked);
        assert_eq!(w.current_step(), 2);
        assert_eq!(w.errors().len(), 1);
        assert_eq!(w.errors()[&Field::Email], "Email is invalid");
    }

    #[test]
    fn successful_advance_clears_errors() {
        let mut w = Wizard::new();
        assert_eq!(w.advance(), Advance::Blocked);
        assert_eq!(w.errors().len(), 4);

        fill_personal(&mut w);
        assert_eq!(w.advance(), Advance::Moved(Step::Contact));
        assert!(w.errors().is_empty());
    }

    #[test]
    fn file_fields_gate_steps_three_and_four() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        w.advance();
        fill_contact(&mut w);
        w.advance();
        w.set_text(Field::StartDate, "2026-11-02").unwrap();
        w.set_text(Field::Telephone, "555-0100").unwrap();
        w.set_file(Field::W2Form, attachment("w2.pdf")).unwrap();

        assert_eq!(w.advance(), Advance::Blocked);
        assert_eq!(
            w.errors().keys().copied().collect::<Vec<_>>(),
            vec![Field::IdCardFront]
        );

        w.set_file(Field::IdCardFront, attachment("front.jpg")).unwrap();
        assert_eq!(w.advance(), Advance::Moved(Step::Documents));

        w.set_file(Field::IdCardBack, attachment("back.jpg")).unwrap();
        assert_eq!(w.advance(), Advance::Blocked);
        assert!(w.errors().contains_key(&Field::UtilityBill));
    }

    #[test]
    fn retreat_never_validates() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        w.advance();
        assert_eq!(w.current_step(), 2);

        // Step 2 is empty; going back is still allowed and leaves errors untouched.
        assert!(w.retreat());
        assert_eq!(w.current_step(), 1);
        assert!(w.errors().is_empty());
        assert_eq!(w.draft().text(Field::LastName), "Doe");

        assert!(!w.retreat());
        assert_eq!(w.current_step(), 1);
    }

    #[test]
    fn final_step_advance_signals_submit_without_moving() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        w.advance();
        fill_contact(&mut w);
        w.advance();
        w.set_text(Field::StartDate, "2026-11-02").unwrap();
        w.set_text(Field::Telephone, "555-0100").unwrap();
        w.set_file(Field::W2Form, attachment("w2.pdf")).unwrap();
        w.set_file(Field::IdCardFront, attachment("front.jpg")).unwrap();
        w.advance();
        w.set_file(Field::IdCardBack, attachment("back.jpg")).unwrap();
        w.set_file(Field::UtilityBill, attachment("bill.pdf")).unwrap();
        assert_eq!(w.advance(), Advance::Moved(Step::Banking));

        assert_eq!(w.advance(), Advance::Blocked);
        w.set_text(Field::Bank, "First Bank").unwrap();
        w.set_text(Field::AccountNumber, "000123").unwrap();
        w.set_text(Field::RoutingNumber, "110000000").unwrap();
        assert_eq!(w.advance(), Advance::ReadyToSubmit);
        assert_eq!(w.current_step(), 5);

        // Earlier steps stay as validated.
        assert!(matches!(
            w.set_text(Field::LastName, ""),
            Err(WizardError::NotOnStep { current: 5, .. })
        ));
        assert!(matches!(
            w.set_file(Field::W2Form, None),
            Err(WizardError::NotOnStep { current: 5, .. })
        ));
        assert_eq!(w.draft().text(Field::LastName), "Doe");
        assert!(w.draft().file(Field::W2Form).is_some());
        assert_eq!(w.advance(), Advance::ReadyToSubmit);
    }

    #[test]
    fn earlier_fields_cannot_be_edited_from_later_steps() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        w.advance();
        fill_contact(&mut w);
        w.advance();

        assert_eq!(
            w.set_text(Field::LastName, ""),
            Err(WizardError::NotOnStep {
                field: Field::LastName,
                current: 3
            })
        );
        assert_eq!(w.draft().text(Field::LastName), "Doe");

        // Fields of the next step are not editable yet either.
        assert!(matches!(
            w.set_file(Field::UtilityBill, attachment("bill.pdf")),
            Err(WizardError::NotOnStep { current: 3, .. })
        ));
        assert!(w.draft().file(Field::UtilityBill).is_none());
    }

    #[test]
    fn going_back_makes_a_step_editable_again() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        w.advance();

        assert!(w.set_text(Field::FirstName, "Janet").is_err());
        w.retreat();
        w.set_text(Field::FirstName, "Janet").unwrap();
        assert_eq!(w.draft().text(Field::FirstName), "Janet");
    }

    #[tokio::test]
    async fn submit_is_refused_before_the_final_step() {
        let mut w = Wizard::new();
        fill_personal(&mut w);
        let client = RelayClient::new("http://127.0.0.1:9");

        let err = w.submit(&client).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Wizard(WizardError::NotAtFinalStep { current: 1 })
        ));
        assert_eq!(w.draft().text(Field::LastName), "Doe");
    }
}
