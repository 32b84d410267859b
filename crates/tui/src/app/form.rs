//! Form state shared by every editable screen.
//!
//! A [`Form`] owns the raw text of each field plus the bookkeeping around
//! it: per-field errors, which fields were visited, and whether a submit is
//! in flight. Screens decide what to do with the values; the form only
//! decides whether they may be submitted.

use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
};

use crate::app::validate::{Rule, first_error};

pub type Values = BTreeMap<&'static str, String>;
pub type Errors = BTreeMap<&'static str, String>;

/// Whole-form check run on submit after the per-field rules.
pub type FormCheck = fn(&Values) -> Errors;

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome<T, E> {
    /// Validation failed; the callback was not called.
    Invalid,
    /// A previous submit is still running.
    Busy,
    Submitted(T),
    Failed(E),
}

/// Whether a submit may go ahead.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitStart {
    Ready(Values),
    Invalid,
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct Form {
    initial: Values,
    values: Values,
    errors: Errors,
    touched: BTreeSet<&'static str>,
    rules: BTreeMap<&'static str, Vec<Rule>>,
    check: Option<FormCheck>,
    submitting: bool,
}

impl Form {
    pub fn new<I>(initial: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, String)>,
    {
        let initial: Values = initial.into_iter().collect();
        Self {
            values: initial.clone(),
            initial,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, field: &'static str, rules: &[Rule]) -> Self {
        self.set_rules(field, rules);
        self
    }

    pub fn with_check(mut self, check: FormCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn set_rules(&mut self, field: &'static str, rules: &[Rule]) {
        self.rules.insert(field, rules.to_vec());
    }

    pub fn rules(&self, field: &str) -> &[Rule] {
        self.rules.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replaces both the initial and the current values, e.g. after the
    /// record being edited has loaded.
    pub fn set_initial(&mut self, values: Values) {
        self.initial = values.clone();
        self.values = values;
        self.errors.clear();
        self.touched.clear();
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Stores `value` and drops any error recorded for the field; it is
    /// checked again on [`Form::touch`] or submit.
    pub fn set_field(&mut self, field: &'static str, value: impl Into<String>) {
        self.values.insert(field, value.into());
        self.errors.remove(field);
    }

    pub fn push_char(&mut self, field: &'static str, ch: char) {
        let mut value = self.value(field).to_string();
        value.push(ch);
        self.set_field(field, value);
    }

    pub fn pop_char(&mut self, field: &'static str) {
        let mut value = self.value(field).to_string();
        value.pop();
        self.set_field(field, value);
    }

    /// Marks the field visited and validates it.
    pub fn touch(&mut self, field: &'static str) {
        self.touched.insert(field);
        if let Some(message) = first_error(self.rules(field), self.value(field)) {
            self.errors.insert(field, message);
        }
    }

    /// Runs every field rule and then the whole-form check.
    pub fn validate(&self) -> Errors {
        let mut errors = Errors::new();
        for (field, rules) in &self.rules {
            if let Some(message) = first_error(rules, self.value(field)) {
                errors.insert(*field, message);
            }
        }
        if let Some(check) = self.check {
            for (field, message) in check(&self.values) {
                errors.entry(field).or_insert(message);
            }
        }
        errors
    }

    /// Validates and, when the values pass, marks the form as submitting
    /// until [`Form::finish_submit`]. Used when the request runs elsewhere
    /// and reports back later.
    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.submitting {
            return SubmitStart::Busy;
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.touched.extend(errors.keys().copied());
            self.errors = errors;
            return SubmitStart::Invalid;
        }

        self.submitting = true;
        SubmitStart::Ready(self.values.clone())
    }

    /// Ends a submit started with [`Form::begin_submit`].
    ///
    /// On success the form goes back to its initial values. On failure the
    /// values stay as typed so the user can correct and resubmit.
    pub fn finish_submit<T, E>(&mut self, result: Result<T, E>) -> SubmitOutcome<T, E> {
        self.submitting = false;
        match result {
            Ok(value) => {
                self.reset();
                SubmitOutcome::Submitted(value)
            }
            Err(err) => SubmitOutcome::Failed(err),
        }
    }

    /// Forgets a submit whose result will never arrive; values stay as typed.
    pub fn abandon_submit(&mut self) {
        self.submitting = false;
    }

    /// Validates, then hands a copy of the values to `on_submit`.
    pub async fn submit<F, Fut, T, E>(&mut self, on_submit: F) -> SubmitOutcome<T, E>
    where
        F: FnOnce(Values) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let values = match self.begin_submit() {
            SubmitStart::Ready(values) => values,
            SubmitStart::Invalid => return SubmitOutcome::Invalid,
            SubmitStart::Busy => return SubmitOutcome::Busy,
        };
        let result = on_submit(values).await;
        self.finish_submit(result)
    }

    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn amount_form() -> Form {
        Form::new([("amount", String::new()), ("comment", String::new())])
            .with_rules("amount", &[Rule::Required, Rule::Numeric])
    }

    #[test]
    fn set_field_clears_error_optimistically() {
        let mut form = amount_form();
        form.touch("amount");
        assert_eq!(form.error("amount"), Some("required"));

        form.set_field("amount", "abc");
        assert_eq!(form.error("amount"), None);

        form.touch("amount");
        assert_eq!(form.error("amount"), Some("must be a number"));
        assert!(form.is_touched("amount"));
    }

    #[test]
    fn touch_without_rules_records_nothing() {
        let mut form = amount_form();
        form.touch("comment");
        assert!(form.is_touched("comment"));
        assert!(!form.has_errors());
    }

    #[tokio::test]
    async fn invalid_submit_does_not_call_back() {
        let mut form = amount_form();
        let called = Cell::new(false);

        let outcome = form
            .submit(|_| async {
                called.set(true);
                Ok::<_, String>(())
            })
            .await;

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert!(!called.get());
        assert_eq!(form.error("amount"), Some("required"));
    }

    #[tokio::test]
    async fn successful_submit_resets_values() {
        let mut form = amount_form();
        form.set_field("amount", "10");
        form.set_field("comment", "lunch");

        let outcome = form
            .submit(|values| async move { Ok::<_, String>(values["comment"].clone()) })
            .await;

        assert_eq!(outcome, SubmitOutcome::Submitted("lunch".to_string()));
        assert_eq!(form.value("amount"), "");
        assert_eq!(form.value("comment"), "");
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn failed_submit_keeps_input() {
        let mut form = amount_form();
        form.set_field("amount", "10");

        let outcome = form
            .submit(|_| async { Err::<(), _>("server down".to_string()) })
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed("server down".to_string()));
        assert_eq!(form.value("amount"), "10");
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_busy() {
        let mut form = amount_form();
        form.set_field("amount", "10");

        let SubmitStart::Ready(values) = form.begin_submit() else {
            panic!("valid form should be ready");
        };
        assert_eq!(values["amount"], "10");
        assert!(form.is_submitting());

        let called = Cell::new(false);
        let outcome = form
            .submit(|_| async {
                called.set(true);
                Ok::<_, String>(())
            })
            .await;
        assert_eq!(outcome, SubmitOutcome::Busy);
        assert!(!called.get());
        assert_eq!(form.begin_submit(), SubmitStart::Busy);

        let outcome = form.finish_submit(Ok::<_, String>(7));
        assert_eq!(outcome, SubmitOutcome::Submitted(7));
        assert!(!form.is_submitting());
        assert_eq!(form.value("amount"), "");
    }

    #[test]
    fn abandoned_submit_can_be_retried() {
        let mut form = amount_form();
        form.set_field("amount", "10");
        assert!(matches!(form.begin_submit(), SubmitStart::Ready(_)));

        form.abandon_submit();
        assert!(!form.is_submitting());
        assert_eq!(form.value("amount"), "10");
        assert!(matches!(form.begin_submit(), SubmitStart::Ready(_)));
    }

    #[tokio::test]
    async fn whole_form_check_runs_after_field_rules() {
        fn no_self_reference(values: &Values) -> Errors {
            let mut errors = Errors::new();
            if values.get("comment").is_some_and(|c| c == "same") {
                errors.insert("comment", "not allowed".to_string());
            }
            errors
        }

        let mut form = amount_form().with_check(no_self_reference);
        form.set_field("amount", "1");
        form.set_field("comment", "same");

        let outcome = form.submit(|_| async { Ok::<_, String>(()) }).await;
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(form.error("comment"), Some("not allowed"));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut form = Form::new([("name", "Cash".to_string())])
            .with_rules("name", &[Rule::Required]);
        form.set_field("name", "");
        form.touch("name");
        form.reset();
        assert_eq!(form.value("name"), "Cash");
        assert!(!form.has_errors());
        assert!(!form.is_touched("name"));
    }
}
