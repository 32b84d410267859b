use chrono::NaiveDate;
use client::Backend;

use crate::app::{
    error_message,
    form::SubmitOutcome,
    money_flow::{MoneyFlowForm, ReferenceData, payload},
};

#[derive(Debug, Clone)]
pub struct CreateFlowState {
    pub form: MoneyFlowForm,
    data: ReferenceData,
    error: Option<String>,
}

impl CreateFlowState {
    pub fn new(today: NaiveDate, enforce_positive_amount: bool) -> Self {
        Self {
            form: MoneyFlowForm::new(today, enforce_positive_amount),
            data: ReferenceData::default(),
            error: None,
        }
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn mount<B: Backend>(&mut self, api: &B) {
        match ReferenceData::load(api).await {
            Ok(data) => self.data = data,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load reference data");
                self.error = Some(error_message("load data", &err));
            }
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        self.form.cycle(&self.data, forward);
    }

    /// Returns `true` once the flow is stored; the caller then shows the list.
    pub async fn submit<B: Backend>(&mut self, api: &B) -> bool {
        let outcome = self
            .form
            .form_mut()
            .submit(|values| async move {
                let body = payload(&values)?;
                api.create_money_flow(&body)
                    .await
                    .map_err(|err| error_message("save", &err))
            })
            .await;

        match outcome {
            SubmitOutcome::Submitted(()) => {
                self.error = None;
                true
            }
            SubmitOutcome::Failed(message) => {
                tracing::warn!(%message, "failed to create money flow");
                self.error = Some(message);
                false
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => false,
        }
    }
}
