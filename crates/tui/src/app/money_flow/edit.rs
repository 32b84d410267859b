use chrono::NaiveDate;
use client::Backend;

use crate::app::{
    error_message,
    form::SubmitOutcome,
    money_flow::{MoneyFlowForm, ReferenceData, payload},
};

#[derive(Debug, Clone)]
pub struct EditFlowState {
    id: i64,
    pub form: MoneyFlowForm,
    data: ReferenceData,
    loaded: bool,
    error: Option<String>,
}

impl EditFlowState {
    pub fn new(id: i64, today: NaiveDate, enforce_positive_amount: bool) -> Self {
        Self {
            id,
            form: MoneyFlowForm::new(today, enforce_positive_amount),
            data: ReferenceData::default(),
            loaded: false,
            error: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Loads the record and the reference collections.
    pub async fn mount<B: Backend>(&mut self, api: &B) {
        let loaded = tokio::try_join!(api.money_flow(self.id), ReferenceData::load(api));
        match loaded {
            Ok((flow, data)) => {
                self.form.load(&flow);
                self.data = data;
                self.loaded = true;
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(id = self.id, error = %err, "failed to load money flow");
                self.error = Some(error_message("load data", &err));
            }
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        self.form.cycle(&self.data, forward);
    }

    /// Returns `true` once the update is stored; the caller then shows the
    /// detail screen for [`Self::id`].
    pub async fn submit<B: Backend>(&mut self, api: &B) -> bool {
        if !self.loaded {
            return false;
        }
        let id = self.id;
        let outcome = self
            .form
            .form_mut()
            .submit(|values| async move {
                let body = payload(&values)?;
                api.update_money_flow(id, &body)
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
                tracing::warn!(id, %message, "failed to update money flow");
                self.error = Some(message);
                false
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => false,
        }
    }
}
