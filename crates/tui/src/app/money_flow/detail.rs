use api_types::money_flow::MoneyFlow;
use client::Backend;

use crate::app::error_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowClass {
    Income,
    Expense,
}

impl FlowClass {
    /// Income when the type name matches one of `income_type_names`
    /// (case-insensitive); everything else, including a missing type, is
    /// an expense.
    pub fn of(flow: &MoneyFlow, income_type_names: &[String]) -> Self {
        let is_income = flow.flow_type.as_ref().is_some_and(|flow_type| {
            let name = flow_type.name.trim().to_lowercase();
            income_type_names
                .iter()
                .any(|income| income.trim().to_lowercase() == name)
        });
        if is_income { Self::Income } else { Self::Expense }
    }
}

#[derive(Debug, Clone)]
pub struct FlowDetailState {
    id: i64,
    flow: Option<MoneyFlow>,
    confirming_delete: bool,
    error: Option<String>,
}

impl FlowDetailState {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            flow: None,
            confirming_delete: false,
            error: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn flow(&self) -> Option<&MoneyFlow> {
        self.flow.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub async fn mount<B: Backend>(&mut self, api: &B) {
        match api.money_flow(self.id).await {
            Ok(flow) => {
                self.flow = Some(flow);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(id = self.id, error = %err, "failed to load money flow");
                self.error = Some(error_message("load data", &err));
            }
        }
    }

    pub fn request_delete(&mut self) {
        if self.flow.is_some() {
            self.confirming_delete = true;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    /// Returns `true` once deleted; the caller then shows the list.
    pub async fn confirm_delete<B: Backend>(&mut self, api: &B) -> bool {
        if !std::mem::take(&mut self.confirming_delete) {
            return false;
        }
        match api.delete_money_flow(self.id).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(id = self.id, error = %err, "failed to delete money flow");
                self.error = Some(error_message("delete item", &err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use api_types::{Amount, reference::Type};
    use chrono::NaiveDate;

    use super::*;
    use crate::app::testing::FakeBackend;

    fn flow(id: i64, type_name: Option<&str>) -> MoneyFlow {
        MoneyFlow {
            id,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: None,
            flow_type: type_name.map(|name| Type {
                id: 1,
                name: name.to_string(),
            }),
            category: None,
            subcategory: None,
            amount: Amount::new(100),
            comment: String::new(),
        }
    }

    #[test]
    fn income_matches_configured_names() {
        let names = vec!["Income".to_string(), "Доход".to_string()];
        assert_eq!(FlowClass::of(&flow(1, Some("income")), &names), FlowClass::Income);
        assert_eq!(FlowClass::of(&flow(1, Some("Доход")), &names), FlowClass::Income);
        assert_eq!(FlowClass::of(&flow(1, Some("Expense")), &names), FlowClass::Expense);
        assert_eq!(FlowClass::of(&flow(1, None), &names), FlowClass::Expense);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let api = FakeBackend::new().with_flows(vec![flow(5, Some("Expense"))]);
        let mut detail = FlowDetailState::new(5);
        detail.mount(&api).await;
        assert!(detail.flow().is_some());
        api.clear_calls();

        assert!(!detail.confirm_delete(&api).await);
        assert!(api.calls().is_empty());

        detail.request_delete();
        detail.cancel_delete();
        assert!(!detail.confirm_delete(&api).await);
        assert!(api.calls().is_empty());

        detail.request_delete();
        assert!(detail.confirm_delete(&api).await);
        assert_eq!(api.calls(), vec!["delete money-flow 5"]);
    }
}
