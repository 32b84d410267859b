use api_types::money_flow::MoneyFlowFilter;

/// Query-string builder that drops absent and blank values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(&'static str, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `page`; `None` and `0` are omitted.
    pub fn page(self, page: Option<u32>) -> Self {
        self.push("page", page.filter(|page| *page > 0))
    }

    pub fn push<V: ToString>(mut self, key: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.trim().is_empty() {
                self.0.push((key, value));
            }
        }
        self
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn money_flows(page: Option<u32>, filter: &MoneyFlowFilter) -> Self {
        Self::new()
            .page(page)
            .push("status", filter.status.as_deref())
            .push("type", filter.flow_type.as_deref())
            .push("category", filter.category.as_deref())
            .push("subcategory", filter.subcategory.as_deref())
            .push("start_date", filter.start_date)
            .push("end_date", filter.end_date)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn blank_values_are_omitted() {
        let query = Query::new()
            .page(None)
            .push("type", Some(""))
            .push("category", Some("  "))
            .push::<&str>("status", None);
        assert!(query.is_empty());
    }

    #[test]
    fn page_zero_is_omitted() {
        assert!(Query::new().page(Some(0)).is_empty());
        assert_eq!(Query::new().page(Some(2)).pairs(), &[("page", "2".to_string())]);
    }

    #[test]
    fn money_flow_filter_pairs() {
        let filter = MoneyFlowFilter {
            status: Some("Done".to_string()),
            flow_type: Some(String::new()),
            category: None,
            subcategory: Some("Taxi".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
        };
        let query = Query::money_flows(Some(3), &filter);
        assert_eq!(
            query.pairs(),
            &[
                ("page", "3".to_string()),
                ("status", "Done".to_string()),
                ("subcategory", "Taxi".to_string()),
                ("start_date", "2024-01-01".to_string()),
            ]
        );
    }
}
