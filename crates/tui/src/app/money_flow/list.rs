//! Filtered, paginated money-flow list.
//!
//! [`MoneyFlowBrowser`] owns the applied filter and the page cursor and does
//! the fetching. [`MoneyFlowListView`] owns what the user is typing and
//! decides when that becomes a new filter: text filters after a quiet
//! period, the date range only when applied explicitly.

use std::time::{Duration, Instant};

use api_types::money_flow::{MoneyFlow, MoneyFlowFilter};
use chrono::NaiveDate;
use client::Backend;

use crate::app::{
    debounce::Debouncer, error_message, money_flow::DATE_FORMAT, pagination::Pagination,
};

/// Page size the backend paginates money flows with; `total_pages` is only
/// right when it matches.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct MoneyFlowBrowser {
    filter: MoneyFlowFilter,
    pagination: Pagination,
    items: Vec<MoneyFlow>,
    pub selected: usize,
    error: Option<String>,
}

impl Default for MoneyFlowBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MoneyFlowBrowser {
    pub fn new() -> Self {
        Self {
            filter: MoneyFlowFilter::default(),
            pagination: Pagination::new(PAGE_SIZE),
            items: Vec::new(),
            selected: 0,
            error: None,
        }
    }

    pub fn filter(&self) -> &MoneyFlowFilter {
        &self.filter
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn items(&self) -> &[MoneyFlow] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected_flow(&self) -> Option<&MoneyFlow> {
        self.items.get(self.selected)
    }

    /// Replaces the filter and goes back to page 1. Returns `false` when the
    /// filter did not change.
    pub fn set_filter(&mut self, filter: MoneyFlowFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.pagination.rewind();
        true
    }

    /// Fetches the current page. When the list shrank below it (e.g. the
    /// only row of the last page was deleted) the last existing page is
    /// fetched instead.
    pub async fn load<B: Backend>(&mut self, api: &B) -> bool {
        let mut response = api.money_flows(self.pagination.page(), &self.filter).await;
        if let Ok(page) = &response
            && self.pagination.set_count(page.count())
        {
            tracing::debug!(page = self.pagination.page(), "page out of range, reloading");
            response = api.money_flows(self.pagination.page(), &self.filter).await;
        }

        match response {
            Ok(response) => {
                self.pagination.set_count(response.count());
                self.items = response.into_items();
                self.selected = 0;
                self.error = None;
                true
            }
            Err(err) => {
                tracing::warn!(page = self.pagination.page(), error = %err, "failed to load money flows");
                self.error = Some(error_message("load data", &err));
                false
            }
        }
    }

    /// Moves the cursor one page without fetching; returns whether it moved.
    pub fn turn_page(&mut self, forward: bool) -> bool {
        if forward {
            self.pagination.next()
        } else {
            self.pagination.previous()
        }
    }

    pub async fn next_page<B: Backend>(&mut self, api: &B) -> bool {
        self.turn_page(true) && self.load(api).await
    }

    pub async fn previous_page<B: Backend>(&mut self, api: &B) -> bool {
        self.turn_page(false) && self.load(api).await
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Status,
    Type,
    Category,
    Subcategory,
    StartDate,
    EndDate,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        Self::Status,
        Self::Type,
        Self::Category,
        Self::Subcategory,
        Self::StartDate,
        Self::EndDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Type => "Type",
            Self::Category => "Category",
            Self::Subcategory => "Subcategory",
            Self::StartDate => "From",
            Self::EndDate => "To",
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, Self::StartDate | Self::EndDate)
    }
}

/// Free-text filters as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFilters {
    pub status: String,
    pub flow_type: String,
    pub category: String,
    pub subcategory: String,
}

#[derive(Debug, Clone)]
pub struct MoneyFlowListView {
    text: TextFilters,
    start_date: String,
    end_date: String,
    applied_dates: (Option<NaiveDate>, Option<NaiveDate>),
    debouncer: Debouncer<TextFilters>,
    focus: usize,
    pub editing: bool,
    error: Option<String>,
}

impl MoneyFlowListView {
    pub fn new(debounce: Duration) -> Self {
        Self {
            text: TextFilters::default(),
            start_date: String::new(),
            end_date: String::new(),
            applied_dates: (None, None),
            debouncer: Debouncer::new(debounce),
            focus: 0,
            editing: false,
            error: None,
        }
    }

    pub fn focused(&self) -> FilterField {
        FilterField::ALL[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FilterField::ALL.len();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn value(&self, field: FilterField) -> &str {
        match field {
            FilterField::Status => &self.text.status,
            FilterField::Type => &self.text.flow_type,
            FilterField::Category => &self.text.category,
            FilterField::Subcategory => &self.text.subcategory,
            FilterField::StartDate => &self.start_date,
            FilterField::EndDate => &self.end_date,
        }
    }

    fn value_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Status => &mut self.text.status,
            FilterField::Type => &mut self.text.flow_type,
            FilterField::Category => &mut self.text.category,
            FilterField::Subcategory => &mut self.text.subcategory,
            FilterField::StartDate => &mut self.start_date,
            FilterField::EndDate => &mut self.end_date,
        }
    }

    /// Replaces the focused input. Text filters restart the quiet period;
    /// dates wait for [`Self::apply_dates`].
    pub fn set_value(&mut self, field: FilterField, value: impl Into<String>, now: Instant) {
        *self.value_mut(field) = value.into();
        if !field.is_date() {
            self.debouncer.push(self.text.clone(), now);
        }
    }

    pub fn push_char(&mut self, ch: char, now: Instant) {
        let field = self.focused();
        let mut value = self.value(field).to_string();
        value.push(ch);
        self.set_value(field, value, now);
    }

    pub fn pop_char(&mut self, now: Instant) {
        let field = self.focused();
        let mut value = self.value(field).to_string();
        value.pop();
        self.set_value(field, value, now);
    }

    /// The new filter once the text inputs have been quiet long enough.
    pub fn poll(&mut self, now: Instant) -> Option<MoneyFlowFilter> {
        let text = self.debouncer.poll(now)?;
        Some(self.build(&text))
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Parses the date inputs and emits a filter with them. Blank dates
    /// clear that end of the range.
    pub fn apply_dates(&mut self) -> Option<MoneyFlowFilter> {
        let start = parse_date(&self.start_date);
        let end = parse_date(&self.end_date);
        let (Ok(start), Ok(end)) = (start, end) else {
            self.error = Some("dates must look like 2024-01-31".to_string());
            return None;
        };
        self.error = None;
        self.applied_dates = (start, end);
        self.debouncer.cancel();
        let text = self.text.clone();
        Some(self.build(&text))
    }

    pub fn clear(&mut self) -> MoneyFlowFilter {
        self.text = TextFilters::default();
        self.start_date.clear();
        self.end_date.clear();
        self.applied_dates = (None, None);
        self.debouncer.cancel();
        self.error = None;
        MoneyFlowFilter::default()
    }

    fn build(&self, text: &TextFilters) -> MoneyFlowFilter {
        let text_filter = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        MoneyFlowFilter {
            status: text_filter(&text.status),
            flow_type: text_filter(&text.flow_type),
            category: text_filter(&text.category),
            subcategory: text_filter(&text.subcategory),
            start_date: self.applied_dates.0,
            end_date: self.applied_dates.1,
        }
    }
}

fn parse_date(value: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map(Some)
}
