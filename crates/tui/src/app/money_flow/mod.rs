//! Money-flow screens: create, edit, detail and the filtered list.
//!
//! Create and edit share [`MoneyFlowForm`], which keeps the subcategory
//! consistent with the selected category.

pub mod create;
pub mod detail;
pub mod edit;
pub mod list;

use api_types::{
    Amount,
    money_flow::{MoneyFlow, MoneyFlowWrite},
    reference::{Category, EntityKind, Status, Subcategory, Type},
};
use chrono::NaiveDate;
use client::Backend;

use crate::app::{
    form::{Errors, Form, Values},
    reference_list::Lookup,
    validate::Rule,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a field is edited on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowInput {
    Date,
    Select(EntityKind),
    Amount,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: FlowInput,
}

pub const FLOW_FIELDS: &[FlowField] = &[
    FlowField {
        name: "created_at",
        label: "Date",
        input: FlowInput::Date,
    },
    FlowField {
        name: "status",
        label: "Status",
        input: FlowInput::Select(EntityKind::Status),
    },
    FlowField {
        name: "type",
        label: "Type",
        input: FlowInput::Select(EntityKind::Type),
    },
    FlowField {
        name: "category",
        label: "Category",
        input: FlowInput::Select(EntityKind::Category),
    },
    FlowField {
        name: "subcategory",
        label: "Subcategory",
        input: FlowInput::Select(EntityKind::Subcategory),
    },
    FlowField {
        name: "amount",
        label: "Amount",
        input: FlowInput::Amount,
    },
    FlowField {
        name: "comment",
        label: "Comment",
        input: FlowInput::Text,
    },
];

/// The four reference collections a money flow points to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub statuses: Vec<Status>,
    pub types: Vec<Type>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

impl ReferenceData {
    /// Fetches all four collections concurrently; any failure fails the load.
    pub async fn load<B: Backend>(api: &B) -> client::Result<Self> {
        let (statuses, types, categories, subcategories) = tokio::try_join!(
            api.statuses(),
            api.types(),
            api.categories(),
            api.subcategories()
        )?;
        Ok(Self {
            statuses,
            types,
            categories,
            subcategories,
        })
    }

    /// Subcategories whose parent is `category`, a form value that may hold
    /// a numeric id as text.
    pub fn subcategories_of(&self, category: &str) -> Vec<Subcategory> {
        let Ok(category) = category.trim().parse::<i64>() else {
            return Vec::new();
        };
        self.subcategories
            .iter()
            .filter(|subcategory| subcategory.category_id == category)
            .cloned()
            .collect()
    }

    /// Select options for `kind`; subcategories are narrowed to `category`.
    pub fn options(&self, kind: EntityKind, category: &str) -> Lookup {
        match kind {
            EntityKind::Status => Lookup::from_records(&self.statuses),
            EntityKind::Type => Lookup::from_records(&self.types),
            EntityKind::Category => Lookup::from_records(&self.categories),
            EntityKind::Subcategory => Lookup::from_records(&self.subcategories_of(category)),
        }
    }
}

/// Form shared by the create and edit screens.
#[derive(Debug, Clone)]
pub struct MoneyFlowForm {
    form: Form,
    focus: usize,
}

impl MoneyFlowForm {
    pub fn new(today: NaiveDate, enforce_positive_amount: bool) -> Self {
        let initial = FLOW_FIELDS.iter().map(|field| {
            let value = match field.input {
                FlowInput::Date => today.format(DATE_FORMAT).to_string(),
                _ => String::new(),
            };
            (field.name, value)
        });
        let mut form = Form::new(initial).with_check(check_date);
        for field in ["created_at", "status", "type", "category", "subcategory"] {
            form.set_rules(field, &[Rule::Required]);
        }
        if enforce_positive_amount {
            form.set_rules("amount", &[Rule::Required, Rule::Numeric, Rule::PositiveNumber]);
        } else {
            form.set_rules("amount", &[Rule::Required, Rule::Numeric]);
        }
        Self { form, focus: 0 }
    }

    /// Pre-populates from a stored flow, using the ids of its references.
    pub fn load(&mut self, flow: &MoneyFlow) {
        let id = |id: Option<i64>| id.map(|id| id.to_string()).unwrap_or_default();
        let values: Values = [
            ("created_at", flow.created_at.format(DATE_FORMAT).to_string()),
            ("status", id(flow.status.as_ref().map(|r| r.id))),
            ("type", id(flow.flow_type.as_ref().map(|r| r.id))),
            ("category", id(flow.category.as_ref().map(|r| r.id))),
            ("subcategory", id(flow.subcategory.as_ref().map(|r| r.id))),
            ("amount", flow.amount.to_string()),
            ("comment", flow.comment.clone()),
        ]
        .into_iter()
        .collect();
        self.form.set_initial(values);
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn value(&self, field: &str) -> &str {
        self.form.value(field)
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> &'static FlowField {
        &FLOW_FIELDS[self.focus]
    }

    /// Moves focus, validating the field being left.
    pub fn focus_next(&mut self) {
        self.form.touch(self.focused().name);
        self.focus = (self.focus + 1) % FLOW_FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.form.touch(self.focused().name);
        self.focus = (self.focus + FLOW_FIELDS.len() - 1) % FLOW_FIELDS.len();
    }

    /// A new category invalidates the chosen subcategory.
    pub fn set_field(&mut self, field: &'static str, value: impl Into<String>) {
        let value = value.into();
        if field == "category" && value != self.form.value("category") {
            self.form.set_field("subcategory", "");
        }
        self.form.set_field(field, value);
    }

    /// Typing only applies to free-text fields.
    pub fn push_char(&mut self, ch: char) {
        let field = self.focused();
        if !matches!(field.input, FlowInput::Select(_)) {
            self.form.push_char(field.name, ch);
        }
    }

    pub fn pop_char(&mut self) {
        let field = self.focused();
        if !matches!(field.input, FlowInput::Select(_)) {
            self.form.pop_char(field.name);
        }
    }

    /// Steps the focused select through its options.
    pub fn cycle(&mut self, data: &ReferenceData, forward: bool) {
        let field = self.focused();
        let FlowInput::Select(kind) = field.input else {
            return;
        };
        let options = self.options(data, kind);
        let current = self.value(field.name).trim().parse().ok();
        if let Some(next) = options.cycle(current, forward) {
            self.set_field(field.name, next.to_string());
        }
    }

    pub fn options(&self, data: &ReferenceData, kind: EntityKind) -> Lookup {
        data.options(kind, self.value("category"))
    }

    /// Display text for a field: the option name for selects.
    pub fn display(&self, data: &ReferenceData, field: &FlowField) -> String {
        let value = self.value(field.name);
        match field.input {
            FlowInput::Select(kind) => value
                .trim()
                .parse()
                .ok()
                .and_then(|id| self.options(data, kind).name_of(id).map(str::to_string))
                .unwrap_or_default(),
            _ => value.to_string(),
        }
    }
}

/// Builds the request body from validated form values.
pub fn payload(values: &Values) -> Result<MoneyFlowWrite, String> {
    let text = |field: &str| values.get(field).map(|v| v.trim()).unwrap_or_default();
    let id = |field: &str| {
        text(field)
            .parse::<i64>()
            .map_err(|_| format!("{field}: required"))
    };

    Ok(MoneyFlowWrite {
        created_at: NaiveDate::parse_from_str(text("created_at"), DATE_FORMAT)
            .map_err(|_| "created_at: invalid date".to_string())?,
        status: id("status")?,
        flow_type: id("type")?,
        category: id("category")?,
        subcategory: id("subcategory")?,
        amount: text("amount")
            .parse::<Amount>()
            .map_err(|err| format!("amount: {err}"))?,
        comment: text("comment").to_string(),
    })
}

fn check_date(values: &Values) -> Errors {
    let mut errors = Errors::new();
    if let Some(date) = values.get("created_at").filter(|date| !date.trim().is_empty())
        && NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).is_err()
    {
        errors.insert("created_at", "invalid date".to_string());
    }
    errors
}
