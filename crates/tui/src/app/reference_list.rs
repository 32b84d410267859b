//! Schema-driven list screen shared by the four reference collections.
//!
//! The same controller lists, creates, edits and deletes statuses, types,
//! categories and subcategories. What differs between them is described by a
//! [`ReferenceSchema`]; foreign keys are resolved through a [`Lookup`] built
//! from the collection they point to.

use std::collections::BTreeMap;

use api_types::reference::{EntityKind, Named, ReferenceRecord};
use client::{Backend, ClientError};
use serde_json::{Map, Value};

use crate::app::error_message;

/// Shown for foreign keys that point to nothing we know about.
pub const NOT_SPECIFIED: &str = "not specified";
pub const REQUIRED_MISSING: &str = "fill in all required fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    /// Id of a record from another collection.
    Select(EntityKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSchema {
    pub kind: EntityKind,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

const NAME: FieldSpec = FieldSpec {
    name: "name",
    label: "Name",
    kind: FieldKind::Text,
    required: true,
};

const STATUS_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec {
        name: "description",
        label: "Description",
        kind: FieldKind::LongText,
        required: false,
    },
];

const TYPE_FIELDS: &[FieldSpec] = &[NAME];

const CATEGORY_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec {
        name: "type",
        label: "Type",
        kind: FieldKind::Select(EntityKind::Type),
        required: true,
    },
];

const SUBCATEGORY_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec {
        name: "category",
        label: "Category",
        kind: FieldKind::Select(EntityKind::Category),
        required: true,
    },
];

impl ReferenceSchema {
    pub fn for_kind(kind: EntityKind) -> Self {
        let (title, fields) = match kind {
            EntityKind::Status => ("Statuses", STATUS_FIELDS),
            EntityKind::Type => ("Types", TYPE_FIELDS),
            EntityKind::Category => ("Categories", CATEGORY_FIELDS),
            EntityKind::Subcategory => ("Subcategories", SUBCATEGORY_FIELDS),
        };
        Self {
            kind,
            title,
            fields,
        }
    }

    /// `(field, collection)` for every select field.
    pub fn dependencies(&self) -> impl Iterator<Item = (&'static str, EntityKind)> + '_ {
        self.fields.iter().filter_map(|field| match field.kind {
            FieldKind::Select(kind) => Some((field.name, kind)),
            FieldKind::Text | FieldKind::LongText => None,
        })
    }

    pub fn field(&self, index: usize) -> Option<&'static FieldSpec> {
        self.fields.get(index)
    }
}

/// Id to display-name table for one collection, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    options: Vec<(i64, String)>,
}

impl Lookup {
    pub fn from_records<T: Named>(records: &[T]) -> Self {
        Self {
            options: records
                .iter()
                .map(|record| (record.id(), record.name().to_string()))
                .collect(),
        }
    }

    pub fn options(&self) -> &[(i64, String)] {
        &self.options
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.options
            .iter()
            .find(|(option, _)| *option == id)
            .map(|(_, name)| name.as_str())
    }

    /// The option after (or before) `current`; the first option when
    /// `current` is not in the table.
    pub fn cycle(&self, current: Option<i64>, forward: bool) -> Option<i64> {
        if self.options.is_empty() {
            return None;
        }
        let len = self.options.len();
        let index = current
            .and_then(|id| self.options.iter().position(|(option, _)| *option == id))
            .map(|index| {
                if forward {
                    (index + 1) % len
                } else {
                    (index + len - 1) % len
                }
            })
            .unwrap_or(0);
        Some(self.options[index].0)
    }
}

/// Unsaved input for one record: raw text per field plus the focused field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: BTreeMap<&'static str, String>,
    pub focus: usize,
}

impl Draft {
    fn from_record(schema: &ReferenceSchema, record: &ReferenceRecord) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|field| {
                let value = match field.kind {
                    FieldKind::Select(_) => record
                        .foreign_id(field.name)
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    FieldKind::Text | FieldKind::LongText => record.text(field.name),
                };
                (field.name, value)
            })
            .collect();
        Self { values, focus: 0 }
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, field: &'static str, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn push_char(&mut self, field: &'static str, ch: char) {
        self.values.entry(field).or_default().push(ch);
    }

    pub fn pop_char(&mut self, field: &'static str) {
        if let Some(value) = self.values.get_mut(field) {
            value.pop();
        }
    }

    fn missing_required(&self, schema: &ReferenceSchema) -> bool {
        schema
            .fields
            .iter()
            .any(|field| field.required && self.value(field.name).trim().is_empty())
    }

    /// Request body: select values go out as numbers, text as strings.
    fn body(&self, schema: &ReferenceSchema) -> Map<String, Value> {
        schema
            .fields
            .iter()
            .map(|field| {
                let raw = self.value(field.name).trim();
                let value = match field.kind {
                    FieldKind::Select(_) => raw
                        .parse::<i64>()
                        .map(Value::from)
                        .unwrap_or(Value::Null),
                    FieldKind::Text | FieldKind::LongText => Value::from(raw),
                };
                (field.name.to_string(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceListState {
    schema: ReferenceSchema,
    items: Vec<ReferenceRecord>,
    lookups: BTreeMap<&'static str, Lookup>,
    pub selected: usize,
    error: Option<String>,
    creating: Option<Draft>,
    editing: Option<(i64, Draft)>,
    pending_delete: Option<i64>,
}

impl ReferenceListState {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            schema: ReferenceSchema::for_kind(kind),
            items: Vec::new(),
            lookups: BTreeMap::new(),
            selected: 0,
            error: None,
            creating: None,
            editing: None,
            pending_delete: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &ReferenceSchema {
        &self.schema
    }

    pub fn items(&self) -> &[ReferenceRecord] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn creating(&self) -> Option<&Draft> {
        self.creating.as_ref()
    }

    pub fn editing(&self) -> Option<(i64, &Draft)> {
        self.editing.as_ref().map(|(id, draft)| (*id, draft))
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub fn lookup(&self, field: &str) -> Option<&Lookup> {
        self.lookups.get(field)
    }

    pub fn selected_record(&self) -> Option<&ReferenceRecord> {
        self.items.get(self.selected)
    }

    /// Switches to another collection, dropping everything cached for the
    /// previous one. Returns `false` when `kind` is already shown.
    pub fn set_kind(&mut self, kind: EntityKind) -> bool {
        if self.schema.kind == kind {
            return false;
        }
        *self = Self::new(kind);
        true
    }

    /// Loads the select options, then the records.
    pub async fn mount<B: Backend>(&mut self, api: &B) {
        self.load_dependencies(api).await;
        self.reload(api).await;
    }

    pub async fn reload<B: Backend>(&mut self, api: &B) -> bool {
        match api.list_references(self.schema.kind).await {
            Ok(mut items) => {
                items.sort_by_key(|record| record.id);
                self.items = items;
                self.selected = self.selected.min(self.items.len().saturating_sub(1));
                true
            }
            Err(err) => {
                self.fail("load data", err);
                false
            }
        }
    }

    pub async fn load_dependencies<B: Backend>(&mut self, api: &B) {
        let dependencies: Vec<_> = self.schema.dependencies().collect();
        for (field, kind) in dependencies {
            match api.list_references(kind).await {
                Ok(records) => {
                    self.lookups.insert(field, Lookup::from_records(&records));
                }
                Err(err) => {
                    self.lookups.insert(field, Lookup::default());
                    self.fail("load data", err);
                }
            }
        }
    }

    /// Text shown for `field` of `record`; select fields show the looked-up
    /// name or [`NOT_SPECIFIED`].
    pub fn display_value(&self, field: &FieldSpec, record: &ReferenceRecord) -> String {
        match field.kind {
            FieldKind::Select(_) => record
                .foreign_id(field.name)
                .and_then(|id| self.lookups.get(field.name)?.name_of(id))
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
            FieldKind::Text | FieldKind::LongText => record.text(field.name),
        }
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn start_create(&mut self) {
        self.creating = Some(Draft::default());
        self.error = None;
    }

    pub fn cancel_create(&mut self) {
        self.creating = None;
    }

    pub fn creating_mut(&mut self) -> Option<&mut Draft> {
        self.creating.as_mut()
    }

    pub async fn submit_create<B: Backend>(&mut self, api: &B) -> bool {
        let Some(draft) = self.creating.as_ref() else {
            return false;
        };
        if draft.missing_required(&self.schema) {
            self.error = Some(REQUIRED_MISSING.to_string());
            return false;
        }

        let body = draft.body(&self.schema);
        match api.create_reference(self.schema.kind, &body).await {
            Ok(()) => {
                self.creating = None;
                self.error = None;
                self.reload(api).await
            }
            Err(err) => {
                self.fail("create item", err);
                false
            }
        }
    }

    pub fn start_edit(&mut self, id: i64) -> bool {
        let Some(record) = self.items.iter().find(|record| record.id == id) else {
            return false;
        };
        self.editing = Some((id, Draft::from_record(&self.schema, record)));
        self.error = None;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing_mut(&mut self) -> Option<&mut Draft> {
        self.editing.as_mut().map(|(_, draft)| draft)
    }

    pub async fn submit_edit<B: Backend>(&mut self, api: &B) -> bool {
        let Some((id, draft)) = self.editing.as_ref() else {
            return false;
        };
        if draft.missing_required(&self.schema) {
            self.error = Some(REQUIRED_MISSING.to_string());
            return false;
        }

        let id = *id;
        let body = draft.body(&self.schema);
        match api.update_reference(self.schema.kind, id, &body).await {
            Ok(()) => {
                self.editing = None;
                self.error = None;
                self.reload(api).await
            }
            Err(err) => {
                self.fail("update item", err);
                false
            }
        }
    }

    /// The draft taking keyboard input: the row being edited, else the new one.
    pub fn active_draft(&self) -> Option<&Draft> {
        self.editing
            .as_ref()
            .map(|(_, draft)| draft)
            .or(self.creating.as_ref())
    }

    fn active_draft_mut(&mut self) -> Option<&mut Draft> {
        match self.editing.as_mut() {
            Some((_, draft)) => Some(draft),
            None => self.creating.as_mut(),
        }
    }

    pub fn is_drafting(&self) -> bool {
        self.active_draft().is_some()
    }

    pub fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.schema.field(self.active_draft()?.focus)
    }

    pub fn focus_next(&mut self) {
        let len = self.schema.fields.len();
        if let Some(draft) = self.active_draft_mut() {
            draft.focus = (draft.focus + 1) % len;
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.schema.fields.len();
        if let Some(draft) = self.active_draft_mut() {
            draft.focus = (draft.focus + len - 1) % len;
        }
    }

    /// Types into the focused field; select fields only change by cycling.
    pub fn type_char(&mut self, ch: char) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if matches!(field.kind, FieldKind::Select(_)) {
            return;
        }
        if let Some(draft) = self.active_draft_mut() {
            draft.push_char(field.name, ch);
        }
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if matches!(field.kind, FieldKind::Select(_)) {
            return;
        }
        if let Some(draft) = self.active_draft_mut() {
            draft.pop_char(field.name);
        }
    }

    /// Steps the focused select field through its lookup options.
    pub fn cycle_option(&mut self, forward: bool) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if !matches!(field.kind, FieldKind::Select(_)) {
            return;
        }
        let Some(lookup) = self.lookups.get(field.name) else {
            return;
        };
        let draft = match self.editing.as_mut() {
            Some((_, draft)) => Some(draft),
            None => self.creating.as_mut(),
        };
        if let Some(draft) = draft {
            let current = draft.value(field.name).trim().parse().ok();
            if let Some(next) = lookup.cycle(current, forward) {
                draft.set(field.name, next.to_string());
            }
        }
    }

    /// Saves whichever draft is active.
    pub async fn submit_draft<B: Backend>(&mut self, api: &B) -> bool {
        if self.editing.is_some() {
            self.submit_edit(api).await
        } else {
            self.submit_create(api).await
        }
    }

    pub fn cancel_draft(&mut self) {
        if self.editing.is_some() {
            self.cancel_edit();
        } else {
            self.cancel_create();
        }
    }

    /// Only records the intent; nothing is sent until [`Self::confirm_delete`].
    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete<B: Backend>(&mut self, api: &B) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };
        match api.delete_reference(self.schema.kind, id).await {
            Ok(()) => {
                if self.editing.as_ref().is_some_and(|(editing, _)| *editing == id) {
                    self.editing = None;
                }
                self.error = None;
                self.reload(api).await
            }
            Err(err) => {
                self.fail("delete item", err);
                false
            }
        }
    }

    fn fail(&mut self, action: &str, err: ClientError) {
        tracing::warn!(kind = ?self.schema.kind, error = %err, "failed to {action}");
        self.error = Some(error_message(action, &err));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app::testing::{FakeBackend, record};

    fn categories_backend() -> FakeBackend {
        FakeBackend::new()
            .with_references(
                EntityKind::Type,
                vec![
                    record(1, json!({"name": "Income"})),
                    record(2, json!({"name": "Expense"})),
                ],
            )
            .with_references(
                EntityKind::Category,
                vec![
                    record(5, json!({"name": "Salary", "type": 1})),
                    record(3, json!({"name": "Food", "type": 2})),
                    record(4, json!({"name": "Legacy", "type": 99})),
                ],
            )
    }

    #[tokio::test]
    async fn mount_sorts_by_id_and_builds_lookup() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;

        let ids: Vec<_> = list.items().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);

        let options = list.lookup("type").unwrap().options();
        assert_eq!(
            options,
            &[(1, "Income".to_string()), (2, "Expense".to_string())]
        );
        assert_eq!(api.calls(), vec!["list types", "list categories"]);
    }

    #[tokio::test]
    async fn orphaned_foreign_key_shows_placeholder() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;

        let type_field = list.schema().field(1).unwrap();
        let shown: Vec<_> = list
            .items()
            .iter()
            .map(|record| list.display_value(type_field, record))
            .collect();
        assert_eq!(shown, vec!["Expense", NOT_SPECIFIED, "Income"]);
    }

    #[tokio::test]
    async fn create_posts_once_then_refetches() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;
        api.clear_calls();

        list.start_create();
        let draft = list.creating_mut().unwrap();
        draft.set("name", "Rent");
        draft.set("type", "2");
        assert!(list.submit_create(&api).await);

        assert_eq!(api.calls(), vec!["create categories", "list categories"]);
        assert!(list.creating().is_none());
        assert_eq!(list.items().len(), 4);

        let created = api
            .stored(EntityKind::Category)
            .into_iter()
            .find(|record| record.name() == "Rent")
            .unwrap();
        assert_eq!(created.fields["type"], json!(2));
    }

    #[tokio::test]
    async fn create_with_missing_required_field_sends_nothing() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;
        api.clear_calls();

        list.start_create();
        list.creating_mut().unwrap().set("name", "Rent");
        assert!(!list.submit_create(&api).await);

        assert!(api.calls().is_empty());
        assert_eq!(list.error(), Some(REQUIRED_MISSING));
        assert_eq!(list.creating().unwrap().value("name"), "Rent");
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;
        api.clear_calls();

        list.request_delete(3);
        list.cancel_delete();
        assert!(!list.confirm_delete(&api).await);
        assert!(api.calls().is_empty());

        list.request_delete(3);
        assert_eq!(list.pending_delete(), Some(3));
        assert!(list.confirm_delete(&api).await);
        assert_eq!(api.calls(), vec!["delete categories 3", "list categories"]);
        assert_eq!(list.items().len(), 2);
    }

    #[tokio::test]
    async fn edit_updates_and_returns_to_viewing() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;

        assert!(list.start_edit(3));
        assert_eq!(list.editing().unwrap().1.value("type"), "2");
        list.editing_mut().unwrap().set("name", "Groceries");
        assert!(list.submit_edit(&api).await);

        assert!(list.editing().is_none());
        assert_eq!(list.items()[0].name(), "Groceries");
    }

    #[tokio::test]
    async fn failed_write_keeps_draft_and_reports() {
        let api = FakeBackend::new();
        api.fail_writes.set(true);
        let mut list = ReferenceListState::new(EntityKind::Type);
        list.mount(&api).await;

        list.start_create();
        list.creating_mut().unwrap().set("name", "Income");
        assert!(!list.submit_create(&api).await);

        assert_eq!(list.error(), Some("name: already exists"));
        assert_eq!(list.creating().unwrap().value("name"), "Income");
    }

    #[tokio::test]
    async fn keyboard_editing_of_a_draft() {
        let api = categories_backend();
        let mut list = ReferenceListState::new(EntityKind::Category);
        list.mount(&api).await;

        list.start_create();
        for ch in "Rent".chars() {
            list.type_char(ch);
        }
        list.focus_next();
        list.type_char('x');
        list.cycle_option(true);
        list.cycle_option(true);

        let draft = list.active_draft().unwrap();
        assert_eq!(draft.value("name"), "Rent");
        assert_eq!(draft.value("type"), "2");

        assert!(list.start_edit(5));
        assert_eq!(list.active_draft().unwrap().value("name"), "Salary");
        list.cancel_draft();
        assert_eq!(list.active_draft().unwrap().value("name"), "Rent");
        list.cancel_draft();
        assert!(!list.is_drafting());
    }

    #[test]
    fn set_kind_resets_only_on_change() {
        let mut list = ReferenceListState::new(EntityKind::Status);
        list.start_create();
        assert!(!list.set_kind(EntityKind::Status));
        assert!(list.creating().is_some());

        assert!(list.set_kind(EntityKind::Subcategory));
        assert!(list.creating().is_none());
        assert_eq!(list.schema().title, "Subcategories");
        assert_eq!(
            list.schema().dependencies().collect::<Vec<_>>(),
            vec![("category", EntityKind::Category)]
        );
    }

    #[test]
    fn lookup_cycles_through_options() {
        let lookup = Lookup::from_records(&[
            record(1, json!({"name": "a"})),
            record(2, json!({"name": "b"})),
        ]);
        assert_eq!(lookup.cycle(None, true), Some(1));
        assert_eq!(lookup.cycle(Some(1), true), Some(2));
        assert_eq!(lookup.cycle(Some(2), true), Some(1));
        assert_eq!(lookup.cycle(Some(1), false), Some(2));
        assert_eq!(Lookup::default().cycle(None, true), None);
    }
}
