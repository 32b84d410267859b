//! In-memory [`Backend`] used by the controller tests.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

use api_types::{
    ListResponse, Paginated,
    auth::{AuthToken, PasswordChange, SignIn, SignUp},
    money_flow::{MoneyFlow, MoneyFlowFilter, MoneyFlowWrite},
    reference::{Category, EntityKind, ReferenceRecord, Status, Subcategory, Type},
    user::{Avatar, User},
};
use client::{Backend, ClientError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const PAGE_SIZE: usize = crate::app::money_flow::list::PAGE_SIZE as usize;

#[derive(Default)]
pub struct FakeBackend {
    calls: RefCell<Vec<String>>,
    references: RefCell<BTreeMap<EntityKind, Vec<ReferenceRecord>>>,
    flows: RefCell<Vec<MoneyFlow>>,
    written: RefCell<Vec<MoneyFlowWrite>>,
    user: RefCell<Option<User>>,
    next_id: Cell<i64>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
    /// Message of the 400 returned while `fail_writes` is set.
    rejection: RefCell<Option<String>>,
}

pub const TOKEN: &str = "t0k3n";

pub fn user(avatar: Option<&str>) -> User {
    User {
        id: 1,
        email: "ann@example.com".to_string(),
        username: "ann".to_string(),
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        avatar: avatar.map(str::to_string),
    }
}

pub fn record(id: i64, fields: Value) -> ReferenceRecord {
    let fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ReferenceRecord { id, fields }
}

impl FakeBackend {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.next_id.set(100);
        fake
    }

    pub fn with_references(self, kind: EntityKind, records: Vec<ReferenceRecord>) -> Self {
        self.references.borrow_mut().insert(kind, records);
        self
    }

    pub fn with_flows(self, flows: Vec<MoneyFlow>) -> Self {
        *self.flows.borrow_mut() = flows;
        self
    }

    pub fn with_user(self, user: User) -> Self {
        *self.user.borrow_mut() = Some(user);
        self
    }

    /// Makes every write fail with a 400 carrying `message`.
    pub fn reject_writes(&self, message: &str) {
        self.fail_writes.set(true);
        *self.rejection.borrow_mut() = Some(message.to_string());
    }

    pub fn user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn stored(&self, kind: EntityKind) -> Vec<ReferenceRecord> {
        self.references
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn written(&self) -> Vec<MoneyFlowWrite> {
        self.written.borrow().clone()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads.get() {
            return Err(ClientError::Server("boom".to_string()));
        }
        Ok(())
    }

    fn write_guard(&self) -> Result<()> {
        if self.fail_writes.get() {
            let message = self
                .rejection
                .borrow()
                .clone()
                .unwrap_or_else(|| "name: already exists".to_string());
            return Err(ClientError::Validation(message));
        }
        Ok(())
    }

    fn typed<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>> {
        self.log(format!("list {}", kind.collection()));
        self.read_guard()?;
        self.stored(kind)
            .into_iter()
            .map(|record| {
                serde_json::to_value(record)
                    .and_then(serde_json::from_value)
                    .map_err(|err| ClientError::Server(err.to_string()))
            })
            .collect()
    }
}

impl Backend for FakeBackend {
    async fn signup(&self, payload: &SignUp) -> Result<User> {
        self.log(format!("signup {}", payload.username));
        self.write_guard()?;
        let mut user = user(None);
        user.email = payload.email.clone();
        user.username = payload.username.clone();
        Ok(user)
    }

    async fn signin(&self, payload: &SignIn) -> Result<AuthToken> {
        self.log(format!("signin {}", payload.email));
        self.write_guard()?;
        Ok(AuthToken {
            auth_token: TOKEN.to_string(),
        })
    }

    async fn signout(&self) -> Result<()> {
        self.log("signout".to_string());
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.log(format!("reset password {email}"));
        self.write_guard()
    }

    async fn change_password(&self, _payload: &PasswordChange) -> Result<()> {
        self.log("change password".to_string());
        self.write_guard()
    }

    async fn me(&self) -> Result<User> {
        self.log("me".to_string());
        self.read_guard()?;
        self.user().ok_or(ClientError::Unauthorized)
    }

    async fn set_avatar(&self, data_uri: &str) -> Result<Avatar> {
        self.log("set avatar".to_string());
        self.write_guard()?;
        let url = format!("/media/avatars/{}.png", data_uri.len());
        if let Some(user) = self.user.borrow_mut().as_mut() {
            user.avatar = Some(url.clone());
        }
        Ok(Avatar { avatar: Some(url) })
    }

    async fn delete_avatar(&self) -> Result<()> {
        self.log("delete avatar".to_string());
        self.write_guard()?;
        if let Some(user) = self.user.borrow_mut().as_mut() {
            user.avatar = None;
        }
        Ok(())
    }

    async fn list_references(&self, kind: EntityKind) -> Result<Vec<ReferenceRecord>> {
        self.log(format!("list {}", kind.collection()));
        self.read_guard()?;
        Ok(self.stored(kind))
    }

    async fn create_reference(&self, kind: EntityKind, fields: &Map<String, Value>) -> Result<()> {
        self.log(format!("create {}", kind.collection()));
        self.write_guard()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.references
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(ReferenceRecord {
                id,
                fields: fields.clone(),
            });
        Ok(())
    }

    async fn update_reference(
        &self,
        kind: EntityKind,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        self.log(format!("update {} {id}", kind.collection()));
        self.write_guard()?;
        let mut references = self.references.borrow_mut();
        let record = references
            .get_mut(&kind)
            .and_then(|records| records.iter_mut().find(|record| record.id == id))
            .ok_or(ClientError::NotFound)?;
        record.fields = fields.clone();
        Ok(())
    }

    async fn delete_reference(&self, kind: EntityKind, id: i64) -> Result<()> {
        self.log(format!("delete {} {id}", kind.collection()));
        self.write_guard()?;
        if let Some(records) = self.references.borrow_mut().get_mut(&kind) {
            records.retain(|record| record.id != id);
        }
        Ok(())
    }

    async fn statuses(&self) -> Result<Vec<Status>> {
        self.typed(EntityKind::Status)
    }

    async fn types(&self) -> Result<Vec<Type>> {
        self.typed(EntityKind::Type)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.typed(EntityKind::Category)
    }

    async fn subcategories(&self) -> Result<Vec<Subcategory>> {
        self.typed(EntityKind::Subcategory)
    }

    async fn money_flows(
        &self,
        page: u32,
        filter: &MoneyFlowFilter,
    ) -> Result<ListResponse<MoneyFlow>> {
        self.log(format!(
            "list money-flows page={page} category={}",
            filter.category.as_deref().unwrap_or("")
        ));
        self.read_guard()?;
        let flows = self.flows.borrow();
        let start = (page.max(1) as usize - 1) * PAGE_SIZE;
        Ok(ListResponse::Page(Paginated {
            count: flows.len() as u64,
            next: None,
            previous: None,
            results: flows.iter().skip(start).take(PAGE_SIZE).cloned().collect(),
        }))
    }

    async fn money_flow(&self, id: i64) -> Result<MoneyFlow> {
        self.log(format!("get money-flow {id}"));
        self.read_guard()?;
        self.flows
            .borrow()
            .iter()
            .find(|flow| flow.id == id)
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    async fn create_money_flow(&self, payload: &MoneyFlowWrite) -> Result<()> {
        self.log("create money-flow".to_string());
        self.write_guard()?;
        self.written.borrow_mut().push(payload.clone());
        Ok(())
    }

    async fn update_money_flow(&self, id: i64, payload: &MoneyFlowWrite) -> Result<()> {
        self.log(format!("update money-flow {id}"));
        self.write_guard()?;
        self.written.borrow_mut().push(payload.clone());
        Ok(())
    }

    async fn delete_money_flow(&self, id: i64) -> Result<()> {
        self.log(format!("delete money-flow {id}"));
        self.write_guard()?;
        self.flows.borrow_mut().retain(|flow| flow.id != id);
        Ok(())
    }
}
