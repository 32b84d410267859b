use api_types::{
    ListResponse,
    auth::{AuthToken, PasswordChange, SignIn, SignUp},
    money_flow::{MoneyFlow, MoneyFlowFilter, MoneyFlowWrite},
    reference::{Category, EntityKind, ReferenceRecord, Status, Subcategory, Type},
    user::{Avatar, User},
};
use serde_json::{Map, Value};

use crate::{Client, Result};

/// Operations the screens need from the server.
///
/// List methods return the first page already unwrapped; reference screens
/// only ever show one page.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn signup(&self, payload: &SignUp) -> Result<User>;
    async fn signin(&self, payload: &SignIn) -> Result<AuthToken>;
    async fn signout(&self) -> Result<()>;
    async fn reset_password(&self, email: &str) -> Result<()>;
    async fn change_password(&self, payload: &PasswordChange) -> Result<()>;

    async fn me(&self) -> Result<User>;
    async fn set_avatar(&self, data_uri: &str) -> Result<Avatar>;
    async fn delete_avatar(&self) -> Result<()>;

    async fn list_references(&self, kind: EntityKind) -> Result<Vec<ReferenceRecord>>;
    async fn create_reference(&self, kind: EntityKind, fields: &Map<String, Value>) -> Result<()>;
    async fn update_reference(
        &self,
        kind: EntityKind,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<()>;
    async fn delete_reference(&self, kind: EntityKind, id: i64) -> Result<()>;

    async fn statuses(&self) -> Result<Vec<Status>>;
    async fn types(&self) -> Result<Vec<Type>>;
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn subcategories(&self) -> Result<Vec<Subcategory>>;

    async fn money_flows(
        &self,
        page: u32,
        filter: &MoneyFlowFilter,
    ) -> Result<ListResponse<MoneyFlow>>;
    async fn money_flow(&self, id: i64) -> Result<MoneyFlow>;
    async fn create_money_flow(&self, payload: &MoneyFlowWrite) -> Result<()>;
    async fn update_money_flow(&self, id: i64, payload: &MoneyFlowWrite) -> Result<()>;
    async fn delete_money_flow(&self, id: i64) -> Result<()>;
}

impl Backend for Client {
    async fn signup(&self, payload: &SignUp) -> Result<User> {
        Client::signup(self, payload).await
    }

    async fn signin(&self, payload: &SignIn) -> Result<AuthToken> {
        Client::signin(self, payload).await
    }

    async fn signout(&self) -> Result<()> {
        Client::signout(self).await
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        Client::reset_password(self, email).await
    }

    async fn change_password(&self, payload: &PasswordChange) -> Result<()> {
        Client::change_password(self, payload).await
    }

    async fn me(&self) -> Result<User> {
        Client::me(self).await
    }

    async fn set_avatar(&self, data_uri: &str) -> Result<Avatar> {
        Client::set_avatar(self, data_uri).await
    }

    async fn delete_avatar(&self) -> Result<()> {
        Client::delete_avatar(self).await
    }

    async fn list_references(&self, kind: EntityKind) -> Result<Vec<ReferenceRecord>> {
        Ok(self.references(kind, None, None).await?.into_items())
    }

    async fn create_reference(&self, kind: EntityKind, fields: &Map<String, Value>) -> Result<()> {
        Client::create_reference(self, kind, fields).await.map(|_| ())
    }

    async fn update_reference(
        &self,
        kind: EntityKind,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        Client::update_reference(self, kind, id, fields)
            .await
            .map(|_| ())
    }

    async fn delete_reference(&self, kind: EntityKind, id: i64) -> Result<()> {
        Client::delete_reference(self, kind, id).await
    }

    async fn statuses(&self) -> Result<Vec<Status>> {
        Ok(self
            .references_as(EntityKind::Status, None, None)
            .await?
            .into_items())
    }

    async fn types(&self) -> Result<Vec<Type>> {
        Ok(self
            .references_as(EntityKind::Type, None, None)
            .await?
            .into_items())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .references_as(EntityKind::Category, None, None)
            .await?
            .into_items())
    }

    async fn subcategories(&self) -> Result<Vec<Subcategory>> {
        Ok(self
            .references_as(EntityKind::Subcategory, None, None)
            .await?
            .into_items())
    }

    async fn money_flows(
        &self,
        page: u32,
        filter: &MoneyFlowFilter,
    ) -> Result<ListResponse<MoneyFlow>> {
        Client::money_flows(self, Some(page), filter).await
    }

    async fn money_flow(&self, id: i64) -> Result<MoneyFlow> {
        Client::money_flow(self, id).await
    }

    async fn create_money_flow(&self, payload: &MoneyFlowWrite) -> Result<()> {
        Client::create_money_flow(self, payload).await.map(|_| ())
    }

    async fn update_money_flow(&self, id: i64, payload: &MoneyFlowWrite) -> Result<()> {
        Client::update_money_flow(self, id, payload)
            .await
            .map(|_| ())
    }

    async fn delete_money_flow(&self, id: i64) -> Result<()> {
        Client::delete_money_flow(self, id).await
    }
}
