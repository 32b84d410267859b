mod amount;

use serde::{Deserialize, Serialize};

pub use amount::{Amount, AmountError};

/// Page envelope returned by every paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A list response that is either paginated or a bare JSON array.
///
/// Some reference endpoints are not paginated; callers should unwrap through
/// [`ListResponse::into_items`] instead of assuming the envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page(Paginated<T>),
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    /// Total number of items on the server (the array length for bare lists).
    pub fn count(&self) -> u64 {
        match self {
            Self::Page(page) => page.count,
            Self::Bare(items) => items.len() as u64,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.results,
            Self::Bare(items) => items,
        }
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SignUp {
        pub email: String,
        pub username: String,
        pub first_name: String,
        pub last_name: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SignIn {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AuthToken {
        pub auth_token: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PasswordReset {
        pub email: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub new_password: String,
        pub current_password: String,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct User {
        pub id: i64,
        pub email: String,
        pub username: String,
        #[serde(default)]
        pub first_name: String,
        #[serde(default)]
        pub last_name: String,
        /// URL of the stored avatar, if any.
        #[serde(default)]
        pub avatar: Option<String>,
    }

    /// Avatar upload body; `avatar` is a `data:image/...;base64,` URI.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Avatar {
        pub avatar: Option<String>,
    }
}

pub mod reference {
    use serde_json::{Map, Value};

    use super::*;

    /// The four user-owned lookup tables.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntityKind {
        Status,
        Type,
        Category,
        Subcategory,
    }

    impl EntityKind {
        /// Plural collection segment used in endpoint paths.
        pub fn collection(self) -> &'static str {
            match self {
                Self::Status => "statuses",
                Self::Type => "types",
                Self::Category => "categories",
                Self::Subcategory => "subcategories",
            }
        }

        /// The collection this kind points to, with the name of the foreign key field.
        pub fn parent(self) -> Option<(&'static str, EntityKind)> {
            match self {
                Self::Status | Self::Type => None,
                Self::Category => Some(("type", Self::Type)),
                Self::Subcategory => Some(("category", Self::Category)),
            }
        }
    }

    /// Anything with an id and a display name.
    pub trait Named {
        fn id(&self) -> i64;
        fn name(&self) -> &str;
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Status {
        pub id: i64,
        pub name: String,
        #[serde(default)]
        pub description: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Type {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        pub name: String,
        #[serde(rename = "type")]
        pub type_id: i64,
        #[serde(default)]
        pub type_name: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Subcategory {
        pub id: i64,
        pub name: String,
        #[serde(rename = "category")]
        pub category_id: i64,
        #[serde(default)]
        pub category_name: Option<String>,
    }

    macro_rules! impl_named {
        ($($ty:ty),+) => {
            $(impl Named for $ty {
                fn id(&self) -> i64 {
                    self.id
                }

                fn name(&self) -> &str {
                    &self.name
                }
            })+
        };
    }

    impl_named!(Status, Type, Category, Subcategory);

    /// Schema-less view of any reference entity.
    ///
    /// Used by screens that are driven by a field schema rather than a
    /// concrete type: every column other than `id` lives in `fields`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReferenceRecord {
        pub id: i64,
        #[serde(flatten)]
        pub fields: Map<String, Value>,
    }

    impl ReferenceRecord {
        /// Field value rendered as plain text (`""` when missing or null).
        pub fn text(&self, field: &str) -> String {
            match self.fields.get(field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
            }
        }

        /// Field value read as a foreign id; numeric strings are coerced.
        pub fn foreign_id(&self, field: &str) -> Option<i64> {
            match self.fields.get(field)? {
                Value::Number(number) => number.as_i64(),
                Value::String(text) => text.trim().parse().ok(),
                _ => None,
            }
        }
    }

    impl Named for ReferenceRecord {
        fn id(&self) -> i64 {
            self.id
        }

        fn name(&self) -> &str {
            self.fields
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
        }
    }
}

pub mod money_flow {
    use chrono::NaiveDate;

    use super::{
        reference::{Category, Status, Subcategory, Type},
        *,
    };

    /// A money flow as returned by the backend, with nested references.
    ///
    /// References are optional: the backend sends `null` when the row points
    /// to something that no longer exists.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct MoneyFlow {
        pub id: i64,
        pub created_at: NaiveDate,
        #[serde(default)]
        pub status: Option<Status>,
        #[serde(rename = "type", default)]
        pub flow_type: Option<Type>,
        #[serde(default)]
        pub category: Option<Category>,
        #[serde(default)]
        pub subcategory: Option<Subcategory>,
        pub amount: Amount,
        #[serde(default)]
        pub comment: String,
    }

    /// Create/update body: references are sent as ids.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct MoneyFlowWrite {
        pub created_at: NaiveDate,
        pub status: i64,
        #[serde(rename = "type")]
        pub flow_type: i64,
        pub category: i64,
        pub subcategory: i64,
        pub amount: Amount,
        pub comment: String,
    }

    /// List filters. Text filters match names on the server side.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MoneyFlowFilter {
        pub status: Option<String>,
        #[serde(rename = "type")]
        pub flow_type: Option<String>,
        pub category: Option<String>,
        pub subcategory: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }
}
