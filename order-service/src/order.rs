use chrono::{DateTime, SubsecRound, Utc};
use common_database::{Record, Value};
use http_server::Resource;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Price of one unit of anything, in minor currency units.
pub const UNIT_PRICE: i64 = 1000;

/// `user_id` and `product_id` are not checked against the other services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    #[sqlx(rename = "qty")]
    pub quantity: i32,
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /orders`. Any `total` the client sends is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Price the request and stamp it with the current time.
    pub fn price(request: OrderRequest, now: DateTime<Utc>) -> Result<Self, String> {
        if request.quantity < 0 {
            return Err("quantity must not be negative".to_owned());
        }

        Ok(NewOrder {
            user_id: request.user_id,
            product_id: request.product_id,
            quantity: request.quantity,
            total: i64::from(request.quantity) * UNIT_PRICE,
            // Postgres keeps microseconds; truncate so a read returns what create did.
            created_at: now.trunc_subsecs(6),
        })
    }
}

impl Record for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "product_id", "qty", "total", "created_at"];
    type New = NewOrder;

    fn insert_values(new: &NewOrder) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::Int(new.user_id)),
            ("product_id", Value::Int(new.product_id)),
            ("qty", Value::Int(i64::from(new.quantity))),
            ("total", Value::Int(new.total)),
            ("created_at", Value::Timestamp(new.created_at)),
        ]
    }

    fn from_new(id: i64, new: NewOrder) -> Self {
        Order {
            id,
            user_id: new.user_id,
            product_id: new.product_id,
            quantity: new.quantity,
            total: new.total,
            created_at: Some(new.created_at),
        }
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Resource for Order {
    const PATH: &'static str = "orders";
    type Payload = OrderRequest;

    fn prepare(request: OrderRequest) -> Result<NewOrder, String> {
        NewOrder::price(request, Utc::now())
    }
}
