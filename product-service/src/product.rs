use common_database::{Record, Value};
use http_server::Resource;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &["id", "name", "price"];
    type New = NewProduct;

    fn insert_values(new: &NewProduct) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(new.name.clone())),
            ("price", Value::Int(new.price)),
        ]
    }

    fn from_new(id: i64, new: NewProduct) -> Self {
        Product {
            id,
            name: new.name,
            price: new.price,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Resource for Product {
    const PATH: &'static str = "products";
    const LISTABLE: bool = true;
    type Payload = NewProduct;

    fn prepare(payload: NewProduct) -> Result<NewProduct, String> {
        if payload.price < 0 {
            return Err("price must not be negative".to_owned());
        }
        Ok(payload)
    }
}
