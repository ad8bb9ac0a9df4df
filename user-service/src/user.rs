use common_database::{Record, Value};
use http_server::Resource;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub age: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub age: i32,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "email", "age"];
    type New = NewUser;

    fn insert_values(new: &NewUser) -> Vec<(&'static str, Value)> {
        vec![
            ("email", Value::Text(new.email.clone())),
            ("age", Value::Int(i64::from(new.age))),
        ]
    }

    fn from_new(id: i64, new: NewUser) -> Self {
        User {
            id,
            email: new.email,
            age: new.age,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Resource for User {
    const PATH: &'static str = "users";
    type Payload = NewUser;

    fn prepare(payload: NewUser) -> Result<NewUser, String> {
        Ok(payload)
    }
}
