use common_database::{Client, PgStore, Record, Store, StoreError, Value};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Widget {
    id: i64,
    label: String,
    weight: i64,
}

#[derive(Debug, Clone)]
struct NewWidget {
    label: String,
    weight: i64,
}

impl Record for Widget {
    const TABLE: &'static str = "widgets";
    const COLUMNS: &'static [&'static str] = &["id", "label", "weight"];
    type New = NewWidget;

    fn insert_values(new: &NewWidget) -> Vec<(&'static str, Value)> {
        vec![
            ("label", Value::Text(new.label.clone())),
            ("weight", Value::Int(new.weight)),
        ]
    }

    fn from_new(id: i64, new: NewWidget) -> Self {
        Widget {
            id,
            label: new.label,
            weight: new.weight,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }
}

async fn create_table(db: &PgPool) {
    sqlx::query(
        "CREATE TABLE widgets (id BIGSERIAL PRIMARY KEY, label TEXT NOT NULL UNIQUE, weight BIGINT NOT NULL)",
    )
    .execute(db)
    .await
    .expect("failed to create widgets table");
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a postgres server at DATABASE_URL"]
async fn insert_then_query(db: PgPool) {
    create_table(&db).await;
    let store = PgStore::from_pool(db);

    let created = Store::<Widget>::insert_returning_id(
        &store,
        NewWidget {
            label: "bolt".to_owned(),
            weight: 12,
        },
    )
    .await
    .unwrap();
    assert!(created.id > 0);

    let fetched = Store::<Widget>::query_one(&store, created.id).await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let missing = Store::<Widget>::query_one(&store, created.id + 100)
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a postgres server at DATABASE_URL"]
async fn listing_is_ordered(db: PgPool) {
    create_table(&db).await;
    let store = PgStore::from_pool(db);

    let empty = Store::<Widget>::query_many(&store).await.unwrap();
    assert!(empty.is_empty());

    for label in ["a", "b", "c"] {
        Store::<Widget>::insert_returning_id(
            &store,
            NewWidget {
                label: label.to_owned(),
                weight: 1,
            },
        )
        .await
        .unwrap();
    }

    let labels: Vec<String> = Store::<Widget>::query_many(&store)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.label)
        .collect();
    assert_eq!(labels, vec!["a", "b", "c"]);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a postgres server at DATABASE_URL"]
async fn duplicate_is_a_constraint_violation(db: PgPool) {
    create_table(&db).await;
    let store = PgStore::from_pool(db);

    let new = || NewWidget {
        label: "unique".to_owned(),
        weight: 1,
    };
    Store::<Widget>::insert_returning_id(&store, new())
        .await
        .unwrap();

    let err = Store::<Widget>::insert_returning_id(&store, new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a postgres server at DATABASE_URL"]
async fn missing_table_is_a_backend_error(db: PgPool) {
    let store = PgStore::from_pool(db);

    let err = Store::<Widget>::query_one(&store, 1).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a postgres server at DATABASE_URL"]
async fn pool_stats_count_checked_out_connections(db: PgPool) {
    let conn = db.acquire().await.expect("failed to acquire connection");

    let stats = db.get_pool_stats().expect("pg pools always report stats");
    assert!(stats.size >= 1);
    assert!((stats.num_idle as u32) < stats.size);

    drop(conn);
}
