use serde_json::Value;
use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgExecutor, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData, SqlResult};

pub struct QueryBuilder<T> {
    table_name: String,
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let table_name = table_name.into();
        let filter = Filter::new(&table_name)?;
        Ok(Self {
            table_name,
            filter,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all<'e, E>(&self, executor: E) -> Result<Vec<T>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql_result = self.filter.to_sql()?;
        tracing::debug!(table = %self.table_name, sql = %sql_result.query, "select");
        let rows = bind_all(sqlx::query_as::<_, T>(&sql_result.query), &sql_result)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Total rows matching the predicate, ignoring order and window
    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql_result = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(executor).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

fn bind_all<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    sql_result: &'q SqlResult,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for p in sql_result.params.iter() {
        q = bind_param_query_as(q, p);
    }
    q
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Arrays are expanded into scalar params by FilterWhere
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
