use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool, Postgres};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterData, Pagination};

/// Table-scoped reads shared by every entity: filtered lists, paged lists
/// with totals, lookups and deletes by primary key
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    /// Page of rows plus the unpaginated total for the same predicate, read
    /// inside one repeatable-read transaction so both see the same snapshot
    pub async fn select_page(&self, filter_data: FilterData) -> Result<(Vec<T>, i64), DatabaseError> {
        let builder = QueryBuilder::<T>::new(self.table_name)?.filter(filter_data)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;
        let rows = builder.select_all(&mut *tx).await?;
        let total = builder.count(&mut *tx).await?;
        tx.commit().await?;

        Ok((rows, total))
    }

    /// One page under an optional where clause, `order` as in `"name asc"`
    pub async fn list_page(
        &self,
        where_clause: Option<serde_json::Value>,
        order: &str,
        pagination: Pagination,
    ) -> Result<(Vec<T>, i64), DatabaseError> {
        self.select_page(FilterData {
            select: None,
            where_clause,
            order: Some(json!(order)),
            limit: Some(pagination.limit),
            offset: Some(pagination.skip()),
        })
        .await
    }

    pub async fn find_by_id<I>(&self, id: I) -> Result<Option<T>, DatabaseError>
    where
        I: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!("SELECT * FROM \"{}\" WHERE \"id\" = $1", self.table_name);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Like [`Repository::find_by_id`] but absence is an error
    pub async fn find_404<I>(&self, id: I, label: &str) -> Result<T, DatabaseError>
    where
        I: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", label)))
    }

    /// Returns false when no row had the id
    pub async fn delete_by_id<I>(&self, id: I) -> Result<bool, DatabaseError>
    where
        I: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", self.table_name);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists<I>(&self, id: I) -> Result<bool, DatabaseError>
    where
        I: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE \"id\" = $1)", self.table_name);
        let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }
}
