//! Sales order repository
//!
//! Payment terms are stored as a code plus the day count, so custom terms
//! survive the round trip.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sf_core::traits::Id;
use sf_models::{PaymentTerms, SalesOrder};
use sqlx::{FromRow, PgPool};

use super::require_id;
use crate::repository::{Repository, RepositoryError, RepositoryResult, SalesOrderRepository};

const COLUMNS: &str = "id, order_number, project_id, customer_po_number, order_date, \
                       payment_terms, payment_terms_days, contract_value, document_ref, \
                       created_by, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct SalesOrderRow {
    pub id: i64,
    pub order_number: String,
    pub project_id: i64,
    pub customer_po_number: String,
    pub order_date: NaiveDate,
    pub payment_terms: String,
    pub payment_terms_days: i32,
    pub contract_value: f64,
    pub document_ref: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

fn terms_code(terms: &PaymentTerms) -> &'static str {
    match terms {
        PaymentTerms::DueOnReceipt => "DUE_ON_RECEIPT",
        PaymentTerms::Net15 => "NET_15",
        PaymentTerms::Net30 => "NET_30",
        PaymentTerms::Net45 => "NET_45",
        PaymentTerms::Net60 => "NET_60",
        PaymentTerms::Net90 => "NET_90",
        PaymentTerms::Custom { .. } => "CUSTOM",
    }
}

fn terms_from_columns(code: &str, days: i32) -> Result<PaymentTerms, RepositoryError> {
    let terms = match code {
        "DUE_ON_RECEIPT" => PaymentTerms::DueOnReceipt,
        "NET_15" => PaymentTerms::Net15,
        "NET_30" => PaymentTerms::Net30,
        "NET_45" => PaymentTerms::Net45,
        "NET_60" => PaymentTerms::Net60,
        "NET_90" => PaymentTerms::Net90,
        "CUSTOM" => {
            let days = u16::try_from(days).map_err(|_| {
                RepositoryError::InvalidData(format!("sales_orders.payment_terms_days: {days}"))
            })?;
            PaymentTerms::Custom { days }
        }
        other => {
            return Err(RepositoryError::InvalidData(format!(
                "sales_orders.payment_terms: {other}"
            )))
        }
    };
    Ok(terms)
}

impl TryFrom<SalesOrderRow> for SalesOrder {
    type Error = RepositoryError;

    fn try_from(row: SalesOrderRow) -> Result<Self, Self::Error> {
        Ok(SalesOrder {
            id: Some(row.id),
            order_number: row.order_number,
            project_id: row.project_id,
            customer_po_number: row.customer_po_number,
            order_date: row.order_date,
            payment_terms: terms_from_columns(&row.payment_terms, row.payment_terms_days)?,
            contract_value: row.contract_value,
            document_ref: row.document_ref,
            created_by: row.created_by,
            created_at: Some(row.created_at),
        })
    }
}

pub struct PgSalesOrderRepository {
    pool: PgPool,
}

impl PgSalesOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<SalesOrder> for PgSalesOrderRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<SalesOrder>> {
        let row = sqlx::query_as::<_, SalesOrderRow>(&format!(
            "SELECT {COLUMNS} FROM sales_orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SalesOrder::try_from).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<SalesOrder>> {
        let rows = sqlx::query_as::<_, SalesOrderRow>(&format!(
            "SELECT {COLUMNS} FROM sales_orders ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SalesOrder::try_from).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales_orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, order: SalesOrder) -> RepositoryResult<SalesOrder> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT nextval(pg_get_serial_sequence('sales_orders', 'id'))",
        )
        .fetch_one(&self.pool)
        .await?;
        let order_number = SalesOrder::format_number(order.order_date, id);

        let row = sqlx::query_as::<_, SalesOrderRow>(&format!(
            r#"
            INSERT INTO sales_orders (
                id, order_number, project_id, customer_po_number, order_date,
                payment_terms, payment_terms_days, contract_value, document_ref,
                created_by, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&order_number)
        .bind(order.project_id)
        .bind(&order.customer_po_number)
        .bind(order.order_date)
        .bind(terms_code(&order.payment_terms))
        .bind(i32::from(order.payment_terms_days()))
        .bind(order.contract_value)
        .bind(&order.document_ref)
        .bind(order.created_by)
        .fetch_one(&self.pool)
        .await?;

        SalesOrder::try_from(row)
    }

    async fn update(&self, order: SalesOrder) -> RepositoryResult<SalesOrder> {
        let id = require_id(order.id, "SalesOrder")?;
        let row = sqlx::query_as::<_, SalesOrderRow>(&format!(
            r#"
            UPDATE sales_orders SET
                customer_po_number = $1,
                order_date = $2,
                payment_terms = $3,
                payment_terms_days = $4,
                contract_value = $5,
                document_ref = $6
            WHERE id = $7
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&order.customer_po_number)
        .bind(order.order_date)
        .bind(terms_code(&order.payment_terms))
        .bind(i32::from(order.payment_terms_days()))
        .bind(order.contract_value)
        .bind(&order.document_ref)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("SalesOrder with id {} not found", id)))?;

        SalesOrder::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM sales_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "SalesOrder with id {} not found",
                id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl SalesOrderRepository for PgSalesOrderRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Option<SalesOrder>> {
        let row = sqlx::query_as::<_, SalesOrderRow>(&format!(
            "SELECT {COLUMNS} FROM sales_orders WHERE project_id = $1"
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SalesOrder::try_from).transpose()
    }
}
