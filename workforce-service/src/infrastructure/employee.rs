use async_trait::async_trait;
use shared::types::Employee;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::employee::{CreateEmployee, EmployeeRepository, UpdateEmployee},
    error::WorkforceServiceError,
};

const COLUMNS: &str = "id, store_id, first_name, last_name, hire_date, status, created_at, updated_at";

pub struct PgEmployeeRepository {
    pool: PgPool,
}

impl PgEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(
        &self,
        store_id: Option<Uuid>,
    ) -> Result<Vec<Employee>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT {COLUMNS} FROM employees
            WHERE $1::uuid IS NULL OR store_id = $1
            ORDER BY last_name, first_name
            "#
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, employee: CreateEmployee) -> Result<Employee, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (store_id, first_name, last_name, hire_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(employee.store_id)
        .bind(employee.first_name)
        .bind(employee.last_name)
        .bind(employee.hire_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: Uuid,
        employee: UpdateEmployee,
    ) -> Result<Employee, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                status = COALESCE($4, status),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(employee.first_name)
        .bind(employee.last_name)
        .bind(employee.status)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| WorkforceServiceError::NotFound("Employee not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn deactivate(&self, id: Uuid) -> Result<(), WorkforceServiceError> {
        let output = sqlx::query(
            r#"
            UPDATE employees
            SET status = 'INACTIVE', updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if output.rows_affected() == 0 {
            return Err(WorkforceServiceError::NotFound(
                "Employee not found".to_string(),
            ));
        }

        Ok(())
    }
}
