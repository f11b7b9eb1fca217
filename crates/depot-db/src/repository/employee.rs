//! # Employee Repository
//!
//! Staff records, login credentials and per-employee database logins.
//!
//! Must be used through the provisioning pool: `password_hash` is not
//! readable by either role group, and the login-management functions are
//! executable by the schema owner only.
//!
//! ```text
//! provision()   ──► INSERT employee ──► provision_login(email, pw, role)
//! update()      ──► UPDATE employee ──► rotate_login_password (optional)
//! deprovision() ──► DELETE employee ──► drop_login(email)
//!                   └────────── one transaction each ──────────┘
//! ```

use depot_core::search::{like_pattern, EmployeeFilter};
use depot_core::validation::{
    validate_employee_update, validate_id, validate_new_employee, validate_password,
};
use depot_core::{Credentials, Employee, EmployeeUpdate, NewEmployee};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const EMPLOYEE_SELECT: &str = "SELECT e.employee_id, e.first_name, e.last_name, e.middle_name, \
            e.phone_number, e.email, e.hire_date, e.dismissal_date, \
            e.position_id, p.position_name, e.db_role \
     FROM employee e \
     LEFT JOIN position p ON p.position_id = e.position_id";

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password for storage (argon2id, random salt).
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn fetch_employee(conn: &mut PgConnection, employee_id: i64) -> DbResult<Employee> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE e.employee_id = $1");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Employee", employee_id))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for employee operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        EmployeeRepository { pool }
    }

    /// Gets an employee by ID.
    pub async fn get(&self, employee_id: i64) -> DbResult<Employee> {
        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, employee_id).await
    }

    /// Looks up login material by email. `None` if no such employee.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<Credentials>> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT employee_id, password_hash, db_role FROM employee \
             WHERE email = $1 AND dismissal_date IS NULL",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        debug!(email, found = credentials.is_some(), "Credential lookup");
        Ok(credentials)
    }

    /// Lists employees ascending by id.
    pub async fn list(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(EMPLOYEE_SELECT);

        if let EmployeeFilter::Field(field, value) = filter {
            qb.push(" WHERE ")
                .push(field.column())
                .push(" ILIKE ")
                .push_bind(like_pattern(value));
        }

        qb.push(" ORDER BY e.employee_id ASC");

        let rows = qb
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), ?filter, "Listed employees");
        Ok(rows)
    }

    /// Creates an employee together with their database login.
    ///
    /// The login is named after the email and granted the role group. If
    /// either step fails neither is kept.
    pub async fn provision(&self, employee: &NewEmployee, password: &str) -> DbResult<Employee> {
        validate_new_employee(employee, password)?;
        let password_hash = hash_password(password)?;
        let email = employee.email.trim();

        let mut tx = self.pool.begin().await?;

        let employee_id: i64 = sqlx::query_scalar(
            "INSERT INTO employee \
                 (first_name, last_name, middle_name, phone_number, email, password_hash, \
                  hire_date, position_id, db_role) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, CURRENT_DATE), $8, $9) \
             RETURNING employee_id",
        )
        .bind(employee.first_name.trim())
        .bind(employee.last_name.trim())
        .bind(employee.middle_name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(employee.phone_number.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(email)
        .bind(&password_hash)
        .bind(employee.hire_date)
        .bind(employee.position_id)
        .bind(employee.role.role_name())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("SELECT provision_login($1, $2, $3)")
            .bind(email)
            .bind(password)
            .bind(employee.role.role_name())
            .execute(&mut *tx)
            .await?;

        let created = fetch_employee(&mut tx, employee_id).await?;

        tx.commit().await?;

        info!(employee_id, role = %employee.role, "Employee provisioned");
        Ok(created)
    }

    /// Replaces an employee's personal data and optionally their password.
    pub async fn update(
        &self,
        employee_id: i64,
        update: &EmployeeUpdate,
        new_password: Option<&str>,
    ) -> DbResult<Employee> {
        validate_id("id", employee_id)?;
        validate_employee_update(update)?;
        let new_hash = match new_password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let email: String = sqlx::query_scalar(
            "UPDATE employee SET first_name = $2, last_name = $3, middle_name = $4, \
                 phone_number = $5, hire_date = $6, dismissal_date = $7, position_id = $8, \
                 password_hash = COALESCE($9, password_hash) \
             WHERE employee_id = $1 RETURNING email",
        )
        .bind(employee_id)
        .bind(update.first_name.trim())
        .bind(update.last_name.trim())
        .bind(update.middle_name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(update.phone_number.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(update.hire_date)
        .bind(update.dismissal_date)
        .bind(update.position_id)
        .bind(new_hash.as_deref())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Employee", employee_id))?;

        if let Some(password) = new_password {
            sqlx::query("SELECT rotate_login_password($1, $2)")
                .bind(&email)
                .bind(password)
                .execute(&mut *tx)
                .await?;
        }

        let updated = fetch_employee(&mut tx, employee_id).await?;

        tx.commit().await?;

        info!(employee_id, password_rotated = new_password.is_some(), "Employee updated");
        Ok(updated)
    }

    /// Deletes an employee and drops their login.
    ///
    /// Employees referenced by invoices or receipts cannot be deleted
    /// (foreign key); dismiss them through `update` instead.
    pub async fn deprovision(&self, employee_id: i64) -> DbResult<()> {
        validate_id("id", employee_id)?;

        let mut tx = self.pool.begin().await?;

        let email: String =
            sqlx::query_scalar("DELETE FROM employee WHERE employee_id = $1 RETURNING email")
                .bind(employee_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Employee", employee_id))?;

        sqlx::query("SELECT drop_login($1)")
            .bind(&email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(employee_id, "Employee deprovisioned");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong horse battery", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
