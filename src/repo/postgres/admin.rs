use async_trait::async_trait;

use super::PgRepository;
use crate::database::{ErrorExt, Result};
use crate::repo::{Crud, DoctorRepository, EmployeeRepository, UserRepository};
use crate::schema::{
    Center, Doctor, DoctorDraft, Employee, EmployeeDraft, NewCenter, NewSpecialty, Specialty,
    User, UserDraft,
};
use crate::types::id::{CenterId, DoctorId, EmployeeId, SpecialtyId, UserId};
use crate::types::Role;

#[async_trait]
impl Crud<Center> for PgRepository {
    #[tracing::instrument(name = "db.centers.create", skip_all)]
    async fn create(&self, new: NewCenter) -> Result<Center> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Center>(
            r#"INSERT INTO centers (name, address, city, phone)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(new.name)
        .bind(new.address)
        .bind(new.city)
        .bind(new.phone)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.centers.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<Center>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Center>("SELECT * FROM centers ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.centers.find", skip(self))]
    async fn find(&self, id: CenterId) -> Result<Option<Center>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Center>("SELECT * FROM centers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.centers.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &Center) -> Result<Option<Center>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Center>(
            r#"UPDATE centers
               SET name = $2, address = $3, city = $4, phone = $5
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.address)
        .bind(&row.city)
        .bind(&row.phone)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.centers.delete", skip(self))]
    async fn delete(&self, id: CenterId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM centers WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Crud<Specialty> for PgRepository {
    #[tracing::instrument(name = "db.specialties.create", skip_all)]
    async fn create(&self, new: NewSpecialty) -> Result<Specialty> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Specialty>(
            "INSERT INTO specialties (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(new.name)
        .bind(new.description)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.specialties.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<Specialty>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Specialty>("SELECT * FROM specialties ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.specialties.find", skip(self))]
    async fn find(&self, id: SpecialtyId) -> Result<Option<Specialty>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Specialty>("SELECT * FROM specialties WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.specialties.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &Specialty) -> Result<Option<Specialty>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Specialty>(
            "UPDATE specialties SET name = $2, description = $3 WHERE id = $1 RETURNING *",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.description)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.specialties.delete", skip(self))]
    async fn delete(&self, id: SpecialtyId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM specialties WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Crud<Employee> for PgRepository {
    #[tracing::instrument(name = "db.employees.create", skip_all)]
    async fn create(&self, new: EmployeeDraft) -> Result<Employee> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Employee>(
            r#"INSERT INTO employees (name, license_number, position, center_id)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(new.name)
        .bind(new.license_number)
        .bind(new.position)
        .bind(new.center_id)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.employees.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<Employee>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.employees.find", skip(self))]
    async fn find(&self, id: EmployeeId) -> Result<Option<Employee>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.employees.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &Employee) -> Result<Option<Employee>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Employee>(
            r#"UPDATE employees
               SET name = $2, license_number = $3, position = $4, center_id = $5
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.license_number)
        .bind(&row.position)
        .bind(row.center_id)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.employees.delete", skip(self))]
    async fn delete(&self, id: EmployeeId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EmployeeRepository for PgRepository {
    #[tracing::instrument(name = "db.employees.by_license", skip_all)]
    async fn by_license(&self, license_number: &str) -> Result<Option<Employee>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE license_number = $1")
            .bind(license_number)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }
}

#[async_trait]
impl Crud<Doctor> for PgRepository {
    #[tracing::instrument(name = "db.doctors.create", skip_all)]
    async fn create(&self, new: DoctorDraft) -> Result<Doctor> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>(
            r#"INSERT INTO doctors
                   (name, license_number, phone, specialty_id, center_id, linked_user_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(new.name)
        .bind(new.license_number)
        .bind(new.phone)
        .bind(new.specialty_id)
        .bind(new.center_id)
        .bind(new.linked_user_id)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.doctors.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<Doctor>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.doctors.find", skip(self))]
    async fn find(&self, id: DoctorId) -> Result<Option<Doctor>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.doctors.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &Doctor) -> Result<Option<Doctor>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>(
            r#"UPDATE doctors
               SET name = $2, license_number = $3, phone = $4,
                   specialty_id = $5, center_id = $6, linked_user_id = $7
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.license_number)
        .bind(&row.phone)
        .bind(row.specialty_id)
        .bind(row.center_id)
        .bind(row.linked_user_id)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.doctors.delete", skip(self))]
    async fn delete(&self, id: DoctorId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DoctorRepository for PgRepository {
    #[tracing::instrument(name = "db.doctors.by_license", skip_all)]
    async fn by_license(&self, license_number: &str) -> Result<Option<Doctor>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE license_number = $1")
            .bind(license_number)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.doctors.by_linked_user", skip(self))]
    async fn by_linked_user(&self, user_id: UserId) -> Result<Option<Doctor>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE linked_user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }
}

#[async_trait]
impl Crud<User> for PgRepository {
    #[tracing::instrument(name = "db.users.create", skip_all)]
    async fn create(&self, new: UserDraft) -> Result<User> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, role, center_id, email)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(new.username)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.center_id)
        .bind(new.email)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.users.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<User>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.users.find", skip(self))]
    async fn find(&self, id: UserId) -> Result<Option<User>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.users.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &User) -> Result<Option<User>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET username = $2, password_hash = $3, role = $4, center_id = $5, email = $6
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(row.id)
        .bind(&row.username)
        .bind(&row.password_hash)
        .bind(row.role)
        .bind(row.center_id)
        .bind(&row.email)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.users.delete", skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    #[tracing::instrument(name = "db.users.by_username", skip(self))]
    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.users.by_email", skip_all)]
    async fn by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.users.any_admin", skip_all)]
    async fn any_admin(&self) -> Result<bool> {
        let mut conn = self.conn().await?;
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
            .bind(Role::Admin)
            .fetch_one(&mut *conn)
            .await
            .into_db_error()
    }
}
