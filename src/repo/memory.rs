//! Process-local repositories backed by a `Vec`, used by tests
//! and local experiments.
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ConsultationRepository, Crud, DoctorRepository, EmployeeRepository, UserRepository};
use crate::database::Result;
use crate::schema::{Consultation, ConsultationFilter, Doctor, Employee, Record, User};
use crate::types::id::{Id, UserId};
use crate::types::Role;

#[derive(Debug)]
pub struct Table<R> {
    rows: Mutex<Vec<R>>,
    next_id: AtomicU64,
}

impl<R: Record> Table<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn rows(&self) -> MutexGuard<'_, Vec<R>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_by(&self, predicate: impl Fn(&R) -> bool) -> Option<R> {
        self.rows().iter().find(|row| predicate(row)).cloned()
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> Crud<R> for Table<R> {
    async fn create(&self, new: R::New) -> Result<R> {
        let id = Id::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let row = R::build(id, new, Utc::now());
        self.rows().push(row.clone());
        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<R>> {
        Ok(self.rows().clone())
    }

    async fn find(&self, id: Id<R::Marker>) -> Result<Option<R>> {
        Ok(self.find_by(|row| row.id() == id))
    }

    async fn update(&self, row: &R) -> Result<Option<R>> {
        let mut rows = self.rows();
        let Some(slot) = rows.iter_mut().find(|v| v.id() == row.id()) else {
            return Ok(None);
        };
        *slot = row.clone();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Id<R::Marker>) -> Result<bool> {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl UserRepository for Table<User> {
    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.find_by(|user| user.username == username))
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.find_by(|user| user.email.as_deref() == Some(email)))
    }

    async fn any_admin(&self) -> Result<bool> {
        Ok(self.find_by(|user| user.role == Role::Admin).is_some())
    }
}

#[async_trait]
impl DoctorRepository for Table<Doctor> {
    async fn by_license(&self, license_number: &str) -> Result<Option<Doctor>> {
        Ok(self.find_by(|doctor| doctor.license_number == license_number))
    }

    async fn by_linked_user(&self, user_id: UserId) -> Result<Option<Doctor>> {
        Ok(self.find_by(|doctor| doctor.linked_user_id == Some(user_id)))
    }
}

#[async_trait]
impl EmployeeRepository for Table<Employee> {
    async fn by_license(&self, license_number: &str) -> Result<Option<Employee>> {
        Ok(self.find_by(|employee| employee.license_number == license_number))
    }
}

#[async_trait]
impl ConsultationRepository for Table<Consultation> {
    async fn find_matching(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>> {
        Ok(self
            .rows()
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Center, NewCenter};
    use crate::types::id::CenterId;

    fn new_center(name: &str) -> NewCenter {
        NewCenter {
            name: name.into(),
            address: None,
            city: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let table = Table::<Center>::new();
        let first = table.create(new_center("A")).await.unwrap();
        let second = table.create(new_center("B")).await.unwrap();
        assert_eq!(first.id, CenterId::new(1));
        assert_eq!(second.id, CenterId::new(2));
        assert_eq!(table.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_missing_rows() {
        let table = Table::<Center>::new();
        let mut center = table.create(new_center("A")).await.unwrap();
        center.name = "B".into();
        assert_eq!(table.update(&center).await.unwrap().unwrap().name, "B");

        assert!(table.delete(center.id).await.unwrap());
        assert!(!table.delete(center.id).await.unwrap());
        assert!(table.update(&center).await.unwrap().is_none());
    }
}
