//! Storage behind the services. Every entity has a [`Crud`]
//! repository, a few have extra lookups. Handlers only ever see
//! the traits so tests can swap Postgres for [`memory`].
use async_trait::async_trait;
use std::sync::Arc;

use crate::database::{self, Result};
use crate::schema::{
    Center, Consultation, ConsultationFilter, Doctor, Employee, Record, Specialty, User,
};
use crate::types::id::{Id, UserId};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait Crud<R: Record>: Send + Sync {
    async fn create(&self, new: R::New) -> Result<R>;

    async fn find_all(&self) -> Result<Vec<R>>;

    async fn find(&self, id: Id<R::Marker>) -> Result<Option<R>>;

    /// Overwrites every mutable column of the row with the same id.
    /// Returns `None` if the row no longer exists.
    async fn update(&self, row: &R) -> Result<Option<R>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Id<R::Marker>) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Crud<User> {
    async fn by_username(&self, username: &str) -> Result<Option<User>>;

    async fn by_email(&self, email: &str) -> Result<Option<User>>;

    async fn any_admin(&self) -> Result<bool>;
}

#[async_trait]
pub trait DoctorRepository: Crud<Doctor> {
    async fn by_license(&self, license_number: &str) -> Result<Option<Doctor>>;

    async fn by_linked_user(&self, user_id: UserId) -> Result<Option<Doctor>>;
}

#[async_trait]
pub trait EmployeeRepository: Crud<Employee> {
    async fn by_license(&self, license_number: &str) -> Result<Option<Employee>>;
}

#[async_trait]
pub trait ConsultationRepository: Crud<Consultation> {
    async fn find_matching(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>>;
}

/// Repositories of the admin service.
#[derive(Clone)]
pub struct AdminRepositories {
    pub centers: Arc<dyn Crud<Center>>,
    pub specialties: Arc<dyn Crud<Specialty>>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub doctors: Arc<dyn DoctorRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl AdminRepositories {
    #[must_use]
    pub fn postgres(pool: database::Pool) -> Self {
        let repo = Arc::new(postgres::PgRepository::new(pool));
        Self {
            centers: repo.clone(),
            specialties: repo.clone(),
            employees: repo.clone(),
            doctors: repo.clone(),
            users: repo,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            centers: Arc::new(memory::Table::<Center>::new()),
            specialties: Arc::new(memory::Table::<Specialty>::new()),
            employees: Arc::new(memory::Table::<Employee>::new()),
            doctors: Arc::new(memory::Table::<Doctor>::new()),
            users: Arc::new(memory::Table::<User>::new()),
        }
    }
}

/// Repositories of the consultations service.
#[derive(Clone)]
pub struct ConsultasRepositories {
    pub consultations: Arc<dyn ConsultationRepository>,
}

impl ConsultasRepositories {
    #[must_use]
    pub fn postgres(pool: database::Pool) -> Self {
        Self {
            consultations: Arc::new(postgres::PgRepository::new(pool)),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            consultations: Arc::new(memory::Table::<Consultation>::new()),
        }
    }
}

impl std::fmt::Debug for ConsultasRepositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsultasRepositories").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AdminRepositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminRepositories").finish_non_exhaustive()
    }
}
