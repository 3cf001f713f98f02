//! Fixtures shared by the service tests

use std::sync::Arc;

use async_trait::async_trait;
use sf_contracts::base::UserContext;
use sf_core::traits::Id;
use sf_db::{ProjectRepository, Repository, RepositoryError, RepositoryResult};
use sf_models::{Estimation, EstimationStatus, PipelineStage, Project, Role};

use crate::base::ServiceContext;

pub struct MockUser {
    pub id: Id,
    pub roles: Vec<Role>,
}

impl MockUser {
    pub fn with(id: Id, role: Role) -> Self {
        Self {
            id,
            roles: vec![role],
        }
    }

    pub fn sales() -> Self {
        Self::with(2, Role::Sales)
    }

    pub fn manager() -> Self {
        Self::with(3, Role::SalesManager)
    }

    pub fn engineer() -> Self {
        Self::with(4, Role::Engineering)
    }

    pub fn ceo() -> Self {
        Self::with(5, Role::Ceo)
    }

    pub fn finance() -> Self {
        Self::with(6, Role::Finance)
    }

    pub fn admin() -> Self {
        Self::with(1, Role::Admin)
    }
}

impl UserContext for MockUser {
    fn id(&self) -> Id {
        self.id
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }
}

pub async fn seed_project(ctx: &ServiceContext, stage: PipelineStage) -> Project {
    let mut project = Project::new("Plant automation", "Hansa Chemie", 2, stage);
    project.estimated_value = Some(40_000.0);
    ctx.stores.projects.create(project).await.unwrap()
}

pub async fn seed_estimation(
    ctx: &ServiceContext,
    project: &Project,
    status: EstimationStatus,
) -> Estimation {
    let mut estimation = Estimation::new(project.id.unwrap(), 1, "PLC migration, 3 lines", 2);
    estimation.status = status;
    ctx.stores.estimations.create(estimation).await.unwrap()
}

/// Project store whose updates always fail; everything else is delegated
pub struct RefusingProjectUpdates {
    pub inner: Arc<dyn ProjectRepository>,
}

pub const REFUSED_UPDATE: &str = "Project is locked by another session";

#[async_trait]
impl Repository<Project> for RefusingProjectUpdates {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Project>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Project>> {
        self.inner.find_all().await
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.inner.count().await
    }

    async fn create(&self, project: Project) -> RepositoryResult<Project> {
        self.inner.create(project).await
    }

    async fn update(&self, _project: Project) -> RepositoryResult<Project> {
        Err(RepositoryError::Validation(REFUSED_UPDATE.to_string()))
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        self.inner.delete(id).await
    }
}

impl ProjectRepository for RefusingProjectUpdates {}

/// Swap in a project store that refuses every update
pub fn refuse_project_updates(ctx: &mut ServiceContext) {
    let inner = ctx.stores.projects.clone();
    ctx.stores.projects = Arc::new(RefusingProjectUpdates { inner });
}
