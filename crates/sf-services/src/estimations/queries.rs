//! Estimation lookups

use sf_contracts::base::{require_permission, UserContext};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_models::{permissions, Estimation};

use crate::base::ServiceContext;
use crate::result::ServiceResult;

pub struct EstimationQueries<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> EstimationQueries<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    /// All versions of a project's estimation, oldest first
    pub async fn list(&self, project_id: Id) -> ServiceResult<Vec<Estimation>> {
        self.load_for_project(project_id).await.into()
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Estimation> {
        self.load(id).await.into()
    }

    fn authorize(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_PIPELINE, "view estimations", &mut errors);
        errors.into_result()
    }

    async fn load_for_project(&self, project_id: Id) -> Result<Vec<Estimation>, ValidationErrors> {
        self.authorize()?;
        self.ctx.find_project(project_id).await?;
        Ok(self.ctx.stores.estimations.find_by_project(project_id).await?)
    }

    async fn load(&self, id: Id) -> Result<Estimation, ValidationErrors> {
        self.authorize()?;
        self.ctx.find_estimation(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_estimation, seed_project, MockUser};
    use sf_core::error::FailureKind;
    use sf_models::{EstimationStatus, PipelineStage};

    #[tokio::test]
    async fn test_list_by_project() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let other = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Pending).await;
        seed_estimation(&ctx, &other, EstimationStatus::Pending).await;
        let user = MockUser::engineer();
        let queries = EstimationQueries::new(&ctx, &user);

        let listed = queries.list(project.id.unwrap()).await;
        assert_eq!(listed.result().unwrap().len(), 1);
        assert_eq!(
            queries.get(estimation.id.unwrap()).await.result().unwrap().version,
            1
        );
        assert_eq!(queries.list(999).await.errors().kind, FailureKind::NotFound);
    }
}
