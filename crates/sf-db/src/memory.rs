//! In-memory stores
//!
//! Used when no database is configured, and by service tests. All tables
//! live in one [`MemoryDb`] so the stores can enforce the same references
//! and unique keys as the PostgreSQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sf_core::traits::Id;
use sf_models::{
    DiscountPolicy, Entity, Estimation, Project, Quotation, Role, SalesOrder, UserAccount,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::repository::{
    DiscountPolicyRepository, EstimationRepository, ProjectRepository, QuotationRepository,
    Repository, RepositoryError, RepositoryResult, SalesOrderRepository, UserRepository,
};

/// Storage hooks each in-memory row type provides
trait Record: Entity + Clone {
    fn assign_id(&mut self, id: Id, now: DateTime<Utc>);
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

impl Record for Project {
    fn assign_id(&mut self, id: Id, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl Record for Estimation {
    fn assign_id(&mut self, id: Id, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl Record for Quotation {
    fn assign_id(&mut self, id: Id, _now: DateTime<Utc>) {
        self.id = Some(id);
        self.number = Quotation::format_number(self.generated_at, id);
    }
}

impl Record for SalesOrder {
    fn assign_id(&mut self, id: Id, now: DateTime<Utc>) {
        self.id = Some(id);
        self.order_number = SalesOrder::format_number(self.order_date, id);
        self.created_at = Some(now);
    }
}

impl Record for UserAccount {
    fn assign_id(&mut self, id: Id, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

struct Table<T> {
    rows: RwLock<BTreeMap<Id, T>>,
    next_id: AtomicI64,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn find(&self, id: Id) -> Option<T> {
        self.rows.read().get(&id).cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows.read().values().cloned().collect()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.read().values().filter(|r| pred(r)).cloned().collect()
    }

    fn count(&self) -> i64 {
        self.rows.read().len() as i64
    }

    /// Insert after `check` passes against the locked rows
    fn insert_checked(
        &self,
        mut row: T,
        check: impl Fn(&BTreeMap<Id, T>, &T) -> RepositoryResult<()>,
    ) -> RepositoryResult<T> {
        let mut rows = self.rows.write();
        check(&rows, &row)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        row.assign_id(id, Utc::now());
        rows.insert(id, row.clone());
        Ok(row)
    }

    fn replace_checked(
        &self,
        mut row: T,
        check: impl Fn(&BTreeMap<Id, T>, &T) -> RepositoryResult<()>,
    ) -> RepositoryResult<T> {
        let id = row
            .id()
            .ok_or_else(|| RepositoryError::Validation(format!("{} has no id", T::TYPE_NAME)))?;
        let mut rows = self.rows.write();
        if !rows.contains_key(&id) {
            return Err(not_found::<T>(id));
        }
        check(&rows, &row)?;
        row.touch(Utc::now());
        rows.insert(id, row.clone());
        Ok(row)
    }

    fn remove(&self, id: Id) -> RepositoryResult<()> {
        self.rows
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found::<T>(id))
    }
}

fn not_found<T: Entity>(id: Id) -> RepositoryError {
    RepositoryError::NotFound(format!("{} with id {} not found", T::TYPE_NAME, id))
}

fn no_check<T>(_rows: &BTreeMap<Id, T>, _row: &T) -> RepositoryResult<()> {
    Ok(())
}

/// Every in-memory table
pub struct MemoryDb {
    projects: Table<Project>,
    estimations: Table<Estimation>,
    quotations: Table<Quotation>,
    sales_orders: Table<SalesOrder>,
    users: Table<UserAccount>,
    policies: RwLock<BTreeMap<Role, DiscountPolicy>>,
}

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            projects: Table::new(),
            estimations: Table::new(),
            quotations: Table::new(),
            sales_orders: Table::new(),
            users: Table::new(),
            policies: RwLock::new(BTreeMap::new()),
        })
    }

    fn require_project(&self, project_id: Id) -> RepositoryResult<()> {
        if self.projects.rows.read().contains_key(&project_id) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(format!(
                "Project with id {project_id} does not exist"
            )))
        }
    }

    fn project_has_dependents(&self, project_id: Id) -> bool {
        self.estimations.rows.read().values().any(|e| e.project_id == project_id)
            || self.quotations.rows.read().values().any(|q| q.project_id == project_id)
            || self.sales_orders.rows.read().values().any(|o| o.project_id == project_id)
    }
}

macro_rules! delegate_repository {
    ($store:ident, $model:ty, $table:ident, $create_check:expr, $update_check:expr) => {
        #[async_trait]
        impl Repository<$model> for $store {
            async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<$model>> {
                Ok(self.db.$table.find(id))
            }

            async fn find_all(&self) -> RepositoryResult<Vec<$model>> {
                Ok(self.db.$table.all())
            }

            async fn count(&self) -> RepositoryResult<i64> {
                Ok(self.db.$table.count())
            }

            async fn create(&self, entity: $model) -> RepositoryResult<$model> {
                self.before_create(&entity)?;
                self.db.$table.insert_checked(entity, $create_check)
            }

            async fn update(&self, entity: $model) -> RepositoryResult<$model> {
                self.db.$table.replace_checked(entity, $update_check)
            }

            async fn delete(&self, id: Id) -> RepositoryResult<()> {
                self.before_delete(id)?;
                self.db.$table.remove(id)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub struct MemoryProjectRepository {
    db: Arc<MemoryDb>,
}

impl MemoryProjectRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn before_create(&self, _project: &Project) -> RepositoryResult<()> {
        Ok(())
    }

    fn before_delete(&self, id: Id) -> RepositoryResult<()> {
        if self.db.project_has_dependents(id) {
            return Err(RepositoryError::Conflict(format!(
                "Project with id {id} has estimations, quotations or orders"
            )));
        }
        Ok(())
    }
}

delegate_repository!(MemoryProjectRepository, Project, projects, no_check, no_check);

impl ProjectRepository for MemoryProjectRepository {}

// ---------------------------------------------------------------------------
// Estimations
// ---------------------------------------------------------------------------

fn check_estimation(rows: &BTreeMap<Id, Estimation>, row: &Estimation) -> RepositoryResult<()> {
    let others = rows.values().filter(|e| e.project_id == row.project_id && e.id != row.id);
    for other in others {
        if other.version == row.version {
            return Err(RepositoryError::Conflict(format!(
                "Estimation version {} already exists for project {}",
                row.version, row.project_id
            )));
        }
        if other.status.is_active() && row.status.is_active() {
            return Err(RepositoryError::Conflict(format!(
                "Project {} already has an active estimation",
                row.project_id
            )));
        }
    }
    Ok(())
}

pub struct MemoryEstimationRepository {
    db: Arc<MemoryDb>,
}

impl MemoryEstimationRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn before_create(&self, estimation: &Estimation) -> RepositoryResult<()> {
        self.db.require_project(estimation.project_id)
    }

    fn before_delete(&self, id: Id) -> RepositoryResult<()> {
        if self.db.quotations.rows.read().values().any(|q| q.estimation_id == id) {
            return Err(RepositoryError::Conflict(format!(
                "Estimation with id {id} has quotations"
            )));
        }
        Ok(())
    }
}

delegate_repository!(
    MemoryEstimationRepository,
    Estimation,
    estimations,
    check_estimation,
    check_estimation
);

#[async_trait]
impl EstimationRepository for MemoryEstimationRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Estimation>> {
        let mut rows = self.db.estimations.filter(|e| e.project_id == project_id);
        rows.sort_by_key(|e| e.version);
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Quotations
// ---------------------------------------------------------------------------

pub struct MemoryQuotationRepository {
    db: Arc<MemoryDb>,
}

impl MemoryQuotationRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn before_create(&self, quotation: &Quotation) -> RepositoryResult<()> {
        self.db.require_project(quotation.project_id)?;
        if self.db.estimations.find(quotation.estimation_id).is_none() {
            return Err(RepositoryError::Conflict(format!(
                "Estimation with id {} does not exist",
                quotation.estimation_id
            )));
        }
        Ok(())
    }

    fn before_delete(&self, _id: Id) -> RepositoryResult<()> {
        Ok(())
    }
}

delegate_repository!(MemoryQuotationRepository, Quotation, quotations, no_check, no_check);

#[async_trait]
impl QuotationRepository for MemoryQuotationRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Quotation>> {
        Ok(self.db.quotations.filter(|q| q.project_id == project_id))
    }
}

// ---------------------------------------------------------------------------
// Sales orders
// ---------------------------------------------------------------------------

fn check_sales_order(rows: &BTreeMap<Id, SalesOrder>, row: &SalesOrder) -> RepositoryResult<()> {
    if rows
        .values()
        .any(|o| o.project_id == row.project_id && o.id != row.id)
    {
        return Err(RepositoryError::Conflict(format!(
            "Project {} already has a sales order",
            row.project_id
        )));
    }
    Ok(())
}

pub struct MemorySalesOrderRepository {
    db: Arc<MemoryDb>,
}

impl MemorySalesOrderRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn before_create(&self, order: &SalesOrder) -> RepositoryResult<()> {
        self.db.require_project(order.project_id)
    }

    fn before_delete(&self, _id: Id) -> RepositoryResult<()> {
        Ok(())
    }
}

delegate_repository!(
    MemorySalesOrderRepository,
    SalesOrder,
    sales_orders,
    check_sales_order,
    check_sales_order
);

#[async_trait]
impl SalesOrderRepository for MemorySalesOrderRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Option<SalesOrder>> {
        Ok(self
            .db
            .sales_orders
            .filter(|o| o.project_id == project_id)
            .into_iter()
            .next())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn check_login(rows: &BTreeMap<Id, UserAccount>, row: &UserAccount) -> RepositoryResult<()> {
    if rows.values().any(|u| u.login == row.login && u.id != row.id) {
        return Err(RepositoryError::Conflict(format!(
            "Login {} is already taken",
            row.login
        )));
    }
    Ok(())
}

pub struct MemoryUserRepository {
    db: Arc<MemoryDb>,
}

impl MemoryUserRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn before_create(&self, _user: &UserAccount) -> RepositoryResult<()> {
        Ok(())
    }

    fn before_delete(&self, _id: Id) -> RepositoryResult<()> {
        Ok(())
    }
}

delegate_repository!(MemoryUserRepository, UserAccount, users, check_login, check_login);

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<UserAccount>> {
        Ok(self.db.users.filter(|u| u.login == login).into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Discount policies
// ---------------------------------------------------------------------------

pub struct MemoryDiscountPolicyRepository {
    db: Arc<MemoryDb>,
}

impl MemoryDiscountPolicyRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DiscountPolicyRepository for MemoryDiscountPolicyRepository {
    async fn find_by_role(&self, role: Role) -> RepositoryResult<Option<DiscountPolicy>> {
        Ok(self.db.policies.read().get(&role).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<DiscountPolicy>> {
        Ok(self.db.policies.read().values().cloned().collect())
    }

    async fn upsert(&self, mut policy: DiscountPolicy) -> RepositoryResult<DiscountPolicy> {
        policy.updated_at = Some(Utc::now());
        self.db.policies.write().insert(policy.role, policy.clone());
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_models::{EstimationStatus, PipelineStage};

    fn project() -> Project {
        Project::new("Boiler retrofit", "Stadtwerke", 1, PipelineStage::PreSales)
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_timestamps() {
        let db = MemoryDb::new();
        let repo = MemoryProjectRepository::new(db);
        let first = repo.create(project()).await.unwrap();
        let second = repo.create(project()).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert!(first.created_at.is_some());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = MemoryProjectRepository::new(MemoryDb::new());
        let mut ghost = project();
        ghost.id = Some(99);
        assert!(matches!(
            repo.update(ghost).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_project_with_estimation_cannot_be_deleted() {
        let db = MemoryDb::new();
        let projects = MemoryProjectRepository::new(db.clone());
        let estimations = MemoryEstimationRepository::new(db);

        let project = projects.create(project()).await.unwrap();
        let id = project.id.unwrap();
        estimations
            .create(Estimation::new(id, 1, "Brief", 1))
            .await
            .unwrap();

        assert!(matches!(
            projects.delete(id).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(projects.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_one_active_estimation_per_project() {
        let db = MemoryDb::new();
        let projects = MemoryProjectRepository::new(db.clone());
        let estimations = MemoryEstimationRepository::new(db);
        let id = projects.create(project()).await.unwrap().id.unwrap();

        let mut first = estimations
            .create(Estimation::new(id, 1, "Brief", 1))
            .await
            .unwrap();
        assert!(matches!(
            estimations.create(Estimation::new(id, 2, "Again", 1)).await,
            Err(RepositoryError::Conflict(_))
        ));

        first.status = EstimationStatus::Rejected;
        estimations.update(first).await.unwrap();
        estimations
            .create(Estimation::new(id, 2, "Again", 1))
            .await
            .unwrap();

        let versions: Vec<i32> = estimations
            .find_by_project(id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.version)
            .collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_login_is_unique() {
        let repo = MemoryUserRepository::new(MemoryDb::new());
        repo.create(UserAccount::new("ceo", "ceo@example.com", vec![Role::Ceo]))
            .await
            .unwrap();
        assert!(matches!(
            repo.create(UserAccount::new("ceo", "other@example.com", vec![]))
                .await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(repo.find_by_login("ceo").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_policy_upsert_replaces() {
        let repo = MemoryDiscountPolicyRepository::new(MemoryDb::new());
        repo.upsert(DiscountPolicy::new(Role::Sales, 5.0, 10.0)).await.unwrap();
        repo.upsert(DiscountPolicy::new(Role::Sales, 10.0, 20.0)).await.unwrap();

        let policy = repo.find_by_role(Role::Sales).await.unwrap().unwrap();
        assert_eq!(policy.authority_limit, 10.0);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }
}
