use std::marker::PhantomData;

use async_trait::async_trait;
use dbaas_saga::{ErrorCode, StepFailure, WorkflowStep};
use tracing::debug;

use super::tolerate_not_found;
use crate::context::ProvisionContext;
use crate::error::ProviderError;
use crate::traits::{AccessProvider, DriverParams, RemoteExecutor};
use crate::types::{Instance, ResourceState};

fn instance_params(instance: &Instance) -> DriverParams {
    let mut params = DriverParams::new();
    params.insert("INSTANCE_CONNECTION".to_string(), instance.connection());
    params.insert("INSTANCE_USER".to_string(), instance.user.clone());
    params.insert("INSTANCE_PASSWORD".to_string(), instance.password.clone());
    params
}

fn database_params<E, A>(ctx: &ProvisionContext<E, A>) -> Result<DriverParams, StepFailure> {
    let database = ctx.database.as_ref().ok_or_else(|| {
        StepFailure::new(
            ErrorCode::Unclassified,
            "no database was requested for this run",
        )
    })?;
    let mut params = instance_params(&ctx.instance);
    params.insert("DATABASE_NAME".to_string(), database.name.clone());
    Ok(params)
}

fn credential_params<E, A>(ctx: &ProvisionContext<E, A>) -> Result<DriverParams, StepFailure> {
    let credential = ctx.credential.as_ref().ok_or_else(|| {
        StepFailure::new(
            ErrorCode::Unclassified,
            "no credential was requested for this run",
        )
    })?;
    let mut params = database_params(ctx)?;
    params.insert("CREDENTIAL_USER".to_string(), credential.user.clone());
    params.insert("CREDENTIAL_PASSWORD".to_string(), credential.password.clone());
    Ok(params)
}

async fn run_action<E: RemoteExecutor>(
    executor: &E,
    action: &str,
    params: &DriverParams,
) -> Result<String, ProviderError> {
    debug!(action, "running driver action");
    executor
        .execute(action, params)
        .await
        .map_err(ProviderError::from)
}

/// Run `create` and track how far it got in `state`.
async fn create_resource<E: RemoteExecutor>(
    executor: &E,
    action: &str,
    params: &DriverParams,
    state: &mut Option<ResourceState>,
) -> Result<(), StepFailure> {
    *state = Some(ResourceState::Attempted);
    match run_action(executor, action, params).await {
        Ok(_) => {
            *state = Some(ResourceState::Created);
            Ok(())
        }
        Err(error) => {
            if error.is_already_exists() {
                *state = Some(ResourceState::AlreadyExisted);
            }
            Err(error.into_step_failure(ErrorCode::Unclassified))
        }
    }
}

/// Run `drop` unless the resource was never ours.
async fn drop_resource<E: RemoteExecutor>(
    executor: &E,
    action: &str,
    params: &DriverParams,
    state: &mut Option<ResourceState>,
) -> Result<(), StepFailure> {
    match state {
        None | Some(ResourceState::AlreadyExisted) => {
            debug!(action, "nothing of ours to remove");
            return Ok(());
        }
        Some(ResourceState::Attempted | ResourceState::Created) => {}
    }
    tolerate_not_found(run_action(executor, action, params).await)
        .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;
    *state = None;
    Ok(())
}

/// Confirms the driver can reach and log in to the instance.
pub struct CheckInstanceStatus<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> CheckInstanceStatus<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for CheckInstanceStatus<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for CheckInstanceStatus<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "check_instance_status"
    }

    fn description(&self) -> String {
        "Checking database instance status...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let params = instance_params(&ctx.instance);
        run_action(ctx.executor.as_ref(), "status", &params)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;
        debug!(connection = %ctx.instance.connection(), "instance is reachable");
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "nothing to undo for a status check".to_string()
    }
}

/// Creates the requested database on the instance.
pub struct CreateDatabase<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> CreateDatabase<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for CreateDatabase<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for CreateDatabase<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "create_database"
    }

    fn description(&self) -> String {
        "Creating database...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let params = database_params(ctx)?;
        create_resource(
            ctx.executor.as_ref(),
            "createdatabase",
            &params,
            &mut ctx.database_state,
        )
        .await?;
        debug!(database = %params["DATABASE_NAME"], "created database");
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        if ctx.database_state.is_none() {
            return Ok(());
        }
        let params = database_params(ctx)?;
        drop_resource(
            ctx.executor.as_ref(),
            "dropdatabase",
            &params,
            &mut ctx.database_state,
        )
        .await
    }

    fn compensation_description(&self) -> String {
        "drop the database created by this run".to_string()
    }
}

/// Creates the application user for the requested database.
pub struct CreateCredential<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> CreateCredential<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for CreateCredential<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for CreateCredential<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "create_credential"
    }

    fn description(&self) -> String {
        "Creating database credential...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let params = credential_params(ctx)?;
        create_resource(
            ctx.executor.as_ref(),
            "adduser",
            &params,
            &mut ctx.credential_state,
        )
        .await?;
        debug!(user = %params["CREDENTIAL_USER"], "created credential");
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        if ctx.credential_state.is_none() {
            return Ok(());
        }
        let params = credential_params(ctx)?;
        drop_resource(
            ctx.executor.as_ref(),
            "dropuser",
            &params,
            &mut ctx.credential_state,
        )
        .await
    }

    fn compensation_description(&self) -> String {
        "drop the credential created by this run".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dbaas_saga::{RunContext, SequenceBuilder};

    use super::*;
    use crate::mocks::{MockAccessProvider, MockExecutor, make_instance};
    use crate::providers::ScriptExecutor;
    use crate::types::{CredentialSpec, DatabaseSpec};

    type Ctx = ProvisionContext<MockExecutor, MockAccessProvider>;

    fn context(executor: &Arc<MockExecutor>) -> Ctx {
        ProvisionContext::new(
            make_instance(),
            Arc::clone(executor),
            Arc::new(MockAccessProvider::new()),
        )
        .with_database(DatabaseSpec {
            name: "orders".to_string(),
        })
        .with_credential(CredentialSpec {
            user: "orders_app".to_string(),
            password: "app-secret".to_string(),
        })
    }

    #[tokio::test]
    async fn status_check_passes_connection_environment() {
        let executor = Arc::new(MockExecutor::new());
        let mut ctx = context(&executor);

        CheckInstanceStatus::new()
            .execute(&mut ctx)
            .await
            .expect("status should succeed");

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        let (action, params) = &calls[0];
        assert_eq!(action, "status");
        assert_eq!(params["INSTANCE_CONNECTION"], "10.0.0.7:27017");
        assert_eq!(params["INSTANCE_USER"], "admin");
        assert_eq!(params["INSTANCE_PASSWORD"], "admin-secret");
        assert!(!params.contains_key("DATABASE_NAME"));
    }

    #[tokio::test]
    async fn status_check_classifies_connection_failures() {
        let executor = Arc::new(MockExecutor::new().fail_on(
            "status",
            "Error: couldn't connect to server xxx:yyy at src/mongo/shell/mongo.js:147",
        ));
        let mut ctx = context(&executor);

        let failure = CheckInstanceStatus::new()
            .execute(&mut ctx)
            .await
            .expect_err("status should fail");

        assert_eq!(failure.code(), &ErrorCode::Connection);
    }

    #[tokio::test]
    async fn status_check_classifies_authentication_failures() {
        let executor = Arc::new(
            MockExecutor::new()
                .fail_on("status", "Error: 18 { code: 18, ok: 0.0, errmsg: \"auth fails\" }"),
        );
        let mut ctx = context(&executor);

        let failure = CheckInstanceStatus::new()
            .execute(&mut ctx)
            .await
            .expect_err("status should fail");

        assert_eq!(failure.code(), &ErrorCode::Authentication);
    }

    #[tokio::test]
    async fn create_and_drop_database_use_database_environment() {
        let executor = Arc::new(MockExecutor::new());
        let mut ctx = context(&executor);
        let step = CreateDatabase::new();

        step.execute(&mut ctx).await.expect("create should succeed");
        assert_eq!(ctx.database_state(), Some(ResourceState::Created));
        step.compensate(&mut ctx).await.expect("drop should succeed");
        assert_eq!(ctx.database_state(), None);

        let calls = executor.calls();
        let actions: Vec<&str> = calls.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(actions, vec!["createdatabase", "dropdatabase"]);
        for (_, params) in &calls {
            assert_eq!(params["DATABASE_NAME"], "orders");
            assert_eq!(params["INSTANCE_CONNECTION"], "10.0.0.7:27017");
        }
    }

    #[tokio::test]
    async fn undo_of_database_that_already_existed_leaves_it_alone() {
        let executor =
            Arc::new(MockExecutor::new().fail_on("createdatabase", "database orders already exists"));
        let mut ctx = context(&executor);
        let step = CreateDatabase::new();

        let failure = step.execute(&mut ctx).await.expect_err("create should fail");
        assert_eq!(failure.code(), &ErrorCode::AlreadyExists);
        step.compensate(&mut ctx).await.expect("undo should succeed");

        assert_eq!(executor.actions(), vec!["createdatabase"]);
    }

    #[tokio::test]
    async fn undo_after_unclear_create_failure_drops_tolerating_not_found() {
        let executor = Arc::new(
            MockExecutor::new()
                .fail_on("createdatabase", "write concern timeout")
                .fail_on("dropdatabase", "database orders does not exist"),
        );
        let mut ctx = context(&executor);
        let step = CreateDatabase::new();

        let failure = step.execute(&mut ctx).await.expect_err("create should fail");
        assert_eq!(failure.code(), &ErrorCode::Unclassified);
        assert_eq!(ctx.database_state(), Some(ResourceState::Attempted));

        step.compensate(&mut ctx)
            .await
            .expect("missing database is not an undo failure");
        assert_eq!(executor.actions(), vec!["createdatabase", "dropdatabase"]);
    }

    #[tokio::test]
    async fn undo_fails_when_the_driver_cannot_be_started() {
        let dir = tempfile::tempdir().expect("tempdir");
        let executor = Arc::new(ScriptExecutor::new(dir.path().join("absent.sh")));
        let mut ctx = ProvisionContext::new(
            make_instance(),
            executor,
            Arc::new(MockAccessProvider::new()),
        )
        .with_database(DatabaseSpec {
            name: "orders".to_string(),
        });
        ctx.database_state = Some(ResourceState::Created);

        let failure = CreateDatabase::new()
            .compensate(&mut ctx)
            .await
            .expect_err("a database that was created must not be reported as dropped");

        assert_eq!(failure.code(), &ErrorCode::Unclassified);
        assert_eq!(ctx.database_state(), Some(ResourceState::Created));
    }

    #[tokio::test]
    async fn undo_without_do_calls_nothing() {
        let executor = Arc::new(MockExecutor::new());
        let mut ctx = context(&executor);

        CreateDatabase::new()
            .compensate(&mut ctx)
            .await
            .expect("undo should succeed");
        CreateCredential::new()
            .compensate(&mut ctx)
            .await
            .expect("undo should succeed");

        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn credential_steps_pass_credential_environment() {
        let executor = Arc::new(MockExecutor::new());
        let mut ctx = context(&executor);
        let step = CreateCredential::new();

        step.execute(&mut ctx).await.expect("adduser should succeed");
        step.compensate(&mut ctx).await.expect("dropuser should succeed");

        let calls = executor.calls();
        assert_eq!(calls[0].0, "adduser");
        assert_eq!(calls[1].0, "dropuser");
        for (_, params) in &calls {
            assert_eq!(params["DATABASE_NAME"], "orders");
            assert_eq!(params["CREDENTIAL_USER"], "orders_app");
            assert_eq!(params["CREDENTIAL_PASSWORD"], "app-secret");
        }
    }

    #[tokio::test]
    async fn missing_database_input_fails_without_calling_the_driver() {
        let executor = Arc::new(MockExecutor::new());
        let mut ctx: Ctx = ProvisionContext::new(
            make_instance(),
            Arc::clone(&executor),
            Arc::new(MockAccessProvider::new()),
        );

        let sequence = SequenceBuilder::new("no_database")
            .first_step(CreateDatabase::new())
            .build();
        let report = sequence.run(&mut ctx).await;

        assert!(!report.is_success());
        assert!(executor.calls().is_empty());
        assert_eq!(ctx.errors().len(), 1);
    }
}
