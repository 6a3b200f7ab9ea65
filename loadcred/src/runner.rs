//! The sequential run loop: provision, authenticate, record, one user at a
//! time, in output order.

use thiserror::Error;

use crate::acquire::SessionAcquirer;
use crate::admin::{AdminApi, AdminError};
use crate::config::Settings;
use crate::provision::{generate_username, user_representation};
use crate::record::{RecordError, Recorder};

/// Setup failures that abort the run before (or instead of) the loop.
/// Everything past setup is per-user and lands in a [`UserOutcome`] instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Admin setup failed: {0}")]
    Admin(#[from] AdminError),

    #[error("Sink setup failed: {0}")]
    Sink(#[from] RecordError),
}

/// Where in the pipeline a user was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Provision,
    GroupAssign,
    Acquire,
    Record,
}

/// Structured per-user result, so a harness can assert on outcomes without
/// parsing log output.
#[derive(Debug, Clone)]
pub enum UserOutcome {
    Recorded {
        username: String,
    },
    Failed {
        username: String,
        stage: Stage,
        reason: String,
    },
}

impl UserOutcome {
    fn failed(username: &str, stage: Stage, reason: String) -> Self {
        Self::Failed {
            username: username.to_string(),
            stage,
            reason,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, UserOutcome::Recorded { .. })
    }

    pub fn username(&self) -> &str {
        match self {
            UserOutcome::Recorded { username } | UserOutcome::Failed { username, .. } => username,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub requested: u32,
    pub outcomes: Vec<UserOutcome>,
}

impl RunSummary {
    pub fn recorded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_recorded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.recorded()
    }
}

/// Provision and authenticate `num_users` accounts, appending one sink row
/// per success.
///
/// The admin token is obtained once up front; if that fails nothing is
/// written at all. After setup, any failure is confined to its user: the
/// account may be left behind (no rollback), the row is skipped, and the
/// loop continues.
pub async fn run(
    settings: &Settings,
    acquirer: &dyn SessionAcquirer,
    num_users: u32,
) -> Result<RunSummary, RunError> {
    let admin = AdminApi::new(settings)?;
    let admin_token = admin.obtain_admin_token().await?;
    let mut recorder = Recorder::open(settings, acquirer.bundle_kind())?;

    let mut outcomes = Vec::with_capacity(num_users as usize);
    for _ in 0..num_users {
        let username = generate_username(&settings.username_prefix);
        let outcome =
            process_user(settings, &admin, &admin_token, acquirer, &mut recorder, &username).await;
        match &outcome {
            UserOutcome::Recorded { username } => {
                tracing::info!(username = username.as_str(), "user recorded");
            }
            UserOutcome::Failed { username, stage, reason } => {
                tracing::warn!(
                    username = username.as_str(),
                    stage = ?stage,
                    reason = reason.as_str(),
                    "user skipped"
                );
            }
        }
        outcomes.push(outcome);
    }

    Ok(RunSummary {
        requested: num_users,
        outcomes,
    })
}

async fn process_user(
    settings: &Settings,
    admin: &AdminApi,
    admin_token: &str,
    acquirer: &dyn SessionAcquirer,
    recorder: &mut Recorder,
    username: &str,
) -> UserOutcome {
    let user = user_representation(settings, username);
    if let Err(e) = admin.create_user(admin_token, &user).await {
        return UserOutcome::failed(username, Stage::Provision, e.to_string());
    }

    if let Some(group_name) = &settings.group_name {
        match admin.user_id_by_username(admin_token, username).await {
            Ok(user_id) => {
                match admin.assign_group(admin_token, &user_id, group_name).await {
                    Ok(()) => {}
                    // A group that simply does not exist is reported and the
                    // assignment skipped; the user still gets a session.
                    Err(AdminError::GroupNotFound(name)) => {
                        tracing::warn!(group = name.as_str(), "group not found, skipping assignment");
                    }
                    Err(e) => {
                        return UserOutcome::failed(username, Stage::GroupAssign, e.to_string());
                    }
                }
            }
            Err(e) => return UserOutcome::failed(username, Stage::GroupAssign, e.to_string()),
        }
    }

    // Let the account propagate before attempting the login.
    if !settings.propagation_delay.is_zero() {
        tokio::time::sleep(settings.propagation_delay).await;
    }

    let bundle = match acquirer.acquire(username, &settings.common_password).await {
        Ok(bundle) => bundle,
        Err(e) => return UserOutcome::failed(username, Stage::Acquire, e.to_string()),
    };

    if let Err(e) = recorder.record(username, &settings.common_password, &bundle) {
        return UserOutcome::failed(username, Stage::Record, e.to_string());
    }

    UserOutcome::Recorded {
        username: username.to_string(),
    }
}
