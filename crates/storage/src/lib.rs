use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{BudgetBracket, ContactKind, ContactSubmission, ProposalSubmission};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

mod rest;

pub use rest::RestTableStore;

/// Durable destination for validated submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Short name used in log lines.
    fn describe(&self) -> &'static str;
    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()>;
    async fn insert_proposal(&self, submission: &ProposalSubmission) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredContact {
    pub id: i64,
    pub submission: ContactSubmission,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredProposal {
    pub id: i64,
    pub submission: ProposalSubmission,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own empty database.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_contacts(&self, limit: u32) -> Result<Vec<StoredContact>> {
        let rows = sqlx::query(
            "SELECT id, name, email, subject, type, message, created_at
             FROM contact_messages
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let raw_kind = r.get::<String, _>(4);
                let kind = ContactKind::ALL
                    .into_iter()
                    .find(|kind| kind.as_str() == raw_kind)
                    .unwrap_or(ContactKind::Other);
                StoredContact {
                    id: r.get::<i64, _>(0),
                    submission: ContactSubmission {
                        name: r.get::<String, _>(1),
                        email: r.get::<String, _>(2),
                        subject: r.get::<String, _>(3),
                        kind,
                        message: r.get::<String, _>(5),
                    },
                    created_at: r.get::<DateTime<Utc>, _>(6),
                }
            })
            .collect())
    }

    pub async fn list_proposals(&self, limit: u32) -> Result<Vec<StoredProposal>> {
        let rows = sqlx::query(
            "SELECT id, name, email, company, budget, deadline, description, created_at
             FROM project_proposals
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let raw_budget = r.get::<String, _>(4);
                let budget = BudgetBracket::ALL
                    .into_iter()
                    .find(|budget| budget.as_str() == raw_budget)
                    .unwrap_or_default();
                StoredProposal {
                    id: r.get::<i64, _>(0),
                    submission: ProposalSubmission {
                        name: r.get::<String, _>(1),
                        email: r.get::<String, _>(2),
                        company: r.get::<Option<String>, _>(3),
                        budget,
                        deadline: r.get::<String, _>(5),
                        description: r.get::<String, _>(6),
                    },
                    created_at: r.get::<DateTime<Utc>, _>(7),
                }
            })
            .collect())
    }
}

#[async_trait]
impl SubmissionStore for Storage {
    fn describe(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()> {
        sqlx::query(
            "INSERT INTO contact_messages (name, email, subject, type, message, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.subject)
        .bind(submission.kind.as_str())
        .bind(&submission.message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to insert contact_messages row")?;
        Ok(())
    }

    async fn insert_proposal(&self, submission: &ProposalSubmission) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_proposals (name, email, company, budget, deadline, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(submission.company.as_deref().filter(|company| !company.is_empty()))
        .bind(submission.budget.as_str())
        .bind(&submission.deadline)
        .bind(&submission.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to insert project_proposals row")?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
