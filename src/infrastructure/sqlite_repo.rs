use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, QueryBuilder, Row, Sqlite};

use crate::domain::{
    query::{PageRequest, TaskFilter},
    repository::TaskRepository,
    task::{CreateTask, Priority, Status, Task, TaskId, UpdateTask},
};

const COLUMNS: &str = "id, description, status, priority, due_date, created_at";

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTaskRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Every connection to `sqlite::memory:` opens its own database, so the
        // pool must hold exactly one connection and never recycle it.
        let options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('Todo', 'Progress', 'Done')),
                priority TEXT NOT NULL CHECK (priority IN ('Minor', 'Low', 'Moderate', 'Important', 'Critical')),
                due_date TEXT,
                created_at TEXT NOT NULL,
                description_folded TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&*self.pool)
        .await?;
        backfill_folded(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS tasks_created_at ON tasks (created_at)")
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn create(&self, input: CreateTask) -> Result<Task> {
        let task = new_task(input);
        insert(&*self.pool, &task).await?;
        Ok(task)
    }

    async fn create_many(&self, inputs: Vec<CreateTask>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for input in inputs {
            insert(&mut *tx, &new_task(input)).await?;
            inserted += 1;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_task).transpose()
    }

    async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> Result<Vec<Task>> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM tasks"));
        push_filter(&mut qb, filter);
        // rowid breaks ties between rows created within the same microsecond
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset())?);
        let rows = qb.build().fetch_all(&*self.pool).await?;
        rows.into_iter().map(row_to_task).collect()
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        push_filter(&mut qb, filter);
        let n: i64 = qb.build_query_scalar().fetch_one(&*self.pool).await?;
        Ok(u64::try_from(n)?)
    }

    async fn count_by_status(&self, filter: &TaskFilter) -> Result<Vec<(Status, u64)>> {
        let mut qb = QueryBuilder::new("SELECT status, COUNT(*) AS n FROM tasks");
        push_filter(&mut qb, filter);
        qb.push(" GROUP BY status");
        let rows = qb.build().fetch_all(&*self.pool).await?;
        rows.into_iter()
            .map(|row| -> Result<(Status, u64)> {
                let status: String = row.try_get("status")?;
                let n: i64 = row.try_get("n")?;
                Ok((status.parse()?, u64::try_from(n)?))
            })
            .collect()
    }

    async fn count_by_priority_status(&self) -> Result<Vec<(Priority, Status, u64)>> {
        let rows = sqlx::query("SELECT priority, status, COUNT(*) AS n FROM tasks GROUP BY priority, status")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter()
            .map(|row| -> Result<(Priority, Status, u64)> {
                let priority: String = row.try_get("priority")?;
                let status: String = row.try_get("status")?;
                let n: i64 = row.try_get("n")?;
                Ok((priority.parse()?, status.parse()?, u64::try_from(n)?))
            })
            .collect()
    }

    /// Writes only the supplied columns in one statement, so concurrent
    /// updates of different fields never overwrite each other.
    async fn update(&self, id: TaskId, input: UpdateTask) -> Result<Option<Task>> {
        let UpdateTask { description, status, priority, due_date } = input;
        let mut qb = QueryBuilder::new("UPDATE tasks SET ");
        let mut set = qb.separated(", ");
        // no-op assignment keeps the statement valid for an empty update
        set.push("id = id");
        if let Some(description) = description {
            set.push("description_folded = ").push_bind_unseparated(fold(&description));
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(status) = status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(priority) = priority {
            set.push("priority = ").push_bind_unseparated(priority.as_str());
        }
        if let Some(due_date) = due_date {
            set.push("due_date = ").push_bind_unseparated(due_date.map(|d| timestamp(d.trunc_subsecs(6))));
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.push(format!(" RETURNING {COLUMNS}"));

        let row = qb.build().fetch_optional(&*self.pool).await?;
        row.map(row_to_task).transpose()
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks").execute(&*self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn new_task(input: CreateTask) -> Task {
    Task {
        id: TaskId::default(),
        description: input.description,
        status: input.status,
        priority: input.priority,
        // stored at microsecond precision; keep the returned row identical
        due_date: input.due_date.map(|d| d.trunc_subsecs(6)),
        created_at: Utc::now().trunc_subsecs(6),
    }
}

async fn insert<'e, E>(executor: E, task: &Task) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(&format!("INSERT INTO tasks ({COLUMNS}, description_folded) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"))
        .bind(task.id.to_string())
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(timestamp))
        .bind(timestamp(task.created_at))
        .bind(fold(&task.description))
        .execute(executor)
        .await?;
    Ok(())
}

/// Appends the WHERE clause for `filter`, binding every user-supplied value.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
    let mut keyword = " WHERE ";
    if let Some(search) = filter.search() {
        qb.push(keyword)
            .push("description_folded LIKE ")
            .push_bind(like_pattern(&fold(search)))
            .push(" ESCAPE '\\'");
        keyword = " AND ";
    }
    if !filter.priorities().is_empty() {
        qb.push(keyword).push("priority IN (");
        let mut list = qb.separated(", ");
        for p in filter.priorities() { list.push_bind(p.as_str()); }
        list.push_unseparated(")");
        keyword = " AND ";
    }
    if !filter.statuses().is_empty() {
        qb.push(keyword).push("status IN (");
        let mut list = qb.separated(", ");
        for s in filter.statuses() { list.push_bind(s.as_str()); }
        list.push_unseparated(")");
    }
}

/// Lowercased description used for search. SQLite's `LIKE` and `lower()` only
/// fold ASCII, so the folding happens here and both sides are compared folded.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Adds the folded column to tables created before it existed and fills it in.
async fn backfill_folded(pool: &Pool<Sqlite>) -> Result<()> {
    let has_column: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('tasks') WHERE name = 'description_folded'")
        .fetch_one(pool)
        .await?;
    if has_column == 0 {
        sqlx::query("ALTER TABLE tasks ADD COLUMN description_folded TEXT NOT NULL DEFAULT ''")
            .execute(pool)
            .await?;
    }
    let stale = sqlx::query("SELECT id, description FROM tasks WHERE description_folded = '' AND description <> ''")
        .fetch_all(pool)
        .await?;
    if stale.is_empty() { return Ok(()); }
    let mut tx = pool.begin().await?;
    for row in &stale {
        let id: String = row.try_get("id")?;
        let description: String = row.try_get("description")?;
        sqlx::query("UPDATE tasks SET description_folded = ?1 WHERE id = ?2")
            .bind(fold(&description))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::info!(rows = stale.len(), "backfilled search column");
    Ok(())
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') { pattern.push('\\'); }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Fixed-width RFC 3339 so that text order equals chronological order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp '{raw}'"))?
        .with_timezone(&Utc))
}

fn row_to_task(row: SqliteRow) -> Result<Task> {
    let id_str: String = row.try_get("id")?;
    let description: String = row.try_get("description")?;
    let status_str: String = row.try_get("status")?;
    let priority_str: String = row.try_get("priority")?;
    let due_date_str: Option<String> = row.try_get("due_date")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(Task {
        id: id_str.parse::<TaskId>().with_context(|| format!("bad task id '{id_str}'"))?,
        description,
        status: status_str.parse()?,
        priority: priority_str.parse()?,
        due_date: due_date_str.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}
