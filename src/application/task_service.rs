use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::query::{zeroed, ListQuery, TaskPage};
use crate::domain::repository::TaskRepository;
use crate::domain::task::{CreateTask, Priority, Status, Task, TaskId, UpdateTask};

#[async_trait]
pub trait TaskService: Send + Sync + 'static {
    async fn list(&self, query: ListQuery) -> Result<TaskPage>;
    async fn create(&self, input: CreateTask) -> Result<Task>;
    async fn get(&self, id: TaskId) -> Result<Option<Task>>;
    async fn update(&self, id: TaskId, input: UpdateTask) -> Result<Option<Task>>;
    async fn delete(&self, id: TaskId) -> Result<bool>;
}

#[derive(Clone)]
pub struct TaskServiceImpl<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TaskRepository> TaskService for TaskServiceImpl<R> {
    async fn list(&self, query: ListQuery) -> Result<TaskPage> {
        let ListQuery { page, filter } = query;
        let status_filter = filter.without_status();
        let (tasks, total_count, by_status, grid) = tokio::try_join!(
            self.repo.list_page(&filter, page),
            self.repo.count(&filter),
            self.repo.count_by_status(&status_filter),
            self.repo.count_by_priority_status(),
        )?;

        let mut status_counts = zeroed(Status::ALL);
        status_counts.extend(by_status);

        let mut priority_status_counts: BTreeMap<Priority, BTreeMap<Status, u64>> =
            Priority::ALL.into_iter().map(|p| (p, zeroed(Status::ALL))).collect();
        for (priority, status, n) in grid {
            if let Some(row) = priority_status_counts.get_mut(&priority) { row.insert(status, n); }
        }
        let priority_counts: BTreeMap<Priority, u64> = priority_status_counts
            .iter()
            .map(|(p, row)| (*p, row.values().sum::<u64>()))
            .collect();
        let total_tasks: u64 = priority_counts.values().sum();

        tracing::debug!(page = page.page(), limit = page.limit(), total_count, "listed tasks");
        Ok(TaskPage {
            tasks,
            current_page: page.page(),
            total_pages: page.total_pages(total_count),
            total_count,
            total_tasks,
            priority_counts,
            status_counts,
            priority_status_counts,
        })
    }

    async fn create(&self, input: CreateTask) -> Result<Task> {
        let task = self.repo.create(input).await?;
        tracing::info!(id = %task.id, "created task");
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> { self.repo.get(id).await }

    async fn update(&self, id: TaskId, input: UpdateTask) -> Result<Option<Task>> { self.repo.update(id, input).await }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        let deleted = self.repo.delete(id).await?;
        if deleted { tracing::info!(%id, "deleted task"); }
        Ok(deleted)
    }
}
