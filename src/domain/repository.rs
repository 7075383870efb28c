use async_trait::async_trait;

use super::query::{PageRequest, TaskFilter};
use super::task::{CreateTask, Priority, Status, Task, TaskId, UpdateTask};

#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn create(&self, input: CreateTask) -> anyhow::Result<Task>;
    /// Inserts all rows in one transaction, in iteration order.
    async fn create_many(&self, inputs: Vec<CreateTask>) -> anyhow::Result<u64>;
    async fn get(&self, id: TaskId) -> anyhow::Result<Option<Task>>;
    /// Newest first.
    async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> anyhow::Result<Vec<Task>>;
    async fn count(&self, filter: &TaskFilter) -> anyhow::Result<u64>;
    async fn count_by_status(&self, filter: &TaskFilter) -> anyhow::Result<Vec<(Status, u64)>>;
    /// Unfiltered counts for every (priority, status) pair present in the store.
    async fn count_by_priority_status(&self) -> anyhow::Result<Vec<(Priority, Status, u64)>>;
    async fn update(&self, id: TaskId, input: UpdateTask) -> anyhow::Result<Option<Task>>;
    async fn delete(&self, id: TaskId) -> anyhow::Result<bool>;
    async fn clear(&self) -> anyhow::Result<u64>;
}
