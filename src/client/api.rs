use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};

use crate::domain::query::{ListQuery, TaskPage};
use crate::domain::task::{CreateTask, Task, TaskId, UpdateTask};

/// HTTP client for the `/api/tasks` endpoints.
#[derive(Clone)]
pub struct TaskApi {
    client: Client,
    base_url: String,
}

impl TaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    pub async fn list(&self, query: &ListQuery) -> Result<TaskPage> {
        let res = self.client.get(self.url("/api/tasks")).query(&query.to_params()).send().await?;
        Ok(res.error_for_status()?.json().await?)
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let res = self.client.get(self.url(&format!("/api/tasks/{id}"))).send().await?;
        if res.status() == StatusCode::NOT_FOUND { return Ok(None); }
        Ok(Some(res.error_for_status()?.json().await?))
    }

    pub async fn create(&self, input: &CreateTask) -> Result<Task> {
        let res = self.client.post(self.url("/api/tasks")).json(input).send().await?;
        Ok(res.error_for_status()?.json().await.context("decoding created task")?)
    }

    pub async fn update(&self, id: TaskId, input: &UpdateTask) -> Result<Task> {
        let res = self.client.patch(self.url(&format!("/api/tasks/{id}"))).json(input).send().await?;
        if res.status() == StatusCode::NOT_FOUND { bail!("task {id} no longer exists"); }
        Ok(res.error_for_status()?.json().await?)
    }

    pub async fn delete(&self, id: TaskId) -> Result<()> {
        let res = self.client.delete(self.url(&format!("/api/tasks/{id}"))).send().await?;
        if res.status() == StatusCode::NOT_FOUND { bail!("task {id} no longer exists"); }
        res.error_for_status()?;
        Ok(())
    }
}
