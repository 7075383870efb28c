#[cfg(test)]
mod tests {
    use super::super::task_service::{TaskService, TaskServiceImpl};
    use crate::domain::{
        query::{ListQuery, PageRequest, TaskFilter},
        repository::TaskRepository,
        task::{CreateTask, Priority, Status, Task, TaskId, UpdateTask},
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    /// Insertion-ordered store; newest rows live at the end.
    #[derive(Clone, Default)]
    struct InMemoryRepo {
        items: std::sync::Arc<std::sync::Mutex<Vec<Task>>>,
    }

    impl InMemoryRepo {
        fn matching(&self, filter: &TaskFilter) -> Vec<Task> {
            self.items.lock().unwrap().iter().rev().filter(|t| filter.matches(t)).cloned().collect()
        }
    }

    #[async_trait]
    impl TaskRepository for InMemoryRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn create(&self, input: CreateTask) -> Result<Task> {
            let task = Task {
                id: TaskId::default(),
                description: input.description,
                status: input.status,
                priority: input.priority,
                due_date: input.due_date,
                created_at: Utc::now(),
            };
            self.items.lock().unwrap().push(task.clone());
            Ok(task)
        }
        async fn create_many(&self, inputs: Vec<CreateTask>) -> Result<u64> {
            let n = inputs.len() as u64;
            for input in inputs { self.create(input).await?; }
            Ok(n)
        }
        async fn get(&self, id: TaskId) -> Result<Option<Task>> {
            Ok(self.items.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }
        async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> Result<Vec<Task>> {
            Ok(self.matching(filter).into_iter().skip(page.offset() as usize).take(page.limit() as usize).collect())
        }
        async fn count(&self, filter: &TaskFilter) -> Result<u64> { Ok(self.matching(filter).len() as u64) }
        async fn count_by_status(&self, filter: &TaskFilter) -> Result<Vec<(Status, u64)>> {
            let rows = self.matching(filter);
            Ok(Status::ALL
                .into_iter()
                .map(|s| (s, rows.iter().filter(|t| t.status == s).count() as u64))
                .filter(|(_, n)| *n > 0)
                .collect())
        }
        async fn count_by_priority_status(&self) -> Result<Vec<(Priority, Status, u64)>> {
            let rows = self.matching(&TaskFilter::default());
            let mut out = Vec::new();
            for p in Priority::ALL {
                for s in Status::ALL {
                    let n = rows.iter().filter(|t| t.priority == p && t.status == s).count() as u64;
                    if n > 0 { out.push((p, s, n)); }
                }
            }
            Ok(out)
        }
        async fn update(&self, id: TaskId, input: UpdateTask) -> Result<Option<Task>> {
            let mut items = self.items.lock().unwrap();
            let Some(task) = items.iter_mut().find(|t| t.id == id) else { return Ok(None) };
            input.apply(task);
            Ok(Some(task.clone()))
        }
        async fn delete(&self, id: TaskId) -> Result<bool> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|t| t.id != id);
            Ok(items.len() < before)
        }
        async fn clear(&self) -> Result<u64> {
            let mut items = self.items.lock().unwrap();
            let n = items.len() as u64;
            items.clear();
            Ok(n)
        }
    }

    fn input(description: &str, status: Status, priority: Priority) -> CreateTask {
        CreateTask { description: description.into(), status, priority, due_date: None }
    }

    async fn seeded() -> TaskServiceImpl<InMemoryRepo> {
        let repo = InMemoryRepo::default();
        repo.create_many(vec![
            input("Write release notes", Status::Todo, Priority::Low),
            input("Fix login redirect", Status::Progress, Priority::Critical),
            input("Review LOGIN copy", Status::Done, Priority::Low),
            input("Plan sprint", Status::Todo, Priority::Moderate),
            input("Update deps", Status::Done, Priority::Minor),
            input("Triage login issues", Status::Todo, Priority::Critical),
            input("Archive old boards", Status::Progress, Priority::Important),
        ])
        .await
        .unwrap();
        TaskServiceImpl::new(repo)
    }

    fn query(page: u32, limit: u32, filter: TaskFilter) -> ListQuery {
        ListQuery { page: PageRequest::new(page, limit).unwrap(), filter }
    }

    #[tokio::test]
    async fn unit_create_and_get() {
        let service = TaskServiceImpl::new(InMemoryRepo::default());
        let created = service.create(input("X", Status::Todo, Priority::Low)).await.unwrap();
        assert_eq!(created.description, "X");
        let got = service.get(created.id).await.unwrap().unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let service = TaskServiceImpl::new(InMemoryRepo::default());
        let page = service.list(ListQuery::default()).await.unwrap();
        assert!(page.tasks.is_empty());
        assert_eq!((page.total_pages, page.total_count, page.total_tasks), (0, 0, 0));
        assert_eq!(page.priority_counts.len(), Priority::ALL.len());
        assert!(page.priority_counts.values().all(|n| *n == 0));
    }

    #[tokio::test]
    async fn pages_are_newest_first_and_bounded() {
        let service = seeded().await;
        let first = service.list(query(1, 3, TaskFilter::default())).await.unwrap();
        let second = service.list(query(3, 3, TaskFilter::default())).await.unwrap();
        assert_eq!(first.tasks.len(), 3);
        assert_eq!(first.tasks[0].description, "Archive old boards");
        assert_eq!(second.tasks.len(), 1);
        assert_eq!(second.tasks[0].description, "Write release notes");
        assert_eq!(first.total_pages, 3);
        assert_eq!(second.current_page, 3);
        assert!(first.tasks.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn combined_filter_narrows_count_but_not_globals() {
        let service = seeded().await;
        let filter = TaskFilter::builder().search("login").priorities([Priority::Critical]).statuses([Status::Todo]).build();
        let page = service.list(query(1, 10, filter)).await.unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.tasks[0].description, "Triage login issues");
        assert_eq!(page.total_tasks, 7);
        assert_eq!(page.priority_counts[&Priority::Low], 2);
        // status counts ignore the status filter but honour search + priority
        assert_eq!(page.status_counts[&Status::Todo], 1);
        assert_eq!(page.status_counts[&Status::Progress], 1);
        assert_eq!(page.status_counts[&Status::Done], 0);
    }

    #[tokio::test]
    async fn aggregate_sums_are_consistent() {
        let service = seeded().await;
        let page = service.list(query(1, 2, TaskFilter::builder().search("zzz").build())).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.priority_counts.values().sum::<u64>(), page.total_tasks);
        for (p, row) in &page.priority_status_counts {
            assert_eq!(row.values().sum::<u64>(), page.priority_counts[p]);
        }
        assert_eq!(page.priority_status_counts[&Priority::Critical][&Status::Progress], 1);
    }

    #[tokio::test]
    async fn status_only_update_keeps_other_fields() {
        let service = seeded().await;
        let before = service.list(ListQuery::default()).await.unwrap().tasks[0].clone();
        let after = service.update(before.id, UpdateTask::status(Status::Done)).await.unwrap().unwrap();
        assert_eq!(after.status, Status::Done);
        assert_eq!(Task { status: before.status, ..after }, before);
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let service = seeded().await;
        let ghost = TaskId::default();
        assert!(service.get(ghost).await.unwrap().is_none());
        assert!(service.update(ghost, UpdateTask::status(Status::Done)).await.unwrap().is_none());
        assert!(!service.delete(ghost).await.unwrap());
    }
}
