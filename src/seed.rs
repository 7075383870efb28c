//! Synthetic rows for development databases.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::repository::TaskRepository;
use crate::domain::task::{CreateTask, Priority, Status};

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "reprehenderit",
    "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint",
    "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui", "officia", "deserunt",
    "mollit", "anim", "id", "est", "laborum",
];

/// A capitalised sentence of 3 to 10 words ending in a period.
pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(3..=10);
    let words: Vec<&str> = (0..len).filter_map(|_| WORDS.choose(rng).copied()).collect();
    let mut out = words.join(" ");
    if let Some(first) = out.get(0..1) {
        let upper = first.to_uppercase();
        out.replace_range(0..1, &upper);
    }
    out.push('.');
    out
}

pub fn fake_task<R: Rng + ?Sized>(rng: &mut R) -> CreateTask {
    CreateTask {
        description: sentence(rng),
        status: Status::ALL.choose(rng).copied().unwrap_or_default(),
        priority: Priority::ALL.choose(rng).copied().unwrap_or_default(),
        due_date: None,
    }
}

/// Replaces the whole table with `count` fake tasks. Returns rows inserted.
pub async fn run<T: TaskRepository, R: Rng + ?Sized>(repo: &T, rng: &mut R, count: usize) -> Result<u64> {
    let removed = repo.clear().await?;
    tracing::info!(removed, "cleared tasks");
    let inputs = (0..count).map(|_| fake_task(rng)).collect();
    let inserted = repo.create_many(inputs).await?;
    tracing::info!(inserted, "seeded tasks");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sentences_are_capitalised_and_terminated() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = sentence(&mut rng);
            assert!(s.ends_with('.'));
            assert!(s.chars().next().unwrap().is_uppercase());
            let words = s.trim_end_matches('.').split(' ').count();
            assert!((3..=10).contains(&words), "{s}");
        }
    }

    #[test]
    fn fake_tasks_cover_the_enums() {
        let mut rng = StdRng::seed_from_u64(42);
        let tasks: Vec<_> = (0..200).map(|_| fake_task(&mut rng)).collect();
        for s in Status::ALL { assert!(tasks.iter().any(|t| t.status == s)); }
        for p in Priority::ALL { assert!(tasks.iter().any(|t| t.priority == p)); }
        assert!(tasks.iter().all(|t| t.description.len() >= 2 && t.due_date.is_none()));
    }
}
