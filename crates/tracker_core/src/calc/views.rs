//! Filtered views and summary figures for the presentation layer.

use crate::calc::streak::best_streak;
use crate::model::habit::Habit;
use crate::model::task::{Category, Task};
use chrono::NaiveDate;

/// Task list filter. `category: None` means all categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub category: Option<Category>,
    pub show_completed: bool,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            category: None,
            show_completed: true,
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.category.is_some_and(|category| task.category != category) {
            return false;
        }
        self.show_completed || !task.completed
    }

    /// Keeps matching tasks in their original order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub habits_done_today: usize,
    pub total_habits: usize,
}

impl DashboardSummary {
    pub fn compute(tasks: &[Task], habits: &[Habit], today: NaiveDate) -> Self {
        Self {
            completed_tasks: tasks.iter().filter(|task| task.completed).count(),
            total_tasks: tasks.len(),
            habits_done_today: habits
                .iter()
                .filter(|habit| habit.is_completed_on(today))
                .count(),
            total_habits: habits.len(),
        }
    }
}

/// Statistics shown under the habit grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitStats {
    pub done_today: usize,
    pub total_habits: usize,
    pub best_streak: u32,
    pub total_completions: usize,
}

impl HabitStats {
    pub fn compute(habits: &[Habit], today: NaiveDate) -> Self {
        Self {
            done_today: habits
                .iter()
                .filter(|habit| habit.is_completed_on(today))
                .count(),
            total_habits: habits.len(),
            best_streak: best_streak(habits, today),
            total_completions: habits.iter().map(|habit| habit.completed_dates.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DashboardSummary, HabitStats, TaskFilter};
    use crate::model::habit::Habit;
    use crate::model::id::EntityId;
    use crate::model::task::{Category, Priority, Task};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn task(text: &str, category: Category, completed: bool) -> Task {
        Task {
            id: EntityId::generate(),
            text: text.to_string(),
            completed,
            due_date: today(),
            priority: Priority::Medium,
            category,
        }
    }

    fn habit(dates: &[NaiveDate]) -> Habit {
        Habit {
            id: EntityId::generate(),
            name: "habit".to_string(),
            completed_dates: dates.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn filter_by_category_and_completion() {
        let tasks = vec![
            task("a", Category::Daily, false),
            task("b", Category::Weekly, true),
            task("c", Category::Daily, true),
        ];

        let all = TaskFilter::default().apply(&tasks);
        assert_eq!(all.len(), 3);

        let daily_open = TaskFilter {
            category: Some(Category::Daily),
            show_completed: false,
        }
        .apply(&tasks);
        assert_eq!(
            daily_open.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["a"]
        );

        let weekly = TaskFilter {
            category: Some(Category::Weekly),
            show_completed: true,
        }
        .apply(&tasks);
        assert_eq!(weekly.len(), 1);
    }

    #[test]
    fn dashboard_counts() {
        let yesterday = today().pred_opt().unwrap();
        let summary = DashboardSummary::compute(
            &[
                task("a", Category::Daily, true),
                task("b", Category::Daily, false),
            ],
            &[habit(&[today()]), habit(&[yesterday]), habit(&[])],
            today(),
        );
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.habits_done_today, 1);
        assert_eq!(summary.total_habits, 3);
    }

    #[test]
    fn habit_stats() {
        let yesterday = today().pred_opt().unwrap();
        let stats = HabitStats::compute(
            &[habit(&[today(), yesterday]), habit(&[yesterday])],
            today(),
        );
        assert_eq!(stats.done_today, 1);
        assert_eq!(stats.best_streak, 2);
        assert_eq!(stats.total_completions, 3);
    }
}
