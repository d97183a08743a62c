use super::{AppStore, StoreError, TASKS_KEY};
use crate::model::{EntityId, NewTask, Task, TaskFilter, TaskPatch};
use chrono::Utc;

impl AppStore {
    /// Replace the task list with the persisted one, if any.
    pub fn load_tasks(&mut self) {
        if let Some(tasks) = self.load_blob::<Vec<Task>>(TASKS_KEY) {
            for task in &tasks {
                self.ids.observe(task.id);
            }
            self.tasks = tasks;
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn tasks_filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn add_task(&mut self, draft: NewTask) -> Result<Task, StoreError> {
        let task = Task::from_draft(self.ids.next_id(), draft, Utc::now());
        let mut tasks = self.tasks.clone();
        tasks.push(task.clone());
        self.persist(TASKS_KEY, &tasks)?;
        self.tasks = tasks;
        tracing::debug!(id = task.id, "task added");
        Ok(task)
    }

    /// Apply a partial update. Unknown ids are ignored and nothing is written.
    pub fn update_task(
        &mut self,
        id: EntityId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let mut tasks = self.tasks.clone();
        tasks[index].apply(patch, Utc::now());
        let updated = tasks[index].clone();
        self.persist(TASKS_KEY, &tasks)?;
        self.tasks = tasks;
        Ok(Some(updated))
    }

    pub fn delete_task(&mut self, id: EntityId) -> Result<(), StoreError> {
        if !self.tasks.iter().any(|t| t.id == id) {
            return Ok(());
        }
        let tasks: Vec<Task> = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.persist(TASKS_KEY, &tasks)?;
        self.tasks = tasks;
        if self.selected_task == Some(id) {
            self.selected_task = None;
        }
        Ok(())
    }

    /// Select a task for the detail view; ids not in the list clear the selection.
    pub fn select_task(&mut self, id: Option<EntityId>) {
        self.selected_task = id.filter(|id| self.tasks.iter().any(|t| t.id == *id));
    }

    pub fn selected_task(&self) -> Option<Task> {
        let id = self.selected_task?;
        self.tasks.iter().find(|t| t.id == id).cloned()
    }
}
