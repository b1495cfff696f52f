use serde::{
  Deserialize,
  Serialize
};

/// A task as returned by the task API.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskDto {
  pub id:        u64,
  pub title:     String,
  #[serde(default)]
  pub completed: bool
}

/// Body of `POST /api/tasks`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskCreate {
  pub title:     String,
  #[serde(default)]
  pub completed: bool
}

impl TaskCreate {
  pub fn new(
    title: impl Into<String>,
    completed: bool
  ) -> Self {
    Self {
      title: title.into(),
      completed
    }
  }
}
