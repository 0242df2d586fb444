use crate::crew::Role;
use std::sync::Arc;

/// A unit of work bound to the role that performs it.
pub struct Task {
    description: String,
    role: Arc<Role>,
}

impl Task {
    pub fn new(description: impl Into<String>, role: &Arc<Role>) -> Self {
        Self {
            description: description.into(),
            role: role.clone(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role(&self) -> &Arc<Role> {
        &self.role
    }

    pub(crate) fn prompt(&self, context: Option<&str>) -> String {
        match context {
            Some(context) => with_context(&self.description, context),
            None => self.description.clone(),
        }
    }
}

pub(crate) fn with_context(request: &str, context: &str) -> String {
    format!(
        "{}\n\nThis is the context you're working with:\n{}",
        request, context
    )
}

#[derive(Clone, Debug)]
pub struct TaskOutput {
    pub description: String,
    pub role: String,
    pub raw: String,
}
