use crate::variables::VariableValues;

/// `call.start` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallStartRequestEvent {
    event_id: Option<String>,

    /// Assistant that runs a scripted interview
    assistant_id: Option<String>,
    /// Workflow that runs an AI-driven session
    workflow_id: Option<String>,
    /// Values substituted into the assistant or workflow prompt
    #[serde(default)]
    variable_values: VariableValues,
}

impl CallStartRequestEvent {
    pub fn assistant(assistant_id: &str) -> Self {
        Self {
            event_id: None,
            assistant_id: Some(assistant_id.to_string()),
            workflow_id: None,
            variable_values: VariableValues::new(),
        }
    }

    pub fn workflow(workflow_id: &str) -> Self {
        Self {
            event_id: None,
            assistant_id: None,
            workflow_id: Some(workflow_id.to_string()),
            variable_values: VariableValues::new(),
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn with_variables(mut self, variable_values: VariableValues) -> Self {
        self.variable_values = variable_values;
        self
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn variable_values(&self) -> &VariableValues {
        &self.variable_values
    }
}

/// `call.stop` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallStopRequestEvent {
    event_id: Option<String>,
}

impl Default for CallStopRequestEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStopRequestEvent {
    pub fn new() -> Self {
        Self { event_id: None }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}
