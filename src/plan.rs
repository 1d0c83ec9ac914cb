//! Execution types, the service catalog and form validation.

use std::{collections::HashSet, fmt, path::PathBuf};

use lettre::message::Mailbox;
use thiserror::Error;

use crate::{config::DependencyConfig, runner::ExecutionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionType {
    Regression,
    IndividualService,
    ServicesWithDependencies,
}

impl ExecutionType {
    pub const ALL: [ExecutionType; 3] = [
        ExecutionType::Regression,
        ExecutionType::IndividualService,
        ExecutionType::ServicesWithDependencies,
    ];
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionType::Regression => write!(f, "Run the Regression Suite"),
            ExecutionType::IndividualService => write!(f, "Run Individual Service"),
            ExecutionType::ServicesWithDependencies => write!(f, "Run Services with Dependencies"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("dependency cycle involving {0}")]
    Cycle(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an execution type!")]
    MissingExecutionType,
    #[error("Please select at least one service!")]
    MissingService,
    #[error("Please enter a collection file path!")]
    MissingCollection,
    #[error("Please enter recipient email!")]
    MissingRecipient,
    #[error("Invalid recipient email: {0}")]
    InvalidRecipient(String),
    #[error("Please configure sender email in the email settings!")]
    MissingSender,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<String>,
    dependencies: Vec<DependencyConfig>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<String>, dependencies: Vec<DependencyConfig>) -> Self {
        Self {
            services,
            dependencies,
        }
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn dependencies(&self) -> &[DependencyConfig] {
        &self.dependencies
    }

    /// Services of the dependency graph, each after everything it depends on.
    /// Ties keep configuration order.
    pub fn dependency_order(&self) -> Result<Vec<String>, PlanError> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        for entry in &self.dependencies {
            self.visit(&entry.service, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        service: &str,
        visiting: &mut HashSet<String>,
        done: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), PlanError> {
        if done.contains(service) {
            return Ok(());
        }
        if !visiting.insert(service.to_string()) {
            return Err(PlanError::Cycle(service.to_string()));
        }
        let deps = self
            .dependencies
            .iter()
            .filter(|entry| entry.service == service)
            .flat_map(|entry| entry.depends_on.iter());
        for dep in deps {
            self.visit(dep, visiting, done, order)?;
        }
        visiting.remove(service);
        done.insert(service.to_string());
        order.push(service.to_string());
        Ok(())
    }
}

/// What the user filled in before pressing "Run".
#[derive(Debug, Clone, Default)]
pub struct RunForm {
    pub execution_type: Option<ExecutionType>,
    pub selected_services: Vec<String>,
    pub collection: String,
    pub environment: String,
}

impl RunForm {
    pub fn validate(&self) -> Result<ExecutionType, ValidationError> {
        let execution_type = self
            .execution_type
            .ok_or(ValidationError::MissingExecutionType)?;
        if execution_type == ExecutionType::IndividualService && self.selected_services.is_empty()
        {
            return Err(ValidationError::MissingService);
        }
        if self.collection.trim().is_empty() {
            return Err(ValidationError::MissingCollection);
        }
        Ok(execution_type)
    }

    /// Only one folder runs per action: the first selected service, or the
    /// first configured service that has dependencies.
    pub fn folder(&self, catalog: &ServiceCatalog) -> Option<String> {
        match self.execution_type? {
            ExecutionType::Regression => None,
            ExecutionType::IndividualService => self.selected_services.first().cloned(),
            ExecutionType::ServicesWithDependencies => catalog
                .dependencies()
                .first()
                .map(|entry| entry.service.clone()),
        }
    }

    pub fn into_request(
        self,
        catalog: &ServiceCatalog,
        base_dir: &std::path::Path,
    ) -> Result<ExecutionRequest, ValidationError> {
        self.validate()?;
        let folder = self.folder(catalog);
        let resolve = |value: &str| {
            let path = PathBuf::from(value.trim());
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };
        let environment = Some(self.environment.trim())
            .filter(|value| !value.is_empty())
            .map(resolve);
        Ok(ExecutionRequest::new(resolve(&self.collection), environment, folder))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmailForm {
    pub recipient: String,
    pub sender: Option<String>,
}

impl EmailForm {
    pub fn validate(&self) -> Result<Mailbox, ValidationError> {
        let recipient = self.recipient.trim();
        if recipient.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        let mailbox = recipient
            .parse::<Mailbox>()
            .map_err(|_| ValidationError::InvalidRecipient(recipient.to_string()))?;
        if self
            .sender
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            return Err(ValidationError::MissingSender);
        }
        Ok(mailbox)
    }
}
