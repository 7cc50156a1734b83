use serde::Serialize;

/// One screen of the installation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    Environment,
    Migrations,
    Admin,
    Finish,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Welcome,
            WizardStep::Environment,
            WizardStep::Migrations,
            WizardStep::Admin,
            WizardStep::Finish,
        ]
    }

    /// Path segment under the route prefix. The welcome screen is the prefix itself.
    pub fn slug(self) -> &'static str {
        match self {
            WizardStep::Welcome => "",
            WizardStep::Environment => "environment",
            WizardStep::Migrations => "migrations",
            WizardStep::Admin => "admin",
            WizardStep::Finish => "finish",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Welcome => "Welcome",
            WizardStep::Environment => "Environment Setup",
            WizardStep::Migrations => "Database Migrations",
            WizardStep::Admin => "Administrator Account",
            WizardStep::Finish => "Finish Installation",
        }
    }

    /// Route path for this step under `prefix`, with a leading slash.
    pub fn path(self, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        match self.slug() {
            "" => format!("/{prefix}"),
            slug => format!("/{prefix}/{slug}"),
        }
    }
}

/// Serializable entry of the step catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct StepEntry {
    pub step: WizardStep,
    pub title: &'static str,
    pub path: String,
}

/// The ordered step catalogue for a wizard mounted at `prefix`.
pub fn catalogue(prefix: &str) -> Vec<StepEntry> {
    WizardStep::all()
        .iter()
        .map(|&step| StepEntry {
            step,
            title: step.title(),
            path: step.path(prefix),
        })
        .collect()
}
