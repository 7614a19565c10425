use serde::Serialize;

/// Discipline narrowing state of a form that carries a discipline-filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "discipline")]
pub enum FilterState {
    #[default]
    Unfiltered,
    Filtered(String),
}

impl FilterState {
    pub fn discipline(&self) -> Option<&str> {
        match self {
            FilterState::Unfiltered => None,
            FilterState::Filtered(d) => Some(d.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CascadeController {
    state: FilterState,
}

impl CascadeController {
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.state.discipline()
    }

    /// Back to unfiltered, as on a freshly opened form.
    pub fn reset(&mut self) {
        self.state = FilterState::Unfiltered;
    }

    /// Applies a filter-field value. An empty value returns to unfiltered.
    /// Returns the state the dependent choices must now be resolved under.
    pub fn select(&mut self, discipline: &str) -> &FilterState {
        let d = discipline.trim();
        self.state = if d.is_empty() {
            FilterState::Unfiltered
        } else {
            FilterState::Filtered(d.to_string())
        };
        &self.state
    }
}
