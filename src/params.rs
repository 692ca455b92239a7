//! Query parameters and the input-acceptance rules that feed them

use thiserror::Error;

/// Smallest point value the point input accepts
pub const MIN_POINTS: i64 = 1;
/// Largest point value the point input accepts
pub const MAX_POINTS: i64 = 1400;

/// Rejected point input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointInputError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("{0} is outside the accepted range 1..=1400")]
    OutOfRange(i64),
}

/// Parse the point input field.
///
/// Empty input clears the filter. Anything that is not an integer in
/// `MIN_POINTS..=MAX_POINTS` is rejected; callers keep their previous value.
pub fn parse_point_input(input: &str) -> Result<Option<i64>, PointInputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: i64 = trimmed
        .parse()
        .map_err(|_| PointInputError::NotANumber(trimmed.to_string()))?;
    if !(MIN_POINTS..=MAX_POINTS).contains(&value) {
        return Err(PointInputError::OutOfRange(value));
    }
    Ok(Some(value))
}

/// What the user is currently asking for.
///
/// A small value that is rebuilt on every input change and handed to
/// [`crate::query::query`] together with the current index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    selected: Vec<String>,
    points: Option<i64>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a selection list. Later duplicates are ignored.
    pub fn with_selection<I, S>(mut self, disciplines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.clear();
        for d in disciplines {
            let d = d.into();
            if !self.selected.contains(&d) {
                self.selected.push(d);
            }
        }
        self
    }

    pub fn with_points(mut self, points: Option<i64>) -> Self {
        self.points = points;
        self
    }

    /// Select the discipline if it isn't selected, deselect it otherwise.
    /// Newly selected disciplines go to the end of the selection.
    pub fn toggle_discipline(&self, discipline: &str) -> Self {
        let mut selected = self.selected.clone();
        if let Some(pos) = selected.iter().position(|d| d == discipline) {
            selected.remove(pos);
        } else {
            selected.push(discipline.to_string());
        }
        QueryParams {
            selected,
            points: self.points,
        }
    }

    pub fn clear_selection(&self) -> Self {
        QueryParams {
            selected: Vec::new(),
            points: self.points,
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, discipline: &str) -> bool {
        self.selected.iter().any(|d| d == discipline)
    }

    pub fn points(&self) -> Option<i64> {
        self.points
    }

    /// No selection and no point filter. Front ends show a prompt instead
    /// of the full table in this state.
    pub fn is_idle(&self) -> bool {
        self.selected.is_empty() && self.points.is_none()
    }
}
