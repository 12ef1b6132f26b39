//! Query parameter parsing for the users' comments endpoint
//!
//! Turns raw query strings into a [`FilterSpec`]. Only `usernames`
//! (either `usernames[]=a&usernames[]=b` or `usernames=a&usernames=b`)
//! and `sort_by_date` are read; every other parameter is ignored.

use serde::Deserialize;

use crate::error::AppError;
use crate::service::FilterSpec;

#[derive(Debug, Default, Deserialize)]
pub struct UsersCommentsParams {
    #[serde(default, rename = "usernames[]")]
    pub bracketed_usernames: Vec<String>,
    #[serde(default)]
    pub usernames: Vec<String>,
    pub sort_by_date: Option<String>,
}

impl UsersCommentsParams {
    /// Normalize into a filter
    ///
    /// # Errors
    /// `Validation` when `sort_by_date` is not a boolean-like value or more
    /// than `max_usernames` distinct usernames are requested
    pub fn into_filter(self, max_usernames: usize) -> Result<FilterSpec, AppError> {
        let sort_by_date = match self.sort_by_date.as_deref() {
            Some(value) => parse_flag(value).ok_or_else(|| {
                AppError::Validation(format!(
                    "sort_by_date must be a boolean (true/false), got {:?}",
                    value
                ))
            })?,
            None => false,
        };

        let filter = FilterSpec::new(
            self.bracketed_usernames.into_iter().chain(self.usernames),
            sort_by_date,
        );

        if filter.usernames.len() > max_usernames {
            return Err(AppError::Validation(format!(
                "at most {} usernames may be requested, got {}",
                max_usernames,
                filter.usernames.len()
            )));
        }

        Ok(filter)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
